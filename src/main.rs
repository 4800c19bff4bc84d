//! digit-sketch CLI
//!
//! Replays recorded drawing sessions, extracts feature vectors and submits
//! them to a remote classifier.

use clap::{Parser, Subcommand, ValueEnum};
use digit_sketch::{
    config::Config,
    core::{DrawingSession, FeatureVector, ResampleFilter},
    input::EventScript,
    stats::{create_persistent_stats, SharedStats},
    VERSION,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "classifier")]
use digit_sketch::{BlockingClassifierClient, ClassifierConfig, Counter};

#[derive(Parser)]
#[command(name = "digit-sketch")]
#[command(version = VERSION)]
#[command(about = "Freehand character canvas with remote classification", long_about = None)]
struct Cli {
    /// Resampling filter (area, triangle, catmull-rom, gaussian, lanczos3)
    #[arg(long, global = true)]
    resample: Option<ResampleFilter>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script and print the final feature vector
    Extract {
        /// Event script (.json or .jsonl)
        script: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Replay a script and show each submitted drawing as text
    Preview {
        /// Event script (.json or .jsonl)
        script: PathBuf,
    },

    /// Replay a script and classify each submitted drawing
    Predict {
        /// Event script (.json or .jsonl)
        script: PathBuf,

        /// Predict endpoint (overrides config)
        #[arg(long)]
        url: Option<String>,

        /// Extra attempts after a failed request (overrides config)
        #[arg(long)]
        retries: Option<u32>,
    },

    /// Serve the extract/predict HTTP API
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Predict endpoint (overrides config)
        #[arg(long)]
        url: Option<String>,
    },

    /// Show cumulative statistics
    Stats,

    /// Show configuration
    Config {
        /// Write the current settings to the config file if none exists yet
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = load_config();
    if let Some(resample) = cli.resample {
        config.resample = resample;
    }

    match cli.command {
        Commands::Extract { script, format } => {
            cmd_extract(&config, &script, format);
        }
        Commands::Preview { script } => {
            cmd_preview(&config, &script);
        }
        Commands::Predict {
            script,
            url,
            retries,
        } => {
            cmd_predict(&config, &script, url, retries);
        }
        Commands::Serve { port, url } => {
            cmd_serve(config, port, url);
        }
        Commands::Stats => {
            cmd_stats(&config);
        }
        Commands::Config { init } => {
            cmd_config(&config, init);
        }
    }
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config ({e}); using defaults");
            Config::default()
        }
    }
}

fn load_script(path: &Path) -> EventScript {
    match EventScript::load(path) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Error reading {path:?}: {e}");
            std::process::exit(1);
        }
    }
}

fn new_session(config: &Config, stats: SharedStats) -> DrawingSession {
    match DrawingSession::square(config.canvas_size, config.stroke_width, config.resample) {
        Some(session) => session.with_stats(stats),
        None => {
            eprintln!(
                "Error: Could not create a {0}x{0} canvas",
                config.canvas_size
            );
            std::process::exit(1);
        }
    }
}

/// Replay a script; scripts without a submit trigger yield the final drawing.
fn replay(config: &Config, script: &EventScript, stats: SharedStats) -> Vec<FeatureVector> {
    let mut session = new_session(config, stats);
    let events = script.raster_events(config.canvas_size, config.canvas_size);
    let mut submissions = session.replay(events);
    if submissions.is_empty() {
        submissions.push(session.extract());
    }
    submissions
}

fn save_stats(stats: &SharedStats) {
    if let Err(e) = stats.save() {
        eprintln!("Warning: Could not save stats: {e}");
    }
}

fn cmd_extract(config: &Config, path: &Path, format: OutputFormat) {
    let script = load_script(path);
    let stats = create_persistent_stats(config.stats_path());

    let mut session = new_session(config, stats.clone());
    session.replay(script.raster_events(config.canvas_size, config.canvas_size));
    let features = session.extract();
    save_stats(&stats);

    match format {
        OutputFormat::Json => match serde_json::to_string(&features) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing features: {e}");
                std::process::exit(1);
            }
        },
        OutputFormat::Csv => println!("{}", features.to_csv()),
    }
}

fn cmd_preview(config: &Config, path: &Path) {
    let script = load_script(path);
    let stats = create_persistent_stats(config.stats_path());

    let submissions = replay(config, &script, stats.clone());
    save_stats(&stats);

    for (idx, features) in submissions.iter().enumerate() {
        println!(
            "Submission {} | ink coverage: {:.1}%",
            idx + 1,
            features.ink_coverage() * 100.0
        );
        println!("{}", features.preview());
    }
}

#[cfg(feature = "classifier")]
fn cmd_predict(config: &Config, path: &Path, url: Option<String>, retries: Option<u32>) {
    let script = load_script(path);
    let stats = create_persistent_stats(config.stats_path());

    let mut classifier_config = ClassifierConfig::from(&config.classifier);
    if let Some(url) = url {
        classifier_config.url = url;
    }
    if let Some(retries) = retries {
        classifier_config.retries = retries;
    }

    let client = match BlockingClassifierClient::new(classifier_config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!("digit-sketch v{VERSION}");
    println!("Classifier: {}", client.config().url);
    println!();

    let submissions = replay(config, &script, stats.clone());
    let mut failures = 0;

    for (idx, features) in submissions.iter().enumerate() {
        match client.classify_with_retry(features) {
            Ok(prediction) => {
                println!("[{}] Recognized: {prediction}", idx + 1);
            }
            Err(e) => {
                // The drawing is kept; the next submission still goes out.
                eprintln!("[{}] Prediction failed: {e}", idx + 1);
                stats.record(Counter::FailedSubmission);
                failures += 1;
            }
        }
    }

    save_stats(&stats);

    if failures == submissions.len() {
        std::process::exit(1);
    }
}

#[cfg(not(feature = "classifier"))]
fn cmd_predict(_config: &Config, _path: &Path, _url: Option<String>, _retries: Option<u32>) {
    eprintln!("Error: predict requires the classifier feature");
    std::process::exit(1);
}

#[cfg(feature = "server")]
fn cmd_serve(config: Config, port: u16, url: Option<String>) {
    use digit_sketch::server::{run, ServerConfig};

    let mut classifier_config = ClassifierConfig::from(&config.classifier);
    if let Some(url) = url {
        classifier_config.url = url;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error creating runtime: {e}");
            std::process::exit(1);
        }
    };

    let result: anyhow::Result<()> = runtime.block_on(async move {
        let (addr, shutdown_tx) = run(ServerConfig::new(port, config, classifier_config)).await?;
        println!("Listening on http://{addr}");
        println!("Press Ctrl+C to stop");

        tokio::signal::ctrl_c().await?;
        let _ = shutdown_tx.send(());
        Ok(())
    });

    if let Err(e) = result {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "server"))]
fn cmd_serve(_config: Config, _port: u16, _url: Option<String>) {
    eprintln!("Error: serve requires the server feature");
    std::process::exit(1);
}

fn cmd_stats(config: &Config) {
    let path = config.stats_path();
    if !path.exists() {
        println!("No previous session data found.");
        return;
    }

    let stats = create_persistent_stats(path);
    println!("Session statistics");
    println!("==================");
    println!("{}", stats.counts());
}

fn cmd_config(config: &Config, init: bool) {
    if init {
        let path = Config::config_path();
        if path.exists() {
            println!("Config file already exists: {path:?}");
        } else {
            match config.save() {
                Ok(path) => println!("Wrote {path:?}"),
                Err(e) => {
                    eprintln!("Error writing config: {e}");
                    std::process::exit(1);
                }
            }
        }
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(config).unwrap_or_else(|_| "Error".to_string())
    );
}
