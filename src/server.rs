//! HTTP front-end for headless drawing sessions.
//!
//! Each request carries a recorded event script. The server replays it on a
//! fresh canvas, extracts the feature vector, and for `/predict` forwards it
//! to the classifier.
//!
//! ```text
//! client ──→ POST /extract ──→ replay ──→ features
//! client ──→ POST /predict ──→ replay ──→ features ──→ classifier
//! ```

use crate::classifier::{ClassifierClient, ClassifierConfig, Prediction};
use crate::config::Config;
use crate::core::{DrawingSession, FeatureVector, TARGET_SIZE};
use crate::input::{CanvasEvent, EventScript};
use crate::stats::{create_shared_stats, Counter, SharedStats, StatsSnapshot};
use axum::{
    extract::State,
    http::{request::Parts, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Canvas, pen and resampling settings for every request
    pub canvas: Config,
    /// Classifier to forward `/predict` requests to
    pub classifier: ClassifierConfig,
}

impl ServerConfig {
    pub fn new(port: u16, canvas: Config, classifier: ClassifierConfig) -> Self {
        Self {
            port,
            canvas,
            classifier,
        }
    }
}

/// Shared server state
pub struct ServerState {
    canvas: Config,
    classifier: ClassifierClient,
    stats: SharedStats,
}

impl ServerState {
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        config.canvas.validate()?;
        Ok(Self {
            canvas: config.canvas.clone(),
            classifier: ClassifierClient::new(config.classifier.clone())?,
            stats: create_shared_stats(),
        })
    }

    /// Replay a script on a fresh canvas and extract the final drawing.
    fn extract(&self, script: &EventScript) -> Result<FeatureVector, ApiError> {
        let size = self.canvas.canvas_size;
        let mut session =
            DrawingSession::square(size, self.canvas.stroke_width, self.canvas.resample)
                .ok_or_else(|| {
                    api_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Could not allocate a {size}x{size} canvas"),
                        "CANVAS_ERROR",
                    )
                })?
                .with_stats(self.stats.clone());

        // Submit triggers inside the script are ignored; the final drawing is used.
        session.replay(
            script
                .raster_events(size, size)
                .into_iter()
                .filter(|event| !matches!(event, CanvasEvent::Submit)),
        );
        Ok(session.extract())
    }
}

/// Response from the extract endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ExtractResponse {
    /// Edge length of the feature grid
    pub size: u32,
    /// Row-major feature values
    pub features: FeatureVector,
}

/// Response from the predict endpoint
#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub prediction: Prediction,
    pub ink_coverage: f32,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: String, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error,
            code: code.to_string(),
        }),
    )
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /stats
async fn stats(State(state): State<Arc<ServerState>>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}

/// POST /extract
async fn extract(
    State(state): State<Arc<ServerState>>,
    Json(script): Json<EventScript>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let features = state.extract(&script)?;
    Ok(Json(ExtractResponse {
        size: TARGET_SIZE,
        features,
    }))
}

/// POST /predict
///
/// Replays the script, then forwards the features to the classifier.
async fn predict(
    State(state): State<Arc<ServerState>>,
    Json(script): Json<EventScript>,
) -> Result<Json<PredictResponse>, ApiError> {
    let features = state.extract(&script)?;
    state.stats.record(Counter::Submission);

    let prediction = state
        .classifier
        .classify_with_retry(&features)
        .await
        .map_err(|e| {
            tracing::error!("Classifier request failed: {}", e);
            state.stats.record(Counter::FailedSubmission);
            api_error(
                StatusCode::BAD_GATEWAY,
                format!("Classifier request failed: {e}"),
                "CLASSIFIER_ERROR",
            )
        })?;

    Ok(Json(PredictResponse {
        prediction,
        ink_coverage: features.ink_coverage(),
    }))
}

/// Whether a browser origin is served from this machine, on any port.
fn is_local_origin(origin: &HeaderValue) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let Some(authority) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };

    let (host, port) = if let Some(rest) = authority.strip_prefix("[::1]") {
        ("[::1]", rest)
    } else {
        match authority.split_once(':') {
            Some((host, port)) => (host, port),
            None => (authority, ""),
        }
    };
    let port = port.strip_prefix(':').unwrap_or(port);

    matches!(host, "localhost" | "127.0.0.1" | "[::1]")
        && port.chars().all(|c| c.is_ascii_digit())
}

/// Build the router with its state.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/extract", post(extract))
        .route("/predict", post(predict))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(
                    |origin: &HeaderValue, _: &Parts| is_local_origin(origin),
                ))
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(&config)?);
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("digit-sketch server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
