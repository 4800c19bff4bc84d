//! digit-sketch - freehand character canvas for remote classification.
//!
//! This library captures pen strokes on a raster canvas and turns the drawing
//! into a fixed 28x28 vector of ink densities that a remote classifier can
//! consume.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         digit-sketch                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │   Canvas    │──▶│   Stroke    │──▶│  Feature    │         │
//! │  │   events    │   │   surface   │   │  extractor  │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │                                             │                │
//! │                                             ▼                │
//! │                                      ┌─────────────┐         │
//! │                                      │ Classifier  │         │
//! │                                      │   client    │         │
//! │                                      └─────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use digit_sketch::{CanvasEvent, DrawingSession, ResampleFilter, FEATURE_LEN};
//!
//! let mut session = DrawingSession::square(280, 20.0, ResampleFilter::Area).unwrap();
//! let submissions = session.replay([
//!     CanvasEvent::down(140.0, 40.0),
//!     CanvasEvent::moved(140.0, 240.0),
//!     CanvasEvent::up(140.0, 240.0),
//!     CanvasEvent::Submit,
//! ]);
//!
//! assert_eq!(submissions[0].len(), FEATURE_LEN);
//! ```

pub mod config;
pub mod core;
pub mod input;
pub mod stats;

#[cfg(feature = "classifier")]
pub mod classifier;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{ClassifierSettings, Config, ConfigError};
pub use crate::core::{
    extract_features, DrawingSession, FeatureExtractor, FeatureVector, ResampleFilter,
    StrokeState, StrokeStyle, StrokeSurface, FEATURE_LEN, TARGET_SIZE,
};
pub use input::{CanvasEvent, EventScript, Point, ScriptError, Viewport};
pub use stats::{Counter, Counts, SessionStats, SharedStats, StatsSnapshot};

#[cfg(feature = "classifier")]
pub use classifier::{
    BlockingClassifierClient, ClassifierClient, ClassifierConfig, ClassifierError, Prediction,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
