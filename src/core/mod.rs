//! Core drawing pipeline.
//!
//! This module contains:
//! - The stroke surface that renders pen input into a raster
//! - Feature extraction from raster snapshots
//! - The session that dispatches canvas events to both

pub mod features;
pub mod session;
pub mod surface;

// Re-export commonly used types
pub use features::{
    extract_features, FeatureExtractor, FeatureVector, ResampleFilter, FEATURE_LEN, TARGET_SIZE,
};
pub use session::DrawingSession;
pub use surface::{StrokeState, StrokeStyle, StrokeSurface};
