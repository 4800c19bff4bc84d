//! Input handling for the drawing canvas.
//!
//! This module defines the pointer and trigger events the host UI dispatches,
//! plus recorded event scripts for headless sessions.

pub mod script;
pub mod types;

// Re-export commonly used types
pub use script::{EventScript, ScriptError};
pub use types::{CanvasEvent, Point, Viewport};
