//! Recorded event scripts.
//!
//! A script is either a JSON document with an optional viewport and an event
//! list, or a JSON Lines file holding one event per line.

use crate::input::types::{CanvasEvent, Viewport};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A recorded drawing session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventScript {
    /// Display size the events were recorded at (raster space when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    /// Events in dispatch order
    pub events: Vec<CanvasEvent>,
}

impl EventScript {
    pub fn new(events: Vec<CanvasEvent>) -> Self {
        Self {
            viewport: None,
            events,
        }
    }

    /// Load a script from disk. Files ending in `.jsonl` are read as JSON Lines.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ScriptError::Io(e.to_string()))?;

        if path.extension().map(|e| e == "jsonl").unwrap_or(false) {
            Self::from_json_lines(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Parse the JSON document form.
    pub fn from_json(content: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(content).map_err(|e| ScriptError::Parse {
            line: e.line(),
            message: e.to_string(),
        })
    }

    /// Parse the JSON Lines form. Blank lines are skipped.
    pub fn from_json_lines(content: &str) -> Result<Self, ScriptError> {
        let mut events = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let event: CanvasEvent = serde_json::from_str(line).map_err(|e| ScriptError::Parse {
                line: idx + 1,
                message: e.to_string(),
            })?;
            events.push(event);
        }
        Ok(Self::new(events))
    }

    /// Events with coordinates mapped onto a raster of the given size.
    pub fn raster_events(&self, raster_width: u32, raster_height: u32) -> Vec<CanvasEvent> {
        match self.viewport {
            Some(viewport) => self
                .events
                .iter()
                .map(|e| e.map_point(|p| viewport.to_raster(p, raster_width, raster_height)))
                .collect(),
            None => self.events.clone(),
        }
    }

    /// Number of submit triggers in the script.
    pub fn submit_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CanvasEvent::Submit))
            .count()
    }
}

/// Script loading errors.
#[derive(Debug)]
pub enum ScriptError {
    Io(String),
    Parse { line: usize, message: String },
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptError::Io(e) => write!(f, "IO error: {e}"),
            ScriptError::Parse { line, message } => {
                write!(f, "Parse error on line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for ScriptError {}
