//! Activity counters.
//!
//! Only counts are kept. Drawings and feature vectors are never written
//! to disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What a single increment stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    PointerEvent,
    Stroke,
    Clear,
    Submission,
    FailedSubmission,
}

impl Counter {
    const ALL: [Counter; 5] = [
        Counter::PointerEvent,
        Counter::Stroke,
        Counter::Clear,
        Counter::Submission,
        Counter::FailedSubmission,
    ];
}

/// Plain counter values; this is also the on-disk format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counts {
    pub pointer_events: u64,
    pub strokes: u64,
    pub clears: u64,
    pub submissions: u64,
    pub failed_submissions: u64,
}

impl Counts {
    fn slot(&mut self, counter: Counter) -> &mut u64 {
        match counter {
            Counter::PointerEvent => &mut self.pointer_events,
            Counter::Stroke => &mut self.strokes,
            Counter::Clear => &mut self.clears,
            Counter::Submission => &mut self.submissions,
            Counter::FailedSubmission => &mut self.failed_submissions,
        }
    }
}

impl std::fmt::Display for Counts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Pointer events:     {}", self.pointer_events)?;
        writeln!(f, "Strokes:            {}", self.strokes)?;
        writeln!(f, "Clears:             {}", self.clears)?;
        writeln!(f, "Submissions:        {}", self.submissions)?;
        write!(f, "Failed submissions: {}", self.failed_submissions)
    }
}

/// Counters as reported over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(flatten)]
    pub counts: Counts,
    pub since: DateTime<Utc>,
}

/// Lock-free counters shared by sessions and submitters.
#[derive(Debug)]
pub struct SessionStats {
    values: [AtomicU64; 5],
    since: DateTime<Utc>,
    path: Option<PathBuf>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            values: Default::default(),
            since: Utc::now(),
            path: None,
        }
    }

    /// Counters seeded from `path` and saved back there by [`save`](Self::save).
    ///
    /// An unreadable file starts the counters from zero.
    pub fn persistent(path: PathBuf) -> Self {
        let stats = Self::new();
        match read_counts(&path) {
            Ok(Some(counts)) => stats.add(counts),
            Ok(None) => {}
            Err(e) => tracing::warn!(path = %path.display(), "Ignoring stats file: {e}"),
        }
        Self {
            path: Some(path),
            ..stats
        }
    }

    pub fn record(&self, counter: Counter) {
        self.values[counter as usize].fetch_add(1, Ordering::Relaxed);
    }

    fn add(&self, mut counts: Counts) {
        for counter in Counter::ALL {
            self.values[counter as usize].fetch_add(*counts.slot(counter), Ordering::Relaxed);
        }
    }

    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for counter in Counter::ALL {
            *counts.slot(counter) = self.values[counter as usize].load(Ordering::Relaxed);
        }
        counts
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            counts: self.counts(),
            since: self.since,
        }
    }

    /// Write the counts to the persistence path, if any.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.counts()).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

fn read_counts(path: &Path) -> std::io::Result<Option<Counts>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(std::io::Error::other)
}

pub type SharedStats = Arc<SessionStats>;

pub fn create_shared_stats() -> SharedStats {
    Arc::new(SessionStats::new())
}

pub fn create_persistent_stats(path: PathBuf) -> SharedStats {
    Arc::new(SessionStats::persistent(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("digit-sketch-stats-{}", uuid::Uuid::new_v4()))
            .join("stats.json")
    }

    #[test]
    fn test_counting() {
        let stats = SessionStats::new();
        stats.record(Counter::PointerEvent);
        stats.record(Counter::PointerEvent);
        stats.record(Counter::Stroke);
        stats.record(Counter::FailedSubmission);

        assert_eq!(
            stats.counts(),
            Counts {
                pointer_events: 2,
                strokes: 1,
                failed_submissions: 1,
                ..Counts::default()
            }
        );
    }

    #[test]
    fn test_persistence_accumulates() {
        let path = temp_path();

        let first = SessionStats::persistent(path.clone());
        first.record(Counter::Stroke);
        first.record(Counter::Submission);
        first.save().unwrap();

        let second = SessionStats::persistent(path.clone());
        second.record(Counter::Stroke);
        assert_eq!(second.counts().strokes, 2);
        assert_eq!(second.counts().submissions, 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_file_starts_from_zero() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let stats = SessionStats::persistent(path.clone());
        assert_eq!(stats.counts(), Counts::default());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let counts: Counts = serde_json::from_str(r#"{"strokes": 4}"#).unwrap();
        assert_eq!(counts.strokes, 4);
        assert_eq!(counts.failed_submissions, 0);
    }

    #[test]
    fn test_snapshot_is_flat() {
        let stats = SessionStats::new();
        stats.record(Counter::Clear);
        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["clears"], 1);
        assert!(json["since"].is_string());
    }
}
