//! Event dispatch for a drawing session.
//!
//! A [`DrawingSession`] owns one surface and one extractor. Canvas events are
//! applied synchronously in arrival order; a submit trigger produces a fresh
//! feature vector without touching the drawing.

use crate::core::features::{FeatureExtractor, FeatureVector, ResampleFilter};
use crate::core::surface::{StrokeStyle, StrokeSurface};
use crate::input::types::{CanvasEvent, Point};
use crate::stats::{Counter, SharedStats};

/// Drawing surface plus extraction, driven by canvas events.
#[derive(Debug)]
pub struct DrawingSession {
    surface: StrokeSurface,
    extractor: FeatureExtractor,
    stats: Option<SharedStats>,
}

impl DrawingSession {
    /// Create a session around an existing surface.
    pub fn new(surface: StrokeSurface, extractor: FeatureExtractor) -> Self {
        Self {
            surface,
            extractor,
            stats: None,
        }
    }

    /// Create a square canvas session.
    ///
    /// Returns `None` when the canvas cannot be allocated.
    pub fn square(canvas_size: u32, stroke_width: f32, filter: ResampleFilter) -> Option<Self> {
        let surface =
            StrokeSurface::with_style(canvas_size, canvas_size, StrokeStyle::new(stroke_width))?;
        Some(Self::new(surface, FeatureExtractor::new(filter)))
    }

    /// Record activity into the given counters.
    pub fn with_stats(mut self, stats: SharedStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn surface(&self) -> &StrokeSurface {
        &self.surface
    }

    /// Apply one event. Returns the extracted vector for a submit trigger.
    pub fn handle(&mut self, event: CanvasEvent) -> Option<FeatureVector> {
        if event.is_pointer() {
            if let Some(stats) = &self.stats {
                stats.record(Counter::PointerEvent);
            }
        }

        match event {
            CanvasEvent::PointerDown { x, y } => {
                self.surface.begin_stroke(Point::new(x, y));
                if let Some(stats) = &self.stats {
                    stats.record(Counter::Stroke);
                }
                None
            }
            CanvasEvent::PointerMove { x, y } => {
                self.surface.extend_stroke(Point::new(x, y));
                None
            }
            CanvasEvent::PointerUp { .. } | CanvasEvent::PointerLeave { .. } => {
                self.surface.end_stroke();
                None
            }
            CanvasEvent::Clear => {
                self.clear();
                None
            }
            CanvasEvent::Submit => {
                if let Some(stats) = &self.stats {
                    stats.record(Counter::Submission);
                }
                Some(self.extract())
            }
        }
    }

    /// Apply events in order and collect one vector per submit trigger.
    pub fn replay<I>(&mut self, events: I) -> Vec<FeatureVector>
    where
        I: IntoIterator<Item = CanvasEvent>,
    {
        events
            .into_iter()
            .filter_map(|event| self.handle(event))
            .collect()
    }

    /// Lift the pen and blank the canvas.
    pub fn clear(&mut self) {
        self.surface.end_stroke();
        self.surface.reset();
        if let Some(stats) = &self.stats {
            stats.record(Counter::Clear);
        }
    }

    /// Extract the current drawing.
    pub fn extract(&self) -> FeatureVector {
        self.extractor.extract(&self.surface.snapshot())
    }
}
