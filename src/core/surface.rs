//! Stroke rendering surface.
//!
//! The surface owns an opaque RGBA raster and a two-state stroke session.
//! Pen strokes are rendered as anti-aliased, round-capped line segments so
//! that consecutive segments read as one continuous curve.

use crate::input::types::Point;
use image::{Rgba, RgbaImage};
use tiny_skia::{Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Canvas edge length the default stroke width is tuned for.
pub const REFERENCE_CANVAS_SIZE: u32 = 280;

/// Stroke width on a [`REFERENCE_CANVAS_SIZE`] canvas, in pixels.
pub const REFERENCE_STROKE_WIDTH: f32 = 20.0;

/// Stroke session state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeState {
    /// Pen up
    Idle,
    /// Pen down; `last` is the end of the most recent segment
    Drawing { last: Point },
}

/// Fixed pen style: solid black, round caps and joins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// Line width in raster pixels
    pub width: f32,
}

impl StrokeStyle {
    pub fn new(width: f32) -> Self {
        Self { width }
    }

    /// The reference pen width scaled to a canvas of the given size.
    pub fn for_canvas(width: u32, height: u32) -> Self {
        let edge = width.min(height) as f32;
        Self::new(REFERENCE_STROKE_WIDTH * edge / REFERENCE_CANVAS_SIZE as f32)
    }

    fn paint(&self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(Color::BLACK);
        paint.anti_alias = true;
        paint
    }

    fn stroke(&self) -> Stroke {
        Stroke {
            width: self.width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        }
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::new(REFERENCE_STROKE_WIDTH)
    }
}

/// Interactive drawing surface.
#[derive(Debug, Clone)]
pub struct StrokeSurface {
    pixmap: Pixmap,
    state: StrokeState,
    style: StrokeStyle,
}

impl StrokeSurface {
    /// Create a blank surface with the pen width scaled to its size.
    ///
    /// Returns `None` when either dimension is zero or the raster would not
    /// fit in memory.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Self::with_style(width, height, StrokeStyle::for_canvas(width, height))
    }

    /// Create a blank surface with an explicit pen style.
    pub fn with_style(width: u32, height: u32, style: StrokeStyle) -> Option<Self> {
        let pixmap = Pixmap::new(width, height)?;
        let mut surface = Self {
            pixmap,
            state: StrokeState::Idle,
            style,
        };
        surface.reset();
        Some(surface)
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn state(&self) -> StrokeState {
        self.state
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, StrokeState::Drawing { .. })
    }

    /// Fill the whole raster with opaque white.
    ///
    /// Only the raster is touched; an open stroke session stays open.
    pub fn reset(&mut self) {
        self.pixmap.fill(Color::WHITE);
    }

    /// Put the pen down at `point`.
    ///
    /// Nothing is rendered until the pen moves. A begin while already drawing
    /// restarts the session at the new point.
    pub fn begin_stroke(&mut self, point: Point) {
        tracing::debug!(x = point.x, y = point.y, "stroke begin");
        self.state = StrokeState::Drawing { last: point };
    }

    /// Draw a segment from the last point to `point`. No-op while the pen is up.
    ///
    /// A point with a non-finite coordinate is dropped and the stroke continues
    /// from the previous point.
    pub fn extend_stroke(&mut self, point: Point) {
        let StrokeState::Drawing { last } = self.state else {
            return;
        };
        if self.draw_segment(last, point) {
            self.state = StrokeState::Drawing { last: point };
        }
    }

    /// Lift the pen. Idempotent.
    pub fn end_stroke(&mut self) {
        if self.is_drawing() {
            tracing::debug!("stroke end");
        }
        self.state = StrokeState::Idle;
    }

    /// Owned, straight-alpha copy of the current raster.
    pub fn snapshot(&self) -> RgbaImage {
        let width = self.width();
        let pixels = self.pixmap.pixels();
        RgbaImage::from_fn(width, self.height(), |x, y| {
            let c = pixels[(y * width + x) as usize].demultiply();
            Rgba([c.red(), c.green(), c.blue(), c.alpha()])
        })
    }

    /// RGBA value at a raster position, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    /// Whether every pixel is still opaque white.
    pub fn is_blank(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| {
            let c = p.demultiply();
            c.red() == 255 && c.green() == 255 && c.blue() == 255 && c.alpha() == 255
        })
    }

    fn draw_segment(&mut self, from: Point, to: Point) -> bool {
        if !(to.x.is_finite() && to.y.is_finite()) {
            tracing::trace!(?from, ?to, "segment skipped");
            return false;
        }

        let mut builder = PathBuilder::new();
        builder.move_to(from.x, from.y);
        builder.line_to(to.x, to.y);
        let Some(path) = builder.finish() else {
            tracing::trace!(?from, ?to, "segment skipped");
            return false;
        };

        self.pixmap.stroke_path(
            &path,
            &self.style.paint(),
            &self.style.stroke(),
            Transform::identity(),
            None,
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> StrokeSurface {
        StrokeSurface::new(280, 280).unwrap()
    }

    #[test]
    fn test_new_surface_is_white() {
        let surface = surface();
        assert!(surface.is_blank());
        assert_eq!(surface.state(), StrokeState::Idle);
        assert_eq!(surface.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(280, 0), None);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(StrokeSurface::new(0, 280).is_none());
        assert!(StrokeSurface::new(280, 0).is_none());
    }

    #[test]
    fn test_style_scales_with_canvas() {
        assert_eq!(StrokeStyle::for_canvas(280, 280).width, 20.0);
        assert_eq!(StrokeStyle::for_canvas(560, 700).width, 40.0);
        assert_eq!(StrokeStyle::default().width, REFERENCE_STROKE_WIDTH);
    }

    #[test]
    fn test_stroke_darkens_raster() {
        let mut surface = surface();
        surface.begin_stroke(Point::new(50.0, 140.0));
        assert!(surface.is_drawing());
        // Begin alone renders nothing
        assert!(surface.is_blank());

        surface.extend_stroke(Point::new(230.0, 140.0));
        surface.end_stroke();

        assert_eq!(surface.pixel(140, 140), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(140, 20), Some([255, 255, 255, 255]));
        assert!(!surface.is_blank());
    }

    #[test]
    fn test_extend_while_idle_is_noop() {
        let mut surface = surface();
        let before = surface.snapshot();

        surface.extend_stroke(Point::new(10.0, 10.0));
        surface.extend_stroke(Point::new(200.0, 200.0));

        assert_eq!(surface.snapshot(), before);
        assert_eq!(surface.state(), StrokeState::Idle);
    }

    #[test]
    fn test_extend_after_end_is_noop() {
        let mut surface = surface();
        surface.begin_stroke(Point::new(10.0, 10.0));
        surface.extend_stroke(Point::new(100.0, 10.0));
        surface.end_stroke();
        let before = surface.snapshot();

        surface.extend_stroke(Point::new(100.0, 250.0));
        assert_eq!(surface.snapshot(), before);
    }

    #[test]
    fn test_end_stroke_idempotent() {
        let mut surface = surface();
        surface.begin_stroke(Point::new(20.0, 20.0));
        surface.extend_stroke(Point::new(60.0, 60.0));
        surface.end_stroke();

        let state = surface.state();
        let raster = surface.snapshot();
        surface.end_stroke();

        assert_eq!(surface.state(), state);
        assert_eq!(surface.snapshot(), raster);
    }

    #[test]
    fn test_last_point_tracks_extension() {
        let mut surface = surface();
        surface.begin_stroke(Point::new(1.0, 2.0));
        surface.extend_stroke(Point::new(3.0, 4.0));
        assert_eq!(
            surface.state(),
            StrokeState::Drawing {
                last: Point::new(3.0, 4.0)
            }
        );
    }

    #[test]
    fn test_out_of_bounds_is_clipped() {
        let mut surface = surface();
        surface.begin_stroke(Point::new(5.0, 5.0));
        surface.extend_stroke(Point::new(400.0, 400.0));
        surface.end_stroke();

        assert_eq!(surface.pixel(279, 279), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(279, 0), Some([255, 255, 255, 255]));
        assert_eq!(surface.snapshot().dimensions(), (280, 280));
    }

    #[test]
    fn test_reset_clears_drawing() {
        let mut surface = surface();
        surface.begin_stroke(Point::new(10.0, 10.0));
        surface.extend_stroke(Point::new(270.0, 270.0));
        surface.end_stroke();
        assert!(!surface.is_blank());

        surface.reset();
        assert!(surface.is_blank());
        surface.reset();
        assert!(surface.is_blank());
    }

    #[test]
    fn test_non_finite_point_keeps_stroke_alive() {
        let mut surface = surface();
        surface.begin_stroke(Point::new(50.0, 140.0));
        surface.extend_stroke(Point::new(f32::NAN, 140.0));
        surface.extend_stroke(Point::new(100.0, f32::INFINITY));
        assert_eq!(
            surface.state(),
            StrokeState::Drawing {
                last: Point::new(50.0, 140.0)
            }
        );
        assert!(surface.is_blank());

        surface.extend_stroke(Point::new(230.0, 140.0));
        assert_eq!(surface.pixel(140, 140), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_snapshot_mid_stroke() {
        let mut surface = surface();
        surface.begin_stroke(Point::new(140.0, 20.0));
        surface.extend_stroke(Point::new(140.0, 200.0));

        let snapshot = surface.snapshot();
        assert!(surface.is_drawing());
        assert_eq!(snapshot.get_pixel(140, 100).0, [0, 0, 0, 255]);
    }
}
