//! Canvas event types.
//!
//! Every pointer event carries a coordinate in raster space. Scripts recorded
//! against a canvas displayed at a different size are brought into raster
//! space through a [`Viewport`].

use serde::{Deserialize, Serialize};

/// A 2-D point in raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A single input from the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanvasEvent {
    /// Pen pressed on the canvas
    PointerDown { x: f32, y: f32 },
    /// Pointer moved (draws only while the pen is down)
    PointerMove { x: f32, y: f32 },
    /// Pen released
    PointerUp { x: f32, y: f32 },
    /// Pointer left the canvas; handled exactly like a release
    PointerLeave { x: f32, y: f32 },
    /// Clear trigger
    Clear,
    /// Submit trigger
    Submit,
}

impl CanvasEvent {
    pub fn down(x: f32, y: f32) -> Self {
        CanvasEvent::PointerDown { x, y }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        CanvasEvent::PointerMove { x, y }
    }

    pub fn up(x: f32, y: f32) -> Self {
        CanvasEvent::PointerUp { x, y }
    }

    pub fn leave(x: f32, y: f32) -> Self {
        CanvasEvent::PointerLeave { x, y }
    }

    /// The coordinate carried by a pointer event, if any.
    pub fn point(&self) -> Option<Point> {
        match *self {
            CanvasEvent::PointerDown { x, y }
            | CanvasEvent::PointerMove { x, y }
            | CanvasEvent::PointerUp { x, y }
            | CanvasEvent::PointerLeave { x, y } => Some(Point::new(x, y)),
            CanvasEvent::Clear | CanvasEvent::Submit => None,
        }
    }

    /// Whether this is one of the four pointer events.
    pub fn is_pointer(&self) -> bool {
        self.point().is_some()
    }

    /// Return the same event with its coordinate rewritten by `f`.
    pub fn map_point(self, f: impl Fn(Point) -> Point) -> Self {
        let apply = |x: f32, y: f32| {
            let p = f(Point::new(x, y));
            (p.x, p.y)
        };
        match self {
            CanvasEvent::PointerDown { x, y } => {
                let (x, y) = apply(x, y);
                CanvasEvent::PointerDown { x, y }
            }
            CanvasEvent::PointerMove { x, y } => {
                let (x, y) = apply(x, y);
                CanvasEvent::PointerMove { x, y }
            }
            CanvasEvent::PointerUp { x, y } => {
                let (x, y) = apply(x, y);
                CanvasEvent::PointerUp { x, y }
            }
            CanvasEvent::PointerLeave { x, y } => {
                let (x, y) = apply(x, y);
                CanvasEvent::PointerLeave { x, y }
            }
            other => other,
        }
    }
}

/// Display size of the canvas element that produced a set of events.
///
/// When a 280 px raster is shown at 560 CSS px, pointer offsets arrive in
/// display units and must be halved before they reach the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Map a display coordinate onto a raster of the given size.
    ///
    /// A degenerate viewport (zero or negative extent) leaves the axis unscaled.
    pub fn to_raster(&self, point: Point, raster_width: u32, raster_height: u32) -> Point {
        let scale = |raster: u32, display: f32| {
            if display > 0.0 {
                raster as f32 / display
            } else {
                1.0
            }
        };
        Point::new(
            point.x * scale(raster_width, self.width),
            point.y * scale(raster_height, self.height),
        )
    }
}
