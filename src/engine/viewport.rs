use crate::engine::geometry::{Point, Size};

/// Share of the window width a canvas may take by default
pub const DEFAULT_CANVAS_FRACTION: f32 = 0.9;

/// Maps the fixed logical resolution of a game onto the pixel size the
/// canvas actually gets on screen.
///
/// ELI5:
/// ┌──────── logical (game) ────────┐      ┌──── display (canvas) ───┐
/// │ 400 x 600, never changes       │ ───► │ window width * fraction │
/// │ all physics runs in this space │ scale│ same aspect ratio       │
/// └────────────────────────────────┘      └─────────────────────────┘
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    logical: Size,
    display: Size,
}

impl Viewport {
    /// Unscaled viewport, used before the first fit
    pub fn identity(logical: Size) -> Self {
        Viewport {
            logical,
            display: logical,
        }
    }

    /// Largest display size that fits the available space without upscaling
    /// past the logical resolution, keeping the logical aspect ratio.
    pub fn fit(logical: Size, available_width: f32, available_height: f32, fraction: f32) -> Self {
        let aspect = logical.aspect_ratio();
        let mut width = (available_width * fraction).min(logical.width).max(1.0);
        let mut height = width / aspect;
        if available_height > 0.0 && height > available_height {
            height = available_height.max(1.0);
            width = height * aspect;
        }
        Viewport {
            logical,
            display: Size::new(width, height),
        }
    }

    pub fn logical(&self) -> Size {
        self.logical
    }

    pub fn display(&self) -> Size {
        self.display
    }

    /// display pixels per logical pixel
    pub fn scale(&self) -> f32 {
        self.display.width / self.logical.width
    }

    /// Canvas-relative CSS pixel position -> logical scene position
    pub fn to_logical(&self, point: Point) -> Point {
        let scale = self.scale();
        Point::new(point.x / scale, point.y / scale)
    }
}
