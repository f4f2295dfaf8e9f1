//! Drawing primitives and the renderer seam
//!
//! The panel controller rasterizes everything it is sent. The host keeps a
//! local model of the back buffer as well, filled by a [`Renderer`]
//! implementation; the crate itself never rasterizes shapes or glyphs.

use alloc::string::String;

use crate::color::Rgb24;
use crate::font::{Font, TextSize};

/// Rectangle with inclusive edges, in panel pixel coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Leftmost column
    pub left: i16,
    /// Topmost row
    pub top: i16,
    /// Rightmost column (inclusive)
    pub right: i16,
    /// Bottom row (inclusive)
    pub bottom: i16,
}

impl Rect {
    /// Create a rectangle from its inclusive edges
    ///
    /// No validation happens here; see [`Rect::is_valid`].
    pub const fn new(left: i16, top: i16, right: i16, bottom: i16) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle covering a whole `width` x `height` panel
    pub const fn full(width: u16, height: u16) -> Self {
        Self::new(0, 0, width as i16 - 1, height as i16 - 1)
    }

    /// Whether the edges are ordered (`left <= right` and `top <= bottom`)
    pub const fn is_valid(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }

    /// Width in pixels, zero for an invalid rectangle
    pub const fn width(&self) -> u32 {
        if self.right < self.left {
            0
        } else {
            (self.right as i32 - self.left as i32 + 1) as u32
        }
    }

    /// Height in pixels, zero for an invalid rectangle
    pub const fn height(&self) -> u32 {
        if self.bottom < self.top {
            0
        } else {
            (self.bottom as i32 - self.top as i32 + 1) as u32
        }
    }

    /// Whether the pixel at `(x, y)` lies inside
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left as i32
            && x <= self.right as i32
            && y >= self.top as i32
            && y <= self.bottom as i32
    }
}

/// A single drawing operation
///
/// Shapes with an optional `fill` are drawn as an outline when `fill` is
/// `None`, and filled (with the outline on top) otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Primitive {
    /// Set a single pixel
    Pixel {
        /// Column
        x: i16,
        /// Row
        y: i16,
        /// Pixel color
        color: Rgb24,
    },
    /// Arbitrary line between two points
    Line {
        /// Start column
        x0: i16,
        /// Start row
        y0: i16,
        /// End column
        x1: i16,
        /// End row
        y1: i16,
        /// Line color
        color: Rgb24,
    },
    /// Vertical line
    VLine {
        /// Column
        x: i16,
        /// Start row
        y0: i16,
        /// End row
        y1: i16,
        /// Line color
        color: Rgb24,
    },
    /// Horizontal line
    HLine {
        /// Start column
        x0: i16,
        /// End column
        x1: i16,
        /// Row
        y: i16,
        /// Line color
        color: Rgb24,
    },
    /// Circle around a center point
    Circle {
        /// Center column
        x: i16,
        /// Center row
        y: i16,
        /// Radius in pixels
        radius: u16,
        /// Outline color
        outline: Rgb24,
        /// Fill color, if filled
        fill: Option<Rgb24>,
    },
    /// Ellipse outline around a center point
    Ellipse {
        /// Center column
        x: i16,
        /// Center row
        y: i16,
        /// Horizontal radius
        radius_x: u16,
        /// Vertical radius
        radius_y: u16,
        /// Outline color
        color: Rgb24,
    },
    /// Triangle through three points
    Triangle {
        /// Corner points as `(x, y)`
        points: [(i16, i16); 3],
        /// Outline color
        outline: Rgb24,
        /// Fill color, if filled
        fill: Option<Rgb24>,
    },
    /// Axis-aligned rectangle
    Rectangle {
        /// Covered area
        rect: Rect,
        /// Outline color
        outline: Rgb24,
        /// Fill color, if filled
        fill: Option<Rgb24>,
    },
    /// Rectangle with rounded corners
    RoundRectangle {
        /// Covered area
        rect: Rect,
        /// Corner radius
        radius: u16,
        /// Outline color
        outline: Rgb24,
        /// Fill color, if filled
        fill: Option<Rgb24>,
    },
    /// Fill the whole buffer
    FillScreen(Rgb24),
    /// Single glyph with its top-left corner at `(x, y)`
    Char {
        /// Column
        x: i16,
        /// Row
        y: i16,
        /// Font to draw with
        font: Font,
        /// Glyph color
        color: Rgb24,
        /// Character
        ch: char,
    },
    /// Line(s) of text with the top-left corner at `(x, y)`
    Text {
        /// Column
        x: i16,
        /// Row
        y: i16,
        /// Font to draw with
        font: Font,
        /// Glyph color
        color: Rgb24,
        /// Cell background; `None` leaves background pixels untouched
        background: Option<Rgb24>,
        /// Text to draw
        text: String,
    },
}

/// Something a [`Renderer`] can write pixels into
///
/// Writes outside the target are ignored by implementations, so renderers
/// do not need to clip.
pub trait PixelTarget {
    /// Target size as `(width, height)`
    fn size(&self) -> (u32, u32);

    /// Write one pixel
    fn set_pixel(&mut self, x: i32, y: i32, color: Rgb24);

    /// Fill an area
    fn fill_rect(&mut self, rect: Rect, color: Rgb24) {
        for y in rect.top as i32..=rect.bottom as i32 {
            for x in rect.left as i32..=rect.right as i32 {
                self.set_pixel(x, y, color);
            }
        }
    }
}

/// Rasterizer used to keep the local frame model in step with the panel
///
/// Implement this with whatever graphics stack the host has; with the
/// `graphics` feature, [`GraphicsTarget`](crate::graphics::GraphicsTarget)
/// lets an implementation draw through embedded-graphics.
pub trait Renderer {
    /// Draw `primitive` into `target`
    fn rasterize(&mut self, primitive: &Primitive, target: &mut dyn PixelTarget);

    /// Pixel size of `text` in `font`
    ///
    /// Defaults to the controller's monospace cell table.
    fn measure_text(&self, font: Font, text: &str) -> TextSize {
        font.text_size(text)
    }
}

/// Renderer that keeps no local image
///
/// Only the device draws; the local buffers stay at their cleared state.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn rasterize(&mut self, _primitive: &Primitive, _target: &mut dyn PixelTarget) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_dimensions() {
        let rect = Rect::new(2, 3, 5, 3);
        assert!(rect.is_valid());
        assert_eq!(rect.width(), 4);
        assert_eq!(rect.height(), 1);
    }

    #[test]
    fn test_inverted_rect_is_invalid_and_empty() {
        let rect = Rect::new(10, 0, 9, 5);
        assert!(!rect.is_valid());
        assert_eq!(rect.width(), 0);
    }

    #[test]
    fn test_rect_contains_is_inclusive() {
        let rect = Rect::full(32, 16);
        assert!(rect.contains(0, 0));
        assert!(rect.contains(31, 15));
        assert!(!rect.contains(32, 15));
        assert!(!rect.contains(-1, 0));
    }
}
