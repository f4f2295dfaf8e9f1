//! Graphics support via embedded-graphics
//!
//! This module provides [`GraphicsTarget`], which implements the
//! [`DrawTarget`](embedded_graphics_core::draw_target::DrawTarget) trait from
//! the embedded-graphics ecosystem on top of any [`PixelTarget`]. A
//! [`Renderer`](crate::Renderer) can use it to rasterize the crate's
//! primitives with embedded-graphics instead of drawing pixels by hand.
//!
//! ## Example
//!
//! ```rust
//! use embedded_graphics::{
//!     prelude::*,
//!     primitives::{Circle, PrimitiveStyle},
//! };
//! use matrix_link::{GraphicsTarget, PixelBuffer, Rgb24};
//!
//! let mut buffer = PixelBuffer::new(16, 16);
//! let mut target = GraphicsTarget::new(&mut buffer);
//! let _ = Circle::new(Point::new(2, 2), 9)
//!     .into_styled(PrimitiveStyle::with_fill(Rgb24::RED))
//!     .draw(&mut target);
//! assert_eq!(buffer.get(6, 6), Some(Rgb24::RED));
//! ```

use core::convert::Infallible;
use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    prelude::Pixel,
};

use crate::color::Rgb24;
use crate::render::PixelTarget;

/// embedded-graphics view of a [`PixelTarget`]
///
/// Out-of-range pixels are dropped, as the wrapped target does.
pub struct GraphicsTarget<'a> {
    target: &'a mut dyn PixelTarget,
}

impl<'a> GraphicsTarget<'a> {
    /// Wrap `target`
    pub fn new(target: &'a mut dyn PixelTarget) -> Self {
        Self { target }
    }
}

impl DrawTarget for GraphicsTarget<'_> {
    type Color = Rgb24;
    type Error = Infallible;

    fn draw_iter<Iter>(&mut self, pixels: Iter) -> Result<(), Self::Error>
    where
        Iter: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            self.target.set_pixel(x, y, color);
        }
        Ok(())
    }
}

impl OriginDimensions for GraphicsTarget<'_> {
    fn size(&self) -> Size {
        let (width, height) = self.target.size();
        Size::new(width, height)
    }
}
