//! Double-buffered local model of the panel
//!
//! [`FrameSurface`] mirrors the device's two frame buffers. Every draw is
//! encoded and sent to the device, then rasterized into the local back
//! buffer by the session's [`Renderer`]. A swap exchanges the local buffers
//! at once; the panel shows the new frame only after its swap-ack.
//!
//! ## Example
//!
//! ```
//! use matrix_link::{PixelBuffer, PixelTarget, Rect, Rgb24};
//!
//! let mut buffer = PixelBuffer::new(8, 4);
//! {
//!     let mut clipped = buffer.clipped(Rect::new(2, 0, 3, 3));
//!     clipped.fill_rect(Rect::new(0, 0, 7, 3), Rgb24::RED);
//! }
//! assert_eq!(buffer.get(1, 0), Some(Rgb24::BLACK));
//! assert_eq!(buffer.get(2, 0), Some(Rgb24::RED));
//! assert_eq!(buffer.get(4, 3), Some(Rgb24::BLACK));
//! ```

use alloc::vec;
use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::channel::CommandChannel;
use crate::color::Rgb24;
use crate::command::Command;
use crate::error::Error;
use crate::font::{Font, TextSize};
use crate::interface::Transport;
use crate::render::{PixelTarget, Primitive, Rect, Renderer};
use crate::sync::SyncGate;

/// Row-major RGB pixel store
///
/// Writes outside the buffer are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb24>,
}

impl PixelBuffer {
    /// Create a black buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb24::BLACK; width as usize * height as usize],
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at `(x, y)`, or `None` outside the buffer
    pub fn get(&self, x: i32, y: i32) -> Option<Rgb24> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// All pixels, row by row
    pub fn pixels(&self) -> &[Rgb24] {
        &self.pixels
    }

    /// Set every pixel to `color`
    pub fn fill(&mut self, color: Rgb24) {
        self.pixels.fill(color);
    }

    /// View that drops writes outside `clip`
    pub fn clipped(&mut self, clip: Rect) -> Clipped<'_> {
        Clipped::new(self, clip)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl PixelTarget for PixelBuffer {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Rgb24) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }
}

/// A [`PixelTarget`] restricted to a clip rectangle
pub struct Clipped<'a> {
    target: &'a mut dyn PixelTarget,
    clip: Rect,
}

impl<'a> Clipped<'a> {
    /// Wrap `target` so only pixels inside `clip` are written
    pub fn new(target: &'a mut dyn PixelTarget, clip: Rect) -> Self {
        Self { target, clip }
    }
}

impl PixelTarget for Clipped<'_> {
    fn size(&self) -> (u32, u32) {
        self.target.size()
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Rgb24) {
        if self.clip.contains(x, y) {
            self.target.set_pixel(x, y, color);
        }
    }
}

/// Front and back buffers plus the renderer that fills them
pub struct FrameSurface<R> {
    front: PixelBuffer,
    back: PixelBuffer,
    renderer: R,
}

impl<R: Renderer> FrameSurface<R> {
    /// Create a surface with both buffers black
    pub fn new(width: u16, height: u16, renderer: R) -> Self {
        let buffer = PixelBuffer::new(u32::from(width), u32::from(height));
        Self {
            front: buffer.clone(),
            back: buffer,
            renderer,
        }
    }

    /// Fill the back buffer with `color`
    pub fn clear<T: Transport, D: DelayNs>(
        &mut self,
        channel: &mut CommandChannel<T, D>,
        color: Rgb24,
    ) -> Result<(), Error<T>> {
        self.draw(channel, &Primitive::FillScreen(color))
    }

    /// Send `primitive` to the device and draw it into the back buffer
    ///
    /// Does not wait for the device to render it.
    pub fn draw<T: Transport, D: DelayNs>(
        &mut self,
        channel: &mut CommandChannel<T, D>,
        primitive: &Primitive,
    ) -> Result<(), Error<T>> {
        channel.enqueue(&Command::draw(primitive)?)?;
        self.renderer.rasterize(primitive, &mut self.back);
        Ok(())
    }

    /// Draw `primitives` with every pixel outside `clip` left untouched
    ///
    /// The device receives the batch between a clip and a clip reset; the
    /// local copy is clipped here regardless of what the renderer does. All
    /// primitives are encoded before anything is sent.
    pub fn draw_clipped<T: Transport, D: DelayNs>(
        &mut self,
        channel: &mut CommandChannel<T, D>,
        primitives: &[Primitive],
        clip: Rect,
    ) -> Result<(), Error<T>> {
        let commands = primitives
            .iter()
            .map(Command::draw)
            .collect::<Result<Vec<_>, _>>()?;
        channel.enqueue(&Command::set_clip(clip))?;
        for command in &commands {
            channel.enqueue(command)?;
        }
        channel.enqueue(&Command::reset_clip())?;

        let mut target = self.back.clipped(clip);
        for primitive in primitives {
            self.renderer.rasterize(primitive, &mut target);
        }
        Ok(())
    }

    /// Request a swap and exchange the local buffers
    ///
    /// With `copy`, the new back buffer starts as a copy of the frame just
    /// presented; otherwise it holds the previous front frame. The panel
    /// changes only after the swap-ack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SwapAlreadyPending`] while an earlier swap is
    /// unacknowledged; the buffers are not exchanged then.
    pub fn swap<T: Transport, D: DelayNs>(
        &mut self,
        gate: &mut SyncGate,
        channel: &mut CommandChannel<T, D>,
        copy: bool,
    ) -> Result<(), Error<T>> {
        gate.request_swap(channel, copy)?;
        core::mem::swap(&mut self.front, &mut self.back);
        if copy {
            self.back.clone_from(&self.front);
        }
        Ok(())
    }

    /// Buffer last handed to the device for display
    pub fn front(&self) -> &PixelBuffer {
        &self.front
    }

    /// Buffer being drawn
    pub fn back(&self) -> &PixelBuffer {
        &self.back
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.back.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.back.height()
    }

    /// The renderer
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Pixel size of `text` in `font`, as the renderer measures it
    pub fn measure_text(&self, font: Font, text: &str) -> TextSize {
        self.renderer.measure_text(font, text)
    }
}
