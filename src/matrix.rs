//! Panel session and public entry point
//!
//! [`Matrix`] is a cheap handle to the one session that owns the link to the
//! panel: the command channel, the swap gate, the local frame surface and the
//! scrollers. Cloning a `Matrix` gives another handle to the same session;
//! [`Matrix::scroller`] hands out [`Scroller`] handles the same way.
//!
//! Scrollers are animated by the host. Each presented frame
//! ([`Matrix::swap_buffers`] or [`Matrix::wait_for_vsync`]) advances every
//! running scroller by one tick before the swap is sent.
//!
//! ## Example
//!
//! ```
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use matrix_link::{
//!     Builder, DeviceEvent, Dimensions, DisplayMode, Matrix, NullRenderer, Rgb24, Runs,
//!     ScrollStatus, Transport,
//! };
//!
//! # #[derive(Debug, Default)]
//! # struct Link { events: Vec<DeviceEvent> }
//! # impl Transport for Link {
//! #     type Error = Infallible;
//! #     fn transmit(&mut self, packet: &[u8]) -> Result<(), Infallible> {
//! #         self.events.push(DeviceEvent::Drained { bytes: packet.len() });
//! #         if packet[..2] == [3, 3] { self.events.push(DeviceEvent::SwapAck); }
//! #         Ok(())
//! #     }
//! #     fn poll(&mut self) -> Result<Option<DeviceEvent>, Infallible> { Ok(self.events.pop()) }
//! # }
//! # struct Delay;
//! # impl DelayNs for Delay { fn delay_ns(&mut self, _ns: u32) {} }
//! # fn main() -> Result<(), matrix_link::Error<Link>> {
//! let dims = match Dimensions::new(32, 16) {
//!     Ok(dims) => dims,
//!     Err(_) => return Ok(()),
//! };
//! let config = match Builder::new().dimensions(dims).build() {
//!     Ok(config) => config,
//!     Err(_) => return Ok(()),
//! };
//! let matrix = Matrix::open(Link::default(), Delay, NullRenderer, config)?;
//! matrix.set_mode(DisplayMode::Manual)?;
//! matrix.fill_screen(Rgb24::BLACK)?;
//!
//! let scroller = matrix.scroller(0)?;
//! scroller.start("Hello", Runs::Times(1));
//! while scroller.status() != ScrollStatus::Stopped {
//!     if !matrix.wait_for_vsync()? {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::channel::CommandChannel;
use crate::color::Rgb24;
use crate::command::{Command, DisplayMode};
use crate::config::Config;
use crate::error::Error;
use crate::font::{Font, TextSize};
use crate::interface::Transport;
use crate::render::{NullRenderer, Primitive, Rect, Renderer};
use crate::scroll::{Runs, ScrollConfig, ScrollController, ScrollState, ScrollStatus};
use crate::surface::{FrameSurface, PixelBuffer};
use crate::sync::SyncGate;

struct Session<T, D, R> {
    channel: CommandChannel<T, D>,
    gate: SyncGate,
    surface: FrameSurface<R>,
    scrollers: Vec<ScrollController>,
    font: Font,
    vsync_timeout_ms: u32,
}

impl<T, D, R> Session<T, D, R>
where
    T: Transport,
    D: DelayNs,
    R: Renderer,
{
    fn enqueue(&mut self, command: &Command) -> Result<(), Error<T>> {
        self.channel.enqueue(command)
    }

    fn draw(&mut self, primitive: &Primitive) -> Result<(), Error<T>> {
        self.surface.draw(&mut self.channel, primitive)
    }

    fn tick_scrollers(&mut self) -> Result<(), Error<T>> {
        for scroller in &mut self.scrollers {
            scroller.tick(&mut self.surface, &mut self.channel)?;
        }
        Ok(())
    }

    fn present(&mut self, copy: bool) -> Result<(), Error<T>> {
        self.gate.observe(&mut self.channel);
        if self.gate.is_awaiting() {
            return Err(Error::SwapAlreadyPending);
        }
        self.tick_scrollers()?;
        self.surface.swap(&mut self.gate, &mut self.channel, copy)
    }
}

impl<T, D, R> Drop for Session<T, D, R> {
    fn drop(&mut self) {
        debug!("session closed");
    }
}

/// Handle to the panel session
///
/// All handles share one link; clones are cheap. The session closes when
/// the last `Matrix` or [`Scroller`] handle is dropped.
pub struct Matrix<T, D, R = NullRenderer> {
    session: Rc<RefCell<Session<T, D, R>>>,
}

impl<T, D, R> Clone for Matrix<T, D, R> {
    fn clone(&self) -> Self {
        Self {
            session: Rc::clone(&self.session),
        }
    }
}

impl<T, D, R> Matrix<T, D, R>
where
    T: Transport,
    D: DelayNs,
    R: Renderer,
{
    /// Open a session over `transport`
    ///
    /// Selects the configured default font on the device. Every scroller
    /// starts stopped, covering the whole panel.
    ///
    /// # Errors
    ///
    /// Returns the link error if the font selection cannot be sent.
    pub fn open(transport: T, delay: D, renderer: R, config: Config) -> Result<Self, Error<T>> {
        let dims = config.dimensions;
        let mut channel = CommandChannel::from_config(transport, delay, &config);
        channel.enqueue(&Command::set_font(config.default_font))?;

        let scroller_config = ScrollConfig::builder(Rect::full(dims.width, dims.height))
            .font(config.default_font)
            .build();
        let scrollers = (0..config.scroller_count)
            .map(|i| ScrollController::new(i, scroller_config.clone()))
            .collect();

        debug!(
            "session opened: {}x{}, {} scrollers, {} byte channel",
            dims.width, dims.height, config.scroller_count, config.channel_capacity
        );
        Ok(Self {
            session: Rc::new(RefCell::new(Session {
                channel,
                gate: SyncGate::new(),
                surface: FrameSurface::new(dims.width, dims.height, renderer),
                scrollers,
                font: config.default_font,
                vsync_timeout_ms: config.vsync_timeout_ms,
            })),
        })
    }

    fn with<U>(&self, f: impl FnOnce(&mut Session<T, D, R>) -> U) -> U {
        f(&mut self.session.borrow_mut())
    }

    fn with_ref<U>(&self, f: impl FnOnce(&Session<T, D, R>) -> U) -> U {
        f(&self.session.borrow())
    }

    // Display control

    /// Select manual (host-drawn) or automatic mode
    pub fn set_mode(&self, mode: DisplayMode) -> Result<(), Error<T>> {
        debug!("display mode {:?}", mode);
        self.with(|s| s.enqueue(&Command::mode(mode)))
    }

    /// Set foreground and background brightness to `level`
    pub fn set_brightness(&self, level: u8) -> Result<(), Error<T>> {
        self.set_brightness_split(level, level)
    }

    /// Set foreground and background brightness separately
    pub fn set_brightness_split(&self, foreground: u8, background: u8) -> Result<(), Error<T>> {
        self.with(|s| s.enqueue(&Command::brightness(foreground, background)))
    }

    /// Fill the back buffer with `color`
    pub fn fill_screen(&self, color: Rgb24) -> Result<(), Error<T>> {
        self.with(|s| s.draw(&Primitive::FillScreen(color)))
    }

    /// Tick running scrollers and request a swap without waiting
    ///
    /// With `copy`, the new back buffer starts as a copy of the presented frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SwapAlreadyPending`] while the previous swap is not
    /// yet acknowledged.
    pub fn swap_buffers(&self, copy: bool) -> Result<(), Error<T>> {
        self.with(|s| s.present(copy))
    }

    /// Present a frame and wait for the device to show it
    ///
    /// If no swap is pending, ticks running scrollers and sends one (with
    /// copy). Then pumps until the swap-ack arrives or the configured vsync
    /// timeout passes; returns `Ok(false)` on timeout.
    pub fn wait_for_vsync(&self) -> Result<bool, Error<T>> {
        self.wait_for_vsync_n(1, true)
    }

    /// Present `frames` frames, waiting for each swap-ack in turn
    ///
    /// Every frame ticks the running scrollers once. A swap still pending
    /// from an earlier call counts as the first frame. Stops early with
    /// `Ok(false)` if an ack does not arrive within the vsync timeout.
    /// `frames == 0` returns `Ok(true)` without doing anything.
    pub fn wait_for_vsync_n(&self, frames: u32, copy: bool) -> Result<bool, Error<T>> {
        self.with(|s| {
            for _ in 0..frames {
                s.gate.observe(&mut s.channel);
                if !s.gate.is_awaiting() {
                    s.present(copy)?;
                }
                if !s.gate.wait_for_swap(&mut s.channel, s.vsync_timeout_ms)? {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }

    /// Sleep while keeping the link serviced
    ///
    /// Only pumps device events: scrollers do not move while sleeping, they
    /// advance once per frame presented with [`Matrix::swap_buffers`] or
    /// [`Matrix::wait_for_vsync`].
    ///
    /// Returns `false` if the link failed; the session is terminated then.
    pub fn safe_sleep(&self, duration: Duration) -> bool {
        let ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        self.with(|s| {
            if s.channel.is_terminated() {
                return false;
            }
            match s.gate.sleep(&mut s.channel, ms) {
                Ok(()) => true,
                Err(e) => {
                    warn!("sleep aborted: {}", e);
                    false
                }
            }
        })
    }

    /// Handle pending device events without blocking
    pub fn pump(&self) -> Result<usize, Error<T>> {
        self.with(|s| {
            let handled = s.channel.pump()?;
            s.gate.observe(&mut s.channel);
            Ok(handled)
        })
    }

    /// Pump until the device has drained every sent byte, or `timeout` passes
    pub fn flush(&self, timeout: Duration) -> Result<bool, Error<T>> {
        let ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        self.with(|s| s.gate.wait_for_drain(&mut s.channel, ms))
    }

    // Scrollers

    /// Handle to scroller `index`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScroller`] if `index` is out of range.
    pub fn scroller(&self, index: usize) -> Result<Scroller<T, D, R>, Error<T>> {
        let count = self.scroller_count();
        if index >= count {
            return Err(Error::InvalidScroller { index, count });
        }
        Ok(Scroller {
            session: Rc::clone(&self.session),
            index,
        })
    }

    /// Number of scrollers in the session
    pub fn scroller_count(&self) -> usize {
        self.with_ref(|s| s.scrollers.len())
    }

    /// Advance every running scroller by one tick, in index order
    pub fn tick_scrollers(&self) -> Result<(), Error<T>> {
        self.with(Session::tick_scrollers)
    }

    // Drawing

    /// Draw any primitive
    pub fn draw(&self, primitive: &Primitive) -> Result<(), Error<T>> {
        self.with(|s| s.draw(primitive))
    }

    /// Set one pixel
    pub fn draw_pixel(&self, x: i16, y: i16, color: Rgb24) -> Result<(), Error<T>> {
        self.draw(&Primitive::Pixel { x, y, color })
    }

    /// Draw a line; axis-aligned lines are sent as fast lines
    pub fn draw_line(&self, x0: i16, y0: i16, x1: i16, y1: i16, color: Rgb24) -> Result<(), Error<T>> {
        if x0 == x1 {
            return self.draw_fast_vline(x0, y0, y1, color);
        }
        if y0 == y1 {
            return self.draw_fast_hline(x0, x1, y0, color);
        }
        self.draw(&Primitive::Line {
            x0,
            y0,
            x1,
            y1,
            color,
        })
    }

    /// Draw a vertical line
    pub fn draw_fast_vline(&self, x: i16, y0: i16, y1: i16, color: Rgb24) -> Result<(), Error<T>> {
        self.draw(&Primitive::VLine { x, y0, y1, color })
    }

    /// Draw a horizontal line
    pub fn draw_fast_hline(&self, x0: i16, x1: i16, y: i16, color: Rgb24) -> Result<(), Error<T>> {
        self.draw(&Primitive::HLine { x0, x1, y, color })
    }

    /// Draw a circle outline
    pub fn draw_circle(&self, x: i16, y: i16, radius: u16, color: Rgb24) -> Result<(), Error<T>> {
        self.draw(&Primitive::Circle {
            x,
            y,
            radius,
            outline: color,
            fill: None,
        })
    }

    /// Draw a filled circle with an outline
    pub fn fill_circle(
        &self,
        x: i16,
        y: i16,
        radius: u16,
        outline: Rgb24,
        fill: Rgb24,
    ) -> Result<(), Error<T>> {
        self.draw(&Primitive::Circle {
            x,
            y,
            radius,
            outline,
            fill: Some(fill),
        })
    }

    /// Draw an ellipse outline
    pub fn draw_ellipse(
        &self,
        x: i16,
        y: i16,
        radius_x: u16,
        radius_y: u16,
        color: Rgb24,
    ) -> Result<(), Error<T>> {
        self.draw(&Primitive::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
            color,
        })
    }

    /// Draw a triangle outline
    pub fn draw_triangle(&self, points: [(i16, i16); 3], color: Rgb24) -> Result<(), Error<T>> {
        self.draw(&Primitive::Triangle {
            points,
            outline: color,
            fill: None,
        })
    }

    /// Draw a filled triangle with an outline
    pub fn fill_triangle(
        &self,
        points: [(i16, i16); 3],
        outline: Rgb24,
        fill: Rgb24,
    ) -> Result<(), Error<T>> {
        self.draw(&Primitive::Triangle {
            points,
            outline,
            fill: Some(fill),
        })
    }

    /// Draw a rectangle outline
    pub fn draw_rectangle(&self, rect: Rect, color: Rgb24) -> Result<(), Error<T>> {
        self.draw(&Primitive::Rectangle {
            rect,
            outline: color,
            fill: None,
        })
    }

    /// Draw a filled rectangle with an outline
    pub fn fill_rectangle(&self, rect: Rect, outline: Rgb24, fill: Rgb24) -> Result<(), Error<T>> {
        self.draw(&Primitive::Rectangle {
            rect,
            outline,
            fill: Some(fill),
        })
    }

    /// Draw a rounded rectangle outline
    pub fn draw_round_rectangle(&self, rect: Rect, radius: u16, color: Rgb24) -> Result<(), Error<T>> {
        self.draw(&Primitive::RoundRectangle {
            rect,
            radius,
            outline: color,
            fill: None,
        })
    }

    /// Draw a filled rounded rectangle with an outline
    pub fn fill_round_rectangle(
        &self,
        rect: Rect,
        radius: u16,
        outline: Rgb24,
        fill: Rgb24,
    ) -> Result<(), Error<T>> {
        self.draw(&Primitive::RoundRectangle {
            rect,
            radius,
            outline,
            fill: Some(fill),
        })
    }

    // Text

    /// Select the font for `draw_char` and `draw_string`
    pub fn set_font(&self, font: Font) -> Result<(), Error<T>> {
        self.with(|s| {
            s.enqueue(&Command::set_font(font))?;
            s.font = font;
            Ok(())
        })
    }

    /// Currently selected font
    pub fn font(&self) -> Font {
        self.with_ref(|s| s.font)
    }

    /// Draw one character in the current font
    pub fn draw_char(&self, x: i16, y: i16, color: Rgb24, ch: char) -> Result<(), Error<T>> {
        self.with(|s| {
            let font = s.font;
            s.draw(&Primitive::Char {
                x,
                y,
                font,
                color,
                ch,
            })
        })
    }

    /// Draw text in the current font, leaving background pixels untouched
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] for text that does not fit one
    /// packet ([`MAX_TEXT_LEN`](crate::command::MAX_TEXT_LEN) characters).
    pub fn draw_string(&self, x: i16, y: i16, color: Rgb24, text: &str) -> Result<(), Error<T>> {
        self.draw_text(x, y, color, None, text)
    }

    /// Draw text in the current font over a background color
    pub fn draw_string_with_background(
        &self,
        x: i16,
        y: i16,
        color: Rgb24,
        background: Rgb24,
        text: &str,
    ) -> Result<(), Error<T>> {
        self.draw_text(x, y, color, Some(background), text)
    }

    fn draw_text(
        &self,
        x: i16,
        y: i16,
        color: Rgb24,
        background: Option<Rgb24>,
        text: &str,
    ) -> Result<(), Error<T>> {
        self.with(|s| {
            let font = s.font;
            s.draw(&Primitive::Text {
                x,
                y,
                font,
                color,
                background,
                text: String::from(text),
            })
        })
    }

    /// Pixel size of `text` in `font`
    pub fn string_dims(&self, font: Font, text: &str) -> TextSize {
        self.with_ref(|s| s.surface.measure_text(font, text))
    }

    /// Character cells of `font` needed to cover `width` x `height` pixels
    pub fn chars_in_rect(&self, font: Font, width: u32, height: u32) -> (u32, u32) {
        font.chars_in_rect(width, height)
    }

    // System

    /// Reset the panel controller
    pub fn reset_device(&self) -> Result<(), Error<T>> {
        debug!("device reset");
        self.with(|s| s.enqueue(&Command::reset()))
    }

    /// Check the device answers; `Ok(false)` if no pong within the vsync timeout
    pub fn ping(&self) -> Result<bool, Error<T>> {
        self.with(|s| {
            s.channel.pump()?;
            s.channel.take_pongs();
            s.enqueue(&Command::ping())?;
            let mut waited = 0u32;
            loop {
                s.gate.observe(&mut s.channel);
                if s.channel.take_pongs() > 0 {
                    return Ok(true);
                }
                if waited >= s.vsync_timeout_ms {
                    warn!("no pong after {} ms", waited);
                    return Ok(false);
                }
                let step = s.channel.poll_interval_ms();
                s.channel.idle(step)?;
                waited = waited.saturating_add(step);
            }
        })
    }

    /// Set the device clock
    pub fn set_time(&self, unix_seconds: u64) -> Result<(), Error<T>> {
        self.with(|s| s.enqueue(&Command::set_time(unix_seconds)))
    }

    // Introspection

    /// Panel width in pixels
    pub fn width(&self) -> u32 {
        self.with_ref(|s| s.surface.width())
    }

    /// Panel height in pixels
    pub fn height(&self) -> u32 {
        self.with_ref(|s| s.surface.height())
    }

    /// Whether a fatal error ended the session
    pub fn is_terminated(&self) -> bool {
        self.with_ref(|s| s.channel.is_terminated())
    }

    /// Whether a swap is waiting for its acknowledgment
    pub fn swap_pending(&self) -> bool {
        self.with(|s| {
            s.gate.observe(&mut s.channel);
            s.gate.is_awaiting()
        })
    }

    /// Bytes sent and not yet drained by the device
    pub fn in_flight(&self) -> usize {
        self.with_ref(|s| s.channel.in_flight())
    }

    /// Run `f` on the local front and back buffers
    ///
    /// The session is borrowed for reading while `f` runs: `f` may call
    /// the read-only accessors of any handle, but drawing, swapping or
    /// waiting from inside `f` panics.
    pub fn with_frames<U>(&self, f: impl FnOnce(&PixelBuffer, &PixelBuffer) -> U) -> U {
        self.with_ref(|s| f(s.surface.front(), s.surface.back()))
    }

    /// Run `f` on the transport
    ///
    /// Same borrowing rules as [`Matrix::with_frames`].
    pub fn with_transport<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        self.with_ref(|s| f(s.channel.transport()))
    }
}

/// Handle to one scroller of a [`Matrix`] session
///
/// Configuration and start/append only change local state; commands go out
/// when the scroller is ticked or stopped.
pub struct Scroller<T, D, R = NullRenderer> {
    session: Rc<RefCell<Session<T, D, R>>>,
    index: usize,
}

impl<T, D, R> Clone for Scroller<T, D, R> {
    fn clone(&self) -> Self {
        Self {
            session: Rc::clone(&self.session),
            index: self.index,
        }
    }
}

impl<T, D, R> Scroller<T, D, R>
where
    T: Transport,
    D: DelayNs,
    R: Renderer,
{
    fn with<U>(&self, f: impl FnOnce(&mut ScrollController) -> U) -> U {
        f(&mut self.session.borrow_mut().scrollers[self.index])
    }

    fn with_ref<U>(&self, f: impl FnOnce(&ScrollController) -> U) -> U {
        f(&self.session.borrow().scrollers[self.index])
    }

    /// Index within the session
    pub fn index(&self) -> usize {
        self.index
    }

    /// Replace the configuration; takes effect on the next tick
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBoundary`] for a boundary with inverted edges.
    pub fn configure(&self, config: ScrollConfig) -> Result<(), Error<T>> {
        self.with(|c| c.configure(config)).map_err(Error::from)
    }

    /// Copy of the current configuration
    pub fn config(&self) -> ScrollConfig {
        self.with_ref(|c| c.config().clone())
    }

    /// Start scrolling `text`; `-1` or [`Runs::Forever`] runs until stopped
    pub fn start(&self, text: &str, runs: impl Into<Runs>) {
        let runs = runs.into();
        self.with(|c| c.start(text, runs));
    }

    /// Add text after the current content, or start a single pass
    pub fn append(&self, text: &str) {
        self.with(|c| c.append(text));
    }

    /// Stop at once and clear the boundary
    pub fn stop(&self) -> Result<(), Error<T>> {
        let mut guard = self.session.borrow_mut();
        let s = &mut *guard;
        s.scrollers[self.index].stop(&mut s.surface, &mut s.channel)
    }

    /// Passes left
    ///
    /// Only changes as frames are presented; polling it around
    /// [`Matrix::safe_sleep`] alone never sees a finite run end.
    pub fn status(&self) -> ScrollStatus {
        self.with_ref(|c| c.status())
    }

    /// Lifecycle state
    pub fn state(&self) -> ScrollState {
        self.with_ref(|c| c.state())
    }

    /// Text being scrolled
    pub fn text(&self) -> String {
        self.with_ref(|c| String::from(c.text()))
    }

    /// Characters in the current text
    pub fn char_count(&self) -> usize {
        self.with_ref(|c| c.char_count())
    }

    /// Pieces of text started or appended since the last start
    pub fn line_count(&self) -> usize {
        self.with_ref(|c| c.line_count())
    }

    /// Left edge of the text in pixels, relative to the boundary left
    pub fn position(&self) -> i32 {
        self.with_ref(|c| c.position())
    }
}
