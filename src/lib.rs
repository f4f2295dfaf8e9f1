//! Host-side link to an RGB LED matrix controller
//!
//! Drives a matrix panel whose controller renders drawing commands into two
//! frame buffers and swaps them on request. The host sends small command
//! packets over a byte link, never overruns the controller's receive buffer,
//! paces frames on swap acknowledgments and animates scrolling text.
//!
//! ## Features
//!
//! - `no_std` compatible (needs `alloc`)
//! - `embedded-hal` v1.0 delays
//! - Flow-controlled command channel over any [`Transport`]
//! - Double-buffered local frame model with pluggable [`Renderer`]
//! - Host-animated text scrollers with clipping
//! - `embedded-graphics` integration (with `graphics` feature)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use matrix_link::{
//!     Builder, DeviceEvent, Dimensions, DisplayMode, Font, Matrix, NullRenderer, Rect, Rgb24,
//!     Transport,
//! };
//!
//! # struct Serial;
//! # impl Transport for Serial {
//! #     type Error = Infallible;
//! #     fn transmit(&mut self, _packet: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn poll(&mut self) -> Result<Option<DeviceEvent>, Infallible> { Ok(None) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! let dims = match Dimensions::new(64, 32) {
//!     Ok(dims) => dims,
//!     Err(_) => return,
//! };
//! let config = match Builder::new().dimensions(dims).build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//!
//! let matrix = match Matrix::open(Serial, MockDelay, NullRenderer, config) {
//!     Ok(matrix) => matrix,
//!     Err(_) => return,
//! };
//! let _ = matrix.set_mode(DisplayMode::Manual);
//! let _ = matrix.fill_screen(Rgb24::BLACK);
//! let _ = matrix.set_font(Font::Font6x10);
//! let _ = matrix.draw_string(1, 1, Rgb24::YELLOW, "hi");
//! let _ = matrix.draw_rectangle(Rect::new(0, 0, 63, 31), Rgb24::BLUE);
//! let _ = matrix.wait_for_vsync();
//! ```

#![no_std]

extern crate alloc;

/// Flow-controlled command channel
pub mod channel;
/// 24-bit RGB color
pub mod color;
/// Wire commands and opcodes
pub mod command;
/// Session configuration types and builder
pub mod config;
/// Error types
pub mod error;
/// Built-in fonts and text metrics
pub mod font;
/// Byte link abstraction
pub mod interface;
/// Panel session handle and scroller handles
pub mod matrix;
/// Drawing primitives and rasterizer seam
pub mod render;
/// Scrolling text
pub mod scroll;
/// Double-buffered local frame model
pub mod surface;
/// Swap-ack tracking and cooperative waits
pub mod sync;

/// Graphics support via embedded-graphics (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod graphics;

#[cfg(test)]
mod testing;

pub use channel::CommandChannel;
pub use color::Rgb24;
pub use command::{Command, DisplayMode};
pub use config::{Builder, Config, Dimensions, MAX_DIMENSION, MAX_SCROLLERS};
pub use error::{BuilderError, EncodeError, Error, InvalidBoundary};
pub use font::{Font, TextSize};
pub use interface::{DeviceEvent, Transport};
pub use matrix::{Matrix, Scroller};
pub use render::{NullRenderer, PixelTarget, Primitive, Rect, Renderer};
pub use scroll::{
    Boundary, Runs, ScrollConfig, ScrollConfigBuilder, ScrollController, ScrollMode, ScrollState,
    ScrollStatus,
};
pub use surface::{Clipped, FrameSurface, PixelBuffer};
pub use sync::SyncGate;

#[cfg(feature = "graphics")]
pub use graphics::GraphicsTarget;
