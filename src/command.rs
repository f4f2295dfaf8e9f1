//! Panel controller command definitions
//!
//! Every instruction to the controller is one packet:
//!
//! ```text
//! ┌──────────┬────────┬──────────────────┐
//! │ CATEGORY │ OPCODE │ PAYLOAD          │
//! │ 1B       │ 1B     │ 0–62B            │
//! └──────────┴────────┴──────────────────┘
//! ```
//!
//! Multi-byte integers are little-endian, colors are `r, g, b`. Framing the
//! packet on the physical link is the [`Transport`](crate::Transport)'s job.
//!
//! ## Example
//!
//! ```
//! use matrix_link::{command, Command, Rgb24};
//! use matrix_link::render::Primitive;
//!
//! let cmd = Command::draw(&Primitive::FillScreen(Rgb24::RED)).unwrap();
//! assert_eq!(cmd.category(), command::CATEGORY_DRAWING);
//! assert_eq!(cmd.as_bytes(), &[command::CATEGORY_DRAWING, command::FILL_SCREEN, 255, 0, 0]);
//! ```

use alloc::vec::Vec;

use crate::color::Rgb24;
use crate::error::EncodeError;
use crate::font::Font;
use crate::render::{Primitive, Rect};

/// Category + opcode header size in bytes
pub const HEADER_SIZE: usize = 2;
/// Largest packet the controller accepts
pub const MAX_PACKET: usize = 64;
/// Largest payload that fits a packet
pub const MAX_PAYLOAD: usize = MAX_PACKET - HEADER_SIZE;
/// Fixed payload bytes in front of the text of a [`DRAW_STRING`] packet
pub const TEXT_HEADER_SIZE: usize = 13;
/// Longest text a single [`DRAW_STRING`] packet carries
pub const MAX_TEXT_LEN: usize = MAX_PAYLOAD - TEXT_HEADER_SIZE;

// Categories

/// System control
pub const CATEGORY_SYSTEM: u8 = 0;
/// Display control
pub const CATEGORY_DISPLAY: u8 = 3;
/// Drawing into the back buffer
pub const CATEGORY_DRAWING: u8 = 4;

// System commands

/// Reset the controller
pub const SYSTEM_RESET: u8 = 0;
/// Liveness check, answered with a pong
pub const SYSTEM_PING: u8 = 2;
/// Set the controller clock (u64 unix timestamp)
pub const SYSTEM_TIMESTAMP: u8 = 3;

// Display commands

/// Set brightness: `[foreground, background]`
pub const DISPLAY_BRIGHTNESS: u8 = 2;
/// Present the back buffer: `[flags]`, acknowledged with a swap-ack
pub const DISPLAY_SWAP_BUFFERS: u8 = 3;
/// Select the display mode: `[mode]`
pub const DISPLAY_MODE: u8 = 4;

/// [`DISPLAY_SWAP_BUFFERS`] flag: copy the presented frame into the new back buffer
pub const SWAP_FLAG_COPY: u8 = 0x01;

// Drawing commands

/// `x, y, color`
pub const DRAW_PIXEL: u8 = 20;
/// `x0, y0, x1, y1, color`
pub const DRAW_LINE: u8 = 21;
/// `x, y0, y1, color`
pub const DRAW_FAST_VLINE: u8 = 22;
/// `x0, x1, y, color`
pub const DRAW_FAST_HLINE: u8 = 23;
/// `x, y, radius, color`
pub const DRAW_CIRCLE: u8 = 24;
/// `x, y, radius, outline, fill`
pub const FILL_CIRCLE: u8 = 25;
/// `x, y, radius_x, radius_y, color`
pub const DRAW_ELLIPSE: u8 = 26;
/// `x0, y0, x1, y1, x2, y2, color`
pub const DRAW_TRIANGLE: u8 = 27;
/// `x0, y0, x1, y1, x2, y2, outline, fill`
pub const FILL_TRIANGLE: u8 = 28;
/// `x0, y0, x1, y1, color`
pub const DRAW_RECTANGLE: u8 = 29;
/// `x0, y0, x1, y1, outline, fill`
pub const FILL_RECTANGLE: u8 = 30;
/// `x0, y0, x1, y1, radius, color`
pub const DRAW_ROUND_RECTANGLE: u8 = 31;
/// `x0, y0, x1, y1, radius, outline, fill`
pub const FILL_ROUND_RECTANGLE: u8 = 32;
/// `color`
pub const FILL_SCREEN: u8 = 33;
/// `font`
pub const SET_FONT: u8 = 34;
/// `x, y, color, font, char`
pub const DRAW_CHAR: u8 = 35;
/// `x, y, color, flags, background, font, len, text...`
pub const DRAW_STRING: u8 = 36;
/// `left, top, right, bottom`: clip later drawing to this area
pub const SET_CLIP: u8 = 40;
/// Drop the clip area
pub const RESET_CLIP: u8 = 41;

/// [`DRAW_STRING`] flag: paint the background color behind glyphs
pub const TEXT_FLAG_OPAQUE: u8 = 0x01;

/// Operating mode of the panel controller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum DisplayMode {
    /// Controller runs its own screens (clock, messages, ...)
    #[default]
    Automatic = 0,
    /// Controller only shows what the host draws
    Manual = 6,
}

/// One encoded controller instruction
///
/// Immutable once built; the packet bytes are what the transport receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    packet: Vec<u8>,
}

impl Command {
    /// Build a command from raw parts
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::PayloadTooLarge`] when `payload` exceeds
    /// [`MAX_PAYLOAD`].
    pub fn new(category: u8, opcode: u8, payload: &[u8]) -> Result<Self, EncodeError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(EncodeError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD,
            });
        }
        let mut packet = Vec::with_capacity(HEADER_SIZE + payload.len());
        packet.push(category);
        packet.push(opcode);
        packet.extend_from_slice(payload);
        Ok(Self { packet })
    }

    fn writer(category: u8, opcode: u8) -> PacketWriter {
        PacketWriter {
            packet: alloc::vec![category, opcode],
        }
    }

    /// Reset the controller
    pub fn reset() -> Self {
        Self::writer(CATEGORY_SYSTEM, SYSTEM_RESET).finish()
    }

    /// Liveness check
    pub fn ping() -> Self {
        Self::writer(CATEGORY_SYSTEM, SYSTEM_PING).finish()
    }

    /// Set the controller clock
    pub fn set_time(unix_seconds: u64) -> Self {
        let mut w = Self::writer(CATEGORY_SYSTEM, SYSTEM_TIMESTAMP);
        w.bytes(&unix_seconds.to_le_bytes());
        w.finish()
    }

    /// Set foreground and background brightness
    pub fn brightness(foreground: u8, background: u8) -> Self {
        let mut w = Self::writer(CATEGORY_DISPLAY, DISPLAY_BRIGHTNESS);
        w.u8(foreground).u8(background);
        w.finish()
    }

    /// Present the back buffer
    ///
    /// With `copy`, the controller seeds the new back buffer with the frame it
    /// just presented.
    pub fn swap_buffers(copy: bool) -> Self {
        let mut w = Self::writer(CATEGORY_DISPLAY, DISPLAY_SWAP_BUFFERS);
        w.u8(if copy { SWAP_FLAG_COPY } else { 0 });
        w.finish()
    }

    /// Select the display mode
    pub fn mode(mode: DisplayMode) -> Self {
        let mut w = Self::writer(CATEGORY_DISPLAY, DISPLAY_MODE);
        w.u8(mode as u8);
        w.finish()
    }

    /// Select the font used by the controller's own text drawing
    pub fn set_font(font: Font) -> Self {
        let mut w = Self::writer(CATEGORY_DRAWING, SET_FONT);
        w.u8(font.id());
        w.finish()
    }

    /// Clip subsequent drawing to `rect`
    pub fn set_clip(rect: Rect) -> Self {
        let mut w = Self::writer(CATEGORY_DRAWING, SET_CLIP);
        w.rect(rect);
        w.finish()
    }

    /// Remove the clip area
    pub fn reset_clip() -> Self {
        Self::writer(CATEGORY_DRAWING, RESET_CLIP).finish()
    }

    /// Encode a drawing primitive
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::PayloadTooLarge`] for text longer than
    /// [`MAX_TEXT_LEN`] characters.
    pub fn draw(primitive: &Primitive) -> Result<Self, EncodeError> {
        let cmd = match primitive {
            Primitive::Pixel { x, y, color } => {
                let mut w = Self::writer(CATEGORY_DRAWING, DRAW_PIXEL);
                w.i16(*x).i16(*y).color(*color);
                w
            }
            Primitive::Line {
                x0,
                y0,
                x1,
                y1,
                color,
            } => {
                let mut w = Self::writer(CATEGORY_DRAWING, DRAW_LINE);
                w.i16(*x0).i16(*y0).i16(*x1).i16(*y1).color(*color);
                w
            }
            Primitive::VLine { x, y0, y1, color } => {
                let mut w = Self::writer(CATEGORY_DRAWING, DRAW_FAST_VLINE);
                w.i16(*x).i16(*y0).i16(*y1).color(*color);
                w
            }
            Primitive::HLine { x0, x1, y, color } => {
                let mut w = Self::writer(CATEGORY_DRAWING, DRAW_FAST_HLINE);
                w.i16(*x0).i16(*x1).i16(*y).color(*color);
                w
            }
            Primitive::Circle {
                x,
                y,
                radius,
                outline,
                fill,
            } => {
                let opcode = if fill.is_some() {
                    FILL_CIRCLE
                } else {
                    DRAW_CIRCLE
                };
                let mut w = Self::writer(CATEGORY_DRAWING, opcode);
                w.i16(*x).i16(*y).u16(*radius).color(*outline);
                if let Some(fill) = fill {
                    w.color(*fill);
                }
                w
            }
            Primitive::Ellipse {
                x,
                y,
                radius_x,
                radius_y,
                color,
            } => {
                let mut w = Self::writer(CATEGORY_DRAWING, DRAW_ELLIPSE);
                w.i16(*x).i16(*y).u16(*radius_x).u16(*radius_y).color(*color);
                w
            }
            Primitive::Triangle {
                points,
                outline,
                fill,
            } => {
                let opcode = if fill.is_some() {
                    FILL_TRIANGLE
                } else {
                    DRAW_TRIANGLE
                };
                let mut w = Self::writer(CATEGORY_DRAWING, opcode);
                for (x, y) in points {
                    w.i16(*x).i16(*y);
                }
                w.color(*outline);
                if let Some(fill) = fill {
                    w.color(*fill);
                }
                w
            }
            Primitive::Rectangle {
                rect,
                outline,
                fill,
            } => {
                let opcode = if fill.is_some() {
                    FILL_RECTANGLE
                } else {
                    DRAW_RECTANGLE
                };
                let mut w = Self::writer(CATEGORY_DRAWING, opcode);
                w.rect(*rect).color(*outline);
                if let Some(fill) = fill {
                    w.color(*fill);
                }
                w
            }
            Primitive::RoundRectangle {
                rect,
                radius,
                outline,
                fill,
            } => {
                let opcode = if fill.is_some() {
                    FILL_ROUND_RECTANGLE
                } else {
                    DRAW_ROUND_RECTANGLE
                };
                let mut w = Self::writer(CATEGORY_DRAWING, opcode);
                w.rect(*rect).u16(*radius).color(*outline);
                if let Some(fill) = fill {
                    w.color(*fill);
                }
                w
            }
            Primitive::FillScreen(color) => {
                let mut w = Self::writer(CATEGORY_DRAWING, FILL_SCREEN);
                w.color(*color);
                w
            }
            Primitive::Char {
                x,
                y,
                font,
                color,
                ch,
            } => {
                let mut w = Self::writer(CATEGORY_DRAWING, DRAW_CHAR);
                w.i16(*x).i16(*y).color(*color).u8(font.id()).u8(wire_char(*ch));
                w
            }
            Primitive::Text {
                x,
                y,
                font,
                color,
                background,
                text,
            } => {
                let len = text.chars().count();
                if len > MAX_TEXT_LEN {
                    return Err(EncodeError::PayloadTooLarge {
                        len: TEXT_HEADER_SIZE + len,
                        max: MAX_PAYLOAD,
                    });
                }
                let flags = if background.is_some() {
                    TEXT_FLAG_OPAQUE
                } else {
                    0
                };
                let mut w = Self::writer(CATEGORY_DRAWING, DRAW_STRING);
                w.i16(*x)
                    .i16(*y)
                    .color(*color)
                    .u8(flags)
                    .color(background.unwrap_or(Rgb24::BLACK))
                    .u8(font.id())
                    .u8(len as u8);
                for ch in text.chars() {
                    w.u8(wire_char(ch));
                }
                w
            }
        };
        Ok(cmd.finish())
    }

    /// Command category
    pub fn category(&self) -> u8 {
        self.packet[0]
    }

    /// Opcode within the category
    pub fn opcode(&self) -> u8 {
        self.packet[1]
    }

    /// Payload bytes after the header
    pub fn payload(&self) -> &[u8] {
        &self.packet[HEADER_SIZE..]
    }

    /// Whole packet as handed to the transport
    pub fn as_bytes(&self) -> &[u8] {
        &self.packet
    }

    /// Packet length in bytes
    pub fn wire_len(&self) -> usize {
        self.packet.len()
    }
}

/// The controller's fonts are ASCII only
fn wire_char(ch: char) -> u8 {
    if ch.is_ascii() { ch as u8 } else { b'?' }
}

struct PacketWriter {
    packet: Vec<u8>,
}

impl PacketWriter {
    fn u8(&mut self, value: u8) -> &mut Self {
        self.packet.push(value);
        self
    }

    fn u16(&mut self, value: u16) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    fn i16(&mut self, value: i16) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    fn color(&mut self, color: Rgb24) -> &mut Self {
        self.bytes(&color.to_bytes())
    }

    fn rect(&mut self, rect: Rect) -> &mut Self {
        self.i16(rect.left)
            .i16(rect.top)
            .i16(rect.right)
            .i16(rect.bottom)
    }

    fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.packet.extend_from_slice(bytes);
        self
    }

    fn finish(self) -> Command {
        Command {
            packet: self.packet,
        }
    }
}
