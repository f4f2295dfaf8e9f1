//! Built-in monospace fonts of the panel controller
//!
//! Glyph bitmaps live on the device; the host only needs each font's cell size
//! to lay text out, center it, and work out how much of a scroller's text is
//! visible.

/// Fonts known to the panel controller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Font {
    /// 3x5 glyphs in a 4x6 cell
    Font3x5 = 0,
    /// 5x7 glyphs in a 5x7 cell
    #[default]
    Font5x7 = 1,
    /// 6x10 glyphs
    Font6x10 = 2,
    /// 8x13 glyphs
    Font8x13 = 3,
    /// Gohufont 6x11
    Gohufont11 = 4,
    /// Gohufont 6x11 bold
    Gohufont11b = 5,
}

/// Size of rendered text in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Font {
    /// Wire identifier
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Character cell as `(width, height)` in pixels
    pub const fn cell(self) -> (u32, u32) {
        match self {
            Self::Font3x5 => (4, 6),
            Self::Font5x7 => (5, 7),
            Self::Font6x10 => (6, 10),
            Self::Font8x13 => (8, 13),
            Self::Gohufont11 | Self::Gohufont11b => (6, 11),
        }
    }

    /// Pixel size of `text`, one cell row per line
    ///
    /// The width is that of the longest line. Empty text measures zero.
    ///
    /// ```
    /// use matrix_link::{Font, TextSize};
    ///
    /// let size = Font::Font6x10.text_size("ab\nabcd");
    /// assert_eq!(size, TextSize { width: 24, height: 20 });
    /// ```
    pub fn text_size(self, text: &str) -> TextSize {
        if text.is_empty() {
            return TextSize::default();
        }
        let (cw, ch) = self.cell();
        let mut lines = 0u32;
        let mut longest = 0u32;
        for line in text.split('\n') {
            lines += 1;
            longest = longest.max(line.chars().count() as u32);
        }
        TextSize {
            width: longest * cw,
            height: lines * ch,
        }
    }

    /// How many cells are needed to cover a `width` x `height` area
    ///
    /// Partially covered cells count, so the result is rounded up.
    pub const fn chars_in_rect(self, width: u32, height: u32) -> (u32, u32) {
        let (cw, ch) = self.cell();
        (width.div_ceil(cw), height.div_ceil(ch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_ids() {
        assert_eq!(Font::Font3x5.id(), 0);
        assert_eq!(Font::default().id(), 1);
        assert_eq!(Font::Gohufont11b.id(), 5);
    }

    #[test]
    fn test_text_size_empty_is_zero() {
        assert_eq!(Font::Font8x13.text_size(""), TextSize::default());
    }

    #[test]
    fn test_text_size_single_line() {
        let size = Font::Gohufont11b.text_size("This");
        assert_eq!(size, TextSize { width: 24, height: 11 });
    }

    #[test]
    fn test_chars_in_rect_rounds_up() {
        assert_eq!(Font::Font5x7.chars_in_rect(32, 16), (7, 3));
        assert_eq!(Font::Font3x5.chars_in_rect(32, 12), (8, 2));
    }
}
