//! 24-bit color type for RGB LED matrix panels
//!
//! Every pixel on the panel is driven with one byte per channel. Colors travel
//! on the wire as three bytes in `r, g, b` order.
//!
//! ## Example
//!
//! ```
//! use matrix_link::Rgb24;
//!
//! let amber = Rgb24::new(255, 191, 0);
//! assert_eq!(amber.to_bytes(), [255, 191, 0]);
//! assert_eq!(Rgb24::default(), Rgb24::BLACK);
//! ```

/// A 24-bit RGB color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb24 {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb24 {
    /// All LEDs off
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// All channels at full intensity
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Pure red
    pub const RED: Self = Self::new(255, 0, 0);
    /// Pure green
    pub const GREEN: Self = Self::new(0, 255, 0);
    /// Pure blue
    pub const BLUE: Self = Self::new(0, 0, 255);
    /// Red and green at full intensity
    pub const YELLOW: Self = Self::new(255, 255, 0);

    /// Create a color from its channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Wire representation (`r, g, b`)
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Pick a color from a 256-step red → blue → green → red wheel
    ///
    /// Handy for rainbow effects: feeding an incrementing counter walks the
    /// whole hue circle.
    ///
    /// ```
    /// use matrix_link::Rgb24;
    ///
    /// assert_eq!(Rgb24::color_wheel(0), Rgb24::new(0, 255, 0));
    /// assert_eq!(Rgb24::color_wheel(85), Rgb24::new(255, 0, 0));
    /// assert_eq!(Rgb24::color_wheel(170), Rgb24::new(0, 0, 255));
    /// ```
    pub const fn color_wheel(position: u8) -> Self {
        if position < 85 {
            Self::new(position * 3, 255 - position * 3, 0)
        } else if position < 170 {
            let p = position - 85;
            Self::new(255 - p * 3, 0, p * 3)
        } else {
            let p = position - 170;
            Self::new(0, p * 3, 255 - p * 3)
        }
    }
}

impl From<[u8; 3]> for Rgb24 {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

#[cfg(feature = "graphics")]
impl embedded_graphics_core::prelude::PixelColor for Rgb24 {
    type Raw = embedded_graphics_core::pixelcolor::raw::RawU24;
}

#[cfg(feature = "graphics")]
impl From<embedded_graphics_core::pixelcolor::Rgb888> for Rgb24 {
    fn from(color: embedded_graphics_core::pixelcolor::Rgb888) -> Self {
        use embedded_graphics_core::pixelcolor::RgbColor;
        Self::new(color.r(), color.g(), color.b())
    }
}
