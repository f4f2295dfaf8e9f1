//! Session configuration types and builder

use crate::command::MAX_PACKET;
use crate::font::Font;

pub use crate::error::{BuilderError, MAX_DIMENSION};

/// Most scrollers a session can carry
pub const MAX_SCROLLERS: usize = 16;

/// Panel dimensions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels (columns)
    pub width: u16,
    /// Height in pixels (rows)
    pub height: u16,
}

impl Dimensions {
    /// Create new dimensions with validation
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidDimensions` if either edge is zero or
    /// larger than [`MAX_DIMENSION`].
    pub fn new(width: u16, height: u16) -> Result<Self, BuilderError> {
        if width == 0 || width > MAX_DIMENSION || height == 0 || height > MAX_DIMENSION {
            return Err(BuilderError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }
}

/// Session configuration
///
/// Use `Builder` to create a Config.
#[derive(Clone, Debug)]
pub struct Config {
    /// Panel dimensions
    pub dimensions: Dimensions,
    /// Device receive buffer size in bytes
    pub channel_capacity: usize,
    /// Delay between pumps while waiting
    pub poll_interval_ms: u32,
    /// How long `enqueue` waits for capacity before giving up
    pub backpressure_timeout_ms: u32,
    /// How long `wait_for_vsync` waits for a swap-ack
    pub vsync_timeout_ms: u32,
    /// Number of scrollers
    pub scroller_count: usize,
    /// Font selected when the session opens
    pub default_font: Font,
}

/// Builder for constructing session configuration
///
/// # Example
///
/// ```rust
/// use matrix_link::{Builder, Dimensions, Font};
///
/// let dims = match Dimensions::new(32, 16) {
///     Ok(dims) => dims,
///     Err(_) => return,
/// };
/// let config = match Builder::new()
///     .dimensions(dims)
///     .scroller_count(2)
///     .default_font(Font::Font3x5)
///     .build()
/// {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert_eq!(config.channel_capacity, 512);
/// ```
#[must_use]
pub struct Builder {
    /// Panel dimensions (required)
    dimensions: Option<Dimensions>,
    channel_capacity: usize,
    poll_interval_ms: u32,
    backpressure_timeout_ms: u32,
    vsync_timeout_ms: u32,
    scroller_count: usize,
    default_font: Font,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            dimensions: None,
            // Receive FIFO of the stock controller firmware
            channel_capacity: 512,
            poll_interval_ms: 1,
            backpressure_timeout_ms: 1_000,
            vsync_timeout_ms: 1_000,
            scroller_count: 4,
            default_font: Font::Font5x7,
        }
    }
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set panel dimensions (required)
    pub fn dimensions(mut self, dims: Dimensions) -> Self {
        self.dimensions = Some(dims);
        self
    }

    /// Set the device receive buffer size in bytes
    pub fn channel_capacity(mut self, bytes: usize) -> Self {
        self.channel_capacity = bytes;
        self
    }

    /// Set the delay between pumps while waiting
    ///
    /// Zero is treated as 1 ms.
    pub fn poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set how long an enqueue waits for free capacity
    pub fn backpressure_timeout_ms(mut self, ms: u32) -> Self {
        self.backpressure_timeout_ms = ms;
        self
    }

    /// Set how long a vsync wait lasts before giving up
    pub fn vsync_timeout_ms(mut self, ms: u32) -> Self {
        self.vsync_timeout_ms = ms;
        self
    }

    /// Set the number of scrollers
    pub fn scroller_count(mut self, count: usize) -> Self {
        self.scroller_count = count;
        self
    }

    /// Set the font selected when the session opens
    pub fn default_font(mut self, font: Font) -> Self {
        self.default_font = font;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::MissingDimensions` if dimensions were not set,
    /// `BuilderError::InvalidCapacity` if the capacity cannot hold a full
    /// packet, and `BuilderError::InvalidScrollerCount` if the scroller count
    /// is zero or above [`MAX_SCROLLERS`].
    pub fn build(self) -> Result<Config, BuilderError> {
        let dimensions = self.dimensions.ok_or(BuilderError::MissingDimensions)?;
        if self.channel_capacity < MAX_PACKET {
            return Err(BuilderError::InvalidCapacity {
                capacity: self.channel_capacity,
                min: MAX_PACKET,
            });
        }
        if self.scroller_count == 0 || self.scroller_count > MAX_SCROLLERS {
            return Err(BuilderError::InvalidScrollerCount(self.scroller_count));
        }
        Ok(Config {
            dimensions,
            channel_capacity: self.channel_capacity,
            poll_interval_ms: self.poll_interval_ms.max(1),
            backpressure_timeout_ms: self.backpressure_timeout_ms,
            vsync_timeout_ms: self.vsync_timeout_ms,
            scroller_count: self.scroller_count,
            default_font: self.default_font,
        })
    }
}
