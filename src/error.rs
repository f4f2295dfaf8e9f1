//! Error types for the pipeline
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and session operations ([`Error`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`Error`] - Runtime errors while talking to the panel
//! - [`EncodeError`] - A command that does not fit a packet
//! - [`InvalidBoundary`] - A scroller boundary with inverted edges
//!
//! Link failures and backpressure timeouts are fatal: the session is
//! terminated and every later command fails with [`Error::SessionTerminated`].
//! Everything else is a caller error and leaves the session usable.
//!
//! ## Example
//!
//! ```
//! use matrix_link::{Builder, Dimensions, BuilderError};
//!
//! // Missing dimensions
//! let result = Builder::new().build();
//! assert!(matches!(result, Err(BuilderError::MissingDimensions)));
//!
//! // Invalid dimensions
//! let result = Dimensions::new(0, 16);
//! assert!(result.is_err());
//! ```

use crate::interface::Transport;
use crate::render::Rect;

/// Largest panel edge, in pixels, accepted by [`crate::Dimensions`]
pub const MAX_DIMENSION: u16 = 512;

/// Errors that can occur while driving the panel
///
/// Generic over the transport to preserve its specific error type.
#[derive(Debug)]
pub enum Error<T: Transport> {
    /// Transport failure (transmit or poll)
    ///
    /// Fatal: the session is terminated.
    Link(T::Error),
    /// The device did not free receive capacity in time
    ///
    /// Fatal: the session is terminated.
    BackpressureTimeout {
        /// Bytes still unacknowledged when the wait gave up
        in_flight: usize,
        /// Channel capacity in bytes
        capacity: usize,
    },
    /// A fatal error was seen earlier; no further commands are accepted
    SessionTerminated,
    /// A buffer swap was requested before the previous one was acknowledged
    SwapAlreadyPending,
    /// Scroller boundary with `right < left` or `bottom < top`
    InvalidBoundary(Rect),
    /// Command larger than the channel could ever admit
    CommandTooLarge {
        /// Packet length in bytes
        len: usize,
        /// Channel capacity in bytes
        capacity: usize,
    },
    /// Payload larger than a single packet
    PayloadTooLarge {
        /// Payload length in bytes
        len: usize,
        /// Largest allowed payload
        max: usize,
    },
    /// Scroller index out of range
    InvalidScroller {
        /// Requested index
        index: usize,
        /// Number of scrollers in the session
        count: usize,
    },
}

impl<T: Transport> Error<T> {
    /// Whether this error terminated the session
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Link(_) | Self::BackpressureTimeout { .. } | Self::SessionTerminated
        )
    }
}

impl<T: Transport> core::fmt::Display for Error<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Link(e) => write!(f, "Link error: {e:?}"),
            Self::BackpressureTimeout {
                in_flight,
                capacity,
            } => write!(
                f,
                "Backpressure timeout: {in_flight} of {capacity} bytes never drained"
            ),
            Self::SessionTerminated => write!(f, "Session terminated"),
            Self::SwapAlreadyPending => write!(f, "Swap already pending"),
            Self::InvalidBoundary(r) => write!(
                f,
                "Invalid boundary: left={}, top={}, right={}, bottom={}",
                r.left, r.top, r.right, r.bottom
            ),
            Self::CommandTooLarge { len, capacity } => {
                write!(f, "Command too large: {len} bytes, capacity {capacity}")
            }
            Self::PayloadTooLarge { len, max } => {
                write!(f, "Payload too large: {len} bytes, max {max}")
            }
            Self::InvalidScroller { index, count } => {
                write!(f, "Invalid scroller {index} (have {count})")
            }
        }
    }
}

impl<T: Transport + core::fmt::Debug> core::error::Error for Error<T> {}

/// A command that cannot be encoded into one packet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// Payload larger than a single packet
    PayloadTooLarge {
        /// Payload length in bytes
        len: usize,
        /// Largest allowed payload
        max: usize,
    },
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadTooLarge { len, max } => {
                write!(f, "Payload too large: {len} bytes, max {max}")
            }
        }
    }
}

impl core::error::Error for EncodeError {}

impl<T: Transport> From<EncodeError> for Error<T> {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::PayloadTooLarge { len, max } => Self::PayloadTooLarge { len, max },
        }
    }
}

/// Scroller boundary with inverted edges
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidBoundary(pub Rect);

impl core::fmt::Display for InvalidBoundary {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let r = self.0;
        write!(
            f,
            "Invalid boundary: left={}, top={}, right={}, bottom={}",
            r.left, r.top, r.right, r.bottom
        )
    }
}

impl core::error::Error for InvalidBoundary {}

impl<T: Transport> From<InvalidBoundary> for Error<T> {
    fn from(e: InvalidBoundary) -> Self {
        Self::InvalidBoundary(e.0)
    }
}

/// Errors that can occur when building configuration
///
/// These errors occur during the builder pattern before the session is opened.
#[derive(Debug, PartialEq, Eq)]
pub enum BuilderError {
    /// Dimensions were not specified
    ///
    /// [`Builder::dimensions()`](crate::config::Builder::dimensions) must be called before building.
    MissingDimensions,
    /// Invalid dimensions provided
    ///
    /// See [`Dimensions::new()`](crate::config::Dimensions::new) for constraints.
    InvalidDimensions {
        /// Width in pixels
        width: u16,
        /// Height in pixels
        height: u16,
    },
    /// Channel capacity cannot hold even one full packet
    InvalidCapacity {
        /// Requested capacity in bytes
        capacity: usize,
        /// Smallest accepted capacity
        min: usize,
    },
    /// Scroller count outside `1..=MAX_SCROLLERS`
    InvalidScrollerCount(usize),
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingDimensions => write!(f, "Dimensions must be specified"),
            Self::InvalidDimensions { width, height } => write!(
                f,
                "Invalid dimensions {width}x{height} (each edge 1..={MAX_DIMENSION})"
            ),
            Self::InvalidCapacity { capacity, min } => {
                write!(f, "Invalid channel capacity {capacity} (min {min})")
            }
            Self::InvalidScrollerCount(count) => write!(
                f,
                "Invalid scroller count {count} (1..={})",
                crate::config::MAX_SCROLLERS
            ),
        }
    }
}

impl core::error::Error for BuilderError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use alloc::string::ToString;

    #[test]
    fn test_fatal_classification() {
        let fatal: [Error<MockTransport>; 3] = [
            Error::Link(crate::testing::LinkDown),
            Error::BackpressureTimeout {
                in_flight: 10,
                capacity: 10,
            },
            Error::SessionTerminated,
        ];
        assert!(fatal.iter().all(Error::is_fatal));

        let recoverable: [Error<MockTransport>; 2] = [
            Error::SwapAlreadyPending,
            Error::InvalidBoundary(Rect::new(5, 0, 4, 0)),
        ];
        assert!(!recoverable.iter().any(Error::is_fatal));
    }

    #[test]
    fn test_encode_error_converts() {
        let err: Error<MockTransport> = EncodeError::PayloadTooLarge { len: 70, max: 62 }.into();
        assert!(matches!(err, Error::PayloadTooLarge { len: 70, max: 62 }));
    }

    #[test]
    fn test_display_messages() {
        let err: Error<MockTransport> = Error::InvalidScroller { index: 4, count: 4 };
        assert_eq!(err.to_string(), "Invalid scroller 4 (have 4)");
        assert_eq!(
            BuilderError::InvalidDimensions {
                width: 0,
                height: 16
            }
            .to_string(),
            "Invalid dimensions 0x16 (each edge 1..=512)"
        );
    }
}
