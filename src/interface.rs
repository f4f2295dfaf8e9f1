//! Link abstraction
//!
//! This module provides the [`Transport`] trait, the seam between the command
//! pipeline and whatever carries packets to the panel controller (USB CDC,
//! UART, a socket to a simulator...).
//!
//! ## Contract
//!
//! - [`Transport::transmit`] sends one complete packet. Framing, checksums
//!   and retries at the byte level are the transport's business.
//! - [`Transport::poll`] returns the next event the device reported, or
//!   `None` when nothing is pending. It must not block.
//!
//! Any error returned by either method is treated as a dead link.
//!
//! ## Example
//!
//! ```
//! use core::convert::Infallible;
//! use matrix_link::{DeviceEvent, Transport};
//!
//! /// Loopback that drains every packet immediately
//! struct Loopback {
//!     pending: Option<DeviceEvent>,
//! }
//!
//! impl Transport for Loopback {
//!     type Error = Infallible;
//!
//!     fn transmit(&mut self, packet: &[u8]) -> Result<(), Self::Error> {
//!         self.pending = Some(DeviceEvent::Drained { bytes: packet.len() });
//!         Ok(())
//!     }
//!
//!     fn poll(&mut self) -> Result<Option<DeviceEvent>, Self::Error> {
//!         Ok(self.pending.take())
//!     }
//! }
//!
//! let mut link = Loopback { pending: None };
//! let _ = link.transmit(&[4, 33, 0, 0, 0]);
//! assert!(matches!(link.poll(), Ok(Some(DeviceEvent::Drained { bytes: 5 }))));
//! ```

use core::fmt::Debug;

/// Something the panel controller reports back to the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The device consumed `bytes` from its receive buffer
    Drained {
        /// Number of bytes freed
        bytes: usize,
    },
    /// A requested buffer swap took effect on the panel
    SwapAck,
    /// Answer to a ping
    Pong,
}

/// Trait for the link to the panel controller
///
/// ## Implementing
///
/// Report [`DeviceEvent::Drained`] as the device frees receive space; the
/// channel stops transmitting once its capacity is used up and only resumes
/// when drain events arrive.
pub trait Transport {
    /// Error type for link operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Send one packet to the device
    ///
    /// # Errors
    ///
    /// Returns an error if the link is down.
    fn transmit(&mut self, packet: &[u8]) -> Result<(), Self::Error>;

    /// Fetch the next pending device event without blocking
    ///
    /// # Errors
    ///
    /// Returns an error if the link is down or delivered garbage.
    fn poll(&mut self) -> Result<Option<DeviceEvent>, Self::Error>;
}
