//! Bounded outbound command queue
//!
//! The panel controller has a fixed receive buffer. [`CommandChannel`] keeps
//! count of bytes sent but not yet drained by the device and refuses to
//! overrun that buffer: when a command does not fit, `enqueue` waits,
//! pumping device events, until enough space has been reported free.
//!
//! The link is single threaded, so the only way capacity comes back is by
//! reading the device's events. Every wait in this crate therefore goes
//! through [`CommandChannel::idle`], which delays and then pumps.
//!
//! A transport error is fatal. The channel marks itself terminated and
//! rejects everything afterwards; commands are never retried since the
//! device may already have applied part of the stream.

use embedded_hal::delay::DelayNs;
use log::{debug, error, trace, warn};

use crate::command::Command;
use crate::config::Config;
use crate::error::Error;
use crate::interface::{DeviceEvent, Transport};

/// Default delay between pumps while waiting
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 1;
/// Default bound on how long `enqueue` waits for capacity
pub const DEFAULT_BACKPRESSURE_TIMEOUT_MS: u32 = 1_000;

/// Flow-controlled command queue over a [`Transport`]
pub struct CommandChannel<T, D> {
    transport: T,
    delay: D,
    /// Device receive buffer size in bytes
    capacity: usize,
    /// Bytes transmitted but not yet drained
    in_flight: usize,
    poll_interval_ms: u32,
    backpressure_timeout_ms: u32,
    /// Swap-acks seen by `pump` and not yet claimed
    swap_acks: u32,
    /// Pongs seen by `pump` and not yet claimed
    pongs: u32,
    terminated: bool,
}

impl<T, D> CommandChannel<T, D>
where
    T: Transport,
    D: DelayNs,
{
    /// Create a channel for a device with `capacity` bytes of receive buffer
    pub fn new(transport: T, delay: D, capacity: usize) -> Self {
        Self {
            transport,
            delay,
            capacity,
            in_flight: 0,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            backpressure_timeout_ms: DEFAULT_BACKPRESSURE_TIMEOUT_MS,
            swap_acks: 0,
            pongs: 0,
            terminated: false,
        }
    }

    /// Create a channel using the capacity and timing from `config`
    pub fn from_config(transport: T, delay: D, config: &Config) -> Self {
        let mut channel = Self::new(transport, delay, config.channel_capacity);
        channel
            .set_poll_interval(config.poll_interval_ms)
            .set_backpressure_timeout(config.backpressure_timeout_ms);
        channel
    }

    /// Set the delay between pumps while waiting
    ///
    /// Zero is treated as 1 ms.
    pub fn set_poll_interval(&mut self, ms: u32) -> &mut Self {
        self.poll_interval_ms = ms.max(1);
        self
    }

    /// Set how long `enqueue` waits for capacity before giving up
    pub fn set_backpressure_timeout(&mut self, ms: u32) -> &mut Self {
        self.backpressure_timeout_ms = ms;
        self
    }

    /// Transmit `command`, waiting for receive space if needed
    ///
    /// # Errors
    ///
    /// - [`Error::SessionTerminated`] after an earlier fatal error
    /// - [`Error::CommandTooLarge`] if the command exceeds the whole capacity
    /// - [`Error::BackpressureTimeout`] if the device does not drain in time (fatal)
    /// - [`Error::Link`] on a transport failure (fatal)
    pub fn enqueue(&mut self, command: &Command) -> Result<(), Error<T>> {
        if self.terminated {
            return Err(Error::SessionTerminated);
        }
        let len = command.wire_len();
        if len > self.capacity {
            return Err(Error::CommandTooLarge {
                len,
                capacity: self.capacity,
            });
        }

        if self.in_flight + len > self.capacity {
            self.pump()?;
        }
        let mut waited = 0u32;
        while self.in_flight + len > self.capacity {
            if waited >= self.backpressure_timeout_ms {
                error!(
                    "backpressure timeout: {} of {} bytes in flight after {} ms",
                    self.in_flight, self.capacity, waited
                );
                self.terminated = true;
                return Err(Error::BackpressureTimeout {
                    in_flight: self.in_flight,
                    capacity: self.capacity,
                });
            }
            self.idle(self.poll_interval_ms)?;
            waited = waited.saturating_add(self.poll_interval_ms);
        }

        self.transport
            .transmit(command.as_bytes())
            .map_err(|e| self.fail(e))?;
        self.in_flight += len;
        trace!(
            "tx {:02x}:{:02x} ({} bytes, {} in flight)",
            command.category(),
            command.opcode(),
            len,
            self.in_flight
        );
        Ok(())
    }

    /// Handle every pending device event without blocking
    ///
    /// Returns the number of events handled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Link`] on a transport failure (fatal) and
    /// [`Error::SessionTerminated`] after an earlier fatal error.
    pub fn pump(&mut self) -> Result<usize, Error<T>> {
        if self.terminated {
            return Err(Error::SessionTerminated);
        }
        let mut handled = 0;
        loop {
            match self.transport.poll() {
                Ok(Some(event)) => {
                    self.handle(event);
                    handled += 1;
                }
                Ok(None) => break,
                Err(e) => return Err(self.fail(e)),
            }
        }
        if handled > 0 {
            trace!("pumped {} events, {} bytes in flight", handled, self.in_flight);
        }
        Ok(handled)
    }

    /// Wait `ms` milliseconds, then pump
    ///
    /// This is the single cooperative wait step every blocking operation
    /// is built from.
    ///
    /// # Errors
    ///
    /// Same as [`CommandChannel::pump`].
    pub fn idle(&mut self, ms: u32) -> Result<(), Error<T>> {
        self.delay.delay_ms(ms);
        self.pump().map(|_| ())
    }

    fn handle(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Drained { bytes } => {
                if bytes > self.in_flight {
                    warn!(
                        "device drained {} bytes with only {} in flight",
                        bytes, self.in_flight
                    );
                }
                self.in_flight = self.in_flight.saturating_sub(bytes);
            }
            DeviceEvent::SwapAck => self.swap_acks = self.swap_acks.saturating_add(1),
            DeviceEvent::Pong => self.pongs = self.pongs.saturating_add(1),
        }
    }

    fn fail(&mut self, e: T::Error) -> Error<T> {
        error!("link failure: {:?}", e);
        if !self.terminated {
            debug!("session terminated");
        }
        self.terminated = true;
        Error::Link(e)
    }

    /// Claim the swap-acks observed so far
    pub(crate) fn take_swap_acks(&mut self) -> u32 {
        core::mem::take(&mut self.swap_acks)
    }

    /// Claim the pongs observed so far
    pub(crate) fn take_pongs(&mut self) -> u32 {
        core::mem::take(&mut self.pongs)
    }

    /// Bytes transmitted and not yet drained by the device
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Device receive buffer size in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Delay between pumps while waiting
    pub fn poll_interval_ms(&self) -> u32 {
        self.poll_interval_ms
    }

    /// Whether a fatal error ended the session
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The underlying delay
    pub fn delay(&self) -> &D {
        &self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb24;
    use crate::command::{self, MAX_PACKET};
    use crate::render::Primitive;
    use crate::testing::{LinkDown, MockDelay, MockTransport};

    fn pixel(x: i16) -> Command {
        Command::draw(&Primitive::Pixel {
            x,
            y: 0,
            color: Rgb24::WHITE,
        })
        .unwrap()
    }

    #[test]
    fn test_commands_arrive_in_enqueue_order() {
        let link = MockTransport::new();
        let mut channel = CommandChannel::new(link.clone(), MockDelay::default(), 64);
        // 9-byte packets in a 64-byte buffer: forces several backpressure waits
        for x in 0..40 {
            channel.enqueue(&pixel(x)).unwrap();
        }
        let xs: alloc::vec::Vec<i16> = link
            .packets()
            .iter()
            .map(|p| i16::from_le_bytes([p[2], p[3]]))
            .collect();
        assert_eq!(xs, (0..40).collect::<alloc::vec::Vec<_>>());
    }

    #[test]
    fn test_in_flight_never_exceeds_capacity() {
        let link = MockTransport::new();
        let mut channel = CommandChannel::new(link, MockDelay::default(), 64);
        for x in 0..100 {
            channel.enqueue(&pixel(x)).unwrap();
            assert!(channel.in_flight() <= channel.capacity());
        }
    }

    #[test]
    fn test_stalled_device_times_out_and_terminates() {
        let link = MockTransport::stalled();
        let mut channel = CommandChannel::new(link.clone(), MockDelay::default(), 64);
        channel.set_backpressure_timeout(20);
        let mut result = Ok(());
        for x in 0..10 {
            result = channel.enqueue(&pixel(x));
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(
            result,
            Err(Error::BackpressureTimeout { capacity: 64, .. })
        ));
        assert!(channel.is_terminated());
        // 7 packets of 9 bytes fit
        assert_eq!(link.packets().len(), 7);
        assert!(channel.delay().elapsed_ms() >= 20);
        assert!(matches!(
            channel.enqueue(&pixel(0)),
            Err(Error::SessionTerminated)
        ));
    }

    #[test]
    fn test_command_larger_than_capacity_is_rejected() {
        let mut channel = CommandChannel::new(MockTransport::new(), MockDelay::default(), 4);
        let result = channel.enqueue(&pixel(0));
        assert!(matches!(
            result,
            Err(Error::CommandTooLarge {
                len: 9,
                capacity: 4
            })
        ));
        assert!(!channel.is_terminated());
    }

    #[test]
    fn test_transmit_failure_is_fatal() {
        let link = MockTransport::new();
        let mut channel = CommandChannel::new(link.clone(), MockDelay::default(), MAX_PACKET);
        link.fail_transmits();
        assert!(matches!(
            channel.enqueue(&pixel(0)),
            Err(Error::Link(LinkDown))
        ));
        assert!(channel.is_terminated());
        assert!(matches!(channel.pump(), Err(Error::SessionTerminated)));
    }

    #[test]
    fn test_pump_routes_events() {
        let link = MockTransport::new();
        let mut channel = CommandChannel::new(link.clone(), MockDelay::default(), 512);
        channel.enqueue(&Command::swap_buffers(false)).unwrap();
        channel.enqueue(&Command::ping()).unwrap();
        assert_eq!(channel.in_flight(), 5);
        // drained, swap-ack, drained, pong
        assert_eq!(channel.pump().unwrap(), 4);
        assert_eq!(channel.in_flight(), 0);
        assert_eq!(channel.take_swap_acks(), 1);
        assert_eq!(channel.take_swap_acks(), 0);
        assert_eq!(channel.take_pongs(), 1);
        assert_eq!(link.count(command::CATEGORY_SYSTEM, command::SYSTEM_PING), 1);
    }

    #[test]
    fn test_idle_delays_then_pumps() {
        let link = MockTransport::new();
        let mut channel = CommandChannel::new(link.clone(), MockDelay::default(), 512);
        link.push_event(DeviceEvent::SwapAck);
        channel.idle(5).unwrap();
        assert_eq!(channel.delay().elapsed_ms(), 5);
        assert_eq!(channel.take_swap_acks(), 1);
    }

    #[test]
    fn test_over_drain_saturates() {
        let link = MockTransport::new();
        let mut channel = CommandChannel::new(link.clone(), MockDelay::default(), 512);
        link.push_event(DeviceEvent::Drained { bytes: 100 });
        channel.pump().unwrap();
        assert_eq!(channel.in_flight(), 0);
    }
}
