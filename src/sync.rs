//! Swap-ack tracking and cooperative waits
//!
//! A buffer swap is only visible once the device acknowledges it at its next
//! refresh. [`SyncGate`] allows one unacknowledged swap at a time and offers
//! the waits used for frame pacing. All of them pump the link through
//! [`CommandChannel::idle`] while they wait.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::channel::CommandChannel;
use crate::command::Command;
use crate::error::Error;
use crate::interface::Transport;

/// Outstanding swap-ack state
#[derive(Debug, Default)]
pub struct SyncGate {
    awaiting: bool,
    /// Acknowledged swaps since the session opened
    presented: u64,
}

impl SyncGate {
    /// Create a gate with no swap pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a swap has been sent and not yet acknowledged
    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    /// Number of acknowledged swaps
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Claim swap-acks the channel has already pumped
    pub(crate) fn observe<T: Transport, D: DelayNs>(
        &mut self,
        channel: &mut CommandChannel<T, D>,
    ) {
        let acks = channel.take_swap_acks();
        if acks == 0 {
            return;
        }
        if !self.awaiting || acks > 1 {
            warn!("unexpected swap-ack ({} received)", acks);
        }
        if self.awaiting {
            self.awaiting = false;
            self.presented += 1;
            debug!("swap acknowledged (frame {})", self.presented);
        }
    }

    /// Send a buffer swap
    ///
    /// # Errors
    ///
    /// Returns [`Error::SwapAlreadyPending`] if the previous swap has not been
    /// acknowledged, or any error from [`CommandChannel::enqueue`].
    pub fn request_swap<T: Transport, D: DelayNs>(
        &mut self,
        channel: &mut CommandChannel<T, D>,
        copy: bool,
    ) -> Result<(), Error<T>> {
        self.observe(channel);
        if self.awaiting {
            return Err(Error::SwapAlreadyPending);
        }
        channel.enqueue(&Command::swap_buffers(copy))?;
        self.awaiting = true;
        Ok(())
    }

    /// Pump until the pending swap is acknowledged or `timeout_ms` passes
    ///
    /// Returns `Ok(true)` once acknowledged (immediately if nothing is
    /// pending) and `Ok(false)` on timeout, in which case the swap stays
    /// pending.
    ///
    /// # Errors
    ///
    /// Propagates link failures from [`CommandChannel::idle`].
    pub fn wait_for_swap<T: Transport, D: DelayNs>(
        &mut self,
        channel: &mut CommandChannel<T, D>,
        timeout_ms: u32,
    ) -> Result<bool, Error<T>> {
        self.observe(channel);
        let mut waited = 0u32;
        while self.awaiting {
            if waited >= timeout_ms {
                warn!("no swap-ack after {} ms", waited);
                return Ok(false);
            }
            let step = channel.poll_interval_ms();
            channel.idle(step)?;
            self.observe(channel);
            waited = waited.saturating_add(step);
        }
        Ok(true)
    }

    /// Pump until every transmitted byte is drained or `timeout_ms` passes
    ///
    /// # Errors
    ///
    /// Propagates link failures from [`CommandChannel::idle`].
    pub fn wait_for_drain<T: Transport, D: DelayNs>(
        &mut self,
        channel: &mut CommandChannel<T, D>,
        timeout_ms: u32,
    ) -> Result<bool, Error<T>> {
        channel.pump()?;
        self.observe(channel);
        let mut waited = 0u32;
        while channel.in_flight() > 0 {
            if waited >= timeout_ms {
                return Ok(false);
            }
            let step = channel.poll_interval_ms();
            channel.idle(step)?;
            self.observe(channel);
            waited = waited.saturating_add(step);
        }
        Ok(true)
    }

    /// Wait `ms` milliseconds, pumping every poll interval
    ///
    /// # Errors
    ///
    /// Aborts with the link failure if the transport dies mid-wait.
    pub fn sleep<T: Transport, D: DelayNs>(
        &mut self,
        channel: &mut CommandChannel<T, D>,
        ms: u32,
    ) -> Result<(), Error<T>> {
        let mut remaining = ms;
        while remaining > 0 {
            let step = remaining.min(channel.poll_interval_ms());
            channel.idle(step)?;
            self.observe(channel);
            remaining -= step;
        }
        Ok(())
    }
}
