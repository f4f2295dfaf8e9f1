//! Mock link, delay and renderer shared by the unit tests

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use embedded_hal::delay::DelayNs;

use crate::color::Rgb24;
use crate::command::{self, Command};
use crate::interface::{DeviceEvent, Transport};
use crate::render::{PixelTarget, Primitive, Rect, Renderer};

/// Error returned once the mock link is cut
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkDown;

#[derive(Debug)]
pub struct MockState {
    /// Every packet transmitted, in order
    pub packets: Vec<Vec<u8>>,
    pub events: VecDeque<DeviceEvent>,
    /// Report drain events for transmitted packets
    pub drain: bool,
    /// Acknowledge swaps
    pub ack_swaps: bool,
    pub polls: usize,
    /// Fail every poll once `polls` reaches this
    pub fail_at_poll: Option<usize>,
    pub fail_transmit: bool,
}

/// Mock link; clones share state so a test can keep a handle
#[derive(Clone, Debug)]
pub struct MockTransport {
    pub state: Rc<RefCell<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                packets: Vec::new(),
                events: VecDeque::new(),
                drain: true,
                ack_swaps: true,
                polls: 0,
                fail_at_poll: None,
                fail_transmit: false,
            })),
        }
    }

    /// A device that never frees receive space
    pub fn stalled() -> Self {
        let link = Self::new();
        link.state.borrow_mut().drain = false;
        link
    }

    pub fn without_swap_acks(self) -> Self {
        self.state.borrow_mut().ack_swaps = false;
        self
    }

    /// Cut the link after `n` more polls
    pub fn fail_after_polls(&self, n: usize) {
        let mut state = self.state.borrow_mut();
        state.fail_at_poll = Some(state.polls + n);
    }

    pub fn fail_transmits(&self) {
        self.state.borrow_mut().fail_transmit = true;
    }

    pub fn push_event(&self, event: DeviceEvent) {
        self.state.borrow_mut().events.push_back(event);
    }

    pub fn packets(&self) -> Vec<Vec<u8>> {
        self.state.borrow().packets.clone()
    }

    /// `(category, opcode)` of every packet sent
    pub fn opcodes(&self) -> Vec<(u8, u8)> {
        self.state
            .borrow()
            .packets
            .iter()
            .map(|p| (p[0], p[1]))
            .collect()
    }

    pub fn count(&self, category: u8, opcode: u8) -> usize {
        self.opcodes()
            .iter()
            .filter(|&&op| op == (category, opcode))
            .count()
    }

    pub fn clear_packets(&self) {
        self.state.borrow_mut().packets.clear();
    }
}

impl Transport for MockTransport {
    type Error = LinkDown;

    fn transmit(&mut self, packet: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.fail_transmit {
            return Err(LinkDown);
        }
        state.packets.push(packet.to_vec());
        if state.drain {
            state.events.push_back(DeviceEvent::Drained {
                bytes: packet.len(),
            });
        }
        let header = (packet[0], packet[1]);
        if state.ack_swaps && header == (command::CATEGORY_DISPLAY, command::DISPLAY_SWAP_BUFFERS)
        {
            state.events.push_back(DeviceEvent::SwapAck);
        }
        if header == (command::CATEGORY_SYSTEM, command::SYSTEM_PING) {
            state.events.push_back(DeviceEvent::Pong);
        }
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<DeviceEvent>, Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.fail_at_poll.is_some_and(|at| state.polls >= at) {
            return Err(LinkDown);
        }
        state.polls += 1;
        Ok(state.events.pop_front())
    }
}

/// Delay that only counts
#[derive(Debug, Default)]
pub struct MockDelay {
    pub elapsed_ns: u64,
}

impl MockDelay {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }
}

/// Renderer that paints whole character cells and filled rectangles
#[derive(Debug, Default)]
pub struct BlockRenderer {
    pub calls: usize,
}

impl Renderer for BlockRenderer {
    fn rasterize(&mut self, primitive: &Primitive, target: &mut dyn PixelTarget) {
        self.calls += 1;
        match primitive {
            Primitive::Pixel { x, y, color } => target.set_pixel(i32::from(*x), i32::from(*y), *color),
            Primitive::FillScreen(color) => {
                let (w, h) = target.size();
                target.fill_rect(Rect::new(0, 0, w as i16 - 1, h as i16 - 1), *color);
            }
            Primitive::Rectangle {
                rect,
                outline,
                fill,
            } => target.fill_rect(*rect, fill.unwrap_or(*outline)),
            Primitive::Char {
                x,
                y,
                font,
                color,
                ch,
            } => paint_cells(target, *x, *y, font.cell(), core::iter::once(*ch), *color),
            Primitive::Text {
                x,
                y,
                font,
                color,
                text,
                ..
            } => paint_cells(target, *x, *y, font.cell(), text.chars(), *color),
            _ => {}
        }
    }
}

fn paint_cells(
    target: &mut dyn PixelTarget,
    x: i16,
    y: i16,
    (cw, ch): (u32, u32),
    chars: impl Iterator<Item = char>,
    color: Rgb24,
) {
    for (i, c) in chars.enumerate() {
        if c == ' ' {
            continue;
        }
        let left = i32::from(x) + i as i32 * cw as i32;
        let top = i32::from(y);
        for py in top..top + ch as i32 {
            for px in left..left + cw as i32 {
                target.set_pixel(px, py, color);
            }
        }
    }
}

/// Whether `cmd` reached the mock link
pub fn sent(link: &MockTransport, cmd: &Command) -> bool {
    link.packets().iter().any(|p| p.as_slice() == cmd.as_bytes())
}
