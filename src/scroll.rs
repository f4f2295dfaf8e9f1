//! Marquee text scrollers
//!
//! A [`ScrollController`] animates one line of text inside a boundary
//! rectangle. Each [`tick`](ScrollController::tick) moves the text by its
//! speed, clears the boundary to the background color and redraws the
//! characters that are visible, clipped to the boundary.
//!
//! Positions are kept in sixteenths of a pixel, so a speed of 16 moves the
//! text one pixel per tick and slower speeds still make progress.
//!
//! ## Modes
//!
//! | Mode                  | Movement                                            |
//! |-----------------------|-----------------------------------------------------|
//! | `WrapForward`         | enters at the right edge, leaves at the left, again |
//! | `WrapForwardFromLeft` | first pass starts at `left + start_offset`           |
//! | `BounceForward`       | sweeps right to left, then back; a pass per sweep   |
//! | `BounceReverse`       | as `BounceForward`, first sweep left to right        |
//! | `FreeRun`             | copies follow each other one character cell apart   |
//! | `Paused`              | text stays where it is and keeps being redrawn      |
//! | `Off`                 | boundary is cleared once, nothing is drawn          |
//!
//! `Paused` and `Off` keep the text and the passes left, so configuring a
//! moving mode again resumes from the same position.
//!
//! ## Example
//!
//! ```
//! use matrix_link::{Rect, Rgb24, Runs, ScrollConfig, ScrollController, ScrollMode, ScrollStatus};
//!
//! let config = ScrollConfig::builder(Rect::new(0, 0, 31, 7))
//!     .mode(ScrollMode::WrapForward)
//!     .color(Rgb24::YELLOW)
//!     .speed(32)
//!     .build();
//! let mut scroller = ScrollController::new(0, config);
//! scroller.start("Hello", Runs::Times(2));
//! assert_eq!(scroller.status(), ScrollStatus::Remaining(2));
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::channel::CommandChannel;
use crate::color::Rgb24;
use crate::command::MAX_TEXT_LEN;
use crate::error::{Error, InvalidBoundary};
use crate::font::Font;
use crate::interface::Transport;
use crate::render::{Primitive, Rect, Renderer};
use crate::surface::FrameSurface;

/// Sub-pixel steps per pixel
pub const SUBPIXELS: i32 = 16;

/// Clipping region of a scroller, edges inclusive
pub type Boundary = Rect;

/// How text moves through the boundary
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollMode {
    /// Enter from the right, leave on the left, repeat
    WrapForward,
    /// Like `WrapForward`, but the first pass starts at the start offset
    WrapForwardFromLeft,
    /// Sweep right to left and back
    #[default]
    BounceForward,
    /// Sweep left to right and back
    BounceReverse,
    /// Continuous marquee with copies one character cell apart
    FreeRun,
    /// Hold the lead copy in place
    Paused,
    /// Hide the text
    Off,
}

impl ScrollMode {
    fn moves(self) -> bool {
        !matches!(self, Self::Paused | Self::Off)
    }
}

/// Lifecycle of a scroller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollState {
    /// Nothing on screen
    #[default]
    Stopped,
    /// Text is moving and more than one pass remains (or it runs forever)
    Running,
    /// The final pass of a finite run is on screen
    Completing,
}

/// How many passes to scroll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Runs {
    /// Until [`ScrollController::stop`]
    Forever,
    /// This many full passes, then stop by itself
    Times(u32),
}

impl From<i32> for Runs {
    /// Negative counts mean forever
    fn from(count: i32) -> Self {
        u32::try_from(count).map_or(Self::Forever, Self::Times)
    }
}

/// What a scroller is doing, as reported to callers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollStatus {
    /// Not scrolling
    Stopped,
    /// Scrolling until stopped
    Indefinite,
    /// Passes left, including the one on screen
    Remaining(u32),
}

impl ScrollStatus {
    /// `-1` for indefinite, `0` for stopped, otherwise the passes left
    pub fn as_counter(self) -> i32 {
        match self {
            Self::Stopped => 0,
            Self::Indefinite => -1,
            Self::Remaining(n) => i32::try_from(n).unwrap_or(i32::MAX),
        }
    }
}

/// Appearance and motion of a scroller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrollConfig {
    /// Glyph font
    pub font: Font,
    /// Text color
    pub color: Rgb24,
    /// Color the boundary is cleared to
    pub background: Rgb24,
    /// Movement
    pub mode: ScrollMode,
    /// Clip rectangle
    pub boundary: Boundary,
    /// Text row relative to the boundary top
    pub vertical_offset: i16,
    /// First-pass start column relative to the boundary left (`WrapForwardFromLeft`)
    pub start_offset: i16,
    /// Sub-pixels moved per tick
    pub speed: u8,
}

impl ScrollConfig {
    /// Defaults for a scroller covering `boundary`
    pub fn new(boundary: Boundary) -> Self {
        Self {
            font: Font::Font5x7,
            color: Rgb24::WHITE,
            background: Rgb24::BLACK,
            mode: ScrollMode::default(),
            boundary,
            vertical_offset: 0,
            start_offset: 0,
            speed: SUBPIXELS as u8,
        }
    }

    /// Start building a configuration for `boundary`
    pub fn builder(boundary: Boundary) -> ScrollConfigBuilder {
        ScrollConfigBuilder {
            config: Self::new(boundary),
        }
    }

    /// Builder seeded with this configuration
    pub fn to_builder(&self) -> ScrollConfigBuilder {
        ScrollConfigBuilder {
            config: self.clone(),
        }
    }
}

/// Builder for [`ScrollConfig`]
///
/// Nothing is validated until the configuration reaches
/// [`ScrollController::configure`].
#[must_use]
pub struct ScrollConfigBuilder {
    config: ScrollConfig,
}

impl ScrollConfigBuilder {
    /// Set the font
    pub fn font(mut self, font: Font) -> Self {
        self.config.font = font;
        self
    }

    /// Set the text color
    pub fn color(mut self, color: Rgb24) -> Self {
        self.config.color = color;
        self
    }

    /// Set the background color
    pub fn background(mut self, color: Rgb24) -> Self {
        self.config.background = color;
        self
    }

    /// Set the mode
    pub fn mode(mut self, mode: ScrollMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the boundary
    pub fn boundary(mut self, boundary: Boundary) -> Self {
        self.config.boundary = boundary;
        self
    }

    /// Set the text row relative to the boundary top
    pub fn vertical_offset(mut self, offset: i16) -> Self {
        self.config.vertical_offset = offset;
        self
    }

    /// Set the first-pass start column relative to the boundary left
    pub fn start_offset(mut self, offset: i16) -> Self {
        self.config.start_offset = offset;
        self
    }

    /// Set the speed in sub-pixels per tick
    pub fn speed(mut self, speed: u8) -> Self {
        self.config.speed = speed;
        self
    }

    /// Finish
    pub fn build(self) -> ScrollConfig {
        self.config
    }
}

/// One marquee
#[derive(Debug)]
pub struct ScrollController {
    index: usize,
    config: ScrollConfig,
    text: String,
    lines: usize,
    state: ScrollState,
    runs: Runs,
    /// Left edge of the lead copy, sub-pixels from the boundary left
    position: i32,
    /// -1 moving left, 1 moving right
    direction: i32,
    /// The boundary was cleared for `Off` and nothing drawn since
    blanked: bool,
}

impl ScrollController {
    /// Create a stopped scroller
    pub fn new(index: usize, config: ScrollConfig) -> Self {
        Self {
            index,
            config,
            text: String::new(),
            lines: 0,
            state: ScrollState::Stopped,
            runs: Runs::Times(0),
            position: 0,
            direction: -1,
            blanked: false,
        }
    }

    /// Replace the configuration; takes effect on the next tick
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBoundary`] if the boundary has `right < left` or
    /// `bottom < top`. The scroller is unchanged then.
    pub fn configure(&mut self, config: ScrollConfig) -> Result<(), InvalidBoundary> {
        if !config.boundary.is_valid() {
            return Err(InvalidBoundary(config.boundary));
        }
        if config.mode != self.config.mode && config.mode.moves() && self.config.mode.moves() {
            self.direction = match config.mode {
                ScrollMode::BounceReverse => 1,
                _ => -1,
            };
        }
        self.config = config;
        Ok(())
    }

    /// Start scrolling `text` from the beginning
    ///
    /// `Runs::Times(0)` does nothing. Line breaks are shown as spaces.
    pub fn start(&mut self, text: &str, runs: Runs) {
        if runs == Runs::Times(0) {
            return;
        }
        self.text = single_line(text);
        self.lines = 1;
        self.runs = runs;
        self.rewind();
        self.update_state();
        debug!(
            "scroller {}: start {:?}, {} chars, {:?}",
            self.index,
            runs,
            self.text.chars().count(),
            self.config.mode
        );
    }

    /// Add `text` after the current content
    ///
    /// A stopped scroller starts a single pass with just `text`.
    pub fn append(&mut self, text: &str) {
        if self.state == ScrollState::Stopped {
            self.start(text, Runs::Times(1));
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(&single_line(text));
        self.lines += 1;
    }

    /// Stop at once and clear the boundary
    pub fn stop<T, D, R>(
        &mut self,
        surface: &mut FrameSurface<R>,
        channel: &mut CommandChannel<T, D>,
    ) -> Result<(), Error<T>>
    where
        T: Transport,
        D: DelayNs,
        R: Renderer,
    {
        if self.state != ScrollState::Stopped {
            debug!("scroller {}: stopped", self.index);
        }
        self.halt();
        self.clear_region(surface, channel)
    }

    /// Advance one step and redraw
    ///
    /// Does nothing while stopped. When the last pass of a finite run
    /// completes, the boundary is cleared and the scroller stops.
    pub fn tick<T, D, R>(
        &mut self,
        surface: &mut FrameSurface<R>,
        channel: &mut CommandChannel<T, D>,
    ) -> Result<(), Error<T>>
    where
        T: Transport,
        D: DelayNs,
        R: Renderer,
    {
        if self.state == ScrollState::Stopped {
            return Ok(());
        }
        if self.config.mode == ScrollMode::Off {
            if self.blanked {
                return Ok(());
            }
            self.blanked = true;
            return self.clear_region(surface, channel);
        }
        if self.advance() {
            self.complete_pass();
            if self.state == ScrollState::Stopped {
                return self.clear_region(surface, channel);
            }
        }

        let boundary = self.config.boundary;
        let mut batch = alloc::vec![Primitive::Rectangle {
            rect: boundary,
            outline: self.config.background,
            fill: Some(self.config.background),
        }];
        batch.extend(self.visible_text());
        self.blanked = false;
        surface.draw_clipped(channel, &batch, boundary)
    }

    /// Move the text by one step
    ///
    /// Returns whether a pass was completed.
    fn advance(&mut self) -> bool {
        let step = i32::from(self.config.speed);
        if step == 0 || !self.config.mode.moves() {
            return false;
        }
        let width = self.boundary_width();
        let len = self.text_width();
        match self.config.mode {
            ScrollMode::WrapForward | ScrollMode::WrapForwardFromLeft => {
                self.position -= step;
                if self.position + len <= 0 {
                    self.position = width;
                    return true;
                }
            }
            ScrollMode::FreeRun => {
                self.position -= step;
                if self.position + len <= 0 {
                    self.position += len + self.gap();
                    return true;
                }
            }
            ScrollMode::BounceForward | ScrollMode::BounceReverse => {
                let (low, high) = bounce_range(width, len);
                self.position += self.direction * step;
                if self.direction < 0 && self.position <= low {
                    self.position = low;
                    self.direction = 1;
                    return true;
                }
                if self.direction > 0 && self.position >= high {
                    self.position = high;
                    self.direction = -1;
                    return true;
                }
            }
            ScrollMode::Paused | ScrollMode::Off => {}
        }
        false
    }

    fn complete_pass(&mut self) {
        if let Runs::Times(n) = self.runs {
            self.runs = Runs::Times(n.saturating_sub(1));
        }
        let before = self.state;
        self.update_state();
        if self.state != before {
            debug!("scroller {}: {:?} -> {:?}", self.index, before, self.state);
        }
    }

    fn update_state(&mut self) {
        self.state = match self.runs {
            Runs::Forever => ScrollState::Running,
            Runs::Times(0) => ScrollState::Stopped,
            Runs::Times(1) => ScrollState::Completing,
            Runs::Times(_) => ScrollState::Running,
        };
        if self.state == ScrollState::Stopped {
            self.text.clear();
            self.lines = 0;
        }
    }

    fn halt(&mut self) {
        self.runs = Runs::Times(0);
        self.update_state();
    }

    /// Put the lead copy at its starting point for the current mode
    fn rewind(&mut self) {
        let width = self.boundary_width();
        let (low, high) = bounce_range(width, self.text_width());
        (self.position, self.direction) = match self.config.mode {
            ScrollMode::WrapForward | ScrollMode::FreeRun => (width, -1),
            ScrollMode::WrapForwardFromLeft => {
                (i32::from(self.config.start_offset) * SUBPIXELS, -1)
            }
            ScrollMode::BounceForward => (high, -1),
            ScrollMode::BounceReverse => (low, 1),
            ScrollMode::Paused | ScrollMode::Off => (0, -1),
        };
        self.blanked = false;
    }

    fn clear_region<T, D, R>(
        &self,
        surface: &mut FrameSurface<R>,
        channel: &mut CommandChannel<T, D>,
    ) -> Result<(), Error<T>>
    where
        T: Transport,
        D: DelayNs,
        R: Renderer,
    {
        let boundary = self.config.boundary;
        surface.draw_clipped(
            channel,
            &[Primitive::Rectangle {
                rect: boundary,
                outline: self.config.background,
                fill: Some(self.config.background),
            }],
            boundary,
        )
    }

    /// Text primitives for the characters inside the boundary
    ///
    /// Characters wholly outside are skipped and runs longer than one packet
    /// are split.
    fn visible_text(&self) -> Vec<Primitive> {
        let boundary = self.config.boundary;
        let (left, right) = (i32::from(boundary.left), i32::from(boundary.right));
        let cell = self.config.font.cell().0 as i32;
        let chars: Vec<char> = self.text.chars().collect();
        let y = boundary
            .top
            .saturating_add(self.config.vertical_offset);

        let copy_origins: Vec<i32> = if self.config.mode == ScrollMode::FreeRun {
            let period = self.text_width() + self.gap();
            let width = self.boundary_width();
            let mut origins = Vec::new();
            let mut pos = self.position;
            while pos < width {
                origins.push(pos);
                pos += period;
            }
            origins
        } else {
            alloc::vec![self.position]
        };

        let mut primitives = Vec::new();
        for origin in copy_origins {
            let x0 = left + origin.div_euclid(SUBPIXELS);
            if chars.is_empty() || x0 > right {
                continue;
            }
            let first = if x0 >= left {
                0
            } else {
                ((left - x0) / cell) as usize
            };
            let last = (((right - x0) / cell) as usize).min(chars.len() - 1);
            if first > last {
                continue;
            }
            for (n, chunk) in chars[first..=last].chunks(MAX_TEXT_LEN).enumerate() {
                let start = first + n * MAX_TEXT_LEN;
                primitives.push(Primitive::Text {
                    x: (x0 + start as i32 * cell) as i16,
                    y,
                    font: self.config.font,
                    color: self.config.color,
                    background: None,
                    text: chunk.iter().collect(),
                });
            }
        }
        primitives
    }

    fn boundary_width(&self) -> i32 {
        self.config.boundary.width() as i32 * SUBPIXELS
    }

    fn text_width(&self) -> i32 {
        self.text.chars().count() as i32 * self.config.font.cell().0 as i32 * SUBPIXELS
    }

    /// Space between free-running copies
    fn gap(&self) -> i32 {
        self.config.font.cell().0 as i32 * SUBPIXELS
    }

    /// Index within the session
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current configuration
    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    /// Text being scrolled
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Characters in the current text
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Pieces of text started or appended since the last start
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Lifecycle state
    pub fn state(&self) -> ScrollState {
        self.state
    }

    /// Passes left
    pub fn status(&self) -> ScrollStatus {
        match (self.state, self.runs) {
            (ScrollState::Stopped, _) => ScrollStatus::Stopped,
            (_, Runs::Forever) => ScrollStatus::Indefinite,
            (_, Runs::Times(n)) => ScrollStatus::Remaining(n),
        }
    }

    /// Left edge of the lead copy in pixels, relative to the boundary left
    pub fn position(&self) -> i32 {
        self.position.div_euclid(SUBPIXELS)
    }
}

/// Lowest and highest lead position of a bouncing text
fn bounce_range(width: i32, len: i32) -> (i32, i32) {
    let far = width - len;
    (far.min(0), far.max(0))
}

fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command;
    use crate::testing::{BlockRenderer, MockDelay, MockTransport};

    type Channel = CommandChannel<MockTransport, MockDelay>;

    fn setup(width: u16, height: u16) -> (MockTransport, Channel, FrameSurface<BlockRenderer>) {
        let link = MockTransport::new();
        let channel = CommandChannel::new(link.clone(), MockDelay::default(), 512);
        let surface = FrameSurface::new(width, height, BlockRenderer::default());
        (link, channel, surface)
    }

    /// 10 px wide boundary; "ab" in 5x7 is 10 px wide
    fn wrap_scroller() -> ScrollController {
        let config = ScrollConfig::builder(Rect::new(0, 0, 9, 6))
            .mode(ScrollMode::WrapForward)
            .build();
        ScrollController::new(0, config)
    }

    #[test]
    fn test_runs_from_counter() {
        assert_eq!(Runs::from(-1), Runs::Forever);
        assert_eq!(Runs::from(-7), Runs::Forever);
        assert_eq!(Runs::from(0), Runs::Times(0));
        assert_eq!(Runs::from(3), Runs::Times(3));
    }

    #[test]
    fn test_status_counter_values() {
        assert_eq!(ScrollStatus::Stopped.as_counter(), 0);
        assert_eq!(ScrollStatus::Indefinite.as_counter(), -1);
        assert_eq!(ScrollStatus::Remaining(4).as_counter(), 4);
    }

    #[test]
    fn test_zero_runs_never_starts() {
        let mut scroller = wrap_scroller();
        scroller.start("ab", Runs::Times(0));
        assert_eq!(scroller.state(), ScrollState::Stopped);
        assert_eq!(scroller.text(), "");
    }

    #[test]
    fn test_three_runs_then_stop() {
        let (_link, mut channel, mut surface) = setup(16, 8);
        let mut scroller = wrap_scroller();
        scroller.start("ab", Runs::Times(3));

        let mut seen = alloc::vec![scroller.status()];
        let mut ticks = 0;
        while scroller.state() != ScrollState::Stopped && ticks < 1_000 {
            scroller.tick(&mut surface, &mut channel).unwrap();
            ticks += 1;
            if seen.last() != Some(&scroller.status()) {
                seen.push(scroller.status());
            }
        }
        assert_eq!(
            seen,
            [
                ScrollStatus::Remaining(3),
                ScrollStatus::Remaining(2),
                ScrollStatus::Remaining(1),
                ScrollStatus::Stopped,
            ]
        );
        // Each pass moves 20 px at 1 px per tick
        assert_eq!(ticks, 60);
    }

    #[test]
    fn test_final_pass_is_completing() {
        let mut scroller = wrap_scroller();
        scroller.start("ab", Runs::Times(2));
        assert_eq!(scroller.state(), ScrollState::Running);
        for _ in 0..20 {
            scroller.advance();
        }
        scroller.complete_pass();
        assert_eq!(scroller.state(), ScrollState::Completing);
    }

    #[test]
    fn test_forever_never_stops_by_itself() {
        let (_link, mut channel, mut surface) = setup(16, 8);
        let mut scroller = wrap_scroller();
        scroller.start("ab", Runs::Forever);
        for _ in 0..500 {
            scroller.tick(&mut surface, &mut channel).unwrap();
        }
        assert_eq!(scroller.status(), ScrollStatus::Indefinite);
        scroller.stop(&mut surface, &mut channel).unwrap();
        assert_eq!(scroller.status(), ScrollStatus::Stopped);
        assert_eq!(scroller.status().as_counter(), 0);
    }

    #[test]
    fn test_stop_clears_region() {
        let (link, mut channel, mut surface) = setup(16, 8);
        let mut scroller = wrap_scroller();
        scroller.start("ab", Runs::Forever);
        scroller.tick(&mut surface, &mut channel).unwrap();
        link.clear_packets();
        scroller.stop(&mut surface, &mut channel).unwrap();
        assert_eq!(
            link.opcodes(),
            [
                (command::CATEGORY_DRAWING, command::SET_CLIP),
                (command::CATEGORY_DRAWING, command::FILL_RECTANGLE),
                (command::CATEGORY_DRAWING, command::RESET_CLIP),
            ]
        );
        assert!(surface.back().pixels().iter().all(|&p| p == Rgb24::BLACK));
    }

    #[test]
    fn test_text_never_leaves_boundary() {
        let (_link, mut channel, mut surface) = setup(32, 16);
        let boundary = Rect::new(6, 4, 20, 10);
        for mode in [
            ScrollMode::WrapForward,
            ScrollMode::WrapForwardFromLeft,
            ScrollMode::BounceForward,
            ScrollMode::BounceReverse,
            ScrollMode::FreeRun,
        ] {
            let config = ScrollConfig::builder(boundary)
                .mode(mode)
                .color(Rgb24::RED)
                .speed(23)
                .vertical_offset(-2)
                .start_offset(-4)
                .build();
            let mut scroller = ScrollController::new(1, config);
            scroller.start("A long line of text that overflows", Runs::Forever);
            let mut lit = false;
            for _ in 0..400 {
                scroller.tick(&mut surface, &mut channel).unwrap();
                for y in 0..16 {
                    for x in 0..32 {
                        let pixel = surface.back().get(x, y);
                        if !boundary.contains(x, y) {
                            assert_eq!(pixel, Some(Rgb24::BLACK), "{mode:?} at ({x}, {y})");
                        } else if pixel == Some(Rgb24::RED) {
                            lit = true;
                        }
                    }
                }
            }
            assert!(lit, "{mode:?} never drew");
        }
    }

    #[test]
    fn test_configure_rejects_inverted_boundary() {
        let mut scroller = wrap_scroller();
        let before = scroller.config().clone();
        let bad = before.to_builder().boundary(Rect::new(5, 0, 4, 6)).build();
        assert_eq!(
            scroller.configure(bad),
            Err(InvalidBoundary(Rect::new(5, 0, 4, 6)))
        );
        let bad = before.to_builder().boundary(Rect::new(0, 3, 4, 2)).build();
        assert!(scroller.configure(bad).is_err());
        assert_eq!(scroller.config(), &before);
    }

    #[test]
    fn test_configure_round_trips() {
        let mut scroller = wrap_scroller();
        let config = ScrollConfig::builder(Rect::new(1, 2, 30, 9))
            .font(Font::Gohufont11b)
            .color(Rgb24::GREEN)
            .background(Rgb24::BLUE)
            .mode(ScrollMode::FreeRun)
            .vertical_offset(3)
            .start_offset(7)
            .speed(200)
            .build();
        scroller.start("running", Runs::Forever);
        scroller.configure(config.clone()).unwrap();
        assert_eq!(scroller.config(), &config);
        assert_eq!(scroller.state(), ScrollState::Running);
    }

    #[test]
    fn test_wrap_from_left_starts_at_offset() {
        let config = ScrollConfig::builder(Rect::new(0, 0, 31, 7))
            .mode(ScrollMode::WrapForwardFromLeft)
            .start_offset(5)
            .speed(0)
            .build();
        let mut scroller = ScrollController::new(0, config);
        scroller.start("x", Runs::Forever);
        assert_eq!(scroller.position(), 5);
    }

    #[test]
    fn test_bounce_reverses_at_edges() {
        // "ab" is 10 px in a 20 px boundary: bounces between 0 and 10
        let config = ScrollConfig::builder(Rect::new(0, 0, 19, 6))
            .mode(ScrollMode::BounceForward)
            .build();
        let mut scroller = ScrollController::new(0, config);
        scroller.start("ab", Runs::Times(2));
        assert_eq!(scroller.position(), 10);
        let mut ticks = 0;
        while !scroller.advance() {
            ticks += 1;
        }
        assert_eq!((ticks, scroller.position()), (9, 0));
        while !scroller.advance() {}
        assert_eq!(scroller.position(), 10);
    }

    #[test]
    fn test_bounce_reverse_starts_left() {
        let config = ScrollConfig::builder(Rect::new(0, 0, 19, 6))
            .mode(ScrollMode::BounceReverse)
            .build();
        let mut scroller = ScrollController::new(0, config);
        scroller.start("ab", Runs::Forever);
        assert_eq!(scroller.position(), 0);
        scroller.advance();
        assert_eq!(scroller.position(), 1);
    }

    #[test]
    fn test_free_run_draws_following_copies() {
        // 30 px boundary, "ab" 10 px plus a 5 px gap: copies every 15 px
        let config = ScrollConfig::builder(Rect::new(0, 0, 29, 6))
            .mode(ScrollMode::FreeRun)
            .build();
        let mut scroller = ScrollController::new(0, config);
        scroller.start("ab", Runs::Forever);
        scroller.position = 0;
        let xs: Vec<i16> = scroller
            .visible_text()
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { x, .. } => Some(*x),
                _ => None,
            })
            .collect();
        assert_eq!(xs, [0, 15]);
    }

    #[test]
    fn test_free_run_pass_keeps_motion_continuous() {
        let config = ScrollConfig::builder(Rect::new(0, 0, 29, 6))
            .mode(ScrollMode::FreeRun)
            .build();
        let mut scroller = ScrollController::new(0, config);
        scroller.start("ab", Runs::Times(5));
        scroller.position = -9 * SUBPIXELS;
        assert!(scroller.advance());
        // the copy that followed one period behind is now the lead
        assert_eq!(scroller.position(), 5);
    }

    #[test]
    fn test_visible_text_skips_hidden_chars() {
        let config = ScrollConfig::builder(Rect::new(10, 0, 19, 6))
            .mode(ScrollMode::WrapForward)
            .build();
        let mut scroller = ScrollController::new(0, config);
        scroller.start("abcdefgh", Runs::Forever);
        // lead copy 7 px left of the boundary: "a" hidden, "b" partly visible
        scroller.position = -7 * SUBPIXELS;
        let prims = scroller.visible_text();
        assert_eq!(prims.len(), 1);
        assert!(matches!(&prims[0], Primitive::Text { x: 8, text, .. } if text == "bcd"));
    }

    #[test]
    fn test_long_text_is_split_into_packets() {
        let config = ScrollConfig::builder(Rect::new(0, 0, 511, 5))
            .font(Font::Font3x5)
            .mode(ScrollMode::WrapForward)
            .build();
        let mut scroller = ScrollController::new(0, config);
        let text: String = core::iter::repeat_n('w', 200).collect();
        scroller.start(&text, Runs::Forever);
        scroller.position = 0;
        let prims = scroller.visible_text();
        // 512 px / 4 px cells = 128 visible chars
        let lens: Vec<usize> = prims
            .iter()
            .map(|p| match p {
                Primitive::Text { text, .. } => text.len(),
                _ => 0,
            })
            .collect();
        assert_eq!(lens, [MAX_TEXT_LEN, MAX_TEXT_LEN, 128 - 2 * MAX_TEXT_LEN]);
    }

    #[test]
    fn test_append_extends_or_starts() {
        let mut scroller = wrap_scroller();
        scroller.append("first\nline");
        assert_eq!(scroller.text(), "first line");
        assert_eq!(scroller.status(), ScrollStatus::Remaining(1));
        scroller.append("second");
        assert_eq!(scroller.text(), "first line second");
        assert_eq!(scroller.line_count(), 2);
        assert_eq!(scroller.char_count(), 17);
    }

    #[test]
    fn test_paused_holds_position_and_passes() {
        let (link, mut channel, mut surface) = setup(20, 8);
        let config = ScrollConfig::builder(Rect::new(0, 0, 19, 6))
            .mode(ScrollMode::BounceReverse)
            .build();
        let mut scroller = ScrollController::new(0, config);
        scroller.start("ab", Runs::Times(2));
        for _ in 0..3 {
            scroller.tick(&mut surface, &mut channel).unwrap();
        }
        assert_eq!(scroller.position(), 3);

        let paused = scroller.config().to_builder().mode(ScrollMode::Paused).build();
        scroller.configure(paused).unwrap();
        link.clear_packets();
        for _ in 0..5 {
            scroller.tick(&mut surface, &mut channel).unwrap();
        }
        assert_eq!(scroller.position(), 3);
        assert_eq!(scroller.status(), ScrollStatus::Remaining(2));
        assert_eq!(
            link.count(command::CATEGORY_DRAWING, command::DRAW_STRING),
            5
        );

        let resumed = scroller
            .config()
            .to_builder()
            .mode(ScrollMode::BounceReverse)
            .build();
        scroller.configure(resumed).unwrap();
        scroller.tick(&mut surface, &mut channel).unwrap();
        assert_eq!(scroller.position(), 4);
    }

    #[test]
    fn test_off_clears_once_and_keeps_text() {
        let (link, mut channel, mut surface) = setup(16, 8);
        let mut scroller = wrap_scroller();
        scroller.start("ab", Runs::Forever);
        let off = scroller.config().to_builder().mode(ScrollMode::Off).build();
        scroller.configure(off).unwrap();

        scroller.tick(&mut surface, &mut channel).unwrap();
        assert_eq!(
            link.opcodes(),
            [
                (command::CATEGORY_DRAWING, command::SET_CLIP),
                (command::CATEGORY_DRAWING, command::FILL_RECTANGLE),
                (command::CATEGORY_DRAWING, command::RESET_CLIP),
            ]
        );
        link.clear_packets();
        scroller.tick(&mut surface, &mut channel).unwrap();
        assert!(link.packets().is_empty());
        assert_eq!(scroller.status(), ScrollStatus::Indefinite);
        assert_eq!(scroller.text(), "ab");

        let on = scroller.config().to_builder().mode(ScrollMode::WrapForward).build();
        scroller.configure(on).unwrap();
        scroller.tick(&mut surface, &mut channel).unwrap();
        assert_eq!(
            link.count(command::CATEGORY_DRAWING, command::DRAW_STRING),
            1
        );
    }

    #[test]
    fn test_stopped_tick_sends_nothing() {
        let (link, mut channel, mut surface) = setup(16, 8);
        let mut scroller = wrap_scroller();
        scroller.tick(&mut surface, &mut channel).unwrap();
        assert!(link.packets().is_empty());
    }
}
