//! Board and variant rotation
//!
//! While a model is active, a scroll offset advances at a fixed cadence.
//! Once the last row of the current board has scrolled past the content
//! cutoff and the board has been on screen for its minimum dwell, the
//! rotation switches to a different randomly chosen board and freezes
//! briefly so the next board's top is readable. When the title pool holds
//! more than one variant and the variant dwell has elapsed, a board
//! switch also requests a variant advance, which the engine services by
//! reloading on its next tick.
//!
//! All windows are measured against the rotation's own monotonic
//! timestamps, never the render cadence.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Rotation timing and display-geometry settings.
///
/// The geometry fields describe the target display so the rotation can
/// tell when a board's last row has scrolled out of the content area.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    /// Scroll step cadence in milliseconds
    pub step_ms: u64,

    /// Pixels advanced per scroll step
    pub pixels_per_step: f32,

    /// Minimum time a board stays on screen before rotation
    pub board_dwell_ms: u64,

    /// Scroll freeze after a board switch
    pub freeze_ms: u64,

    /// Minimum time between variant switches
    pub variant_dwell_ms: u64,

    /// Display height in pixels
    pub screen_height: i32,

    /// Row line height in pixels
    pub line_height: i32,

    /// Font ascent of the row font
    pub font_ascent: i32,

    /// Top of the content area below the heading rule
    pub content_top: i32,

    /// Bottom margin below the last baseline
    pub bottom_margin: i32,

    /// Suggested display hold for consumers that page between screens
    pub hold_ms: u64,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            step_ms: 40,
            pixels_per_step: 1.0,
            board_dwell_ms: 3000,
            freeze_ms: 750,
            variant_dwell_ms: 12_000,
            screen_height: 64,
            line_height: 9,
            font_ascent: 7,
            content_top: 16,
            bottom_margin: 2,
            hold_ms: 15_000,
        }
    }
}

impl RotationSettings {
    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    pub fn board_dwell(&self) -> Duration {
        Duration::from_millis(self.board_dwell_ms)
    }

    pub fn freeze(&self) -> Duration {
        Duration::from_millis(self.freeze_ms)
    }

    pub fn variant_dwell(&self) -> Duration {
        Duration::from_millis(self.variant_dwell_ms)
    }

    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }
}

/// What a rotation tick asked the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationEvent {
    /// Nothing changed
    None,

    /// The rotation cycled onto a board (a different one when the model
    /// has a choice); scroll was reset
    BoardSwitched,

    /// The engine should advance the title pool and reload
    VariantAdvance,
}

/// Mutable rotation state for one loaded model.
///
/// Created fresh on every successful load; variant dwell is measured from
/// that moment.
#[derive(Debug, Clone)]
pub struct RotationState {
    board_idx: usize,
    scroll_y: f32,
    last_step: Instant,
    last_board_switch: Instant,
    freeze_until: Instant,
    variant_loaded_at: Instant,
}

impl RotationState {
    /// Start rotating a freshly loaded model with `board_count` boards,
    /// opening on a random board behind a freeze window.
    pub fn start(
        now: Instant,
        board_count: usize,
        settings: &RotationSettings,
        rng: &mut impl Rng,
    ) -> Self {
        let board_idx = if board_count > 1 {
            rng.gen_range(0..board_count)
        } else {
            0
        };
        Self {
            board_idx,
            scroll_y: 0.0,
            last_step: now,
            last_board_switch: now,
            freeze_until: now + settings.freeze(),
            variant_loaded_at: now,
        }
    }

    /// Index of the currently visible board.
    pub fn board_idx(&self) -> usize {
        self.board_idx
    }

    /// Current scroll offset in pixels.
    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// Advance the rotation clock.
    ///
    /// `row_count` is the row count of the currently visible board;
    /// `pool_len` the size of the title pool.
    pub fn tick(
        &mut self,
        now: Instant,
        settings: &RotationSettings,
        board_count: usize,
        row_count: usize,
        pool_len: usize,
        rng: &mut impl Rng,
    ) -> RotationEvent {
        if now < self.freeze_until {
            return RotationEvent::None;
        }

        if now.duration_since(self.last_step) >= settings.step() {
            self.last_step = now;
            self.scroll_y += settings.pixels_per_step;
        }

        if row_count == 0 {
            return RotationEvent::None;
        }

        // Baseline of the last row, given the current scroll offset.
        let last_i = (row_count - 1) as f32;
        let bottom_baseline = (settings.screen_height - settings.bottom_margin) as f32;
        let y_last = bottom_baseline - (self.scroll_y - last_i * settings.line_height as f32);
        let last_top = y_last - settings.font_ascent as f32;
        let content_body_top = (settings.content_top + settings.line_height) as f32;

        let scrolled_out = last_top < content_body_top;
        let dwelled = now.duration_since(self.last_board_switch) >= settings.board_dwell();
        if !(scrolled_out && dwelled) {
            return RotationEvent::None;
        }

        // Random distinct board when there is a choice.
        let mut next = if board_count > 1 {
            rng.gen_range(0..board_count)
        } else {
            self.board_idx
        };
        if board_count > 1 && next == self.board_idx {
            next = (next + 1) % board_count;
        }
        self.board_idx = next;
        self.scroll_y = 0.0;
        self.last_board_switch = now;
        self.freeze_until = now + settings.freeze();

        let variant_due = pool_len > 1
            && now.duration_since(self.variant_loaded_at) >= settings.variant_dwell();
        if variant_due {
            RotationEvent::VariantAdvance
        } else {
            RotationEvent::BoardSwitched
        }
    }
}
