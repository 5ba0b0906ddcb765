//! Countdown timer state machine.
//!
//! The engine does not use internal threads - the caller invokes `tick()`
//! once per second while running, and `poll_auto_reset()` to let a
//! completed session fall back to idle.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> Completed -> (auto reset) -> Idle
//! any -> Idle (reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(300);
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::TimerCompleted) when the countdown ends
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::Event;

pub const DEFAULT_DURATION_SECS: u32 = 300;
pub const DEFAULT_AUTO_RESET_DELAY_MS: u64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Core countdown engine.
///
/// Invariant: `remaining_secs <= total_secs` and `total_secs > 0`.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    state: TimerState,
    total_secs: u32,
    remaining_secs: u32,
    auto_reset_delay_ms: u64,
    /// Epoch milliseconds at which a completed session resets itself.
    auto_reset_at_ms: Option<u64>,
}

impl TimerEngine {
    /// Create an idle engine with `total_secs` on the clock (at least 1).
    pub fn new(total_secs: u32) -> Self {
        let total_secs = total_secs.max(1);
        Self {
            state: TimerState::Idle,
            total_secs,
            remaining_secs: total_secs,
            auto_reset_delay_ms: DEFAULT_AUTO_RESET_DELAY_MS,
            auto_reset_at_ms: None,
        }
    }

    pub fn with_auto_reset_delay_ms(mut self, delay_ms: u64) -> Self {
        self.auto_reset_delay_ms = delay_ms;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn auto_reset_due_ms(&self) -> Option<u64> {
        self.auto_reset_at_ms
    }

    /// 0.0 .. 1.0 elapsed fraction.
    pub fn progress(&self) -> f64 {
        f64::from(self.total_secs - self.remaining_secs) / f64::from(self.total_secs)
    }

    /// Stroke offset for a progress ring of the given circumference:
    /// full circumference when nothing has elapsed, zero when done.
    pub fn ring_offset(&self, circumference: f64) -> f64 {
        circumference - self.progress() * circumference
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format_display(self.remaining_secs)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Idle | TimerState::Paused => {
                self.state = TimerState::Running;
                debug!(remaining = self.remaining_secs, "timer started");
                Some(Event::TimerStarted {
                    remaining_secs: self.remaining_secs,
                    total_secs: self.total_secs,
                    at: Utc::now(),
                })
            }
            TimerState::Running | TimerState::Completed => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        debug!(remaining = self.remaining_secs, "timer paused");
        Some(Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Pause when running, start otherwise.
    pub fn toggle(&mut self) -> Option<Event> {
        if self.is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    pub fn reset(&mut self) -> Event {
        self.state = TimerState::Idle;
        self.remaining_secs = self.total_secs;
        self.auto_reset_at_ms = None;
        debug!(total = self.total_secs, "timer reset");
        Event::TimerReset {
            total_secs: self.total_secs,
            at: Utc::now(),
        }
    }

    /// Call once per second. Returns `Some(Event::TimerCompleted)` when the
    /// countdown reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(now_ms())
    }

    /// [`tick`](Self::tick) with an explicit clock, for callers and tests
    /// that drive time themselves.
    pub fn tick_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }

        self.state = TimerState::Completed;
        self.auto_reset_at_ms = Some(now_ms.saturating_add(self.auto_reset_delay_ms));
        debug!(total = self.total_secs, "timer completed");
        Some(Event::TimerCompleted {
            total_secs: self.total_secs,
            at: Utc::now(),
        })
    }

    /// Reset a completed session once its delay has elapsed.
    pub fn poll_auto_reset(&mut self, now_ms: u64) -> Option<Event> {
        match self.auto_reset_at_ms {
            Some(due) if self.state == TimerState::Completed && now_ms >= due => Some(self.reset()),
            _ => None,
        }
    }

    /// Change the session length. Only allowed while idle, and only to a
    /// positive duration.
    pub fn set_duration(&mut self, secs: u32) -> Option<Event> {
        if self.state != TimerState::Idle || secs == 0 {
            debug!(secs, state = ?self.state, "duration change rejected");
            return None;
        }
        self.total_secs = secs;
        self.remaining_secs = secs;
        Some(Event::DurationChanged {
            total_secs: secs,
            at: Utc::now(),
        })
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_SECS)
    }
}

/// `MM:SS`, minutes not capped at 59.
pub fn format_display(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
