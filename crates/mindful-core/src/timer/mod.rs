mod engine;

pub use engine::{
    format_display, now_ms, TimerEngine, TimerState, DEFAULT_AUTO_RESET_DELAY_MS, DEFAULT_DURATION_SECS,
};
