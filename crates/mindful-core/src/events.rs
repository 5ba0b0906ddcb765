use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audio::SoundTheme;
use crate::settings::Settings;
use crate::timer::TimerState;

/// Every state change of a meditation session produces an Event.
/// The adapter renders them; `--json` prints them as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        remaining_secs: u32,
        total_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        total_secs: u32,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        total_secs: u32,
        at: DateTime<Utc>,
    },
    DurationChanged {
        total_secs: u32,
        at: DateTime<Utc>,
    },
    ThemeChanged {
        theme: SoundTheme,
        at: DateTime<Utc>,
    },
    SoundToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        settings: Settings,
        at: DateTime<Utc>,
    },
    QuoteShown {
        text: String,
        author: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        remaining_secs: u32,
        total_secs: u32,
        display: String,
        progress: f64,
        theme: SoundTheme,
        sound_playing: bool,
        at: DateTime<Utc>,
    },
}
