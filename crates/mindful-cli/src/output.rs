//! Terminal rendering of core events.

use mindful_core::Event;
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One JSON document per line, for streams of events.
pub fn print_json_line<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Human-readable line for an event.
pub fn describe(event: &Event) -> String {
    match event {
        Event::TimerStarted { remaining_secs, .. } => {
            format!("started ({})", mindful_core::timer::format_display(*remaining_secs))
        }
        Event::TimerPaused { remaining_secs, .. } => {
            format!("paused at {}", mindful_core::timer::format_display(*remaining_secs))
        }
        Event::TimerReset { total_secs, .. } => {
            format!("ready ({})", mindful_core::timer::format_display(*total_secs))
        }
        Event::TimerCompleted { .. } => "meditation complete".to_string(),
        Event::DurationChanged { total_secs, .. } => {
            format!("duration set to {}", mindful_core::timer::format_display(*total_secs))
        }
        Event::ThemeChanged { theme, .. } => format!("theme: {theme}"),
        Event::SoundToggled { enabled, .. } => format!("sound {}", if *enabled { "on" } else { "off" }),
        Event::SettingsChanged { settings, .. } => format!(
            "settings: notification sound {}, vibration {}, sound {}",
            on_off(settings.notification_sound),
            on_off(settings.vibration),
            on_off(settings.sound_enabled)
        ),
        Event::QuoteShown { text, author, .. } => format!("\"{text}\"\n  -- {author}"),
        Event::StateSnapshot {
            state,
            display,
            progress,
            theme,
            sound_playing,
            ..
        } => format!(
            "{display}  {:?}  {:>3.0}%  theme {theme}{}",
            state,
            progress * 100.0,
            if *sound_playing { " (playing)" } else { "" }
        ),
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

/// Print an event as JSON or as a human-readable line.
pub fn emit(event: &Event, json: bool) -> CliResult {
    if json {
        return print_json_line(event);
    }
    println!("{}", describe(event));
    Ok(())
}
