use std::time::Duration;

use clap::Subcommand;
use mindful_core::notify::Haptics;
use mindful_core::timer::{format_display, now_ms};
use mindful_core::{
    AudioDevice, Config, Event, JsonFileStore, SessionController, SessionOptions, SettingsStore, Shortcut,
    SoundTheme,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use crate::device::{output_device, TerminalBell};
use crate::output::{emit, print_json, CliResult};

const HELP: &str = "\
commands (one per line):
  <enter>, space   start / pause
  r                reset
  s                sound on / off
  theme <name>     none, rain, ocean, forest, birds, wind
  duration <secs>  change duration (idle only)
  quote            show another quote
  settings         open settings
  notify on|off    completion tone
  vibrate on|off   vibration
  esc              close settings
  status           show the timer
  q                quit";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run an interactive session, reading commands from stdin
    Run {
        /// Duration in seconds (default from config)
        #[arg(long, short, conflicts_with = "preset")]
        duration: Option<u32>,
        /// Use the Nth configured preset (1-based)
        #[arg(long, short)]
        preset: Option<usize>,
        /// Ambient theme (default from config)
        #[arg(long, short)]
        theme: Option<SoundTheme>,
        /// Start immediately and exit once the timer has reset
        #[arg(long)]
        once: bool,
        /// Fixed seed for quotes and synthesis
        #[arg(long)]
        seed: Option<u64>,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// List the configured duration presets
    Presets {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: TimerAction) -> CliResult {
    let config = Config::load()?;
    match action {
        TimerAction::Run {
            duration,
            preset,
            theme,
            once,
            seed,
            json,
        } => {
            let mut options = SessionOptions::from(&config);
            if let Some(index) = preset {
                options.duration_secs = preset_secs(&config, index)?;
            }
            if let Some(secs) = duration {
                if secs == 0 {
                    return Err("duration must be at least one second".into());
                }
                options.duration_secs = secs;
            }
            if let Some(theme) = theme {
                options.theme = theme;
            }
            options.seed = seed;

            let store = SettingsStore::new(Box::new(JsonFileStore::open()?));
            let mut session =
                SessionController::new(output_device(config.audio.sample_rate), TerminalBell, store, options);

            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            rt.block_on(run_session(&mut session, BufReader::new(tokio::io::stdin()), once, json))
        }
        TimerAction::Presets { json } => {
            if json {
                return print_json(&config.timer.presets);
            }
            for (i, secs) in config.timer.presets.iter().enumerate() {
                println!("{}  {}", i + 1, format_display(*secs));
            }
            Ok(())
        }
    }
}

fn preset_secs(config: &Config, index: usize) -> Result<u32, String> {
    index
        .checked_sub(1)
        .and_then(|i| config.timer.presets.get(i))
        .copied()
        .ok_or_else(|| format!("no preset {index} ({} configured)", config.timer.presets.len()))
}

enum Flow {
    Continue,
    /// The countdown (re)started; the next tick is one second away.
    Started,
    Quit,
}

/// Drive a session from one-command-per-line `input` and a 1 s ticker.
async fn run_session<D, H, R>(session: &mut SessionController<D, H>, input: R, once: bool, json: bool) -> CliResult
where
    D: AudioDevice + Clone,
    H: Haptics,
    R: AsyncBufRead + Unpin,
{
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    let mut lines = input.lines();
    let mut input_open = true;

    let quote = session.quote();
    emit(
        &Event::QuoteShown {
            text: quote.text.to_string(),
            author: quote.author.to_string(),
            at: chrono::Utc::now(),
        },
        json,
    )?;
    emit(&session.snapshot(), json)?;
    if once {
        if let Some(event) = session.start() {
            emit(&event, json)?;
            ticker.reset();
        }
    } else if !json {
        println!("type 'help' for commands");
    }

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let running = session.timer().is_running();
                if let Some(event) = session.tick() {
                    emit(&event, json)?;
                } else if running && !json {
                    emit(&session.snapshot(), json)?;
                }
                for event in session.poll(now_ms()) {
                    let reset = matches!(event, Event::TimerReset { .. });
                    emit(&event, json)?;
                    if once && reset {
                        return Ok(());
                    }
                }
            }
            line = lines.next_line(), if input_open => {
                match line? {
                    Some(line) => match handle_line(session, line.trim(), json)? {
                        Flow::Continue => {}
                        Flow::Started => ticker.reset(),
                        Flow::Quit => return Ok(()),
                    },
                    None => {
                        input_open = false;
                        if !once {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

fn handle_line<D, H>(
    session: &mut SessionController<D, H>,
    line: &str,
    json: bool,
) -> Result<Flow, Box<dyn std::error::Error>>
where
    D: AudioDevice + Clone,
    H: Haptics,
{
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("");
    let arg = words.next();

    let code = match command {
        "" | "space" => "Space",
        "r" | "reset" => "KeyR",
        "s" | "sound" => "KeyS",
        "esc" => "Escape",
        other => other,
    };
    if let Some(shortcut) = Shortcut::from_key_code(code) {
        if let Some(event) = session.handle_shortcut(shortcut) {
            emit(&event, json)?;
            if matches!(event, Event::TimerStarted { .. }) {
                return Ok(Flow::Started);
            }
        }
        return Ok(Flow::Continue);
    }

    match (command, arg) {
        ("q" | "quit", _) => return Ok(Flow::Quit),
        ("help", _) => println!("{HELP}"),
        ("status", _) => emit(&session.snapshot(), json)?,
        ("quote", _) => emit(&session.next_quote(), json)?,
        ("theme", Some(name)) => match name.parse::<SoundTheme>() {
            Ok(theme) => emit(&session.set_theme(theme), json)?,
            Err(e) => eprintln!("{e}"),
        },
        ("duration", Some(secs)) => match secs.parse::<u32>() {
            Ok(secs) => match session.set_duration(secs) {
                Some(event) => emit(&event, json)?,
                None => eprintln!("duration can only change while the timer is idle"),
            },
            Err(_) => eprintln!("invalid duration: {secs}"),
        },
        ("settings", _) => {
            session.open_settings();
            let settings = session.settings();
            if json {
                print_json(&settings)?;
            } else {
                println!(
                    "notificationSound: {}  vibration: {}  soundEnabled: {}",
                    settings.notification_sound, settings.vibration, settings.sound_enabled
                );
            }
        }
        ("notify", Some(value)) => match parse_switch(value) {
            Some(enabled) => emit(&session.set_notification_sound(enabled), json)?,
            None => eprintln!("expected on or off"),
        },
        ("vibrate", Some(value)) => match parse_switch(value) {
            Some(enabled) => emit(&session.set_vibration(enabled), json)?,
            None => eprintln!("expected on or off"),
        },
        _ => eprintln!("unknown command: {line} (try 'help')"),
    }
    Ok(Flow::Continue)
}

fn parse_switch(value: &str) -> Option<bool> {
    match value {
        "on" | "true" => Some(true),
        "off" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindful_core::{MemoryStore, NullDevice};
    use tokio::io::AsyncWriteExt;

    fn session(duration_secs: u32) -> SessionController<NullDevice, TerminalBell> {
        let store = SettingsStore::new(Box::new(MemoryStore::new()));
        let options = SessionOptions {
            duration_secs,
            seed: Some(1),
            ..SessionOptions::default()
        };
        SessionController::new(NullDevice::new(8_000), TerminalBell, store, options)
    }

    #[tokio::test(start_paused = true)]
    async fn first_countdown_tick_is_a_full_second_after_start() {
        let mut session = session(3);
        let (mut keys, input) = tokio::io::duplex(64);
        let typist = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(950)).await;
            keys.write_all(b"\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(950)).await;
            keys.write_all(b"q\n").await.unwrap();
        });

        run_session(&mut session, BufReader::new(input), false, true).await.unwrap();
        typist.await.unwrap();

        // Started at 0.95 s, quit at 1.9 s: no whole second has run.
        assert!(session.timer().is_running());
        assert_eq!(session.timer().remaining_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn resumed_countdown_ticks_one_second_later() {
        let mut session = session(10);
        let (mut keys, input) = tokio::io::duplex(64);
        let typist = tokio::spawn(async move {
            // Start at 0.5 s, pause at 2.7 s after two ticks, resume at 3.2 s.
            for (delay_ms, line) in [(500, "\n"), (2_200, "space\n"), (500, "\n"), (900, "q\n")] {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                keys.write_all(line.as_bytes()).await.unwrap();
            }
        });

        run_session(&mut session, BufReader::new(input), false, true).await.unwrap();
        typist.await.unwrap();

        // Resumed at 3.2 s and quit at 4.1 s, before the next tick at 4.2 s.
        assert_eq!(session.timer().remaining_secs(), 8);
    }
}
