//! Session controller: the application state a UI adapter drives.
//!
//! Owns the countdown, the ambient engine, the completion notifier and the
//! user's settings. Every command returns the [`Event`]s it produced so the
//! adapter only has to render them.

use chrono::Utc;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use tracing::{debug, info, warn};

use crate::audio::{AmbientEngine, AudioDevice, SoundTheme};
use crate::events::Event;
use crate::notify::{release_chime, Haptics, Notifier};
use crate::quotes::{Quote, QuoteProvider};
use crate::settings::{Settings, SettingsStore};
use crate::storage::Config;
use crate::timer::{now_ms, TimerEngine, DEFAULT_AUTO_RESET_DELAY_MS, DEFAULT_DURATION_SECS};

/// Progress ring circumference used by the snapshot.
pub const RING_CIRCUMFERENCE: f64 = 283.0;

/// Keyboard shortcuts, keyed by DOM-style key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    ToggleTimer,
    Reset,
    ToggleSound,
    CloseSettings,
}

impl Shortcut {
    pub fn from_key_code(code: &str) -> Option<Self> {
        match code {
            "Space" => Some(Self::ToggleTimer),
            "KeyR" => Some(Self::Reset),
            "KeyS" => Some(Self::ToggleSound),
            "Escape" => Some(Self::CloseSettings),
            _ => None,
        }
    }
}

/// Startup parameters, normally taken from [`Config`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub duration_secs: u32,
    pub auto_reset_delay_ms: u64,
    pub master_gain: f32,
    pub theme: SoundTheme,
    /// Fixed seed for quotes and synthesis; random when `None`.
    pub seed: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            auto_reset_delay_ms: DEFAULT_AUTO_RESET_DELAY_MS,
            master_gain: 0.1,
            theme: SoundTheme::None,
            seed: None,
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            duration_secs: config.timer.default_duration_secs,
            auto_reset_delay_ms: u64::from(config.timer.auto_reset_delay_secs) * 1_000,
            master_gain: config.audio.master_gain,
            theme: config.audio.default_theme,
            seed: None,
        }
    }
}

pub struct SessionController<D: AudioDevice + Clone, H: Haptics> {
    timer: TimerEngine,
    ambient: AmbientEngine<D>,
    notifier: Notifier<D, H>,
    store: SettingsStore,
    settings: Settings,
    theme: SoundTheme,
    quote: &'static Quote,
    chime: Option<D::Stream>,
    settings_open: bool,
    rng: Pcg64Mcg,
}

impl<D: AudioDevice + Clone, H: Haptics> SessionController<D, H> {
    /// Build a controller, loading settings from `store` and picking the
    /// first quote.
    pub fn new(device: D, haptics: H, store: SettingsStore, options: SessionOptions) -> Self {
        let seed = options.seed.unwrap_or_else(rand::random);
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let settings = store.load();

        let mut ambient = AmbientEngine::with_seed(device.clone(), options.master_gain, seed ^ 0x5eed);
        ambient.set_enabled(settings.sound_enabled);

        let quote = QuoteProvider.random(&mut rng);
        info!(duration = options.duration_secs, theme = %options.theme, "session ready");

        Self {
            timer: TimerEngine::new(options.duration_secs).with_auto_reset_delay_ms(options.auto_reset_delay_ms),
            ambient,
            notifier: Notifier::new(device, haptics),
            store,
            settings,
            theme: options.theme,
            quote,
            chime: None,
            settings_open: false,
            rng,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn theme(&self) -> SoundTheme {
        self.theme
    }

    pub fn quote(&self) -> &'static Quote {
        self.quote
    }

    pub fn is_sound_playing(&self) -> bool {
        self.ambient.is_playing()
    }

    pub fn is_settings_open(&self) -> bool {
        self.settings_open
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.timer.state(),
            remaining_secs: self.timer.remaining_secs(),
            total_secs: self.timer.total_secs(),
            display: self.timer.display(),
            progress: self.timer.progress(),
            theme: self.theme,
            sound_playing: self.ambient.is_playing(),
            at: Utc::now(),
        }
    }

    // ── Timer ────────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let event = self.timer.start()?;
        self.ambient.play(self.theme);
        Some(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.timer.pause()?;
        self.ambient.stop();
        Some(event)
    }

    pub fn toggle(&mut self) -> Option<Event> {
        if self.timer.is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    pub fn reset(&mut self) -> Event {
        self.ambient.stop();
        release_chime(self.chime.take());
        self.timer.reset()
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(now_ms())
    }

    pub fn tick_at(&mut self, now_ms: u64) -> Option<Event> {
        let event = self.timer.tick_at(now_ms)?;
        self.ambient.stop();
        let feedback = self.notifier.notify_completion(&self.settings);
        release_chime(self.chime.take());
        self.chime = feedback.chime;
        info!(total = self.timer.total_secs(), "meditation complete");
        Some(event)
    }

    /// Perform a due automatic reset and show a fresh quote.
    pub fn poll(&mut self, now_ms: u64) -> Vec<Event> {
        let Some(reset) = self.timer.poll_auto_reset(now_ms) else {
            return Vec::new();
        };
        release_chime(self.chime.take());
        vec![reset, self.next_quote()]
    }

    pub fn set_duration(&mut self, secs: u32) -> Option<Event> {
        self.timer.set_duration(secs)
    }

    // ── Sound ────────────────────────────────────────────────────────

    /// Select a theme. A running session switches over immediately.
    pub fn set_theme(&mut self, theme: SoundTheme) -> Event {
        self.theme = theme;
        if self.timer.is_running() {
            self.ambient.stop();
            self.ambient.play(theme);
        }
        debug!(%theme, "theme selected");
        Event::ThemeChanged { theme, at: Utc::now() }
    }

    /// Flip sound on or off and persist the choice. Turning sound back on
    /// during a running session resumes the selected theme.
    pub fn toggle_sound(&mut self) -> Event {
        let enabled = !self.settings.sound_enabled;
        self.settings.sound_enabled = enabled;
        self.ambient.set_enabled(enabled);
        if enabled && self.timer.is_running() {
            self.ambient.play(self.theme);
        }
        self.persist();
        Event::SoundToggled { enabled, at: Utc::now() }
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn set_notification_sound(&mut self, enabled: bool) -> Event {
        self.settings.notification_sound = enabled;
        self.settings_changed()
    }

    pub fn set_vibration(&mut self, enabled: bool) -> Event {
        self.settings.vibration = enabled;
        self.settings_changed()
    }

    pub fn open_settings(&mut self) {
        self.settings_open = true;
    }

    pub fn close_settings(&mut self) {
        self.settings_open = false;
    }

    pub fn next_quote(&mut self) -> Event {
        self.quote = QuoteProvider.random(&mut self.rng);
        Event::QuoteShown {
            text: self.quote.text.to_string(),
            author: self.quote.author.to_string(),
            at: Utc::now(),
        }
    }

    pub fn handle_shortcut(&mut self, shortcut: Shortcut) -> Option<Event> {
        match shortcut {
            Shortcut::ToggleTimer => self.toggle(),
            Shortcut::Reset => Some(self.reset()),
            Shortcut::ToggleSound => Some(self.toggle_sound()),
            Shortcut::CloseSettings => {
                self.close_settings();
                None
            }
        }
    }

    fn settings_changed(&mut self) -> Event {
        self.persist();
        Event::SettingsChanged {
            settings: self.settings,
            at: Utc::now(),
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.settings) {
            warn!(error = %e, "failed to save settings");
        }
    }
}

impl<D: AudioDevice + Clone, H: Haptics> Drop for SessionController<D, H> {
    fn drop(&mut self) {
        release_chime(self.chime.take());
    }
}
