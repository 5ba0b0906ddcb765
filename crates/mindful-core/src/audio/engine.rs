//! Ambient sound engine.
//!
//! Owns at most one [`AudioSession`] at a time. Starting a theme always
//! tears down the previous session first; there is no cross-fade.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use tracing::{debug, warn};

use super::device::{AudioDevice, AudioStream, LivenessToken};
use super::theme::SoundTheme;
use super::voices::build_voice;

/// The active signal graph for one theme.
struct AudioSession<S> {
    theme: SoundTheme,
    stream: S,
    token: LivenessToken,
}

pub struct AmbientEngine<D: AudioDevice> {
    device: D,
    enabled: bool,
    master_gain: f32,
    rng: Pcg64Mcg,
    session: Option<AudioSession<D::Stream>>,
}

impl<D: AudioDevice> AmbientEngine<D> {
    pub fn new(device: D, master_gain: f32) -> Self {
        Self::with_seed(device, master_gain, rand::random())
    }

    /// Engine with deterministic noise and jitter.
    pub fn with_seed(device: D, master_gain: f32, seed: u64) -> Self {
        Self {
            device,
            enabled: true,
            master_gain,
            rng: Pcg64Mcg::seed_from_u64(seed),
            session: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable sound. Disabling stops whatever is playing.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    pub fn active_theme(&self) -> Option<SoundTheme> {
        self.session.as_ref().map(|s| s.theme)
    }

    /// Start `theme`. Returns whether a session is now playing it.
    ///
    /// No-op when sound is disabled or the theme is `none`. Any previous
    /// session is fully stopped before the new stream is opened. Device
    /// failures are logged, not returned.
    pub fn play(&mut self, theme: SoundTheme) -> bool {
        if !self.enabled || theme.is_silent() {
            debug!(%theme, enabled = self.enabled, "ambient play skipped");
            return false;
        }

        self.stop();

        let token = LivenessToken::new();
        let seed = self.rng.gen::<u64>();
        let Some(voice) = build_voice(
            theme,
            self.device.sample_rate(),
            self.master_gain,
            seed,
            token.clone(),
        ) else {
            return false;
        };

        match self.device.open(voice) {
            Ok(stream) => {
                debug!(%theme, "ambient session started");
                self.session = Some(AudioSession {
                    theme,
                    stream,
                    token,
                });
                true
            }
            Err(e) => {
                token.revoke();
                warn!(%theme, error = %e, "could not start ambient sound");
                false
            }
        }
    }

    /// Stop the current session, if any. Returns whether one was stopped.
    ///
    /// Safe to call when nothing is playing. A device that refuses to stop
    /// the stream is logged and ignored; the session is released either way.
    pub fn stop(&mut self) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };
        session.token.revoke();
        if let Err(e) = session.stream.stop() {
            warn!(theme = %session.theme, error = %e, "ambient cleanup error");
        }
        debug!(theme = %session.theme, "ambient session stopped");
        true
    }
}

impl<D: AudioDevice> Drop for AmbientEngine<D> {
    fn drop(&mut self) {
        self.stop();
    }
}
