//! Session-completion feedback: a short chime and a vibration pulse.
//!
//! Both effects are fire-and-forget. Failures are logged and swallowed so
//! completing a session can never fail because of feedback.

use tracing::{debug, warn};

use crate::audio::dsp::{AttackDecay, Oscillator, Voice, Waveform};
use crate::audio::{AudioDevice, AudioStream};
use crate::error::HapticsError;
use crate::settings::Settings;

/// On, off, on (milliseconds).
pub const VIBRATION_PATTERN: [u32; 3] = [200, 100, 200];

const TONE_SECS: f64 = 0.3;
const TONE_STEPS: [(f64, f64); 3] = [(0.0, 800.0), (0.1, 600.0), (0.2, 800.0)];
const TONE_ENVELOPE: AttackDecay = AttackDecay {
    attack_secs: 0.01,
    peak: 0.1,
    end_secs: TONE_SECS,
    floor: 0.001,
};

/// Platform vibration support.
pub trait Haptics {
    fn is_supported(&self) -> bool;

    fn vibrate(&mut self, pattern: &[u32]) -> Result<(), HapticsError>;
}

/// The three-step completion chime as a finite voice.
pub struct CompletionTone {
    osc: Oscillator,
    sample_rate: f64,
    elapsed: u64,
}

impl CompletionTone {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            osc: Oscillator::new(Waveform::Sine, TONE_STEPS[0].1, sample_rate),
            sample_rate: f64::from(sample_rate),
            elapsed: 0,
        }
    }

    fn time(&self) -> f64 {
        self.elapsed as f64 / self.sample_rate
    }

    /// Stepped frequency at `t` seconds.
    pub fn frequency_at(t: f64) -> f64 {
        TONE_STEPS
            .iter()
            .rev()
            .find(|(start, _)| t >= *start)
            .map(|(_, hz)| *hz)
            .unwrap_or(TONE_STEPS[0].1)
    }
}

impl Voice for CompletionTone {
    fn next_sample(&mut self) -> f32 {
        let t = self.time();
        if t >= TONE_SECS {
            return 0.0;
        }
        self.elapsed += 1;
        (self.osc.next_at(Self::frequency_at(t)) * TONE_ENVELOPE.level_at(t)) as f32
    }

    fn is_finished(&self) -> bool {
        self.time() >= TONE_SECS
    }
}

/// What the emitter actually did, for the caller to keep or report.
pub struct Feedback<S> {
    /// The short-lived chime stream; dropping it ends the chime.
    pub chime: Option<S>,
    pub vibrated: bool,
}

impl<S> Feedback<S> {
    pub fn none() -> Self {
        Self {
            chime: None,
            vibrated: false,
        }
    }
}

/// Plays the completion chime on its own stream and triggers vibration.
pub struct Notifier<D: AudioDevice, H: Haptics> {
    device: D,
    haptics: H,
}

impl<D: AudioDevice, H: Haptics> Notifier<D, H> {
    pub fn new(device: D, haptics: H) -> Self {
        Self { device, haptics }
    }

    pub fn notify_completion(&mut self, settings: &Settings) -> Feedback<D::Stream> {
        let mut feedback = Feedback::none();

        if settings.notification_sound {
            let tone = CompletionTone::new(self.device.sample_rate());
            match self.device.open(Box::new(tone)) {
                Ok(stream) => feedback.chime = Some(stream),
                Err(e) => warn!(error = %e, "notification sound error"),
            }
        }

        if settings.vibration && self.haptics.is_supported() {
            match self.haptics.vibrate(&VIBRATION_PATTERN) {
                Ok(()) => feedback.vibrated = true,
                Err(e) => warn!(error = %e, "vibration error"),
            }
        }

        debug!(
            chime = feedback.chime.is_some(),
            vibrated = feedback.vibrated,
            "completion feedback"
        );
        feedback
    }
}

/// Stop a chime stream, logging instead of failing.
pub fn release_chime<S: AudioStream>(chime: Option<S>) {
    if let Some(mut stream) = chime {
        if let Err(e) = stream.stop() {
            debug!(error = %e, "chime already stopped");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Haptics double that records every pattern it is asked to play.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingHaptics {
        pub patterns: Arc<Mutex<Vec<Vec<u32>>>>,
        pub unsupported: bool,
        pub failing: bool,
    }

    impl RecordingHaptics {
        pub fn count(&self) -> usize {
            self.patterns.lock().unwrap().len()
        }
    }

    impl Haptics for RecordingHaptics {
        fn is_supported(&self) -> bool {
            !self.unsupported
        }

        fn vibrate(&mut self, pattern: &[u32]) -> Result<(), HapticsError> {
            if self.failing {
                return Err(HapticsError::Failed("motor jammed".into()));
            }
            self.patterns.lock().unwrap().push(pattern.to_vec());
            Ok(())
        }
    }
}
