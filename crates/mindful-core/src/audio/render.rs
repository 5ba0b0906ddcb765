//! Offline rendering of voices to WAV files.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::device::LivenessToken;
use super::dsp::Voice;
use super::theme::SoundTheme;
use super::voices::build_voice;
use crate::error::AudioError;

/// Pull `frames` samples from a voice, stopping early once it finishes.
pub fn render_voice(voice: &mut dyn Voice, frames: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(frames);
    for _ in 0..frames {
        if voice.is_finished() {
            break;
        }
        out.push(voice.next_sample());
    }
    out
}

/// Render `seconds` of an ambient theme. `none` renders silence.
pub fn render_theme(
    theme: SoundTheme,
    seconds: f64,
    sample_rate: u32,
    master_gain: f32,
    seed: u64,
) -> Vec<f32> {
    let frames = (seconds.max(0.0) * f64::from(sample_rate)) as usize;
    match build_voice(theme, sample_rate, master_gain, seed, LivenessToken::new()) {
        Some(mut voice) => render_voice(voice.as_mut(), frames),
        None => vec![0.0; frames],
    }
}

/// Write mono samples as 16-bit PCM.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), AudioError> {
    let write_failed = |e: hound::Error| AudioError::WriteFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).map_err(write_failed)?;
    for sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * f32::from(i16::MAX)) as i16)
            .map_err(write_failed)?;
    }
    writer.finalize().map_err(write_failed)
}
