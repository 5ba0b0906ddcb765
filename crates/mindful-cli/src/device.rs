//! Output backends for the terminal adapter.

use std::io::{IsTerminal, Write};

use mindful_core::notify::Haptics;
use mindful_core::{AudioDevice, HapticsError};
use tracing::info;

#[cfg(feature = "playback")]
pub use playback::CpalDevice as OutputDevice;

#[cfg(not(feature = "playback"))]
pub use mindful_core::NullDevice as OutputDevice;

/// Output device for this build: the system device with the `playback`
/// feature, a silent sink otherwise.
pub fn output_device(sample_rate: u32) -> OutputDevice {
    #[cfg(feature = "playback")]
    let device = playback::CpalDevice::default_output();
    #[cfg(not(feature = "playback"))]
    let device = mindful_core::NullDevice::new(sample_rate);

    report_rate_override(sample_rate, device.sample_rate());
    device
}

/// The device's own rate wins over `audio.sample_rate`. Returns whether
/// they differ.
fn report_rate_override(configured: u32, device: u32) -> bool {
    if configured == device {
        return false;
    }
    info!(configured, device, "output device sample rate overrides audio.sample_rate");
    true
}

/// Stands in for vibration by ringing the terminal bell.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl Haptics for TerminalBell {
    fn is_supported(&self) -> bool {
        std::io::stdout().is_terminal()
    }

    fn vibrate(&mut self, pattern: &[u32]) -> Result<(), HapticsError> {
        // One bell per "on" pulse.
        let pulses = pattern.iter().step_by(2).count();
        let mut stdout = std::io::stdout();
        for _ in 0..pulses {
            stdout
                .write_all(b"\x07")
                .map_err(|e| HapticsError::Failed(e.to_string()))?;
        }
        stdout.flush().map_err(|e| HapticsError::Failed(e.to_string()))
    }
}

#[cfg(feature = "playback")]
mod playback {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, SizedSample};
    use mindful_core::audio::Voice;
    use mindful_core::{AudioDevice, AudioError, AudioStream};
    use tracing::warn;

    /// The host's default output device, looked up once.
    #[derive(Clone)]
    pub struct CpalDevice {
        output: Option<(cpal::Device, cpal::SupportedStreamConfig)>,
    }

    impl CpalDevice {
        pub fn default_output() -> Self {
            let host = cpal::default_host();
            let output = host.default_output_device().and_then(|device| {
                match device.default_output_config() {
                    Ok(config) => Some((device, config)),
                    Err(e) => {
                        warn!(error = %e, "no usable output config");
                        None
                    }
                }
            });
            if output.is_none() {
                warn!("no audio output device, sound is disabled");
            }
            Self { output }
        }
    }

    pub struct CpalStream {
        stream: Option<cpal::Stream>,
    }

    impl AudioStream for CpalStream {
        fn stop(&mut self) -> Result<(), AudioError> {
            let stream = self.stream.take().ok_or(AudioError::AlreadyStopped)?;
            stream.pause().map_err(|e| AudioError::StreamFailed(e.to_string()))
        }
    }

    impl AudioDevice for CpalDevice {
        type Stream = CpalStream;

        fn sample_rate(&self) -> u32 {
            self.output
                .as_ref()
                .map(|(_, config)| config.sample_rate().0)
                .unwrap_or(44_100)
        }

        fn open(&mut self, voice: Box<dyn Voice>) -> Result<CpalStream, AudioError> {
            let (device, config) = self.output.as_ref().ok_or(AudioError::DeviceUnavailable)?;
            let stream = match config.sample_format() {
                cpal::SampleFormat::F32 => build_stream::<f32>(device, &config.config(), voice)?,
                cpal::SampleFormat::I16 => build_stream::<i16>(device, &config.config(), voice)?,
                format => {
                    return Err(AudioError::StreamFailed(format!("unsupported sample format '{format}'")))
                }
            };
            stream.play().map_err(|e| AudioError::StreamFailed(e.to_string()))?;
            Ok(CpalStream { stream: Some(stream) })
        }
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mut voice: Box<dyn Voice>,
    ) -> Result<cpal::Stream, AudioError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = config.channels as usize;
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let value = T::from_sample(voice.next_sample());
                        for sample in frame.iter_mut() {
                            *sample = value;
                        }
                    }
                },
                |err| warn!(error = %err, "audio stream error"),
                None,
            )
            .map_err(|e| AudioError::StreamFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_override_reported_only_on_mismatch() {
        assert!(!report_rate_override(44_100, 44_100));
        assert!(report_rate_override(22_050, 48_000));
    }

    #[cfg(not(feature = "playback"))]
    #[test]
    fn silent_device_uses_configured_rate() {
        assert_eq!(output_device(22_050).sample_rate(), 22_050);
    }
}
