//! Output device abstraction.
//!
//! A device turns a [`Voice`] into an open stream. Streams are owned by
//! whoever opened them and are released with [`AudioStream::stop`] or by
//! being dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::dsp::Voice;
use crate::error::AudioError;

/// An open output stream.
pub trait AudioStream {
    /// Halt playback and release the stream.
    ///
    /// Devices may refuse to stop a stream that is already stopped.
    fn stop(&mut self) -> Result<(), AudioError>;
}

/// Something that can play voices.
pub trait AudioDevice {
    type Stream: AudioStream;

    fn sample_rate(&self) -> u32;

    fn open(&mut self, voice: Box<dyn Voice>) -> Result<Self::Stream, AudioError>;
}

/// Liveness flag shared between an audio session and its voice.
///
/// Scheduled work inside a voice (the next bird chirp) checks the token
/// before acting; revoking it turns any pending continuation into a no-op.
#[derive(Debug, Clone)]
pub struct LivenessToken(Arc<AtomicBool>);

impl LivenessToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for LivenessToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Device that discards everything it is given.
///
/// Used when the build has no playback backend or no output device exists.
#[derive(Debug, Clone)]
pub struct NullDevice {
    sample_rate: u32,
}

impl NullDevice {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl Default for NullDevice {
    fn default() -> Self {
        Self::new(44_100)
    }
}

#[derive(Debug)]
pub struct NullStream {
    stopped: bool,
}

impl AudioStream for NullStream {
    fn stop(&mut self) -> Result<(), AudioError> {
        if self.stopped {
            return Err(AudioError::AlreadyStopped);
        }
        self.stopped = true;
        Ok(())
    }
}

impl AudioDevice for NullDevice {
    type Stream = NullStream;

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn open(&mut self, _voice: Box<dyn Voice>) -> Result<Self::Stream, AudioError> {
        Ok(NullStream { stopped: false })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording device for tests: logs every open/stop in order.

    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum DeviceCall {
        Opened(usize),
        Stopped(usize),
    }

    #[derive(Debug, Default)]
    struct Shared {
        calls: Vec<DeviceCall>,
        active: usize,
        max_active: usize,
        next_id: usize,
        fail_open: bool,
        fail_stop: bool,
    }

    #[derive(Debug, Clone, Default)]
    pub struct RecordingDevice {
        shared: Arc<Mutex<Shared>>,
    }

    impl RecordingDevice {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<DeviceCall> {
            self.shared.lock().unwrap().calls.clone()
        }

        pub fn opened(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, DeviceCall::Opened(_)))
                .count()
        }

        pub fn stopped(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, DeviceCall::Stopped(_)))
                .count()
        }

        pub fn active(&self) -> usize {
            self.shared.lock().unwrap().active
        }

        pub fn max_active(&self) -> usize {
            self.shared.lock().unwrap().max_active
        }

        pub fn fail_open(&self, fail: bool) {
            self.shared.lock().unwrap().fail_open = fail;
        }

        pub fn fail_stop(&self, fail: bool) {
            self.shared.lock().unwrap().fail_stop = fail;
        }
    }

    #[derive(Debug)]
    pub struct RecordingStream {
        id: usize,
        live: bool,
        shared: Arc<Mutex<Shared>>,
    }

    impl AudioStream for RecordingStream {
        fn stop(&mut self) -> Result<(), AudioError> {
            let mut shared = self.shared.lock().unwrap();
            shared.calls.push(DeviceCall::Stopped(self.id));
            if self.live {
                self.live = false;
                shared.active -= 1;
            }
            if shared.fail_stop {
                return Err(AudioError::AlreadyStopped);
            }
            Ok(())
        }
    }

    impl AudioDevice for RecordingDevice {
        type Stream = RecordingStream;

        fn sample_rate(&self) -> u32 {
            8_000
        }

        fn open(&mut self, _voice: Box<dyn Voice>) -> Result<Self::Stream, AudioError> {
            let mut shared = self.shared.lock().unwrap();
            if shared.fail_open {
                return Err(AudioError::DeviceUnavailable);
            }
            let id = shared.next_id;
            shared.next_id += 1;
            shared.calls.push(DeviceCall::Opened(id));
            shared.active += 1;
            shared.max_active = shared.max_active.max(shared.active);
            Ok(RecordingStream {
                id,
                live: true,
                shared: Arc::clone(&self.shared),
            })
        }
    }
}
