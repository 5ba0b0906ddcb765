//! Session controller integration tests.
//!
//! Drives a full meditation through the public API with a device that logs
//! every stream it opens and stops.

use std::sync::{Arc, Mutex};

use mindful_core::audio::Voice;
use mindful_core::notify::Haptics;
use mindful_core::{
    AudioDevice, AudioError, AudioStream, Event, HapticsError, JsonFileStore, KeyValueStore, MemoryStore,
    SessionController, SessionOptions, Settings, SettingsStore, SoundTheme, TimerState,
};

#[derive(Debug, Default)]
struct Log {
    opened: usize,
    stopped: usize,
    live: usize,
    max_live: usize,
}

#[derive(Clone, Default)]
struct LoggingDevice(Arc<Mutex<Log>>);

struct LoggingStream {
    log: Arc<Mutex<Log>>,
    live: bool,
}

impl AudioStream for LoggingStream {
    fn stop(&mut self) -> Result<(), AudioError> {
        let mut log = self.log.lock().unwrap();
        log.stopped += 1;
        if !self.live {
            return Err(AudioError::AlreadyStopped);
        }
        self.live = false;
        log.live -= 1;
        Ok(())
    }
}

impl AudioDevice for LoggingDevice {
    type Stream = LoggingStream;

    fn sample_rate(&self) -> u32 {
        16_000
    }

    fn open(&mut self, mut voice: Box<dyn Voice>) -> Result<LoggingStream, AudioError> {
        // Pull a few samples the way an audio thread would.
        for _ in 0..64 {
            voice.next_sample();
        }
        let mut log = self.0.lock().unwrap();
        log.opened += 1;
        log.live += 1;
        log.max_live = log.max_live.max(log.live);
        Ok(LoggingStream {
            log: Arc::clone(&self.0),
            live: true,
        })
    }
}

#[derive(Clone, Default)]
struct CountingHaptics(Arc<Mutex<usize>>);

impl Haptics for CountingHaptics {
    fn is_supported(&self) -> bool {
        true
    }

    fn vibrate(&mut self, _pattern: &[u32]) -> Result<(), HapticsError> {
        *self.0.lock().unwrap() += 1;
        Ok(())
    }
}

fn controller(
    duration_secs: u32,
    theme: SoundTheme,
    store: Box<dyn KeyValueStore>,
) -> (SessionController<LoggingDevice, CountingHaptics>, LoggingDevice, CountingHaptics) {
    let device = LoggingDevice::default();
    let haptics = CountingHaptics::default();
    let options = SessionOptions {
        duration_secs,
        theme,
        seed: Some(11),
        ..Default::default()
    };
    let controller = SessionController::new(device.clone(), haptics.clone(), SettingsStore::new(store), options);
    (controller, device, haptics)
}

#[test]
fn full_meditation_cycle() {
    let (mut session, device, haptics) = controller(3, SoundTheme::Birds, Box::new(MemoryStore::new()));

    assert!(matches!(session.start(), Some(Event::TimerStarted { remaining_secs: 3, .. })));
    assert!(session.tick_at(1_000).is_none());
    assert!(session.tick_at(2_000).is_none());

    // Switch theme with one second left
    session.set_theme(SoundTheme::Ocean);
    assert!(matches!(session.tick_at(3_000), Some(Event::TimerCompleted { total_secs: 3, .. })));
    assert_eq!(*haptics.0.lock().unwrap(), 1);

    {
        let log = device.0.lock().unwrap();
        // birds, ocean, chime
        assert_eq!(log.opened, 3);
        assert_eq!(log.stopped, 2);
        assert_eq!(log.max_live, 1, "ambient sound stops before the chime opens");
        assert_eq!(log.live, 1);
    }

    let events = session.poll(6_000);
    assert_eq!(events.len(), 2);
    assert_eq!(session.timer().state(), TimerState::Idle);
    assert_eq!(session.timer().remaining_secs(), 3);
    assert_eq!(device.0.lock().unwrap().live, 0);
}

#[test]
fn snapshot_reports_progress() {
    let (mut session, _device, _haptics) = controller(4, SoundTheme::Rain, Box::new(MemoryStore::new()));
    session.start();
    session.tick_at(0);
    match session.snapshot() {
        Event::StateSnapshot {
            state,
            remaining_secs,
            display,
            progress,
            sound_playing,
            ..
        } => {
            assert_eq!(state, TimerState::Running);
            assert_eq!(remaining_secs, 3);
            assert_eq!(display, "00:03");
            assert!((progress - 0.25).abs() < 1e-12);
            assert!(sound_playing);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn settings_persist_across_controllers() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("storage.json");

    {
        let store = JsonFileStore::open_at(&path).unwrap();
        let (mut session, _device, _haptics) = controller(60, SoundTheme::None, Box::new(store));
        session.toggle_sound();
        session.set_vibration(false);
    }

    let store = JsonFileStore::open_at(&path).unwrap();
    let (session, _device, _haptics) = controller(60, SoundTheme::None, Box::new(store));
    assert_eq!(
        session.settings(),
        Settings {
            notification_sound: true,
            vibration: false,
            sound_enabled: false,
        }
    );
}
