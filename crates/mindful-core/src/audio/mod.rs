//! Procedural ambient sound.
//!
//! Themes are small synthesis recipes built from the primitives in [`dsp`]:
//! filtered looping noise (rain, wind), frequency-modulated sine (ocean),
//! triangle drones (forest) and a randomly scheduled chirp generator
//! (birds). The [`AmbientEngine`] plays at most one theme at a time on an
//! [`AudioDevice`].

pub mod device;
pub mod dsp;
mod engine;
pub mod render;
mod theme;
pub mod voices;

pub use device::{AudioDevice, AudioStream, LivenessToken, NullDevice};
pub use dsp::Voice;
pub use engine::AmbientEngine;
pub use render::{render_theme, write_wav};
pub use theme::SoundTheme;
