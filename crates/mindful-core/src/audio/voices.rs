//! Synthesis recipes, one per ambient theme.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use super::device::LivenessToken;
use super::dsp::{
    exponential_ramp, AttackDecay, Biquad, Gain, NoiseLoop, Oscillator, Voice, Waveform,
};
use super::theme::SoundTheme;

const RAIN_CUTOFF_HZ: f64 = 800.0;
const RAIN_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;
const WIND_CENTER_HZ: f64 = 400.0;
const WIND_Q: f64 = 0.5;

const OCEAN_CARRIER_HZ: f64 = 0.1;
const OCEAN_LFO_HZ: f64 = 0.05;
const OCEAN_DEPTH_HZ: f64 = 200.0;

const FOREST_TONES_HZ: [f64; 4] = [80.0, 120.0, 160.0, 200.0];
const FOREST_JITTER_HZ: f64 = 20.0;
const FOREST_TONE_GAIN: f64 = 0.02;

const CHIRP_MIN_HZ: f64 = 800.0;
const CHIRP_MAX_HZ: f64 = 2000.0;
const CHIRP_SECS: f64 = 0.1;
const CHIRP_ENVELOPE: AttackDecay = AttackDecay {
    attack_secs: 0.01,
    peak: 0.05,
    end_secs: CHIRP_SECS,
    floor: 0.001,
};
const CHIRP_GAP_MIN_SECS: f64 = 2.0;
const CHIRP_GAP_MAX_SECS: f64 = 5.0;

/// Build the voice for `theme`, already passed through the master gain.
///
/// Returns `None` for [`SoundTheme::None`].
pub fn build_voice(
    theme: SoundTheme,
    sample_rate: u32,
    master_gain: f32,
    seed: u64,
    token: LivenessToken,
) -> Option<Box<dyn Voice>> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let voice: Box<dyn Voice> = match theme {
        SoundTheme::None => return None,
        SoundTheme::Rain => Box::new(FilteredNoise::new(
            NoiseLoop::new(&mut rng, NoiseLoop::DEFAULT_LEN),
            Biquad::low_pass(sample_rate, RAIN_CUTOFF_HZ, RAIN_Q),
        )),
        SoundTheme::Wind => Box::new(FilteredNoise::new(
            NoiseLoop::new(&mut rng, NoiseLoop::DEFAULT_LEN),
            Biquad::band_pass(sample_rate, WIND_CENTER_HZ, WIND_Q),
        )),
        SoundTheme::Ocean => Box::new(Ocean::new(sample_rate)),
        SoundTheme::Forest => Box::new(Forest::new(sample_rate, &mut rng)),
        SoundTheme::Birds => Box::new(Birdsong::new(sample_rate, rng, token)),
    };
    Some(Box::new(Gain::new(voice, master_gain)))
}

/// Looping noise through a biquad (rain, wind).
pub struct FilteredNoise {
    noise: NoiseLoop,
    filter: Biquad,
}

impl FilteredNoise {
    pub fn new(noise: NoiseLoop, filter: Biquad) -> Self {
        Self { noise, filter }
    }
}

impl Voice for FilteredNoise {
    fn next_sample(&mut self) -> f32 {
        self.filter.process(self.noise.next())
    }
}

/// Very slow sine whose frequency drifts under a slower LFO.
pub struct Ocean {
    carrier: Oscillator,
    lfo: Oscillator,
}

impl Ocean {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            carrier: Oscillator::new(Waveform::Sine, OCEAN_CARRIER_HZ, sample_rate),
            lfo: Oscillator::new(Waveform::Sine, OCEAN_LFO_HZ, sample_rate),
        }
    }
}

impl Voice for Ocean {
    fn next_sample(&mut self) -> f32 {
        let modulation = self.lfo.next() * OCEAN_DEPTH_HZ;
        self.carrier.next_at(OCEAN_CARRIER_HZ + modulation) as f32
    }
}

/// Four quiet triangle drones.
pub struct Forest {
    tones: Vec<Oscillator>,
}

impl Forest {
    pub fn new<R: Rng>(sample_rate: u32, rng: &mut R) -> Self {
        let tones = FOREST_TONES_HZ
            .iter()
            .map(|base| {
                let jitter = rng.gen_range(0.0..FOREST_JITTER_HZ);
                Oscillator::new(Waveform::Triangle, base + jitter, sample_rate)
            })
            .collect();
        Self { tones }
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.tones.iter().map(Oscillator::frequency).collect()
    }
}

impl Voice for Forest {
    fn next_sample(&mut self) -> f32 {
        let sum: f64 = self.tones.iter_mut().map(|osc| osc.next() * FOREST_TONE_GAIN).sum();
        sum as f32
    }
}

struct Chirp {
    osc: Oscillator,
    base_hz: f64,
    elapsed: u64,
}

/// Randomly spaced bird chirps, forever, until the token is revoked.
pub struct Birdsong {
    rng: Pcg64Mcg,
    sample_rate: f64,
    token: LivenessToken,
    chirp: Option<Chirp>,
    /// Samples until the next chirp is due.
    until_next: u64,
    chirps_started: u64,
}

impl Birdsong {
    pub fn new(sample_rate: u32, rng: Pcg64Mcg, token: LivenessToken) -> Self {
        Self {
            rng,
            sample_rate: f64::from(sample_rate),
            token,
            chirp: None,
            until_next: 0,
            chirps_started: 0,
        }
    }

    pub fn chirps_started(&self) -> u64 {
        self.chirps_started
    }

    fn start_chirp(&mut self) {
        let base_hz = self.rng.gen_range(CHIRP_MIN_HZ..CHIRP_MAX_HZ);
        self.chirp = Some(Chirp {
            osc: Oscillator::new(Waveform::Sine, base_hz, self.sample_rate as u32),
            base_hz,
            elapsed: 0,
        });
        self.chirps_started += 1;

        let gap = self.rng.gen_range(CHIRP_GAP_MIN_SECS..CHIRP_GAP_MAX_SECS);
        self.until_next = (gap * self.sample_rate) as u64;
    }
}

impl Voice for Birdsong {
    fn next_sample(&mut self) -> f32 {
        if self.until_next == 0 {
            if self.token.is_live() {
                self.start_chirp();
            }
        } else {
            self.until_next -= 1;
        }

        let Some(chirp) = self.chirp.as_mut() else {
            return 0.0;
        };
        let t = chirp.elapsed as f64 / self.sample_rate;
        if t >= CHIRP_SECS {
            self.chirp = None;
            return 0.0;
        }
        chirp.elapsed += 1;
        let frequency = exponential_ramp(chirp.base_hz, chirp.base_hz * 0.5, CHIRP_SECS, t);
        (chirp.osc.next_at(frequency) * CHIRP_ENVELOPE.level_at(t)) as f32
    }

    fn is_finished(&self) -> bool {
        !self.token.is_live() && self.chirp.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 8_000;

    fn render(voice: &mut dyn Voice, samples: usize) -> Vec<f32> {
        (0..samples).map(|_| voice.next_sample()).collect()
    }

    #[test]
    fn none_theme_builds_nothing() {
        assert!(build_voice(SoundTheme::None, SR, 0.1, 1, LivenessToken::new()).is_none());
    }

    #[test]
    fn every_audible_theme_stays_within_master_gain() {
        for theme in SoundTheme::ALL.into_iter().filter(|t| !t.is_silent()) {
            let mut voice = build_voice(theme, SR, 0.1, 3, LivenessToken::new()).unwrap();
            let out = render(voice.as_mut(), SR as usize * 2);
            let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
            assert!(peak <= 0.1 * 2.0, "{theme} peaked at {peak}");
            assert!(out.iter().all(|s| s.is_finite()), "{theme} produced NaN");
        }
    }

    #[test]
    fn every_theme_builds_at_a_tiny_sample_rate() {
        for theme in SoundTheme::ALL.into_iter().filter(|t| !t.is_silent()) {
            let mut voice = build_voice(theme, 16, 0.1, 5, LivenessToken::new()).unwrap();
            let out = render(voice.as_mut(), 64);
            assert!(out.iter().all(|s| s.is_finite()), "{theme} produced NaN at 16 Hz");
        }
    }

    #[test]
    fn rain_is_not_silent() {
        let mut voice = build_voice(SoundTheme::Rain, SR, 0.1, 9, LivenessToken::new()).unwrap();
        let energy: f32 = render(voice.as_mut(), 4000).iter().map(|s| s * s).sum();
        assert!(energy > 0.0);
    }

    #[test]
    fn forest_jitter_stays_within_twenty_hertz() {
        let mut rng = Pcg64Mcg::seed_from_u64(11);
        let forest = Forest::new(SR, &mut rng);
        for (freq, base) in forest.frequencies().iter().zip(FOREST_TONES_HZ) {
            assert!(*freq >= base && *freq < base + FOREST_JITTER_HZ);
        }
    }

    #[test]
    fn birds_chirp_immediately_then_wait_at_least_two_seconds() {
        let mut birds = Birdsong::new(SR, Pcg64Mcg::seed_from_u64(5), LivenessToken::new());
        let out = render(&mut birds, SR as usize * 2 - 10);
        assert_eq!(birds.chirps_started(), 1);
        assert!(out[..(SR as usize / 10)].iter().any(|s| s.abs() > 0.0));
        assert!(out[(SR as usize / 10) + 1..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn birds_keep_chirping_while_live() {
        let mut birds = Birdsong::new(SR, Pcg64Mcg::seed_from_u64(5), LivenessToken::new());
        render(&mut birds, SR as usize * 30);
        // 30 s with 2-5 s gaps
        assert!(birds.chirps_started() >= 6 && birds.chirps_started() <= 16);
    }

    #[test]
    fn revoked_token_stops_scheduling_chirps() {
        let token = LivenessToken::new();
        let mut birds = Birdsong::new(SR, Pcg64Mcg::seed_from_u64(5), token.clone());
        render(&mut birds, 10);
        token.revoke();
        let out = render(&mut birds, SR as usize * 20);
        assert_eq!(birds.chirps_started(), 1);
        assert!(birds.is_finished());
        assert!(out[SR as usize..].iter().all(|s| *s == 0.0));
    }
}
