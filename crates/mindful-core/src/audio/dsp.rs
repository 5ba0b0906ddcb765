//! Signal primitives shared by every ambient theme.
//!
//! Everything here is per-sample and allocation-free after construction so
//! voices can run on a real-time audio thread.

use rand::Rng;
use std::f64::consts::PI;

/// A mono signal source pulled one sample at a time.
pub trait Voice: Send {
    fn next_sample(&mut self) -> f32;

    /// A finished voice produces only silence from now on.
    fn is_finished(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

/// Phase-accumulating oscillator.
///
/// The frequency may be modulated on every sample through [`Oscillator::next_at`];
/// phase stays continuous so modulation never clicks.
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f64,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f64, sample_rate: u32) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
            sample_rate: f64::from(sample_rate),
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Next sample at the oscillator's own frequency.
    pub fn next(&mut self) -> f64 {
        self.next_at(self.frequency)
    }

    /// Next sample at an instantaneous frequency (frequency modulation).
    pub fn next_at(&mut self, frequency: f64) -> f64 {
        let value = match self.waveform {
            Waveform::Sine => (2.0 * PI * self.phase).sin(),
            Waveform::Triangle => {
                // Starts at zero and rises, like a sine.
                let p = self.phase;
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
        };
        self.phase = (self.phase + frequency / self.sample_rate).rem_euclid(1.0);
        value
    }
}

/// Looping buffer of uniform white noise in [-1, 1].
#[derive(Debug, Clone)]
pub struct NoiseLoop {
    buffer: Vec<f32>,
    position: usize,
}

impl NoiseLoop {
    pub const DEFAULT_LEN: usize = 4096;

    pub fn new<R: Rng>(rng: &mut R, len: usize) -> Self {
        let buffer = (0..len.max(1)).map(|_| rng.gen_range(-1.0f32..=1.0)).collect();
        Self { buffer, position: 0 }
    }

    pub fn next(&mut self) -> f32 {
        let value = self.buffer[self.position];
        self.position = (self.position + 1) % self.buffer.len();
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    /// Constant 0 dB peak gain band-pass.
    BandPass,
}

/// Biquad coefficients normalised by a0 (Audio EQ Cookbook).
#[derive(Debug, Clone, Copy, Default)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    fn calculate(kind: FilterKind, sample_rate: f64, frequency: f64, q: f64) -> Self {
        // Keep below Nyquist, even at sample rates under 20 Hz.
        let max = (sample_rate * 0.49).max(0.0);
        let freq = frequency.clamp(10.0f64.min(max), max);
        let q = q.max(0.01);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2, a0, a1, a2) = match kind {
            FilterKind::LowPass => (
                (1.0 - cos_w0) / 2.0,
                1.0 - cos_w0,
                (1.0 - cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterKind::BandPass => (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha),
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Single-channel biquad filter, direct form I.
#[derive(Debug, Clone)]
pub struct Biquad {
    coeffs: BiquadCoeffs,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    pub fn new(kind: FilterKind, sample_rate: u32, frequency: f64, q: f64) -> Self {
        Self {
            coeffs: BiquadCoeffs::calculate(kind, f64::from(sample_rate), frequency, q),
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn low_pass(sample_rate: u32, cutoff: f64, q: f64) -> Self {
        Self::new(FilterKind::LowPass, sample_rate, cutoff, q)
    }

    pub fn band_pass(sample_rate: u32, center: f64, q: f64) -> Self {
        Self::new(FilterKind::BandPass, sample_rate, center, q)
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let x = f64::from(input);
        let c = &self.coeffs;
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y as f32
    }
}

/// Linear attack to `peak`, then exponential decay reaching `floor` at `end`.
///
/// Returns 0 at and after `end` (the generating oscillator is stopped).
#[derive(Debug, Clone, Copy)]
pub struct AttackDecay {
    pub attack_secs: f64,
    pub peak: f64,
    pub end_secs: f64,
    pub floor: f64,
}

impl AttackDecay {
    pub fn level_at(&self, t: f64) -> f64 {
        if t < 0.0 || t >= self.end_secs {
            0.0
        } else if t < self.attack_secs {
            self.peak * t / self.attack_secs
        } else {
            let progress = (t - self.attack_secs) / (self.end_secs - self.attack_secs);
            self.peak * (self.floor / self.peak).powf(progress)
        }
    }
}

/// Exponential ramp from `from` to `to` over `duration` seconds, held after.
pub fn exponential_ramp(from: f64, to: f64, duration: f64, t: f64) -> f64 {
    if t <= 0.0 {
        from
    } else if t >= duration {
        to
    } else {
        from * (to / from).powf(t / duration)
    }
}

/// Final gain stage applied to a theme's mix.
pub struct Gain {
    inner: Box<dyn Voice>,
    level: f32,
}

impl Gain {
    pub fn new(inner: Box<dyn Voice>, level: f32) -> Self {
        Self { inner, level }
    }
}

impl Voice for Gain {
    fn next_sample(&mut self) -> f32 {
        self.inner.next_sample() * self.level
    }

    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn noise_loop_stays_in_range_and_repeats() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let mut noise = NoiseLoop::new(&mut rng, 16);
        let first: Vec<f32> = (0..16).map(|_| noise.next()).collect();
        let second: Vec<f32> = (0..16).map(|_| noise.next()).collect();
        assert!(first.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(first, second);
    }

    #[test]
    fn sine_oscillator_completes_a_cycle() {
        let mut osc = Oscillator::new(Waveform::Sine, 1.0, 4);
        let samples: Vec<f64> = (0..4).map(|_| osc.next()).collect();
        assert!(samples[0].abs() < 1e-9);
        assert!((samples[1] - 1.0).abs() < 1e-9);
        assert!((samples[3] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn triangle_peaks_at_quarter_phase() {
        let mut osc = Oscillator::new(Waveform::Triangle, 1.0, 8);
        let samples: Vec<f64> = (0..8).map(|_| osc.next()).collect();
        assert!((samples[2] - 1.0).abs() < 1e-9);
        assert!((samples[6] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn low_pass_attenuates_high_frequencies() {
        let sample_rate = 44_100;
        let mut filter = Biquad::low_pass(sample_rate, 800.0, std::f64::consts::FRAC_1_SQRT_2);
        let mut osc = Oscillator::new(Waveform::Sine, 10_000.0, sample_rate);
        let peak = (0..4410)
            .map(|_| filter.process(osc.next() as f32).abs())
            .skip(1000)
            .fold(0.0f32, f32::max);
        assert!(peak < 0.05, "10 kHz leaked through an 800 Hz low-pass: {peak}");
    }

    #[test]
    fn band_pass_passes_center_frequency() {
        let sample_rate = 44_100;
        let mut filter = Biquad::band_pass(sample_rate, 400.0, 0.5);
        let mut osc = Oscillator::new(Waveform::Sine, 400.0, sample_rate);
        let peak = (0..44_100)
            .map(|_| filter.process(osc.next() as f32).abs())
            .skip(22_050)
            .fold(0.0f32, f32::max);
        assert!(peak > 0.9, "centre frequency attenuated: {peak}");
    }

    #[test]
    fn filters_stay_finite_at_tiny_sample_rates() {
        for sample_rate in [1, 16, 21] {
            let mut low = Biquad::low_pass(sample_rate, 800.0, 0.5);
            let mut band = Biquad::band_pass(sample_rate, 400.0, 0.5);
            for i in 0..256 {
                let x = if i % 2 == 0 { 1.0 } else { -1.0 };
                assert!(low.process(x).is_finite(), "low-pass diverged at {sample_rate} Hz");
                assert!(band.process(x).is_finite(), "band-pass diverged at {sample_rate} Hz");
            }
        }
    }

    #[test]
    fn attack_decay_shape() {
        let env = AttackDecay {
            attack_secs: 0.01,
            peak: 0.05,
            end_secs: 0.1,
            floor: 0.001,
        };
        assert_eq!(env.level_at(0.0), 0.0);
        assert!((env.level_at(0.005) - 0.025).abs() < 1e-12);
        assert!((env.level_at(0.01) - 0.05).abs() < 1e-12);
        assert!(env.level_at(0.0999) < 0.0011);
        assert_eq!(env.level_at(0.1), 0.0);
    }

    #[test]
    fn exponential_ramp_halves() {
        assert_eq!(exponential_ramp(1000.0, 500.0, 0.1, 0.0), 1000.0);
        assert!((exponential_ramp(1000.0, 500.0, 0.1, 0.05) - 707.106_781).abs() < 1e-3);
        assert_eq!(exponential_ramp(1000.0, 500.0, 0.1, 0.2), 500.0);
    }
}
