//! Building blocks (nodes) for the soundscape layers.
//!
//! These are zero-allocation, per-sample components designed for realtime use.
//! Everything here is `Copy` or small and cheap to move; no locks, no heap.
//!
//! Contents:
//! - `Wave`, `Osc`     : basic oscillators (Sine/Tri/Saw) with stable phase wrap
//! - `Lfo`             : low-frequency oscillator (same core as `Osc`), for modulation
//! - `NoiseMod`        : ultra-low-rate random modulator with slewed steps
//! - `WhiteNoise`      : uniform noise in [-1, 1]
//! - `PinkNoise`       : Paul Kellet's refined pink filter over white noise
//! - `Mix2`            : two-input mixer with per-input gains
//! - `PanLaw`          : constant-power panning helper
//! - `AutoPanner`      : slow LFO-driven constant-power panner
//!
//! Notes:
//! - Frequency is **Hz**; methods expect the current **sample rate** when stepping.
//! - Random sources are seeded so a render is reproducible for a given engine seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use resonance_core::dsp::{fast_sin, TAU};
use resonance_core::filters::OnePoleLP;

/// Oscillator waveform.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Wave { Sine, Tri, Saw }

/// Naive triangle and saw are fine here: every bright source sits behind a filter.
#[inline]
fn osc_sample(phase01: f32, wave: Wave) -> f32 {
    match wave {
        Wave::Sine => fast_sin(TAU * phase01),
        Wave::Tri  => 1.0 - 4.0 * (phase01 - 0.5).abs(),
        Wave::Saw  => 2.0 * phase01 - 1.0,
    }
}

/// Free-running oscillator. Not anti-aliased; fine for drones, pads and LFO duties.
#[derive(Copy, Clone, Debug)]
pub struct Osc {
    phase: f32,   // [0,1)
    freq:  f32,   // Hz
    wave:  Wave,
    gain:  f32,
}

impl Osc {
    #[inline] pub fn new(freq_hz: f32, wave: Wave) -> Self { Self { phase: 0.0, freq: freq_hz.max(0.0), wave, gain: 1.0 } }
    #[inline] pub fn with_gain(mut self, g: f32) -> Self { self.gain = g.max(0.0); self }
    #[inline] pub fn set_freq(&mut self, hz: f32) { self.freq = hz.max(0.0); }
    #[inline] pub fn freq(&self) -> f32 { self.freq }

    /// Advance one sample and return the oscillator sample.
    #[inline]
    pub fn next(&mut self, sr: f32) -> f32 {
        self.phase += self.freq / sr;
        if self.phase >= 1.0 { self.phase -= self.phase.floor(); }
        osc_sample(self.phase, self.wave) * self.gain
    }

    /// Hard-set phase in [0,1).
    #[inline] pub fn set_phase01(&mut self, p: f32) { self.phase = if p.is_finite() { p - p.floor() } else { 0.0 }; }
}

/// Low-frequency oscillator; identical to `Osc` but with convenience constructor.
#[derive(Copy, Clone, Debug)]
pub struct Lfo(Osc);
impl Lfo {
    #[inline] pub fn sine(rate_hz: f32) -> Self { Self(Osc::new(rate_hz, Wave::Sine)) }
    #[inline] pub fn tri(rate_hz: f32)  -> Self { Self(Osc::new(rate_hz, Wave::Tri))  }

    /// Next LFO value in **[-1,1]**.
    #[inline] pub fn next_norm(&mut self, sr: f32) -> f32 { self.0.next(sr) }

    /// Next LFO value remapped to **[0,1]**.
    #[inline] pub fn next01(&mut self, sr: f32) -> f32 { 0.5 * (self.0.next(sr) + 1.0) }

    #[inline] pub fn set_phase01(&mut self, p: f32) { self.0.set_phase01(p); }
}

/// Slowly changing random modulator (ambient drift).
///
/// Every `period_s` seconds a new random target in [low, high] is chosen and
/// approached through a one-pole low-pass.
#[derive(Clone, Debug)]
pub struct NoiseMod {
    low: f32,
    high: f32,
    period_s: f32,
    t: f32,           // seconds since last target pick
    target: f32,
    lp: OnePoleLP,
    rng: StdRng,
}

impl NoiseMod {
    /// `period_s`: how often to pick a new target (3–20 s gives a very slow drift)
    /// `cut_hz`  : slew cutoff for the interpolator (smaller = slower)
    pub fn new(low: f32, high: f32, period_s: f32, cut_hz: f32, sr: f32, seed: u64) -> Self {
        let mut s = Self {
            low, high, period_s: period_s.max(0.1),
            t: 0.0,
            target: 0.0,
            lp: OnePoleLP::new(cut_hz.max(0.01), sr),
            rng: StdRng::seed_from_u64(seed),
        };
        s.pick_target();
        s
    }

    #[inline] pub fn reset_sr(&mut self, sr: f32) { self.lp.set_sample_rate(sr); }

    #[inline]
    fn pick_target(&mut self) {
        let u: f32 = self.rng.gen();
        self.target = self.low + (self.high - self.low) * u;
        self.t = 0.0;
    }

    /// Next value, updated once per sample. Returns a smoothed value in [low, high].
    #[inline]
    pub fn next(&mut self, sr: f32) -> f32 {
        self.t += 1.0 / sr;
        if self.t >= self.period_s {
            self.pick_target();
        }
        self.lp.process(self.target)
    }
}

/// Uniform white noise in [-1, 1].
#[derive(Clone, Debug)]
pub struct WhiteNoise {
    rng: StdRng,
}

impl WhiteNoise {
    pub fn new(seed: u64) -> Self { Self { rng: StdRng::seed_from_u64(seed) } }

    #[inline]
    pub fn next(&mut self) -> f32 { self.rng.gen_range(-1.0f32..=1.0) }
}

/// Pink (-3 dB/oct) noise, Paul Kellet's "refined" 7-pole method.
///
/// Output is scaled to roughly the same peak range as the white source.
#[derive(Clone, Debug)]
pub struct PinkNoise {
    white: WhiteNoise,
    b: [f32; 7],
}

impl PinkNoise {
    pub fn new(seed: u64) -> Self { Self { white: WhiteNoise::new(seed), b: [0.0; 7] } }

    #[inline] pub fn reset(&mut self) { self.b = [0.0; 7]; }

    #[inline]
    pub fn next(&mut self) -> f32 {
        let w = self.white.next();
        let b = &mut self.b;
        b[0] = 0.99886 * b[0] + w * 0.0555179;
        b[1] = 0.99332 * b[1] + w * 0.0750759;
        b[2] = 0.96900 * b[2] + w * 0.1538520;
        b[3] = 0.86650 * b[3] + w * 0.3104856;
        b[4] = 0.55000 * b[4] + w * 0.5329522;
        b[5] = -0.7616 * b[5] - w * 0.0168980;
        let pink = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + w * 0.5362;
        b[6] = w * 0.115926;
        pink * 0.11
    }
}

/// Two-input mix utility with per-input gains.
#[derive(Copy, Clone, Debug)]
pub struct Mix2 {
    g1: f32,
    g2: f32,
}
impl Mix2 {
    #[inline] pub fn new(g1: f32, g2: f32) -> Self { Self { g1, g2 } }
    #[inline] pub fn set(&mut self, g1: f32, g2: f32) { self.g1 = g1; self.g2 = g2; }
    #[inline] pub fn run(&self, a: f32, b: f32) -> f32 { a * self.g1 + b * self.g2 }
}

/// Constant-power panner helper.
#[derive(Copy, Clone, Debug)]
pub struct PanLaw;
impl PanLaw {
    /// Return (left, right) gains given `pan` in [-1..1], where -1 = hard left, +1 = hard right.
    #[inline]
    pub fn gains(pan: f32) -> (f32, f32) {
        let p = (pan.clamp(-1.0, 1.0) + 1.0) * 0.25 * core::f32::consts::PI; // map to [0, π/2]
        (p.cos(), p.sin())
    }
}

/// Slow auto-panner: a sine LFO swings the constant-power pan position by `depth`.
#[derive(Copy, Clone, Debug)]
pub struct AutoPanner {
    lfo: Lfo,
    depth: f32,
}

impl AutoPanner {
    /// `phase01` offsets the sweep so layers do not move in lockstep.
    #[inline]
    pub fn new(rate_hz: f32, depth: f32, phase01: f32) -> Self {
        let mut lfo = Lfo::sine(rate_hz.max(0.0));
        lfo.set_phase01(phase01);
        Self { lfo, depth: depth.clamp(0.0, 1.0) }
    }

    /// Pan a mono sample into `(left, right)`.
    #[inline]
    pub fn process(&mut self, x: f32, sr: f32) -> (f32, f32) {
        let (gl, gr) = PanLaw::gains(self.lfo.next_norm(sr) * self.depth);
        (x * gl, x * gr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc_stays_in_range_and_wraps() {
        let sr = 48_000.0;
        for w in [Wave::Sine, Wave::Tri, Wave::Saw] {
            let mut o = Osc::new(440.0, w);
            for _ in 0..48_000 {
                let y = o.next(sr);
                assert!((-1.0001..=1.0001).contains(&y), "{w:?} y={y}");
            }
        }
    }

    #[test]
    fn noise_is_seeded() {
        let mut a = PinkNoise::new(7);
        let mut b = PinkNoise::new(7);
        for _ in 0..1000 {
            assert_eq!(a.next().to_bits(), b.next().to_bits());
        }
    }

    #[test]
    fn pink_noise_is_bounded() {
        let mut p = PinkNoise::new(3);
        let peak = (0..200_000).map(|_| p.next().abs()).fold(0.0f32, f32::max);
        assert!(peak < 2.0 && peak > 0.05, "peak={peak}");
    }

    #[test]
    fn pan_law_is_constant_power() {
        for pan in [-1.0, -0.3, 0.0, 0.5, 1.0] {
            let (l, r) = PanLaw::gains(pan);
            assert!((l * l + r * r - 1.0).abs() < 1e-5);
        }
        let (l, r) = PanLaw::gains(-1.0);
        assert!(l > 0.999 && r < 1e-3);
    }

    #[test]
    fn noise_mod_stays_within_bounds() {
        let sr = 48_000.0;
        let mut m = NoiseMod::new(-6.0, 6.0, 0.5, 2.0, sr, 11);
        for _ in 0..(sr as usize * 5) {
            let v = m.next(sr);
            assert!((-6.0..=6.0).contains(&v));
        }
    }

    #[test]
    fn auto_panner_with_zero_depth_is_centered() {
        let mut p = AutoPanner::new(0.05, 0.0, 0.25);
        let (l, r) = p.process(1.0, 48_000.0);
        assert!((l - r).abs() < 1e-6);
    }
}
