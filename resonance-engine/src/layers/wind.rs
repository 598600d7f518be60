//! Wind: pink noise through a 400 Hz band-pass whose center sweeps ±200 Hz at 0.15 Hz,
//! with a slow amplitude tremolo on top.

use resonance_core::filters::{SvfMode, SvfTpt};

use super::Instrument;
use crate::nodes::{Lfo, PinkNoise};

const CENTER_HZ: f32 = 400.0;
const SWEEP_HZ: f32 = 200.0;
const SWEEP_RATE_HZ: f32 = 0.15;
const Q: f32 = 0.5;
const NOISE_GAIN: f32 = 0.5;
const TREMOLO_RATE_HZ: f32 = 0.09;
const TREMOLO_DEPTH: f32 = 0.35;

pub struct Wind {
    sr: f32,
    noise: PinkNoise,
    bp: SvfTpt,
    sweep: Lfo,
    tremolo: Lfo,
    running: bool,
}

impl Wind {
    pub fn new(sr: f32, seed: u64) -> Self {
        let sr = sr.max(1.0);
        Self {
            sr,
            noise: PinkNoise::new(seed),
            bp: SvfTpt::new(SvfMode::Bandpass, CENTER_HZ, Q, sr),
            sweep: Lfo::sine(SWEEP_RATE_HZ),
            tremolo: Lfo::sine(TREMOLO_RATE_HZ),
            running: false,
        }
    }
}

impl Instrument for Wind {
    fn reset(&mut self, sr: f32) {
        self.sr = sr.max(1.0);
        self.bp.set_sample_rate(self.sr);
    }

    fn trigger(&mut self) {
        if self.running { return; }
        self.sweep.set_phase01(0.0);
        self.tremolo.set_phase01(0.0);
        self.noise.reset();
        self.bp.reset();
        self.running = true;
    }

    fn halt(&mut self) {}

    fn release(&mut self) { self.running = false; }

    fn voices(&self) -> usize { usize::from(self.running) }

    fn scheduled(&self) -> usize { 0 }

    fn next(&mut self) -> f32 {
        if !self.running { return 0.0; }
        let sr = self.sr;
        self.bp.set_cutoff_hz(CENTER_HZ + SWEEP_HZ * self.sweep.next_norm(sr));
        let amp = 1.0 - TREMOLO_DEPTH * self.tremolo.next01(sr);
        self.bp.process(self.noise.next() * NOISE_GAIN) * amp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_bounded_noise_while_running() {
        let mut w = Wind::new(48_000.0, 9);
        w.trigger();
        let mut peak = 0.0f32;
        for _ in 0..96_000 {
            let y = w.next();
            assert!(y.is_finite());
            peak = peak.max(y.abs());
        }
        assert!(peak > 1e-3 && peak < 1.0, "peak={peak}");
        w.release();
        assert_eq!(w.next(), 0.0);
    }
}
