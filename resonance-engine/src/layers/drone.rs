//! Drone: a saw and two sines on A1/E2/A2, each through its own 300 Hz low-pass,
//! with a very slow random detune drift.

use resonance_core::dsp::cents_to_ratio;
use resonance_core::filters::{SvfMode, SvfTpt};

use super::Instrument;
use crate::nodes::{NoiseMod, Osc, Wave};

const FREQS: [f32; 3] = [55.0, 82.41, 110.0];
const GAINS: [f32; 3] = [0.15, 0.25, 0.25];
const CUTOFF_HZ: f32 = 300.0;
/// ≈ 1 dB of resonance.
const Q: f32 = 0.79;
const DRIFT_CENTS: f32 = 3.0;

#[derive(Copy, Clone, Debug)]
struct Voice {
    osc: Osc,
    lp: SvfTpt,
    base: f32,
}

pub struct Drone {
    sr: f32,
    voices: [Voice; 3],
    drift: NoiseMod,
    running: bool,
}

impl Drone {
    pub fn new(sr: f32, seed: u64) -> Self {
        let sr = sr.max(1.0);
        let voice = |i: usize| {
            let wave = if i == 0 { Wave::Saw } else { Wave::Sine };
            Voice {
                osc: Osc::new(FREQS[i], wave).with_gain(GAINS[i]),
                lp: SvfTpt::new(SvfMode::Lowpass, CUTOFF_HZ, Q, sr),
                base: FREQS[i],
            }
        };
        Self {
            sr,
            voices: [voice(0), voice(1), voice(2)],
            drift: NoiseMod::new(-DRIFT_CENTS, DRIFT_CENTS, 9.0, 0.2, sr, seed),
            running: false,
        }
    }
}

impl Instrument for Drone {
    fn reset(&mut self, sr: f32) {
        self.sr = sr.max(1.0);
        for v in &mut self.voices { v.lp.set_sample_rate(self.sr); }
        self.drift.reset_sr(self.sr);
    }

    fn trigger(&mut self) {
        if self.running { return; }
        for v in &mut self.voices {
            v.osc.set_phase01(0.0);
            v.lp.reset();
        }
        self.running = true;
    }

    fn halt(&mut self) {}

    fn release(&mut self) { self.running = false; }

    fn voices(&self) -> usize { if self.running { self.voices.len() } else { 0 } }

    fn scheduled(&self) -> usize { 0 }

    fn next(&mut self) -> f32 {
        if !self.running { return 0.0; }
        let sr = self.sr;
        let cents = self.drift.next(sr);
        let mut sum = 0.0;
        for (i, v) in self.voices.iter_mut().enumerate() {
            // alternate the drift direction so the voices beat against each other
            let c = if i % 2 == 0 { cents } else { -cents };
            v.osc.set_freq(v.base * cents_to_ratio(c));
            sum += v.lp.process(v.osc.next(sr));
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_until_triggered_and_after_release() {
        let mut d = Drone::new(48_000.0, 1);
        assert_eq!(d.next(), 0.0);
        d.trigger();
        let peak = (0..48_000).map(|_| d.next().abs()).fold(0.0f32, f32::max);
        assert!(peak > 0.1 && peak < 1.0, "peak={peak}");
        d.release();
        assert_eq!(d.voices(), 0);
        assert_eq!(d.next(), 0.0);
    }
}
