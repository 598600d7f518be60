//! Pad: twelve detuned sines per chord (three per note at -4/0/+4 Hz), cycling through
//! A → F♯m → D → E. Two voice banks alternate so each chord change is a crossfade.

use resonance_core::envelopes::AdsrExp;

use super::Instrument;
use crate::nodes::{Osc, Wave};
use crate::scheduler::Pulse;

pub const PROGRESSION: [[f32; 4]; 4] = [
    [220.0, 277.18, 329.63, 440.0],  // A
    [220.0, 277.18, 369.99, 440.0],  // F#m
    [220.0, 293.66, 369.99, 440.0],  // D
    [246.94, 329.63, 415.30, 493.88], // E
];
const DETUNE_HZ: [f32; 3] = [-4.0, 0.0, 4.0];
const VOICE_GAIN: f32 = 0.08;
/// How long each chord is held (s).
pub const CHORD_S: f32 = 8.0;

#[derive(Clone, Debug)]
struct Bank {
    oscs: [Osc; 12],
    env: AdsrExp,
}

impl Bank {
    fn new(sr: f32) -> Self {
        Self {
            oscs: [Osc::new(0.0, Wave::Sine).with_gain(VOICE_GAIN); 12],
            env: AdsrExp::new(1_000.0, 1_000.0, 1.0, 2_000.0, sr),
        }
    }

    fn tune(&mut self, chord: &[f32; 4]) {
        for (k, osc) in self.oscs.iter_mut().enumerate() {
            osc.set_freq(chord[k / 3] + DETUNE_HZ[k % 3]);
        }
    }

    #[inline]
    fn next(&mut self, sr: f32) -> f32 {
        if !self.env.is_active() { return 0.0; }
        let e = self.env.next();
        e * self.oscs.iter_mut().map(|o| o.next(sr)).sum::<f32>()
    }
}

pub struct Pad {
    sr: f32,
    banks: [Bank; 2],
    current: usize,
    step: usize,
    clock: Pulse,
}

impl Pad {
    pub fn new(sr: f32) -> Self {
        let sr = sr.max(1.0);
        Self { sr, banks: [Bank::new(sr), Bank::new(sr)], current: 0, step: 0, clock: Pulse::idle(sr) }
    }

    /// Index into [`PROGRESSION`] of the sounding chord.
    pub fn chord_index(&self) -> usize { self.step % PROGRESSION.len() }

    fn advance(&mut self) {
        self.step += 1;
        let next = 1 - self.current;
        self.banks[next].tune(&PROGRESSION[self.chord_index()]);
        self.banks[next].env.gate_on();
        self.banks[self.current].env.gate_off();
        self.current = next;
    }
}

impl Instrument for Pad {
    fn reset(&mut self, sr: f32) {
        self.sr = sr.max(1.0);
        for b in &mut self.banks { b.env.set_sr(self.sr); }
        self.clock.set_sr(self.sr);
    }

    fn trigger(&mut self) {
        self.step = 0;
        self.current = 0;
        self.banks[1].env.gate_off();
        self.banks[0].tune(&PROGRESSION[0]);
        self.banks[0].env.gate_on();
        self.clock.every(CHORD_S, false);
    }

    fn halt(&mut self) { self.clock.cancel(); }

    fn release(&mut self) {
        self.clock.cancel();
        for b in &mut self.banks { b.env.kill(); }
    }

    fn voices(&self) -> usize {
        self.banks.iter().filter(|b| b.env.is_active()).map(|b| b.oscs.len()).sum()
    }

    fn scheduled(&self) -> usize { usize::from(self.clock.is_armed()) }

    fn next(&mut self) -> f32 {
        if self.clock.tick() { self.advance(); }
        let sr = self.sr;
        self.banks[0].next(sr) + self.banks[1].next(sr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progression_cycles_and_crossfades() {
        let sr = 1_000.0;
        let mut p = Pad::new(sr);
        p.trigger();
        assert_eq!(p.chord_index(), 0);
        assert_eq!(p.voices(), 12);
        for _ in 0..(CHORD_S * sr) as usize + 1 { p.next(); }
        assert_eq!(p.chord_index(), 1);
        assert_eq!(p.voices(), 24, "both banks sound during the crossfade");
        for _ in 0..(3.0 * CHORD_S * sr) as usize { p.next(); }
        assert_eq!(p.chord_index(), 0);
    }

    #[test]
    fn halt_stops_chord_changes() {
        let sr = 1_000.0;
        let mut p = Pad::new(sr);
        p.trigger();
        assert_eq!(p.scheduled(), 1);
        p.halt();
        assert_eq!(p.scheduled(), 0);
        for _ in 0..(2.0 * CHORD_S * sr) as usize { p.next(); }
        assert_eq!(p.chord_index(), 0);
        p.release();
        assert_eq!(p.voices(), 0);
    }
}
