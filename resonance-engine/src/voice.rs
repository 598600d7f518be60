//! Short-lived note voices for the sequenced layers (arp, chime).
//!
//! A [`NotePool`] is a fixed array of [`Note`] slots; spawning never allocates. When
//! every slot is busy the oldest sounding note is stolen.
//!
//! A note may be spawned with a start delay (used for echoes). A delayed note that has
//! not started yet is a *scheduled event*: [`NotePool::cancel_pending`] drops it.

use resonance_core::dsp::secs_to_samples;
use resonance_core::envelopes::AhrExp;
use resonance_core::filters::{SvfMode, SvfTpt};

use crate::nodes::{Osc, Wave};

/// Everything needed to start one note.
#[derive(Copy, Clone, Debug)]
pub struct NoteSpec {
    pub freq: f32,
    pub wave: Wave,
    pub peak: f32,
    /// Attack time constant (s).
    pub atk_s: f32,
    /// Gate length before the release segment starts (s).
    pub hold_s: f32,
    /// Release time constant (s).
    pub rel_s: f32,
    /// Hard stop after this many seconds.
    pub life_s: f32,
    pub highpass_hz: Option<f32>,
}

#[derive(Copy, Clone, Debug)]
pub struct Note {
    osc: Osc,
    env: AhrExp,
    hp: Option<SvfTpt>,
    delay: u64,
    life: u64,
    age: u64,
    alive: bool,
}

impl Note {
    fn silent(sr: f32) -> Self {
        Self {
            osc: Osc::new(0.0, Wave::Sine),
            env: AhrExp::new(0.0, 0.0, 0.0, 0.0, sr),
            hp: None,
            delay: 0,
            life: 0,
            age: 0,
            alive: false,
        }
    }

    fn start(spec: &NoteSpec, delay_s: f32, sr: f32) -> Self {
        let mut env = AhrExp::new(spec.peak, spec.atk_s, spec.hold_s, spec.rel_s, sr);
        env.trigger();
        Self {
            osc: Osc::new(spec.freq, spec.wave),
            env,
            hp: spec.highpass_hz.map(|hz| SvfTpt::new(SvfMode::Highpass, hz, 0.707, sr)),
            delay: secs_to_samples(delay_s, sr),
            life: secs_to_samples(spec.life_s, sr).max(1),
            age: 0,
            alive: true,
        }
    }

    #[inline] fn is_pending(&self) -> bool { self.alive && self.delay > 0 }
    #[inline] fn is_sounding(&self) -> bool { self.alive && self.delay == 0 }

    #[inline]
    fn next(&mut self, sr: f32) -> f32 {
        if !self.alive { return 0.0; }
        if self.delay > 0 {
            self.delay -= 1;
            return 0.0;
        }
        let mut x = self.osc.next(sr);
        if let Some(hp) = self.hp.as_mut() { x = hp.process(x); }
        let y = x * self.env.next();
        self.age += 1;
        if self.age >= self.life { self.alive = false; }
        y
    }
}

/// Fixed-capacity polyphonic note pool.
#[derive(Clone, Debug)]
pub struct NotePool<const N: usize> {
    notes: [Note; N],
    sr: f32,
}

impl<const N: usize> NotePool<N> {
    pub fn new(sr: f32) -> Self {
        let sr = sr.max(1.0);
        Self { notes: [Note::silent(sr); N], sr }
    }

    /// A rate change drops every note; voices are rebuilt at the new rate on demand.
    pub fn set_sr(&mut self, sr: f32) {
        self.sr = sr.max(1.0);
        self.kill_all();
    }

    /// Start `spec` after `delay_s` seconds (0 = now).
    pub fn spawn(&mut self, spec: &NoteSpec, delay_s: f32) {
        let slot = match self.notes.iter().position(|n| !n.alive) {
            Some(i) => i,
            None => self
                .notes
                .iter()
                .enumerate()
                .max_by_key(|(_, n)| n.age)
                .map_or(0, |(i, _)| i),
        };
        self.notes[slot] = Note::start(spec, delay_s, self.sr);
    }

    /// Drop every note that has not started yet; returns how many were dropped.
    pub fn cancel_pending(&mut self) -> usize {
        let mut n = 0;
        for note in self.notes.iter_mut().filter(|n| n.is_pending()) {
            note.alive = false;
            n += 1;
        }
        n
    }

    pub fn kill_all(&mut self) {
        for n in &mut self.notes { n.alive = false; }
    }

    pub fn sounding(&self) -> usize { self.notes.iter().filter(|n| n.is_sounding()).count() }
    pub fn pending(&self) -> usize { self.notes.iter().filter(|n| n.is_pending()).count() }

    #[inline]
    pub fn next(&mut self) -> f32 {
        let sr = self.sr;
        self.notes.iter_mut().map(|n| n.next(sr)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pluck() -> NoteSpec {
        NoteSpec {
            freq: 523.25,
            wave: Wave::Tri,
            peak: 0.18,
            atk_s: 0.05,
            hold_s: 0.3,
            rel_s: 0.15,
            life_s: 1.0,
            highpass_hz: None,
        }
    }

    #[test]
    fn note_ends_at_its_lifetime() {
        let sr = 1000.0;
        let mut pool: NotePool<4> = NotePool::new(sr);
        pool.spawn(&pluck(), 0.0);
        assert_eq!(pool.sounding(), 1);
        for _ in 0..999 { pool.next(); }
        assert_eq!(pool.sounding(), 1);
        pool.next();
        assert_eq!(pool.sounding(), 0);
    }

    #[test]
    fn delayed_note_is_pending_until_it_starts() {
        let sr = 1000.0;
        let mut pool: NotePool<4> = NotePool::new(sr);
        pool.spawn(&pluck(), 0.2);
        assert_eq!((pool.pending(), pool.sounding()), (1, 0));
        for _ in 0..200 { assert_eq!(pool.next(), 0.0); }
        assert_eq!((pool.pending(), pool.sounding()), (0, 1));
    }

    #[test]
    fn cancel_pending_leaves_sounding_notes() {
        let mut pool: NotePool<4> = NotePool::new(1000.0);
        pool.spawn(&pluck(), 0.0);
        pool.spawn(&pluck(), 0.5);
        assert_eq!(pool.cancel_pending(), 1);
        assert_eq!((pool.pending(), pool.sounding()), (0, 1));
    }

    #[test]
    fn full_pool_steals_oldest() {
        let mut pool: NotePool<2> = NotePool::new(1000.0);
        pool.spawn(&pluck(), 0.0);
        for _ in 0..10 { pool.next(); }
        pool.spawn(&pluck(), 0.0);
        pool.spawn(&pluck(), 0.0);
        assert_eq!(pool.sounding(), 2);
    }

    #[test]
    fn output_is_bounded_by_peak() {
        let sr = 48_000.0;
        let mut pool: NotePool<1> = NotePool::new(sr);
        pool.spawn(&pluck(), 0.0);
        let peak = (0..48_000).map(|_| pool.next().abs()).fold(0.0f32, f32::max);
        assert!(peak > 0.1 && peak <= 0.1801, "peak={peak}");
    }
}
