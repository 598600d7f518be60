//! Chime: sparse high sines through an 800 Hz high-pass. The trigger interval is drawn
//! once per start (1.2–2.0 s); each strike picks a random pitch and sometimes adds a
//! quieter octave-up echo a moment later.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Instrument;
use crate::nodes::Wave;
use crate::scheduler::Pulse;
use crate::voice::{NotePool, NoteSpec};

pub const NOTES: [f32; 4] = [1046.5, 1318.5, 1568.0, 1760.0];
const INTERVAL_S: (f32, f32) = (1.2, 2.0);
const ECHO_CHANCE: f32 = 0.25;
const ECHO_DELAY_S: (f32, f32) = (0.15, 0.3);
const ECHO_GAIN: f32 = 0.5;

const STRIKE: NoteSpec = NoteSpec {
    freq: 0.0,
    wave: Wave::Sine,
    peak: 0.12,
    atk_s: 0.02,
    hold_s: 0.1,
    rel_s: 0.6,
    life_s: 2.5,
    highpass_hz: Some(800.0),
};

pub struct Chime {
    pool: NotePool<8>,
    clock: Pulse,
    rng: StdRng,
    interval_s: f32,
    strikes: usize,
}

impl Chime {
    pub fn new(sr: f32, seed: u64) -> Self {
        Self {
            pool: NotePool::new(sr),
            clock: Pulse::idle(sr),
            rng: StdRng::seed_from_u64(seed),
            interval_s: INTERVAL_S.0,
            strikes: 0,
        }
    }

    /// Interval chosen at the last trigger (s).
    pub fn interval_s(&self) -> f32 { self.interval_s }
    pub fn strikes(&self) -> usize { self.strikes }

    fn strike(&mut self) {
        let freq = NOTES[self.rng.gen_range(0..NOTES.len())];
        self.pool.spawn(&NoteSpec { freq, ..STRIKE }, 0.0);
        if self.rng.gen::<f32>() < ECHO_CHANCE {
            let delay = self.rng.gen_range(ECHO_DELAY_S.0..ECHO_DELAY_S.1);
            let echo = NoteSpec { freq: freq * 2.0, peak: STRIKE.peak * ECHO_GAIN, ..STRIKE };
            self.pool.spawn(&echo, delay);
        }
        self.strikes += 1;
    }
}

impl Instrument for Chime {
    fn reset(&mut self, sr: f32) {
        self.pool.set_sr(sr);
        self.clock.set_sr(sr);
    }

    fn trigger(&mut self) {
        self.interval_s = self.rng.gen_range(INTERVAL_S.0..INTERVAL_S.1);
        self.strikes = 0;
        self.clock.every(self.interval_s, true);
    }

    fn halt(&mut self) {
        self.clock.cancel();
        self.pool.cancel_pending();
    }

    fn release(&mut self) {
        self.clock.cancel();
        self.pool.kill_all();
    }

    fn voices(&self) -> usize { self.pool.sounding() + self.pool.pending() }

    fn scheduled(&self) -> usize { usize::from(self.clock.is_armed()) + self.pool.pending() }

    fn next(&mut self) -> f32 {
        if self.clock.tick() { self.strike(); }
        self.pool.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_drawn_in_range() {
        let mut c = Chime::new(1_000.0, 5);
        for _ in 0..20 {
            c.trigger();
            assert!((1.2..2.0).contains(&c.interval_s()));
        }
    }

    #[test]
    fn strikes_follow_the_interval() {
        let sr = 1_000.0;
        let mut c = Chime::new(sr, 5);
        c.trigger();
        let n = (10.0 * sr) as usize;
        for _ in 0..n { c.next(); }
        let expected = (10.0 / c.interval_s()).floor() as usize + 1;
        assert!(c.strikes() == expected || c.strikes() == expected - 1, "strikes={}", c.strikes());
    }

    #[test]
    fn halt_drops_pending_echoes() {
        let sr = 1_000.0;
        let mut c = Chime::new(sr, 5);
        c.trigger();
        // run until some strike leaves an echo pending
        let mut saw_pending = false;
        for _ in 0..200_000 {
            c.next();
            if c.pool.pending() > 0 { saw_pending = true; break; }
        }
        assert!(saw_pending);
        c.halt();
        assert_eq!(c.scheduled(), 0);
    }
}
