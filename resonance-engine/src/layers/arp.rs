//! Arp: a fixed six-note triangle figure stepped every 0.6 s, short plucked envelope.

use super::Instrument;
use crate::nodes::Wave;
use crate::scheduler::Pulse;
use crate::voice::{NotePool, NoteSpec};

pub const NOTES: [f32; 6] = [523.25, 659.25, 783.99, 880.0, 783.99, 659.25];
pub const STEP_S: f32 = 0.6;

const PLUCK: NoteSpec = NoteSpec {
    freq: 0.0,
    wave: Wave::Tri,
    peak: 0.18,
    atk_s: 0.05,
    hold_s: 0.3,
    rel_s: 0.15,
    life_s: 1.0,
    highpass_hz: None,
};

pub struct Arp {
    pool: NotePool<4>,
    clock: Pulse,
    step: usize,
}

impl Arp {
    pub fn new(sr: f32) -> Self {
        Self { pool: NotePool::new(sr), clock: Pulse::idle(sr), step: 0 }
    }

    /// Notes played since the last trigger.
    pub fn steps(&self) -> usize { self.step }
}

impl Instrument for Arp {
    fn reset(&mut self, sr: f32) {
        self.pool.set_sr(sr);
        self.clock.set_sr(sr);
    }

    fn trigger(&mut self) {
        self.step = 0;
        self.clock.every(STEP_S, true);
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
        if self.clock.tick() {
            let freq = NOTES[self.step % NOTES.len()];
            self.pool.spawn(&NoteSpec { freq, ..PLUCK }, 0.0);
            self.step += 1;
        }
        self.pool.next()
    }
}
