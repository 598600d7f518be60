//! Sample-clock event scheduling.
//!
//! Layers never use wall-clock timers. Every repeating trigger or delayed action is a
//! countdown in samples, ticked from the audio callback, so events land with sample
//! precision and disappear the moment they are cancelled.
//!
//! - [`Pulse`]      : one-shot or periodic trigger
//! - [`Generation`] : monotonically increasing token source
//! - [`Deferred`]   : a one-shot pulse tagged with the generation that scheduled it

use resonance_core::dsp::secs_to_samples;

/// One-shot or periodic sample-countdown trigger.
#[derive(Copy, Clone, Debug)]
pub struct Pulse {
    sr: f32,
    period_s: f32,
    countdown: u64,
    repeat: bool,
    armed: bool,
}

impl Pulse {
    pub fn idle(sr: f32) -> Self {
        Self { sr: sr.max(1.0), period_s: 0.0, countdown: 0, repeat: false, armed: false }
    }

    /// Fire every `period_s`. With `fire_now` the first event lands on the next tick.
    pub fn every(&mut self, period_s: f32, fire_now: bool) {
        self.period_s = period_s.max(0.0);
        self.repeat = true;
        self.armed = true;
        self.countdown = if fire_now { 0 } else { self.period_samples() };
    }

    /// Fire once after `delay_s`.
    pub fn once(&mut self, delay_s: f32) {
        self.period_s = delay_s.max(0.0);
        self.repeat = false;
        self.armed = true;
        self.countdown = secs_to_samples(delay_s, self.sr);
    }

    #[inline] pub fn cancel(&mut self) { self.armed = false; }
    #[inline] pub fn is_armed(&self) -> bool { self.armed }

    /// Samples until the next event (0 = fires on the next tick).
    #[inline] pub fn remaining(&self) -> u64 { self.countdown }

    /// Keep the remaining wait the same length in seconds at the new rate.
    pub fn set_sr(&mut self, sr: f32) {
        let sr = sr.max(1.0);
        if sr == self.sr { return; }
        let secs = self.countdown as f64 / f64::from(self.sr);
        self.countdown = (secs * f64::from(sr)).round() as u64;
        self.sr = sr;
    }

    /// Advance one sample; true on the sample the event fires.
    #[inline]
    pub fn tick(&mut self) -> bool {
        if !self.armed { return false; }
        if self.countdown > 0 {
            self.countdown -= 1;
            return false;
        }
        if self.repeat {
            self.countdown = self.period_samples().saturating_sub(1);
        } else {
            self.armed = false;
        }
        true
    }

    #[inline]
    fn period_samples(&self) -> u64 { secs_to_samples(self.period_s, self.sr).max(1) }
}

/// Token source for invalidating work scheduled by an earlier lifecycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Generation(u64);

impl Generation {
    /// Start a new generation; every earlier token becomes stale.
    #[inline]
    pub fn bump(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }

    #[inline] pub fn current(&self) -> u64 { self.0 }
    #[inline] pub fn is_current(&self, token: u64) -> bool { self.0 == token }
}

/// A delayed action carrying the generation token it was scheduled under.
#[derive(Copy, Clone, Debug)]
pub struct Deferred {
    timer: Pulse,
    token: u64,
}

impl Deferred {
    pub fn new(sr: f32) -> Self { Self { timer: Pulse::idle(sr), token: 0 } }

    pub fn schedule(&mut self, delay_s: f32, token: u64) {
        self.token = token;
        self.timer.once(delay_s);
    }

    #[inline] pub fn cancel(&mut self) { self.timer.cancel(); }
    #[inline] pub fn is_pending(&self) -> bool { self.timer.is_armed() }
    #[inline] pub fn set_sr(&mut self, sr: f32) { self.timer.set_sr(sr); }

    /// Advance one sample; yields the token on the sample the action is due.
    #[inline]
    pub fn tick(&mut self) -> Option<u64> {
        if self.timer.tick() { Some(self.token) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_pulse_fires_on_schedule() {
        let mut p = Pulse::idle(1000.0);
        p.every(0.01, true); // 10 samples
        let hits: Vec<usize> = (0..35).filter(|_| p.tick()).collect();
        assert_eq!(hits, vec![0, 10, 20, 30]);
    }

    #[test]
    fn one_shot_fires_once_then_disarms() {
        let mut p = Pulse::idle(1000.0);
        p.once(0.005);
        let hits: Vec<usize> = (0..20).filter(|_| p.tick()).collect();
        assert_eq!(hits, vec![5]);
        assert!(!p.is_armed());
    }

    #[test]
    fn cancel_silences_future_events() {
        let mut p = Pulse::idle(1000.0);
        p.every(0.002, false);
        p.tick();
        p.cancel();
        assert!((0..100).all(|_| !p.tick()));
    }

    #[test]
    fn rate_change_keeps_wall_time() {
        let mut p = Pulse::idle(1000.0);
        p.once(0.1);
        p.set_sr(2000.0);
        assert_eq!(p.remaining(), 200);
    }

    #[test]
    fn stale_tokens_are_detectable() {
        let mut g = Generation::default();
        let t1 = g.bump();
        let mut d = Deferred::new(100.0);
        d.schedule(0.02, t1);
        let t2 = g.bump();
        assert_ne!(t1, t2);
        let fired = (0..10).find_map(|_| d.tick());
        assert_eq!(fired, Some(t1));
        assert!(!g.is_current(t1));
        assert!(!d.is_pending());
    }
}
