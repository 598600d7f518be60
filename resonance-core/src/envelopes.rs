//! Envelope generators and parameter ramps.
//!
//! Provided envelopes:
//! - `TargetRamp` : exponential approach to a target with a per-call time constant
//!                  (the `setTargetAtTime` primitive every layer gain is built on)
//! - `AdsrExp`    : ADSR with exponential (RC-like) segments, used for sustained chord voices
//! - `AhrExp`     : attack / hold / release note envelope for plucked and struck notes
//!
//! All envelopes are `no_std` friendly and avoid heap allocations.
//! Each exposes a per-sample `next()` tick; time constants are in **seconds** unless the
//! parameter name ends in `_ms`.

use core::fmt::Debug;
use crate::dsp::{clamp, finite_or, one_pole_coeff_ms, tau_coeff, SILENCE};

// -------------------------------- Target ramp ------------------------------------

/// Exponential ramp towards a target value.
///
/// `set_target(v, tau)` starts a new approach from wherever the ramp currently is, so
/// calling it mid-fade never produces a jump (no clicks on rapid toggles).
#[derive(Copy, Clone, Debug)]
pub struct TargetRamp {
    value:  f32,
    target: f32,
    tau_s:  f32,
    sr:     f32,
    a:      f32,
}

impl TargetRamp {
    #[inline]
    pub fn new(initial: f32, sr: f32) -> Self {
        let v = finite_or(initial, 0.0);
        Self { value: v, target: v, tau_s: 0.0, sr: sr.max(1.0), a: 0.0 }
    }

    #[inline]
    pub fn set_sr(&mut self, sr: f32) {
        self.sr = sr.max(1.0);
        self.a = tau_coeff(self.tau_s, self.sr);
    }

    /// Approach `target` with time constant `tau_s` (seconds). Non-finite input is ignored.
    #[inline]
    pub fn set_target(&mut self, target: f32, tau_s: f32) {
        if !target.is_finite() { return; }
        self.target = target;
        self.tau_s = finite_or(tau_s, 0.0).max(0.0);
        self.a = tau_coeff(self.tau_s, self.sr);
    }

    /// Hard-set both value and target (no ramp).
    #[inline]
    pub fn jump(&mut self, v: f32) {
        let v = finite_or(v, 0.0);
        self.value = v;
        self.target = v;
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        self.value = self.target + (self.value - self.target) * self.a;
        if (self.value - self.target).abs() < SILENCE * 1e-2 {
            self.value = self.target;
        }
        self.value
    }

    #[inline] pub fn value(&self) -> f32 { self.value }
    #[inline] pub fn target(&self) -> f32 { self.target }
}

// ------------------------------- Exponential ADSR --------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Stage {
    Idle,
    Attack,
    Decay,
    Release,
}

/// Exponential (RC-like) ADSR envelope.
/// Attack/Decay/Release are **time constants in ms** controlling the curvature.
/// Sustain is [0,1].
#[derive(Copy, Clone, Debug)]
pub struct AdsrExp {
    atk_ms: f32,
    dec_ms: f32,
    sus:    f32,
    rel_ms: f32,
    sr:     f32,

    env:   f32,
    stage: Stage,
    // per-stage coefficients a = exp(-1/(tau*sr))
    a_a: f32,
    a_d: f32,
    a_r: f32,
}

impl AdsrExp {
    #[inline]
    pub fn new(atk_ms: f32, dec_ms: f32, sus: f32, rel_ms: f32, sr: f32) -> Self {
        let mut s = Self {
            atk_ms: atk_ms.max(0.0),
            dec_ms: dec_ms.max(0.0),
            sus: clamp(sus, 0.0, 1.0),
            rel_ms: rel_ms.max(0.0),
            sr: sr.max(1.0),
            env: 0.0,
            stage: Stage::Idle,
            a_a: 0.0,
            a_d: 0.0,
            a_r: 0.0,
        };
        s.recalc_coeffs();
        s
    }

    #[inline]
    pub fn set_sr(&mut self, sr: f32) { self.sr = sr.max(1.0); self.recalc_coeffs(); }

    #[inline]
    fn recalc_coeffs(&mut self) {
        let sr = self.sr;
        self.a_a = one_pole_coeff_ms(self.atk_ms, sr);
        self.a_d = one_pole_coeff_ms(self.dec_ms, sr);
        self.a_r = one_pole_coeff_ms(self.rel_ms, sr);
    }

    /// Start (or re-start) the attack from the current level.
    #[inline] pub fn gate_on(&mut self)  { self.stage = Stage::Attack; }

    #[inline]
    pub fn gate_off(&mut self) {
        if self.stage != Stage::Idle { self.stage = Stage::Release; }
    }

    /// Drop to silence immediately.
    #[inline]
    pub fn kill(&mut self) { self.env = 0.0; self.stage = Stage::Idle; }

    /// Advance by one sample and return the envelope value.
    ///
    /// The attack aims slightly above 1 so it reaches the peak in finite time, then the
    /// decay settles on the sustain level for as long as the gate is held.
    #[inline]
    pub fn next(&mut self) -> f32 {
        match self.stage {
            Stage::Idle => self.env = 0.0,
            Stage::Attack => {
                self.env += (1.05 - self.env) * (1.0 - self.a_a);
                if self.env >= 1.0 {
                    self.env = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                self.env += (self.sus - self.env) * (1.0 - self.a_d);
            }
            Stage::Release => {
                self.env += (0.0 - self.env) * (1.0 - self.a_r);
                if self.env < SILENCE {
                    self.env = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }
        self.env
    }

    #[inline] pub fn value(&self) -> f32 { self.env }

    /// True while the envelope contributes any signal.
    #[inline] pub fn is_active(&self) -> bool { self.stage != Stage::Idle }
}

// --------------------------- Attack / hold / release -----------------------------

/// Note envelope: approach `peak` with time constant `atk_s`, hold the gate for `hold_s`,
/// then approach zero with time constant `rel_s`.
///
/// `trigger()` always restarts from silence, so a retriggered note never inherits a tail.
#[derive(Copy, Clone, Debug)]
pub struct AhrExp {
    peak:   f32,
    atk_s:  f32,
    hold_s: f32,
    rel_s:  f32,
    sr:     f32,

    env:  f32,
    age:  u64,
    hold: u64,
    a_a:  f32,
    a_r:  f32,
}

impl AhrExp {
    #[inline]
    pub fn new(peak: f32, atk_s: f32, hold_s: f32, rel_s: f32, sr: f32) -> Self {
        let mut s = Self {
            peak: finite_or(peak, 0.0).max(0.0),
            atk_s: atk_s.max(0.0),
            hold_s: hold_s.max(0.0),
            rel_s: rel_s.max(0.0),
            sr: sr.max(1.0),
            env: 0.0,
            age: u64::MAX,
            hold: 0,
            a_a: 0.0,
            a_r: 0.0,
        };
        s.recalc();
        s
    }

    #[inline]
    pub fn set_sr(&mut self, sr: f32) { self.sr = sr.max(1.0); self.recalc(); }

    #[inline]
    fn recalc(&mut self) {
        self.a_a = tau_coeff(self.atk_s, self.sr);
        self.a_r = tau_coeff(self.rel_s, self.sr);
        self.hold = crate::dsp::secs_to_samples(self.hold_s, self.sr);
    }

    #[inline] pub fn trigger(&mut self) { self.env = 0.0; self.age = 0; }

    #[inline]
    pub fn next(&mut self) -> f32 {
        let (target, a) = if self.age < self.hold { (self.peak, self.a_a) } else { (0.0, self.a_r) };
        self.env = target + (self.env - target) * a;
        self.age = self.age.saturating_add(1);
        self.env
    }

    #[inline] pub fn value(&self) -> f32 { self.env }

    /// Past the hold point and decayed below audibility.
    #[inline]
    pub fn is_done(&self) -> bool { self.age >= self.hold && self.env < SILENCE }
}

// ------------------------------------ Tests --------------------------------------
