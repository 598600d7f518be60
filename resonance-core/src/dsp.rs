//! Generic DSP utilities and math helpers.
//!
//! Design goals:
//! - `no_std` ready (guarded by the crate feature `no-std`)
//! - Math backend selection that works in both `std` and `no_std` contexts
//! - Optional `fast-math` approximations for hot paths
//! - Clean, side-effect free helpers that are easy to test
//!
//! Conventions:
//! - Times are either **milliseconds** (`_ms`) or **seconds** (`_s`); the suffix says which.
//! - A "time constant" `tau` follows the Web-audio `setTargetAtTime` meaning: after `tau`
//!   seconds an exponential approach has covered ~63% (1 - 1/e) of the distance.

#![allow(clippy::excessive_precision)]

use core::f32::consts::PI;

use cfg_if::cfg_if;

// ----------------------------- Math backend selection -----------------------------

cfg_if! {
    // micromath preferred if explicitly requested (works in no_std)
    if #[cfg(feature = "micromath")] {
        use micromath::F32Ext as _;
        #[inline] fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] fn m_exp(x: f32) -> f32 { x.exp() }
        #[inline] fn m_tan(x: f32) -> f32 { (x.sin()) / (x.cos()) }
    // libm (C math) in no_std
    } else if #[cfg(feature = "no-std")] {
        #[inline] fn m_sin(x: f32) -> f32 { libm::sinf(x) }
        #[inline] fn m_exp(x: f32) -> f32 { libm::expf(x) }
        #[inline] fn m_tan(x: f32) -> f32 { libm::tanf(x) }
    // std backend
    } else {
        #[inline] fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] fn m_exp(x: f32) -> f32 { x.exp() }
        #[inline] fn m_tan(x: f32) -> f32 { x.tan() }
    }
}

// --------------------------------- Constants -------------------------------------

/// 2π (commonly useful)
pub const TAU: f32 = 2.0 * PI;

/// A very small epsilon used in denormal handling and safe divisions.
pub const EPS_SMALL: f32 = 1.0e-20;

/// Anything quieter than this is treated as silence by gain ramps and voice reapers (~ -100 dB).
pub const SILENCE: f32 = 1.0e-5;

// --------------------------------- Utilities -------------------------------------

#[inline]
pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    if x < lo { lo } else if x > hi { hi } else { x }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Return `x` if it is finite, otherwise `fallback`. Keeps NaN/inf out of the graph.
#[inline]
pub fn finite_or(x: f32, fallback: f32) -> f32 {
    if x.is_finite() { x } else { fallback }
}

/// Kill denormal/subnormal values. Returns 0.0 if |x| < EPS_SMALL.
#[inline]
pub fn kill_denormals(x: f32) -> f32 {
    if x.abs() < EPS_SMALL { 0.0 } else { x }
}

/// Seconds → whole samples at `sr` (never negative).
#[inline]
pub fn secs_to_samples(secs: f32, sr: f32) -> u64 {
    let n = finite_or(secs, 0.0).max(0.0) * sr.max(1.0);
    n.round() as u64
}

/// Pitch offset in cents → frequency ratio (1200 cents = 2x).
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    m_exp(core::f32::consts::LN_2 * (cents / 1200.0))
}

// --------------------------------- dB / linear -----------------------------------

/// Convert dB to linear gain: lin = 10^(db/20).
#[inline]
pub fn db_to_lin(db: f32) -> f32 {
    if db <= -120.0 { 0.0 } else { m_exp(0.11512925464970229_f32 * db) } // ln(10)/20 ≈ 0.115129...
}

/// Convert linear gain to dB: db = 20*log10(lin).
#[inline]
pub fn lin_to_db(lin: f32) -> f32 {
    if lin <= EPS_SMALL { -120.0 }
    else { 8.685889638065036553_f32 * lin.ln() } // 20/ln(10)
}

// --------------------------------- Fast trig -------------------------------------

/// Fast sine with range reduction into [-π, π] and 5th-order minimax-style poly.
/// Max abs error ~1e-3 for musical uses when `fast-math` is enabled; falls back to exact otherwise.
#[inline]
pub fn fast_sin(x: f32) -> f32 {
    cfg_if! {
        if #[cfg(feature = "fast-math")] {
            let mut xr = x;
            let k = (xr / TAU).round();
            xr -= k * TAU;

            // 5th-order odd polynomial: sin(x) ≈ x * (a + b x^2 + c x^4)
            let x2 = xr * xr;
            xr * (0.999_979_313_3 + x2 * (-0.166_624_432_0 + x2 * 0.008_308_978_98))
        } else {
            m_sin(x)
        }
    }
}

// --------------------------------- Exponentials / smoothing ----------------------

/// One-pole smoothing coefficient for a time constant `t_ms` (milliseconds).
///
/// Discrete form: `y += (x - y) * (1 - a)` with `a = exp(-1/(tau * sr))`.
/// A non-positive time constant yields `a = 0` (jump straight to the target).
#[inline]
pub fn one_pole_coeff_ms(t_ms: f32, sr: f32) -> f32 {
    if !(t_ms > 0.0) { return 0.0; }
    let tau = t_ms * 0.001;
    m_exp(-1.0 / (tau * sr.max(1.0)))
}

/// Same as [`one_pole_coeff_ms`] for a time constant in seconds.
#[inline]
pub fn tau_coeff(tau_s: f32, sr: f32) -> f32 {
    one_pole_coeff_ms(tau_s * 1000.0, sr)
}

/// Convert cutoff in Hz to a simple one-pole (non-TPT) coefficient `exp(-2π fc / sr)`.
#[inline]
pub fn one_pole_coeff_hz(cut_hz: f32, sr: f32) -> f32 {
    let fc = cut_hz.max(0.0).min(0.499 * sr);
    m_exp(-2.0 * PI * fc / sr)
}

/// TPT (Topology-Preserving Transform) `g = tan(π fc / sr)` helper for state-variable filters.
///
/// The cutoff is kept strictly below Nyquist so a modulated filter never blows up.
#[inline]
pub fn tpt_g(cut_hz: f32, sr: f32) -> f32 {
    let fc = clamp(finite_or(cut_hz, 1000.0), 1.0, 0.49 * sr);
    let x = PI * (fc / sr);
    cfg_if! {
        if #[cfg(feature = "fast-math")] {
            let s = fast_sin(x);
            let c = fast_sin(x + 0.5 * PI);
            s / c
        } else {
            m_tan(x)
        }
    }
}

// --------------------------------- Simple meters ---------------------------------

/// Running RMS meter (windowed via exponential smoothing). Call once per sample.
///
/// `alpha` is the smoothing factor in [0,1]; a good choice is `1 - one_pole_coeff_ms(300, sr)`.
#[derive(Copy, Clone, Debug)]
pub struct Rms {
    pub alpha: f32,
    state: f32,
}
impl Rms {
    #[inline]
    pub fn new(alpha: f32) -> Self { Self { alpha, state: 0.0 } }

    #[inline]
    pub fn reset(&mut self) { self.state = 0.0; }

    #[inline]
    pub fn tick(&mut self, x: f32) -> f32 {
        let x2 = x * x;
        self.state += self.alpha * (x2 - self.state);
        self.state.sqrt()
    }

    #[inline] pub fn value(&self) -> f32 { self.state.sqrt() }
}

// --------------------------------- Tests (std only) ------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_lin_roundtrip() {
        for db in [-60.0, -20.0, -6.0, 0.0, 6.0, 12.0, 24.0] {
            let lin = db_to_lin(db);
            let back = lin_to_db(lin);
            assert!((db - back).abs() < 0.1, "db={}, back={}", db, back);
        }
    }

    #[test]
    fn clamp_respects_both_bounds() {
        assert_eq!(clamp(2.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-2.0, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.25, -1.0, 1.0), 0.25);
    }

    #[test]
    fn tau_coeff_matches_set_target_semantics() {
        // After exactly tau seconds an exponential approach covers 1 - 1/e of the distance.
        let sr = 48_000.0;
        let a = tau_coeff(0.5, sr);
        let mut y = 0.0_f32;
        for _ in 0..(sr as usize / 2) {
            y += (1.0 - y) * (1.0 - a);
        }
        assert!((y - (1.0 - (-1.0f32).exp())).abs() < 1e-3, "y={y}");
        assert_eq!(tau_coeff(0.0, sr), 0.0);
    }

    #[test]
    fn secs_to_samples_guards_bad_input() {
        assert_eq!(secs_to_samples(1.0, 48_000.0), 48_000);
        assert_eq!(secs_to_samples(-1.0, 48_000.0), 0);
        assert_eq!(secs_to_samples(f32::NAN, 48_000.0), 0);
    }

    #[test]
    fn cents_octave_is_double() {
        assert!((cents_to_ratio(1200.0) - 2.0).abs() < 1e-4);
        assert!((cents_to_ratio(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rms_decreases_to_zero() {
        let mut rms = Rms::new(1.0 - one_pole_coeff_ms(10.0, 48000.0));
        let mut v = 0.0;
        for _ in 0..10000 {
            v = rms.tick(0.0);
        }
        assert!(v < 1e-3);
    }
}
