//! Master dynamics: a soft-knee compressor followed by a peak limiter.
//!
//! Compressor
//! - Stereo-linked peak detector, gain computed in dB with a quadratic soft knee.
//! - Gain reduction is smoothed with separate attack/release time constants.
//!
//! Limiter
//! - Instant attack, exponential release; output never exceeds the ceiling.

use resonance_core::dsp::{db_to_lin, finite_or, lin_to_db, one_pole_coeff_ms};

use crate::config::CompressorParams;

/// Static curve: output level (dB) for input level `x_db`.
#[inline]
pub fn compress_db(x_db: f32, threshold_db: f32, knee_db: f32, ratio: f32) -> f32 {
    let over = x_db - threshold_db;
    let slope = 1.0 / ratio.max(1.0) - 1.0;
    if knee_db > 0.0 && 2.0 * over.abs() <= knee_db {
        let k = over + 0.5 * knee_db;
        x_db + slope * k * k / (2.0 * knee_db)
    } else if over > 0.0 {
        x_db + slope * over
    } else {
        x_db
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Compressor {
    params: CompressorParams,
    a_att: f32,
    a_rel: f32,
    gr_db: f32,
    makeup: f32,
}

impl Compressor {
    pub fn new(params: CompressorParams, sr: f32) -> Self {
        let mut s = Self { params, a_att: 0.0, a_rel: 0.0, gr_db: 0.0, makeup: db_to_lin(params.makeup_db) };
        s.set_sr(sr);
        s
    }

    pub fn set_sr(&mut self, sr: f32) {
        self.a_att = one_pole_coeff_ms(self.params.attack_ms, sr);
        self.a_rel = one_pole_coeff_ms(self.params.release_ms, sr);
    }

    #[inline] pub fn reset(&mut self) { self.gr_db = 0.0; }

    /// Current gain reduction in dB (≤ 0).
    #[inline] pub fn reduction_db(&self) -> f32 { self.gr_db }

    #[inline]
    pub fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
        let p = &self.params;
        let x_db = lin_to_db(l.abs().max(r.abs()));
        let target = compress_db(x_db, p.threshold_db, p.knee_db, p.ratio) - x_db;
        let a = if target < self.gr_db { self.a_att } else { self.a_rel };
        self.gr_db = target + (self.gr_db - target) * a;
        let g = db_to_lin(self.gr_db) * self.makeup;
        (l * g, r * g)
    }
}

/// Brick-wall peak limiter.
#[derive(Copy, Clone, Debug)]
pub struct Limiter {
    ceiling: f32,
    release_ms: f32,
    a_rel: f32,
    env: f32,
}

impl Limiter {
    pub fn new(ceiling: f32, release_ms: f32, sr: f32) -> Self {
        Self {
            ceiling: finite_or(ceiling, 1.0).clamp(1e-3, 1.0),
            release_ms,
            a_rel: one_pole_coeff_ms(release_ms, sr),
            env: 0.0,
        }
    }

    pub fn set_sr(&mut self, sr: f32) { self.a_rel = one_pole_coeff_ms(self.release_ms, sr); }
    #[inline] pub fn reset(&mut self) { self.env = 0.0; }

    /// Non-finite input is replaced by silence before it can reach the output.
    #[inline]
    pub fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
        let (l, r) = (finite_or(l, 0.0), finite_or(r, 0.0));
        let peak = l.abs().max(r.abs());
        self.env = if peak > self.env { peak } else { peak + (self.env - peak) * self.a_rel };
        let g = if self.env > self.ceiling { self.ceiling / self.env } else { 1.0 };
        (l * g, r * g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_curve_regions() {
        // below the knee: unity
        assert_eq!(compress_db(-40.0, -24.0, 12.0, 4.0), -40.0);
        // well above: threshold + over / ratio
        let y = compress_db(0.0, -24.0, 12.0, 4.0);
        assert!((y - (-18.0)).abs() < 1e-4, "y={y}");
        // knee is continuous at both edges
        let lo = compress_db(-30.0, -24.0, 12.0, 4.0);
        let hi = compress_db(-18.0, -24.0, 12.0, 4.0);
        assert!((lo - -30.0).abs() < 1e-4);
        assert!((hi - (-24.0 + 6.0 / 4.0)).abs() < 1e-4);
    }

    #[test]
    fn compressor_reduces_loud_signal() {
        let sr = 48_000.0;
        let mut c = Compressor::new(CompressorParams::default(), sr);
        let mut y = 0.0;
        for _ in 0..(sr as usize / 2) {
            y = c.process(1.0, 1.0).0;
        }
        // 0 dBFS in, about -18 dB out once settled
        assert!((lin_to_db(y) - -18.0).abs() < 0.5, "y={y}");
        assert!(c.reduction_db() < -5.0);
    }

    #[test]
    fn compressor_leaves_quiet_signal_alone() {
        let mut c = Compressor::new(CompressorParams::default(), 48_000.0);
        for _ in 0..1000 {
            let (l, _) = c.process(0.01, -0.01);
            assert!((l - 0.01).abs() < 1e-6);
        }
    }

    #[test]
    fn limiter_holds_the_ceiling() {
        let mut lim = Limiter::new(0.9, 50.0, 48_000.0);
        for n in 0..10_000 {
            let x = 3.0 * (n as f32 * 0.05).sin();
            let (l, r) = lim.process(x, -x);
            assert!(l.abs() <= 0.9 + 1e-6 && r.abs() <= 0.9 + 1e-6);
        }
        assert_eq!(lim.process(f32::NAN, f32::INFINITY), (0.0, 0.0));
    }
}
