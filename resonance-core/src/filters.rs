//! Filters: lightweight one-poles and a TPT (state-variable) filter.
//!
//! Contents
//! - `OnePoleLP`  : “RC-style” one-pole low-pass (slewing, damping inside feedback loops)
//! - `OnePoleHP`  : “RC-style” one-pole high-pass
//! - `DcBlock`    : convenience wrapper specialized for DC removal on the master bus
//! - `SvfMode`    : LP/HP/BP/Notch modes for the SVF
//! - `SvfTpt`     : State-Variable Filter via Topology Preserving Transform
//!
//! Notes
//! - `OnePole*` use the inexpensive `y += a * (x - y)` form, where
//!   `a = 1 - exp(-2π fc / sr)`.
//! - `SvfTpt` uses the “g = tan(π fc / sr)” formulation with `R = 1/(2Q)`.
//!   It stays stable under per-sample cutoff modulation, which the wind sweep relies on.

use crate::dsp::{kill_denormals, one_pole_coeff_hz, tpt_g};
use core::fmt::Debug;

/// One-pole low-pass `y += a * (x - y)`.
#[derive(Copy, Clone, Debug)]
pub struct OnePoleLP {
    a: f32,
    y: f32,
    sr: f32,
    fc: f32,
}

impl OnePoleLP {
    /// Create a low-pass with cutoff `cut_hz` and sample rate `sr`.
    #[inline]
    pub fn new(cut_hz: f32, sr: f32) -> Self {
        let mut s = Self {
            a: 0.0,
            y: 0.0,
            sr: sr.max(1.0),
            fc: cut_hz.max(0.0),
        };
        s.update_coeffs();
        s
    }

    #[inline]
    pub fn set_sample_rate(&mut self, sr: f32) {
        self.sr = sr.max(1.0);
        self.update_coeffs();
    }

    #[inline]
    pub fn set_cutoff_hz(&mut self, cut_hz: f32) {
        self.fc = cut_hz.max(0.0);
        self.update_coeffs();
    }

    #[inline]
    fn update_coeffs(&mut self) {
        self.a = 1.0 - one_pole_coeff_hz(self.fc, self.sr);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        self.y += self.a * (x - self.y);
        self.y = kill_denormals(self.y);
        self.y
    }

    #[inline] pub fn reset(&mut self) { self.y = 0.0; }
    #[inline] pub fn value(&self) -> f32 { self.y }
}

/// One-pole high-pass, `y[n] = x[n] - x[n-1] + b * y[n-1]` with `b = exp(-2π fc / sr)`.
#[derive(Copy, Clone, Debug)]
pub struct OnePoleHP {
    b: f32,
    x1: f32,
    y1: f32,
    sr: f32,
    fc: f32,
}

impl OnePoleHP {
    #[inline]
    pub fn new(cut_hz: f32, sr: f32) -> Self {
        let mut s = Self {
            b: 0.0,
            x1: 0.0,
            y1: 0.0,
            sr: sr.max(1.0),
            fc: cut_hz.max(0.0),
        };
        s.update_coeffs();
        s
    }

    #[inline] pub fn set_sample_rate(&mut self, sr: f32) { self.sr = sr.max(1.0); self.update_coeffs(); }

    #[inline]
    fn update_coeffs(&mut self) {
        self.b = one_pole_coeff_hz(self.fc, self.sr);
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = kill_denormals(x - self.x1 + self.b * self.y1);
        self.x1 = x;
        self.y1 = y;
        y
    }

    #[inline] pub fn reset(&mut self) { self.x1 = 0.0; self.y1 = 0.0; }
}

/// Convenience DC blocker: a high-pass with a very low cutoff (e.g., 5–30 Hz).
#[derive(Copy, Clone, Debug)]
pub struct DcBlock {
    hp: OnePoleHP,
}

impl DcBlock {
    /// `cut_hz` default recommendation: 20 Hz.
    #[inline]
    pub fn new(cut_hz: f32, sr: f32) -> Self {
        Self { hp: OnePoleHP::new(cut_hz, sr) }
    }

    #[inline] pub fn set_sample_rate(&mut self, sr: f32) { self.hp.set_sample_rate(sr); }
    #[inline] pub fn process(&mut self, x: f32) -> f32 { self.hp.process(x) }
    #[inline] pub fn reset(&mut self) { self.hp.reset(); }
}

/// SVF output tap selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SvfMode {
    Lowpass,
    Highpass,
    /// Band-pass normalized to unity gain at the center frequency (biquad-style).
    Bandpass,
    Notch,
}

/// Topology-Preserving Transform SVF (State-Variable Filter).
///
/// Parameters:
/// - `cut_hz`  : cutoff / center frequency in Hz
/// - `q`       : quality factor (>= ~0.5 typical; lower increases damping)
///
/// Internals: `g = tan(π fc / sr)`, `R = 1 / (2Q)`.
#[derive(Copy, Clone, Debug)]
pub struct SvfTpt {
    sr: f32,
    cut: f32,
    q: f32,
    mode: SvfMode,
    // derived
    g: f32,
    r: f32,
    // states
    ic1eq: f32,
    ic2eq: f32,
}

impl SvfTpt {
    #[inline]
    pub fn new(mode: SvfMode, cut_hz: f32, q: f32, sr: f32) -> Self {
        let mut s = Self {
            sr: sr.max(1.0),
            cut: cut_hz.max(0.0),
            q: q.max(1e-4),
            mode,
            g: 0.0,
            r: 0.0,
            ic1eq: 0.0,
            ic2eq: 0.0,
        };
        s.recalc();
        s
    }

    #[inline] pub fn set_sample_rate(&mut self, sr: f32) { self.sr = sr.max(1.0); self.recalc(); }
    #[inline] pub fn set_cutoff_hz(&mut self, cut_hz: f32) { self.cut = cut_hz.max(0.0); self.recalc(); }

    #[inline]
    fn recalc(&mut self) {
        self.g = tpt_g(self.cut, self.sr);
        self.r = 1.0 / (2.0 * self.q);
    }

    /// Clear the integrator states (used when a voice is rebuilt from silence).
    #[inline] pub fn reset(&mut self) { self.ic1eq = 0.0; self.ic2eq = 0.0; }

    /// Process one sample and return all four taps `(lp, bp, hp, notch)`.
    ///
    /// `bp` here is the raw band tap (peak gain `Q`); the `Bandpass` mode normalizes it.
    #[inline]
    pub fn process_all(&mut self, x: f32) -> (f32, f32, f32, f32) {
        // v0 = x - r * ic1eq - ic2eq ; v1 = g*v0 + ic1eq ; v2 = g*v1 + ic2eq
        let d = 1.0 / (1.0 + 2.0 * self.r * self.g + self.g * self.g);
        let hp = (x - (2.0 * self.r + self.g) * self.ic1eq - self.ic2eq) * d;
        let bp = self.g * hp + self.ic1eq;
        let lp = self.g * bp + self.ic2eq;

        self.ic1eq = kill_denormals(self.g * hp + bp);
        self.ic2eq = kill_denormals(self.g * bp + lp);

        (lp, bp, hp, hp + lp)
    }

    /// Process one sample through the configured mode.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let (lp, bp, hp, n) = self.process_all(x);
        match self.mode {
            SvfMode::Lowpass => lp,
            SvfMode::Highpass => hp,
            SvfMode::Bandpass => bp * 2.0 * self.r,
            SvfMode::Notch => n,
        }
    }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_pole_lp_moves_towards_input() {
        let sr = 48000.0;
        let mut lp = OnePoleLP::new(1000.0, sr);
        let mut y = 0.0;
        for _ in 0..(sr as usize) {
            y = lp.process(1.0);
        }
        assert!(y > 0.9, "y={}", y);
    }

    #[test]
    fn dc_block_removes_offset() {
        let sr = 48000.0;
        let mut dc = DcBlock::new(20.0, sr);
        let mut y = 0.0;
        for _ in 0..(sr as usize) {
            y = dc.process(1.0);
        }
        assert!(y.abs() < 1e-2, "y={}", y);
    }

    #[test]
    fn svf_lowpass_passes_dc() {
        let sr = 48000.0;
        let mut svf = SvfTpt::new(SvfMode::Lowpass, 300.0, 1.0, sr);
        let mut y = 0.0;
        for _ in 0..(sr as usize) {
            y = svf.process(1.0);
        }
        assert!((y - 1.0).abs() < 1e-3, "y={}", y);
    }

    #[test]
    fn svf_bandpass_is_unity_at_center() {
        let sr = 48000.0;
        let fc = 400.0;
        let mut svf = SvfTpt::new(SvfMode::Bandpass, fc, 0.5, sr);
        let mut peak: f32 = 0.0;
        for n in 0..(sr as usize) {
            let x = (crate::dsp::TAU * fc * n as f32 / sr).sin();
            let y = svf.process(x);
            if n > sr as usize / 2 { peak = peak.max(y.abs()); }
        }
        assert!((peak - 1.0).abs() < 0.05, "peak={}", peak);
    }

    #[test]
    fn svf_highpass_blocks_dc() {
        let sr = 48000.0;
        let mut svf = SvfTpt::new(SvfMode::Highpass, 800.0, 1.0, sr);
        let mut y = 1.0;
        for _ in 0..(sr as usize) {
            y = svf.process(1.0);
        }
        assert!(y.abs() < 1e-3, "y={}", y);
    }
}
