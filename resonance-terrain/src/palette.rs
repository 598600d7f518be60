//! Height → color ramp.
//!
//! Stops are given as sRGB hex and stored as linear RGB; interpolation happens in
//! linear space, which is what a renderer expects in a vertex color buffer.

use glam::Vec3;

/// Decode one sRGB channel (0..=1) to linear light.
#[inline]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.077_399_38
    } else {
        ((c * 0.947_867_3) + 0.052_132_7).powf(2.4)
    }
}

/// Parse `#rrggbb` (the `#` is optional) into linear RGB.
pub fn hex_to_linear(hex: &str) -> Option<Vec3> {
    let h = hex.strip_prefix('#').unwrap_or(hex);
    if h.len() != 6 || !h.is_ascii() {
        return None;
    }
    let ch = |k: usize| u8::from_str_radix(&h[k..k + 2], 16).ok();
    let (r, g, b) = (ch(0)?, ch(2)?, ch(4)?);
    let lin = |v: u8| srgb_to_linear(f32::from(v) / 255.0);
    Some(Vec3::new(lin(r), lin(g), lin(b)))
}

/// Three-stop gradient: `low` at -1, `mid` at 0, `high` at +1 (normalized height).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Palette {
    pub low: Vec3,
    pub mid: Vec3,
    pub high: Vec3,
}

pub const LOW_HEX: &str = "#081820";
pub const MID_HEX: &str = "#1a5060";
pub const HIGH_HEX: &str = "#b0e8f0";

impl Default for Palette {
    fn default() -> Self {
        Self::from_hex(LOW_HEX, MID_HEX, HIGH_HEX).unwrap_or(Self {
            low: Vec3::ZERO,
            mid: Vec3::splat(0.5),
            high: Vec3::ONE,
        })
    }
}

impl Palette {
    pub fn from_hex(low: &str, mid: &str, high: &str) -> Option<Self> {
        Some(Self { low: hex_to_linear(low)?, mid: hex_to_linear(mid)?, high: hex_to_linear(high)? })
    }

    /// Color at ramp position `t` in `[0, 1]` (0.5 is the mid stop).
    ///
    /// Values outside the range extrapolate along the nearest segment, as the height
    /// field itself is unclamped.
    #[inline]
    pub fn sample(&self, t: f64) -> Vec3 {
        if t < 0.5 {
            self.low.lerp(self.mid, (t * 2.0) as f32)
        } else {
            self.mid.lerp(self.high, ((t - 0.5) * 2.0) as f32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parses_and_rejects() {
        let white = hex_to_linear("#ffffff").unwrap();
        assert!((white - Vec3::ONE).abs().max_element() < 1e-5);
        assert_eq!(hex_to_linear("#000000"), Some(Vec3::ZERO));
        assert!(hex_to_linear("#12345").is_none());
        assert!(hex_to_linear("zzzzzz").is_none());
    }

    #[test]
    fn stops_hit_exactly() {
        let p = Palette::default();
        assert_eq!(p.sample(0.0), p.low);
        assert_eq!(p.sample(0.5), p.mid);
        assert!((p.sample(1.0) - p.high).abs().max_element() < 1e-6);
    }

    #[test]
    fn ramp_gets_brighter() {
        let p = Palette::default();
        let l = |t: f64| p.sample(t).length();
        assert!(l(0.1) < l(0.4) && l(0.4) < l(0.6) && l(0.6) < l(0.9));
    }
}
