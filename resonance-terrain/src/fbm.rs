//! Fractal Brownian motion: a weighted octave sum of a 2D noise source.
//!
//! Normalization is by the running sum of amplitudes (not the theoretical geometric
//! series), so the result stays within the range of the underlying noise.

use num_traits::Float;

/// Octave layout for [`fbm`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FbmParams {
    pub octaves: u32,
    pub lacunarity: f64,
    pub gain: f64,
}

impl Default for FbmParams {
    fn default() -> Self {
        Self { octaves: 5, lacunarity: 2.1, gain: 0.48 }
    }
}

/// Sum `octaves` samples of `noise`, each at `lacunarity`× the previous frequency and
/// `gain`× the previous amplitude, divided by the total amplitude.
///
/// Zero octaves yields zero instead of `0 / 0`.
pub fn fbm<T, F>(noise: F, x: T, y: T, octaves: u32, lacunarity: T, gain: T) -> T
where
    T: Float,
    F: Fn(T, T) -> T,
{
    let mut sum = T::zero();
    let mut amp = T::one();
    let mut freq = T::one();
    let mut max_amp = T::zero();
    for _ in 0..octaves {
        sum = sum + noise(x * freq, y * freq) * amp;
        max_amp = max_amp + amp;
        amp = amp * gain;
        freq = freq * lacunarity;
    }
    if max_amp > T::zero() { sum / max_amp } else { T::zero() }
}

/// [`fbm`] with the octave layout taken from `params`.
#[inline]
pub fn fbm_with<F>(noise: F, x: f64, y: f64, params: &FbmParams) -> f64
where
    F: Fn(f64, f64) -> f64,
{
    fbm(noise, x, y, params.octaves, params.lacunarity, params.gain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simplex::Simplex2;

    #[test]
    fn single_octave_is_the_noise_itself() {
        let n = Simplex2::new(77);
        let f = |x, y| n.sample(x, y);
        for k in 0..32 {
            let (x, y) = (k as f64 * 0.37, 1.0 - k as f64 * 0.11);
            assert_eq!(fbm(f, x, y, 1, 2.0, 0.5), n.sample(x, y));
        }
    }

    #[test]
    fn normalized_by_amplitude_sum() {
        // A constant field of 1 must come back as exactly 1 whatever the octave layout.
        let one = |_: f64, _: f64| 1.0;
        let v = fbm(one, 3.0, 4.0, 5, 2.1, 0.48);
        assert!((v - 1.0).abs() < 1e-12, "v={v}");
    }

    #[test]
    fn zero_octaves_is_zero() {
        let n = Simplex2::new(1);
        assert_eq!(fbm(|x, y| n.sample(x, y), 0.3, 0.3, 0, 2.0, 0.5), 0.0);
    }

    #[test]
    fn works_for_f32_noise_too() {
        let ramp = |x: f32, y: f32| (x + y).sin();
        let v = fbm(ramp, 0.25_f32, 0.5_f32, 4, 2.0, 0.5);
        assert!(v.is_finite() && v.abs() <= 1.0);
    }

    #[test]
    fn terrain_layout_stays_in_range() {
        let n = Simplex2::new(77);
        let p = FbmParams::default();
        for a in 0..40 {
            for b in 0..40 {
                let v = fbm_with(|x, y| n.sample(x, y), a as f64 * 0.4 - 8.0, b as f64 * 0.4 - 8.0, &p);
                assert!(v.abs() <= 1.0, "v={v}");
            }
        }
    }

    #[test]
    fn origin_value_is_pinned_for_seed_77() {
        // Every octave samples the lattice origin, where all three simplex corners vanish.
        let n = Simplex2::new(77);
        let v = fbm(|x, y| n.sample(x, y), 0.0, 0.0, 5, 2.1, 0.48);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn terrain_layout_matches_reference_values() {
        let n = Simplex2::new(77);
        let f = |x, y| n.sample(x, y);
        assert_eq!(fbm(f, 0.3, 0.7, 5, 2.1, 0.48), 0.1896819183852334);
        assert_eq!(fbm_with(f, -3.25, 12.5, &FbmParams::default()), 0.08585088757369477);
    }
}
