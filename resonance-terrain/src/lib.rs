//! Resonance Terrain: seeded simplex/fBm height field and its animated grid mesh.
//!
//! Modules
//! - [`permutation`] : Park–Miller shuffled permutation table
//! - [`simplex`]     : 2D simplex noise (`f64`)
//! - [`fbm`]         : octave summation, generic over float type
//! - [`palette`]     : sRGB stops → linear vertex colors
//! - [`terrain`]     : `TerrainGrid` (positions, colors, normals, indices) with per-frame regeneration

pub mod fbm;
pub mod palette;
pub mod permutation;
pub mod simplex;
pub mod terrain;

pub mod prelude {
    pub use crate::fbm::{fbm, fbm_with, FbmParams};
    pub use crate::palette::Palette;
    pub use crate::permutation::PermutationTable;
    pub use crate::simplex::Simplex2;
    pub use crate::terrain::{TerrainGrid, TerrainParams};
}

/// `createNoise2D`-style helper: a seeded sampler closure.
pub fn noise2d(seed: u32) -> impl Fn(f64, f64) -> f64 {
    let n = simplex::Simplex2::new(seed);
    move |x, y| n.sample(x, y)
}

#[cfg(test)]
mod smoke {
    use super::*;

    #[test]
    fn closure_matches_sampler() {
        let f = noise2d(77);
        let n = simplex::Simplex2::new(77);
        assert_eq!(f(1.3, -2.7), n.sample(1.3, -2.7));
        let v = fbm::fbm(&f, 0.4, 0.9, 5, 2.1, 0.48);
        assert!(v.abs() <= 1.0);
    }
}
