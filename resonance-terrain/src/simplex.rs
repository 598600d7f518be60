//! 2D simplex noise over a seeded [`PermutationTable`].
//!
//! Classic Gustavson formulation in `f64`:
//! - skew `F2 = (√3 - 1) / 2`, unskew `G2 = (3 - √3) / 6`
//! - gradients from the 12-entry `GRAD3` set (only x/y components are used)
//! - each corner contributes `t⁴ · dot(g, d)` when `t = 0.5 - |d|² ≥ 0`
//! - the sum is scaled by 70 so output stays roughly within `[-1, 1]`
//!
//! The evaluation order of every floating-point expression is kept stable; terrain built
//! from the same seed must reproduce exactly.

use crate::permutation::PermutationTable;

const GRAD3: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0], [-1.0, 1.0, 0.0], [1.0, -1.0, 0.0], [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0], [-1.0, 0.0, 1.0], [1.0, 0.0, -1.0], [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0], [0.0, -1.0, 1.0], [0.0, 1.0, -1.0], [0.0, -1.0, -1.0],
];

/// Output scale bringing the summed corner contributions to roughly unit range.
pub const SIMPLEX_SCALE: f64 = 70.0;

/// Seeded 2D simplex noise source.
#[derive(Clone, Debug)]
pub struct Simplex2 {
    perm: PermutationTable,
    f2: f64,
    g2: f64,
}

impl Simplex2 {
    pub fn new(seed: u32) -> Self {
        Self::with_table(PermutationTable::new(seed))
    }

    pub fn with_table(perm: PermutationTable) -> Self {
        let sqrt3 = 3.0_f64.sqrt();
        Self {
            perm,
            f2: 0.5 * (sqrt3 - 1.0),
            g2: (3.0 - sqrt3) / 6.0,
        }
    }

    #[inline]
    pub fn seed(&self) -> u32 { self.perm.seed() }

    #[inline]
    pub fn table(&self) -> &PermutationTable { &self.perm }

    /// Sample the field at `(xin, yin)`. Total over all finite inputs.
    pub fn sample(&self, xin: f64, yin: f64) -> f64 {
        let s = (xin + yin) * self.f2;
        let i = (xin + s).floor();
        let j = (yin + s).floor();
        let t = (i + j) * self.g2;
        let x0 = xin - (i - t);
        let y0 = yin - (j - t);

        let (i1, j1) = if x0 > y0 { (1.0, 0.0) } else { (0.0, 1.0) };

        let x1 = x0 - i1 + self.g2;
        let y1 = y0 - j1 + self.g2;
        let x2 = x0 - 1.0 + 2.0 * self.g2;
        let y2 = y0 - 1.0 + 2.0 * self.g2;

        let ii = wrap_cell(i);
        let jj = wrap_cell(j);
        let (i1, j1) = (i1 as usize, j1 as usize);
        let p = |k: usize| usize::from(self.perm.get(k));

        let gi0 = p(ii + p(jj)) % 12;
        let gi1 = p(ii + i1 + p(jj + j1)) % 12;
        let gi2 = p(ii + 1 + p(jj + 1)) % 12;

        let n0 = corner(gi0, x0, y0);
        let n1 = corner(gi1, x1, y1);
        let n2 = corner(gi2, x2, y2);

        SIMPLEX_SCALE * (n0 + n1 + n2)
    }
}

/// Cell coordinate → table index, two's-complement `& 255` so negative cells wrap.
#[inline]
fn wrap_cell(c: f64) -> usize {
    ((c as i64) & 255) as usize
}

#[inline]
fn corner(gi: usize, x: f64, y: f64) -> f64 {
    let mut t = 0.5 - x * x - y * y;
    if t < 0.0 {
        0.0
    } else {
        t *= t;
        let g = &GRAD3[gi];
        t * t * (g[0] * x + g[1] * y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_per_seed() {
        let a = Simplex2::new(77);
        let b = Simplex2::new(77);
        for k in 0..200 {
            let x = k as f64 * 0.173 - 17.0;
            let y = k as f64 * -0.291 + 5.5;
            assert_eq!(a.sample(x, y).to_bits(), b.sample(x, y).to_bits());
        }
    }

    #[test]
    fn origin_is_zero() {
        // At (0,0) every corner offset lies on a gradient-orthogonal or out-of-range point:
        // corner 0 has d = 0, corners 1 and 2 have |d|² >= 0.5.
        let n = Simplex2::new(77);
        assert_eq!(n.sample(0.0, 0.0), 0.0);
    }

    #[test]
    fn output_stays_in_unit_range() {
        let n = Simplex2::new(77);
        for a in -60..60 {
            for b in -60..60 {
                let v = n.sample(a as f64 * 0.137, b as f64 * 0.211);
                assert!(v.is_finite());
                assert!(v.abs() <= 1.0, "v={v} at ({a},{b})");
            }
        }
    }

    #[test]
    fn negative_coordinates_wrap() {
        let n = Simplex2::new(77);
        // Cell -1 must index like cell 255.
        assert_eq!(wrap_cell(-1.0), 255);
        assert_eq!(wrap_cell(-256.0), 0);
        assert!(n.sample(-1000.25, -3.75).is_finite());
    }

    #[test]
    fn different_seeds_differ() {
        let a = Simplex2::new(77);
        let b = Simplex2::new(78);
        let diff = (0..64)
            .map(|k| (a.sample(k as f64 * 0.31 + 0.1, 0.7) - b.sample(k as f64 * 0.31 + 0.1, 0.7)).abs())
            .sum::<f64>();
        assert!(diff > 1e-3);
    }

    #[test]
    fn matches_reference_values_off_lattice() {
        // Seed 77 outputs of the reference field; both triangle branches and a negative
        // cell wrap are covered.
        let n = Simplex2::new(77);
        assert_eq!(n.sample(0.3, 0.7), 0.15382781683975202);
        assert_eq!(n.sample(17.1, -4.4), 0.4068555944710626);
        assert_eq!(n.sample(100.9, -250.3), 0.11367061700596195);
    }
}
