//! Seeded permutation table for gradient noise.
//!
//! The shuffle is a Fisher–Yates pass driven by the Park–Miller "minimal standard"
//! generator (`state = state * 16807 mod (2^31 - 1)`). Terrain shape depends on every
//! swap, so the generator, its constants and the iteration order are fixed.

/// Park–Miller multiplier.
pub const LCG_MULTIPLIER: u64 = 16_807;
/// Park–Miller modulus (2^31 - 1).
pub const LCG_MODULUS: u64 = 2_147_483_647;

/// A permutation of `0..256`, stored twice so `perm[i + perm[j]]` never needs wrapping.
#[derive(Clone, PartialEq, Eq)]
pub struct PermutationTable {
    seed: u32,
    perm: [u8; 512],
}

impl core::fmt::Debug for PermutationTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PermutationTable")
            .field("seed", &self.seed)
            .field("head", &&self.perm[..8])
            .finish()
    }
}

impl PermutationTable {
    pub fn new(seed: u32) -> Self {
        let mut p = [0u8; 256];
        for (i, v) in p.iter_mut().enumerate() {
            *v = i as u8;
        }

        let mut state = u64::from(seed);
        for i in (1..256usize).rev() {
            state = (state * LCG_MULTIPLIER) % LCG_MODULUS;
            let j = (state % (i as u64 + 1)) as usize;
            p.swap(i, j);
        }

        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&p);
        perm[256..].copy_from_slice(&p);
        Self { seed, perm }
    }

    #[inline]
    pub fn seed(&self) -> u32 { self.seed }

    /// Entry `i` of the doubled table (`i < 512`).
    #[inline]
    pub fn get(&self, i: usize) -> u8 { self.perm[i] }

    /// The 256-entry permutation itself.
    #[inline]
    pub fn permutation(&self) -> &[u8] { &self.perm[..256] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_table() {
        assert_eq!(PermutationTable::new(77), PermutationTable::new(77));
        assert_ne!(
            PermutationTable::new(77).permutation(),
            PermutationTable::new(42).permutation()
        );
    }

    #[test]
    fn table_is_a_permutation_and_doubled() {
        let t = PermutationTable::new(77);
        let mut seen = [false; 256];
        for &v in t.permutation() {
            assert!(!seen[v as usize], "duplicate {v}");
            seen[v as usize] = true;
        }
        for i in 0..256 {
            assert_eq!(t.get(i), t.get(i + 256));
        }
    }

    #[test]
    fn first_swap_follows_park_miller() {
        // i = 255: state = 77 * 16807 = 1_294_139, j = 1_294_139 % 256 = 59.
        // Slot 255 receives 59 and later swaps only touch indices below it.
        let t = PermutationTable::new(77);
        assert_eq!(t.get(255), 59);
        assert_eq!(t.get(511), 59);
    }

    #[test]
    fn zero_seed_is_still_a_valid_table() {
        let t = PermutationTable::new(0);
        let mut sorted = t.permutation().to_vec();
        sorted.sort_unstable();
        assert!(sorted.iter().enumerate().all(|(i, &v)| v as usize == i));
    }

    #[test]
    fn seed_77_table_is_pinned() {
        let t = PermutationTable::new(77);
        assert_eq!(&t.permutation()[..8], &[120, 154, 165, 35, 90, 205, 208, 78]);
        let checksum: u64 = t.permutation().iter().enumerate().map(|(i, &v)| i as u64 * u64::from(v)).sum();
        assert_eq!(checksum, 4_076_805);
    }
}
