use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{BriefError, BriefResult};

/// Shape and seed of a sampling pattern.
///
/// Every image in a run must use the same pattern, otherwise descriptors are not comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PatternSpec {
    pub patch_size: usize,
    pub num_pairs: usize,
    pub seed: u64,
}

impl Default for PatternSpec {
    fn default() -> Self {
        Self {
            patch_size: 31,
            num_pairs: 256,
            seed: 0,
        }
    }
}

impl PatternSpec {
    pub fn validate(&self) -> BriefResult<()> {
        if self.patch_size == 0 || self.patch_size % 2 == 0 {
            return Err(BriefError::InvalidPatchSize(self.patch_size));
        }
        if self.num_pairs == 0 {
            return Err(BriefError::InvalidPairCount(self.num_pairs));
        }
        Ok(())
    }

    pub fn generate(&self) -> BriefResult<SamplingPattern> {
        generate_pattern(self.patch_size, self.num_pairs, self.seed)
    }
}

/// Ordered `(x1, y1, x2, y2)` patch coordinates, each in `[0, patch_size)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingPattern {
    patch_size: usize,
    pairs: Vec<[usize; 4]>,
}

impl SamplingPattern {
    pub fn patch_size(&self) -> usize {
        self.patch_size
    }

    pub fn pairs(&self) -> &[[usize; 4]] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Deterministic pseudo-random pattern.
///
/// Coordinates are drawn pair by pair, `x1, y1, x2, y2`, from a generator seeded
/// with `seed`, so a longer pattern starts with every shorter one.
pub fn generate_pattern(patch_size: usize, num_pairs: usize, seed: u64) -> BriefResult<SamplingPattern> {
    PatternSpec { patch_size, num_pairs, seed }.validate()?;

    let mut rng = StdRng::seed_from_u64(seed);
    let pairs = (0..num_pairs)
        .map(|_| {
            [
                rng.gen_range(0..patch_size),
                rng.gen_range(0..patch_size),
                rng.gen_range(0..patch_size),
                rng.gen_range(0..patch_size),
            ]
        })
        .collect();

    Ok(SamplingPattern { patch_size, pairs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pattern_is_deterministic() {
        let a = generate_pattern(31, 256, 0).unwrap();
        let b = generate_pattern(31, 256, 0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 256);
    }

    #[test]
    fn test_seed_changes_pattern() {
        let a = generate_pattern(31, 64, 0).unwrap();
        let b = generate_pattern(31, 64, 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_coordinates_stay_in_patch() {
        let p = generate_pattern(9, 500, 3).unwrap();
        assert!(p.pairs().iter().flatten().all(|&c| c < 9));
    }

    #[test]
    fn test_invalid_shapes() {
        assert_eq!(generate_pattern(30, 10, 0).unwrap_err(), BriefError::InvalidPatchSize(30));
        assert_eq!(generate_pattern(0, 10, 0).unwrap_err(), BriefError::InvalidPatchSize(0));
        assert_eq!(generate_pattern(31, 0, 0).unwrap_err(), BriefError::InvalidPairCount(0));
    }

    proptest! {
        #[test]
        fn prop_shorter_pattern_is_prefix(short in 1usize..128, extra in 0usize..128, seed in 0u64..4) {
            let a = generate_pattern(31, short, seed).unwrap();
            let b = generate_pattern(31, short + extra, seed).unwrap();
            prop_assert_eq!(a.pairs(), &b.pairs()[..short]);
        }
    }
}
