use stitch_core::{Descriptor, Grid, Keypoint};
use rayon::prelude::*;

mod pattern;

pub use pattern::{generate_pattern, PatternSpec, SamplingPattern};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BriefError {
    InvalidPatchSize(usize),
    InvalidPairCount(usize),
}

impl std::fmt::Display for BriefError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BriefError::InvalidPatchSize(p) => {
                write!(f, "Invalid descriptor patch size: {} (must be odd and > 0)", p)
            }
            BriefError::InvalidPairCount(n) => {
                write!(f, "Invalid sampling pair count: {} (must be > 0)", n)
            }
        }
    }
}

impl std::error::Error for BriefError {}

pub type BriefResult<T> = Result<T, BriefError>;

/// Binary descriptor generator over a fixed sampling pattern.
///
/// The pattern is not rotated by the keypoint angle; descriptors compare raw
/// patch intensities at fixed offsets.
#[derive(Debug, Clone)]
pub struct BriefGenerator {
    pattern: SamplingPattern,
}

impl BriefGenerator {
    pub fn new(pattern: SamplingPattern) -> Self {
        Self { pattern }
    }

    pub fn from_spec(spec: &PatternSpec) -> BriefResult<Self> {
        Ok(Self::new(spec.generate()?))
    }

    pub fn pattern(&self) -> &SamplingPattern {
        &self.pattern
    }

    /// Bits per descriptor
    pub fn descriptor_len(&self) -> usize {
        self.pattern.len()
    }

    /// Descriptor for one keypoint.
    ///
    /// Bit `i` is set when `patch[y1, x1] < patch[y2, x2]` for the i-th pattern
    /// entry, with the patch's top-left corner at `(x - half, y - half)`. A patch
    /// crossing the grid boundary yields an all-zero descriptor.
    pub fn compute(&self, grid: &Grid, kp: &Keypoint) -> Descriptor {
        let n_bits = self.pattern.len();
        let half = self.pattern.patch_size() / 2;
        if !grid.contains_patch(kp.x, kp.y, half) {
            return Descriptor::zeros(n_bits);
        }

        let (ox, oy) = (kp.x - half, kp.y - half);
        let mut d = Descriptor::zeros(n_bits);
        for (i, &[x1, y1, x2, y2]) in self.pattern.pairs().iter().enumerate() {
            let a = grid.get(ox + x1, oy + y1);
            let b = grid.get(ox + x2, oy + y2);
            if a < b {
                d.set(i, true);
            }
        }
        d
    }

    /// One descriptor per keypoint, same order
    pub fn generate_descriptors(&self, grid: &Grid, kps: &[Keypoint]) -> Vec<Descriptor> {
        kps.par_iter().map(|kp| self.compute(grid, kp)).collect()
    }
}
