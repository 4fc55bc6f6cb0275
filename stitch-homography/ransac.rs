use nalgebra::Matrix3;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dlt::{estimate_homography_dlt, has_collinear_triple, reprojection_error, MIN_POINTS};
use crate::{Homography, HomographyError, HomographyResult};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RansacConfig {
    /// Inlier cutoff on reprojection error, in pixels (strict)
    pub threshold: f64,
    pub max_iterations: usize,
    pub min_inliers: usize,
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            threshold: 5.0,
            max_iterations: 2000,
            min_inliers: 4,
            seed: 0,
        }
    }
}

impl RansacConfig {
    pub fn validate(&self) -> HomographyResult<()> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(HomographyError::InvalidConfig(format!(
                "threshold must be positive, got {}",
                self.threshold
            )));
        }
        if self.max_iterations == 0 {
            return Err(HomographyError::InvalidConfig("max_iterations must be > 0".into()));
        }
        if self.min_inliers < MIN_POINTS {
            return Err(HomographyError::InvalidConfig(format!(
                "min_inliers must be >= {}, got {}",
                MIN_POINTS, self.min_inliers
            )));
        }
        Ok(())
    }
}

/// Robust homography fitting over putative correspondences.
///
/// Every call reseeds its generator from the config, so the same input always
/// yields the same model regardless of which thread runs it.
#[derive(Debug, Clone, Default)]
pub struct HomographyEstimator {
    config: RansacConfig,
}

impl HomographyEstimator {
    pub fn new(config: RansacConfig) -> HomographyResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RansacConfig {
        &self.config
    }

    fn inliers(&self, h: &Matrix3<f64>, src: &[[f64; 2]], dst: &[[f64; 2]]) -> (Vec<bool>, usize) {
        let mask: Vec<bool> = src
            .iter()
            .zip(dst)
            .map(|(s, d)| reprojection_error(h, *s, *d) < self.config.threshold)
            .collect();
        let count = mask.iter().filter(|&&m| m).count();
        (mask, count)
    }

    /// Homography mapping `src[i]` onto `dst[i]` together with its inlier mask.
    ///
    /// Runs the full iteration budget. Minimal samples with three collinear
    /// points in either set are skipped. The best model (first found on ties)
    /// is refit on its inliers and the refit is kept when it scores at least
    /// as many inliers.
    pub fn estimate(&self, src: &[[f64; 2]], dst: &[[f64; 2]]) -> HomographyResult<Homography> {
        if src.len() != dst.len() {
            return Err(HomographyError::LengthMismatch {
                src: src.len(),
                dst: dst.len(),
            });
        }
        let n = src.len();
        if n < MIN_POINTS {
            return Err(HomographyError::TooFewPoints { needed: MIN_POINTS, got: n });
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut best: Option<(Matrix3<f64>, Vec<bool>, usize)> = None;
        let mut degenerate = 0usize;

        for _ in 0..self.config.max_iterations {
            let sample = rand::seq::index::sample(&mut rng, n, MIN_POINTS);
            let s4: Vec<[f64; 2]> = sample.iter().map(|i| src[i]).collect();
            let d4: Vec<[f64; 2]> = sample.iter().map(|i| dst[i]).collect();
            if has_collinear_triple(&s4) || has_collinear_triple(&d4) {
                degenerate += 1;
                continue;
            }

            let Ok(h) = estimate_homography_dlt(&s4, &d4) else {
                degenerate += 1;
                continue;
            };

            let (mask, count) = self.inliers(&h, src, dst);
            if best.as_ref().map_or(true, |(_, _, c)| count > *c) {
                best = Some((h, mask, count));
            }
        }

        let found = best.as_ref().map_or(0, |(_, _, c)| *c);
        log::debug!(
            "ransac: {} correspondences, {} iterations ({} degenerate), best {} inliers",
            n,
            self.config.max_iterations,
            degenerate,
            found
        );

        let (mut matrix, mut mask, mut count) = match best {
            Some(b) if b.2 >= self.config.min_inliers => b,
            _ => {
                return Err(HomographyError::InsufficientInliers {
                    needed: self.config.min_inliers,
                    found,
                })
            }
        };

        let (in_src, in_dst): (Vec<[f64; 2]>, Vec<[f64; 2]>) = src
            .iter()
            .zip(dst)
            .zip(&mask)
            .filter(|(_, &m)| m)
            .map(|((s, d), _)| (*s, *d))
            .unzip();
        if let Ok(refit) = estimate_homography_dlt(&in_src, &in_dst) {
            let (refit_mask, refit_count) = self.inliers(&refit, src, dst);
            if refit_count >= count {
                matrix = refit;
                mask = refit_mask;
                count = refit_count;
            }
        }
        log::debug!("ransac: final model has {} / {} inliers", count, n);

        Ok(Homography::new(matrix, mask))
    }
}
