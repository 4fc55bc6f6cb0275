use stitch_core::{Grid, Keypoint};
use crate::config::DetectorConfig;
use crate::corner_detection::CornerDetector;
use crate::error::FastResult;
use crate::filters::{KeypointFilter, MinDistanceFilter};
use crate::orientation::OrientationEstimator;
use crate::refinement::KeypointRefinement;
use crate::types::ScoredKeypoint;

/// Ring-test corner detector with local-maximum suppression and orientation.
#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: DetectorConfig,
    orientation: OrientationEstimator,
}

impl FastDetector {
    /// Creates a new detector with validation
    pub fn new(cfg: DetectorConfig) -> FastResult<Self> {
        cfg.validate()?;
        let orientation = OrientationEstimator::new(cfg.core.patch_size)?;
        Ok(Self { cfg, orientation })
    }

    /// Suppressed keypoints in scan order, angle 0.
    ///
    /// The minimum-distance filter runs only when `min_distance` is configured.
    pub fn detect_keypoints(&self, grid: &Grid) -> Vec<Keypoint> {
        let candidates = self.detect_keypoints_with_response(grid);
        let suppressed = self.non_maximum_suppression(grid, &candidates);
        let keypoints: Vec<Keypoint> = suppressed.into_iter().map(|sk| sk.keypoint).collect();

        match self.cfg.min_distance {
            Some(d) => {
                let filtered = MinDistanceFilter::new(d).apply(keypoints);
                log::debug!(
                    "detector: {} candidates -> {} after filtering at {:.1}px",
                    candidates.len(),
                    filtered.len(),
                    d
                );
                filtered
            }
            None => {
                log::debug!(
                    "detector: {} candidates -> {} local maxima",
                    candidates.len(),
                    keypoints.len()
                );
                keypoints
            }
        }
    }

    /// Raw ring-test candidates with their responses
    pub fn detect_keypoints_with_response(&self, grid: &Grid) -> Vec<ScoredKeypoint> {
        CornerDetector::detect_candidates(grid, self.cfg.core.threshold, self.cfg.ring_radius)
    }

    /// Apply local-maximum suppression with the configured radius
    pub fn non_maximum_suppression(&self, grid: &Grid, candidates: &[ScoredKeypoint]) -> Vec<ScoredKeypoint> {
        KeypointRefinement::local_maximum_suppression(grid, candidates, self.cfg.nms_radius)
    }

    /// Second phase: new keypoints carrying their dominant orientation
    pub fn orient(&self, grid: &Grid, kps: &[Keypoint]) -> Vec<Keypoint> {
        self.orientation.assign_all(grid, kps)
    }

    /// Detect and orient in one step
    pub fn detect_and_orient(&self, grid: &Grid) -> Vec<Keypoint> {
        let kps = self.detect_keypoints(grid);
        self.orient(grid, &kps)
    }

    /// Get detector configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.cfg
    }

    pub fn orientation_estimator(&self) -> &OrientationEstimator {
        &self.orientation
    }
}
