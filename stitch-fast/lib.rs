//! Corner detection and orientation assignment.
//!
//! Detection runs in two phases: [`FastDetector::detect_keypoints`] returns
//! suppressed corners with angle 0, and [`FastDetector::orient`] returns new
//! keypoints carrying their dominant gradient direction.

mod builder;
mod config;
mod corner_detection;
mod detector;
mod error;
mod filters;
mod orientation;
mod refinement;
mod types;

pub use builder::DetectorBuilder;
pub use config::DetectorConfig;
pub use corner_detection::CornerDetector;
pub use detector::FastDetector;
pub use error::{FastError, FastResult};
pub use filters::{BorderFilter, KeypointFilter, MinDistanceFilter};
pub use orientation::{bin_left_edge, OrientationEstimator, ORIENTATION_BINS};
pub use refinement::KeypointRefinement;
pub use types::{CornerType, ScoredKeypoint};

use stitch_core::{Grid, Keypoint};

/// Default half-size of the local-maximum window
pub const DEFAULT_NMS_RADIUS: usize = 3;

/// Ring test followed by local-maximum suppression.
///
/// No minimum-distance filtering is applied; compose [`MinDistanceFilter`]
/// on the result when well-separated keypoints are needed.
pub fn detect(grid: &Grid, threshold: u8, ring_radius: usize) -> Vec<Keypoint> {
    let candidates = CornerDetector::detect_candidates(grid, threshold, ring_radius);
    KeypointRefinement::local_maximum_suppression(grid, &candidates, DEFAULT_NMS_RADIUS)
        .into_iter()
        .map(|sk| sk.keypoint)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_flat_grid_has_no_keypoints(
            w in 1usize..40,
            h in 1usize..40,
            value in any::<u8>(),
            threshold in 1u8..=255,
        ) {
            let grid = Grid::filled(w, h, value).unwrap();
            prop_assert!(detect(&grid, threshold, 3).is_empty());
        }

        #[test]
        fn prop_grid_below_ring_diameter_has_no_keypoints(
            w in 1usize..7,
            h in 1usize..30,
            data_seed in any::<u64>(),
            threshold in 1u8..100,
        ) {
            // width below 2 * 3 + 1
            let data: Vec<u8> = (0..w * h)
                .map(|i| (data_seed.wrapping_mul(i as u64 + 1).rotate_left(17) & 0xff) as u8)
                .collect();
            let grid = Grid::new(w, h, data).unwrap();
            prop_assert!(detect(&grid, threshold, 3).is_empty());

            let transposed = Grid::new(h, w, grid.as_slice().to_vec()).unwrap();
            prop_assert!(detect(&transposed, threshold, 3).is_empty());
        }

        #[test]
        fn prop_detections_respect_ring_margin(
            data in proptest::collection::vec(any::<u8>(), 20 * 20),
            threshold in 1u8..80,
        ) {
            let grid = Grid::new(20, 20, data).unwrap();
            for kp in detect(&grid, threshold, 3) {
                prop_assert!(kp.x >= 3 && kp.x < 17 && kp.y >= 3 && kp.y < 17);
                prop_assert_eq!(kp.angle, 0.0);
            }
        }
    }

    #[test]
    fn test_detect_matches_detector_defaults() {
        let mut data = vec![0u8; 40 * 40];
        data[12 * 40 + 10] = 255;
        data[25 * 40 + 30] = 255;
        let grid = Grid::new(40, 40, data).unwrap();
        let detector = DetectorBuilder::new().threshold(100).build().unwrap();
        assert_eq!(detect(&grid, 100, 3), detector.detect_keypoints(&grid));
    }
}
