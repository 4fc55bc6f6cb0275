use stitch_core::{Grid, Keypoint};
use crate::refinement::KeypointRefinement;

/// Post-detection stage mapping a keypoint list to a (usually shorter) one.
pub trait KeypointFilter: Send + Sync {
    fn apply(&self, keypoints: Vec<Keypoint>) -> Vec<Keypoint>;
}

/// Drops keypoints that have an earlier kept keypoint closer than `min_distance`.
#[derive(Debug, Clone, Copy)]
pub struct MinDistanceFilter {
    pub min_distance: f32,
}

impl MinDistanceFilter {
    pub fn new(min_distance: f32) -> Self {
        Self { min_distance }
    }
}

impl Default for MinDistanceFilter {
    fn default() -> Self {
        Self { min_distance: 10.0 }
    }
}

impl KeypointFilter for MinDistanceFilter {
    fn apply(&self, keypoints: Vec<Keypoint>) -> Vec<Keypoint> {
        KeypointRefinement::min_distance_filter(&keypoints, self.min_distance)
    }
}

/// Keeps keypoints whose square patch of half-size `margin` fits in the grid.
#[derive(Debug, Clone, Copy)]
pub struct BorderFilter {
    width: usize,
    height: usize,
    margin: usize,
}

impl BorderFilter {
    pub fn new(width: usize, height: usize, margin: usize) -> Self {
        Self { width, height, margin }
    }

    /// Filter sized for `grid` and a square patch of side `patch_size`.
    pub fn for_patch(grid: &Grid, patch_size: usize) -> Self {
        Self::new(grid.width(), grid.height(), patch_size / 2)
    }
}

impl KeypointFilter for BorderFilter {
    fn apply(&self, mut keypoints: Vec<Keypoint>) -> Vec<Keypoint> {
        keypoints.retain(|kp| {
            kp.x >= self.margin
                && kp.y >= self.margin
                && kp.x + self.margin < self.width
                && kp.y + self.margin < self.height
        });
        keypoints
    }
}
