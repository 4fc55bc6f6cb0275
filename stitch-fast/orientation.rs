use std::f64::consts::PI;

use stitch_core::{Grid, Keypoint};
use crate::error::{FastError, FastResult};
use rayon::prelude::*;

/// Number of histogram bins over `[-pi, pi]`
pub const ORIENTATION_BINS: usize = 36;

/// Dominant gradient direction from a magnitude-weighted angle histogram.
///
/// The orientation is the left edge of the modal bin, so every keypoint gets
/// one of 36 discrete angles. Keypoints whose patch leaves the grid keep angle 0.
#[derive(Debug, Clone, Copy)]
pub struct OrientationEstimator {
    patch_size: usize,
}

impl OrientationEstimator {
    pub fn new(patch_size: usize) -> FastResult<Self> {
        if patch_size < 3 || patch_size % 2 == 0 {
            return Err(FastError::InvalidPatchSize(patch_size));
        }
        Ok(Self { patch_size })
    }

    pub fn patch_size(&self) -> usize {
        self.patch_size
    }

    /// Orientation in radians for the keypoint at `(x, y)`.
    pub fn estimate(&self, grid: &Grid, x: usize, y: usize) -> f32 {
        let half = self.patch_size / 2;
        if !grid.contains_patch(x, y, half) {
            return 0.0;
        }

        let n = self.patch_size;
        let mut patch = Vec::with_capacity(n * n);
        for yy in (y - half)..=(y + half) {
            for xx in (x - half)..=(x + half) {
                patch.push(grid.get(xx, yy) as f64);
            }
        }

        let hist = Self::histogram(&patch, n);
        let mut best_bin = 0;
        for (bin, &weight) in hist.iter().enumerate() {
            if weight > hist[best_bin] {
                best_bin = bin;
            }
        }
        bin_left_edge(best_bin)
    }

    /// New keypoint carrying the estimated orientation.
    pub fn assign(&self, grid: &Grid, kp: Keypoint) -> Keypoint {
        kp.with_angle(self.estimate(grid, kp.x, kp.y))
    }

    pub fn assign_all(&self, grid: &Grid, kps: &[Keypoint]) -> Vec<Keypoint> {
        kps.par_iter().map(|&kp| self.assign(grid, kp)).collect()
    }

    /// Magnitude-weighted histogram of Sobel gradient angles over an `n x n` patch.
    fn histogram(patch: &[f64], n: usize) -> [f64; ORIENTATION_BINS] {
        // reflect-101 border inside the patch
        let idx = |i: isize| -> usize {
            let n = n as isize;
            let r = if i < 0 {
                -i
            } else if i >= n {
                2 * n - 2 - i
            } else {
                i
            };
            r as usize
        };
        let at = |u: isize, v: isize| patch[idx(v) * n + idx(u)];

        let mut hist = [0.0f64; ORIENTATION_BINS];

        for v in 0..n as isize {
            for u in 0..n as isize {
                let gx = (at(u + 1, v - 1) + 2.0 * at(u + 1, v) + at(u + 1, v + 1))
                    - (at(u - 1, v - 1) + 2.0 * at(u - 1, v) + at(u - 1, v + 1));
                let gy = (at(u - 1, v + 1) + 2.0 * at(u, v + 1) + at(u + 1, v + 1))
                    - (at(u - 1, v - 1) + 2.0 * at(u, v - 1) + at(u + 1, v - 1));

                let magnitude = (gx * gx + gy * gy).sqrt();
                if magnitude == 0.0 {
                    continue;
                }
                let angle = gy.atan2(gx);
                let t = (angle + PI) / (2.0 * PI) * ORIENTATION_BINS as f64;
                let bin = (t.floor() as usize).min(ORIENTATION_BINS - 1);
                hist[bin] += magnitude;
            }
        }

        hist
    }
}

/// Left edge of histogram bin `bin`, in radians.
pub fn bin_left_edge(bin: usize) -> f32 {
    (-PI + bin as f64 * 2.0 * PI / ORIENTATION_BINS as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_grid(size: usize, left: u8, right: u8) -> Grid {
        let mut data = vec![left; size * size];
        for y in 0..size {
            for x in size / 2..size {
                data[y * size + x] = right;
            }
        }
        Grid::new(size, size, data).unwrap()
    }

    #[test]
    fn test_rejects_even_patch() {
        assert_eq!(
            OrientationEstimator::new(30).unwrap_err(),
            FastError::InvalidPatchSize(30)
        );
        assert!(OrientationEstimator::new(1).is_err());
    }

    #[test]
    fn test_patch_outside_grid_gives_zero() {
        let grid = step_grid(40, 0, 255);
        let est = OrientationEstimator::new(31).unwrap();
        assert_eq!(est.estimate(&grid, 10, 20), 0.0);
        assert_eq!(est.estimate(&grid, 20, 25), 0.0);
    }

    #[test]
    fn test_flat_patch_falls_into_first_bin() {
        let grid = Grid::filled(40, 40, 77).unwrap();
        let est = OrientationEstimator::new(31).unwrap();
        assert_eq!(est.estimate(&grid, 20, 20), bin_left_edge(0));
    }

    #[test]
    fn test_dark_to_bright_step_points_right() {
        let grid = step_grid(40, 10, 200);
        let est = OrientationEstimator::new(31).unwrap();
        let angle = est.estimate(&grid, 20, 20);
        assert!(angle.abs() < 1e-6, "expected 0, got {}", angle);
    }

    #[test]
    fn test_bright_to_dark_step_lands_in_last_bin() {
        let grid = step_grid(40, 200, 10);
        let est = OrientationEstimator::new(31).unwrap();
        let angle = est.estimate(&grid, 20, 20);
        assert_eq!(angle, bin_left_edge(ORIENTATION_BINS - 1));
    }

    #[test]
    fn test_assign_returns_new_values() {
        let grid = step_grid(40, 10, 200);
        let est = OrientationEstimator::new(31).unwrap();
        let kps = vec![Keypoint::new(20, 20), Keypoint::new(2, 2)];
        let oriented = est.assign_all(&grid, &kps);
        assert_eq!(kps[0].angle, 0.0);
        assert_eq!(oriented.len(), 2);
        assert_eq!((oriented[1].x, oriented[1].y, oriented[1].angle), (2, 2, 0.0));
    }

    #[test]
    fn test_bin_edges_span_circle() {
        assert!((bin_left_edge(0) + std::f32::consts::PI).abs() < 1e-6);
        assert!(bin_left_edge(18).abs() < 1e-6);
        let step = bin_left_edge(1) - bin_left_edge(0);
        assert!((step - 10f32.to_radians()).abs() < 1e-5);
    }
}
