use stitch_core::{Grid, Keypoint};
use crate::types::{CornerType, ScoredKeypoint};
use rayon::prelude::*;

/// Ring-test corner detection
pub struct CornerDetector;

impl CornerDetector {
    /// Radius of the sampling ring
    pub const RING_RADIUS: usize = 3;

    /// Ring samples that must agree for a candidate
    pub const MIN_COUNT: usize = 12;

    /// Bresenham circle of radius 3, walked clockwise from the left
    pub const RING_OFFSETS: [(i32, i32); 16] = [
        (-3, 0), (-3, 1), (-2, 2), (-1, 3),
        (0, 3), (1, 3), (2, 2), (3, 1),
        (3, 0), (3, -1), (2, -2), (1, -3),
        (0, -3), (-1, -3), (-2, -2), (-3, -1),
    ];

    /// Scan margin for a requested ring radius. The ring itself always has radius 3.
    pub fn margin(ring_radius: usize) -> usize {
        ring_radius.max(Self::RING_RADIUS)
    }

    /// Classify the pixel at `(x, y)`.
    ///
    /// The ring must lie inside the grid; callers guarantee this through [`Self::margin`].
    /// Brighter means strictly above `center + threshold`, darker strictly below
    /// `center - threshold`, both bounds clamped to `0..=255`. Only the global count
    /// matters, the samples need not form a contiguous arc.
    pub fn classify(grid: &Grid, x: usize, y: usize, threshold: u8) -> CornerType {
        let center = grid.get(x, y) as i32;
        let upper = (center + threshold as i32).min(255);
        let lower = (center - threshold as i32).max(0);

        let mut brighter = 0;
        let mut darker = 0;
        for &(dx, dy) in &Self::RING_OFFSETS {
            let q = grid.get((x as i32 + dx) as usize, (y as i32 + dy) as usize) as i32;
            if q > upper {
                brighter += 1;
            } else if q < lower {
                darker += 1;
            }
        }

        if brighter >= Self::MIN_COUNT {
            CornerType::Bright
        } else if darker >= Self::MIN_COUNT {
            CornerType::Dark
        } else {
            CornerType::None
        }
    }

    /// Every pixel passing the ring test, in row-major order.
    pub fn detect_candidates(grid: &Grid, threshold: u8, ring_radius: usize) -> Vec<ScoredKeypoint> {
        let m = Self::margin(ring_radius);
        let (w, h) = grid.dimensions();
        if w < 2 * m + 1 || h < 2 * m + 1 {
            return Vec::new();
        }

        (m..h - m)
            .into_par_iter()
            .flat_map_iter(|y| {
                (m..w - m).filter_map(move |x| match Self::classify(grid, x, y, threshold) {
                    CornerType::None => None,
                    corner_type => Some(ScoredKeypoint {
                        keypoint: Keypoint::new(x, y),
                        response: grid.get(x, y),
                        corner_type,
                    }),
                })
            })
            .collect()
    }
}
