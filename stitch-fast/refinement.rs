use stitch_core::{Grid, Keypoint};
use crate::types::ScoredKeypoint;
use rayon::prelude::*;

/// Keypoint refinement after the ring test
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// Local-maximum suppression over the candidate response map.
    ///
    /// The map holds each candidate's response at its location and zero
    /// elsewhere. A candidate survives when its response equals the map maximum
    /// inside the `(2 * radius + 1)^2` window around it, clipped to the grid.
    /// Equal neighbours therefore all survive.
    pub fn local_maximum_suppression(
        grid: &Grid,
        candidates: &[ScoredKeypoint],
        radius: usize,
    ) -> Vec<ScoredKeypoint> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let (w, h) = grid.dimensions();
        let mut response_map = vec![0u8; w * h];
        for c in candidates {
            response_map[c.keypoint.y * w + c.keypoint.x] = c.response;
        }

        candidates
            .par_iter()
            .filter(|c| {
                let (cx, cy) = (c.keypoint.x, c.keypoint.y);
                let x0 = cx.saturating_sub(radius);
                let y0 = cy.saturating_sub(radius);
                let x1 = (cx + radius).min(w - 1);
                let y1 = (cy + radius).min(h - 1);

                let mut window_max = 0u8;
                for yy in y0..=y1 {
                    let row = &response_map[yy * w + x0..=yy * w + x1];
                    if let Some(&m) = row.iter().max() {
                        window_max = window_max.max(m);
                    }
                }
                c.response == window_max
            })
            .copied()
            .collect()
    }

    /// Greedy minimum-distance filter in input order.
    ///
    /// A keypoint is kept when no previously kept keypoint lies strictly closer
    /// than `min_distance`, so the first-seen point of a cluster wins.
    pub fn min_distance_filter(keypoints: &[Keypoint], min_distance: f32) -> Vec<Keypoint> {
        let min_distance_sq = min_distance * min_distance;
        let mut kept: Vec<Keypoint> = Vec::with_capacity(keypoints.len());

        for candidate in keypoints {
            let too_close = kept
                .iter()
                .any(|accepted| candidate.distance_sq(accepted) < min_distance_sq);
            if !too_close {
                kept.push(*candidate);
            }
        }

        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CornerType;

    fn scored(x: usize, y: usize, response: u8) -> ScoredKeypoint {
        ScoredKeypoint {
            keypoint: Keypoint::new(x, y),
            response,
            corner_type: CornerType::Dark,
        }
    }

    #[test]
    fn test_suppression_keeps_strongest_in_window() {
        let grid = Grid::filled(20, 20, 0).unwrap();
        let candidates = vec![scored(5, 5, 200), scored(6, 5, 250), scored(15, 15, 90)];
        let kept = KeypointRefinement::local_maximum_suppression(&grid, &candidates, 3);
        let positions: Vec<_> = kept.iter().map(|c| (c.keypoint.x, c.keypoint.y)).collect();
        assert_eq!(positions, vec![(6, 5), (15, 15)]);
    }

    #[test]
    fn test_suppression_keeps_equal_neighbours() {
        let grid = Grid::filled(20, 20, 0).unwrap();
        let candidates = vec![scored(5, 5, 250), scored(7, 5, 250)];
        let kept = KeypointRefinement::local_maximum_suppression(&grid, &candidates, 3);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_suppression_window_is_clipped_at_border() {
        let grid = Grid::filled(8, 8, 0).unwrap();
        let candidates = vec![scored(0, 0, 10), scored(7, 7, 10)];
        let kept = KeypointRefinement::local_maximum_suppression(&grid, &candidates, 3);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_min_distance_first_seen_wins() {
        let kps = vec![
            Keypoint::new(10, 10),
            Keypoint::new(15, 10),
            Keypoint::new(30, 10),
            Keypoint::new(10, 19),
        ];
        let kept = KeypointRefinement::min_distance_filter(&kps, 10.0);
        let positions: Vec<_> = kept.iter().map(|k| (k.x, k.y)).collect();
        assert_eq!(positions, vec![(10, 10), (30, 10)]);
    }

    #[test]
    fn test_min_distance_boundary_is_kept() {
        let kps = vec![Keypoint::new(0, 0), Keypoint::new(10, 0)];
        assert_eq!(KeypointRefinement::min_distance_filter(&kps, 10.0).len(), 2);
    }

    #[test]
    fn test_min_distance_result_is_well_separated() {
        let kps: Vec<_> = (0..40).map(|i| Keypoint::new((i * 7) % 50, (i * 3) % 50)).collect();
        let kept = KeypointRefinement::min_distance_filter(&kps, 8.0);
        for i in 0..kept.len() {
            for j in (i + 1)..kept.len() {
                assert!(kept[i].distance_sq(&kept[j]) >= 64.0);
            }
        }
    }
}
