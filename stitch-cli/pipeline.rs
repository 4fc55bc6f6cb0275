use image::RgbImage;
use rayon::prelude::*;
use stitch_brief::BriefGenerator;
use stitch_compose::Compositor;
use stitch_core::{init_thread_pool, Descriptor, Grid, Keypoint};
use stitch_fast::{BorderFilter, FastDetector, KeypointFilter};
use stitch_homography::{Homography, HomographyEstimator};
use stitch_match::BruteForceMatcher;

use crate::config::PipelineConfig;
use crate::error::StitchResult;
use crate::io::Frame;

/// Oriented keypoints and their descriptors, index-aligned
#[derive(Debug, Clone, Default)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Result of stitching frame `i` onto frame `j`
#[derive(Debug, Clone)]
pub struct PairComposite {
    pub i: usize,
    pub j: usize,
    pub homography: Homography,
    pub image: RgbImage,
}

/// Full pipeline: detect, orient, describe, match, estimate, composite.
pub struct Stitcher {
    config: PipelineConfig,
    detector: FastDetector,
    brief: BriefGenerator,
    matcher: BruteForceMatcher,
    estimator: HomographyEstimator,
    compositor: Compositor,
}

impl Stitcher {
    pub fn new(config: PipelineConfig) -> StitchResult<Self> {
        config.validate()?;

        // The global pool can only be built once per process
        if let Err(e) = init_thread_pool(config.detector.core.n_threads) {
            log::debug!("keeping existing thread pool: {}", e);
        }

        Ok(Self {
            detector: FastDetector::new(config.detector.clone())?,
            brief: BriefGenerator::from_spec(&config.descriptor)?,
            matcher: BruteForceMatcher::new(config.matcher)?,
            estimator: HomographyEstimator::new(config.ransac)?,
            compositor: Compositor::new(config.compositor)?,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Keypoints that survive detection and lie inside every sampling patch
    pub fn detect(&self, grid: &Grid) -> Vec<Keypoint> {
        let patch = self.config.descriptor.patch_size.max(self.config.detector.core.patch_size);
        let detected = self.detector.detect_keypoints(grid);
        let n_detected = detected.len();
        let inside = BorderFilter::for_patch(grid, patch).apply(detected);
        log::debug!("{} keypoints, {} clear of the {}px border", n_detected, inside.len(), patch / 2);
        self.detector.orient(grid, &inside)
    }

    pub fn extract(&self, grid: &Grid) -> Features {
        let keypoints = self.detect(grid);
        let descriptors = self.brief.generate_descriptors(grid, &keypoints);
        Features { keypoints, descriptors }
    }

    /// Align `a` onto `b` and composite them.
    pub fn stitch_pair(
        &self,
        a: &Frame,
        features_a: &Features,
        b: &Frame,
        features_b: &Features,
    ) -> StitchResult<(Homography, RgbImage)> {
        let good = self.matcher.good_matches(&features_a.descriptors, &features_b.descriptors)?;
        let (src, dst): (Vec<[f64; 2]>, Vec<[f64; 2]>) = good
            .iter()
            .map(|&(q, t)| (features_a.keypoints[q].position(), features_b.keypoints[t].position()))
            .unzip();

        let homography = self.estimator.estimate(&src, &dst)?;
        let image = self.compositor.compose(&a.color, &b.color, &homography)?;
        Ok((homography, image))
    }

    /// Composites for every selected pair; failing pairs are logged and skipped.
    pub fn stitch_all(&self, frames: &[Frame]) -> Vec<PairComposite> {
        let features: Vec<Features> = frames.par_iter().map(|f| self.extract(&f.grid)).collect();
        for (frame, f) in frames.iter().zip(&features) {
            log::info!("{}: {} keypoints", frame.name, f.len());
        }

        let pairs = self.config.pairs.pairs(frames.len());
        let composites: Vec<PairComposite> = pairs
            .par_iter()
            .filter_map(|&(i, j)| {
                match self.stitch_pair(&frames[i], &features[i], &frames[j], &features[j]) {
                    Ok((homography, image)) => Some(PairComposite { i, j, homography, image }),
                    Err(e) => {
                        log::warn!("skipping pair ({}, {}): {}", i, j, e);
                        None
                    }
                }
            })
            .collect();

        log::info!("{} of {} pairs stitched", composites.len(), pairs.len());
        composites
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StitchError;
    use stitch_match::MatchError;

    #[test]
    fn test_flat_frames_are_skipped() {
        let stitcher = Stitcher::new(PipelineConfig::default()).unwrap();
        let frames = vec![
            Frame::from_grid("a", Grid::filled(64, 64, 80).unwrap()),
            Frame::from_grid("b", Grid::filled(64, 64, 80).unwrap()),
        ];
        let features = stitcher.extract(&frames[0].grid);
        assert!(features.is_empty());

        let err = stitcher
            .stitch_pair(&frames[0], &features, &frames[1], &features)
            .unwrap_err();
        assert!(matches!(err, StitchError::Match(MatchError::InsufficientMatches { found: 0, .. })));
        assert!(stitcher.stitch_all(&frames).is_empty());
    }

    #[test]
    fn test_keypoints_clear_the_patch_border() {
        let stitcher = Stitcher::new(PipelineConfig::default().with_threshold(50)).unwrap();
        let mut data = vec![0u8; 60 * 60];
        for &(x, y) in &[(5usize, 5usize), (30, 30), (54, 30), (30, 10)] {
            data[y * 60 + x] = 200;
        }
        let grid = Grid::new(60, 60, data).unwrap();
        let features = stitcher.extract(&grid);
        let positions: Vec<(usize, usize)> = features.keypoints.iter().map(|k| (k.x, k.y)).collect();
        assert_eq!(positions, vec![(30, 30)]);
        assert_eq!(features.descriptors.len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = PipelineConfig::default();
        config.ransac.max_iterations = 0;
        assert!(matches!(Stitcher::new(config), Err(StitchError::Homography(_))));
    }
}
