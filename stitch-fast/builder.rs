use crate::error::FastResult;
use crate::detector::FastDetector;
use crate::config::DetectorConfig;

/// Builder for creating a `FastDetector`
#[derive(Debug, Clone, Default)]
pub struct DetectorBuilder {
    config: DetectorConfig,
}

impl DetectorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ring-test threshold; bounds saturate at the intensity range
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.config.core.threshold = threshold;
        self
    }

    /// Set the patch size for orientation calculation
    pub fn patch_size(mut self, patch_size: usize) -> Self {
        self.config.core.patch_size = patch_size;
        self
    }

    /// Set the number of threads for parallel processing
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.config.core.n_threads = n_threads;
        self
    }

    /// Set the scan margin of the ring test
    pub fn ring_radius(mut self, radius: usize) -> Self {
        self.config.ring_radius = radius;
        self
    }

    /// Set the half-size of the local-maximum window
    pub fn nms_radius(mut self, radius: usize) -> Self {
        self.config.nms_radius = radius;
        self
    }

    /// Enable the minimum-distance post-filter
    pub fn min_distance(mut self, distance: f32) -> Self {
        self.config.min_distance = Some(distance);
        self
    }

    /// Return raw suppressed detections without the distance filter
    pub fn without_min_distance(mut self) -> Self {
        self.config.min_distance = None;
        self
    }

    pub fn preset_dense(mut self) -> Self {
        let n_threads = self.config.core.n_threads;
        self.config = DetectorConfig::dense_preset();
        self.config.core.n_threads = n_threads;
        self
    }

    pub fn preset_sparse(mut self) -> Self {
        let n_threads = self.config.core.n_threads;
        self.config = DetectorConfig::sparse_preset();
        self.config.core.n_threads = n_threads;
        self
    }

    /// Build the `FastDetector`
    pub fn build(self) -> FastResult<FastDetector> {
        FastDetector::new(self.config)
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        self.config.summary()
    }

    /// Create a builder from an existing `DetectorConfig`
    pub fn from_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Convert the builder into a `DetectorConfig`
    pub fn to_config(self) -> DetectorConfig {
        self.config
    }
}
