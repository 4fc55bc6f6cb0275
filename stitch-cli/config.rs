use std::path::Path;

use serde::{Deserialize, Serialize};
use stitch_brief::PatternSpec;
use stitch_compose::CompositorConfig;
use stitch_fast::DetectorConfig;
use stitch_homography::RansacConfig;
use stitch_match::MatchConfig;

use crate::error::{StitchError, StitchResult};

/// Which ordered image pairs get stitched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairSelection {
    /// Every `(i, j)` with `i != j`
    #[default]
    AllOrdered,
    /// Only `(i, i + 1)`
    Adjacent,
}

impl PairSelection {
    pub fn pairs(self, n_images: usize) -> Vec<(usize, usize)> {
        match self {
            PairSelection::AllOrdered => (0..n_images)
                .flat_map(|i| (0..n_images).filter(move |&j| j != i).map(move |j| (i, j)))
                .collect(),
            PairSelection::Adjacent => (1..n_images).map(|j| (j - 1, j)).collect(),
        }
    }
}

/// Settings for every pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pairs: PairSelection,
    pub detector: DetectorConfig,
    pub descriptor: PatternSpec,
    pub matcher: MatchConfig,
    pub ransac: RansacConfig,
    pub compositor: CompositorConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> StitchResult<()> {
        self.detector.validate()?;
        self.descriptor.validate()?;
        self.matcher.validate()?;
        self.ransac.validate()?;
        self.compositor.validate()?;
        Ok(())
    }

    /// Override the corner threshold
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.detector.core.threshold = threshold;
        self
    }

    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.detector.core.n_threads = n_threads;
        self
    }

    pub fn with_pairs(mut self, pairs: PairSelection) -> Self {
        self.pairs = pairs;
        self
    }

    pub fn summary(&self) -> String {
        format!(
            "{} | pattern {}x{} pairs (seed {}) | ratio {:.2}, > {} matches | RANSAC {:.1}px x{} | {:?}",
            self.detector.summary(),
            self.descriptor.patch_size,
            self.descriptor.num_pairs,
            self.descriptor.seed,
            self.matcher.ratio,
            self.matcher.min_good_matches,
            self.ransac.threshold,
            self.ransac.max_iterations,
            self.pairs
        )
    }

    pub fn to_toml(&self) -> StitchResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml(toml_str: &str) -> StitchResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> StitchResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> StitchResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file, chosen by extension
    pub fn load<P: AsRef<Path>>(path: P) -> StitchResult<Self> {
        let path = path.as_ref();
        let ext = extension(path)?;
        let content = std::fs::read_to_string(path)?;
        match ext.as_str() {
            "toml" => Self::from_toml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> StitchResult<()> {
        let path = path.as_ref();
        let content = match extension(path)?.as_str() {
            "toml" => self.to_toml()?,
            _ => self.to_json()?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn extension(path: &Path) -> StitchResult<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "toml" | "json" => Ok(ext),
        _ => Err(StitchError::Config(format!(
            "unsupported config format: {} (expected .toml or .json)",
            path.display()
        ))),
    }
}
