use stitch_core::FeatureConfig;
use crate::error::{FastError, FastResult};

#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// Complete detector configuration with all settings
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorConfig {
    /// Threshold, orientation patch size, thread count
    pub core: FeatureConfig,
    /// Scan margin for the ring test
    pub ring_radius: usize,
    /// Half-size of the local-maximum window
    pub nms_radius: usize,
    /// Minimum keypoint separation; `None` leaves detector output unfiltered
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub min_distance: Option<f32>,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorConfig {
    /// Create new configuration with default settings
    pub fn new() -> Self {
        Self {
            core: FeatureConfig::default(),
            ring_radius: 3,
            nms_radius: 3,
            min_distance: None,
            name: None,
            description: None,
        }
    }

    /// Lower threshold for low-contrast photographs
    pub fn dense_preset() -> Self {
        Self {
            core: FeatureConfig {
                threshold: 40,
                ..FeatureConfig::default()
            },
            name: Some("Dense".to_string()),
            description: Some("Low threshold, many keypoints per image".to_string()),
            ..Self::new()
        }
    }

    /// Well-separated keypoints for large, busy images
    pub fn sparse_preset() -> Self {
        Self {
            core: FeatureConfig {
                threshold: 60,
                ..FeatureConfig::default()
            },
            nms_radius: 5,
            min_distance: Some(10.0),
            name: Some("Sparse".to_string()),
            description: Some("Keypoints at least 10 pixels apart".to_string()),
            ..Self::new()
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        let min_distance = match self.min_distance {
            Some(d) => format!("{:.1}", d),
            None => "off".to_string(),
        };
        format!(
            "DetectorConfig: threshold={}, ring_radius={}, nms_radius={}, min_distance={}, patch_size={}, threads={}",
            self.core.threshold, self.ring_radius, self.nms_radius, min_distance,
            self.core.patch_size, self.core.n_threads
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> FastResult<()> {
        // 0 would accept every ring sample
        if self.core.threshold == 0 {
            return Err(FastError::InvalidThreshold(self.core.threshold));
        }
        if self.ring_radius < 3 {
            return Err(FastError::InvalidRingRadius(self.ring_radius));
        }
        if self.nms_radius == 0 {
            return Err(FastError::InvalidNmsRadius(self.nms_radius));
        }
        if self.core.patch_size < 3 || self.core.patch_size % 2 == 0 {
            return Err(FastError::InvalidPatchSize(self.core.patch_size));
        }
        if let Some(d) = self.min_distance {
            if !d.is_finite() || d < 0.0 {
                return Err(FastError::InvalidMinDistance(d));
            }
        }
        Ok(())
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(DetectorConfig::new().validate().is_ok());
        assert!(DetectorConfig::dense_preset().validate().is_ok());
        assert!(DetectorConfig::sparse_preset().validate().is_ok());
        assert_eq!(DetectorConfig::new().min_distance, None);
    }

    #[test]
    fn test_validation_errors() {
        let mut cfg = DetectorConfig::new();
        cfg.core.threshold = 0;
        assert_eq!(cfg.validate(), Err(FastError::InvalidThreshold(0)));
        cfg.core.threshold = 150;
        assert!(cfg.validate().is_ok());

        let mut cfg = DetectorConfig::new();
        cfg.ring_radius = 2;
        assert_eq!(cfg.validate(), Err(FastError::InvalidRingRadius(2)));

        let mut cfg = DetectorConfig::new();
        cfg.core.patch_size = 32;
        assert_eq!(cfg.validate(), Err(FastError::InvalidPatchSize(32)));

        let mut cfg = DetectorConfig::new();
        cfg.min_distance = Some(f32::NAN);
        assert!(matches!(cfg.validate(), Err(FastError::InvalidMinDistance(_))));
    }

    #[test]
    fn test_summary_mentions_filter_state() {
        assert!(DetectorConfig::new().summary().contains("min_distance=off"));
        assert!(DetectorConfig::sparse_preset().summary().contains("min_distance=10.0"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_toml_round_trip_keeps_metadata() {
        let cfg = DetectorConfig::sparse_preset().with_metadata("Field", "Outdoor captures");
        let text = cfg.to_toml().unwrap();
        let loaded = DetectorConfig::from_toml(&text).unwrap();
        assert_eq!(loaded.name.as_deref(), Some("Field"));
        assert_eq!(loaded.min_distance, Some(10.0));
        assert_eq!(loaded.nms_radius, 5);
    }
}
