use std::path::PathBuf;

use stitch_brief::BriefError;
use stitch_compose::ComposeError;
use stitch_core::CoreError;
use stitch_fast::FastError;
use stitch_homography::HomographyError;
use stitch_match::MatchError;

#[derive(Debug)]
pub enum StitchError {
    Core(CoreError),
    Fast(FastError),
    Brief(BriefError),
    Match(MatchError),
    Homography(HomographyError),
    Compose(ComposeError),
    Image(image::ImageError),
    Io(std::io::Error),
    Config(String),
    NoImages(PathBuf),
}

impl std::fmt::Display for StitchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StitchError::Core(e) => write!(f, "Grid error: {}", e),
            StitchError::Fast(e) => write!(f, "Detector error: {}", e),
            StitchError::Brief(e) => write!(f, "Descriptor error: {}", e),
            StitchError::Match(e) => write!(f, "Matching error: {}", e),
            StitchError::Homography(e) => write!(f, "Homography error: {}", e),
            StitchError::Compose(e) => write!(f, "Compositing error: {}", e),
            StitchError::Image(e) => write!(f, "Image error: {}", e),
            StitchError::Io(e) => write!(f, "I/O error: {}", e),
            StitchError::Config(msg) => write!(f, "Configuration error: {}", msg),
            StitchError::NoImages(dir) => write!(f, "No images found in {}", dir.display()),
        }
    }
}

impl std::error::Error for StitchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StitchError::Core(e) => Some(e),
            StitchError::Fast(e) => Some(e),
            StitchError::Brief(e) => Some(e),
            StitchError::Match(e) => Some(e),
            StitchError::Homography(e) => Some(e),
            StitchError::Compose(e) => Some(e),
            StitchError::Image(e) => Some(e),
            StitchError::Io(e) => Some(e),
            StitchError::Config(_) | StitchError::NoImages(_) => None,
        }
    }
}

impl From<CoreError> for StitchError {
    fn from(err: CoreError) -> Self {
        StitchError::Core(err)
    }
}

impl From<FastError> for StitchError {
    fn from(err: FastError) -> Self {
        StitchError::Fast(err)
    }
}

impl From<BriefError> for StitchError {
    fn from(err: BriefError) -> Self {
        StitchError::Brief(err)
    }
}

impl From<MatchError> for StitchError {
    fn from(err: MatchError) -> Self {
        StitchError::Match(err)
    }
}

impl From<HomographyError> for StitchError {
    fn from(err: HomographyError) -> Self {
        StitchError::Homography(err)
    }
}

impl From<ComposeError> for StitchError {
    fn from(err: ComposeError) -> Self {
        StitchError::Compose(err)
    }
}

impl From<image::ImageError> for StitchError {
    fn from(err: image::ImageError) -> Self {
        StitchError::Image(err)
    }
}

impl From<std::io::Error> for StitchError {
    fn from(err: std::io::Error) -> Self {
        StitchError::Io(err)
    }
}

impl From<toml::de::Error> for StitchError {
    fn from(err: toml::de::Error) -> Self {
        StitchError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for StitchError {
    fn from(err: toml::ser::Error) -> Self {
        StitchError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for StitchError {
    fn from(err: serde_json::Error) -> Self {
        StitchError::Config(err.to_string())
    }
}

pub type StitchResult<T> = Result<T, StitchError>;
