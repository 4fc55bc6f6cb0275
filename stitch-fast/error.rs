#[derive(Debug, Clone, PartialEq)]
pub enum FastError {
    InvalidThreshold(u8),
    InvalidRingRadius(usize),
    InvalidNmsRadius(usize),
    InvalidPatchSize(usize),
    InvalidMinDistance(f32),
}

impl std::fmt::Display for FastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FastError::InvalidThreshold(t) => {
                write!(f, "Invalid threshold: {} (must be at least 1)", t)
            }
            FastError::InvalidRingRadius(r) => {
                write!(f, "Invalid ring radius: {} (must be >= 3)", r)
            }
            FastError::InvalidNmsRadius(r) => {
                write!(f, "Invalid suppression radius: {} (must be > 0)", r)
            }
            FastError::InvalidPatchSize(p) => {
                write!(f, "Invalid orientation patch size: {} (must be odd and >= 3)", p)
            }
            FastError::InvalidMinDistance(d) => {
                write!(f, "Invalid minimum keypoint distance: {} (must be finite and >= 0)", d)
            }
        }
    }
}

impl std::error::Error for FastError {}

pub type FastResult<T> = Result<T, FastError>;
