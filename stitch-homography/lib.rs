//! Planar homography estimation: DLT on conditioned points and a seeded
//! RANSAC wrapper that tolerates mismatched correspondences.

use nalgebra::Matrix3;

mod dlt;
mod ransac;

pub use dlt::{estimate_homography_dlt, project, reprojection_error, MIN_POINTS};
pub use ransac::{HomographyEstimator, RansacConfig};

#[derive(Debug, Clone, PartialEq)]
pub enum HomographyError {
    TooFewPoints { needed: usize, got: usize },
    LengthMismatch { src: usize, dst: usize },
    InsufficientInliers { needed: usize, found: usize },
    NumericalFailure(String),
    InvalidConfig(String),
}

impl std::fmt::Display for HomographyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HomographyError::TooFewPoints { needed, got } => {
                write!(f, "Too few correspondences: need {}, got {}", needed, got)
            }
            HomographyError::LengthMismatch { src, dst } => {
                write!(f, "Point set length mismatch: {} source vs {} destination", src, dst)
            }
            HomographyError::InsufficientInliers { needed, found } => {
                write!(f, "Insufficient inliers: need {}, found {}", needed, found)
            }
            HomographyError::NumericalFailure(msg) => write!(f, "Numerical failure: {}", msg),
            HomographyError::InvalidConfig(msg) => write!(f, "Invalid RANSAC config: {}", msg),
        }
    }
}

impl std::error::Error for HomographyError {}

pub type HomographyResult<T> = Result<T, HomographyError>;

/// Estimated transform plus which correspondences agreed with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Homography {
    matrix: Matrix3<f64>,
    inlier_mask: Vec<bool>,
}

impl Homography {
    pub fn new(matrix: Matrix3<f64>, inlier_mask: Vec<bool>) -> Self {
        Self { matrix, inlier_mask }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vec::new())
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// One flag per input correspondence
    pub fn inlier_mask(&self) -> &[bool] {
        &self.inlier_mask
    }

    pub fn n_inliers(&self) -> usize {
        self.inlier_mask.iter().filter(|&&m| m).count()
    }

    pub fn project(&self, p: [f64; 2]) -> [f64; 2] {
        project(&self.matrix, p)
    }

    /// Inverse transform, `None` when the matrix is singular
    pub fn inverse(&self) -> Option<Matrix3<f64>> {
        self.matrix.try_inverse()
    }
}
