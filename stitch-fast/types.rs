use stitch_core::Keypoint;

/// Raw corner candidate. `response` is the center intensity, which is what
/// local-maximum suppression compares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredKeypoint {
    pub keypoint: Keypoint,
    pub response: u8,
    pub corner_type: CornerType,
}

/// Outcome of the ring test at one pixel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CornerType {
    Bright,
    Dark,
    None,
}
