#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    EmptyGrid { width: usize, height: usize },
    InvalidGridData { expected_len: usize, actual_len: usize },
    NonRectangular { row: usize, expected_width: usize, actual_width: usize },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::EmptyGrid { width, height } => {
                write!(f, "Empty grid: {}x{} (both dimensions must be > 0)", width, height)
            }
            CoreError::InvalidGridData { expected_len, actual_len } => {
                write!(f, "Grid data length mismatch: expected {}, got {}", expected_len, actual_len)
            }
            CoreError::NonRectangular { row, expected_width, actual_width } => {
                write!(
                    f,
                    "Non-rectangular grid: row {} has {} samples, expected {}",
                    row, actual_width, expected_width
                )
            }
        }
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;

/// Row-major single-channel 8-bit intensity grid.
///
/// Construction validates the shape; once built a grid is never mutated and
/// every pipeline stage borrows it read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Grid {
    /// Wrap a row-major buffer of `width * height` samples.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::EmptyGrid { width, height });
        }
        let expected_len = width * height;
        if data.len() != expected_len {
            return Err(CoreError::InvalidGridData {
                expected_len,
                actual_len: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Grid where every sample has the same intensity.
    pub fn filled(width: usize, height: usize, value: u8) -> CoreResult<Self> {
        Self::new(width, height, vec![value; width * height])
    }

    /// Build a grid from rows; every row must have the same length.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> CoreResult<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(CoreError::EmptyGrid { width, height });
        }

        let mut data = Vec::with_capacity(width * height);
        for (row, r) in rows.iter().enumerate() {
            let r = r.as_ref();
            if r.len() != width {
                return Err(CoreError::NonRectangular {
                    row,
                    expected_width: width,
                    actual_width: r.len(),
                });
            }
            data.extend_from_slice(r);
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Sample at `(x, y)`. Panics when out of bounds.
    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Sample at signed coordinates, `None` outside the grid.
    #[inline]
    pub fn get_checked(&self, x: i64, y: i64) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.data[y as usize * self.width + x as usize])
    }

    /// True when the square of half-size `half` centered on `(x, y)` lies inside the grid.
    #[inline]
    pub fn contains_patch(&self, x: usize, y: usize, half: usize) -> bool {
        x >= half && y >= half && x + half < self.width && y + half < self.height
    }
}

/// Detected point of interest with its dominant orientation (radians).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: usize,
    pub y: usize,
    pub angle: f32,
    pub scale: f32,
}

impl Keypoint {
    /// Fresh detector output: angle 0, unit scale.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y, angle: 0.0, scale: 1.0 }
    }

    /// Copy of this keypoint carrying `angle`.
    pub fn with_angle(self, angle: f32) -> Self {
        Self { angle, ..self }
    }

    pub fn distance_sq(&self, other: &Keypoint) -> f32 {
        let dx = self.x as f32 - other.x as f32;
        let dy = self.y as f32 - other.y as f32;
        dx * dx + dy * dy
    }

    pub fn position(&self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }
}

/// Packed binary descriptor. Bit `i` lives in byte `i / 8` at position `i % 8`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    bytes: Vec<u8>,
    n_bits: usize,
}

impl Descriptor {
    pub fn zeros(n_bits: usize) -> Self {
        Self {
            bytes: vec![0; n_bits.div_ceil(8)],
            n_bits,
        }
    }

    pub fn from_bits(bits: &[bool]) -> Self {
        let mut d = Self::zeros(bits.len());
        for (i, &b) in bits.iter().enumerate() {
            d.set(i, b);
        }
        d
    }

    /// Set bit `i`. Panics when `i` is out of range.
    #[inline]
    pub fn set(&mut self, i: usize, bit: bool) {
        assert!(i < self.n_bits, "bit {} out of range for {}-bit descriptor", i, self.n_bits);
        if bit {
            self.bytes[i / 8] |= 1 << (i % 8);
        } else {
            self.bytes[i / 8] &= !(1 << (i % 8));
        }
    }

    #[inline]
    pub fn bit(&self, i: usize) -> bool {
        (self.bytes[i / 8] >> (i % 8)) & 1 == 1
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.n_bits
    }

    pub fn is_empty(&self) -> bool {
        self.n_bits == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn count_ones(&self) -> u32 {
        self.bytes.iter().map(|b| b.count_ones()).sum()
    }
}

/// Nearest and second-nearest neighbour of one query descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Match {
    pub query_index: usize,
    pub best_index: usize,
    pub best_distance: u32,
    pub second_index: Option<usize>,
    pub second_distance: Option<u32>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureConfig {
    pub threshold: u8,
    pub patch_size: usize,
    pub n_threads: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            threshold: 100,
            patch_size: 31,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_grid_rejects_empty() {
        assert!(matches!(Grid::new(0, 10, vec![]), Err(CoreError::EmptyGrid { .. })));
        assert!(matches!(Grid::filled(10, 0, 0), Err(CoreError::EmptyGrid { .. })));
        let rows: Vec<Vec<u8>> = Vec::new();
        assert!(matches!(Grid::from_rows(&rows), Err(CoreError::EmptyGrid { .. })));
    }

    #[test]
    fn test_grid_rejects_wrong_length() {
        let result = Grid::new(4, 4, vec![0; 15]);
        assert_eq!(
            result,
            Err(CoreError::InvalidGridData { expected_len: 16, actual_len: 15 })
        );
    }

    #[test]
    fn test_grid_rejects_ragged_rows() {
        let rows = vec![vec![1u8, 2, 3], vec![4, 5], vec![6, 7, 8]];
        let result = Grid::from_rows(&rows);
        assert_eq!(
            result,
            Err(CoreError::NonRectangular { row: 1, expected_width: 3, actual_width: 2 })
        );
    }

    #[test]
    fn test_grid_access() {
        let grid = Grid::from_rows(&[[1u8, 2, 3], [4, 5, 6]]).unwrap();
        assert_eq!(grid.dimensions(), (3, 2));
        assert_eq!(grid.get(2, 1), 6);
        assert_eq!(grid.get_checked(-1, 0), None);
        assert_eq!(grid.get_checked(3, 0), None);
        assert_eq!(grid.get_checked(0, 1), Some(4));
    }

    #[test]
    fn test_contains_patch() {
        let grid = Grid::filled(31, 31, 0).unwrap();
        assert!(grid.contains_patch(15, 15, 15));
        assert!(!grid.contains_patch(14, 15, 15));
        assert!(!grid.contains_patch(16, 15, 15));
    }

    #[test]
    fn test_keypoint_with_angle_keeps_position() {
        let kp = Keypoint::new(4, 7);
        assert_eq!(kp.angle, 0.0);
        assert_eq!(kp.scale, 1.0);
        let oriented = kp.with_angle(1.25);
        assert_eq!((oriented.x, oriented.y, oriented.angle), (4, 7, 1.25));
        assert_eq!(kp.angle, 0.0);
    }

    #[test]
    fn test_descriptor_bit_layout() {
        let mut d = Descriptor::zeros(12);
        assert_eq!(d.as_bytes().len(), 2);
        d.set(0, true);
        d.set(9, true);
        assert_eq!(d.as_bytes(), &[0b0000_0001, 0b0000_0010]);
        assert!(d.bit(9));
        d.set(9, false);
        assert!(!d.bit(9));
        assert_eq!(d.count_ones(), 1);
    }

    proptest! {
        #[test]
        fn prop_descriptor_popcount_matches_set_bits(bits in proptest::collection::vec(any::<bool>(), 1..300)) {
            let d = Descriptor::from_bits(&bits);
            prop_assert_eq!(d.len(), bits.len());
            prop_assert_eq!(d.count_ones() as usize, bits.iter().filter(|&&b| b).count());
        }
    }
}
