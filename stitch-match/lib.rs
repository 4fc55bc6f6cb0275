//! Brute-force descriptor matching.
//!
//! Every query descriptor is compared with every reference descriptor; the
//! nearest and second-nearest neighbours feed the ratio test. Cost is
//! `O(|a| * |b| * bits)`.

use stitch_core::{Descriptor, Match};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum MatchError {
    InvalidRatio(f32),
    InsufficientMatches { minimum: usize, found: usize },
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::InvalidRatio(r) => {
                write!(f, "Invalid ratio: {} (must be in (0, 1])", r)
            }
            MatchError::InsufficientMatches { minimum, found } => {
                write!(f, "Too few good matches: {} (need more than {})", found, minimum)
            }
        }
    }
}

impl std::error::Error for MatchError {}

pub type MatchResult<T> = Result<T, MatchError>;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchConfig {
    /// Keep a match when `best < ratio * second`
    pub ratio: f32,
    /// A pair proceeds only with strictly more good matches than this
    pub min_good_matches: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ratio: 0.75,
            min_good_matches: 10,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> MatchResult<()> {
        if !(self.ratio > 0.0 && self.ratio <= 1.0) {
            return Err(MatchError::InvalidRatio(self.ratio));
        }
        Ok(())
    }
}

/// Number of differing bits.
///
/// # Panics
///
/// Panics if the descriptors differ in length.
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    assert_eq!(a.len(), b.len(), "descriptor length mismatch");
    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .map(|(&x, &y)| (x ^ y).count_ones())
        .sum()
}

/// Nearest and second-nearest neighbour in `b` for every descriptor in `a`.
///
/// Neighbours are found with strict comparisons in index order, so ties go
/// to the lowest index. An empty `b` gives no matches.
pub fn match_descriptors(a: &[Descriptor], b: &[Descriptor]) -> Vec<Match> {
    if b.is_empty() {
        return Vec::new();
    }

    a.par_iter()
        .enumerate()
        .map(|(query_index, q)| {
            let mut best: Option<(usize, u32)> = None;
            let mut second: Option<(usize, u32)> = None;

            for (j, d) in b.iter().enumerate() {
                let dist = hamming_distance(q, d);
                match best {
                    Some((_, bd)) if dist >= bd => {
                        if second.map_or(true, |(_, sd)| dist < sd) {
                            second = Some((j, dist));
                        }
                    }
                    _ => {
                        second = best;
                        best = Some((j, dist));
                    }
                }
            }

            // b is non-empty, so best is always set
            let (best_index, best_distance) = best.unwrap_or((0, u32::MAX));
            Match {
                query_index,
                best_index,
                best_distance,
                second_index: second.map(|(j, _)| j),
                second_distance: second.map(|(_, d)| d),
            }
        })
        .collect()
}

/// Matches passing the ratio test, in input order.
///
/// A match without a second neighbour is ambiguous by definition and is dropped.
pub fn ratio_filter(matches: &[Match], ratio: f32) -> Vec<Match> {
    matches
        .iter()
        .filter(|m| match m.second_distance {
            Some(second) => (m.best_distance as f32) < ratio * second as f32,
            None => false,
        })
        .copied()
        .collect()
}

/// `(query_index, best_index)` pairs passing the ratio test.
pub fn ratio_test(matches: &[Match], ratio: f32) -> Vec<(usize, usize)> {
    ratio_filter(matches, ratio)
        .into_iter()
        .map(|m| (m.query_index, m.best_index))
        .collect()
}

/// Matcher with a configured ratio and good-match floor
#[derive(Debug, Clone)]
pub struct BruteForceMatcher {
    config: MatchConfig,
}

impl BruteForceMatcher {
    pub fn new(config: MatchConfig) -> MatchResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn match_descriptors(&self, a: &[Descriptor], b: &[Descriptor]) -> Vec<Match> {
        match_descriptors(a, b)
    }

    /// Ratio-tested pairs, or `InsufficientMatches` when too few survive.
    pub fn good_matches(&self, a: &[Descriptor], b: &[Descriptor]) -> MatchResult<Vec<(usize, usize)>> {
        let matches = match_descriptors(a, b);
        let good = ratio_test(&matches, self.config.ratio);
        log::debug!(
            "matcher: {} queries, {} nearest neighbours, {} pass ratio {:.2}",
            a.len(),
            matches.len(),
            good.len(),
            self.config.ratio
        );

        if good.len() <= self.config.min_good_matches {
            return Err(MatchError::InsufficientMatches {
                minimum: self.config.min_good_matches,
                found: good.len(),
            });
        }
        Ok(good)
    }
}
