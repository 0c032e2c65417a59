//! # Comparator Module
//!
//! Groups visually similar images and picks a canonical best shot per group.
//!
//! ## How It Works
//! 1. Pair distance = minimum Hamming distance across the three hash families
//! 2. A greedy seed scan claims every image within the similar tier
//! 3. A weighted quality/aesthetic blend selects each group's best shot
//!
//! ## Similarity Tiers
//! | Min distance | Classification |
//! |--------------|----------------|
//! | 0-5          | duplicate      |
//! | 6-10         | near_duplicate |
//! | 11-15        | similar        |
//! | 16+          | unrelated      |

mod grouper;
mod selector;

pub use grouper::GreedyGrouper;
pub use selector::{BestShotSelector, SelectionWeights};

use crate::core::hasher::HASH_BITS;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// How tightly a group's members resemble each other. Ordered tightest
/// first, so the minimum over observed classes is the strongest claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityClass {
    /// Minimum distance within the duplicate threshold
    Duplicate,
    /// Within the near-duplicate threshold
    NearDuplicate,
    /// Within the similar threshold
    Similar,
}

impl std::fmt::Display for SimilarityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityClass::Duplicate => write!(f, "duplicate"),
            SimilarityClass::NearDuplicate => write!(f, "near_duplicate"),
            SimilarityClass::Similar => write!(f, "similar"),
        }
    }
}

/// The three distance thresholds, in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityTiers {
    pub duplicate: u32,
    pub near_duplicate: u32,
    pub similar: u32,
}

impl Default for SimilarityTiers {
    fn default() -> Self {
        Self {
            duplicate: 5,
            near_duplicate: 10,
            similar: 15,
        }
    }
}

impl SimilarityTiers {
    /// Thresholds must fit in the hash bit-length and be ordered
    /// tightest-to-loosest.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("duplicate", self.duplicate),
            ("near_duplicate", self.near_duplicate),
            ("similar", self.similar),
        ] {
            if value > HASH_BITS {
                return Err(ConfigError::ThresholdOutOfRange {
                    name,
                    value,
                    max: HASH_BITS,
                });
            }
        }
        if self.duplicate > self.near_duplicate || self.near_duplicate > self.similar {
            return Err(ConfigError::UnorderedTiers {
                duplicate: self.duplicate,
                near_duplicate: self.near_duplicate,
                similar: self.similar,
            });
        }
        Ok(())
    }

    /// Classify a pair distance, or `None` beyond the similar tier.
    /// The incomparable sentinel distance always lands beyond it.
    pub fn classify(&self, distance: u32) -> Option<SimilarityClass> {
        if distance <= self.duplicate {
            Some(SimilarityClass::Duplicate)
        } else if distance <= self.near_duplicate {
            Some(SimilarityClass::NearDuplicate)
        } else if distance <= self.similar {
            Some(SimilarityClass::Similar)
        } else {
            None
        }
    }
}

/// A group of visually similar images.
///
/// Produced by the grouper with `selected_best` unset; only the best-shot
/// selector fills it in. Members are never deleted or merged here — acting
/// on duplicates is the caller's decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityGroup {
    /// Deterministic sequential id (`group_0`, `group_1`, ...)
    pub group_id: String,
    /// Member ids in stable processing order, always >= 2
    pub image_ids: Vec<String>,
    /// Tightest tier observed between the seed and any member
    pub similarity_type: SimilarityClass,
    /// Minimum pair distance observed within the group
    pub similarity_metric: u32,
    /// The canonical image, one of `image_ids`
    pub selected_best: Option<String>,
}

impl SimilarityGroup {
    /// Members that are not the selected best (candidates for culling).
    pub fn redundant_count(&self) -> usize {
        self.image_ids.len().saturating_sub(1)
    }
}
