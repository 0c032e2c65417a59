//! Best-shot selection within a similarity group.
//!
//! The canonical image is the member with the highest weighted blend of
//! technical quality and external aesthetic score. Ties break on higher
//! original resolution, then on earliest position in the group's stable
//! member order, so selection is fully deterministic.

use super::SimilarityGroup;
use crate::core::types::ImageRecord;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Integer-percent weights of the selection blend. The combined score is an
/// exact integer (`quality*q + aesthetic*a`, 100x the fractional blend), so
/// equal blends compare equal and the resolution tie-break actually fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionWeights {
    pub quality: u32,
    pub aesthetic: u32,
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            quality: 40,
            aesthetic: 60,
        }
    }
}

impl SelectionWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.quality + self.aesthetic;
        if sum != 100 {
            return Err(ConfigError::WeightSum {
                name: "selection",
                sum,
            });
        }
        Ok(())
    }
}

/// Picks the canonical image of a group.
pub struct BestShotSelector {
    weights: SelectionWeights,
}

impl BestShotSelector {
    /// Weights must already be validated.
    pub fn new(weights: SelectionWeights) -> Self {
        Self { weights }
    }

    /// Combined score of one record, in hundredths.
    pub fn combined_score(&self, record: &ImageRecord) -> u32 {
        u32::from(record.quality_score) * self.weights.quality
            + u32::from(record.aesthetic_score) * self.weights.aesthetic
    }

    /// Select the best member of a group.
    ///
    /// Members are considered in `image_ids` order; a later member must be
    /// strictly better (score, then resolution) to displace the incumbent,
    /// which makes the earliest member win any remaining tie. Ids missing
    /// from the record map are skipped; `None` only when nothing resolves.
    pub fn select(
        &self,
        group: &SimilarityGroup,
        records: &HashMap<&str, &ImageRecord>,
    ) -> Option<String> {
        let mut best: Option<(u32, u64, &str)> = None;

        for image_id in &group.image_ids {
            let Some(record) = records.get(image_id.as_str()) else {
                continue;
            };

            let score = self.combined_score(record);
            let displaces = match best {
                None => true,
                Some((best_score, best_resolution, _)) => {
                    score > best_score
                        || (score == best_score && record.resolution_pixels > best_resolution)
                }
            };
            if displaces {
                best = Some((score, record.resolution_pixels, image_id));
            }
        }

        best.map(|(_, _, image_id)| image_id.to_string())
    }
}
