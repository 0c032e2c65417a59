//! Greedy seed-scan grouping over pairwise fingerprint distance.
//!
//! Each unclaimed image in turn becomes a seed and claims every later
//! unclaimed image within the similar tier *of the seed*. Membership is
//! deliberately not transitive: an absorbed member never recruits its own
//! neighbours, so two members of one group may be farther apart than the
//! similar threshold. Burst sequences and bracketed exposures collapsing
//! into one group is intended behavior for a review workflow.
//!
//! O(n²) pairwise comparisons - fine for batches up to low thousands of
//! images, not millions.

use super::{SimilarityGroup, SimilarityTiers};
use crate::core::types::ImageRecord;
use tracing::debug;

/// Groups scored records into similarity groups.
pub struct GreedyGrouper {
    tiers: SimilarityTiers,
}

impl GreedyGrouper {
    /// Tiers must already be validated.
    pub fn new(tiers: SimilarityTiers) -> Self {
        Self { tiers }
    }

    /// Group records into similarity groups.
    ///
    /// Records are processed sorted by `image_id`, so identical input content
    /// always yields identical groups and group ids regardless of input
    /// order. Runs single-threaded over the complete record set; the claimed
    /// state is a positional bitmap local to this call.
    pub fn group(&self, records: &[ImageRecord]) -> Vec<SimilarityGroup> {
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| records[a].image_id.cmp(&records[b].image_id));

        let mut claimed = vec![false; records.len()];
        let mut groups = Vec::new();

        for (position, &seed) in order.iter().enumerate() {
            if claimed[seed] {
                continue;
            }

            let mut member_ids = vec![records[seed].image_id.clone()];
            let mut min_distance = u32::MAX;
            let mut tightest = None;

            for &candidate in &order[position + 1..] {
                if claimed[candidate] {
                    continue;
                }

                let distance = records[seed]
                    .hashes
                    .min_distance(&records[candidate].hashes);
                let Some(class) = self.tiers.classify(distance) else {
                    continue;
                };

                member_ids.push(records[candidate].image_id.clone());
                claimed[candidate] = true;
                min_distance = min_distance.min(distance);
                tightest = Some(match tightest {
                    None => class,
                    Some(current) => class.min(current),
                });
            }

            // Singletons produce no group record.
            let Some(similarity_type) = tightest else {
                continue;
            };

            claimed[seed] = true;
            groups.push(SimilarityGroup {
                group_id: format!("group_{}", groups.len()),
                image_ids: member_ids,
                similarity_type,
                similarity_metric: min_distance,
                selected_best: None,
            });
        }

        debug!(
            total_groups = groups.len(),
            grouped_images = groups.iter().map(|g| g.image_ids.len()).sum::<usize>(),
            "grouping complete"
        );

        groups
    }
}
