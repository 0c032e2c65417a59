//! # Pipeline Module
//!
//! Orchestrates the full triage workflow:
//! 1. **Scoring** (parallel) - hash extraction + quality metrics per image
//! 2. **Barrier** - the record set must be complete before grouping
//! 3. **Grouping** (sequential) - greedy similarity clustering
//! 4. **Selection** (parallel) - best shot per group
//!
//! The barrier is mandatory: grouping against a partial record set would
//! produce nondeterministic, incomplete groups.

mod executor;

pub use executor::{Pipeline, PipelineBuilder};

use crate::core::comparator::{SelectionWeights, SimilarityGroup, SimilarityTiers};
use crate::core::hasher::HashExtractor;
use crate::core::quality::{QualityEngine, QualityWeights};
use crate::core::types::{ImageRecord, IssueFlag, QualityAssessment};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every knob the engine recognizes. Validated once when the pipeline is
/// built; a running batch never fails on configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Distance thresholds for the three similarity tiers
    pub tiers: SimilarityTiers,
    /// Pixel count under which an image is flagged low resolution
    pub min_resolution_pixels: u64,
    /// Composite quality blend, in percent
    pub quality_weights: QualityWeights,
    /// Best-shot blend, in percent
    pub selection_weights: SelectionWeights,
    /// Long-edge bound applied before hashing
    pub max_hash_edge: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tiers: SimilarityTiers::default(),
            min_resolution_pixels: QualityEngine::DEFAULT_MIN_RESOLUTION_PIXELS,
            quality_weights: QualityWeights::default(),
            selection_weights: SelectionWeights::default(),
            max_hash_edge: HashExtractor::DEFAULT_MAX_EDGE,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tiers.validate()?;
        self.quality_weights.validate()?;
        self.selection_weights.validate()?;
        Ok(())
    }
}

/// Batch health derived from the issue ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// No image carried any flag
    Success,
    /// Some images flagged, most clean
    Warning,
    /// Every image flagged
    Error,
}

/// Aggregated issue counts for caller-visible status reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_images: usize,
    pub images_with_issues: usize,
    pub issue_counts: BTreeMap<IssueFlag, usize>,
    pub total_groups: usize,
    pub status: BatchStatus,
}

impl BatchSummary {
    pub fn from_records(records: &[ImageRecord], total_groups: usize) -> Self {
        let total_images = records.len();
        let mut issue_counts = BTreeMap::new();
        let mut images_with_issues = 0;

        for record in records {
            if !record.issues.is_empty() {
                images_with_issues += 1;
            }
            for flag in &record.issues {
                *issue_counts.entry(*flag).or_insert(0) += 1;
            }
        }

        let status = if images_with_issues == 0 {
            BatchStatus::Success
        } else if images_with_issues == total_images {
            BatchStatus::Error
        } else {
            BatchStatus::Warning
        };

        Self {
            total_images,
            images_with_issues,
            issue_counts,
            total_groups,
            status,
        }
    }
}

/// Everything a batch run produces, ready for the orchestrator to persist
/// or forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// One assessment per input, in stable `image_id` order
    pub assessments: Vec<QualityAssessment>,
    /// Similarity groups with their selected best shots
    pub groups: Vec<SimilarityGroup>,
    /// Aggregated issue counts and batch status
    pub summary: BatchSummary,
}
