//! Pipeline execution implementation.

use super::{BatchResult, BatchSummary, PipelineConfig};
use crate::core::comparator::{BestShotSelector, GreedyGrouper};
use crate::core::hasher::{Fingerprints, HashExtractor};
use crate::core::quality::QualityEngine;
use crate::core::types::{ImageInput, ImageRecord, IssueFlag, DEFAULT_AESTHETIC_SCORE};
use crate::error::ConfigError;
use crate::events::{
    null_sender, Event, EventSender, GroupingEvent, PipelineEvent, PipelinePhase, ScoringEvent,
    SelectionEvent,
};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Builder for pipeline configuration
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration at once.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Distance at or under which a pair counts as a duplicate.
    pub fn duplicate_threshold(mut self, bits: u32) -> Self {
        self.config.tiers.duplicate = bits;
        self
    }

    /// Distance at or under which a pair counts as a near-duplicate.
    pub fn near_duplicate_threshold(mut self, bits: u32) -> Self {
        self.config.tiers.near_duplicate = bits;
        self
    }

    /// Distance at or under which a pair still counts as similar.
    pub fn similar_threshold(mut self, bits: u32) -> Self {
        self.config.tiers.similar = bits;
        self
    }

    /// Pixel count under which images are flagged low resolution.
    pub fn min_resolution_pixels(mut self, pixels: u64) -> Self {
        self.config.min_resolution_pixels = pixels;
        self
    }

    /// Composite quality blend, in percent.
    pub fn quality_weights(mut self, weights: crate::core::quality::QualityWeights) -> Self {
        self.config.quality_weights = weights;
        self
    }

    /// Best-shot blend, in percent.
    pub fn selection_weights(
        mut self,
        weights: crate::core::comparator::SelectionWeights,
    ) -> Self {
        self.config.selection_weights = weights;
        self
    }

    /// Long-edge bound applied before hashing.
    pub fn max_hash_edge(mut self, edge: u32) -> Self {
        self.config.max_hash_edge = edge;
        self
    }

    /// Validate the configuration and build the pipeline. The only point
    /// where this engine returns an error to the caller.
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        self.config.validate()?;
        Ok(Pipeline {
            hasher: HashExtractor::with_max_edge(self.config.max_hash_edge),
            quality: QualityEngine::new(
                self.config.quality_weights,
                self.config.min_resolution_pixels,
            ),
            grouper: GreedyGrouper::new(self.config.tiers),
            selector: BestShotSelector::new(self.config.selection_weights),
            config: self.config,
        })
    }
}

/// The triage pipeline: scoring, grouping, best-shot selection.
pub struct Pipeline {
    config: PipelineConfig,
    hasher: HashExtractor,
    quality: QualityEngine,
    grouper: GreedyGrouper,
    selector: BestShotSelector,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Pipeline with all-default configuration.
    pub fn with_defaults() -> Self {
        // The default configuration always validates.
        match PipelineBuilder::new().build() {
            Ok(pipeline) => pipeline,
            Err(error) => unreachable!("default configuration rejected: {error}"),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the batch without progress events.
    pub fn run(&self, inputs: &[ImageInput]) -> BatchResult {
        self.run_with_events(inputs, &null_sender())
    }

    /// Run the batch with progress events.
    ///
    /// Per-image failures degrade their own record and never abort the
    /// batch, so the run itself is infallible. Output ordering is stable:
    /// assessments sort by `image_id` and group ids are sequential, so
    /// identical input content yields identical output.
    pub fn run_with_events(&self, inputs: &[ImageInput], events: &EventSender) -> BatchResult {
        let total = inputs.len();
        events.send(Event::Pipeline(PipelineEvent::Started {
            total_images: total,
        }));

        // Phase 1: per-image scoring, parallel across the rayon pool. Each
        // task is a pure function of its own input.
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scoring,
        }));

        let completed = AtomicUsize::new(0);
        let mut records: Vec<ImageRecord> = inputs
            .par_iter()
            .map(|input| {
                let record = self.score_image(input);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                events.send(Event::Scoring(ScoringEvent::ImageScored {
                    image_id: record.image_id.clone(),
                    completed: done,
                    total,
                }));
                record
            })
            .collect();
        // `collect` is the barrier: every record exists before grouping
        // sees any of them.

        events.send(Event::Scoring(ScoringEvent::Completed {
            total_scored: records.len(),
        }));

        records.sort_by(|a, b| a.image_id.cmp(&b.image_id));

        // Phase 2: grouping, sequential over the complete record set.
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Grouping,
        }));

        let mut groups = self.grouper.group(&records);

        events.send(Event::Grouping(GroupingEvent::Completed {
            total_groups: groups.len(),
            grouped_images: groups.iter().map(|g| g.image_ids.len()).sum(),
        }));

        // Phase 3: best-shot selection, parallel per group against an
        // immutable record index built once after the barrier.
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Selection,
        }));

        let by_id: HashMap<&str, &ImageRecord> = records
            .iter()
            .map(|record| (record.image_id.as_str(), record))
            .collect();

        groups.par_iter_mut().for_each(|group| {
            let best = self
                .selector
                .select(group, &by_id)
                .or_else(|| group.image_ids.first().cloned());
            if let Some(image_id) = &best {
                events.send(Event::Selection(SelectionEvent::BestChosen {
                    group_id: group.group_id.clone(),
                    image_id: image_id.clone(),
                }));
            }
            group.selected_best = best;
        });

        events.send(Event::Selection(SelectionEvent::Completed {
            total_groups: groups.len(),
        }));

        let summary = BatchSummary::from_records(&records, groups.len());
        info!(
            total_images = summary.total_images,
            total_groups = summary.total_groups,
            images_with_issues = summary.images_with_issues,
            status = ?summary.status,
            "batch complete"
        );

        events.send(Event::Pipeline(PipelineEvent::Completed {
            total_images: summary.total_images,
            total_groups: summary.total_groups,
        }));

        BatchResult {
            assessments: records.iter().map(ImageRecord::assessment).collect(),
            groups,
            summary,
        }
    }

    /// Score one image: fingerprints + quality breakdown. Pure; all
    /// failures are contained in the record's flags.
    fn score_image(&self, input: &ImageInput) -> ImageRecord {
        let aesthetic_score = input
            .aesthetic_score
            .unwrap_or(DEFAULT_AESTHETIC_SCORE)
            .clamp(1, 5);

        // An undecodable input gets sentinel fingerprints without the
        // hash_error flag: processing_error from the quality engine already
        // marks the decode failure itself.
        let (hashes, hash_degraded) = match &input.pixels {
            Some(image) => self.hasher.extract(image),
            None => (Fingerprints::sentinel(), false),
        };

        let breakdown = self
            .quality
            .assess(input.pixels.as_ref(), input.resolution_pixels);

        let mut issues = breakdown.flags;
        if hash_degraded {
            issues.insert(IssueFlag::HashError);
        }
        if !issues.is_empty() {
            debug!(image_id = %input.image_id, ?issues, "image scored with flags");
        }

        ImageRecord {
            image_id: input.image_id.clone(),
            hashes,
            sharpness: breakdown.sharpness,
            exposure: breakdown.exposure,
            noise: breakdown.noise,
            resolution: breakdown.resolution,
            quality_score: breakdown.quality_score,
            aesthetic_score,
            resolution_pixels: input.resolution_pixels,
            issues,
            metrics: breakdown.metrics,
        }
    }
}
