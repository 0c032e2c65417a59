//! Shared record and flag types for the triage engine.

use crate::core::hasher::Fingerprints;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Aesthetic score substituted when the external collaborator supplies none.
pub const DEFAULT_AESTHETIC_SCORE: u8 = 3;

/// Per-image conditions detected during scoring, serialized as snake_case
/// flags. Kept in a `BTreeSet` so output ordering is deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IssueFlag {
    /// >5% of channel samples clipped at the high bound
    Overexposed,
    /// >10% of channel samples clipped at the low bound
    Underexposed,
    /// Sharpness score at 2 or below
    MotionBlur,
    /// Noise score at 2 or below
    HighNoise,
    /// Pixel count below the configured minimum
    LowResolution,
    /// One or more hash families fell back to the sentinel
    HashError,
    /// Decode failure or a quality sub-metric substituted its neutral value
    ProcessingError,
}

impl std::fmt::Display for IssueFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            IssueFlag::Overexposed => "overexposed",
            IssueFlag::Underexposed => "underexposed",
            IssueFlag::MotionBlur => "motion_blur",
            IssueFlag::HighNoise => "high_noise",
            IssueFlag::LowResolution => "low_resolution",
            IssueFlag::HashError => "hash_error",
            IssueFlag::ProcessingError => "processing_error",
        };
        write!(f, "{}", label)
    }
}

/// Raw measurements behind the banded 1-5 scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Variance of the Laplacian response (higher = sharper)
    pub blur_variance: f64,
    /// Total % of channel samples clipped at either histogram bound
    pub histogram_clipping_percent: f64,
    /// Std-dev of the median-filter residual (higher = noisier)
    pub snr_estimate: f64,
}

/// One image as handed to the engine by the orchestrator.
///
/// Decoding happens upstream; this core only ever sees the result. A `None`
/// buffer means the decoder failed — the image still produces a (neutral)
/// record, it is never dropped.
#[derive(Debug)]
pub struct ImageInput {
    /// Stable key the orchestrator uses to join results back
    pub image_id: String,
    /// Decoded pixels, or `None` on upstream decode failure
    pub pixels: Option<DynamicImage>,
    /// Externally supplied aesthetic score (1-5); defaults to 3
    pub aesthetic_score: Option<u8>,
    /// Original sensor pixel count (the handed buffer may be a smaller proxy)
    pub resolution_pixels: u64,
}

impl ImageInput {
    /// Input from a successfully decoded buffer. The resolution defaults to
    /// the buffer's own pixel count; override with
    /// [`with_resolution_pixels`](Self::with_resolution_pixels) when the
    /// buffer is a downsampled proxy of a larger original.
    pub fn new(image_id: impl Into<String>, pixels: DynamicImage) -> Self {
        let resolution_pixels = u64::from(pixels.width()) * u64::from(pixels.height());
        Self {
            image_id: image_id.into(),
            pixels: Some(pixels),
            aesthetic_score: None,
            resolution_pixels,
        }
    }

    /// Input for an image the upstream decoder could not read.
    pub fn undecodable(image_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            pixels: None,
            aesthetic_score: None,
            resolution_pixels: 0,
        }
    }

    pub fn with_aesthetic_score(mut self, score: u8) -> Self {
        self.aesthetic_score = Some(score);
        self
    }

    pub fn with_resolution_pixels(mut self, resolution_pixels: u64) -> Self {
        self.resolution_pixels = resolution_pixels;
        self
    }
}

/// A fully scored image. Created once during the parallel scoring stage and
/// immutable afterwards; group membership lives on [`SimilarityGroup`]
/// records, never here.
///
/// [`SimilarityGroup`]: crate::core::comparator::SimilarityGroup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub image_id: String,
    pub hashes: Fingerprints,
    pub sharpness: u8,
    pub exposure: u8,
    pub noise: u8,
    pub resolution: u8,
    pub quality_score: u8,
    pub aesthetic_score: u8,
    pub resolution_pixels: u64,
    pub issues: BTreeSet<IssueFlag>,
    pub metrics: QualityMetrics,
}

impl ImageRecord {
    /// The serializable per-image output view.
    pub fn assessment(&self) -> QualityAssessment {
        QualityAssessment {
            image_id: self.image_id.clone(),
            quality_score: self.quality_score,
            sharpness: self.sharpness,
            exposure: self.exposure,
            noise: self.noise,
            resolution: self.resolution,
            issues: self.issues.iter().copied().collect(),
            metrics: self.metrics,
        }
    }
}

/// Per-image quality output record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub image_id: String,
    pub quality_score: u8,
    pub sharpness: u8,
    pub exposure: u8,
    pub noise: u8,
    pub resolution: u8,
    pub issues: Vec<IssueFlag>,
    pub metrics: QualityMetrics,
}
