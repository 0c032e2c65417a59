//! # Core Module
//!
//! The orchestrator-agnostic triage engine.
//!
//! ## Modules
//! - `hasher` - Computes perceptual fingerprints
//! - `quality` - Scores technical quality metrics
//! - `comparator` - Groups similar images and selects best shots
//! - `pipeline` - Sequences scoring, grouping and selection
//! - `types` - Shared record and flag types

pub mod comparator;
pub mod hasher;
pub mod pipeline;
pub mod quality;
pub mod types;

// Re-export commonly used types
pub use comparator::{SimilarityClass, SimilarityGroup, SimilarityTiers};
pub use hasher::{Fingerprints, HashFamily, ImageHash};
pub use pipeline::{BatchResult, BatchStatus, BatchSummary, Pipeline, PipelineConfig};
pub use types::{ImageInput, ImageRecord, IssueFlag, QualityAssessment};
