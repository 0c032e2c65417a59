//! # Error Module
//!
//! Error types for the triage engine.
//!
//! ## Design Principles
//! - **Per-image failures are local** - a bad image degrades its own record,
//!   never the batch
//! - **Include context** - which metric, which dimensions, what went wrong
//! - **Fail construction, not execution** - only configuration validation
//!   returns an error to the caller; a running batch always completes

use thiserror::Error;

/// Top-level engine error
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration validation errors, raised when a pipeline is built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} threshold {value} is outside 0..={max}")]
    ThresholdOutOfRange {
        name: &'static str,
        value: u32,
        max: u32,
    },

    #[error(
        "similarity tiers must be ordered: duplicate ({duplicate}) <= \
         near_duplicate ({near_duplicate}) <= similar ({similar})"
    )]
    UnorderedTiers {
        duplicate: u32,
        near_duplicate: u32,
        similar: u32,
    },

    #[error("{name} weights must sum to 100 percent, got {sum}")]
    WeightSum { name: &'static str, sum: u32 },
}

/// Errors while computing one perceptual hash family.
///
/// The extractor substitutes the sentinel hash for the failed family and
/// flags the record; it never propagates these to the caller.
#[derive(Error, Debug)]
pub enum HashError {
    #[error("image has zero dimensions")]
    EmptyImage,

    #[error("resize to {width}x{height} failed: {reason}")]
    ResizeFailed {
        width: u32,
        height: u32,
        reason: String,
    },
}

/// Errors while computing one quality sub-metric.
///
/// The quality engine substitutes the neutral score 3 for the failed
/// sub-metric and flags the record; the composite is still computed.
#[derive(Error, Debug)]
pub enum MetricError {
    #[error("image has zero pixels")]
    EmptyImage,

    #[error("image too small for {metric} analysis ({width}x{height})")]
    TooSmall {
        metric: &'static str,
        width: u32,
        height: u32,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_threshold() {
        let error = ConfigError::ThresholdOutOfRange {
            name: "similar",
            value: 70,
            max: 64,
        };
        let message = error.to_string();
        assert!(message.contains("similar"));
        assert!(message.contains("70"));
    }

    #[test]
    fn metric_error_names_the_metric() {
        let error = MetricError::TooSmall {
            metric: "sharpness",
            width: 2,
            height: 2,
        };
        let message = error.to_string();
        assert!(message.contains("sharpness"));
        assert!(message.contains("2x2"));
    }

    #[test]
    fn config_error_converts_to_triage_error() {
        let error: TriageError = ConfigError::WeightSum {
            name: "quality",
            sum: 99,
        }
        .into();
        assert!(error.to_string().contains("Configuration error"));
    }
}
