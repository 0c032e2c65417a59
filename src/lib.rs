//! # Photo Triage
//!
//! A photo culling engine that scores technical quality and groups visual
//! duplicates, then picks one canonical best shot per group.
//!
//! ## Core Philosophy
//! - **Never drop an image** - failures degrade a record, never the batch
//! - **Deterministic output** - identical input content yields identical
//!   scores, groups and ids, regardless of input order or thread timing
//! - **Decoding stays outside** - the engine consumes decoded pixel buffers
//!   and externally supplied aesthetic scores; persistence and UI belong to
//!   the calling orchestrator
//!
//! ## Architecture
//! The library is a pure in-process core plus thin reporting layers:
//! - `core` - Hashing, quality metrics, grouping, selection, pipeline
//! - `events` - Event-driven progress reporting (orchestrator-ready)
//! - `error` - Configuration and per-metric error types
//!
//! ## Example
//! ```rust,no_run
//! use photo_triage::core::{ImageInput, Pipeline};
//!
//! # fn load(_: &str) -> image::DynamicImage { unimplemented!() }
//! let pipeline = Pipeline::builder().near_duplicate_threshold(12).build()?;
//!
//! let inputs = vec![
//!     ImageInput::new("IMG_0001", load("IMG_0001.jpg")).with_aesthetic_score(4),
//!     ImageInput::new("IMG_0002", load("IMG_0002.jpg")),
//! ];
//!
//! let result = pipeline.run(&inputs);
//! for group in &result.groups {
//!     println!("{}: keep {:?}", group.group_id, group.selected_best);
//! }
//! # Ok::<(), photo_triage::error::ConfigError>(())
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{ConfigError, Result, TriageError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or orchestrator).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
