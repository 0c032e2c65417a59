//! # Hasher Module
//!
//! Computes perceptual fingerprints for images.
//!
//! ## Hash Families
//! Every image gets all three 64-bit families, compared later by minimum
//! pairwise distance:
//! - **aHash (Average Hash)** - fastest, catches exact duplicates
//! - **dHash (Difference Hash)** - brightness gradients, robust to exposure shifts
//! - **pHash (Perceptual Hash)** - DCT-based, robust to edits
//!
//! ## How It Works
//! 1. Convert to grayscale and bound the buffer to ≤512x512 (SIMD resize)
//! 2. Each family shrinks the bounded buffer to its own grid and extracts bits
//! 3. A family that fails yields the empty sentinel and flags the record;
//!    the batch never aborts over one bad image

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::warn;

mod algorithms;
pub(crate) mod downsample;
mod traits;

pub use algorithms::{AverageHasher, DifferenceHasher, PerceptualHasher};
pub use traits::{HashAlgorithm, HashFamily, ImageHash, HASH_BITS, INCOMPARABLE_DISTANCE};

/// The three per-image fingerprints, as stored on an image record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprints {
    pub ahash: ImageHash,
    pub dhash: ImageHash,
    pub phash: ImageHash,
}

impl Fingerprints {
    /// All three families failed (or the buffer never decoded).
    pub const fn sentinel() -> Self {
        Self {
            ahash: ImageHash::SENTINEL,
            dhash: ImageHash::SENTINEL,
            phash: ImageHash::SENTINEL,
        }
    }

    /// Minimum Hamming distance across the three families.
    ///
    /// Invalid families contribute [`INCOMPARABLE_DISTANCE`], so comparison
    /// automatically falls back to whatever families both sides still have;
    /// with nothing valid in common the result stays incomparable.
    pub fn min_distance(&self, other: &Fingerprints) -> u32 {
        self.ahash
            .distance(&other.ahash)
            .min(self.dhash.distance(&other.dhash))
            .min(self.phash.distance(&other.phash))
    }

    /// True when at least one family carries a real hash.
    pub fn is_comparable(&self) -> bool {
        !(self.ahash.is_sentinel() && self.dhash.is_sentinel() && self.phash.is_sentinel())
    }
}

/// Computes all three fingerprint families from one decoded buffer.
pub struct HashExtractor {
    /// Long-edge bound applied before hashing.
    max_edge: u32,
    ahash: AverageHasher,
    dhash: DifferenceHasher,
    phash: PerceptualHasher,
}

impl HashExtractor {
    pub const DEFAULT_MAX_EDGE: u32 = 512;

    pub fn new() -> Self {
        Self::with_max_edge(Self::DEFAULT_MAX_EDGE)
    }

    /// Custom long-edge bound (smaller = faster, less detail sensitivity).
    pub fn with_max_edge(max_edge: u32) -> Self {
        Self {
            max_edge,
            ahash: AverageHasher,
            dhash: DifferenceHasher,
            phash: PerceptualHasher::new(),
        }
    }

    /// Extract fingerprints from a decoded image.
    ///
    /// Returns the fingerprints plus a degraded flag: `true` when any family
    /// fell back to the sentinel. Pure and idempotent; never fails the batch.
    pub fn extract(&self, image: &DynamicImage) -> (Fingerprints, bool) {
        let bounded = match downsample::bounded_grayscale(image, self.max_edge) {
            Ok(gray) => gray,
            Err(error) => {
                warn!(%error, "downsample failed, emitting sentinel fingerprints");
                return (Fingerprints::sentinel(), true);
            }
        };

        let mut degraded = false;
        let mut run = |algorithm: &dyn HashAlgorithm| match algorithm.hash(&bounded) {
            Ok(hash) => hash,
            Err(error) => {
                warn!(family = %algorithm.family(), %error, "hash family failed, using sentinel");
                degraded = true;
                ImageHash::SENTINEL
            }
        };

        let fingerprints = Fingerprints {
            ahash: run(&self.ahash),
            dhash: run(&self.dhash),
            phash: run(&self.phash),
        };

        (fingerprints, degraded)
    }
}

impl Default for HashExtractor {
    fn default() -> Self {
        Self::new()
    }
}
