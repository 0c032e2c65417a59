//! Perceptual Hash (pHash) implementation.
//!
//! pHash works by:
//! 1. Shrinking the bounded grayscale buffer to 32x32
//! 2. Applying a 2-D DCT-II and keeping the top-left 8x8 low-frequency block
//! 3. Setting a bit for each coefficient above the block's median
//!
//! Frequency-domain structure survives scaling, brightness/contrast shifts
//! and compression artifacts, making this the most robust family for edited
//! near-duplicates.

use super::super::downsample::shrink;
use super::super::traits::{HashAlgorithm, HashFamily, ImageHash};
use crate::error::HashError;
use image::GrayImage;
use std::f64::consts::PI;

/// Side length of the DCT input.
const INPUT: usize = 32;
/// Side length of the retained low-frequency block.
const GRID: usize = 8;

/// Perceptual Hash (pHash) implementation
pub struct PerceptualHasher {
    /// Precomputed DCT basis: `cos[k][n] = cos(pi/INPUT * (n + 0.5) * k)`
    /// for the GRID lowest frequencies.
    cos: [[f64; INPUT]; GRID],
}

impl PerceptualHasher {
    pub fn new() -> Self {
        let mut cos = [[0.0; INPUT]; GRID];
        for (k, row) in cos.iter_mut().enumerate() {
            for (n, value) in row.iter_mut().enumerate() {
                *value = (PI / INPUT as f64 * (n as f64 + 0.5) * k as f64).cos();
            }
        }
        Self { cos }
    }

    /// The low-frequency 8x8 block of the 2-D DCT-II, computed separably:
    /// rows first, then columns, keeping only the GRID lowest frequencies of
    /// each pass. Uniform scaling is irrelevant to the median threshold.
    fn low_frequency_block(&self, samples: &[[f64; INPUT]; INPUT]) -> [f64; GRID * GRID] {
        let mut rows = [[0.0; GRID]; INPUT];
        for y in 0..INPUT {
            for (u, basis) in self.cos.iter().enumerate() {
                let mut acc = 0.0;
                for x in 0..INPUT {
                    acc += samples[y][x] * basis[x];
                }
                rows[y][u] = acc;
            }
        }

        let mut block = [0.0; GRID * GRID];
        for (v, basis) in self.cos.iter().enumerate() {
            for u in 0..GRID {
                let mut acc = 0.0;
                for (y, row) in rows.iter().enumerate() {
                    acc += row[u] * basis[y];
                }
                block[v * GRID + u] = acc;
            }
        }
        block
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl HashAlgorithm for PerceptualHasher {
    fn hash(&self, gray: &GrayImage) -> Result<ImageHash, HashError> {
        let small = shrink(gray, INPUT as u32, INPUT as u32)?;

        let mut samples = [[0.0; INPUT]; INPUT];
        for (y, row) in samples.iter_mut().enumerate() {
            for (x, value) in row.iter_mut().enumerate() {
                *value = f64::from(small.get_pixel(x as u32, y as u32)[0]);
            }
        }

        let block = self.low_frequency_block(&samples);

        // Median of the 64 retained coefficients (mean of the middle pair).
        let mut sorted = block;
        sorted.sort_by(f64::total_cmp);
        let median = (sorted[GRID * GRID / 2 - 1] + sorted[GRID * GRID / 2]) / 2.0;

        // Row-major, MSB first
        let mut bits: u64 = 0;
        for &coefficient in &block {
            bits <<= 1;
            if coefficient > median {
                bits |= 1;
            }
        }

        Ok(ImageHash::new(bits))
    }

    fn family(&self) -> HashFamily {
        HashFamily::Perceptual
    }
}
