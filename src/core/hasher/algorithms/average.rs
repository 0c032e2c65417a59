//! Average Hash (aHash) implementation.
//!
//! aHash works by:
//! 1. Shrinking the bounded grayscale buffer to an 8x8 grid
//! 2. Computing the grid's mean intensity
//! 3. Setting a bit for each cell brighter than the mean
//!
//! Fastest of the three families; best at exact and re-encoded duplicates.

use super::super::downsample::shrink;
use super::super::traits::{HashAlgorithm, HashFamily, ImageHash};
use crate::error::HashError;
use image::GrayImage;

const GRID: u32 = 8;

/// Average Hash (aHash) implementation
#[derive(Debug, Default)]
pub struct AverageHasher;

impl HashAlgorithm for AverageHasher {
    fn hash(&self, gray: &GrayImage) -> Result<ImageHash, HashError> {
        let cells = shrink(gray, GRID, GRID)?;

        let total: u64 = cells.pixels().map(|p| u64::from(p[0])).sum();
        let mean = (total / u64::from(GRID * GRID)) as u8;

        // Row-major, MSB first
        let mut bits: u64 = 0;
        for y in 0..GRID {
            for x in 0..GRID {
                bits <<= 1;
                if cells.get_pixel(x, y)[0] > mean {
                    bits |= 1;
                }
            }
        }

        Ok(ImageHash::new(bits))
    }

    fn family(&self) -> HashFamily {
        HashFamily::Average
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn solid(value: u8) -> GrayImage {
        ImageBuffer::from_fn(64, 64, |_, _| Luma([value]))
    }

    fn half_split() -> GrayImage {
        ImageBuffer::from_fn(64, 64, |x, _| if x < 32 { Luma([20]) } else { Luma([220]) })
    }

    #[test]
    fn identical_input_produces_identical_hash() {
        let hasher = AverageHasher;
        let image = half_split();

        let hash1 = hasher.hash(&image).unwrap();
        let hash2 = hasher.hash(&image).unwrap();

        assert_eq!(hash1.distance(&hash2), 0);
    }

    #[test]
    fn solid_image_has_no_above_mean_cells() {
        let hasher = AverageHasher;
        let hash = hasher.hash(&solid(128)).unwrap();

        // Every cell equals the mean, so no bit is set.
        assert_eq!(hash.to_hex(), "0000000000000000");
    }

    #[test]
    fn split_image_sets_the_bright_half() {
        let hasher = AverageHasher;
        let hash = hasher.hash(&half_split()).unwrap();

        // Bright right half => 32 of 64 bits set.
        let dark = hasher.hash(&solid(20)).unwrap();
        assert_eq!(hash.distance(&dark), 32);
    }

    #[test]
    fn family_is_average() {
        assert_eq!(AverageHasher.family(), HashFamily::Average);
    }
}
