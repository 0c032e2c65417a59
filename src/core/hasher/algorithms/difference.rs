//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Shrinking the bounded grayscale buffer to a 9x8 grid (one extra column
//!    for the horizontal differences)
//! 2. Comparing each cell to its right neighbour
//! 3. Setting a bit when the left cell is brighter
//!
//! Captures the horizontal brightness gradient; robust to uniform exposure
//! shifts that flip every aHash bit at once.

use super::super::downsample::shrink;
use super::super::traits::{HashAlgorithm, HashFamily, ImageHash};
use crate::error::HashError;
use image::GrayImage;

const GRID: u32 = 8;

/// Difference Hash (dHash) implementation
#[derive(Debug, Default)]
pub struct DifferenceHasher;

impl HashAlgorithm for DifferenceHasher {
    fn hash(&self, gray: &GrayImage) -> Result<ImageHash, HashError> {
        let cells = shrink(gray, GRID + 1, GRID)?;

        // Row-major, MSB first
        let mut bits: u64 = 0;
        for y in 0..GRID {
            for x in 0..GRID {
                bits <<= 1;
                if cells.get_pixel(x, y)[0] > cells.get_pixel(x + 1, y)[0] {
                    bits |= 1;
                }
            }
        }

        Ok(ImageHash::new(bits))
    }

    fn family(&self) -> HashFamily {
        HashFamily::Difference
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn left_to_right_gradient() -> GrayImage {
        ImageBuffer::from_fn(90, 80, |x, _| Luma([(x * 255 / 89) as u8]))
    }

    fn right_to_left_gradient() -> GrayImage {
        ImageBuffer::from_fn(90, 80, |x, _| Luma([((89 - x) * 255 / 89) as u8]))
    }

    #[test]
    fn identical_input_produces_identical_hash() {
        let hasher = DifferenceHasher;
        let image = left_to_right_gradient();

        let hash1 = hasher.hash(&image).unwrap();
        let hash2 = hasher.hash(&image).unwrap();

        assert_eq!(hash1.distance(&hash2), 0);
    }

    #[test]
    fn opposite_gradients_are_maximally_distant() {
        let hasher = DifferenceHasher;

        // Left-to-right: every left cell is darker (all bits 0).
        // Right-to-left: every left cell is brighter (all bits 1).
        let ltr = hasher.hash(&left_to_right_gradient()).unwrap();
        let rtl = hasher.hash(&right_to_left_gradient()).unwrap();

        assert_eq!(ltr.to_hex(), "0000000000000000");
        assert_eq!(rtl.to_hex(), "ffffffffffffffff");
        assert_eq!(ltr.distance(&rtl), 64);
    }

    #[test]
    fn uniform_exposure_shift_preserves_the_hash() {
        let hasher = DifferenceHasher;

        let base = left_to_right_gradient();
        let brighter: GrayImage = ImageBuffer::from_fn(90, 80, |x, y| {
            Luma([base.get_pixel(x, y)[0].saturating_add(30)])
        });

        let hash_base = hasher.hash(&base).unwrap();
        let hash_bright = hasher.hash(&brighter).unwrap();

        // Gradients survive a constant brightness offset almost unchanged.
        assert!(hash_base.distance(&hash_bright) <= 8);
    }

    #[test]
    fn family_is_difference() {
        assert_eq!(DifferenceHasher.family(), HashFamily::Difference);
    }
}
