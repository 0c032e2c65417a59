//! Trait and value types for perceptual hashing.

use crate::error::HashError;
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Number of bits in every hash family produced by this crate.
pub const HASH_BITS: u32 = 64;

/// Distance reported when two hashes cannot be compared (either side is the
/// sentinel). Deliberately far above any real 64-bit Hamming distance so it
/// falls outside every similarity tier.
pub const INCOMPARABLE_DISTANCE: u32 = 999;

/// A 64-bit perceptual fingerprint, or the sentinel for a failed computation.
///
/// Serializes as a 16-character hex string; the sentinel serializes as the
/// empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHash {
    bits: Option<u64>,
}

impl ImageHash {
    /// The "hashing failed" sentinel.
    pub const SENTINEL: ImageHash = ImageHash { bits: None };

    /// Wrap a computed 64-bit hash.
    pub fn new(bits: u64) -> Self {
        Self { bits: Some(bits) }
    }

    /// True when this hash carries no comparable value.
    pub fn is_sentinel(&self) -> bool {
        self.bits.is_none()
    }

    /// Hamming distance to another hash.
    ///
    /// Returns [`INCOMPARABLE_DISTANCE`] when either side is the sentinel
    /// (including sentinel vs sentinel) instead of failing; otherwise XOR and
    /// popcount. For valid hashes `distance(a, a) == 0` and the distance is
    /// symmetric.
    pub fn distance(&self, other: &ImageHash) -> u32 {
        match (self.bits, other.bits) {
            (Some(a), Some(b)) => (a ^ b).count_ones(),
            _ => INCOMPARABLE_DISTANCE,
        }
    }

    /// Hex encoding: 16 lowercase hex chars, or `""` for the sentinel.
    pub fn to_hex(&self) -> String {
        match self.bits {
            Some(bits) => format!("{:016x}", bits),
            None => String::new(),
        }
    }
}

impl Serialize for ImageHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ImageHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        if hex.is_empty() {
            return Ok(ImageHash::SENTINEL);
        }
        if hex.len() != 16 {
            return Err(serde::de::Error::custom(format!(
                "expected 16 hex chars or empty sentinel, got {:?}",
                hex
            )));
        }
        u64::from_str_radix(&hex, 16)
            .map(ImageHash::new)
            .map_err(serde::de::Error::custom)
    }
}

/// The three hash families computed per image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashFamily {
    /// Average Hash (aHash) - grid cells vs mean intensity
    Average,
    /// Difference Hash (dHash) - horizontal brightness gradients
    Difference,
    /// Perceptual Hash (pHash) - DCT low-frequency coefficients vs median
    Perceptual,
}

impl std::fmt::Display for HashFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashFamily::Average => write!(f, "aHash"),
            HashFamily::Difference => write!(f, "dHash"),
            HashFamily::Perceptual => write!(f, "pHash"),
        }
    }
}

/// A hash family implementation.
///
/// Input is the already-bounded grayscale buffer prepared by the extractor;
/// each implementation shrinks it further to its own grid.
pub trait HashAlgorithm: Send + Sync {
    /// Compute the 64-bit fingerprint.
    fn hash(&self, gray: &GrayImage) -> Result<ImageHash, HashError>;

    /// Which family this algorithm implements.
    fn family(&self) -> HashFamily;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let hash = ImageHash::new(0xDEAD_BEEF_0055_AAFF);
        assert_eq!(hash.distance(&hash), 0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = ImageHash::new(0xFF00);
        let b = ImageHash::new(0x00FF);
        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn distance_counts_differing_bits() {
        let a = ImageHash::new(0b1111_1111);
        let b = ImageHash::new(0b0000_0000);
        assert_eq!(a.distance(&b), 8);
    }

    #[test]
    fn sentinel_is_incomparable() {
        let valid = ImageHash::new(42);
        assert_eq!(valid.distance(&ImageHash::SENTINEL), INCOMPARABLE_DISTANCE);
        assert_eq!(ImageHash::SENTINEL.distance(&valid), INCOMPARABLE_DISTANCE);
        // Two failed hashes carry no evidence of similarity either.
        assert_eq!(
            ImageHash::SENTINEL.distance(&ImageHash::SENTINEL),
            INCOMPARABLE_DISTANCE
        );
    }

    #[test]
    fn hex_is_fixed_length() {
        assert_eq!(ImageHash::new(0xAB).to_hex(), "00000000000000ab");
        assert_eq!(ImageHash::new(0xAB).to_hex().len(), 16);
        assert_eq!(ImageHash::SENTINEL.to_hex(), "");
    }

    #[test]
    fn serde_roundtrip() {
        let hash = ImageHash::new(0x0123_4567_89AB_CDEF);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, "\"0123456789abcdef\"");
        let back: ImageHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);

        let sentinel: ImageHash = serde_json::from_str("\"\"").unwrap();
        assert!(sentinel.is_sentinel());
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(serde_json::from_str::<ImageHash>("\"abc\"").is_err());
        assert!(serde_json::from_str::<ImageHash>("\"zzzzzzzzzzzzzzzz\"").is_err());
    }

    #[test]
    fn family_display() {
        assert_eq!(HashFamily::Average.to_string(), "aHash");
        assert_eq!(HashFamily::Difference.to_string(), "dHash");
        assert_eq!(HashFamily::Perceptual.to_string(), "pHash");
    }
}
