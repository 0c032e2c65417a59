//! # Quality Module
//!
//! Multi-metric technical quality assessment.
//!
//! Four banded sub-scores (sharpness, exposure, noise, resolution) blend into
//! one composite 1-5 rating. Each sub-metric returns an explicit `Result`;
//! the engine composes them in one place, substituting the neutral score 3
//! for anything that fails so an image is degraded, never dropped.
//!
//! ## Measurements
//! - **Sharpness** - variance of the 4-neighbour Laplacian (edge energy)
//! - **Exposure** - % of channel samples clipped at the histogram bounds
//! - **Noise** - std-dev of the residual against a 5x5 median filter
//! - **Resolution** - sensor pixel count vs megapixel tiers

use crate::core::types::{IssueFlag, QualityMetrics};
use crate::error::{ConfigError, MetricError};
use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Substituted when a sub-metric cannot be computed.
const NEUTRAL_SCORE: u8 = 3;

/// Integer-percent weights of the composite blend. Percentages keep the
/// weighted sum and its rounding exact across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub sharpness: u32,
    pub exposure: u32,
    pub noise: u32,
    pub resolution: u32,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            sharpness: 35,
            exposure: 30,
            noise: 20,
            resolution: 15,
        }
    }
}

impl QualityWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.sharpness + self.exposure + self.noise + self.resolution;
        if sum != 100 {
            return Err(ConfigError::WeightSum {
                name: "quality",
                sum,
            });
        }
        Ok(())
    }
}

/// The four sub-scores, the composite, detected flags and raw measurements
/// for one image.
#[derive(Debug, Clone)]
pub struct QualityBreakdown {
    pub sharpness: u8,
    pub exposure: u8,
    pub noise: u8,
    pub resolution: u8,
    pub quality_score: u8,
    pub flags: BTreeSet<IssueFlag>,
    pub metrics: QualityMetrics,
}

/// Computes quality breakdowns from decoded buffers.
pub struct QualityEngine {
    weights: QualityWeights,
    min_resolution_pixels: u64,
}

impl QualityEngine {
    pub const DEFAULT_MIN_RESOLUTION_PIXELS: u64 = 2_000_000;

    /// Weights must already be validated.
    pub fn new(weights: QualityWeights, min_resolution_pixels: u64) -> Self {
        Self {
            weights,
            min_resolution_pixels,
        }
    }

    /// Assess one image. `pixels` is `None` when the upstream decoder failed,
    /// which yields the neutral breakdown. Pure and idempotent.
    pub fn assess(&self, pixels: Option<&DynamicImage>, resolution_pixels: u64) -> QualityBreakdown {
        let Some(image) = pixels else {
            return self.neutral();
        };

        let gray = image.to_luma8();
        let rgb = image.to_rgb8();

        let mut flags = BTreeSet::new();
        let mut metrics = QualityMetrics::default();

        let sharpness = match sharpness_score(&gray) {
            Ok((score, variance)) => {
                metrics.blur_variance = variance;
                score
            }
            Err(error) => substitute("sharpness", &error, &mut flags),
        };
        if sharpness <= 2 {
            flags.insert(IssueFlag::MotionBlur);
        }

        let exposure = match exposure_reading(&rgb) {
            Ok(reading) => {
                metrics.histogram_clipping_percent = reading.total_clipping_percent;
                flags.extend(reading.flags);
                reading.score
            }
            Err(error) => substitute("exposure", &error, &mut flags),
        };

        let noise = match noise_score(&gray) {
            Ok((score, sigma)) => {
                metrics.snr_estimate = sigma;
                score
            }
            Err(error) => substitute("noise", &error, &mut flags),
        };
        if noise <= 2 {
            flags.insert(IssueFlag::HighNoise);
        }

        let (resolution, below_minimum) = self.resolution_score(resolution_pixels);
        if below_minimum {
            flags.insert(IssueFlag::LowResolution);
        }

        let quality_score = self.composite(sharpness, exposure, noise, resolution);

        QualityBreakdown {
            sharpness,
            exposure,
            noise,
            resolution,
            quality_score,
            flags,
            metrics,
        }
    }

    /// The all-neutral breakdown for an image that never decoded.
    pub fn neutral(&self) -> QualityBreakdown {
        let mut flags = BTreeSet::new();
        flags.insert(IssueFlag::ProcessingError);
        QualityBreakdown {
            sharpness: NEUTRAL_SCORE,
            exposure: NEUTRAL_SCORE,
            noise: NEUTRAL_SCORE,
            resolution: NEUTRAL_SCORE,
            quality_score: NEUTRAL_SCORE,
            flags,
            metrics: QualityMetrics::default(),
        }
    }

    /// Weighted blend in integer hundredths, rounded half away from zero and
    /// clamped to the 1-5 band.
    fn composite(&self, sharpness: u8, exposure: u8, noise: u8, resolution: u8) -> u8 {
        let hundredths = u32::from(sharpness) * self.weights.sharpness
            + u32::from(exposure) * self.weights.exposure
            + u32::from(noise) * self.weights.noise
            + u32::from(resolution) * self.weights.resolution;
        (((hundredths + 50) / 100).clamp(1, 5)) as u8
    }

    /// Megapixel tiers, plus whether the image sits below the configured
    /// minimum.
    fn resolution_score(&self, resolution_pixels: u64) -> (u8, bool) {
        let below_minimum = resolution_pixels < self.min_resolution_pixels;
        let score = if resolution_pixels >= 24_000_000 {
            5
        } else if resolution_pixels >= 12_000_000 {
            4
        } else if resolution_pixels >= 8_000_000 {
            3
        } else if !below_minimum {
            2
        } else {
            1
        };
        (score, below_minimum)
    }
}

fn substitute(metric: &'static str, error: &MetricError, flags: &mut BTreeSet<IssueFlag>) -> u8 {
    warn!(metric, %error, "sub-metric failed, substituting neutral score");
    flags.insert(IssueFlag::ProcessingError);
    NEUTRAL_SCORE
}

fn sharpness_score(gray: &GrayImage) -> Result<(u8, f64), MetricError> {
    let variance = laplacian_variance(gray)?;
    let score = if variance > 500.0 {
        5
    } else if variance > 300.0 {
        4
    } else if variance > 150.0 {
        3
    } else if variance > 75.0 {
        2
    } else {
        1
    };
    Ok((score, variance))
}

/// Variance of the 4-neighbour discrete Laplacian over the interior pixels.
/// Sharp edges produce strong second derivatives and therefore high variance.
fn laplacian_variance(gray: &GrayImage) -> Result<f64, MetricError> {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return Err(MetricError::TooSmall {
            metric: "sharpness",
            width,
            height,
        });
    }

    let mut sum = 0.0;
    let mut sum_squares = 0.0;
    let mut count = 0.0;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = f64::from(gray.get_pixel(x, y)[0]);
            let response = f64::from(gray.get_pixel(x, y - 1)[0])
                + f64::from(gray.get_pixel(x, y + 1)[0])
                + f64::from(gray.get_pixel(x - 1, y)[0])
                + f64::from(gray.get_pixel(x + 1, y)[0])
                - 4.0 * center;
            sum += response;
            sum_squares += response * response;
            count += 1.0;
        }
    }

    let mean = sum / count;
    Ok((sum_squares / count - mean * mean).max(0.0))
}

struct ExposureReading {
    score: u8,
    total_clipping_percent: f64,
    flags: Vec<IssueFlag>,
}

/// Histogram clipping over every channel sample: >5% at 255 flags
/// overexposure, >10% at 0 flags underexposure, and the total drives the
/// banded score.
fn exposure_reading(rgb: &RgbImage) -> Result<ExposureReading, MetricError> {
    let samples = rgb.as_raw();
    if samples.is_empty() {
        return Err(MetricError::EmptyImage);
    }

    let mut clipped_high = 0u64;
    let mut clipped_low = 0u64;
    for &sample in samples {
        if sample == u8::MAX {
            clipped_high += 1;
        } else if sample == u8::MIN {
            clipped_low += 1;
        }
    }

    let total = samples.len() as f64;
    let high_percent = clipped_high as f64 / total * 100.0;
    let low_percent = clipped_low as f64 / total * 100.0;

    let mut flags = Vec::new();
    if high_percent > 5.0 {
        flags.push(IssueFlag::Overexposed);
    }
    if low_percent > 10.0 {
        flags.push(IssueFlag::Underexposed);
    }

    let total_clipping_percent = high_percent + low_percent;
    let score = if total_clipping_percent < 1.0 {
        5
    } else if total_clipping_percent < 3.0 {
        4
    } else if total_clipping_percent < 8.0 {
        3
    } else if total_clipping_percent < 15.0 {
        2
    } else {
        1
    };

    Ok(ExposureReading {
        score,
        total_clipping_percent,
        flags,
    })
}

fn noise_score(gray: &GrayImage) -> Result<(u8, f64), MetricError> {
    let sigma = median_residual_std(gray)?;
    let score = if sigma < 5.0 {
        5
    } else if sigma < 10.0 {
        4
    } else if sigma < 15.0 {
        3
    } else if sigma < 25.0 {
        2
    } else {
        1
    };
    Ok((score, sigma))
}

/// Std-dev of (pixel - 5x5 median) over the whole image. The median filter
/// keeps structure and discards grain, so the residual approximates the
/// noise floor. Window coordinates clamp at the borders.
fn median_residual_std(gray: &GrayImage) -> Result<f64, MetricError> {
    let (width, height) = gray.dimensions();
    if width < 5 || height < 5 {
        return Err(MetricError::TooSmall {
            metric: "noise",
            width,
            height,
        });
    }

    let mut sum = 0.0;
    let mut sum_squares = 0.0;

    let mut window = [0u8; 25];
    for y in 0..height {
        for x in 0..width {
            let mut i = 0;
            for dy in -2i64..=2 {
                for dx in -2i64..=2 {
                    let wx = (i64::from(x) + dx).clamp(0, i64::from(width) - 1) as u32;
                    let wy = (i64::from(y) + dy).clamp(0, i64::from(height) - 1) as u32;
                    window[i] = gray.get_pixel(wx, wy)[0];
                    i += 1;
                }
            }
            window.sort_unstable();
            let median = window[12];

            let residual = f64::from(gray.get_pixel(x, y)[0]) - f64::from(median);
            sum += residual;
            sum_squares += residual * residual;
        }
    }

    let count = f64::from(width) * f64::from(height);
    let mean = sum / count;
    Ok((sum_squares / count - mean * mean).max(0.0).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb};

    fn engine() -> QualityEngine {
        QualityEngine::new(
            QualityWeights::default(),
            QualityEngine::DEFAULT_MIN_RESOLUTION_PIXELS,
        )
    }

    fn uniform_image(value: u8, size: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_pixel(size, size, Luma([value])))
    }

    fn checkerboard_image(size: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([10])
            } else {
                Luma([245])
            }
        }))
    }

    fn grainy_image(size: u32) -> DynamicImage {
        // Deterministic pseudo-noise: hash of the coordinates.
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(size, size, |x, y| {
            let h = x
                .wrapping_mul(2_654_435_761)
                .wrapping_add(y.wrapping_mul(40_503))
                .wrapping_mul(2_246_822_519);
            Luma([(h >> 16) as u8])
        }))
    }

    #[test]
    fn uniform_image_scores_minimum_sharpness() {
        let breakdown = engine().assess(Some(&uniform_image(128, 64)), 12_000_000);
        assert_eq!(breakdown.sharpness, 1);
        assert!(breakdown.metrics.blur_variance < 1.0);
        assert!(breakdown.flags.contains(&IssueFlag::MotionBlur));
    }

    #[test]
    fn checkerboard_scores_maximum_sharpness() {
        let breakdown = engine().assess(Some(&checkerboard_image(64)), 12_000_000);
        assert_eq!(breakdown.sharpness, 5);
        assert!(breakdown.metrics.blur_variance > 500.0);
    }

    #[test]
    fn midtone_image_scores_clean_exposure() {
        let breakdown = engine().assess(Some(&uniform_image(128, 64)), 12_000_000);
        assert_eq!(breakdown.exposure, 5);
        assert_eq!(breakdown.metrics.histogram_clipping_percent, 0.0);
        assert!(!breakdown.flags.contains(&IssueFlag::Overexposed));
    }

    #[test]
    fn blown_highlights_flag_overexposure() {
        // Top ~20% of rows fully clipped at 255.
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_fn(50, 50, |_, y| {
            if y < 10 {
                Rgb([255, 255, 255])
            } else {
                Rgb([120, 130, 140])
            }
        }));

        let breakdown = engine().assess(Some(&image), 12_000_000);
        assert!(breakdown.flags.contains(&IssueFlag::Overexposed));
        assert!(breakdown.exposure <= 2);
    }

    #[test]
    fn crushed_shadows_flag_underexposure() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_fn(50, 50, |_, y| {
            if y < 10 {
                Rgb([0, 0, 0])
            } else {
                Rgb([120, 130, 140])
            }
        }));

        let breakdown = engine().assess(Some(&image), 12_000_000);
        assert!(breakdown.flags.contains(&IssueFlag::Underexposed));
        assert!(!breakdown.flags.contains(&IssueFlag::Overexposed));
    }

    #[test]
    fn uniform_image_has_no_noise() {
        let breakdown = engine().assess(Some(&uniform_image(90, 64)), 12_000_000);
        assert_eq!(breakdown.noise, 5);
        assert_eq!(breakdown.metrics.snr_estimate, 0.0);
    }

    #[test]
    fn grain_drives_the_noise_score_down() {
        let breakdown = engine().assess(Some(&grainy_image(64)), 12_000_000);
        assert!(breakdown.noise <= 2);
        assert!(breakdown.flags.contains(&IssueFlag::HighNoise));
        assert!(breakdown.metrics.snr_estimate > 15.0);
    }

    #[test]
    fn resolution_tiers() {
        let engine = engine();
        assert_eq!(engine.resolution_score(24_000_000), (5, false));
        assert_eq!(engine.resolution_score(12_000_000), (4, false));
        assert_eq!(engine.resolution_score(8_000_000), (3, false));
        assert_eq!(engine.resolution_score(2_000_000), (2, false));
        assert_eq!(engine.resolution_score(1_999_999), (1, true));
    }

    #[test]
    fn low_resolution_is_flagged() {
        let breakdown = engine().assess(Some(&uniform_image(128, 64)), 640 * 480);
        assert_eq!(breakdown.resolution, 1);
        assert!(breakdown.flags.contains(&IssueFlag::LowResolution));
    }

    #[test]
    fn composite_rounds_half_away_from_zero() {
        let engine = engine();
        // 1*35 + 2*30 + 4*20 + 5*15 = 250 hundredths => 2.5 rounds up to 3.
        assert_eq!(engine.composite(1, 2, 4, 5), 3);
        // 5*35 + 4*30 + 3*20 + 2*15 = 385 hundredths => 3.85 rounds to 4.
        assert_eq!(engine.composite(5, 4, 3, 2), 4);
        assert_eq!(engine.composite(5, 5, 5, 5), 5);
        assert_eq!(engine.composite(1, 1, 1, 1), 1);
    }

    #[test]
    fn missing_pixels_yield_the_neutral_breakdown() {
        let breakdown = engine().assess(None, 24_000_000);

        assert_eq!(breakdown.sharpness, 3);
        assert_eq!(breakdown.exposure, 3);
        assert_eq!(breakdown.noise, 3);
        assert_eq!(breakdown.resolution, 3);
        assert_eq!(breakdown.quality_score, 3);
        assert!(breakdown.flags.contains(&IssueFlag::ProcessingError));
    }

    #[test]
    fn tiny_image_degrades_instead_of_failing() {
        // 2x2: too small for the Laplacian and the median window, but a
        // record still comes out with neutral substitutes.
        let breakdown = engine().assess(Some(&uniform_image(100, 2)), 12_000_000);

        assert_eq!(breakdown.sharpness, 3);
        assert_eq!(breakdown.noise, 3);
        assert!(breakdown.flags.contains(&IssueFlag::ProcessingError));
        assert!((1..=5).contains(&breakdown.quality_score));
    }

    #[test]
    fn weights_must_sum_to_one_hundred() {
        let bad = QualityWeights {
            sharpness: 40,
            exposure: 30,
            noise: 20,
            resolution: 15,
        };
        assert_eq!(
            bad.validate(),
            Err(ConfigError::WeightSum {
                name: "quality",
                sum: 105
            })
        );
        assert!(QualityWeights::default().validate().is_ok());
    }

    #[test]
    fn scoring_is_idempotent() {
        let engine = engine();
        let image = checkerboard_image(48);

        let first = engine.assess(Some(&image), 9_000_000);
        let second = engine.assess(Some(&image), 9_000_000);

        assert_eq!(first.quality_score, second.quality_score);
        assert_eq!(first.metrics.blur_variance, second.metrics.blur_variance);
        assert_eq!(first.flags, second.flags);
    }
}
