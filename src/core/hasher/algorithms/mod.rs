//! The three hash family implementations.

mod average;
mod difference;
mod perceptual;

pub use average::AverageHasher;
pub use difference::DifferenceHasher;
pub use perceptual::PerceptualHasher;
