//! # Perceptual Hashing
//!
//! Perceptual hashing generates "fingerprints" that remain similar for visually
//! similar images, unlike checksums where minor changes produce completely
//! different outputs.
//!
//! The hash used here is a 64-bit mean hash: the image is reduced to an 8x8
//! grayscale grid and each bit records whether a cell is brighter than the mean.
//!
//! ## Hamming Distance Interpretation
//!
//! - 0-3: Nearly identical images (same image with minor modifications)
//! - 4-10: Similar images (same subject with moderate differences)
//! - >10: Different images

use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

/// A perceptual hash represented as a 64-bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PHash(pub u64);

impl PHash {
    /// Calculate the Hamming distance between two perceptual hashes
    pub fn distance(&self, other: &PHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Check if two images are perceptually similar based on a threshold
    pub fn is_similar(&self, other: &PHash, threshold: u32) -> bool {
        self.distance(other) <= threshold
    }
}

/// Calculate a 64-bit perceptual hash for a decoded image
pub fn calculate_phash(img: &DynamicImage) -> PHash {
    let small = img.resize_exact(8, 8, image::imageops::FilterType::Triangle);

    // Grayscale formula: 0.299*R + 0.587*G + 0.114*B
    let mut pixels = [0.0f32; 64];
    for (x, y, pixel) in small.pixels() {
        pixels[(y as usize) * 8 + (x as usize)] =
            0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32;
    }

    let mean = pixels.iter().sum::<f32>() / 64.0;

    let mut hash: u64 = 0;
    for (bit_pos, &p) in pixels.iter().enumerate() {
        if p > mean {
            hash |= 1u64 << bit_pos;
        }
    }

    PHash(hash)
}
