use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::processing::PHash;

/// Image formats that receive special treatment when appraising duplicates.
/// Everything else the decoder understands is grouped under `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Bmp,
    Gif,
    Jpeg,
    Png,
    Other,
}

impl From<image::ImageFormat> for ImageFormat {
    fn from(format: image::ImageFormat) -> Self {
        match format {
            image::ImageFormat::Bmp => Self::Bmp,
            image::ImageFormat::Gif => Self::Gif,
            image::ImageFormat::Jpeg => Self::Jpeg,
            image::ImageFormat::Png => Self::Png,
            _ => Self::Other,
        }
    }
}

/// Fingerprinted description of one image file.
///
/// Two records are equal iff their paths refer to the same filesystem location;
/// this is stronger than bytewise equality, which is assessed by comparing
/// `checksum` or `phash`.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    path: PathBuf,
    width: u32,
    height: u32,
    checksum: blake3::Hash,
    file_size: u64,
    format: ImageFormat,
    phash: PHash,
}

impl ImageRecord {
    /// Assemble a record from attributes already computed by a hashing oracle.
    /// `path` is expected to be canonical.
    pub fn new(
        path: PathBuf,
        width: u32,
        height: u32,
        checksum: blake3::Hash,
        file_size: u64,
        format: ImageFormat,
        phash: PHash,
    ) -> Self {
        Self {
            path,
            width,
            height,
            checksum,
            file_size,
            format,
            phash,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel count, used to rank resolutions
    pub fn resolution(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn checksum(&self) -> &blake3::Hash {
        &self.checksum
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn phash(&self) -> PHash {
        self.phash
    }

    /// Whether every comparable attribute matches, not just the path
    pub fn same_attributes(&self, other: &ImageRecord) -> bool {
        self.path == other.path
            && self.width == other.width
            && self.height == other.height
            && self.checksum == other.checksum
            && self.file_size == other.file_size
            && self.format == other.format
            && self.phash == other.phash
    }
}

impl PartialEq for ImageRecord {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ImageRecord {}

impl Hash for ImageRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// Which (if either) of a compared pair should be discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
    /// Keep both images
    None,

    /// Erase the first image of the pair
    Left,

    /// Erase the second image of the pair
    Right,
}

/// Processing states a merge passes through, strictly in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Scan,
    Fingerprint,
    Compare,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Scan => "Scanning",
            Phase::Fingerprint => "Fingerprinting",
            Phase::Compare => "Comparing",
        };
        f.write_str(name)
    }
}
