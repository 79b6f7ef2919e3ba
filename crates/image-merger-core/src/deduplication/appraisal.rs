use std::cmp::Ordering;

use crate::config::{Config, PriorityRule};
use crate::types::{Discard, ImageFormat, ImageRecord};

/// Policy-driven verdict function built from the configuration.
///
/// Two records are duplicates when their checksums match or their perceptual
/// hashes are within `phash_threshold` of each other. For duplicates the
/// priority rules pick the survivor, in order; if every rule ties, the left
/// image is discarded so the existing (right-hand) image is kept.
#[derive(Debug, Clone)]
pub struct Appraiser {
    threshold: u32,
    rules: Vec<PriorityRule>,
    preferred_format: ImageFormat,
}

impl Appraiser {
    pub fn new(config: &Config) -> Self {
        Self {
            threshold: config.phash_threshold,
            rules: config.prioritization.clone(),
            preferred_format: config.preferred_format,
        }
    }

    pub fn is_duplicate(&self, left: &ImageRecord, right: &ImageRecord) -> bool {
        left.checksum() == right.checksum()
            || left.phash().is_similar(&right.phash(), self.threshold)
    }

    /// Decide which, if either, of a pair to discard
    pub fn appraise(&self, left: &ImageRecord, right: &ImageRecord) -> Discard {
        if !self.is_duplicate(left, right) {
            return Discard::None;
        }

        for rule in &self.rules {
            match self.rank(*rule, left, right) {
                Ordering::Greater => return Discard::Right,
                Ordering::Less => return Discard::Left,
                Ordering::Equal => {}
            }
        }

        Discard::Left
    }

    /// `Greater` when `left` is preferable under `rule`
    fn rank(&self, rule: PriorityRule, left: &ImageRecord, right: &ImageRecord) -> Ordering {
        match rule {
            PriorityRule::HighestResolution => left.resolution().cmp(&right.resolution()),
            PriorityRule::LargestFileSize => left.file_size().cmp(&right.file_size()),
            PriorityRule::SmallestFileSize => right.file_size().cmp(&left.file_size()),
            PriorityRule::PreferredFormat => {
                let preferred = |r: &ImageRecord| r.format() == self.preferred_format;
                preferred(left).cmp(&preferred(right))
            }
        }
    }
}
