//! Core functionality for merging new images into an existing collection.
//!
//! This library provides the foundational components of a merge:
//! - Collection discovery with content-based format sniffing
//! - Image fingerprinting (checksum, dimensions, perceptual hash)
//! - Pairing strategies that deduplicate a collection and merge inputs into it
//! - Rate-limited progress notifications and cooperative cancellation

// -- External Dependencies --
use log::info;

// -- Standard Library --
use std::path::{Path, PathBuf};

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use cancel::CancellationToken;
pub use config::*;
pub use deduplication::{Appraiser, Pairing};
pub use engine::{DiscardedImage, MergeEngine, MergeReport, Resolution};
pub use error::{Error, Result};
pub use image_set::ImageSet;
pub use logging::{init_logger, log_hash_error};
pub use progress::{MergeEvent, Notifier};
pub use types::*;

// -- Public Modules --
pub mod cancel;
pub mod config;
pub mod deduplication;
pub mod discovery;
pub mod engine;
pub mod image_set;
pub mod logging;
pub mod processing;
pub mod progress;
pub mod types;

/// Main entry point for a policy-driven merge
pub struct ImageMerger {
    config: Config,
    appraiser: Appraiser,
}

impl ImageMerger {
    /// Create a new ImageMerger with the provided configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let appraiser = Appraiser::new(&config);
        Ok(Self { config, appraiser })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a merge on the calling thread, resolving duplicates with the configured priority rules
    pub fn merge(
        &self,
        input_paths: &[PathBuf],
        collection_root: &Path,
        notifier: Notifier,
        cancel: CancellationToken,
    ) -> Result<MergeReport> {
        info!(
            "Merging {} inputs into {}",
            input_paths.len(),
            collection_root.display()
        );

        let engine =
            MergeEngine::new(notifier, cancel).with_scan_interval(self.config.scan_interval());
        engine.merge(input_paths, collection_root, |left, right| {
            self.appraiser.appraise(left, right)
        })
    }
}
