use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::cancel::CancellationToken;
use crate::discovery::{ContentSniffer, MagicSniffer};
use crate::error::{Error, Result};
use crate::image_set::ImageSet;
use crate::log_hash_error;
use crate::processing::{calculate_phash, compute_cryptographic};
use crate::progress::PercentageFilter;
use crate::types::ImageRecord;

/// Computes the identifying attributes of a single image file.
///
/// This is the expensive step of a merge and is called once per image.
pub trait HashingOracle {
    /// Build a record for the image at `path`, failing if it cannot be read or decoded
    fn compute_attributes(&self, path: &Path) -> Result<ImageRecord>;
}

/// Default oracle: decodes with the `image` crate, checksums with Blake3 and
/// derives a 64-bit perceptual hash. The format tag comes from `sniffer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFingerprinter<S = MagicSniffer> {
    sniffer: S,
}

impl<S: ContentSniffer> ImageFingerprinter<S> {
    pub fn new(sniffer: S) -> Self {
        Self { sniffer }
    }
}

impl<S: ContentSniffer> HashingOracle for ImageFingerprinter<S> {
    fn compute_attributes(&self, path: &Path) -> Result<ImageRecord> {
        let path = path.canonicalize().map_err(|e| Error::io(path, e))?;
        let file_size = std::fs::metadata(&path)
            .map_err(|e| Error::io(&path, e))?
            .len();

        let reader = image::io::Reader::open(&path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| Error::io(&path, e))?;
        let img = reader.decode().map_err(|source| Error::Decode {
            path: path.clone(),
            source,
        })?;

        let format = self.sniffer.format_of(&path);
        let checksum = compute_cryptographic(&path)?;
        let phash = calculate_phash(&img);

        Ok(ImageRecord::new(
            path,
            img.width(),
            img.height(),
            checksum,
            file_size,
            format,
            phash,
        ))
    }
}

/// Fingerprint every path in order, collecting the records into a set.
///
/// Progress continues from `progress.count()` towards `total`, so consecutive
/// calls can share one 0-100% range. Cancellation is checked before each path
/// and yields the partial set. A path the oracle cannot handle fails the whole
/// call.
pub fn fingerprint<O: HashingOracle + ?Sized>(
    paths: &[PathBuf],
    oracle: &O,
    cancel: &CancellationToken,
    progress: &mut PercentageFilter,
    total: u64,
) -> Result<ImageSet> {
    let mut result = ImageSet::new();
    let mut count = progress.count();

    for path in paths {
        if cancel.is_cancelled() {
            info!(
                "Fingerprinting cancelled after {} of {} paths",
                result.len(),
                paths.len()
            );
            break;
        }

        let record = oracle.compute_attributes(path).map_err(|e| {
            log_hash_error(path, &e);
            e
        })?;

        if !result.insert(record) {
            debug!("Skipping repeated path: {}", path.display());
        }

        count += 1;
        progress.update(count, total);
    }

    Ok(result)
}
