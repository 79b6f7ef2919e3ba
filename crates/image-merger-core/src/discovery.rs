use log::{debug, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cancel::CancellationToken;
use crate::progress::{DenseUpdater, UpdateKind};
use crate::types::ImageFormat;

/// Decides whether a file holds an image the merge is able to process
pub trait ContentSniffer {
    fn is_supported_image(&self, path: &Path) -> bool;

    /// Format tag for a supported file; `Other` when the sniffer cannot tell
    fn format_of(&self, _path: &Path) -> ImageFormat {
        ImageFormat::Other
    }
}

/// Classifies files by their leading magic bytes rather than their extension.
/// A file is supported when its sniffed format can be decoded by this build.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;

impl MagicSniffer {
    fn sniff(path: &Path) -> Option<image::ImageFormat> {
        // No format hint from the extension; only the content decides
        let reader = File::open(path)
            .map(|file| image::io::Reader::new(BufReader::new(file)))
            .and_then(|reader| reader.with_guessed_format());

        match reader {
            Ok(reader) => reader.format(),
            Err(e) => {
                debug!("Could not sniff {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl ContentSniffer for MagicSniffer {
    fn is_supported_image(&self, path: &Path) -> bool {
        Self::sniff(path).is_some_and(|format| format.can_read())
    }

    fn format_of(&self, path: &Path) -> ImageFormat {
        Self::sniff(path).map_or(ImageFormat::Other, ImageFormat::from)
    }
}

/// Outcome of scanning one filesystem root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Supported image files, in enumeration order
    pub images: Vec<PathBuf>,

    /// Number of directories visited, including the root itself
    pub folder_count: usize,
}

/// Recursively collect the supported image files below `root`.
///
/// A missing root yields an empty result. A root that is itself a file is
/// included iff it is supported. Cancellation is checked before every entry;
/// once set, the walk stops and the partial result is returned. Each new image
/// or directory is offered to `reporter`.
pub fn scan_for_images<S: ContentSniffer + ?Sized>(
    root: &Path,
    sniffer: &S,
    cancel: &CancellationToken,
    reporter: &mut DenseUpdater,
) -> ScanResult {
    let mut result = ScanResult::default();

    if !root.exists() {
        info!("Scan root does not exist: {}", root.display());
        return result;
    }

    let mut walker = WalkDir::new(root).follow_links(true).into_iter();

    loop {
        if cancel.is_cancelled() {
            info!(
                "Scan cancelled after {} images in {} folders",
                result.images.len(),
                result.folder_count
            );
            break;
        }

        let entry = match walker.next() {
            Some(Ok(entry)) => entry,
            Some(Err(e)) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
            None => break,
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            result.folder_count += 1;
        } else if file_type.is_file() && sniffer.is_supported_image(entry.path()) {
            result.images.push(entry.into_path());
        } else {
            continue;
        }

        reporter.update(
            result.images.len(),
            result.folder_count,
            UpdateKind::Transient,
        );
    }

    result
}

// -- Tests --
