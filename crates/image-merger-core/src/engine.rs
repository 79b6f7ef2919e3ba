use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::deduplication::{Comparator, Erased, Pairing};
use crate::discovery::{scan_for_images, ContentSniffer, MagicSniffer, ScanResult};
use crate::error::Result;
use crate::image_set::ImageSet;
use crate::logging::log_discard;
use crate::processing::{fingerprint, HashingOracle, ImageFingerprinter};
use crate::progress::{DenseUpdater, MergeEvent, Notifier, PercentageFilter, UpdateKind};
use crate::types::{Discard, ImageRecord, Phase};

/// Default minimum interval between scan count notifications
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(20);

/// Why an image was dropped during the compare phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Duplicate of another image already in the collection
    CollectionDuplicate,

    /// Input image discarded in favour of the existing collection image
    InputDiscarded,

    /// Collection image to be replaced by the input image
    CollectionReplaced,
}

/// An image removed from its group, and the image that survived in its place
#[derive(Debug, Clone)]
pub struct DiscardedImage {
    pub record: ImageRecord,
    pub survivor: PathBuf,
    pub resolution: Resolution,
}

/// State of both image groups when a merge finishes or is cancelled
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Input images still standing; none of them duplicates the collection
    pub inputs: ImageSet,

    /// Collection images still standing
    pub collection: ImageSet,

    /// Every image discarded during comparison, in verdict order
    pub discarded: Vec<DiscardedImage>,

    /// Result of scanning the collection root
    pub scan: ScanResult,

    /// Input paths dropped because they already live inside the collection
    pub excluded_inputs: Vec<PathBuf>,

    /// Whether the merge stopped early because cancellation was requested
    pub cancelled: bool,
}

/// Sequences the scan, fingerprint and compare phases of a merge.
///
/// The engine runs on whichever thread calls [`MergeEngine::merge`] and works
/// strictly sequentially. Notifications are written to its [`Notifier`];
/// cancellation is requested through its [`CancellationToken`].
pub struct MergeEngine<O = ImageFingerprinter, S = MagicSniffer> {
    oracle: O,
    sniffer: S,
    notifier: Notifier,
    cancel: CancellationToken,
    scan_interval: Duration,
}

impl MergeEngine {
    /// Create an engine using the default image decoder and content sniffer
    pub fn new(notifier: Notifier, cancel: CancellationToken) -> Self {
        Self::with_collaborators(
            ImageFingerprinter::new(MagicSniffer),
            MagicSniffer,
            notifier,
            cancel,
        )
    }
}

impl<O: HashingOracle, S: ContentSniffer> MergeEngine<O, S> {
    pub fn with_collaborators(
        oracle: O,
        sniffer: S,
        notifier: Notifier,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            oracle,
            sniffer,
            notifier,
            cancel,
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    /// Merge `input_paths` into the collection of images below `collection_root`.
    ///
    /// 1. The collection root is scanned for supported images.
    /// 2. Inputs and collection images are fingerprinted; inputs that turn out
    ///    to be collection members are dropped from the inputs.
    /// 3. The collection is deduplicated, then every input is compared with
    ///    every collection image. `verdict` decides each pair; for the second
    ///    step the input is the left image and the collection image the right.
    ///
    /// Inputs located below `collection_root` are treated as part of the
    /// collection. Cancellation ends the merge early with a partial report and
    /// no error; the only failure is an image that cannot be fingerprinted.
    pub fn merge<F>(
        &self,
        input_paths: &[PathBuf],
        collection_root: &Path,
        mut verdict: F,
    ) -> Result<MergeReport>
    where
        F: FnMut(&ImageRecord, &ImageRecord) -> Discard,
    {
        let mut report = MergeReport::default();
        let mut phase = None;

        // -- Scan --
        self.change_phase(&mut phase, Phase::Scan);

        let mut updater = DenseUpdater::new(self.notifier.clone(), self.scan_interval);
        updater.update(0, 0, UpdateKind::Transient);
        report.scan = scan_for_images(collection_root, &self.sniffer, &self.cancel, &mut updater);
        updater.update(
            report.scan.images.len(),
            report.scan.folder_count,
            UpdateKind::Final,
        );
        info!(
            "Found {} images in {} folders under {}",
            report.scan.images.len(),
            report.scan.folder_count,
            collection_root.display()
        );

        if self.stop_requested(&mut report) {
            return Ok(report);
        }

        let (inputs, excluded) = partition_inputs(input_paths, collection_root);
        report.excluded_inputs = excluded;

        // -- Fingerprint --
        self.change_phase(&mut phase, Phase::Fingerprint);

        let total = (inputs.len() + report.scan.images.len()) as u64;
        let mut progress = PercentageFilter::new(self.notifier.clone());
        report.inputs = fingerprint(&inputs, &self.oracle, &self.cancel, &mut progress, total)?;
        report.collection = fingerprint(
            &report.scan.images,
            &self.oracle,
            &self.cancel,
            &mut progress,
            total,
        )?;

        let collection = &report.collection;
        report.inputs.retain(|record| {
            let present = collection.contains(record.path());
            if present {
                debug!("Input already in collection: {}", record.path().display());
            }
            !present
        });
        info!(
            "Fingerprinted {} inputs and {} collection images",
            report.inputs.len(),
            report.collection.len()
        );

        if self.stop_requested(&mut report) {
            return Ok(report);
        }

        // -- Compare --
        self.change_phase(&mut phase, Phase::Compare);

        let dedupe_count = Pairing::Deduplicate(&mut report.collection).count();
        let merge_count = Pairing::Merge {
            src: &mut report.inputs,
            dst: &mut report.collection,
        }
        .count();

        let mut progress = PercentageFilter::new(self.notifier.clone());
        let mut comparator = Comparator::new(&mut progress, dedupe_count + merge_count);

        let duplicates = comparator.compare(
            &mut Pairing::Deduplicate(&mut report.collection),
            &self.cancel,
            &mut verdict,
        );
        record_discards(&mut report.discarded, duplicates, |_| {
            Resolution::CollectionDuplicate
        });

        let merged = comparator.compare(
            &mut Pairing::Merge {
                src: &mut report.inputs,
                dst: &mut report.collection,
            },
            &self.cancel,
            &mut verdict,
        );
        record_discards(&mut report.discarded, merged, merge_resolution);
        resolve_survivors(&mut report.discarded, &report.inputs);

        info!(
            "Compared images: {} discarded, {} inputs remain",
            report.discarded.len(),
            report.inputs.len()
        );

        self.stop_requested(&mut report);
        Ok(report)
    }

    /// Enter `next`, which must come after the current phase, and reset the displayed progress
    fn change_phase(&self, current: &mut Option<Phase>, next: Phase) {
        debug_assert!(current.map_or(true, |phase| phase < next));
        *current = Some(next);

        info!("Entering phase: {}", next);
        self.notifier.send(MergeEvent::PhaseChanged(next));
        self.notifier.send(MergeEvent::ProgressChanged(0));
    }

    fn stop_requested(&self, report: &mut MergeReport) -> bool {
        if self.cancel.is_cancelled() {
            info!("Merge cancelled");
            report.cancelled = true;
        }
        report.cancelled
    }
}

/// Split input paths into those outside the collection root and those inside it
fn partition_inputs(input_paths: &[PathBuf], collection_root: &Path) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let root = collection_root
        .canonicalize()
        .unwrap_or_else(|_| collection_root.to_path_buf());

    input_paths.iter().cloned().partition(|path| {
        let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
        let inside = resolved.starts_with(&root);
        if inside {
            debug!("Treating input as collection member: {}", path.display());
        }
        !inside
    })
}

fn merge_resolution(side: Discard) -> Resolution {
    match side {
        Discard::Left => Resolution::InputDiscarded,
        Discard::Right => Resolution::CollectionReplaced,
        Discard::None => unreachable!("pairings only erase on a Left or Right verdict"),
    }
}

/// Point every discarded image at the image that finally survived in its place.
///
/// A survivor may itself be discarded later in the run, e.g. an input that
/// replaced one collection image and then lost to another. Survivors are
/// followed until a live image is reached; collection images whose final
/// survivor is not a remaining input become duplicates within the collection.
fn resolve_survivors(discarded: &mut [DiscardedImage], inputs: &ImageSet) {
    let successors: HashMap<PathBuf, PathBuf> = discarded
        .iter()
        .map(|item| (item.record.path().to_path_buf(), item.survivor.clone()))
        .collect();

    for item in discarded.iter_mut() {
        let mut survivor = item.survivor.clone();
        for _ in 0..successors.len() {
            match successors.get(&survivor) {
                Some(next) => survivor = next.clone(),
                None => break,
            }
        }

        if item.resolution != Resolution::InputDiscarded {
            item.resolution = if inputs.contains(&survivor) {
                Resolution::CollectionReplaced
            } else {
                Resolution::CollectionDuplicate
            };
        }

        if survivor != item.survivor {
            debug!(
                "Survivor of {} was discarded; now kept: {}",
                item.record.path().display(),
                survivor.display()
            );
            item.survivor = survivor;
        }
    }
}

fn record_discards(
    discarded: &mut Vec<DiscardedImage>,
    erased: Vec<Erased>,
    resolution: impl Fn(Discard) -> Resolution,
) {
    for item in erased {
        let resolution = resolution(item.side);
        let group = match resolution {
            Resolution::InputDiscarded => "inputs",
            Resolution::CollectionDuplicate | Resolution::CollectionReplaced => "collection",
        };
        log_discard(group, item.record.path(), &item.survivor);

        discarded.push(DiscardedImage {
            record: item.record,
            survivor: item.survivor,
            resolution,
        });
    }
}
