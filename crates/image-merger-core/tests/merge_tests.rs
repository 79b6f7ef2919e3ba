mod common;

use common::{collect_events, create_test_collection, create_test_image, create_text_file, Pattern};
use image_merger_core::discovery::ContentSniffer;
use image_merger_core::processing::{HashingOracle, PHash};
use image_merger_core::{
    CancellationToken, Config, Discard, Error, ImageFormat, ImageMerger, ImageRecord,
    MergeEngine, MergeEvent, Notifier, Phase, Resolution,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn merger() -> ImageMerger {
    ImageMerger::new(Config::default()).unwrap()
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap()
}

#[test]
fn test_distinct_input_is_kept() {
    let dir = tempdir().unwrap();
    let collection = dir.path().join("collection");
    create_test_collection(&collection);

    let input = create_test_image(&dir.path().join("new"), "other", 64, Pattern::TopBright);
    fs::remove_file(collection.join("subdir/top.png")).unwrap();

    let report = merger()
        .merge(&[input.clone()], &collection, Notifier::silent(), CancellationToken::new())
        .unwrap();

    assert!(!report.cancelled);
    assert_eq!(report.scan.images.len(), 1);
    assert_eq!(report.scan.folder_count, 2);
    assert_eq!(report.inputs.paths(), vec![canonical(&input)]);
    assert_eq!(report.collection.len(), 1);
    assert!(report.discarded.is_empty());
}

#[test]
fn test_lower_resolution_input_is_discarded() {
    let dir = tempdir().unwrap();
    let collection = dir.path().join("collection");
    create_test_collection(&collection);

    let input = create_test_image(&dir.path().join("new"), "left-small", 32, Pattern::LeftBright);

    let report = merger()
        .merge(&[input.clone()], &collection, Notifier::silent(), CancellationToken::new())
        .unwrap();

    assert!(report.inputs.is_empty());
    assert_eq!(report.collection.len(), 2);
    assert_eq!(report.discarded.len(), 1);

    let discarded = &report.discarded[0];
    assert_eq!(discarded.resolution, Resolution::InputDiscarded);
    assert_eq!(discarded.record.path(), canonical(&input));
    assert_eq!(discarded.survivor, canonical(&collection.join("left.png")));
}

#[test]
fn test_higher_resolution_input_replaces_collection_image() {
    let dir = tempdir().unwrap();
    let collection = dir.path().join("collection");
    create_test_collection(&collection);

    let input = create_test_image(&dir.path().join("new"), "left-large", 128, Pattern::LeftBright);

    let report = merger()
        .merge(&[input.clone()], &collection, Notifier::silent(), CancellationToken::new())
        .unwrap();

    assert_eq!(report.inputs.paths(), vec![canonical(&input)]);
    assert!(!report.collection.contains(&canonical(&collection.join("left.png"))));

    let discarded = &report.discarded[0];
    assert_eq!(discarded.resolution, Resolution::CollectionReplaced);
    assert_eq!(discarded.survivor, canonical(&input));
}

#[test]
fn test_collection_duplicates_are_removed() {
    let dir = tempdir().unwrap();
    let collection = dir.path().join("collection");
    create_test_collection(&collection);
    fs::copy(collection.join("left.png"), collection.join("left-copy.png")).unwrap();

    let report = merger()
        .merge(&[], &collection, Notifier::silent(), CancellationToken::new())
        .unwrap();

    assert_eq!(report.scan.images.len(), 3);
    assert_eq!(report.collection.len(), 2);
    assert_eq!(report.discarded.len(), 1);
    assert_eq!(report.discarded[0].resolution, Resolution::CollectionDuplicate);
}

#[test]
fn test_input_inside_collection_counts_as_collection() {
    let dir = tempdir().unwrap();
    let collection = dir.path().join("c");
    let inside = create_test_image(&collection, "x", 64, Pattern::LeftBright);
    let outside = create_test_image(&dir.path().join("a"), "y", 64, Pattern::TopBright);

    let report = merger()
        .merge(
            &[inside.clone(), outside.clone()],
            &collection,
            Notifier::silent(),
            CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(report.excluded_inputs, vec![inside.clone()]);
    assert!(report.collection.contains(&canonical(&inside)));
    assert!(!report.inputs.contains(&canonical(&inside)));
    assert_eq!(report.inputs.paths(), vec![canonical(&outside)]);
}

#[test]
fn test_missing_collection_root_is_empty() {
    let dir = tempdir().unwrap();
    let input = create_test_image(dir.path(), "solo", 16, Pattern::LeftBright);

    let report = merger()
        .merge(
            &[input],
            &dir.path().join("does-not-exist"),
            Notifier::silent(),
            CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(report.scan.folder_count, 0);
    assert!(report.collection.is_empty());
    assert_eq!(report.inputs.len(), 1);
}

#[test]
fn test_undecodable_input_fails_with_path() {
    let dir = tempdir().unwrap();
    let collection = dir.path().join("collection");
    create_test_collection(&collection);
    let broken = create_text_file(&dir.path().join("new"), "broken.png");

    let err = merger()
        .merge(&[broken.clone()], &collection, Notifier::silent(), CancellationToken::new())
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
    assert_eq!(err.path(), Some(canonical(&broken).as_path()));
}

#[test]
fn test_notifications_follow_phase_order() {
    let dir = tempdir().unwrap();
    let collection = dir.path().join("collection");
    create_test_collection(&collection);
    let input = create_test_image(&dir.path().join("new"), "left-small", 32, Pattern::LeftBright);

    let (notifier, rx) = Notifier::channel();
    merger()
        .merge(&[input], &collection, notifier, CancellationToken::new())
        .unwrap();
    let events = collect_events(&rx);

    let phases: Vec<Phase> = events
        .iter()
        .filter_map(|e| match e {
            MergeEvent::PhaseChanged(phase) => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(phases, vec![Phase::Scan, Phase::Fingerprint, Phase::Compare]);

    // Every phase change is immediately followed by a progress reset
    for (i, event) in events.iter().enumerate() {
        if let MergeEvent::PhaseChanged(_) = event {
            assert_eq!(events[i + 1], MergeEvent::ProgressChanged(0));
        }
    }

    // Within a phase, percentages only increase
    let mut last = 0;
    for event in &events {
        match event {
            MergeEvent::PhaseChanged(_) => last = 0,
            MergeEvent::ProgressChanged(0) => {}
            MergeEvent::ProgressChanged(p) => {
                assert!(*p > last);
                last = *p;
            }
            MergeEvent::InputCountChanged { .. } => {}
        }
    }

    // The final scan count is always delivered
    let last_count = events
        .iter()
        .filter_map(|e| match e {
            MergeEvent::InputCountChanged { files, folders } => Some((*files, *folders)),
            _ => None,
        })
        .last();
    assert_eq!(last_count, Some((2, 2)));

    // Fingerprinting completes before comparison starts
    let compare_at = events
        .iter()
        .position(|e| *e == MergeEvent::PhaseChanged(Phase::Compare))
        .unwrap();
    assert_eq!(events[compare_at - 1], MergeEvent::ProgressChanged(100));
}

#[test]
fn test_cancelled_before_start() {
    let dir = tempdir().unwrap();
    let collection = dir.path().join("collection");
    create_test_collection(&collection);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let (notifier, rx) = Notifier::channel();

    let report = merger().merge(&[], &collection, notifier, cancel).unwrap();

    assert!(report.cancelled);
    assert!(report.scan.images.is_empty());
    assert!(report.collection.is_empty());
    assert!(!collect_events(&rx).contains(&MergeEvent::PhaseChanged(Phase::Fingerprint)));
}

/// Oracle that fabricates records and cancels the merge after a number of calls
struct CancellingOracle {
    calls: std::cell::Cell<usize>,
    limit: usize,
    cancel: CancellationToken,
}

impl HashingOracle for CancellingOracle {
    fn compute_attributes(&self, path: &Path) -> image_merger_core::Result<ImageRecord> {
        self.calls.set(self.calls.get() + 1);
        if self.calls.get() >= self.limit {
            self.cancel.cancel();
        }
        Ok(ImageRecord::new(
            path.to_path_buf(),
            1,
            1,
            blake3::hash(path.to_string_lossy().as_bytes()),
            1,
            ImageFormat::Other,
            PHash(self.calls.get() as u64),
        ))
    }
}

struct AcceptAll;

impl ContentSniffer for AcceptAll {
    fn is_supported_image(&self, _path: &Path) -> bool {
        true
    }
}

#[test]
fn test_cancel_during_fingerprinting_skips_compare() {
    let dir = tempdir().unwrap();
    let collection = dir.path().join("collection");
    for name in ["a.bin", "b.bin", "c.bin"] {
        create_text_file(&collection, name);
    }

    let cancel = CancellationToken::new();
    let oracle = CancellingOracle {
        calls: std::cell::Cell::new(0),
        limit: 1,
        cancel: cancel.clone(),
    };
    let (notifier, rx) = Notifier::channel();
    let engine = MergeEngine::with_collaborators(oracle, AcceptAll, notifier, cancel);

    let mut compared = 0;
    let report = engine
        .merge(&[], &collection, |_, _| {
            compared += 1;
            Discard::None
        })
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.scan.images.len(), 3);
    assert_eq!(report.collection.len(), 1);
    assert_eq!(compared, 0);
    assert!(!collect_events(&rx).contains(&MergeEvent::PhaseChanged(Phase::Compare)));
}
