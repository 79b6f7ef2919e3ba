use std::path::PathBuf;

use crate::cancel::CancellationToken;
use crate::image_set::ImageSet;
use crate::types::{Discard, ImageRecord};

/// A record removed from its set by a comparison verdict
#[derive(Debug, Clone)]
pub struct Erased {
    /// The record that was removed
    pub record: ImageRecord,

    /// Path of the other image in the pair, which was kept
    pub survivor: PathBuf,

    /// Which side of the pair the record was on; never `Discard::None`
    pub side: Discard,
}

/// Which image records get compared to which, and in what order.
///
/// Both strategies mutate the sets they borrow as verdicts come in. Records are
/// tombstoned in place, so an erased record is never handed to the verdict
/// function again and no position held by the enumeration is invalidated.
#[derive(Debug)]
pub enum Pairing<'a> {
    /// Every unordered pair of distinct records within one set, exactly once
    Deduplicate(&'a mut ImageSet),

    /// Every (source, destination) pair, source-major
    Merge {
        src: &'a mut ImageSet,
        dst: &'a mut ImageSet,
    },
}

impl Pairing<'_> {
    /// Number of comparisons a full run performs if nothing is erased.
    /// Erasures make the realised number smaller; the estimate is not revised.
    pub fn count(&self) -> u64 {
        match self {
            Pairing::Deduplicate(set) => {
                let n = set.len() as u64;
                n * n.saturating_sub(1) / 2
            }
            Pairing::Merge { src, dst } => src.len() as u64 * dst.len() as u64,
        }
    }

    /// Run every comparison, applying each verdict before the next pair is formed.
    ///
    /// `verdict` receives the left and right record of each pair; `Discard::Left`
    /// erases the left one and `Discard::Right` the right one. Cancellation is
    /// checked before each pair; mutations already applied are kept.
    pub fn pair<F>(&mut self, cancel: &CancellationToken, mut verdict: F) -> Vec<Erased>
    where
        F: FnMut(&ImageRecord, &ImageRecord) -> Discard,
    {
        match self {
            Pairing::Deduplicate(set) => deduplicate(set, cancel, &mut verdict),
            Pairing::Merge { src, dst } => merge(src, dst, cancel, &mut verdict),
        }
    }
}

fn deduplicate<F>(set: &mut ImageSet, cancel: &CancellationToken, verdict: &mut F) -> Vec<Erased>
where
    F: FnMut(&ImageRecord, &ImageRecord) -> Discard,
{
    let mut erased = Vec::new();
    let slots = set.slot_count();

    'lhs: for lhs in 0..slots {
        if set.slot(lhs).is_none() {
            continue;
        }

        for rhs in (lhs + 1)..slots {
            if cancel.is_cancelled() {
                break 'lhs;
            }

            let (Some(a), Some(b)) = (set.slot(lhs), set.slot(rhs)) else {
                continue;
            };

            match verdict(a, b) {
                Discard::None => {}
                Discard::Left => {
                    let survivor = b.path().to_path_buf();
                    if let Some(record) = set.erase_slot(lhs) {
                        erased.push(Erased {
                            record,
                            survivor,
                            side: Discard::Left,
                        });
                    }
                    continue 'lhs;
                }
                Discard::Right => {
                    let survivor = a.path().to_path_buf();
                    if let Some(record) = set.erase_slot(rhs) {
                        erased.push(Erased {
                            record,
                            survivor,
                            side: Discard::Right,
                        });
                    }
                }
            }
        }
    }

    erased
}

fn merge<F>(
    src: &mut ImageSet,
    dst: &mut ImageSet,
    cancel: &CancellationToken,
    verdict: &mut F,
) -> Vec<Erased>
where
    F: FnMut(&ImageRecord, &ImageRecord) -> Discard,
{
    let mut erased = Vec::new();
    let dst_slots = dst.slot_count();

    'src: for s in 0..src.slot_count() {
        if src.slot(s).is_none() {
            continue;
        }

        for d in 0..dst_slots {
            if cancel.is_cancelled() {
                break 'src;
            }

            let (Some(a), Some(b)) = (src.slot(s), dst.slot(d)) else {
                continue;
            };

            match verdict(a, b) {
                Discard::None => {}
                Discard::Left => {
                    let survivor = b.path().to_path_buf();
                    if let Some(record) = src.erase_slot(s) {
                        erased.push(Erased {
                            record,
                            survivor,
                            side: Discard::Left,
                        });
                    }
                    continue 'src;
                }
                Discard::Right => {
                    let survivor = a.path().to_path_buf();
                    if let Some(record) = dst.erase_slot(d) {
                        erased.push(Erased {
                            record,
                            survivor,
                            side: Discard::Right,
                        });
                    }
                }
            }
        }
    }

    erased
}
