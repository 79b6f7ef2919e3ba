use crate::cancel::CancellationToken;
use crate::deduplication::pairing::{Erased, Pairing};
use crate::progress::PercentageFilter;
use crate::types::{Discard, ImageRecord};

/// Drives pairing strategies while accounting for progress.
///
/// Several strategies may run against one comparator; the counter carries on
/// from wherever the shared percentage filter left off, so together they cover
/// a single 0-100% range of `total` comparisons.
pub struct Comparator<'p> {
    progress: &'p mut PercentageFilter,
    total: u64,
}

impl<'p> Comparator<'p> {
    pub fn new(progress: &'p mut PercentageFilter, total: u64) -> Self {
        Self { progress, total }
    }

    /// Run `pairing` to completion or cancellation, counting every pair once
    /// regardless of its verdict.
    pub fn compare<F>(
        &mut self,
        pairing: &mut Pairing<'_>,
        cancel: &CancellationToken,
        verdict: &mut F,
    ) -> Vec<Erased>
    where
        F: FnMut(&ImageRecord, &ImageRecord) -> Discard,
    {
        let total = self.total;
        let progress = &mut *self.progress;
        let mut count = progress.count();

        pairing.pair(cancel, |a, b| {
            let choice = verdict(a, b);
            count += 1;
            progress.update(count, total);
            choice
        })
    }
}
