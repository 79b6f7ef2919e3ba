//! Rate-limited progress notifications.
//!
//! A merge changes its internal state far more often than anyone needs to
//! observe it. The filters here decide *whether* a report is forwarded to the
//! [`Notifier`]; they never alter the values being reported.

use crossbeam::channel::{self, Receiver, Sender};
use log::debug;
use std::time::{Duration, Instant};

use crate::types::Phase;

/// Notifications published while a merge is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeEvent {
    /// A new phase has begun; displayed progress restarts at zero
    PhaseChanged(Phase),

    /// Supported image files found and directories visited so far
    InputCountChanged { files: usize, folders: usize },

    /// Integer percentage of the current phase completed
    ProgressChanged(u8),
}

/// Sending half of the notification channel consumed by the surrounding application
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    sender: Option<Sender<MergeEvent>>,
}

impl Notifier {
    pub fn new(sender: Sender<MergeEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Create a notifier together with an unbounded receiver for its events
    pub fn channel() -> (Self, Receiver<MergeEvent>) {
        let (tx, rx) = channel::unbounded();
        (Self::new(tx), rx)
    }

    /// A notifier that discards everything
    pub fn silent() -> Self {
        Self { sender: None }
    }

    pub fn send(&self, event: MergeEvent) {
        if let Some(sender) = &self.sender {
            if sender.send(event).is_err() {
                debug!("Notification receiver dropped; discarding {:?}", event);
            }
        }
    }
}

/// Marks whether a dense update is an intermediate state or the last one of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Transient,
    Final,
}

/// Throttles file/folder count notifications during a scan.
///
/// Only the latest state matters while scanning, so a transient update is
/// forwarded only once `interval` has elapsed since the last one. A `Final`
/// update is always forwarded.
#[derive(Debug)]
pub struct DenseUpdater {
    notifier: Notifier,
    interval: Duration,
    last_emitted: Option<Instant>,
}

impl DenseUpdater {
    pub fn new(notifier: Notifier, interval: Duration) -> Self {
        Self {
            notifier,
            interval,
            last_emitted: None,
        }
    }

    /// Offer the current counts; returns whether a notification was sent
    pub fn update(&mut self, files: usize, folders: usize, kind: UpdateKind) -> bool {
        let due = match (kind, self.last_emitted) {
            (UpdateKind::Final, _) | (_, None) => true,
            (UpdateKind::Transient, Some(last)) => last.elapsed() >= self.interval,
        };

        if due {
            self.notifier
                .send(MergeEvent::InputCountChanged { files, folders });
            self.last_emitted = Some(Instant::now());
        }

        due
    }
}

/// Converts `count / total` into a percentage rounded half away from zero.
///
/// An empty total counts as complete.
pub fn int_percentage(count: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }

    let (count, total) = (u128::from(count), u128::from(total));
    let percent = (200 * count + total) / (2 * total);
    percent.min(100) as u8
}

/// Forwards `(count, total)` progress only when the integer percentage changes.
///
/// `total` is fixed and `count` non-decreasing for the lifetime of one filter,
/// so emitted percentages never regress.
#[derive(Debug)]
pub struct PercentageFilter {
    notifier: Notifier,
    count: u64,
    last_percent: u8,
}

impl PercentageFilter {
    /// Create a filter for a phase whose displayed progress has just been reset to zero
    pub fn new(notifier: Notifier) -> Self {
        Self {
            notifier,
            count: 0,
            last_percent: 0,
        }
    }

    /// Most recent count passed to `update`
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Offer the current progress; returns whether a notification was sent
    pub fn update(&mut self, count: u64, total: u64) -> bool {
        self.count = count;

        let percent = int_percentage(count, total);
        if percent == self.last_percent {
            return false;
        }

        self.last_percent = percent;
        self.notifier.send(MergeEvent::ProgressChanged(percent));
        true
    }
}
