pub mod test_images;
pub use test_images::*;

use crossbeam::channel::Receiver;
use image_merger_core::MergeEvent;

/// Drain every notification sent so far
pub fn collect_events(rx: &Receiver<MergeEvent>) -> Vec<MergeEvent> {
    rx.try_iter().collect()
}
