use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::types::ImageRecord;

/// Unordered collection of image records keyed by path identity.
///
/// Records live in a slot vector; removal leaves a tombstone so that slot
/// positions held by an in-progress enumeration stay valid. Insertion order
/// carries no meaning.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    slots: Vec<Option<ImageRecord>>,
    index: HashMap<PathBuf, usize>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<&ImageRecord> {
        self.index.get(path).and_then(|&slot| self.slots[slot].as_ref())
    }

    /// Insert a record; returns false if a record with the same path was already present
    pub fn insert(&mut self, record: ImageRecord) -> bool {
        if self.index.contains_key(record.path()) {
            return false;
        }

        self.index.insert(record.path().to_path_buf(), self.slots.len());
        self.slots.push(Some(record));
        true
    }

    /// Remove the record with the given path, if present
    pub fn remove(&mut self, path: &Path) -> Option<ImageRecord> {
        let slot = self.index.remove(path)?;
        self.slots[slot].take()
    }

    /// Keep only the records for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&ImageRecord) -> bool) {
        for slot in self.slots.iter_mut() {
            if let Some(record) = slot {
                if !keep(record) {
                    self.index.remove(record.path());
                    *slot = None;
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.slots.iter().flatten()
    }

    /// Paths of all live records, sorted for stable presentation
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.index.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of slots including tombstones; upper bound for slot positions
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slot(&self, slot: usize) -> Option<&ImageRecord> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Tombstone the record at `slot`, leaving every other slot position untouched
    pub(crate) fn erase_slot(&mut self, slot: usize) -> Option<ImageRecord> {
        let record = self.slots.get_mut(slot)?.take()?;
        self.index.remove(record.path());
        Some(record)
    }
}

impl PartialEq for ImageSet {
    /// Sets are equal when they hold the same paths with the same attributes
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|record| {
                other
                    .get(record.path())
                    .is_some_and(|theirs| theirs.same_attributes(record))
            })
    }
}

impl FromIterator<ImageRecord> for ImageSet {
    fn from_iter<I: IntoIterator<Item = ImageRecord>>(iter: I) -> Self {
        let mut set = ImageSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}
