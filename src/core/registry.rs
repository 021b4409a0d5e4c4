//! Insertion-ordered store of per-image records.

use std::collections::HashMap;

use tracing::debug;

use crate::core::record::{ImageRecord, RecordId};
use crate::utils::{CompressorError, CompressorResult};

/// In-memory id → record store preserving insertion order.
///
/// Insertion order is display order: iteration for global quality fan-out
/// and bulk export always walks records in the order they were uploaded.
/// Records are never removed; the registry lives as long as the session.
#[derive(Debug, Default)]
pub struct Registry {
    records: HashMap<RecordId, ImageRecord>,
    order: Vec<RecordId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly decoded record.
    ///
    /// Fails only on id collision, which the id generator rules out.
    pub fn insert(&mut self, record: ImageRecord) -> CompressorResult<()> {
        if self.records.contains_key(&record.id) {
            return Err(CompressorError::DuplicateId(record.id.to_string()));
        }
        debug!("Registry insert: {} ({})", record.id, record.source.name);
        self.order.push(record.id.clone());
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn get(&self, id: &RecordId) -> Option<&ImageRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &RecordId) -> Option<&mut ImageRecord> {
        self.records.get_mut(id)
    }

    /// Record ids in insertion order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.order.clone()
    }

    /// Iterates records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Bitmap, SourceFile};

    fn record(name: &str) -> ImageRecord {
        ImageRecord::new(
            SourceFile::new(name, "image/png", vec![0u8; 4]),
            Bitmap::new(1, 1, vec![0u8; 4]),
            0.8,
        )
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut registry = Registry::new();
        for name in ["a.png", "b.png", "c.png"] {
            registry.insert(record(name)).unwrap();
        }
        let names: Vec<_> = registry.iter().map(|r| r.source.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut registry = Registry::new();
        let first = record("a.png");
        let clone = first.clone();
        registry.insert(first).unwrap();
        assert!(registry.insert(clone).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_mut_allows_in_place_mutation() {
        let mut registry = Registry::new();
        let r = record("a.png");
        let id = r.id.clone();
        registry.insert(r).unwrap();

        registry.get_mut(&id).unwrap().quality = 0.25;
        assert_eq!(registry.get(&id).unwrap().quality, 0.25);
    }
}
