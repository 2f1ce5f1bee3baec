//! In-memory content and mastery storage.
//!
//! Used by tests and by callers that assemble content programmatically.
//! Nothing survives the store being dropped.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::core::{ClozeTemplate, ConfusablePair, KnowledgeItem, MasteryRecord};
use crate::error::Result;
use crate::storage::{ContentStore, MasteryStore};

/// Content held in memory.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    items: Vec<KnowledgeItem>,
    pairs: Vec<ConfusablePair>,
    templates: Vec<ClozeTemplate>,
}

impl MemoryContentStore {
    pub fn new(
        items: Vec<KnowledgeItem>,
        pairs: Vec<ConfusablePair>,
        templates: Vec<ClozeTemplate>,
    ) -> Self {
        Self {
            items,
            pairs,
            templates,
        }
    }

    /// Items only, with no auxiliary tables.
    pub fn with_items(items: Vec<KnowledgeItem>) -> Self {
        Self::new(items, Vec::new(), Vec::new())
    }
}

impl ContentStore for MemoryContentStore {
    fn items(&self) -> Result<Vec<KnowledgeItem>> {
        Ok(self.items.clone())
    }

    fn confusable_pairs(&self) -> Result<Vec<ConfusablePair>> {
        Ok(self.pairs.clone())
    }

    fn cloze_templates(&self) -> Result<Vec<ClozeTemplate>> {
        Ok(self.templates.clone())
    }
}

/// In-memory mastery store.
///
/// Thread-safe implementation using `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct MemoryMasteryStore {
    records: RwLock<HashMap<String, MasteryRecord>>,
}

impl MemoryMasteryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored record for `item_id`, if any.
    pub fn get(&self, item_id: &str) -> Option<MasteryRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(item_id)
            .cloned()
    }
}

impl MasteryStore for MemoryMasteryStore {
    fn load_all(&self) -> Result<Vec<MasteryRecord>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut result: Vec<MasteryRecord> = records.values().cloned().collect();
        result.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        Ok(result)
    }

    fn save_all(&self, records: &[MasteryRecord]) -> Result<()> {
        let mut stored = self.records.write().unwrap_or_else(PoisonError::into_inner);
        stored.clear();
        stored.extend(records.iter().map(|r| (r.item_id.clone(), r.clone())));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BktConfig;
    use crate::fixtures::curriculum;
    use crate::storage::traits::tests::test_mastery_store_roundtrip;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_memory_mastery_store_roundtrip() {
        test_mastery_store_roundtrip(&MemoryMasteryStore::new());
    }

    #[test]
    fn test_content_store_returns_copies() {
        let store = MemoryContentStore::with_items(curriculum());
        let mut items = store.items().unwrap();
        items.clear();
        assert_eq!(store.items().unwrap().len(), curriculum().len());
        assert!(store.confusable_pairs().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_saves() {
        let store = Arc::new(MemoryMasteryStore::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let record = MasteryRecord::new(format!("v00{}", i), &BktConfig::default());
                    store.save_all(&[record]).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        // Each save replaces the whole set
        assert_eq!(store.len(), 1);
        assert_eq!(store.load_all().unwrap().len(), 1);
    }
}
