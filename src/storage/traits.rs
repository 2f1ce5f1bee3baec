//! Storage traits for content and mastery state.

use std::sync::Arc;

use crate::core::{ClozeTemplate, ConfusablePair, KnowledgeItem, MasteryRecord};
use crate::error::Result;

/// Source of knowledge items and the auxiliary content tables.
///
/// The auxiliary tables are optional: implementations return an empty list
/// when a table does not exist.
pub trait ContentStore: Send + Sync {
    /// All knowledge items.
    fn items(&self) -> Result<Vec<KnowledgeItem>>;

    /// Confusable-character pairs used for minimal-pair prompts.
    fn confusable_pairs(&self) -> Result<Vec<ConfusablePair>>;

    /// Cloze sentences used for fill-blank exercises.
    fn cloze_templates(&self) -> Result<Vec<ClozeTemplate>>;
}

/// Bulk persistence of one student's mastery records.
pub trait MasteryStore: Send + Sync {
    /// Load every record. A store with nothing saved yields an empty list.
    fn load_all(&self) -> Result<Vec<MasteryRecord>>;

    /// Replace the stored records with `records`.
    fn save_all(&self, records: &[MasteryRecord]) -> Result<()>;
}

impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    fn items(&self) -> Result<Vec<KnowledgeItem>> {
        (**self).items()
    }

    fn confusable_pairs(&self) -> Result<Vec<ConfusablePair>> {
        (**self).confusable_pairs()
    }

    fn cloze_templates(&self) -> Result<Vec<ClozeTemplate>> {
        (**self).cloze_templates()
    }
}

impl<T: MasteryStore + ?Sized> MasteryStore for Arc<T> {
    fn load_all(&self) -> Result<Vec<MasteryRecord>> {
        (**self).load_all()
    }

    fn save_all(&self, records: &[MasteryRecord]) -> Result<()> {
        (**self).save_all(records)
    }
}
