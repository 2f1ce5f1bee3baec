//! Auxiliary content tables shipped next to the knowledge items.

use serde::{Deserialize, Serialize};

/// A character easily confused with a target item's native form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfusablePair {
    /// Item the confusion applies to.
    pub target_id: String,
    /// Confusable native form shown as a wrong option.
    #[serde(alias = "distractor_chinese")]
    pub native: String,
    #[serde(default, alias = "distractor_pinyin")]
    pub pronunciation: String,
    #[serde(default, alias = "distractor_english")]
    pub translation: String,
    /// Why the two are confused (shape, sound).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A sentence with one blank, anchored to the item that fills it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClozeTemplate {
    pub id: String,
    /// Native sentence with a `_____` marker.
    #[serde(alias = "chinese")]
    pub sentence: String,
    /// Translation shown as context.
    #[serde(default, alias = "english")]
    pub context: String,
    #[serde(alias = "target_vocab_id")]
    pub target_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
}
