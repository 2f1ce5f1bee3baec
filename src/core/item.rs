//! Knowledge items: the immutable content units the scheduler tracks.

use serde::{Deserialize, Serialize};

/// Tag prefix that groups items into a topic cluster.
pub const CLUSTER_PREFIX: &str = "cluster:";

/// Tag prefix naming the vocabulary category a sentence slot can draw from.
pub const CATEGORY_PREFIX: &str = "category:";

/// Kind of knowledge item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A word with a written form, pronunciation and gloss.
    #[default]
    Vocabulary,
    /// A sentence pattern.
    Grammar,
}

impl ItemKind {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Vocabulary => "vocabulary",
            ItemKind::Grammar => "grammar",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of content with its prerequisites.
///
/// Loaded once from the content store and never mutated during a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeItem {
    /// Unique identifier, e.g. `v001` or `g001`.
    pub id: String,
    /// Vocabulary or grammar.
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: ItemKind,
    /// Native written form.
    #[serde(alias = "chinese", default)]
    pub native: String,
    /// Pronunciation hint.
    #[serde(alias = "pinyin", default)]
    pub pronunciation: String,
    /// Comma-separated translations; the first is canonical.
    #[serde(alias = "english", default)]
    pub translation: String,
    /// Free-form tags, including `cluster:` and `category:` tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// IDs that must be mastered before this item is offered.
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl KnowledgeItem {
    /// Create a vocabulary item.
    pub fn vocabulary(
        id: impl Into<String>,
        native: impl Into<String>,
        pronunciation: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Vocabulary,
            native: native.into(),
            pronunciation: pronunciation.into(),
            translation: translation.into(),
            tags: Vec::new(),
            prerequisites: Vec::new(),
        }
    }

    /// Create a grammar item.
    pub fn grammar(
        id: impl Into<String>,
        native: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Grammar,
            native: native.into(),
            pronunciation: String::new(),
            translation: translation.into(),
            tags: Vec::new(),
            prerequisites: Vec::new(),
        }
    }

    /// Builder: add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Builder: add a prerequisite.
    pub fn with_prerequisite(mut self, id: impl Into<String>) -> Self {
        self.prerequisites.push(id.into());
        self
    }

    /// Cluster tags carried by this item (full tag strings).
    pub fn cluster_tags(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .map(String::as_str)
            .filter(|t| t.starts_with(CLUSTER_PREFIX))
    }

    /// Whether this item shares at least one cluster tag with `other`.
    pub fn shares_cluster(&self, other: &KnowledgeItem) -> bool {
        self.cluster_tags()
            .any(|tag| other.cluster_tags().any(|o| o == tag))
    }

    /// Whether this item carries exactly `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether this item belongs to the named vocabulary category.
    pub fn in_category(&self, category: &str) -> bool {
        self.tags.iter().any(|t| {
            t.strip_prefix(CATEGORY_PREFIX)
                .is_some_and(|name| name == category)
        })
    }

    /// First translation alternative, trimmed.
    pub fn primary_translation(&self) -> &str {
        self.translation
            .split(',')
            .next()
            .map(str::trim)
            .unwrap_or_default()
    }

    /// Native form with pronunciation, e.g. `我 (wǒ)`.
    pub fn native_with_pronunciation(&self) -> String {
        if self.pronunciation.is_empty() {
            self.native.clone()
        } else {
            format!("{} ({})", self.native, self.pronunciation)
        }
    }
}

/// Human-readable name for a cluster tag.
///
/// `cluster:sentence-patterns` becomes `Sentence Patterns`.
pub fn cluster_display_name(tag: &str) -> String {
    let name = tag.strip_prefix(CLUSTER_PREFIX).unwrap_or(tag);
    name.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
