//! Knowledge graph: items, prerequisite edges, and tag-derived clusters.
//!
//! The graph is read-only for the duration of a session. All mastery-aware
//! queries take the [`MasteryBook`] and threshold explicitly.

use std::collections::{BTreeSet, HashMap};

use super::item::{KnowledgeItem, CLUSTER_PREFIX};
use super::mastery::MasteryBook;
use crate::error::{Result, TutorError};

/// Items plus their prerequisite edges.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    items: Vec<KnowledgeItem>,
    index: HashMap<String, usize>,
}

impl KnowledgeGraph {
    /// Build a graph, preserving item order.
    ///
    /// Duplicate IDs are a content error. Prerequisites naming unknown items
    /// are kept (they can never be mastered through practice) and logged.
    pub fn new(items: Vec<KnowledgeItem>) -> Result<Self> {
        let mut index = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if index.insert(item.id.clone(), i).is_some() {
                return Err(TutorError::content(format!(
                    "duplicate item id {}",
                    item.id
                )));
            }
        }
        for item in &items {
            for prereq in &item.prerequisites {
                if !index.contains_key(prereq) {
                    tracing::warn!(item = %item.id, prereq = %prereq, "unknown prerequisite");
                }
            }
        }
        Ok(Self { items, index })
    }

    /// All items in load order.
    pub fn items(&self) -> &[KnowledgeItem] {
        &self.items
    }

    /// Item by ID.
    pub fn get(&self, id: &str) -> Option<&KnowledgeItem> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    /// Item by ID, or an error naming the missing ID.
    pub fn require(&self, id: &str) -> Result<&KnowledgeItem> {
        self.get(id).ok_or_else(|| TutorError::item_not_found(id))
    }

    /// Whether an item with `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the graph has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True iff every prerequisite of `item` is mastered.
    pub fn prerequisites_met(
        &self,
        item: &KnowledgeItem,
        book: &MasteryBook,
        threshold: f64,
    ) -> bool {
        item.prerequisites
            .iter()
            .all(|id| book.is_mastered(id, threshold))
    }

    /// True iff prerequisites are met and `item` itself is not mastered.
    pub fn is_on_frontier(&self, item: &KnowledgeItem, book: &MasteryBook, threshold: f64) -> bool {
        self.prerequisites_met(item, book, threshold) && !book.is_mastered(&item.id, threshold)
    }

    /// All distinct cluster tags, sorted.
    pub fn cluster_tags(&self) -> Vec<String> {
        let tags: BTreeSet<&str> = self
            .items
            .iter()
            .flat_map(|item| item.cluster_tags())
            .collect();
        tags.into_iter().map(str::to_string).collect()
    }

    /// Items tagged with `cluster`.
    pub fn items_in_cluster<'a>(&'a self, cluster: &'a str) -> impl Iterator<Item = &'a KnowledgeItem> {
        self.items.iter().filter(move |item| item.has_tag(cluster))
    }

    /// Whether every item in `cluster` is mastered. An empty cluster is not.
    pub fn cluster_fully_mastered(&self, cluster: &str, book: &MasteryBook, threshold: f64) -> bool {
        let mut any = false;
        for item in self.items_in_cluster(cluster) {
            any = true;
            if !book.is_mastered(&item.id, threshold) {
                return false;
            }
        }
        any
    }

    /// Fraction of `cluster` items mastered, 0.0 for an empty cluster.
    pub fn cluster_progress(&self, cluster: &str, book: &MasteryBook, threshold: f64) -> f64 {
        let (mut total, mut mastered) = (0usize, 0usize);
        for item in self.items_in_cluster(cluster) {
            total += 1;
            if book.is_mastered(&item.id, threshold) {
                mastered += 1;
            }
        }
        if total == 0 {
            0.0
        } else {
            mastered as f64 / total as f64
        }
    }

    /// Clusters offered in the topic menu.
    ///
    /// A cluster is eligible when it still has an unmastered item and every
    /// prerequisite of every item in it is mastered.
    pub fn eligible_clusters(&self, book: &MasteryBook, threshold: f64) -> Vec<String> {
        self.cluster_tags()
            .into_iter()
            .filter(|tag| {
                !self.cluster_fully_mastered(tag, book, threshold)
                    && self
                        .items_in_cluster(tag)
                        .all(|item| self.prerequisites_met(item, book, threshold))
            })
            .collect()
    }

    /// Resolve a user-supplied cluster name to a known tag.
    ///
    /// Accepts the full tag (`cluster:pronouns`) or the bare name (`pronouns`).
    pub fn resolve_cluster(&self, name: &str) -> Option<String> {
        let tag = if name.starts_with(CLUSTER_PREFIX) {
            name.to_string()
        } else {
            format!("{}{}", CLUSTER_PREFIX, name)
        };
        self.items
            .iter()
            .any(|item| item.has_tag(&tag))
            .then_some(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BktConfig;

    const THRESHOLD: f64 = 0.95;

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph::new(vec![
            KnowledgeItem::vocabulary("v001", "我", "wǒ", "I, me").with_tag("cluster:pronouns"),
            KnowledgeItem::vocabulary("v002", "你", "nǐ", "you").with_tag("cluster:pronouns"),
            KnowledgeItem::vocabulary("v005", "是", "shì", "to be")
                .with_tag("cluster:basic-verbs"),
            KnowledgeItem::grammar("g001", "Subject + 是 + Noun", "A is B")
                .with_tag("cluster:sentence-patterns")
                .with_prerequisite("v005"),
        ])
        .unwrap()
    }

    fn master(book: &mut MasteryBook, id: &str) {
        book.get_or_create(id).learning_mut().unwrap().p_known = 0.99;
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = KnowledgeGraph::new(vec![
            KnowledgeItem::vocabulary("v001", "我", "wǒ", "I"),
            KnowledgeItem::vocabulary("v001", "你", "nǐ", "you"),
        ]);
        assert!(matches!(result, Err(TutorError::Content { .. })));
    }

    #[test]
    fn test_prerequisites_met() {
        let graph = graph();
        let mut book = MasteryBook::new(BktConfig::default());
        let g001 = graph.get("g001").unwrap();

        assert!(!graph.prerequisites_met(g001, &book, THRESHOLD));
        master(&mut book, "v005");
        assert!(graph.prerequisites_met(g001, &book, THRESHOLD));
    }

    #[test]
    fn test_is_on_frontier() {
        let graph = graph();
        let mut book = MasteryBook::new(BktConfig::default());
        let v001 = graph.get("v001").unwrap();
        let g001 = graph.get("g001").unwrap();

        assert!(graph.is_on_frontier(v001, &book, THRESHOLD));
        assert!(!graph.is_on_frontier(g001, &book, THRESHOLD));

        master(&mut book, "v001");
        assert!(!graph.is_on_frontier(v001, &book, THRESHOLD));
    }

    #[test]
    fn test_cluster_tags_sorted_unique() {
        assert_eq!(
            graph().cluster_tags(),
            vec![
                "cluster:basic-verbs",
                "cluster:pronouns",
                "cluster:sentence-patterns"
            ]
        );
    }

    #[test]
    fn test_cluster_progress_and_mastery() {
        let graph = graph();
        let mut book = MasteryBook::new(BktConfig::default());

        assert_eq!(graph.cluster_progress("cluster:pronouns", &book, THRESHOLD), 0.0);
        master(&mut book, "v001");
        assert!((graph.cluster_progress("cluster:pronouns", &book, THRESHOLD) - 0.5).abs() < 1e-9);
        assert!(!graph.cluster_fully_mastered("cluster:pronouns", &book, THRESHOLD));

        master(&mut book, "v002");
        assert!(graph.cluster_fully_mastered("cluster:pronouns", &book, THRESHOLD));
        assert!(!graph.cluster_fully_mastered("cluster:missing", &book, THRESHOLD));
        assert_eq!(graph.cluster_progress("cluster:missing", &book, THRESHOLD), 0.0);
    }

    #[test]
    fn test_eligible_clusters() {
        let graph = graph();
        let mut book = MasteryBook::new(BktConfig::default());

        // Sentence patterns wait on 是
        assert_eq!(
            graph.eligible_clusters(&book, THRESHOLD),
            vec!["cluster:basic-verbs", "cluster:pronouns"]
        );

        master(&mut book, "v005");
        master(&mut book, "v001");
        master(&mut book, "v002");
        assert_eq!(
            graph.eligible_clusters(&book, THRESHOLD),
            vec!["cluster:sentence-patterns"]
        );
    }

    #[test]
    fn test_resolve_cluster() {
        let graph = graph();
        assert_eq!(
            graph.resolve_cluster("pronouns").as_deref(),
            Some("cluster:pronouns")
        );
        assert_eq!(
            graph.resolve_cluster("cluster:basic-verbs").as_deref(),
            Some("cluster:basic-verbs")
        );
        assert_eq!(graph.resolve_cluster("food"), None);
    }

    #[test]
    fn test_require_missing_item() {
        assert!(matches!(
            graph().require("v999"),
            Err(TutorError::ItemNotFound { .. })
        ));
    }
}
