//! Item-level distractor selection.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::KnowledgeItem;

/// Pick up to `count` wrong-answer items for `target` from `pool`.
///
/// Items sharing a cluster with the target come first, in random order;
/// unrelated items fill the rest. The target itself is never returned.
pub fn select_distractors<'a, R: Rng + ?Sized>(
    target: &KnowledgeItem,
    pool: &'a [KnowledgeItem],
    count: usize,
    rng: &mut R,
) -> Vec<&'a KnowledgeItem> {
    let (mut related, mut unrelated): (Vec<&KnowledgeItem>, Vec<&KnowledgeItem>) = pool
        .iter()
        .filter(|item| item.id != target.id)
        .partition(|item| item.shares_cluster(target));

    related.shuffle(rng);
    unrelated.shuffle(rng);
    related.into_iter().chain(unrelated).take(count).collect()
}
