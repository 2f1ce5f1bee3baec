//! The scheduling context.
//!
//! [`Scheduler`] owns everything a scheduling decision reads: the knowledge
//! graph, the mastery book, the memory model, the session state, and the
//! scheduler configuration. Each item moves `new -> learning -> retention`,
//! and the last edge is taken exactly once.
//!
//! Every time-dependent operation has an `_at` variant taking `now`; the
//! plain variant calls it with `Utc::now()`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::scoring::{self, Candidate};
use super::{bkt, decay};
use crate::config::{Config, SchedulerConfig};
use crate::core::{
    ItemKind, KnowledgeGraph, KnowledgeItem, MasteryBook, MasteryRecord, SchedulingMode,
    SessionState,
};
use crate::error::{Result, TutorError};
use crate::memory::MemoryModel;

/// Priority given to retention items with no retrievability yet.
const UNKNOWN_RETRIEVABILITY: f64 = 0.5;

/// Result of applying one answer to one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemUpdate {
    pub item_id: String,
    /// New knowledge probability (learning) or retrievability (retention).
    pub estimate: f64,
    /// Mode after the update.
    pub mode: SchedulingMode,
    /// Whether this update moved the item into retention mode.
    pub transitioned: bool,
}

/// Read-only summary of one item's scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStatus {
    pub item_id: String,
    pub kind: ItemKind,
    pub mode: SchedulingMode,
    pub mastered: bool,
    pub p_known: Option<f64>,
    pub retrievability: Option<f64>,
    pub due: Option<DateTime<Utc>>,
    pub practice_count: u32,
    pub accuracy: f64,
}

/// Scheduling context for one student session.
#[derive(Debug)]
pub struct Scheduler {
    graph: KnowledgeGraph,
    book: MasteryBook,
    memory: MemoryModel,
    session: SessionState,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Assemble a scheduler from its parts.
    pub fn new(
        graph: KnowledgeGraph,
        book: MasteryBook,
        memory: MemoryModel,
        session: SessionState,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            graph,
            book,
            memory,
            session,
            config,
        }
    }

    /// Scheduler over persisted records with settings from `config`.
    pub fn from_config(graph: KnowledgeGraph, records: Vec<MasteryRecord>, config: &Config) -> Self {
        Self::new(
            graph,
            MasteryBook::from_records(records, config.bkt.clone()),
            MemoryModel::from_config(&config.memory),
            SessionState::new(config.scheduler.learning_ratio),
            config.scheduler.clone(),
        )
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn book(&self) -> &MasteryBook {
        &self.book
    }

    pub fn memory(&self) -> &MemoryModel {
        &self.memory
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn threshold(&self) -> f64 {
        self.config.mastery_threshold
    }

    /// Snapshot of all records for persistence.
    pub fn records(&self) -> Vec<MasteryRecord> {
        self.book.to_sorted_vec()
    }

    // ===== Record access and updates =====

    /// Record for `item_id`, created with default calibration if absent.
    pub fn get_mastery(&mut self, item_id: &str) -> &MasteryRecord {
        self.book.get_or_create(item_id)
    }

    /// Apply one BKT observation. Fails if the record is in retention mode.
    pub fn bkt_update(&mut self, item_id: &str, correct: bool) -> Result<f64> {
        let record = self.book.get_or_create(item_id);
        let state = record.learning_mut().ok_or_else(|| {
            TutorError::invalid_state(format!("BKT update on retention record {}", item_id))
        })?;
        Ok(bkt::update(state, correct))
    }

    /// Update the knowledge estimate after an attempt.
    ///
    /// Learning records take a BKT update and return the new probability.
    /// Retention records take a memory review and return retrievability
    /// (1.0 when the model has none).
    pub fn update_mastery(&mut self, item_id: &str, correct: bool) -> Result<f64> {
        self.update_mastery_at(item_id, correct, Utc::now())
    }

    pub fn update_mastery_at(
        &mut self,
        item_id: &str,
        correct: bool,
        now: DateTime<Utc>,
    ) -> Result<f64> {
        match self.book.get_or_create(item_id).mode() {
            SchedulingMode::Learning => self.bkt_update(item_id, correct),
            SchedulingMode::Retention => {
                let record = self.book.get_or_create(item_id);
                self.memory.review(record, correct, now)?;
                Ok(self.memory.retrievability(record, now).unwrap_or(1.0))
            }
        }
    }

    /// Record the attempt in the running statistics, then check for the
    /// transition into retention mode. Returns whether it happened.
    pub fn update_practice_stats(&mut self, item_id: &str, correct: bool) -> Result<bool> {
        self.update_practice_stats_at(item_id, correct, Utc::now())
    }

    pub fn update_practice_stats_at(
        &mut self,
        item_id: &str,
        correct: bool,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.book.get_or_create(item_id).record_attempt(correct, now);
        self.check_mastery_transition_at(item_id, now)
    }

    /// Move a learning record that reached the mastery threshold into
    /// retention mode. Returns whether the transition happened.
    pub fn check_mastery_transition_at(&mut self, item_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let threshold = self.threshold();
        let record = self.book.get_or_create(item_id);
        let reached = record.p_known().is_some_and(|p| p >= threshold);
        if !reached {
            return Ok(false);
        }

        self.memory.initialize(record, now)?;
        if let Some(state) = record.retention_mut() {
            state.transitioned_at = Some(now);
        }
        tracing::info!(item = %item_id, "mastered, moving to retention scheduling");
        Ok(true)
    }

    /// Full per-item update: estimate, statistics, transition check.
    pub fn record_answer_at(
        &mut self,
        item_id: &str,
        correct: bool,
        now: DateTime<Utc>,
    ) -> Result<ItemUpdate> {
        let estimate = self.update_mastery_at(item_id, correct, now)?;
        let transitioned = self.update_practice_stats_at(item_id, correct, now)?;
        let mode = self.book.get_or_create(item_id).mode();
        Ok(ItemUpdate {
            item_id: item_id.to_string(),
            estimate,
            mode,
            transitioned,
        })
    }

    /// Apply one answer to every item an exercise touched.
    ///
    /// Each ID gets the full per-item update once. IDs not in the graph are
    /// skipped.
    pub fn update_multi_skill(&mut self, item_ids: &[String], correct: bool) -> Result<Vec<ItemUpdate>> {
        self.update_multi_skill_at(item_ids, correct, Utc::now())
    }

    pub fn update_multi_skill_at(
        &mut self,
        item_ids: &[String],
        correct: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<ItemUpdate>> {
        let mut seen = std::collections::HashSet::new();
        let mut updates = Vec::with_capacity(item_ids.len());
        for id in item_ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            if !self.graph.contains(id) {
                tracing::warn!(item = %id, "skipping update for unknown item");
                continue;
            }
            updates.push(self.record_answer_at(id, correct, now)?);
        }
        Ok(updates)
    }

    /// Note that an exercise for `item_id` was served.
    pub fn mark_served(&mut self, item_id: &str) {
        if let Some(item) = self.graph.get(item_id) {
            self.session.record_exercise(item.kind);
        }
    }

    // ===== Scheduling passes =====

    /// Decay every practiced learning record. Returns how many changed.
    pub fn apply_decay_at(&mut self, now: DateTime<Utc>) -> usize {
        let rate = self.config.decay_rate_per_week;
        let mut changed = 0;
        for record in self.book.records_mut() {
            if let decay::DecayResult::Decayed { from, to } = decay::apply(record, rate, now) {
                tracing::debug!(item = %record.item_id, from, to, "decayed");
                changed += 1;
            }
        }
        changed
    }

    fn candidate(&self, item: &KnowledgeItem) -> Candidate {
        let threshold = self.threshold();
        match self.book.get(&item.id) {
            Some(record) if record.mode() == SchedulingMode::Retention => Candidate::Retention {
                due: self.memory.due_date(record),
            },
            record => Candidate::Learning {
                p_known: record
                    .and_then(MasteryRecord::p_known)
                    .unwrap_or(self.book.defaults().p_init),
                needs_review: record.is_some_and(|r| r.needs_review(threshold)),
                on_frontier: self.graph.is_on_frontier(item, &self.book, threshold),
            },
        }
    }

    fn in_active_cluster(&self, item: &KnowledgeItem) -> bool {
        match (&self.session.active_cluster, self.session.is_blocked()) {
            (Some(cluster), true) => item.has_tag(cluster),
            _ => true,
        }
    }

    /// Pick the single most urgent item.
    pub fn select_next_item(&mut self) -> Option<String> {
        self.select_next_item_at(Utc::now())
    }

    /// Pick the single most urgent item at `now`.
    ///
    /// Only items whose prerequisites are met are scored. While blocked,
    /// learning items outside the active cluster are not considered. If
    /// nothing qualifies, falls back to the first unmastered item, then to
    /// the first item.
    pub fn select_next_item_at(&mut self, now: DateTime<Utc>) -> Option<String> {
        self.apply_decay_at(now);
        self.check_blocked_practice_complete();

        let threshold = self.threshold();
        let last_kind = self.session.last_kind;
        let mut ids = Vec::new();
        let mut scores = Vec::new();
        for item in self.graph.items() {
            if !self.graph.prerequisites_met(item, &self.book, threshold) {
                continue;
            }
            let candidate = self.candidate(item);
            if matches!(candidate, Candidate::Learning { .. }) && !self.in_active_cluster(item) {
                continue;
            }
            ids.push(item.id.as_str());
            scores.push(scoring::score(&candidate, item.kind, last_kind, now));
        }

        if let Some(best) = scoring::best(&scores) {
            tracing::debug!(item = %ids[best], score = scores[best], "selected next item");
            return Some(ids[best].to_string());
        }

        let fallback = self
            .graph
            .items()
            .iter()
            .find(|item| !self.book.is_mastered(&item.id, threshold))
            .or_else(|| self.graph.items().first())
            .map(|item| item.id.clone());
        tracing::debug!(item = ?fallback, "no eligible item, using fallback");
        fallback
    }

    pub fn learning_pool(&self) -> Vec<String> {
        self.learning_pool_at(Utc::now())
    }

    /// Unmastered items with prerequisites met, in priority order.
    ///
    /// Restricted to the active cluster while blocked.
    pub fn learning_pool_at(&self, now: DateTime<Utc>) -> Vec<String> {
        let threshold = self.threshold();
        let last_kind = self.session.last_kind;
        let mut pool: Vec<(&str, f64)> = self
            .graph
            .items()
            .iter()
            .filter(|item| !self.book.is_mastered(&item.id, threshold))
            .filter(|item| self.graph.prerequisites_met(item, &self.book, threshold))
            .filter(|item| self.in_active_cluster(item))
            .map(|item| {
                let s = scoring::score(&self.candidate(item), item.kind, last_kind, now);
                (item.id.as_str(), s)
            })
            .collect();
        // Stable: equal scores keep graph order
        pool.sort_by(|a, b| b.1.total_cmp(&a.1));
        pool.into_iter().map(|(id, _)| id.to_string()).collect()
    }

    pub fn retention_pool(&self) -> Vec<String> {
        self.retention_pool_at(Utc::now())
    }

    /// Mastered, due items with prerequisites met, lowest retrievability first.
    pub fn retention_pool_at(&self, now: DateTime<Utc>) -> Vec<String> {
        let threshold = self.threshold();
        let mut pool: Vec<(&str, f64)> = self
            .graph
            .items()
            .iter()
            .filter(|item| self.book.is_mastered(&item.id, threshold))
            .filter(|item| self.graph.prerequisites_met(item, &self.book, threshold))
            .filter_map(|item| {
                let record = self.book.get(&item.id);
                let due = record.map_or(true, |r| self.memory.is_due(r, now));
                due.then(|| {
                    let r = record
                        .and_then(|r| self.memory.retrievability(r, now))
                        .unwrap_or(UNKNOWN_RETRIEVABILITY);
                    (item.id.as_str(), r)
                })
            })
            .collect();
        pool.sort_by(|a, b| a.1.total_cmp(&b.1));
        pool.into_iter().map(|(id, _)| id.to_string()).collect()
    }

    /// Compose an ordered queue of item IDs for a session.
    pub fn compose_session_queue(&mut self, session_size: Option<usize>) -> Vec<String> {
        self.compose_session_queue_at(session_size, Utc::now())
    }

    /// Compose an ordered queue of item IDs at `now`.
    ///
    /// Takes `round(size * learning_ratio)` items from the learning pool and
    /// the rest from the retention pool, backfilling from the other pool
    /// when one runs short. With no learning items the queue is all
    /// retention. Retention items are spread evenly through the queue.
    pub fn compose_session_queue_at(
        &mut self,
        session_size: Option<usize>,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        self.apply_decay_at(now);
        self.check_blocked_practice_complete();

        let size = session_size.unwrap_or(self.config.session_size);
        let learning = self.learning_pool_at(now);
        let retention = self.retention_pool_at(now);

        let (n_learning, n_retention) =
            split_counts(size, self.session.learning_ratio, learning.len(), retention.len());
        tracing::debug!(
            size,
            learning = learning.len(),
            retention = retention.len(),
            n_learning,
            n_retention,
            "composing session queue"
        );

        merge_evenly(
            &learning[..n_learning],
            &retention[..n_retention],
        )
    }

    // ===== Practice mode =====

    /// Start blocked practice on `cluster` (full tag or bare name).
    pub fn activate_blocked_practice(&mut self, cluster: &str) -> Result<()> {
        let tag = self
            .graph
            .resolve_cluster(cluster)
            .ok_or_else(|| TutorError::content(format!("unknown cluster {}", cluster)))?;
        tracing::info!(cluster = %tag, "blocked practice started");
        self.session.block_on(tag);
        Ok(())
    }

    /// Revert to interleaved practice if the active cluster is fully
    /// mastered. Returns whether blocked practice just completed.
    pub fn check_blocked_practice_complete(&mut self) -> bool {
        if !self.session.is_blocked() {
            return false;
        }
        let Some(cluster) = self.session.active_cluster.as_deref() else {
            return false;
        };
        if !self
            .graph
            .cluster_fully_mastered(cluster, &self.book, self.config.mastery_threshold)
        {
            return false;
        }
        tracing::info!(cluster = %cluster, "cluster mastered, back to interleaved practice");
        self.session.revert_to_interleaved();
        true
    }

    // ===== Queries =====

    /// Earliest due time across retention items.
    pub fn next_due_time(&self) -> Option<DateTime<Utc>> {
        self.graph
            .items()
            .iter()
            .filter_map(|item| self.book.get(&item.id))
            .filter_map(|record| self.memory.due_date(record))
            .min()
    }

    /// Summary of one item at `now`.
    pub fn status_at(&self, item: &KnowledgeItem, now: DateTime<Utc>) -> ItemStatus {
        let threshold = self.threshold();
        let record = self.book.get(&item.id);
        ItemStatus {
            item_id: item.id.clone(),
            kind: item.kind,
            mode: record.map_or(SchedulingMode::Learning, MasteryRecord::mode),
            mastered: self.book.is_mastered(&item.id, threshold),
            p_known: match record {
                Some(r) => r.p_known(),
                None => Some(self.book.defaults().p_init),
            },
            retrievability: record.and_then(|r| self.memory.retrievability(r, now)),
            due: record.and_then(|r| self.memory.due_date(r)),
            practice_count: record.map_or(0, |r| r.practice_count),
            accuracy: record.map_or(0.0, MasteryRecord::accuracy),
        }
    }
}

/// How many learning and retention items a queue of `size` takes.
fn split_counts(size: usize, ratio: f64, learning: usize, retention: usize) -> (usize, usize) {
    let target_learning = if learning == 0 {
        0
    } else {
        ((size as f64) * ratio.clamp(0.0, 1.0)).round() as usize
    };
    let target_learning = target_learning.min(size);
    let mut n_learning = target_learning.min(learning);
    let n_retention = (size - n_learning).min(retention);
    // Backfill learning if retention ran short
    n_learning = (size - n_retention).min(learning);
    (n_learning, n_retention)
}

/// Merge two priority lists, spreading `spread` evenly through `base`.
fn merge_evenly(base: &[String], spread: &[String]) -> Vec<String> {
    let total = base.len() + spread.len();
    let mut queue = Vec::with_capacity(total);
    let (mut bi, mut si) = (0, 0);
    for pos in 0..total {
        let spread_by_now = (pos + 1) * spread.len() / total;
        if si < spread_by_now || bi >= base.len() {
            queue.push(spread[si].clone());
            si += 1;
        } else {
            queue.push(base[bi].clone());
            bi += 1;
        }
    }
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::curriculum_graph;
    use chrono::Duration;

    fn scheduler() -> Scheduler {
        Scheduler::from_config(curriculum_graph(), Vec::new(), &Config::default())
    }

    fn master(s: &mut Scheduler, id: &str, now: DateTime<Utc>) {
        s.book.get_or_create(id).learning_mut().unwrap().p_known = 0.99;
        s.check_mastery_transition_at(id, now).unwrap();
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_mastery_creates_default_record() {
        let mut s = scheduler();
        let record = s.get_mastery("v001");
        assert_eq!(record.mode(), SchedulingMode::Learning);
        assert_eq!(record.p_known(), Some(0.0));
        assert_eq!(s.book().len(), 1);
    }

    #[test]
    fn test_transition_happens_exactly_once() {
        let mut s = scheduler();
        let now = Utc::now();
        let mut transitions = 0;

        for i in 0..30 {
            let update = s
                .record_answer_at("v001", true, now + Duration::minutes(i))
                .unwrap();
            if update.transitioned {
                transitions += 1;
            }
        }

        assert_eq!(transitions, 1);
        let record = s.get_mastery("v001");
        assert_eq!(record.mode(), SchedulingMode::Retention);
        assert!(record.retention().unwrap().transitioned_at.is_some());
    }

    #[test]
    fn test_retention_never_reverts_on_failure() {
        let mut s = scheduler();
        let now = Utc::now();
        master(&mut s, "v001", now);

        for i in 1..10 {
            s.record_answer_at("v001", false, now + Duration::days(i)).unwrap();
        }
        assert_eq!(s.get_mastery("v001").mode(), SchedulingMode::Retention);
    }

    #[test]
    fn test_bkt_update_on_retention_record_is_invalid_state() {
        let mut s = scheduler();
        master(&mut s, "v001", Utc::now());

        let err = s.bkt_update("v001", true).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_update_mastery_returns_estimate() {
        let mut s = scheduler();
        let p = s.update_mastery("v001", true).unwrap();
        assert!((p - 0.3).abs() < 1e-9);

        let now = Utc::now();
        master(&mut s, "v002", now);
        let r = s.update_mastery_at("v002", true, now + Duration::days(3)).unwrap();
        assert!((0.0..=1.0).contains(&r));
    }

    #[test]
    fn test_practice_stats_recorded() {
        let mut s = scheduler();
        s.update_practice_stats("v001", true).unwrap();
        s.update_practice_stats("v001", false).unwrap();
        let record = s.get_mastery("v001");
        assert_eq!(record.practice_count, 2);
        assert_eq!(record.correct_count, 1);
        assert_eq!(record.consecutive_correct, 0);
    }

    #[test]
    fn test_multi_skill_updates_every_item_once() {
        let mut s = scheduler();
        let now = Utc::now();
        let updates = s
            .update_multi_skill_at(&ids(&["v003", "v005", "v007", "g001", "v003", "zzz"]), true, now)
            .unwrap();

        let touched: Vec<_> = updates.iter().map(|u| u.item_id.as_str()).collect();
        assert_eq!(touched, vec!["v003", "v005", "v007", "g001"]);
        for id in ["v003", "v005", "v007", "g001"] {
            assert_eq!(s.get_mastery(id).practice_count, 1);
        }
        assert!(s.book().get("zzz").is_none());
    }

    #[test]
    fn test_multi_skill_mixes_modes() {
        let mut s = scheduler();
        let now = Utc::now();
        master(&mut s, "v005", now);

        let later = now + Duration::days(5);
        let updates = s
            .update_multi_skill_at(&ids(&["v005", "g001"]), true, later)
            .unwrap();
        assert_eq!(updates[0].mode, SchedulingMode::Retention);
        assert_eq!(updates[1].mode, SchedulingMode::Learning);
        assert!(s.get_mastery("v005").retention().unwrap().last_review == Some(later));
    }

    #[test]
    fn test_select_prefers_frontier_and_respects_prerequisites() {
        let mut s = scheduler();
        let next = s.select_next_item_at(Utc::now()).unwrap();
        // Every vocabulary item is on the frontier; ties go to the first
        assert_eq!(next, "v001");
    }

    #[test]
    fn test_select_prefers_weak_reviewed_item() {
        let mut s = scheduler();
        let now = Utc::now();
        s.record_answer_at("v004", false, now).unwrap();

        assert_eq!(s.select_next_item_at(now).unwrap(), "v004");
    }

    #[test]
    fn test_select_prefers_overdue_retention_item() {
        let mut s = scheduler();
        let now = Utc::now();
        master(&mut s, "v002", now - Duration::days(30));

        assert_eq!(s.select_next_item_at(now).unwrap(), "v002");
    }

    #[test]
    fn test_select_interleave_bonus_breaks_tie() {
        let mut s = scheduler();
        let now = Utc::now();
        for id in ["v005", "v006", "v010", "v012"] {
            master(&mut s, id, now);
        }
        s.mark_served("v001");

        // g001 is now on the frontier and of a different kind
        assert_eq!(s.select_next_item_at(now).unwrap(), "g001");
    }

    #[test]
    fn test_select_fallback_when_everything_blocked() {
        let graph = KnowledgeGraph::new(vec![
            KnowledgeItem::grammar("g010", "A", "a").with_prerequisite("missing"),
            KnowledgeItem::grammar("g011", "B", "b").with_prerequisite("missing"),
        ])
        .unwrap();
        let mut s = Scheduler::from_config(graph, Vec::new(), &Config::default());
        assert_eq!(s.select_next_item().as_deref(), Some("g010"));

        let mut empty =
            Scheduler::from_config(KnowledgeGraph::default(), Vec::new(), &Config::default());
        assert_eq!(empty.select_next_item(), None);
    }

    #[test]
    fn test_queue_never_contains_unmet_prerequisites() {
        let mut s = scheduler();
        let now = Utc::now();
        master(&mut s, "v005", now - Duration::days(20));

        let queue = s.compose_session_queue_at(Some(30), now);
        let threshold = s.config().mastery_threshold;
        for id in &queue {
            let item = s.graph().get(id).unwrap();
            assert!(s.graph().prerequisites_met(item, s.book(), threshold), "{}", id);
        }
        assert!(queue.contains(&"g001".to_string()));
        assert!(!queue.contains(&"g002".to_string()));
    }

    #[test]
    fn test_queue_ratio_and_spreading() {
        let mut s = scheduler();
        let now = Utc::now();
        for id in ["v007", "v008", "v009", "v011", "v014"] {
            master(&mut s, id, now - Duration::days(30));
        }

        let queue = s.compose_session_queue_at(Some(10), now);
        assert_eq!(queue.len(), 10);

        let retention: Vec<usize> = queue
            .iter()
            .enumerate()
            .filter(|(_, id)| s.book().is_mastered(id, 0.95))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(retention, vec![3, 6, 9]);
    }

    #[test]
    fn test_queue_backfills_from_learning_when_retention_short() {
        let mut s = scheduler();
        let now = Utc::now();
        master(&mut s, "v007", now - Duration::days(30));

        let queue = s.compose_session_queue_at(Some(10), now);
        assert_eq!(queue.len(), 10);
        assert_eq!(queue.iter().filter(|id| *id == "v007").count(), 1);
    }

    #[test]
    fn test_queue_all_retention_when_nothing_to_learn() {
        let graph = KnowledgeGraph::new(crate::fixtures::pronouns()).unwrap();
        let mut s = Scheduler::from_config(graph, Vec::new(), &Config::default());
        let now = Utc::now();
        for (i, id) in ["v001", "v002", "v003", "v004"].iter().enumerate() {
            master(&mut s, id, now - Duration::days(10 + i as i64 * 10));
        }

        let queue = s.compose_session_queue_at(Some(3), now);
        // Longest-unreviewed (lowest retrievability) first
        assert_eq!(queue, ids(&["v004", "v003", "v002"]));
    }

    #[test]
    fn test_retention_pool_excludes_items_not_due() {
        let mut s = scheduler();
        let now = Utc::now();
        master(&mut s, "v001", now);
        master(&mut s, "v002", now - Duration::days(30));

        assert_eq!(s.retention_pool_at(now), ids(&["v002"]));
    }

    #[test]
    fn test_retention_item_with_decayed_prerequisite_is_withheld() {
        let mut s = scheduler();
        let now = Utc::now();
        master(&mut s, "g001", now - Duration::days(30));
        // Prerequisite v005 was never mastered
        assert!(s.retention_pool_at(now).is_empty());
        master(&mut s, "v005", now - Duration::days(30));
        assert!(s.retention_pool_at(now).contains(&"g001".to_string()));
    }

    #[test]
    fn test_blocked_practice_restricts_learning_pool() {
        let mut s = scheduler();
        s.activate_blocked_practice("pronouns").unwrap();
        let pool = s.learning_pool_at(Utc::now());
        assert_eq!(pool, ids(&["v001", "v002", "v003", "v004"]));

        let queue = s.compose_session_queue_at(Some(8), Utc::now());
        assert!(queue.iter().all(|id| id.starts_with("v00") && id.as_str() <= "v004"));
    }

    #[test]
    fn test_blocked_practice_unknown_cluster() {
        let mut s = scheduler();
        assert!(matches!(
            s.activate_blocked_practice("cluster:astronomy"),
            Err(TutorError::Content { .. })
        ));
        assert!(!s.session().is_blocked());
    }

    #[test]
    fn test_blocked_practice_completes_when_cluster_mastered() {
        let mut s = scheduler();
        let now = Utc::now();
        s.activate_blocked_practice("cluster:pronouns").unwrap();
        assert!(!s.check_blocked_practice_complete());

        for id in ["v001", "v002", "v003", "v004"] {
            master(&mut s, id, now);
        }
        assert!(s.check_blocked_practice_complete());
        assert!(!s.session().is_blocked());
        assert!(s.session().active_cluster.is_none());
    }

    #[test]
    fn test_decay_applies_during_scheduling_pass() {
        let mut s = scheduler();
        let start = Utc::now() - Duration::weeks(4);
        s.record_answer_at("v001", true, start).unwrap();
        let before = s.get_mastery("v001").p_known().unwrap();

        s.select_next_item_at(start + Duration::weeks(2));
        let after = s.get_mastery("v001").p_known().unwrap();
        assert!((before - after - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_next_due_time() {
        let mut s = scheduler();
        assert_eq!(s.next_due_time(), None);

        let now = Utc::now();
        master(&mut s, "v001", now);
        master(&mut s, "v002", now - Duration::days(2));
        let due_v002 = s.get_mastery("v002").retention().unwrap().due;
        assert_eq!(s.next_due_time(), due_v002);
    }

    #[test]
    fn test_status_for_untouched_item() {
        let s = scheduler();
        let item = s.graph().get("v001").unwrap().clone();
        let status = s.status_at(&item, Utc::now());
        assert_eq!(status.mode, SchedulingMode::Learning);
        assert_eq!(status.p_known, Some(0.0));
        assert_eq!(status.practice_count, 0);
        assert!(!status.mastered);
    }

    #[test]
    fn test_split_counts() {
        assert_eq!(split_counts(10, 0.7, 20, 20), (7, 3));
        assert_eq!(split_counts(10, 0.7, 0, 20), (0, 10));
        assert_eq!(split_counts(10, 0.7, 20, 1), (9, 1));
        assert_eq!(split_counts(10, 0.7, 2, 20), (2, 8));
        assert_eq!(split_counts(10, 0.7, 2, 3), (2, 3));
        assert_eq!(split_counts(0, 0.7, 5, 5), (0, 0));
    }

    #[test]
    fn test_merge_evenly() {
        let base = ids(&["l1", "l2", "l3", "l4"]);
        let spread = ids(&["r1", "r2"]);
        assert_eq!(
            merge_evenly(&base, &spread),
            ids(&["l1", "l2", "r1", "l3", "l4", "r2"])
        );
        assert_eq!(merge_evenly(&[], &spread), spread);
        assert_eq!(merge_evenly(&base, &[]), base);
    }
}
