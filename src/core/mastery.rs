//! Per-item mastery records.
//!
//! A record is either in learning mode, tracked with Bayesian Knowledge
//! Tracing, or in retention mode, tracked by the memory model. The two
//! representations are variants of [`SchedulingState`], so a record can
//! never carry both. The only allowed move is learning to retention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::BktConfig;

/// Scheduling mode discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// Knowledge tracked by BKT.
    #[default]
    Learning,
    /// Knowledge tracked by the memory model.
    Retention,
}

impl std::fmt::Display for SchedulingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingMode::Learning => f.write_str("learning"),
            SchedulingMode::Retention => f.write_str("retention"),
        }
    }
}

/// BKT parameters for an item still being learned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningState {
    /// Estimated probability the item is known.
    pub p_known: f64,
    /// Probability of learning on an attempt.
    pub p_transit: f64,
    /// Probability of a wrong answer despite knowing.
    pub p_slip: f64,
    /// Probability of a right answer without knowing.
    pub p_guess: f64,
    /// When decay was last applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decayed_at: Option<DateTime<Utc>>,
}

impl LearningState {
    /// Fresh state from configured calibration.
    pub fn from_config(bkt: &BktConfig) -> Self {
        Self {
            p_known: bkt.p_init,
            p_transit: bkt.p_transit,
            p_slip: bkt.p_slip,
            p_guess: bkt.p_guess,
            decayed_at: None,
        }
    }

    /// Pull every probability back into [0, 1].
    ///
    /// Non-finite values take the default calibration. Returns whether
    /// anything changed.
    pub fn clamp_probabilities(&mut self) -> bool {
        let defaults = Self::default();
        let before = *self;
        for (value, fallback) in [
            (&mut self.p_known, defaults.p_known),
            (&mut self.p_transit, defaults.p_transit),
            (&mut self.p_slip, defaults.p_slip),
            (&mut self.p_guess, defaults.p_guess),
        ] {
            *value = if value.is_finite() {
                (*value).clamp(0.0, 1.0)
            } else {
                fallback
            };
        }
        *self != before
    }
}

impl Default for LearningState {
    fn default() -> Self {
        Self::from_config(&BktConfig::default())
    }
}

/// Memory model card state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CardState {
    /// Never reviewed.
    #[default]
    New,
    /// In initial learning steps.
    Learning,
    /// Graduated to interval scheduling.
    Review,
    /// Lapsed and relearning.
    Relearning,
}

/// Memory model state for an item that has been mastered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetentionState {
    /// Memory stability in days.
    pub stability: f64,
    /// Item difficulty in [1, 10].
    pub difficulty: f64,
    /// When the next review falls due.
    pub due: Option<DateTime<Utc>>,
    /// When the item was last reviewed.
    pub last_review: Option<DateTime<Utc>>,
    /// Card state inside the memory model.
    pub state: CardState,
    /// Position in the (re)learning steps.
    #[serde(default)]
    pub step: u32,
    /// When the record left learning mode.
    pub transitioned_at: Option<DateTime<Utc>>,
}

/// Mode-specific half of a mastery record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SchedulingState {
    Learning(LearningState),
    Retention(RetentionState),
}

/// Mastery of one item by the student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteryRecord {
    /// Item this record tracks.
    pub item_id: String,
    /// Learning or retention state.
    pub state: SchedulingState,
    /// Last attempt, if any.
    pub last_practiced: Option<DateTime<Utc>>,
    /// Total attempts.
    #[serde(default)]
    pub practice_count: u32,
    /// Total correct attempts.
    #[serde(default)]
    pub correct_count: u32,
    /// Current run of correct attempts.
    #[serde(default)]
    pub consecutive_correct: u32,
}

impl MasteryRecord {
    /// New learning-mode record with the given calibration.
    pub fn new(item_id: impl Into<String>, bkt: &BktConfig) -> Self {
        Self {
            item_id: item_id.into(),
            state: SchedulingState::Learning(LearningState::from_config(bkt)),
            last_practiced: None,
            practice_count: 0,
            correct_count: 0,
            consecutive_correct: 0,
        }
    }

    /// Current scheduling mode.
    pub fn mode(&self) -> SchedulingMode {
        match self.state {
            SchedulingState::Learning(_) => SchedulingMode::Learning,
            SchedulingState::Retention(_) => SchedulingMode::Retention,
        }
    }

    /// Learning-mode state, if in learning mode.
    pub fn learning(&self) -> Option<&LearningState> {
        match &self.state {
            SchedulingState::Learning(state) => Some(state),
            SchedulingState::Retention(_) => None,
        }
    }

    /// Mutable learning-mode state.
    pub fn learning_mut(&mut self) -> Option<&mut LearningState> {
        match &mut self.state {
            SchedulingState::Learning(state) => Some(state),
            SchedulingState::Retention(_) => None,
        }
    }

    /// Retention-mode state, if in retention mode.
    pub fn retention(&self) -> Option<&RetentionState> {
        match &self.state {
            SchedulingState::Retention(state) => Some(state),
            SchedulingState::Learning(_) => None,
        }
    }

    /// Mutable retention-mode state.
    pub fn retention_mut(&mut self) -> Option<&mut RetentionState> {
        match &mut self.state {
            SchedulingState::Retention(state) => Some(state),
            SchedulingState::Learning(_) => None,
        }
    }

    /// Knowledge probability while in learning mode.
    pub fn p_known(&self) -> Option<f64> {
        self.learning().map(|l| l.p_known)
    }

    /// Whether the item counts as mastered: in retention mode, or at or
    /// above `threshold` in learning mode.
    pub fn is_mastered(&self, threshold: f64) -> bool {
        match &self.state {
            SchedulingState::Retention(_) => true,
            SchedulingState::Learning(l) => l.p_known >= threshold,
        }
    }

    /// Whether the item was practiced before and is still below `threshold`.
    pub fn needs_review(&self, threshold: f64) -> bool {
        self.practice_count > 0 && !self.is_mastered(threshold)
    }

    /// Record an attempt in the running statistics.
    pub fn record_attempt(&mut self, correct: bool, now: DateTime<Utc>) {
        self.practice_count += 1;
        if correct {
            self.correct_count += 1;
            self.consecutive_correct += 1;
        } else {
            self.consecutive_correct = 0;
        }
        self.last_practiced = Some(now);
    }

    /// Fraction of attempts answered correctly.
    pub fn accuracy(&self) -> f64 {
        if self.practice_count == 0 {
            0.0
        } else {
            self.correct_count as f64 / self.practice_count as f64
        }
    }
}

/// All mastery records of one student, keyed by item ID.
///
/// Records are created lazily on first mutable access. Read-only queries
/// for an absent record answer as a fresh record would.
#[derive(Debug, Clone, Default)]
pub struct MasteryBook {
    records: HashMap<String, MasteryRecord>,
    defaults: BktConfig,
}

impl MasteryBook {
    /// Empty book creating records with `defaults`.
    pub fn new(defaults: BktConfig) -> Self {
        Self {
            records: HashMap::new(),
            defaults,
        }
    }

    /// Book seeded from persisted records.
    pub fn from_records(records: Vec<MasteryRecord>, defaults: BktConfig) -> Self {
        let records = records
            .into_iter()
            .map(|r| (r.item_id.clone(), r))
            .collect();
        Self { records, defaults }
    }

    /// Existing record, if any.
    pub fn get(&self, item_id: &str) -> Option<&MasteryRecord> {
        self.records.get(item_id)
    }

    /// Record for `item_id`, created with default calibration if absent.
    pub fn get_or_create(&mut self, item_id: &str) -> &mut MasteryRecord {
        let defaults = &self.defaults;
        self.records
            .entry(item_id.to_string())
            .or_insert_with(|| MasteryRecord::new(item_id, defaults))
    }

    /// Whether `item_id` is mastered at `threshold`.
    pub fn is_mastered(&self, item_id: &str, threshold: f64) -> bool {
        match self.records.get(item_id) {
            Some(record) => record.is_mastered(threshold),
            None => self.defaults.p_init >= threshold,
        }
    }

    /// Iterate over existing records.
    pub fn records(&self) -> impl Iterator<Item = &MasteryRecord> {
        self.records.values()
    }

    /// Iterate mutably over existing records.
    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut MasteryRecord> {
        self.records.values_mut()
    }

    /// Snapshot of all records sorted by item ID.
    pub fn to_sorted_vec(&self) -> Vec<MasteryRecord> {
        let mut records: Vec<_> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        records
    }

    /// Calibration used for new records.
    pub fn defaults(&self) -> &BktConfig {
        &self.defaults
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record exists yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
