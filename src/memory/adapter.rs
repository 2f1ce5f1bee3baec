//! Adapter between mastery records and a memory calculator.
//!
//! Four operations: seed a fresh memory state, apply a review, read the
//! current retrievability, and answer whether a review is due. The adapter
//! only copies fields between [`RetentionState`] and [`Card`]; scheduling
//! policy lives in the scheduler.

use chrono::{DateTime, Utc};

use super::{Card, FsrsCalculator, MemoryCalculator, Rating};
use crate::config::MemoryConfig;
use crate::core::{MasteryRecord, RetentionState, SchedulingState};
use crate::error::{Result, TutorError};

/// Memory model client owned by the scheduler.
pub struct MemoryModel {
    calculator: Box<dyn MemoryCalculator>,
}

impl std::fmt::Debug for MemoryModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryModel").finish_non_exhaustive()
    }
}

impl Default for MemoryModel {
    fn default() -> Self {
        Self::new(FsrsCalculator::default())
    }
}

impl MemoryModel {
    /// Wrap a calculator.
    pub fn new(calculator: impl MemoryCalculator + 'static) -> Self {
        Self {
            calculator: Box::new(calculator),
        }
    }

    /// FSRS model from configuration.
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(FsrsCalculator::new(
            config.desired_retention,
            config.maximum_interval_days,
        ))
    }

    /// Seed a fresh memory state as if a first successful review happened
    /// at `now`, replacing the record's learning state.
    ///
    /// Fails if the record is already in retention mode.
    pub fn initialize(&self, record: &mut MasteryRecord, now: DateTime<Utc>) -> Result<()> {
        if record.retention().is_some() {
            return Err(TutorError::invalid_state(format!(
                "memory state for {} already initialized",
                record.item_id
            )));
        }
        let card = self
            .calculator
            .review(&self.calculator.new_card(now), Rating::Good, now);
        record.state = SchedulingState::Retention(to_retention(&card, None));
        Ok(())
    }

    /// Advance the memory state after an attempt and recompute the due date.
    ///
    /// Fails if the record was never initialized.
    pub fn review(&self, record: &mut MasteryRecord, correct: bool, now: DateTime<Utc>) -> Result<()> {
        let item_id = record.item_id.clone();
        let state = record.retention_mut().ok_or_else(|| {
            TutorError::invalid_state(format!(
                "memory review on {} before initialize",
                item_id
            ))
        })?;
        let card = to_card(state, now);
        let next = self
            .calculator
            .review(&card, Rating::from_correct(correct), now);
        *state = to_retention(&next, state.transitioned_at);
        Ok(())
    }

    /// Current recall probability, None unless in retention mode with a
    /// recorded review.
    pub fn retrievability(&self, record: &MasteryRecord, now: DateTime<Utc>) -> Option<f64> {
        let state = record.retention()?;
        self.calculator
            .retrievability(&to_card(state, now), now)
            .map(|r| r.clamp(0.0, 1.0))
    }

    /// Whether the due time has passed. An unset due time counts as due.
    pub fn is_due(&self, record: &MasteryRecord, now: DateTime<Utc>) -> bool {
        match self.due_date(record) {
            Some(due) => due <= now,
            None => true,
        }
    }

    /// Due time of a retention-mode record.
    pub fn due_date(&self, record: &MasteryRecord) -> Option<DateTime<Utc>> {
        record.retention().and_then(|r| r.due)
    }
}

fn to_card(state: &RetentionState, now: DateTime<Utc>) -> Card {
    Card {
        stability: state.stability,
        difficulty: state.difficulty,
        due: state.due.unwrap_or(now),
        last_review: state.last_review,
        state: state.state,
        step: state.step,
    }
}

fn to_retention(card: &Card, transitioned_at: Option<DateTime<Utc>>) -> RetentionState {
    RetentionState {
        stability: card.stability,
        difficulty: card.difficulty,
        due: Some(card.due),
        last_review: card.last_review,
        state: card.state,
        step: card.step,
        transitioned_at,
    }
}
