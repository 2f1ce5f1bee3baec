//! Time-based mastery decay for learning-mode items.
//!
//! Decay logic:
//! 1. Only learning-mode records that have been practiced decay
//! 2. Elapsed time runs from the later of `last_practiced` and `decayed_at`
//! 3. `p_known -= rate_per_week * weeks_elapsed`, floored at 0
//! 4. `decayed_at` is stamped so the same interval is never applied twice
//!
//! Retention-mode records are owned by the memory model and never decay here.

use chrono::{DateTime, Utc};

use crate::core::MasteryRecord;

const SECONDS_PER_WEEK: f64 = 7.0 * 24.0 * 3600.0;

/// Outcome of a decay pass over one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecayResult {
    /// Knowledge probability reduced from `from` to `to`.
    Decayed { from: f64, to: f64 },
    /// Learning-mode record with nothing to decay.
    Unchanged,
    /// Retention-mode record, not subject to decay.
    Retention,
}

/// Apply decay to a single record at `now`.
///
/// # Arguments
/// * `record` - Record to decay in place
/// * `rate_per_week` - Knowledge probability lost per week
/// * `now` - Current timestamp (for testability)
pub fn apply(record: &mut MasteryRecord, rate_per_week: f64, now: DateTime<Utc>) -> DecayResult {
    let last_practiced = record.last_practiced;
    let Some(state) = record.learning_mut() else {
        return DecayResult::Retention;
    };
    let Some(practiced) = last_practiced else {
        return DecayResult::Unchanged;
    };

    let anchor = match state.decayed_at {
        Some(decayed) if decayed > practiced => decayed,
        _ => practiced,
    };
    let elapsed = (now - anchor).num_seconds();
    if elapsed <= 0 || rate_per_week <= 0.0 || state.p_known <= 0.0 {
        return DecayResult::Unchanged;
    }

    let weeks = elapsed as f64 / SECONDS_PER_WEEK;
    let from = state.p_known;
    let to = (from - rate_per_week * weeks).max(0.0);
    state.p_known = to;
    state.decayed_at = Some(now);

    DecayResult::Decayed { from, to }
}
