//! Priority scoring for interleaved item selection.
//!
//! Scoring weights:
//! - Overdue retention item: `min(overdue_hours / 168, 1) * REVIEW + OVERDUE_BASE`
//! - Upcoming retention item: `UPCOMING * max(0, 1 - hours_until_due / 168)`
//! - Learning item needing review: `REVIEW * (1 - p_known)`
//! - Frontier item: `+ FRONTIER`
//! - Kind differs from the last served item: `+ INTERLEAVE`
//!
//! Scores are combined by sum. The highest score wins; ties go to the item
//! seen first.

use chrono::{DateTime, Utc};

use crate::core::ItemKind;

/// Score weights for item selection.
pub mod weights {
    /// Weight for review urgency.
    pub const REVIEW: f64 = 1.0;
    /// Bonus for items on the learning frontier.
    pub const FRONTIER: f64 = 0.5;
    /// Bonus for switching item kind.
    pub const INTERLEAVE: f64 = 0.1;
    /// Floor added to any overdue retention item.
    pub const OVERDUE_BASE: f64 = 0.5;
    /// Largest bonus for a retention item that is not yet due.
    pub const UPCOMING: f64 = 0.1;
}

/// Hours over which overdue urgency saturates, and upcoming bonus fades.
pub const HORIZON_HOURS: f64 = 168.0;

/// Scheduling facts about one candidate item.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    /// Item in retention mode with its due time (None counts as due now).
    Retention { due: Option<DateTime<Utc>> },
    /// Item in learning mode.
    Learning {
        p_known: f64,
        needs_review: bool,
        on_frontier: bool,
    },
}

/// Score a candidate at `now`.
///
/// # Arguments
/// * `candidate` - Mode-specific facts about the item
/// * `kind` - Kind of the item being scored
/// * `last_kind` - Kind of the item served last, if any
/// * `now` - Current timestamp (for testability)
pub fn score(
    candidate: &Candidate,
    kind: ItemKind,
    last_kind: Option<ItemKind>,
    now: DateTime<Utc>,
) -> f64 {
    let mut total = match candidate {
        Candidate::Retention { due } => score_retention(*due, now),
        Candidate::Learning {
            p_known,
            needs_review,
            on_frontier,
        } => {
            let mut s = 0.0;
            if *needs_review {
                s += weights::REVIEW * (1.0 - p_known.clamp(0.0, 1.0));
            }
            if *on_frontier {
                s += weights::FRONTIER;
            }
            s
        }
    };

    if last_kind.is_some_and(|last| last != kind) {
        total += weights::INTERLEAVE;
    }

    total
}

fn score_retention(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let due = due.unwrap_or(now);
    let hours = (now - due).num_seconds() as f64 / 3600.0;
    if hours >= 0.0 {
        (hours / HORIZON_HOURS).min(1.0) * weights::REVIEW + weights::OVERDUE_BASE
    } else {
        let until = -hours;
        weights::UPCOMING * (1.0 - until / HORIZON_HOURS).max(0.0)
    }
}

/// Index of the highest score, ties to the earliest. None for no scores.
pub fn best(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &s) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if s <= top => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}
