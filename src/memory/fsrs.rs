//! FSRS spaced-repetition calculator.
//!
//! Implements the published FSRS-4.5 model with its default weights: a
//! power forgetting curve, difficulty with mean reversion, and separate
//! stability updates for recall and lapse.
//!
//! Ratings:
//! - Again: forgot; card enters relearning with a short step
//! - Hard: recalled with serious difficulty
//! - Good: recalled
//! - Easy: recalled without effort

use chrono::{DateTime, Duration, Utc};

use super::{Card, MemoryCalculator, Rating};
use crate::core::CardState;

/// FSRS-4.5 default weights.
pub const DEFAULT_WEIGHTS: [f64; 19] = [
    0.4072, 1.1829, 3.1262, 15.4722, 7.2102, 0.5316, 1.0651, 0.0234, 1.616, 0.1544, 1.0824,
    1.9813, 0.0953, 0.2975, 2.2042, 0.2407, 2.9466, 0.5034, 0.6567,
];

/// Forgetting curve exponent.
const DECAY: f64 = -0.5;

/// Chosen so that R = 0.9 when t = S.
const FACTOR: f64 = 19.0 / 81.0;

const MIN_DIFFICULTY: f64 = 1.0;
const MAX_DIFFICULTY: f64 = 10.0;
const MIN_STABILITY: f64 = 0.01;

/// Delay before a forgotten card is shown again.
const RELEARNING_STEP_MINUTES: i64 = 10;

/// FSRS calculator with fixed weights and desired retention.
#[derive(Debug, Clone)]
pub struct FsrsCalculator {
    weights: [f64; 19],
    desired_retention: f64,
    maximum_interval_days: u32,
}

impl Default for FsrsCalculator {
    fn default() -> Self {
        Self::new(0.9, 36500)
    }
}

impl FsrsCalculator {
    /// Calculator with default weights.
    pub fn new(desired_retention: f64, maximum_interval_days: u32) -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            desired_retention,
            maximum_interval_days: maximum_interval_days.max(1),
        }
    }

    fn w(&self, i: usize) -> f64 {
        self.weights[i]
    }

    /// Stability after the first review with `rating`.
    fn initial_stability(&self, rating: Rating) -> f64 {
        self.w(rating.grade() as usize - 1).max(MIN_STABILITY)
    }

    /// Difficulty after the first review with `rating`.
    fn initial_difficulty(&self, rating: Rating) -> f64 {
        let g = rating.grade() as f64;
        (self.w(4) - (g - 3.0) * self.w(5)).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    /// Difficulty after a review, reverted towards the Easy baseline.
    fn next_difficulty(&self, difficulty: f64, rating: Rating) -> f64 {
        let g = rating.grade() as f64;
        let shifted = difficulty - self.w(6) * (g - 3.0);
        let reverted = self.w(7) * self.initial_difficulty(Rating::Easy) + (1.0 - self.w(7)) * shifted;
        reverted.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    fn recall_stability(&self, d: f64, s: f64, r: f64, rating: Rating) -> f64 {
        let hard_penalty = if rating == Rating::Hard { self.w(15) } else { 1.0 };
        let easy_bonus = if rating == Rating::Easy { self.w(16) } else { 1.0 };
        s * (self.w(8).exp()
            * (11.0 - d)
            * s.powf(-self.w(9))
            * ((self.w(10) * (1.0 - r)).exp() - 1.0)
            * hard_penalty
            * easy_bonus
            + 1.0)
    }

    fn forget_stability(&self, d: f64, s: f64, r: f64) -> f64 {
        let forgotten = self.w(11)
            * d.powf(-self.w(12))
            * ((s + 1.0).powf(self.w(13)) - 1.0)
            * (self.w(14) * (1.0 - r)).exp();
        forgotten.min(s)
    }

    fn short_term_stability(&self, s: f64, rating: Rating) -> f64 {
        let g = rating.grade() as f64;
        s * (self.w(17) * (g - 3.0 + self.w(18))).exp()
    }

    /// Days until recall probability falls to the desired retention.
    pub fn next_interval(&self, stability: f64) -> i64 {
        let days = stability / FACTOR * (self.desired_retention.powf(1.0 / DECAY) - 1.0);
        (days.round() as i64).clamp(1, self.maximum_interval_days as i64)
    }

    fn schedule(&self, mut card: Card, rating: Rating, now: DateTime<Utc>) -> Card {
        card.last_review = Some(now);
        if rating == Rating::Again {
            card.state = match card.state {
                CardState::New | CardState::Learning => CardState::Learning,
                CardState::Review | CardState::Relearning => CardState::Relearning,
            };
            card.step = 0;
            card.due = now + Duration::minutes(RELEARNING_STEP_MINUTES);
        } else {
            card.state = CardState::Review;
            card.step = 0;
            card.due = now + Duration::days(self.next_interval(card.stability));
        }
        card
    }
}

/// Recall probability after `elapsed_days` at `stability`.
///
/// # Arguments
///
/// * `elapsed_days` - Days since the last review (negative values count as 0)
/// * `stability` - Memory stability in days
pub fn forgetting_curve(elapsed_days: f64, stability: f64) -> f64 {
    let t = elapsed_days.max(0.0);
    let s = stability.max(MIN_STABILITY);
    (1.0 + FACTOR * t / s).powf(DECAY)
}

fn elapsed_days(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match since {
        Some(at) => (now - at).num_seconds().max(0) as f64 / 86_400.0,
        None => 0.0,
    }
}

impl MemoryCalculator for FsrsCalculator {
    fn new_card(&self, now: DateTime<Utc>) -> Card {
        Card {
            stability: 0.0,
            difficulty: 0.0,
            due: now,
            last_review: None,
            state: CardState::New,
            step: 0,
        }
    }

    fn review(&self, card: &Card, rating: Rating, now: DateTime<Utc>) -> Card {
        let mut next = card.clone();

        if card.state == CardState::New || card.last_review.is_none() {
            next.stability = self.initial_stability(rating);
            next.difficulty = self.initial_difficulty(rating);
            return self.schedule(next, rating, now);
        }

        let elapsed = elapsed_days(card.last_review, now);
        let r = forgetting_curve(elapsed, card.stability);
        next.difficulty = self.next_difficulty(card.difficulty, rating);

        next.stability = if elapsed < 1.0 {
            self.short_term_stability(card.stability, rating)
        } else if rating == Rating::Again {
            self.forget_stability(card.difficulty, card.stability, r)
        } else {
            self.recall_stability(card.difficulty, card.stability, r, rating)
        }
        .max(MIN_STABILITY);

        self.schedule(next, rating, now)
    }

    fn retrievability(&self, card: &Card, now: DateTime<Utc>) -> Option<f64> {
        let last = card.last_review?;
        let r = forgetting_curve(elapsed_days(Some(last), now), card.stability);
        Some(r.clamp(0.0, 1.0))
    }
}
