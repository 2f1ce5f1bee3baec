//! Spaced-repetition memory model.
//!
//! The scheduler never talks to a calculator directly. It goes through
//! [`MemoryModel`], which marshals a retention-mode [`MasteryRecord`] to and
//! from the calculator's [`Card`].
//!
//! [`MasteryRecord`]: crate::core::MasteryRecord

pub mod adapter;
pub mod fsrs;

use chrono::{DateTime, Utc};

use crate::core::CardState;

pub use adapter::MemoryModel;
pub use fsrs::FsrsCalculator;

/// Review outcome as seen by the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Numeric grade, 1 (Again) to 4 (Easy).
    pub fn grade(&self) -> u8 {
        match self {
            Rating::Again => 1,
            Rating::Hard => 2,
            Rating::Good => 3,
            Rating::Easy => 4,
        }
    }

    /// Coarse mapping from answer correctness.
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Rating::Good
        } else {
            Rating::Again
        }
    }
}

/// Calculator-native memory state.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub stability: f64,
    pub difficulty: f64,
    pub due: DateTime<Utc>,
    pub last_review: Option<DateTime<Utc>>,
    pub state: CardState,
    pub step: u32,
}

/// A spaced-repetition calculator.
///
/// Implementations are pure: every method maps inputs to a new value and
/// never mutates shared state.
pub trait MemoryCalculator: Send + Sync {
    /// A card that has never been reviewed.
    fn new_card(&self, now: DateTime<Utc>) -> Card;

    /// The card after a review with `rating` at `now`.
    fn review(&self, card: &Card, rating: Rating, now: DateTime<Utc>) -> Card;

    /// Probability of recall at `now`, or None if never reviewed.
    fn retrievability(&self, card: &Card, now: DateTime<Utc>) -> Option<f64>;
}

impl<T: MemoryCalculator + ?Sized> MemoryCalculator for Box<T> {
    fn new_card(&self, now: DateTime<Utc>) -> Card {
        (**self).new_card(now)
    }

    fn review(&self, card: &Card, rating: Rating, now: DateTime<Utc>) -> Card {
        (**self).review(card, rating, now)
    }

    fn retrievability(&self, card: &Card, now: DateTime<Utc>) -> Option<f64> {
        (**self).retrievability(card, now)
    }
}
