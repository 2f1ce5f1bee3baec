//! Answer parsing and checking.
//!
//! Malformed input never errors: it is judged incorrect with a retry
//! signal so the caller can ask again.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::exercise::{Exercise, ExerciseBody, Reorder};

/// Result of checking one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerCheck {
    pub is_correct: bool,
    /// Display form of the correct answer.
    pub correct_answer: String,
    /// Input could not be parsed; ask again.
    pub retry: bool,
}

impl AnswerCheck {
    fn judged(is_correct: bool, correct_answer: String) -> Self {
        Self {
            is_correct,
            correct_answer,
            retry: false,
        }
    }

    fn malformed(correct_answer: String) -> Self {
        Self {
            is_correct: false,
            correct_answer,
            retry: true,
        }
    }
}

/// Display order of a reorder exercise's chunks.
///
/// `order[k]` is the canonical index of the chunk shown at position `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPresentation {
    order: Vec<usize>,
}

impl ReorderPresentation {
    /// Chunks shown in canonical order.
    pub fn identity(len: usize) -> Self {
        Self {
            order: (0..len).collect(),
        }
    }

    /// Random display order for `len` chunks.
    ///
    /// Avoids showing the solution as-is when more than one chunk exists.
    pub fn shuffled<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..len).collect();
        if len > 1 {
            while order.iter().enumerate().all(|(i, &c)| i == c) {
                order.shuffle(rng);
            }
        }
        Self { order }
    }

    /// Presentation from an explicit order. None unless it is a permutation.
    pub fn from_order(order: Vec<usize>) -> Option<Self> {
        let mut seen = vec![false; order.len()];
        for &i in &order {
            if i >= order.len() || seen[i] {
                return None;
            }
            seen[i] = true;
        }
        Some(Self { order })
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Chunks in display order.
    pub fn display<'a>(&self, chunks: &'a [String]) -> Vec<&'a str> {
        self.order
            .iter()
            .filter_map(|&i| chunks.get(i).map(String::as_str))
            .collect()
    }
}

/// Parse a choice answer: a letter A-F (any case) or a 1-based number.
///
/// Returns the 0-based index, or None when malformed or out of range.
pub fn parse_choice_input(raw: &str, option_count: usize) -> Option<usize> {
    let raw = raw.trim();
    let index = if let Ok(n) = raw.parse::<usize>() {
        n.checked_sub(1)?
    } else {
        let mut chars = raw.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() || !('A'..='F').contains(&letter) {
            return None;
        }
        (letter as u8 - b'A') as usize
    };
    (index < option_count).then_some(index)
}

/// Parse a reorder answer: whitespace-separated 1-based positions.
///
/// Returns 0-based display positions, or None when any token is not a
/// number in range.
pub fn parse_order_input(raw: &str, chunk_count: usize) -> Option<Vec<usize>> {
    let positions: Vec<usize> = raw
        .split_whitespace()
        .map(|token| {
            token
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .filter(|&p| p < chunk_count)
        })
        .collect::<Option<_>>()?;
    (!positions.is_empty()).then_some(positions)
}

fn check_reorder(reorder: &Reorder, raw: &str, presentation: &ReorderPresentation) -> AnswerCheck {
    let canonical: Vec<&str> = reorder
        .correct_order
        .iter()
        .filter_map(|&i| reorder.chunks.get(i).map(String::as_str))
        .collect();
    let correct_answer = canonical.concat();

    let displayed = presentation.display(&reorder.chunks);
    let Some(positions) = parse_order_input(raw, displayed.len()) else {
        return AnswerCheck::malformed(correct_answer);
    };
    let answer: Vec<&str> = positions.iter().map(|&p| displayed[p]).collect();
    AnswerCheck::judged(answer == canonical, correct_answer)
}

/// Check `raw` against `exercise`.
///
/// `presentation` is the display order used for a reorder exercise; when
/// absent the chunks are taken as shown in canonical order.
pub fn check_answer(
    exercise: &Exercise,
    raw: &str,
    presentation: Option<&ReorderPresentation>,
) -> AnswerCheck {
    let (option_count, correct_index) = match &exercise.body {
        ExerciseBody::MultipleChoice(mc) => (mc.options.len(), mc.correct_index),
        ExerciseBody::FillBlank(fb) => (fb.options.len(), fb.correct_index),
        ExerciseBody::Reorder(reorder) => {
            return match presentation {
                Some(p) => check_reorder(reorder, raw, p),
                None => check_reorder(
                    reorder,
                    raw,
                    &ReorderPresentation::identity(reorder.chunks.len()),
                ),
            };
        }
    };

    let correct_answer = exercise.correct_answer();
    match parse_choice_input(raw, option_count) {
        Some(index) => AnswerCheck::judged(index == correct_index, correct_answer),
        None => AnswerCheck::malformed(correct_answer),
    }
}
