//! Bayesian Knowledge Tracing update.
//!
//! Update logic:
//! 1. Condition the prior on the observation (slip on correct, guess on
//!    incorrect)
//! 2. Apply the learning transition: `p' + (1 - p') * t`
//! 3. Clamp to [0, 1]

use crate::core::LearningState;

/// Posterior knowledge probability after one observed attempt.
///
/// # Arguments
/// * `p` - Prior knowledge probability
/// * `t` - Transition (learn) probability
/// * `s` - Slip probability
/// * `g` - Guess probability
/// * `correct` - Whether the attempt was answered correctly
pub fn posterior(p: f64, t: f64, s: f64, g: f64, correct: bool) -> f64 {
    let (numerator, denominator) = if correct {
        let known = p * (1.0 - s);
        (known, known + (1.0 - p) * g)
    } else {
        let known = p * s;
        (known, known + (1.0 - p) * (1.0 - g))
    };

    let conditioned = if denominator == 0.0 {
        p
    } else {
        numerator / denominator
    };

    let learned = conditioned + (1.0 - conditioned) * t;
    if learned.is_nan() {
        return p.clamp(0.0, 1.0);
    }
    learned.clamp(0.0, 1.0)
}

/// Apply one observation to a learning state in place, returning the new
/// knowledge probability.
pub fn update(state: &mut LearningState, correct: bool) -> f64 {
    state.p_known = posterior(
        state.p_known,
        state.p_transit,
        state.p_slip,
        state.p_guess,
        correct,
    );
    state.p_known
}
