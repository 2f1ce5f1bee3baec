//! Exercise types.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::TutorError;

static EXERCISE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Default difficulty per family.
pub mod difficulty {
    pub const MULTIPLE_CHOICE: f64 = 0.4;
    pub const FILL_BLANK: f64 = 0.5;
    pub const REORDER: f64 = 0.3;
}

/// Generate an exercise ID.
///
/// Format: ex_YYYYMMDD_NNN where NNN is a process-local counter, padded to
/// at least three digits.
pub fn generate_exercise_id() -> String {
    let now = Utc::now();
    let counter = EXERCISE_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("ex_{}_{:03}", now.format("%Y%m%d"), counter)
}

/// Exercise family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseFamily {
    MultipleChoice,
    FillBlank,
    Reorder,
}

impl ExerciseFamily {
    pub const ALL: [ExerciseFamily; 3] = [
        ExerciseFamily::MultipleChoice,
        ExerciseFamily::FillBlank,
        ExerciseFamily::Reorder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseFamily::MultipleChoice => "multiple_choice",
            ExerciseFamily::FillBlank => "fill_blank",
            ExerciseFamily::Reorder => "reorder",
        }
    }
}

impl fmt::Display for ExerciseFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseFamily {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mc" | "multiple_choice" | "multiple-choice" => Ok(ExerciseFamily::MultipleChoice),
            "fill" | "fill_blank" | "fill-blank" | "cloze" => Ok(ExerciseFamily::FillBlank),
            "reorder" | "order" => Ok(ExerciseFamily::Reorder),
            other => Err(TutorError::config(format!(
                "unknown exercise family '{}' (expected mc, fill or reorder)",
                other
            ))),
        }
    }
}

/// Pick one option from a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultipleChoice {
    pub prompt_type: String,
    pub prompt: String,
    /// Hint shown next to the prompt. May be empty.
    pub secondary: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// Pick the word completing a sentence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillBlank {
    pub template_id: String,
    pub sentence: String,
    pub context: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// Put sentence chunks back in order.
///
/// `chunks` are stored in canonical order; the handler shuffles them for
/// display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reorder {
    pub template_id: String,
    pub prompt: String,
    pub english: String,
    pub chunks: Vec<String>,
    pub correct_order: Vec<usize>,
}

/// Family-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ExerciseBody {
    MultipleChoice(MultipleChoice),
    FillBlank(FillBlank),
    Reorder(Reorder),
}

/// A generated exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exercise {
    pub id: String,
    /// Items whose mastery the answer updates.
    pub source_ids: Vec<String>,
    pub difficulty: f64,
    #[serde(flatten)]
    pub body: ExerciseBody,
}

impl Exercise {
    pub fn new(source_ids: Vec<String>, difficulty: f64, body: ExerciseBody) -> Self {
        Self {
            id: generate_exercise_id(),
            source_ids,
            difficulty: difficulty.clamp(0.0, 1.0),
            body,
        }
    }

    pub fn family(&self) -> ExerciseFamily {
        match &self.body {
            ExerciseBody::MultipleChoice(_) => ExerciseFamily::MultipleChoice,
            ExerciseBody::FillBlank(_) => ExerciseFamily::FillBlank,
            ExerciseBody::Reorder(_) => ExerciseFamily::Reorder,
        }
    }

    /// Answer options for the choice families.
    pub fn options(&self) -> Option<&[String]> {
        match &self.body {
            ExerciseBody::MultipleChoice(mc) => Some(&mc.options),
            ExerciseBody::FillBlank(fb) => Some(&fb.options),
            ExerciseBody::Reorder(_) => None,
        }
    }

    /// Display form of the correct answer.
    pub fn correct_answer(&self) -> String {
        match &self.body {
            ExerciseBody::MultipleChoice(mc) => {
                mc.options.get(mc.correct_index).cloned().unwrap_or_default()
            }
            ExerciseBody::FillBlank(fb) => {
                fb.options.get(fb.correct_index).cloned().unwrap_or_default()
            }
            ExerciseBody::Reorder(r) => r
                .correct_order
                .iter()
                .filter_map(|&i| r.chunks.get(i).map(String::as_str))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reorder() -> Exercise {
        Exercise::new(
            vec!["v003".into(), "v007".into(), "g001".into()],
            difficulty::REORDER,
            ExerciseBody::Reorder(Reorder {
                template_id: "reorder_0".into(),
                prompt: "Translate: \"He is a teacher\"".into(),
                english: "He is a teacher".into(),
                chunks: vec!["他".into(), "是".into(), "老师".into()],
                correct_order: vec![0, 1, 2],
            }),
        )
    }

    #[test]
    fn test_id_format() {
        let id = generate_exercise_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ex");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[2].len() >= 3);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_ids_unique_past_a_thousand() {
        let ids: std::collections::HashSet<String> =
            (0..1500).map(|_| generate_exercise_id()).collect();
        assert_eq!(ids.len(), 1500);
    }

    #[test]
    fn test_family_parsing() {
        assert_eq!("mc".parse::<ExerciseFamily>().unwrap(), ExerciseFamily::MultipleChoice);
        assert_eq!("Fill".parse::<ExerciseFamily>().unwrap(), ExerciseFamily::FillBlank);
        assert_eq!("reorder".parse::<ExerciseFamily>().unwrap(), ExerciseFamily::Reorder);
        assert!("essay".parse::<ExerciseFamily>().is_err());
    }

    #[test]
    fn test_reorder_correct_answer_joins_chunks() {
        let ex = reorder();
        assert_eq!(ex.correct_answer(), "他是老师");
        assert_eq!(ex.family(), ExerciseFamily::Reorder);
        assert!(ex.options().is_none());
    }

    #[test]
    fn test_serializes_with_family_tag() {
        let json = serde_json::to_value(reorder()).unwrap();
        assert_eq!(json["family"], "reorder");
        assert_eq!(json["chunks"][0], "他");
        assert_eq!(json["source_ids"][2], "g001");
    }
}
