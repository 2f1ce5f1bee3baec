//! Declarative exercise synthesis.
//!
//! A populator flattens domain content into generic schemas, generators
//! turn schema rows into [`Exercise`]s, and the handler judges answers.
//! Only the populator reads knowledge item fields.

pub mod deck;
pub mod distractors;
pub mod exercise;
pub mod generator;
pub mod handler;
pub mod populator;
pub mod schema;

pub use deck::ExerciseDeck;
pub use distractors::select_distractors;
pub use exercise::{
    Exercise, ExerciseBody, ExerciseFamily, FillBlank, MultipleChoice, Reorder,
};
pub use generator::{FillBlankGenerator, MultipleChoiceGenerator, ReorderGenerator};
pub use handler::{check_answer, parse_choice_input, parse_order_input, AnswerCheck, ReorderPresentation};
pub use populator::{ChinesePopulator, SchemaPopulator};
pub use schema::{FillBlankSchema, MultipleChoiceSchema, OptionLabel, ReorderSchema};
