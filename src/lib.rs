//! Mastery tutor - adaptive practice scheduling for Mandarin
//!
//! The tutor tracks how well a student knows each vocabulary word and
//! grammar pattern, picks what to practice next, and synthesizes exercises
//! from declarative content. Items are learned under Bayesian Knowledge
//! Tracing until mastered, then handed to a spaced-repetition memory model.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod exercises;
pub mod memory;
pub mod scheduler;
pub mod storage;

#[cfg(test)]
pub(crate) mod fixtures;

pub use config::Config;
pub use core::{
    ClozeTemplate, ConfusablePair, ItemKind, KnowledgeGraph, KnowledgeItem, MasteryBook,
    MasteryRecord, SchedulingMode, SessionState,
};
pub use error::{FailOpen, Result, TutorError};
pub use exercises::{
    check_answer, AnswerCheck, ChinesePopulator, Exercise, ExerciseDeck, ExerciseFamily,
    SchemaPopulator,
};
pub use memory::MemoryModel;
pub use scheduler::{ItemStatus, ItemUpdate, Scheduler};
pub use storage::{
    ContentStore, FileContentStore, FileMasteryStore, MasteryStore, MemoryContentStore,
    MemoryMasteryStore,
};

// CLI commands
pub use cli::{PracticeCommand, QueueCommand, StatusCommand, TopicsCommand};
