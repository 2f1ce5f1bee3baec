//! Core types for the tutor.
//!
//! Knowledge items and the graph they form, per-item mastery records, and
//! the ephemeral session state.

pub mod content;
pub mod graph;
pub mod item;
pub mod mastery;
pub mod session;

pub use content::{ClozeTemplate, ConfusablePair};
pub use graph::KnowledgeGraph;
pub use item::{cluster_display_name, ItemKind, KnowledgeItem, CATEGORY_PREFIX, CLUSTER_PREFIX};
pub use mastery::{
    CardState, LearningState, MasteryBook, MasteryRecord, RetentionState, SchedulingMode,
    SchedulingState,
};
pub use session::{PracticeMode, SessionState};
