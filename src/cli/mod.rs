//! CLI commands for the tutor.
//!
//! - **practice**: the interactive exercise loop
//! - **queue**, **topics**, **status**: read-only reports
//!
//! Every command takes its stores by value so tests can run it against the
//! in-memory implementations.

pub mod practice;
pub mod queue;
pub mod status;
pub mod topics;

pub use practice::PracticeCommand;
pub use queue::QueueCommand;
pub use status::StatusCommand;
pub use topics::TopicsCommand;

use crate::config::Config;
use crate::core::KnowledgeGraph;
use crate::error::{FailOpen, Result};
use crate::exercises::{ChinesePopulator, ExerciseDeck};
use crate::scheduler::Scheduler;
use crate::storage::{ContentStore, MasteryStore};

/// Build a scheduler from stored content and mastery.
pub fn load_scheduler<C: ContentStore, M: MasteryStore>(
    content: &C,
    mastery: &M,
    config: &Config,
) -> Result<Scheduler> {
    let graph = KnowledgeGraph::new(content.items()?)?;
    let records = mastery.load_all()?;
    tracing::debug!(items = graph.len(), records = records.len(), "loaded tutor state");
    Ok(Scheduler::from_config(graph, records, config))
}

/// Build the exercise deck for a session.
///
/// The auxiliary tables are optional; a table that fails to load leaves its
/// exercise family without content.
pub fn load_deck<C: ContentStore>(content: &C, scheduler: &Scheduler, config: &Config) -> ExerciseDeck {
    let pairs = content
        .confusable_pairs()
        .fail_open_default("loading confusable pairs");
    let templates = content
        .cloze_templates()
        .fail_open_default("loading cloze templates");
    let populator = ChinesePopulator::new(pairs, templates);
    ExerciseDeck::new(&populator, scheduler.graph().items(), &config.exercises)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::ExerciseFamily;
    use crate::storage::file::{CLOZE_TEMPLATES_FILE, CONFUSABLE_PAIRS_FILE, VOCABULARY_FILE};
    use crate::storage::{FileContentStore, MemoryMasteryStore};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_deck_survives_corrupt_auxiliary_tables() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(VOCABULARY_FILE),
            r#"[
                {"id": "v001", "chinese": "我", "pinyin": "wǒ", "english": "I, me", "tags": ["cluster:pronouns"]},
                {"id": "v002", "chinese": "你", "pinyin": "nǐ", "english": "you", "tags": ["cluster:pronouns"]},
                {"id": "v003", "chinese": "他", "pinyin": "tā", "english": "he, him", "tags": ["cluster:pronouns"]},
                {"id": "v004", "chinese": "她", "pinyin": "tā", "english": "she, her", "tags": ["cluster:pronouns"]}
            ]"#,
        )
        .unwrap();
        fs::write(dir.path().join(CONFUSABLE_PAIRS_FILE), "{oops").unwrap();
        fs::write(dir.path().join(CLOZE_TEMPLATES_FILE), "[{]").unwrap();

        let content = FileContentStore::with_dir(dir.path());
        let config = Config::default();
        let scheduler = load_scheduler(&content, &MemoryMasteryStore::new(), &config).unwrap();
        let mut deck = load_deck(&content, &scheduler, &config);

        assert!(deck
            .generate_family(ExerciseFamily::MultipleChoice, Some("v001"))
            .is_some());
        assert!(deck
            .generate_family(ExerciseFamily::FillBlank, Some("v001"))
            .is_none());
    }
}
