//! Queue command: preview the next composed session.

use serde::{Deserialize, Serialize};

use crate::cli::load_scheduler;
use crate::config::Config;
use crate::core::SchedulingMode;
use crate::error::Result;
use crate::storage::{ContentStore, MasteryStore};

/// Options for the queue command.
#[derive(Debug, Clone, Default)]
pub struct QueueOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Queue length; the configured session size when unset.
    pub size: Option<usize>,
}

/// One queued item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub item_id: String,
    pub native: String,
    pub translation: String,
    pub mode: SchedulingMode,
}

/// Output format for the queue command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueOutput {
    pub success: bool,
    pub queue: Vec<QueueEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueueOutput {
    pub fn success(queue: Vec<QueueEntry>) -> Self {
        Self {
            success: true,
            queue,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            queue: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        if !self.success {
            return format!(
                "Queue failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }
        if self.queue.is_empty() {
            return "Nothing to practice.".to_string();
        }

        let mut lines = vec![format!("Next session ({} items):", self.queue.len())];
        lines.push(String::new());
        lines.push(format!("{:>3}  {:<6}  {:<10}  {:<8}  {}", "#", "ID", "ITEM", "MODE", "MEANING"));
        lines.push("-".repeat(60));
        for (i, entry) in self.queue.iter().enumerate() {
            lines.push(format!(
                "{:>3}  {:<6}  {:<10}  {:<8}  {}",
                i + 1,
                entry.item_id,
                entry.native,
                entry.mode,
                entry.translation
            ));
        }
        lines.join("\n")
    }
}

/// The queue command implementation.
pub struct QueueCommand<C: ContentStore, M: MasteryStore> {
    content: C,
    mastery: M,
    config: Config,
}

impl<C: ContentStore, M: MasteryStore> QueueCommand<C, M> {
    pub fn new(content: C, mastery: M, config: Config) -> Self {
        Self {
            content,
            mastery,
            config,
        }
    }

    pub fn run(&self, options: &QueueOptions) -> QueueOutput {
        match self.compose(options.size) {
            Ok(queue) => QueueOutput::success(queue),
            Err(e) => QueueOutput::failure(e.to_string()),
        }
    }

    fn compose(&self, size: Option<usize>) -> Result<Vec<QueueEntry>> {
        let mut scheduler = load_scheduler(&self.content, &self.mastery, &self.config)?;
        let ids = scheduler.compose_session_queue(size);
        Ok(ids
            .iter()
            .filter_map(|id| scheduler.graph().get(id))
            .map(|item| QueueEntry {
                item_id: item.id.clone(),
                native: item.native.clone(),
                translation: item.primary_translation().to_string(),
                mode: scheduler
                    .book()
                    .get(&item.id)
                    .map_or(SchedulingMode::Learning, |r| r.mode()),
            })
            .collect())
    }

    /// Format output according to options.
    pub fn format_output(&self, output: &QueueOutput, options: &QueueOptions) -> String {
        if options.quiet && output.success {
            return String::new();
        }
        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            output.format_text()
        }
    }
}
