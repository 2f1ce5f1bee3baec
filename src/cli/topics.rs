//! Topics command: cluster progress and menu eligibility.

use serde::{Deserialize, Serialize};

use crate::cli::load_scheduler;
use crate::config::Config;
use crate::core::cluster_display_name;
use crate::error::Result;
use crate::storage::{ContentStore, MasteryStore};

/// Options for the topics command.
#[derive(Debug, Clone, Default)]
pub struct TopicsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Progress through one cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    /// Cluster tag, e.g. `cluster:basic-verbs`.
    pub tag: String,
    /// Display name, e.g. `Basic Verbs`.
    pub name: String,
    pub item_count: usize,
    /// Fraction of items mastered.
    pub progress: f64,
    pub mastered: bool,
    /// Offered in the topic menu.
    pub eligible: bool,
}

/// Output format for the topics command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsOutput {
    pub success: bool,
    pub topics: Vec<TopicSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TopicsOutput {
    pub fn success(topics: Vec<TopicSummary>) -> Self {
        Self {
            success: true,
            topics,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            topics: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn format_text(&self) -> String {
        if !self.success {
            return format!(
                "Topics failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }
        if self.topics.is_empty() {
            return "No topics found.".to_string();
        }

        let mut lines = vec![format!("{:<20}  {:>5}  {:>8}  {}", "TOPIC", "ITEMS", "MASTERED", "STATUS")];
        lines.push("-".repeat(50));
        for topic in &self.topics {
            let status = if topic.mastered {
                "done"
            } else if topic.eligible {
                "available"
            } else {
                "locked"
            };
            lines.push(format!(
                "{:<20}  {:>5}  {:>7.0}%  {}",
                topic.name,
                topic.item_count,
                topic.progress * 100.0,
                status
            ));
        }
        lines.join("\n")
    }
}

/// The topics command implementation.
pub struct TopicsCommand<C: ContentStore, M: MasteryStore> {
    content: C,
    mastery: M,
    config: Config,
}

impl<C: ContentStore, M: MasteryStore> TopicsCommand<C, M> {
    pub fn new(content: C, mastery: M, config: Config) -> Self {
        Self {
            content,
            mastery,
            config,
        }
    }

    pub fn run(&self, _options: &TopicsOptions) -> TopicsOutput {
        match self.summarize() {
            Ok(topics) => TopicsOutput::success(topics),
            Err(e) => TopicsOutput::failure(e.to_string()),
        }
    }

    fn summarize(&self) -> Result<Vec<TopicSummary>> {
        let scheduler = load_scheduler(&self.content, &self.mastery, &self.config)?;
        let graph = scheduler.graph();
        let book = scheduler.book();
        let threshold = scheduler.config().mastery_threshold;
        let eligible = graph.eligible_clusters(book, threshold);

        Ok(graph
            .cluster_tags()
            .into_iter()
            .map(|tag| TopicSummary {
                name: cluster_display_name(&tag),
                item_count: graph.items_in_cluster(&tag).count(),
                progress: graph.cluster_progress(&tag, book, threshold),
                mastered: graph.cluster_fully_mastered(&tag, book, threshold),
                eligible: eligible.contains(&tag),
                tag,
            })
            .collect())
    }

    pub fn format_output(&self, output: &TopicsOutput, options: &TopicsOptions) -> String {
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
