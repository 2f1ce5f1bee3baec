//! Status command: per-item scheduling state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::load_scheduler;
use crate::config::Config;
use crate::core::SchedulingMode;
use crate::error::Result;
use crate::scheduler::ItemStatus;
use crate::storage::{ContentStore, MasteryStore};

/// Options for the status command.
#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Status of one item with its display form.
#[derive(Debug, Clone, Serialize)]
pub struct StatusRow {
    pub native: String,
    #[serde(flatten)]
    pub status: ItemStatus,
}

/// Output format for the status command.
#[derive(Debug, Clone, Serialize)]
pub struct StatusOutput {
    pub success: bool,
    pub items: Vec<StatusRow>,
    pub mastered_count: usize,
    /// Earliest retention review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            items: Vec::new(),
            mastered_count: 0,
            next_due: None,
            error: Some(error.into()),
        }
    }

    pub fn format_text(&self) -> String {
        if !self.success {
            return format!(
                "Status failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }
        if self.items.is_empty() {
            return "No items loaded.".to_string();
        }

        let mut lines = vec![format!(
            "{} of {} items mastered",
            self.mastered_count,
            self.items.len()
        )];
        if let Some(due) = self.next_due {
            lines.push(format!("Next review due: {}", due.format("%Y-%m-%d %H:%M UTC")));
        }
        lines.push(String::new());
        lines.push(format!(
            "{:<6}  {:<20}  {:<9}  {:>8}  {:>6}  {}",
            "ID", "ITEM", "MODE", "ESTIMATE", "SEEN", "DUE"
        ));
        lines.push("-".repeat(72));
        for row in &self.items {
            let status = &row.status;
            let estimate = match status.mode {
                SchedulingMode::Learning => status.p_known,
                SchedulingMode::Retention => status.retrievability,
            };
            let estimate = estimate.map_or("-".to_string(), |p| format!("{:.2}", p));
            let due = status
                .due
                .map_or("-".to_string(), |d| d.format("%Y-%m-%d").to_string());
            lines.push(format!(
                "{:<6}  {:<20}  {:<9}  {:>8}  {:>6}  {}",
                status.item_id, row.native, status.mode, estimate, status.practice_count, due
            ));
        }
        lines.join("\n")
    }
}

/// The status command implementation.
pub struct StatusCommand<C: ContentStore, M: MasteryStore> {
    content: C,
    mastery: M,
    config: Config,
}

impl<C: ContentStore, M: MasteryStore> StatusCommand<C, M> {
    pub fn new(content: C, mastery: M, config: Config) -> Self {
        Self {
            content,
            mastery,
            config,
        }
    }

    pub fn run(&self, _options: &StatusOptions) -> StatusOutput {
        self.run_at(Utc::now())
    }

    /// Status as of `now`.
    pub fn run_at(&self, now: DateTime<Utc>) -> StatusOutput {
        match self.collect(now) {
            Ok(output) => output,
            Err(e) => StatusOutput::failure(e.to_string()),
        }
    }

    fn collect(&self, now: DateTime<Utc>) -> Result<StatusOutput> {
        let scheduler = load_scheduler(&self.content, &self.mastery, &self.config)?;
        let items: Vec<StatusRow> = scheduler
            .graph()
            .items()
            .iter()
            .map(|item| StatusRow {
                native: item.native.clone(),
                status: scheduler.status_at(item, now),
            })
            .collect();
        Ok(StatusOutput {
            success: true,
            mastered_count: items.iter().filter(|row| row.status.mastered).count(),
            next_due: scheduler.next_due_time(),
            items,
            error: None,
        })
    }

    pub fn format_output(&self, output: &StatusOutput, options: &StatusOptions) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BktConfig;
    use crate::core::MasteryRecord;
    use crate::fixtures::pronouns;
    use crate::memory::MemoryModel;
    use crate::storage::{MemoryContentStore, MemoryMasteryStore};
    use chrono::TimeZone;

    #[test]
    fn test_status_rows_for_both_modes() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut retained = MasteryRecord::new("v001", &BktConfig::default());
        retained.learning_mut().unwrap().p_known = 0.97;
        MemoryModel::default().initialize(&mut retained, now).unwrap();

        let mastery = MemoryMasteryStore::new();
        mastery.save_all(&[retained]).unwrap();
        let cmd = StatusCommand::new(
            MemoryContentStore::with_items(pronouns()),
            mastery,
            Config::default(),
        );

        let output = cmd.run_at(now);
        assert!(output.success);
        assert_eq!(output.items.len(), 4);
        assert_eq!(output.mastered_count, 1);
        assert!(output.next_due.is_some());

        let first = &output.items[0].status;
        assert_eq!(first.mode, SchedulingMode::Retention);
        assert!(first.retrievability.is_some());

        let second = &output.items[1].status;
        assert_eq!(second.mode, SchedulingMode::Learning);
        assert_eq!(second.p_known, Some(0.0));
        assert_eq!(second.practice_count, 0);

        let json: serde_json::Value = serde_json::to_value(&output).unwrap();
        assert_eq!(json["items"][0]["item_id"], "v001");
        assert_eq!(json["items"][0]["native"], "我");
        assert_eq!(json["items"][0]["mode"], "retention");

        assert!(output.format_text().starts_with("1 of 4 items mastered"));
    }
}
