//! Practice command: the interactive exercise loop.
//!
//! Reads answers line by line from any `BufRead` and writes prompts to any
//! `Write`, so the loop runs the same against a terminal or a test buffer.
//! Mastery is saved after every judged exercise; `q` or end of input stops
//! the session.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::cli::{load_deck, load_scheduler};
use crate::config::Config;
use crate::core::cluster_display_name;
use crate::error::Result;
use crate::exercises::{check_answer, Exercise, ExerciseBody, ExerciseFamily, ReorderPresentation};
use crate::scheduler::Scheduler;
use crate::storage::{ContentStore, MasteryStore};

/// Options for the practice command.
#[derive(Debug, Clone, Default)]
pub struct PracticeOptions {
    /// Print the session summary as JSON.
    pub json: bool,
    /// Suppress the session summary.
    pub quiet: bool,
    /// Start in blocked practice on this cluster.
    pub cluster: Option<String>,
    /// Preferred exercise family.
    pub family: Option<ExerciseFamily>,
}

/// Summary of one practice session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PracticeOutput {
    pub success: bool,
    /// Exercises judged.
    pub exercises: u32,
    /// Exercises answered correctly.
    pub correct: u32,
    /// Items that moved to retention during the session.
    pub newly_mastered: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PracticeOutput {
    fn started() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn format_text(&self) -> String {
        if !self.success {
            return format!(
                "Practice failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }
        if self.exercises == 0 {
            return "No exercises completed.".to_string();
        }
        let mut text = format!(
            "Session complete: {}/{} correct",
            self.correct, self.exercises
        );
        if !self.newly_mastered.is_empty() {
            text.push_str(&format!("\nNewly mastered: {}", self.newly_mastered.join(", ")));
        }
        text
    }
}

/// The practice command implementation.
pub struct PracticeCommand<C: ContentStore, M: MasteryStore> {
    content: C,
    mastery: M,
    config: Config,
}

impl<C: ContentStore, M: MasteryStore> PracticeCommand<C, M> {
    pub fn new(content: C, mastery: M, config: Config) -> Self {
        Self {
            content,
            mastery,
            config,
        }
    }

    /// Run an interactive session over `input` and `out`.
    pub fn run<R: BufRead, W: Write>(
        &self,
        options: &PracticeOptions,
        input: &mut R,
        out: &mut W,
    ) -> PracticeOutput {
        match self.practice(options, input, out) {
            Ok(output) => output,
            Err(e) => PracticeOutput::failure(e.to_string()),
        }
    }

    fn practice<R: BufRead, W: Write>(
        &self,
        options: &PracticeOptions,
        input: &mut R,
        out: &mut W,
    ) -> Result<PracticeOutput> {
        let mut scheduler = load_scheduler(&self.content, &self.mastery, &self.config)?;
        let mut deck = load_deck(&self.content, &scheduler, &self.config);
        let menu_interval = scheduler.config().menu_interval;
        if let Some(cluster) = &options.cluster {
            scheduler.activate_blocked_practice(cluster)?;
        }

        let mut summary = PracticeOutput::started();
        'session: loop {
            if scheduler.session().menu_due(menu_interval)
                && !offer_menu(&mut scheduler, input, out)?
            {
                break;
            }

            let Some(item) = scheduler
                .select_next_item()
                .and_then(|id| scheduler.graph().get(&id).cloned())
            else {
                writeln!(out, "Nothing to practice.")?;
                break;
            };
            let fallback_family = options.family.unwrap_or(ExerciseFamily::MultipleChoice);
            let Some(exercise) = deck
                .generate_for(&item, options.family)
                .or_else(|| deck.generate(fallback_family, None))
            else {
                writeln!(out, "Not enough content to build an exercise.")?;
                break;
            };
            scheduler.mark_served(&item.id);

            let presentation = match &exercise.body {
                ExerciseBody::Reorder(reorder) => Some(deck.present_reorder(reorder.chunks.len())),
                _ => None,
            };
            writeln!(out, "\n{}", render_exercise(&exercise, presentation.as_ref()))?;

            let check = loop {
                write!(out, "> ")?;
                out.flush()?;
                let Some(raw) = read_line(input)? else {
                    break 'session;
                };
                let check = check_answer(&exercise, &raw, presentation.as_ref());
                if !check.retry {
                    break check;
                }
                writeln!(out, "{}", retry_hint(&exercise))?;
            };

            summary.exercises += 1;
            if check.is_correct {
                summary.correct += 1;
                writeln!(out, "Correct!")?;
            } else {
                writeln!(out, "Not quite. The answer is: {}", check.correct_answer)?;
            }

            let updates = scheduler.update_multi_skill(&exercise.source_ids, check.is_correct)?;
            for update in updates.iter().filter(|u| u.transitioned) {
                let name = scheduler
                    .graph()
                    .get(&update.item_id)
                    .map_or(update.item_id.as_str(), |item| item.native.as_str());
                writeln!(out, "Mastered {}! It will come back for review.", name)?;
                summary.newly_mastered.push(update.item_id.clone());
            }
            self.mastery.save_all(&scheduler.records())?;

            if scheduler.check_blocked_practice_complete() {
                writeln!(out, "Topic complete. Back to mixed practice.")?;
            }
        }

        Ok(summary)
    }

    /// Format the session summary according to options.
    pub fn format_output(&self, output: &PracticeOutput, options: &PracticeOptions) -> String {
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

/// Show the topic menu and apply the choice.
///
/// Returns false when the student quits.
fn offer_menu<R: BufRead, W: Write>(
    scheduler: &mut Scheduler,
    input: &mut R,
    out: &mut W,
) -> Result<bool> {
    scheduler.session_mut().menu_shown();
    let threshold = scheduler.config().mastery_threshold;
    let clusters = scheduler
        .graph()
        .eligible_clusters(scheduler.book(), threshold);
    if clusters.is_empty() {
        return Ok(true);
    }

    writeln!(out, "\nTopics:")?;
    for (i, tag) in clusters.iter().enumerate() {
        let progress = scheduler
            .graph()
            .cluster_progress(tag, scheduler.book(), threshold);
        writeln!(
            out,
            "  {}. {} ({:.0}% mastered)",
            i + 1,
            cluster_display_name(tag),
            progress * 100.0
        )?;
    }
    writeln!(out, "Pick a topic to focus on, or press Enter to mix everything (q to quit).")?;
    write!(out, "> ")?;
    out.flush()?;

    let Some(choice) = read_line(input)? else {
        return Ok(false);
    };
    if choice.is_empty() {
        return Ok(true);
    }
    let picked = choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| clusters.get(i));
    match picked {
        Some(tag) => {
            scheduler.activate_blocked_practice(tag)?;
            writeln!(out, "Focusing on {}.", cluster_display_name(tag))?;
        }
        None => writeln!(out, "No such topic. Mixing everything.")?,
    }
    Ok(true)
}

/// Read one trimmed line. None on end of input or `q`.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    Ok(Some(line.to_string()))
}

fn retry_hint(exercise: &Exercise) -> String {
    match &exercise.body {
        ExerciseBody::Reorder(reorder) => format!(
            "Enter the chunk numbers in order, e.g. {}",
            (1..=reorder.chunks.len())
                .rev()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        ),
        _ => {
            let count = exercise.options().map_or(0, <[String]>::len);
            let last = (b'A' + count.saturating_sub(1).min(25) as u8) as char;
            format!("Enter a letter A-{} or a number 1-{}.", last, count)
        }
    }
}

/// Text shown to the student for one exercise.
pub fn render_exercise(exercise: &Exercise, presentation: Option<&ReorderPresentation>) -> String {
    let mut lines = Vec::new();
    match &exercise.body {
        ExerciseBody::MultipleChoice(mc) => {
            if mc.secondary.is_empty() {
                lines.push(mc.prompt.clone());
            } else {
                lines.push(format!("{} ({})", mc.prompt, mc.secondary));
            }
            push_options(&mut lines, &mc.options);
        }
        ExerciseBody::FillBlank(fb) => {
            lines.push(fb.sentence.clone());
            if !fb.context.is_empty() {
                lines.push(format!("({})", fb.context));
            }
            push_options(&mut lines, &fb.options);
        }
        ExerciseBody::Reorder(reorder) => {
            lines.push(reorder.prompt.clone());
            let identity = ReorderPresentation::identity(reorder.chunks.len());
            let shown = presentation.unwrap_or(&identity).display(&reorder.chunks);
            let numbered: Vec<String> = shown
                .iter()
                .enumerate()
                .map(|(i, chunk)| format!("{}. {}", i + 1, chunk))
                .collect();
            lines.push(format!("  {}", numbered.join("   ")));
        }
    }
    lines.join("\n")
}

fn push_options(lines: &mut Vec<String>, options: &[String]) {
    for (i, option) in options.iter().enumerate() {
        let letter = (b'A' + i as u8) as char;
        lines.push(format!("  {}. {}", letter, option));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExercisesConfig;
    use crate::exercises::exercise::{difficulty, Reorder};
    use crate::fixtures::curriculum;
    use crate::storage::{MemoryContentStore, MemoryMasteryStore};
    use std::io::Cursor;
    use std::sync::Arc;

    fn seeded_config() -> Config {
        Config {
            exercises: ExercisesConfig {
                seed: Some(7),
                ..ExercisesConfig::default()
            },
            ..Config::default()
        }
    }

    fn run_session(
        options: &PracticeOptions,
        input: &str,
    ) -> (PracticeOutput, String, Arc<MemoryMasteryStore>) {
        let mastery = Arc::new(MemoryMasteryStore::new());
        let cmd = PracticeCommand::new(
            MemoryContentStore::with_items(curriculum()),
            Arc::clone(&mastery),
            seeded_config(),
        );
        let mut out = Vec::new();
        let output = cmd.run(options, &mut Cursor::new(input.as_bytes()), &mut out);
        (output, String::from_utf8(out).unwrap(), mastery)
    }

    #[test]
    fn test_one_exercise_then_quit() {
        // Enter at the menu, answer "1", quit at the next exercise
        let (output, text, mastery) = run_session(&PracticeOptions::default(), "\n1\nq\n");

        assert!(output.success, "{:?}", output.error);
        assert_eq!(output.exercises, 1);
        assert!(text.contains("Topics:"));

        let records = mastery.load_all().unwrap();
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r.practice_count == 1));
    }

    #[test]
    fn test_quit_at_menu() {
        let (output, _, mastery) = run_session(&PracticeOptions::default(), "q\n");
        assert!(output.success);
        assert_eq!(output.exercises, 0);
        assert!(mastery.is_empty());
        assert_eq!(output.format_text(), "No exercises completed.");
    }

    #[test]
    fn test_blocked_cluster_skips_menu() {
        let options = PracticeOptions {
            cluster: Some("pronouns".to_string()),
            ..PracticeOptions::default()
        };
        let (output, text, _) = run_session(&options, "1\n");
        assert!(output.success);
        assert_eq!(output.exercises, 1);
        assert!(!text.contains("Topics:"));
    }

    #[test]
    fn test_unknown_cluster_fails() {
        let options = PracticeOptions {
            cluster: Some("astronomy".to_string()),
            ..PracticeOptions::default()
        };
        let (output, _, _) = run_session(&options, "");
        assert!(!output.success);
        assert!(output.error.unwrap().contains("astronomy"));
    }

    #[test]
    fn test_malformed_answer_asks_again() {
        let options = PracticeOptions {
            cluster: Some("pronouns".to_string()),
            family: Some(ExerciseFamily::MultipleChoice),
            ..PracticeOptions::default()
        };
        let (output, text, _) = run_session(&options, "zz\n1\n");
        assert_eq!(output.exercises, 1);
        assert!(text.contains("Enter a letter A-D"));
    }

    #[test]
    fn test_render_reorder_uses_display_order() {
        let exercise = Exercise::new(
            vec!["g001".into()],
            difficulty::REORDER,
            ExerciseBody::Reorder(Reorder {
                template_id: "reorder_0".into(),
                prompt: "Translate: \"He is a teacher\"".into(),
                english: "He is a teacher".into(),
                chunks: vec!["他".into(), "是".into(), "老师".into()],
                correct_order: vec![0, 1, 2],
            }),
        );
        let presentation = ReorderPresentation::from_order(vec![1, 2, 0]).unwrap();
        let text = render_exercise(&exercise, Some(&presentation));
        assert!(text.contains("1. 是   2. 老师   3. 他"));
    }

    #[test]
    fn test_summary_json() {
        let cmd = PracticeCommand::new(
            MemoryContentStore::default(),
            MemoryMasteryStore::new(),
            Config::default(),
        );
        let output = PracticeOutput {
            success: true,
            exercises: 3,
            correct: 2,
            newly_mastered: vec!["v001".into()],
            error: None,
        };
        let options = PracticeOptions {
            json: true,
            ..PracticeOptions::default()
        };
        let json: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &options)).unwrap();
        assert_eq!(json["correct"], 2);
        assert_eq!(json["newly_mastered"][0], "v001");
        assert!(json.get("error").is_none());
    }
}
