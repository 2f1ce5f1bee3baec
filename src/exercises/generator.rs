//! Exercise generators over populated schemas.
//!
//! Choice assembly, shared by multiple choice and fill blank:
//! 1. Gather the row's options, dropping any equal to the correct answer and
//!    duplicates
//! 2. Take `clamp(available_distractors, min, max)` distractors, capped by
//!    availability and by `total_options - 1`
//! 3. Fill the remaining wrong-answer slots from nondistractors, then from
//!    leftover distractors
//! 4. Too few wrong answers: no exercise. Options are never fabricated
//! 5. Prepend the correct answer, shuffle if configured, record its index

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::ChoiceConfig;

use super::exercise::{difficulty, Exercise, ExerciseBody, FillBlank, MultipleChoice, Reorder};
use super::schema::{
    Chunk, FillBlankSchema, MultipleChoiceSchema, OptionLabel, ReorderSchema, ReorderTemplate,
    SlotFill,
};

/// Slot whose English gloss drives verb agreement.
pub const SUBJECT_SLOT: &str = "subject";

/// Build a shuffled option list around `correct`.
///
/// Returns the options and the index of `correct`, or None when there are
/// not enough distinct wrong answers.
pub fn assemble_options<'a, R, I>(
    correct: &str,
    candidates: I,
    config: &ChoiceConfig,
    rng: &mut R,
) -> Option<(Vec<String>, usize)>
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = (OptionLabel, &'a str)>,
{
    let wrong_needed = config.total_options.saturating_sub(1);

    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(correct);
    let mut distractors = Vec::new();
    let mut nondistractors = Vec::new();
    for (label, value) in candidates {
        if !seen.insert(value) {
            continue;
        }
        match label {
            OptionLabel::Distractor => distractors.push(value),
            OptionLabel::Nondistractor => nondistractors.push(value),
        }
    }

    if distractors.len() + nondistractors.len() < wrong_needed {
        return None;
    }

    distractors.shuffle(rng);
    nondistractors.shuffle(rng);

    let n_distractors = distractors
        .len()
        .max(config.min_distractors)
        .min(config.max_distractors)
        .min(distractors.len())
        .min(wrong_needed);

    let mut wrong: Vec<&str> = distractors[..n_distractors].to_vec();
    let short = wrong_needed - wrong.len();
    wrong.extend(nondistractors.iter().take(short));

    if wrong.len() < wrong_needed {
        return None;
    }

    let mut options: Vec<String> = std::iter::once(correct)
        .chain(wrong)
        .map(str::to_string)
        .collect();
    if config.shuffle {
        options.shuffle(rng);
    }
    let correct_index = options.iter().position(|o| o == correct)?;
    Some((options, correct_index))
}

/// Generates multiple-choice exercises.
#[derive(Debug, Clone)]
pub struct MultipleChoiceGenerator {
    schema: MultipleChoiceSchema,
    config: ChoiceConfig,
}

impl MultipleChoiceGenerator {
    pub fn new(schema: MultipleChoiceSchema, config: ChoiceConfig) -> Self {
        Self { schema, config }
    }

    pub fn schema(&self) -> &MultipleChoiceSchema {
        &self.schema
    }

    /// Whether any prompt exists (for `target`, if given).
    pub fn can_generate(&self, target: Option<&str>) -> bool {
        match target {
            Some(id) => self.schema.values_for_item(id).next().is_some(),
            None => !self.schema.is_empty(),
        }
    }

    /// Generate an exercise, optionally for one item and one prompt type.
    ///
    /// Candidate prompts are tried in random order until one has enough
    /// options.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        target: Option<&str>,
        prompt_type: Option<&str>,
        rng: &mut R,
    ) -> Option<Exercise> {
        let mut candidates: Vec<_> = match target {
            Some(id) => self.schema.values_for_item(id).collect(),
            None => self.schema.prompt_values().iter().collect(),
        };
        if let Some(pt) = prompt_type {
            candidates.retain(|pv| pv.prompt_type == pt);
        }
        candidates.shuffle(rng);

        for pv in candidates {
            let Some(pt) = self.schema.prompt_type(&pv.prompt_type) else {
                continue;
            };
            let options = self
                .schema
                .options_for(&pv.prompt_type, &pv.value)
                .map(|o| (o.label, o.option_value.as_str()));
            let Some((options, correct_index)) =
                assemble_options(&pv.correct_answer, options, &self.config, rng)
            else {
                tracing::debug!(item = %pv.item_id, prompt_type = %pv.prompt_type, "not enough options");
                continue;
            };

            let secondary = if pt.show_secondary {
                pv.secondary.clone()
            } else {
                String::new()
            };
            return Some(Exercise::new(
                vec![pv.item_id.clone()],
                difficulty::MULTIPLE_CHOICE,
                ExerciseBody::MultipleChoice(MultipleChoice {
                    prompt_type: pv.prompt_type.clone(),
                    prompt: pt.render(&pv.value),
                    secondary,
                    options,
                    correct_index,
                }),
            ));
        }
        None
    }
}

/// Generates fill-blank exercises.
#[derive(Debug, Clone)]
pub struct FillBlankGenerator {
    schema: FillBlankSchema,
    config: ChoiceConfig,
}

impl FillBlankGenerator {
    pub fn new(schema: FillBlankSchema, config: ChoiceConfig) -> Self {
        Self { schema, config }
    }

    pub fn can_generate(&self, target: Option<&str>) -> bool {
        match target {
            Some(id) => self.schema.fills_for_item(id).next().is_some(),
            None => !self.schema.is_empty(),
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, target: Option<&str>, rng: &mut R) -> Option<Exercise> {
        let mut candidates: Vec<_> = match target {
            Some(id) => self.schema.fills_for_item(id).collect(),
            None => self.schema.fills().iter().collect(),
        };
        candidates.shuffle(rng);

        for fill in candidates {
            let Some(template) = self.schema.template(&fill.template_id) else {
                continue;
            };
            let options = self
                .schema
                .options_for(&fill.template_id)
                .map(|o| (o.label, o.option_value.as_str()));
            let Some((options, correct_index)) =
                assemble_options(&fill.correct_answer, options, &self.config, rng)
            else {
                tracing::debug!(template = %fill.template_id, "not enough options");
                continue;
            };

            return Some(Exercise::new(
                vec![fill.item_id.clone()],
                difficulty::FILL_BLANK,
                ExerciseBody::FillBlank(FillBlank {
                    template_id: template.id.clone(),
                    sentence: template.sentence.clone(),
                    context: template.context.clone(),
                    options,
                    correct_index,
                }),
            ));
        }
        None
    }
}

/// Form of "to be" agreeing with an English subject.
pub fn conjugate_be(subject: &str) -> &'static str {
    match subject.to_ascii_lowercase().as_str() {
        "i" => "am",
        "you" | "we" | "they" => "are",
        _ => "is",
    }
}

/// Whether an English subject takes third-person-singular verbs.
pub fn is_third_person(subject: &str) -> bool {
    !matches!(
        subject.to_ascii_lowercase().as_str(),
        "i" | "you" | "we" | "they"
    )
}

fn capitalize(sentence: &str) -> String {
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Generates reorder exercises.
#[derive(Debug, Clone)]
pub struct ReorderGenerator {
    schema: ReorderSchema,
}

impl ReorderGenerator {
    pub fn new(schema: ReorderSchema) -> Self {
        Self { schema }
    }

    /// Whether every slot of `template` has at least one fill.
    fn is_complete(&self, template: &ReorderTemplate) -> bool {
        template
            .slots
            .iter()
            .all(|slot| self.schema.fills_for(&template.id, slot).next().is_some())
    }

    fn involves(&self, template: &ReorderTemplate, item_id: &str) -> bool {
        template.grammar_item.as_deref() == Some(item_id)
            || template
                .slots
                .iter()
                .any(|slot| self.schema.fills_for(&template.id, slot).any(|f| f.item_id == item_id))
    }

    pub fn can_generate(&self) -> bool {
        self.schema.templates().iter().any(|t| self.is_complete(t))
    }

    /// Generate an exercise, preferring a pattern that involves `target`.
    ///
    /// Falls back to any pattern whose slots can all be filled.
    pub fn generate<R: Rng + ?Sized>(&self, target: Option<&str>, rng: &mut R) -> Option<Exercise> {
        let complete: Vec<&ReorderTemplate> = self
            .schema
            .templates()
            .iter()
            .filter(|t| self.is_complete(t))
            .collect();

        let preferred: Vec<&ReorderTemplate> = match target {
            Some(id) => complete
                .iter()
                .copied()
                .filter(|t| self.involves(t, id))
                .collect(),
            None => Vec::new(),
        };
        let pool = if preferred.is_empty() { &complete } else { &preferred };
        let template = *pool.choose(rng)?;

        let mut chosen: Vec<(&str, &SlotFill)> = Vec::with_capacity(template.slots.len());
        for slot in &template.slots {
            let candidates: Vec<&SlotFill> = self.schema.fills_for(&template.id, slot).collect();
            let targeted: Vec<&SlotFill> = candidates
                .iter()
                .copied()
                .filter(|f| Some(f.item_id.as_str()) == target)
                .collect();
            let fill = if targeted.is_empty() {
                *candidates.choose(rng)?
            } else {
                *targeted.choose(rng)?
            };
            chosen.push((slot.as_str(), fill));
        }

        let english = render_english(template, &chosen);
        let chunks: Vec<String> = template
            .chunks
            .iter()
            .map(|chunk| match chunk {
                Chunk::Fixed(text) => text.clone(),
                Chunk::Slot(slot) => chosen
                    .iter()
                    .find(|(name, _)| *name == slot.as_str())
                    .map(|(_, fill)| fill.native.clone())
                    .unwrap_or_else(|| format!("{{{}}}", slot)),
            })
            .collect();
        if chunks.is_empty() {
            return None;
        }

        let mut source_ids: Vec<String> = Vec::new();
        for (_, fill) in &chosen {
            if !source_ids.contains(&fill.item_id) {
                source_ids.push(fill.item_id.clone());
            }
        }
        if let Some(grammar) = &template.grammar_item {
            source_ids.push(grammar.clone());
        }

        let correct_order = (0..chunks.len()).collect();
        Some(Exercise::new(
            source_ids,
            difficulty::REORDER,
            ExerciseBody::Reorder(Reorder {
                template_id: template.id.clone(),
                prompt: format!("Translate: \"{}\"", english),
                english,
                chunks,
                correct_order,
            }),
        ))
    }
}

fn render_english(template: &ReorderTemplate, chosen: &[(&str, &SlotFill)]) -> String {
    let mut sentence = template.prompt_template.clone();
    for (slot, fill) in chosen {
        sentence = sentence.replace(&format!("{{{}}}", slot), &fill.gloss);
    }

    if let Some((_, subject)) = chosen.iter().find(|(slot, _)| *slot == SUBJECT_SLOT) {
        sentence = sentence.replace("{be}", conjugate_be(&subject.gloss));
        let third = is_third_person(&subject.gloss);
        for verb in &template.verbs {
            let form = if third { &verb.third_person } else { &verb.base };
            sentence = sentence.replace(&format!("{{{}}}", verb.key), form);
        }
    }

    capitalize(&sentence)
}
