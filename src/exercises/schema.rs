//! Declarative exercise schemas.
//!
//! Each family has a handful of flat relations filled once per session by a
//! populator and read by the generators. Lookup indices are built when a
//! schema is constructed, so generators never scan whole tables and never
//! look at domain fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How plausible a wrong option is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionLabel {
    /// Confusable with the correct answer.
    Distractor,
    /// Safely different from the correct answer.
    Nondistractor,
}

impl OptionLabel {
    /// Label for an option that does (or does not) share a topic with the
    /// target.
    pub fn from_related(related: bool) -> Self {
        if related {
            OptionLabel::Distractor
        } else {
            OptionLabel::Nondistractor
        }
    }
}

fn push_index<K: std::hash::Hash + Eq>(index: &mut HashMap<K, Vec<usize>>, key: K, row: usize) {
    index.entry(key).or_default().push(row);
}

// ===== Multiple choice =====

/// A kind of prompt with its question template.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptType {
    pub id: String,
    /// Question text with a `{value}` placeholder.
    pub template: String,
    /// Whether the secondary hint is shown with the question.
    pub show_secondary: bool,
}

impl PromptType {
    pub fn new(id: impl Into<String>, template: impl Into<String>, show_secondary: bool) -> Self {
        Self {
            id: id.into(),
            template: template.into(),
            show_secondary,
        }
    }

    /// Question text for `value`.
    pub fn render(&self, value: &str) -> String {
        self.template.replace("{value}", value)
    }
}

/// A value that can be asked about, with its correct answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptValue {
    pub prompt_type: String,
    pub value: String,
    pub correct_answer: String,
    /// Item whose mastery this prompt exercises.
    pub item_id: String,
    /// Hint text such as a pronunciation. May be empty.
    pub secondary: String,
}

/// A candidate answer for one prompt value.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    pub prompt_type: String,
    /// Prompt value this option belongs to.
    pub value: String,
    pub label: OptionLabel,
    pub option_value: String,
}

/// Relations for multiple-choice generation.
#[derive(Debug, Clone, Default)]
pub struct MultipleChoiceSchema {
    prompt_types: Vec<PromptType>,
    prompt_values: Vec<PromptValue>,
    options: Vec<ChoiceOption>,
    type_index: HashMap<String, usize>,
    item_index: HashMap<String, Vec<usize>>,
    // prompt type -> value -> option rows
    option_index: HashMap<String, HashMap<String, Vec<usize>>>,
}

impl MultipleChoiceSchema {
    pub fn new(
        prompt_types: Vec<PromptType>,
        prompt_values: Vec<PromptValue>,
        options: Vec<ChoiceOption>,
    ) -> Self {
        let type_index = prompt_types
            .iter()
            .enumerate()
            .map(|(i, pt)| (pt.id.clone(), i))
            .collect();

        let mut item_index = HashMap::new();
        for (i, pv) in prompt_values.iter().enumerate() {
            push_index(&mut item_index, pv.item_id.clone(), i);
        }

        let mut option_index: HashMap<String, HashMap<String, Vec<usize>>> = HashMap::new();
        for (i, opt) in options.iter().enumerate() {
            let by_value = option_index.entry(opt.prompt_type.clone()).or_default();
            push_index(by_value, opt.value.clone(), i);
        }

        Self {
            prompt_types,
            prompt_values,
            options,
            type_index,
            item_index,
            option_index,
        }
    }

    pub fn prompt_type(&self, id: &str) -> Option<&PromptType> {
        self.type_index.get(id).map(|&i| &self.prompt_types[i])
    }

    pub fn prompt_types(&self) -> &[PromptType] {
        &self.prompt_types
    }

    pub fn prompt_values(&self) -> &[PromptValue] {
        &self.prompt_values
    }

    /// Prompt values exercising `item_id`.
    pub fn values_for_item<'a>(&'a self, item_id: &str) -> impl Iterator<Item = &'a PromptValue> {
        self.item_index
            .get(item_id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.prompt_values[i])
    }

    /// Options belonging to `value` under `prompt_type`.
    pub fn options_for<'a>(
        &'a self,
        prompt_type: &str,
        value: &str,
    ) -> impl Iterator<Item = &'a ChoiceOption> {
        self.option_index
            .get(prompt_type)
            .and_then(|by_value| by_value.get(value))
            .into_iter()
            .flatten()
            .map(move |&i| &self.options[i])
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompt_values.is_empty()
    }
}

// ===== Fill blank =====

/// A sentence with one blank.
#[derive(Debug, Clone, PartialEq)]
pub struct BlankTemplate {
    pub id: String,
    /// Sentence with a `_____` marker.
    pub sentence: String,
    /// Optional hint such as a translation.
    pub context: String,
}

/// The correct fill for a template.
#[derive(Debug, Clone, PartialEq)]
pub struct BlankFill {
    pub template_id: String,
    pub correct_answer: String,
    pub item_id: String,
}

/// A candidate fill for a template.
#[derive(Debug, Clone, PartialEq)]
pub struct BlankOption {
    pub template_id: String,
    pub label: OptionLabel,
    pub option_value: String,
}

/// Relations for fill-blank generation.
#[derive(Debug, Clone, Default)]
pub struct FillBlankSchema {
    templates: Vec<BlankTemplate>,
    fills: Vec<BlankFill>,
    options: Vec<BlankOption>,
    template_index: HashMap<String, usize>,
    item_index: HashMap<String, Vec<usize>>,
    option_index: HashMap<String, Vec<usize>>,
}

impl FillBlankSchema {
    pub fn new(templates: Vec<BlankTemplate>, fills: Vec<BlankFill>, options: Vec<BlankOption>) -> Self {
        let template_index = templates
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();

        let mut item_index = HashMap::new();
        for (i, fill) in fills.iter().enumerate() {
            push_index(&mut item_index, fill.item_id.clone(), i);
        }

        let mut option_index = HashMap::new();
        for (i, opt) in options.iter().enumerate() {
            push_index(&mut option_index, opt.template_id.clone(), i);
        }

        Self {
            templates,
            fills,
            options,
            template_index,
            item_index,
            option_index,
        }
    }

    pub fn template(&self, id: &str) -> Option<&BlankTemplate> {
        self.template_index.get(id).map(|&i| &self.templates[i])
    }

    pub fn fills(&self) -> &[BlankFill] {
        &self.fills
    }

    /// Fills whose answer is `item_id`.
    pub fn fills_for_item<'a>(&'a self, item_id: &str) -> impl Iterator<Item = &'a BlankFill> {
        self.item_index
            .get(item_id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.fills[i])
    }

    pub fn options_for<'a>(&'a self, template_id: &str) -> impl Iterator<Item = &'a BlankOption> {
        self.option_index
            .get(template_id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.options[i])
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }
}

// ===== Reorder =====

/// One piece of a sentence pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Text that is always present.
    Fixed(String),
    /// Filled from the named slot.
    Slot(String),
}

/// Base and third-person-singular forms of an English verb placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbForms {
    /// Placeholder name in the prompt template.
    pub key: String,
    pub base: String,
    pub third_person: String,
}

/// A sentence pattern whose chunks are put back in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderTemplate {
    pub id: String,
    /// English sentence with `{slot}`, `{be}` and verb placeholders.
    pub prompt_template: String,
    /// Native chunks in canonical order.
    pub chunks: Vec<Chunk>,
    /// Slot names in fill order.
    pub slots: Vec<String>,
    /// Grammar item the pattern exercises, if any.
    pub grammar_item: Option<String>,
    pub verbs: Vec<VerbForms>,
}

/// A candidate fill for one slot of one template.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotFill {
    pub template_id: String,
    pub slot: String,
    /// Native chunk.
    pub native: String,
    /// English gloss used in the prompt.
    pub gloss: String,
    pub item_id: String,
}

/// Relations for reorder generation.
#[derive(Debug, Clone, Default)]
pub struct ReorderSchema {
    templates: Vec<ReorderTemplate>,
    fills: Vec<SlotFill>,
    // template -> slot -> fill rows
    fill_index: HashMap<String, HashMap<String, Vec<usize>>>,
    // item -> templates it fills a slot of
    item_templates: HashMap<String, Vec<usize>>,
}

impl ReorderSchema {
    pub fn new(templates: Vec<ReorderTemplate>, fills: Vec<SlotFill>) -> Self {
        let template_pos: HashMap<&str, usize> = templates
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();

        let mut fill_index: HashMap<String, HashMap<String, Vec<usize>>> = HashMap::new();
        let mut item_templates: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, fill) in fills.iter().enumerate() {
            let by_slot = fill_index.entry(fill.template_id.clone()).or_default();
            push_index(by_slot, fill.slot.clone(), i);

            if let Some(&t) = template_pos.get(fill.template_id.as_str()) {
                let entry = item_templates.entry(fill.item_id.clone()).or_default();
                if !entry.contains(&t) {
                    entry.push(t);
                }
            }
        }

        Self {
            templates,
            fills,
            fill_index,
            item_templates,
        }
    }

    pub fn templates(&self) -> &[ReorderTemplate] {
        &self.templates
    }

    /// Templates that `item_id` fills a slot of.
    pub fn templates_for_item<'a>(&'a self, item_id: &str) -> impl Iterator<Item = &'a ReorderTemplate> {
        self.item_templates
            .get(item_id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.templates[i])
    }

    pub fn fills_for<'a>(&'a self, template_id: &str, slot: &str) -> impl Iterator<Item = &'a SlotFill> {
        self.fill_index
            .get(template_id)
            .and_then(|by_slot| by_slot.get(slot))
            .into_iter()
            .flatten()
            .map(move |&i| &self.fills[i])
    }

    pub fn fill_count(&self) -> usize {
        self.fills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty() || self.fills.is_empty()
    }
}
