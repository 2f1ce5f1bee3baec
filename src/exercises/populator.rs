//! Schema population from domain content.
//!
//! A populator is the only part of exercise synthesis that reads knowledge
//! item fields. It runs once per session and flattens items and auxiliary
//! tables into the generic relations in [`super::schema`].

use std::collections::HashMap;

use crate::core::{ClozeTemplate, ConfusablePair, ItemKind, KnowledgeItem};

use super::schema::{
    BlankFill, BlankOption, BlankTemplate, ChoiceOption, Chunk, FillBlankSchema,
    MultipleChoiceSchema, OptionLabel, PromptType, PromptValue, ReorderSchema, ReorderTemplate,
    SlotFill, VerbForms,
};

/// Prompt type IDs produced by [`ChinesePopulator`].
pub mod prompt_types {
    pub const CHINESE_TO_ENGLISH: &str = "chinese_to_english";
    pub const ENGLISH_TO_CHINESE: &str = "english_to_chinese";
    pub const MINIMAL_PAIR: &str = "minimal_pair";
}

/// Fills exercise schemas from knowledge items.
pub trait SchemaPopulator {
    fn populate_multiple_choice(&self, items: &[KnowledgeItem]) -> MultipleChoiceSchema;

    fn populate_fill_blank(&self, items: &[KnowledgeItem]) -> FillBlankSchema;

    fn populate_reorder(&self, items: &[KnowledgeItem]) -> ReorderSchema;
}

/// A built-in sentence pattern for reorder exercises.
///
/// Chunks written as `{name}` are slots; `slots` maps each slot to the
/// vocabulary category (a `category:<name>` tag) that fills it.
struct Pattern {
    english: &'static str,
    chunks: &'static [&'static str],
    slots: &'static [(&'static str, &'static str)],
    grammar: Option<&'static str>,
    verbs: &'static [(&'static str, &'static str, &'static str)],
}

const PATTERNS: &[Pattern] = &[
    Pattern {
        english: "{subject} {be} a {noun}",
        chunks: &["{subject}", "是", "{noun}"],
        slots: &[("subject", "pronoun"), ("noun", "noun")],
        grammar: Some("g001"),
        verbs: &[],
    },
    Pattern {
        english: "{subject} {be} not a {noun}",
        chunks: &["{subject}", "不", "是", "{noun}"],
        slots: &[("subject", "pronoun"), ("noun", "noun")],
        grammar: Some("g002"),
        verbs: &[],
    },
    Pattern {
        english: "{subject} {be} very {adjective}",
        chunks: &["{subject}", "很", "{adjective}"],
        slots: &[("subject", "pronoun"), ("adjective", "adjective")],
        grammar: Some("g004"),
        verbs: &[],
    },
    Pattern {
        english: "{subject} {like} {object}",
        chunks: &["{subject}", "喜欢", "{object}"],
        slots: &[("subject", "pronoun"), ("object", "noun")],
        grammar: Some("g005"),
        verbs: &[("like", "like", "likes")],
    },
    Pattern {
        english: "{subject} {drink} {object}",
        chunks: &["{subject}", "喝", "{object}"],
        slots: &[("subject", "pronoun"), ("object", "drink")],
        grammar: None,
        verbs: &[("drink", "drink", "drinks")],
    },
    Pattern {
        english: "{subject} {eat} {object}",
        chunks: &["{subject}", "吃", "{object}"],
        slots: &[("subject", "pronoun"), ("object", "food")],
        grammar: None,
        verbs: &[("eat", "eat", "eats")],
    },
];

fn parse_chunk(chunk: &str) -> Chunk {
    match chunk.strip_prefix('{').and_then(|c| c.strip_suffix('}')) {
        Some(slot) => Chunk::Slot(slot.to_string()),
        None => Chunk::Fixed(chunk.to_string()),
    }
}

fn vocabulary(items: &[KnowledgeItem]) -> impl Iterator<Item = &KnowledgeItem> {
    items.iter().filter(|item| item.kind == ItemKind::Vocabulary)
}

/// Populator for Chinese vocabulary and sentence patterns.
#[derive(Debug, Clone, Default)]
pub struct ChinesePopulator {
    confusable_pairs: Vec<ConfusablePair>,
    cloze_templates: Vec<ClozeTemplate>,
}

impl ChinesePopulator {
    /// Populator using the given auxiliary tables. Either may be empty.
    pub fn new(confusable_pairs: Vec<ConfusablePair>, cloze_templates: Vec<ClozeTemplate>) -> Self {
        Self {
            confusable_pairs,
            cloze_templates,
        }
    }

    fn prompt_types() -> Vec<PromptType> {
        vec![
            PromptType::new(
                prompt_types::CHINESE_TO_ENGLISH,
                "What is the English for \"{value}\"?",
                true,
            ),
            PromptType::new(
                prompt_types::ENGLISH_TO_CHINESE,
                "What is the Chinese for \"{value}\"?",
                false,
            ),
            PromptType::new(
                prompt_types::MINIMAL_PAIR,
                "Select the character for \"{value}\"",
                true,
            ),
        ]
    }
}

impl SchemaPopulator for ChinesePopulator {
    fn populate_multiple_choice(&self, items: &[KnowledgeItem]) -> MultipleChoiceSchema {
        let vocab: Vec<&KnowledgeItem> = vocabulary(items).collect();
        let mut values = Vec::new();
        let mut options = Vec::new();

        for item in &vocab {
            let english = item.primary_translation();
            values.push(PromptValue {
                prompt_type: prompt_types::CHINESE_TO_ENGLISH.to_string(),
                value: item.native.clone(),
                correct_answer: english.to_string(),
                item_id: item.id.clone(),
                secondary: item.pronunciation.clone(),
            });
            values.push(PromptValue {
                prompt_type: prompt_types::ENGLISH_TO_CHINESE.to_string(),
                value: english.to_string(),
                correct_answer: item.native_with_pronunciation(),
                item_id: item.id.clone(),
                secondary: String::new(),
            });

            for other in vocab.iter().filter(|other| other.id != item.id) {
                let label = OptionLabel::from_related(item.shares_cluster(other));
                options.push(ChoiceOption {
                    prompt_type: prompt_types::CHINESE_TO_ENGLISH.to_string(),
                    value: item.native.clone(),
                    label,
                    option_value: other.primary_translation().to_string(),
                });
                options.push(ChoiceOption {
                    prompt_type: prompt_types::ENGLISH_TO_CHINESE.to_string(),
                    value: english.to_string(),
                    label,
                    option_value: other.native_with_pronunciation(),
                });
            }
        }

        let mut pairs: HashMap<&str, Vec<&ConfusablePair>> = HashMap::new();
        for pair in &self.confusable_pairs {
            pairs.entry(pair.target_id.as_str()).or_default().push(pair);
        }
        for item in &vocab {
            let Some(confusables) = pairs.get(item.id.as_str()) else {
                continue;
            };
            let english = item.primary_translation();
            values.push(PromptValue {
                prompt_type: prompt_types::MINIMAL_PAIR.to_string(),
                value: english.to_string(),
                correct_answer: item.native.clone(),
                item_id: item.id.clone(),
                secondary: item.pronunciation.clone(),
            });
            for pair in confusables {
                options.push(ChoiceOption {
                    prompt_type: prompt_types::MINIMAL_PAIR.to_string(),
                    value: english.to_string(),
                    label: OptionLabel::Distractor,
                    option_value: pair.native.clone(),
                });
            }
        }

        tracing::debug!(
            prompts = values.len(),
            options = options.len(),
            "populated multiple-choice schema"
        );
        MultipleChoiceSchema::new(Self::prompt_types(), values, options)
    }

    fn populate_fill_blank(&self, items: &[KnowledgeItem]) -> FillBlankSchema {
        let vocab: Vec<&KnowledgeItem> = vocabulary(items).collect();
        let by_id: HashMap<&str, &KnowledgeItem> =
            vocab.iter().map(|item| (item.id.as_str(), *item)).collect();

        let mut templates = Vec::new();
        let mut fills = Vec::new();
        let mut options = Vec::new();

        for cloze in &self.cloze_templates {
            let Some(target) = by_id.get(cloze.target_id.as_str()) else {
                tracing::debug!(template = %cloze.id, target = %cloze.target_id, "cloze target not loaded");
                continue;
            };

            templates.push(BlankTemplate {
                id: cloze.id.clone(),
                sentence: cloze.sentence.clone(),
                context: cloze.context.clone(),
            });
            fills.push(BlankFill {
                template_id: cloze.id.clone(),
                correct_answer: target.native_with_pronunciation(),
                item_id: target.id.clone(),
            });
            for other in vocab.iter().filter(|other| other.id != target.id) {
                options.push(BlankOption {
                    template_id: cloze.id.clone(),
                    label: OptionLabel::from_related(target.shares_cluster(other)),
                    option_value: other.native_with_pronunciation(),
                });
            }
        }

        tracing::debug!(templates = templates.len(), "populated fill-blank schema");
        FillBlankSchema::new(templates, fills, options)
    }

    fn populate_reorder(&self, items: &[KnowledgeItem]) -> ReorderSchema {
        let mut templates = Vec::with_capacity(PATTERNS.len());
        let mut fills = Vec::new();

        for (i, pattern) in PATTERNS.iter().enumerate() {
            let id = format!("reorder_{}", i);
            let grammar_item = pattern
                .grammar
                .filter(|g| items.iter().any(|item| item.id == *g))
                .map(str::to_string);

            templates.push(ReorderTemplate {
                id: id.clone(),
                prompt_template: pattern.english.to_string(),
                chunks: pattern.chunks.iter().map(|c| parse_chunk(c)).collect(),
                slots: pattern.slots.iter().map(|(slot, _)| slot.to_string()).collect(),
                grammar_item,
                verbs: pattern
                    .verbs
                    .iter()
                    .map(|(key, base, third)| VerbForms {
                        key: key.to_string(),
                        base: base.to_string(),
                        third_person: third.to_string(),
                    })
                    .collect(),
            });

            for (slot, category) in pattern.slots {
                for item in vocabulary(items).filter(|item| item.in_category(category)) {
                    fills.push(SlotFill {
                        template_id: id.clone(),
                        slot: slot.to_string(),
                        native: item.native.clone(),
                        gloss: item.primary_translation().to_string(),
                        item_id: item.id.clone(),
                    });
                }
            }
        }

        tracing::debug!(fills = fills.len(), "populated reorder schema");
        ReorderSchema::new(templates, fills)
    }
}
