//! Per-session bundle of generators with family fallback.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::ExercisesConfig;
use crate::core::{ItemKind, KnowledgeItem};

use super::exercise::{Exercise, ExerciseFamily};
use super::generator::{FillBlankGenerator, MultipleChoiceGenerator, ReorderGenerator};
use super::handler::ReorderPresentation;
use super::populator::SchemaPopulator;

/// The three generators built once per session.
///
/// A request names a preferred family; when that family cannot produce an
/// exercise the remaining families are tried in turn before giving up.
#[derive(Debug, Clone)]
pub struct ExerciseDeck {
    multiple_choice: MultipleChoiceGenerator,
    fill_blank: FillBlankGenerator,
    reorder: ReorderGenerator,
    rng: StdRng,
}

impl ExerciseDeck {
    /// Populate every schema from `items` and build the generators.
    pub fn new(populator: &dyn SchemaPopulator, items: &[KnowledgeItem], config: &ExercisesConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            multiple_choice: MultipleChoiceGenerator::new(
                populator.populate_multiple_choice(items),
                config.multiple_choice,
            ),
            fill_blank: FillBlankGenerator::new(
                populator.populate_fill_blank(items),
                config.fill_blank,
            ),
            reorder: ReorderGenerator::new(populator.populate_reorder(items)),
            rng,
        }
    }

    /// Generate from exactly one family.
    pub fn generate_family(&mut self, family: ExerciseFamily, target: Option<&str>) -> Option<Exercise> {
        match family {
            ExerciseFamily::MultipleChoice => self.multiple_choice.generate(target, None, &mut self.rng),
            ExerciseFamily::FillBlank => self.fill_blank.generate(target, &mut self.rng),
            ExerciseFamily::Reorder => self.reorder.generate(target, &mut self.rng),
        }
    }

    /// Generate from `family`, falling back through the other families.
    pub fn generate(&mut self, family: ExerciseFamily, target: Option<&str>) -> Option<Exercise> {
        let order = std::iter::once(family)
            .chain(ExerciseFamily::ALL.into_iter().filter(|f| *f != family));
        for candidate in order {
            if let Some(exercise) = self.generate_family(candidate, target) {
                if candidate != family {
                    tracing::debug!(requested = %family, used = %candidate, "fell back to another family");
                }
                return Some(exercise);
            }
        }
        tracing::debug!(target = ?target, "no exercise family could produce an exercise");
        None
    }

    /// Generate for `item`, choosing the family when none is requested.
    ///
    /// Grammar items start with reorder; vocabulary items start with a
    /// random family.
    pub fn generate_for(&mut self, item: &KnowledgeItem, family: Option<ExerciseFamily>) -> Option<Exercise> {
        let family = match (family, item.kind) {
            (Some(family), _) => family,
            (None, ItemKind::Grammar) => ExerciseFamily::Reorder,
            (None, ItemKind::Vocabulary) => *ExerciseFamily::ALL
                .choose(&mut self.rng)
                .unwrap_or(&ExerciseFamily::MultipleChoice),
        };
        self.generate(family, Some(&item.id))
    }

    /// Shuffled display order for a reorder exercise with `len` chunks.
    pub fn present_reorder(&mut self, len: usize) -> ReorderPresentation {
        ReorderPresentation::shuffled(len, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClozeTemplate;
    use crate::exercises::exercise::ExerciseBody;
    use crate::exercises::populator::ChinesePopulator;
    use crate::fixtures::{curriculum, pronouns};

    fn seeded() -> ExercisesConfig {
        ExercisesConfig {
            seed: Some(42),
            ..ExercisesConfig::default()
        }
    }

    #[test]
    fn test_falls_back_when_family_has_no_content() {
        let mut deck = ExerciseDeck::new(&ChinesePopulator::default(), &curriculum(), &seeded());

        // No cloze templates: fill blank falls back
        let exercise = deck.generate(ExerciseFamily::FillBlank, Some("v001")).unwrap();
        assert_ne!(exercise.family(), ExerciseFamily::FillBlank);
        assert!(exercise.source_ids.contains(&"v001".to_string()));
    }

    #[test]
    fn test_nothing_possible_with_two_items() {
        let items: Vec<_> = pronouns().into_iter().take(2).collect();
        let mut deck = ExerciseDeck::new(&ChinesePopulator::default(), &items, &seeded());
        for family in ExerciseFamily::ALL {
            assert!(deck.generate(family, Some("v001")).is_none());
        }
    }

    #[test]
    fn test_grammar_items_get_reorder() {
        let items = curriculum();
        let mut deck = ExerciseDeck::new(&ChinesePopulator::default(), &items, &seeded());
        let g001 = items.iter().find(|i| i.id == "g001").unwrap();

        let exercise = deck.generate_for(g001, None).unwrap();
        assert!(matches!(exercise.body, ExerciseBody::Reorder(_)));
        assert!(exercise.source_ids.contains(&"g001".to_string()));
    }

    #[test]
    fn test_requested_family_is_used_when_possible() {
        let populator = ChinesePopulator::new(
            Vec::new(),
            vec![ClozeTemplate {
                id: "c001".into(),
                sentence: "_____是学生。".into(),
                context: "_____ is a student.".into(),
                target_id: "v001".into(),
                tags: Vec::new(),
            }],
        );
        let items = curriculum();
        let mut deck = ExerciseDeck::new(&populator, &items, &seeded());
        let v001 = items.iter().find(|i| i.id == "v001").unwrap();

        for family in ExerciseFamily::ALL {
            let exercise = deck.generate_for(v001, Some(family)).unwrap();
            assert_eq!(exercise.family(), family);
        }
    }

    #[test]
    fn test_seeded_decks_agree() {
        let items = curriculum();
        let mut a = ExerciseDeck::new(&ChinesePopulator::default(), &items, &seeded());
        let mut b = ExerciseDeck::new(&ChinesePopulator::default(), &items, &seeded());

        let ea = a.generate(ExerciseFamily::MultipleChoice, None).unwrap();
        let eb = b.generate(ExerciseFamily::MultipleChoice, None).unwrap();
        assert_eq!(ea.body, eb.body);
    }
}
