//! Pool flattening: turning heterogeneous source questions into a flat,
//! ordered sequence of independently answerable units.

use serde::{Deserialize, Serialize};

use crate::model::{
    ChoiceLetter, ChoiceTexts, ClassificationId, ExamId, PoolQuestion, QuestionContent,
    QuestionId, Subpart,
};

//
// ─── FLATTENED ITEM ────────────────────────────────────────────────────────────
//

/// One answerable unit of a built session.
///
/// Derived exactly once, at session build time, and immutable thereafter.
/// A simple question yields one item; a composite question of weight *w*
/// yields *w* items that share its `question_id`. The position in the built
/// sequence is the item's address for the answer lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedItem {
    question_id: QuestionId,
    exam_id: ExamId,
    year: u16,
    classification_id: ClassificationId,
    subpart_number: Option<u32>,
    stem: String,
    passage: Option<String>,
    parent_context: Option<String>,
    options: ChoiceTexts,
    correct: Option<ChoiceLetter>,
}

impl FlattenedItem {
    fn from_simple(content: &QuestionContent) -> Self {
        Self {
            question_id: content.id(),
            exam_id: content.exam_id(),
            year: content.year(),
            classification_id: content.classification_id(),
            subpart_number: None,
            stem: content.stem().to_owned(),
            passage: content.passage().map(str::to_owned),
            parent_context: None,
            options: content.options().clone(),
            correct: content.correct(),
        }
    }

    fn from_subpart(content: &QuestionContent, subpart: &Subpart) -> Self {
        // A subpart with its own embedded passage must not receive the
        // parent's as context, or the passage would render twice.
        let parent_context = if subpart.passage().is_none() {
            content.passage().map(str::to_owned)
        } else {
            None
        };

        Self {
            question_id: content.id(),
            exam_id: content.exam_id(),
            year: content.year(),
            classification_id: content.classification_id(),
            subpart_number: Some(subpart.number()),
            stem: subpart
                .stem()
                .unwrap_or_else(|| content.stem())
                .to_owned(),
            passage: subpart.passage().map(str::to_owned),
            parent_context,
            options: subpart
                .options()
                .unwrap_or_else(|| content.options())
                .clone(),
            correct: subpart.correct(),
        }
    }

    /// The string key this item is addressed by in remote grading results:
    /// `"<backingId>-<subpartNumber>"` for subparts, `"<backingId>"`
    /// otherwise.
    #[must_use]
    pub fn composite_key(&self) -> String {
        match self.subpart_number {
            Some(number) => format!("{}-{}", self.question_id, number),
            None => self.question_id.to_string(),
        }
    }

    // Accessors
    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    #[must_use]
    pub fn year(&self) -> u16 {
        self.year
    }

    #[must_use]
    pub fn classification_id(&self) -> ClassificationId {
        self.classification_id
    }

    #[must_use]
    pub fn subpart_number(&self) -> Option<u32> {
        self.subpart_number
    }

    #[must_use]
    pub fn is_subpart(&self) -> bool {
        self.subpart_number.is_some()
    }

    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    #[must_use]
    pub fn passage(&self) -> Option<&str> {
        self.passage.as_deref()
    }

    #[must_use]
    pub fn parent_context(&self) -> Option<&str> {
        self.parent_context.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> &ChoiceTexts {
        &self.options
    }

    #[must_use]
    pub fn correct(&self) -> Option<ChoiceLetter> {
        self.correct
    }
}

//
// ─── FLATTENING ────────────────────────────────────────────────────────────────
//

/// Flattens source questions into answerable units, preserving input order.
///
/// Simple questions emit one item. Composite questions emit one item per
/// subpart, in record order, with subpart fields overriding the parent's
/// stem and options and the parent passage attached as context only when
/// the subpart has none of its own. An empty pool is a valid, empty result.
#[must_use]
pub fn flatten_pool(questions: &[PoolQuestion]) -> Vec<FlattenedItem> {
    let mut items = Vec::new();
    for question in questions {
        match question {
            PoolQuestion::Simple(content) => items.push(FlattenedItem::from_simple(content)),
            PoolQuestion::Composite { content, subparts } => {
                for subpart in subparts {
                    items.push(FlattenedItem::from_subpart(content, subpart));
                }
            }
        }
    }
    items
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn build_options() -> ChoiceTexts {
        ChoiceTexts::new("a", "b", "c", "d")
    }

    fn build_content(id: u64) -> QuestionContent {
        QuestionContent::new(
            QuestionId::new(id),
            ExamId::new(1),
            2021,
            ClassificationId::new(3),
            "parent stem",
            build_options(),
        )
        .unwrap()
    }

    #[test]
    fn empty_pool_flattens_to_nothing() {
        assert!(flatten_pool(&[]).is_empty());
    }

    #[test]
    fn simple_question_yields_one_item() {
        let question = PoolQuestion::simple(build_content(7).with_correct(ChoiceLetter::B));
        let items = flatten_pool(&[question]);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question_id(), QuestionId::new(7));
        assert_eq!(items[0].subpart_number(), None);
        assert_eq!(items[0].correct(), Some(ChoiceLetter::B));
        assert_eq!(items[0].parent_context(), None);
    }

    #[test]
    fn composite_yields_one_item_per_subpart_in_order() {
        let question = PoolQuestion::composite(
            build_content(105),
            vec![
                Subpart::new(1).unwrap(),
                Subpart::new(2).unwrap(),
                Subpart::new(3).unwrap(),
            ],
        )
        .unwrap();

        let items = flatten_pool(&[question]);
        assert_eq!(items.len(), 3);
        let numbers: Vec<_> = items.iter().map(FlattenedItem::subpart_number).collect();
        assert_eq!(numbers, [Some(1), Some(2), Some(3)]);
        assert!(items.iter().all(|i| i.question_id() == QuestionId::new(105)));
    }

    #[test]
    fn subparts_inherit_parent_stem_and_options() {
        let question = PoolQuestion::composite(
            build_content(1),
            vec![Subpart::new(1).unwrap()],
        )
        .unwrap();

        let items = flatten_pool(&[question]);
        assert_eq!(items[0].stem(), "parent stem");
        assert_eq!(items[0].options(), &build_options());
    }

    #[test]
    fn subpart_overrides_win_over_parent_defaults() {
        let own_options = ChoiceTexts::new("w", "x", "y", "z");
        let question = PoolQuestion::composite(
            build_content(1),
            vec![
                Subpart::new(1)
                    .unwrap()
                    .with_stem("own stem")
                    .with_options(own_options.clone())
                    .with_correct(ChoiceLetter::D),
            ],
        )
        .unwrap();

        let items = flatten_pool(&[question]);
        assert_eq!(items[0].stem(), "own stem");
        assert_eq!(items[0].options(), &own_options);
        assert_eq!(items[0].correct(), Some(ChoiceLetter::D));
    }

    #[test]
    fn parent_correct_marker_does_not_bleed_into_subparts() {
        let question = PoolQuestion::composite(
            build_content(1).with_correct(ChoiceLetter::A),
            vec![Subpart::new(1).unwrap()],
        )
        .unwrap();

        let items = flatten_pool(&[question]);
        assert_eq!(items[0].correct(), None);
    }

    #[test]
    fn parent_context_attaches_only_without_own_passage() {
        let question = PoolQuestion::composite(
            build_content(1).with_passage("shared reading"),
            vec![
                Subpart::new(1).unwrap(),
                Subpart::new(2).unwrap().with_passage("embedded copy"),
            ],
        )
        .unwrap();

        let items = flatten_pool(&[question]);
        assert_eq!(items[0].parent_context(), Some("shared reading"));
        assert_eq!(items[0].passage(), None);
        assert_eq!(items[1].parent_context(), None);
        assert_eq!(items[1].passage(), Some("embedded copy"));
    }

    #[test]
    fn no_parent_context_when_parent_has_no_passage() {
        let question = PoolQuestion::composite(
            build_content(1),
            vec![Subpart::new(1).unwrap()],
        )
        .unwrap();

        let items = flatten_pool(&[question]);
        assert_eq!(items[0].parent_context(), None);
    }

    #[test]
    fn emission_order_matches_input_order() {
        let pool = vec![
            PoolQuestion::simple(build_content(10)),
            PoolQuestion::composite(
                build_content(11),
                vec![Subpart::new(1).unwrap(), Subpart::new(2).unwrap()],
            )
            .unwrap(),
            PoolQuestion::simple(build_content(12)),
        ];

        let keys: Vec<_> = flatten_pool(&pool)
            .iter()
            .map(FlattenedItem::composite_key)
            .collect();
        assert_eq!(keys, ["10", "11-1", "11-2", "12"]);
    }

    #[test]
    fn composite_key_suffixes_subparts_only() {
        let pool = vec![
            PoolQuestion::simple(build_content(105)),
            PoolQuestion::composite(build_content(105), vec![Subpart::new(1).unwrap()]).unwrap(),
        ];

        let items = flatten_pool(&pool);
        assert_eq!(items[0].composite_key(), "105");
        assert_eq!(items[1].composite_key(), "105-1");
    }
}
