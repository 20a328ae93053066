use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

//
// ─── QUESTION RECORD ───────────────────────────────────────────────────────────
//

/// A multiple-choice question as parsed from the source table.
///
/// Records are never mutated once built. The correct answer is kept as the
/// literal option text; the index into `options` is re-derived on demand by
/// value so a record loaded from the cache behaves exactly like a fresh one.
///
/// Construction does not check invariants. Records come either from the row
/// builder in [`crate::ingest`] or from a persisted snapshot, and both paths are
/// expected to go through [`crate::validation::validate_questions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    id: QuestionId,
    #[serde(rename = "question")]
    text: String,
    options: Vec<String>,
    correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

impl QuestionRecord {
    #[must_use]
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            options,
            correct_answer: correct_answer.into(),
            category: None,
            explanation: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Position of the correct answer in `options`, first match wins.
    #[must_use]
    pub fn correct_index(&self) -> Option<usize> {
        self.options
            .iter()
            .position(|option| *option == self.correct_answer)
    }

    /// Returns true when `option_index` points at the correct answer.
    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        self.correct_index() == Some(option_index)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn correct_index_is_looked_up_by_value() {
        let q = QuestionRecord::new(QuestionId::new(1), "Q", opts(&["A", "B", "C"]), "C");
        assert_eq!(q.correct_index(), Some(2));
        assert!(q.is_correct(2));
        assert!(!q.is_correct(0));
    }

    #[test]
    fn duplicate_options_resolve_to_first_match() {
        let q = QuestionRecord::new(QuestionId::new(1), "Q", opts(&["X", "Y", "X"]), "X");
        assert_eq!(q.correct_index(), Some(0));
        assert!(!q.is_correct(2));
    }

    #[test]
    fn missing_answer_has_no_index() {
        let q = QuestionRecord::new(QuestionId::new(1), "Q", opts(&["A", "B"]), "Z");
        assert_eq!(q.correct_index(), None);
    }

    #[test]
    fn serialized_layout_uses_question_and_camel_case_keys() {
        let q = QuestionRecord::new(QuestionId::new(5), "Capital?", opts(&["Paris", "Rome"]), "Paris")
            .with_category("Geography");
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["id"], 5);
        assert_eq!(value["question"], "Capital?");
        assert_eq!(value["correctAnswer"], "Paris");
        assert_eq!(value["category"], "Geography");
        assert!(value.get("explanation").is_none());
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let json = r#"{"id":2,"question":"Q","options":["A","B"],"correctAnswer":"B"}"#;
        let q: QuestionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(q.id(), QuestionId::new(2));
        assert_eq!(q.category(), None);
        assert_eq!(q.explanation(), None);
        assert_eq!(q.correct_index(), Some(1));
    }
}
