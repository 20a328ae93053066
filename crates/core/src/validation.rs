//! Structural checks for question records.
//!
//! The row builder already enforces most of these rules, but records loaded
//! from a persisted snapshot never went through it, so every load path runs
//! the full check again.

use thiserror::Error;
use tracing::{debug, info};

use crate::model::QuestionRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionValidationError {
    #[error("missing id")]
    MissingId,

    #[error("question text is empty")]
    EmptyText,

    #[error("only {count} options, need at least 2")]
    TooFewOptions { count: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("correct answer {answer:?} is not one of the options")]
    AnswerNotInOptions { answer: String },
}

/// Check one record, reporting the first rule it breaks.
///
/// # Errors
///
/// Returns `QuestionValidationError` for the first violated invariant.
pub fn validate_question(question: &QuestionRecord) -> Result<(), QuestionValidationError> {
    if !question.id().is_assigned() {
        return Err(QuestionValidationError::MissingId);
    }
    if question.text().trim().is_empty() {
        return Err(QuestionValidationError::EmptyText);
    }
    let options = question.options();
    if options.len() < 2 {
        return Err(QuestionValidationError::TooFewOptions {
            count: options.len(),
        });
    }
    if let Some(index) = options.iter().position(|option| option.trim().is_empty()) {
        return Err(QuestionValidationError::EmptyOption { index });
    }
    if question.correct_index().is_none() {
        return Err(QuestionValidationError::AnswerNotInOptions {
            answer: question.correct_answer().to_string(),
        });
    }
    Ok(())
}

/// Partition of a record sequence into accepted records and rejected positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid_questions: Vec<QuestionRecord>,
    /// 0-based positions in the validated input.
    pub invalid_questions: Vec<usize>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// True when there was at least one record and none were rejected.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.invalid_questions.is_empty() && !self.valid_questions.is_empty()
    }
}

/// Validate every record, keeping the valid ones in order.
#[must_use]
pub fn validate_questions(questions: &[QuestionRecord]) -> ValidationResult {
    if questions.is_empty() {
        return ValidationResult {
            errors: vec!["No questions provided".to_string()],
            ..ValidationResult::default()
        };
    }

    let mut result = ValidationResult::default();
    for (position, question) in questions.iter().enumerate() {
        match validate_question(question) {
            Ok(()) => result.valid_questions.push(question.clone()),
            Err(err) => {
                debug!(position, id = %question.id(), %err, "question failed validation");
                result.invalid_questions.push(position);
                result
                    .errors
                    .push(format!("Question {} is invalid: {err}", position + 1));
            }
        }
    }

    info!(
        total = questions.len(),
        valid = result.valid_questions.len(),
        invalid = result.invalid_questions.len(),
        "validated questions"
    );
    result
}
