use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::QuestionRecord;
use crate::validation::{QuestionValidationError, validate_question};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizStateError {
    #[error("answers ({answers}) do not match question count ({questions})")]
    AnswerCountMismatch { answers: usize, questions: usize },

    #[error("current index {index} is out of range for {questions} questions")]
    IndexOutOfRange { index: usize, questions: usize },

    #[error("score ({score}) exceeds answered questions ({answered})")]
    ScoreExceedsAnswers { score: u32, answered: usize },

    #[error("question {position} is invalid: {reason}")]
    InvalidQuestion {
        position: usize,
        reason: QuestionValidationError,
    },
}

/// Resumable snapshot of an in-progress quiz.
///
/// `answers[i]` holds the option index chosen for `questions[i]`, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizState {
    pub questions: Vec<QuestionRecord>,
    pub current_question_index: usize,
    pub score: u32,
    pub answers: Vec<Option<usize>>,
    pub is_completed: bool,
    pub started_at: DateTime<Utc>,
}

impl QuizState {
    /// Check that a persisted state is internally consistent before resuming it.
    ///
    /// # Errors
    ///
    /// Returns `QuizStateError` if a question fails validation, or if answers,
    /// index or score disagree with the question list.
    pub fn check(&self) -> Result<(), QuizStateError> {
        for (position, question) in self.questions.iter().enumerate() {
            validate_question(question)
                .map_err(|reason| QuizStateError::InvalidQuestion { position, reason })?;
        }
        let questions = self.questions.len();
        if self.answers.len() != questions {
            return Err(QuizStateError::AnswerCountMismatch {
                answers: self.answers.len(),
                questions,
            });
        }
        if questions > 0 && self.current_question_index >= questions {
            return Err(QuizStateError::IndexOutOfRange {
                index: self.current_question_index,
                questions,
            });
        }
        let answered = self.answers.iter().filter(|a| a.is_some()).count();
        if usize::try_from(self.score).unwrap_or(usize::MAX) > answered {
            return Err(QuizStateError::ScoreExceedsAnswers {
                score: self.score,
                answered,
            });
        }
        Ok(())
    }
}

/// Score summary for a finished (or abandoned) quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStats {
    pub total_questions: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub percentage: u32,
}

impl QuizStats {
    /// Everything not scored correct counts as incorrect, unanswered included.
    #[must_use]
    pub fn from_score(score: u32, total_questions: u32) -> Self {
        let correct_answers = score.min(total_questions);
        let percentage = if total_questions == 0 {
            0
        } else {
            let ratio = f64::from(correct_answers) / f64::from(total_questions);
            // Bounded to 0..=100 by construction.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let pct = (ratio * 100.0).round() as u32;
            pct
        };
        Self {
            total_questions,
            correct_answers,
            incorrect_answers: total_questions - correct_answers,
            percentage,
        }
    }
}
