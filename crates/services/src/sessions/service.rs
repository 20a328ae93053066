use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

use quiz_core::model::{QuestionId, QuestionRecord, QuizState, QuizStats};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── OPTIONS & OUTCOMES ────────────────────────────────────────────────────────
//

/// How a new quiz is laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub shuffle: bool,
    /// Clamped into the question range.
    pub start_index: usize,
}

/// Result of answering the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    pub chosen: usize,
    pub correct: bool,
    pub correct_index: Option<usize>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz over a validated question list.
///
/// Steps through the questions one at a time. Each question takes at most one
/// answer until it is retried.
pub struct QuizSession {
    questions: Vec<QuestionRecord>,
    current: usize,
    score: u32,
    answers: Vec<Option<usize>>,
    started_at: DateTime<Utc>,
    is_completed: bool,
}

impl QuizSession {
    /// Start a quiz, shuffling with the thread-local RNG when asked to.
    ///
    /// `started_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(
        questions: Vec<QuestionRecord>,
        options: SessionOptions,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        Self::new_with_rng(questions, options, started_at, &mut rand::rng())
    }

    /// Same as [`Self::new`] with a caller-provided RNG.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new_with_rng<R: Rng + ?Sized>(
        mut questions: Vec<QuestionRecord>,
        options: SessionOptions,
        started_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        if options.shuffle {
            questions.shuffle(rng);
        }

        let current = options.start_index.min(questions.len() - 1);
        let answers = vec![None; questions.len()];
        Ok(Self {
            questions,
            current,
            score: 0,
            answers,
            started_at,
            is_completed: false,
        })
    }

    /// Restore a session from a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for a snapshot without questions and
    /// `SessionError::State` if the snapshot is inconsistent.
    pub fn resume(state: QuizState) -> Result<Self, SessionError> {
        if state.questions.is_empty() {
            return Err(SessionError::Empty);
        }
        state.check()?;
        Ok(Self {
            questions: state.questions,
            current: state.current_question_index,
            score: state.score,
            answers: state.answers,
            started_at: state.started_at,
            is_completed: state.is_completed,
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    #[must_use]
    pub fn current(&self) -> Option<&QuestionRecord> {
        if self.is_completed {
            None
        } else {
            self.questions.get(self.current)
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Option chosen for the current question, if it has been answered.
    #[must_use]
    pub fn current_answer(&self) -> Option<usize> {
        self.answers.get(self.current).copied().flatten()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|answer| answer.is_some()).count()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.answered_count();
        SessionProgress {
            position: self.current + 1,
            total,
            answered,
            remaining: total - answered,
            is_complete: self.is_completed,
        }
    }

    /// Score summary over every question in the session.
    #[must_use]
    pub fn stats(&self) -> QuizStats {
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        QuizStats::from_score(self.score, total)
    }

    /// Record `option_index` as the answer to the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the quiz is over,
    /// `SessionError::AlreadyAnswered` if the question needs a retry first and
    /// `SessionError::OptionOutOfRange` for an index past the options.
    pub fn answer(&mut self, option_index: usize) -> Result<AnswerOutcome, SessionError> {
        let Some(question) = self.current() else {
            return Err(SessionError::Completed);
        };
        if self.current_answer().is_some() {
            return Err(SessionError::AlreadyAnswered);
        }
        let count = question.options().len();
        if option_index >= count {
            return Err(SessionError::OptionOutOfRange {
                index: option_index,
                count,
            });
        }

        let outcome = AnswerOutcome {
            question_id: question.id(),
            chosen: option_index,
            correct: question.is_correct(option_index),
            correct_index: question.correct_index(),
        };
        self.answers[self.current] = Some(option_index);
        if outcome.correct {
            self.score += 1;
        }
        Ok(outcome)
    }

    /// Clear the answer to the current question so it can be answered again.
    ///
    /// A correct answer that was already scored is taken back off the score.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the quiz is over and
    /// `SessionError::NotAnswered` if there is nothing to retry.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        if self.is_completed {
            return Err(SessionError::Completed);
        }
        let Some(previous) = self.answers[self.current].take() else {
            return Err(SessionError::NotAnswered);
        };
        if self.questions[self.current].is_correct(previous) {
            self.score = self.score.saturating_sub(1);
        }
        Ok(())
    }

    /// Move past an answered question. Returns `true` when the quiz just finished.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the quiz is over and
    /// `SessionError::NotAnswered` if the current question has no answer yet.
    pub fn advance(&mut self) -> Result<bool, SessionError> {
        if self.is_completed {
            return Err(SessionError::Completed);
        }
        if self.current_answer().is_none() {
            return Err(SessionError::NotAnswered);
        }
        if self.current + 1 < self.questions.len() {
            self.current += 1;
        } else {
            self.is_completed = true;
        }
        Ok(self.is_completed)
    }

    /// Persistable copy of the session.
    #[must_use]
    pub fn snapshot(&self) -> QuizState {
        QuizState {
            questions: self.questions.clone(),
            current_question_index: self.current,
            score: self.score,
            answers: self.answers.clone(),
            is_completed: self.is_completed,
            started_at: self.started_at,
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("answered", &self.answered_count())
            .field("started_at", &self.started_at)
            .field("is_completed", &self.is_completed)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuizStateError;
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn question(id: u64) -> QuestionRecord {
        QuestionRecord::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["A".into(), "B".into(), "C".into()],
            "B",
        )
    }

    fn questions(n: u64) -> Vec<QuestionRecord> {
        (1..=n).map(question).collect()
    }

    fn session(n: u64) -> QuizSession {
        QuizSession::new(questions(n), SessionOptions::default(), fixed_now()).unwrap()
    }

    #[test]
    fn empty_session_returns_error() {
        let err = QuizSession::new(Vec::new(), SessionOptions::default(), fixed_now());
        assert_eq!(err.unwrap_err(), SessionError::Empty);
    }

    #[test]
    fn start_index_is_clamped() {
        let options = SessionOptions {
            shuffle: false,
            start_index: 10,
        };
        let session = QuizSession::new(questions(3), options, fixed_now()).unwrap();
        assert_eq!(session.current_index(), 2);
        assert_eq!(session.current().unwrap().id(), QuestionId::new(3));
    }

    #[test]
    fn shuffle_keeps_every_question() {
        let options = SessionOptions {
            shuffle: true,
            start_index: 0,
        };
        let shuffled = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            QuizSession::new_with_rng(questions(20), options, fixed_now(), &mut rng).unwrap()
        };
        let a = shuffled(7);
        let b = shuffled(7);
        assert_eq!(a.questions(), b.questions());

        let mut ids: Vec<u64> = a.questions().iter().map(|q| q.id().value()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn answering_scores_once() {
        let mut session = session(2);

        let outcome = session.answer(1).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.correct_index, Some(1));
        assert_eq!(session.score(), 1);

        assert_eq!(session.answer(1), Err(SessionError::AlreadyAnswered));
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let mut session = session(1);
        assert_eq!(
            session.answer(3),
            Err(SessionError::OptionOutOfRange { index: 3, count: 3 })
        );
        assert_eq!(session.current_answer(), None);
    }

    #[test]
    fn retry_takes_back_a_correct_answer() {
        let mut session = session(1);
        session.answer(1).unwrap();
        session.retry().unwrap();
        assert_eq!(session.score(), 0);
        assert_eq!(session.current_answer(), None);

        session.answer(0).unwrap();
        session.retry().unwrap();
        assert_eq!(session.score(), 0);

        session.answer(1).unwrap();
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn retry_requires_an_answer() {
        let mut session = session(1);
        assert_eq!(session.retry(), Err(SessionError::NotAnswered));
    }

    #[test]
    fn session_advances_and_completes() {
        let mut session = session(2);
        assert_eq!(session.advance(), Err(SessionError::NotAnswered));

        session.answer(1).unwrap();
        assert_eq!(session.advance(), Ok(false));
        assert_eq!(session.current().unwrap().id(), QuestionId::new(2));

        session.answer(0).unwrap();
        assert_eq!(session.advance(), Ok(true));
        assert!(session.is_complete());
        assert!(session.current().is_none());
        assert_eq!(session.answer(0), Err(SessionError::Completed));

        let stats = session.stats();
        assert_eq!(stats.total_questions, 2);
        assert_eq!(stats.correct_answers, 1);
        assert_eq!(stats.incorrect_answers, 1);
        assert_eq!(stats.percentage, 50);
    }

    #[test]
    fn progress_counts_answers() {
        let mut session = session(3);
        session.answer(1).unwrap();
        session.advance().unwrap();

        assert_eq!(
            session.progress(),
            SessionProgress {
                position: 2,
                total: 3,
                answered: 1,
                remaining: 2,
                is_complete: false,
            }
        );
    }

    #[test]
    fn snapshot_resumes_where_it_left_off() {
        let mut session = session(3);
        session.answer(1).unwrap();
        session.advance().unwrap();

        let resumed = QuizSession::resume(session.snapshot()).unwrap();
        assert_eq!(resumed.current_index(), 1);
        assert_eq!(resumed.score(), 1);
        assert_eq!(resumed.answered_count(), 1);
        assert_eq!(resumed.started_at(), fixed_now());
    }

    #[test]
    fn inconsistent_snapshot_is_rejected() {
        let mut state = session(2).snapshot();
        state.answers.pop();
        assert_eq!(
            QuizSession::resume(state).unwrap_err(),
            SessionError::State(QuizStateError::AnswerCountMismatch {
                answers: 1,
                questions: 2
            })
        );
    }

    #[test]
    fn snapshot_with_invalid_question_is_rejected() {
        let mut state = session(2).snapshot();
        state.questions[0] = QuestionRecord::new(QuestionId::new(0), "", vec![], "Z");
        assert!(matches!(
            QuizSession::resume(state).unwrap_err(),
            SessionError::State(QuizStateError::InvalidQuestion { position: 0, .. })
        ));
    }
}
