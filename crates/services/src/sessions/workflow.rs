use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::model::{QuestionRecord, QuizStats};
use storage::PersistenceCache;

use super::service::{AnswerOutcome, QuizSession, SessionOptions};
use crate::error::SessionError;

/// Result of moving past a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    pub is_complete: bool,
    /// Final stats, present once the quiz is complete.
    pub stats: Option<QuizStats>,
}

/// Drives a `QuizSession` and keeps the cache in step with it.
///
/// Session state is written after every change. Correct answers flag their
/// question as known, and finishing a quiz stores its stats and drops the
/// saved state.
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    cache: PersistenceCache,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(clock: Clock, cache: PersistenceCache) -> Self {
        Self { clock, cache }
    }

    /// Start a fresh quiz over `questions`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if there are no questions.
    pub async fn start(
        &self,
        questions: Vec<QuestionRecord>,
        options: SessionOptions,
    ) -> Result<QuizSession, SessionError> {
        let session = QuizSession::new(questions, options, self.clock.now())?;
        info!(
            total = session.questions().len(),
            start = session.current_index(),
            shuffle = options.shuffle,
            "quiz started"
        );
        self.cache.save_state(&session.snapshot()).await;
        Ok(session)
    }

    /// Pick up the saved quiz, if there is an unfinished one.
    ///
    /// Saved state that no longer checks out is dropped.
    pub async fn resume(&self) -> Option<QuizSession> {
        let state = self.cache.load_state().await?;
        match QuizSession::resume(state) {
            Ok(session) if !session.is_complete() => {
                debug!(index = session.current_index(), "resuming saved quiz");
                Some(session)
            }
            Ok(_) => {
                self.cache.clear_state().await;
                None
            }
            Err(err) => {
                warn!(%err, "discarding saved quiz state");
                self.cache.clear_state().await;
                None
            }
        }
    }

    /// Answer the current question.
    ///
    /// # Errors
    ///
    /// Propagates `SessionError` from [`QuizSession::answer`].
    pub async fn answer(
        &self,
        session: &mut QuizSession,
        option_index: usize,
    ) -> Result<AnswerOutcome, SessionError> {
        let outcome = session.answer(option_index)?;
        if outcome.correct {
            self.cache.set_question_known(outcome.question_id, true).await;
        }
        self.cache.save_state(&session.snapshot()).await;
        Ok(outcome)
    }

    /// Clear the current answer so the question can be tried again.
    ///
    /// # Errors
    ///
    /// Propagates `SessionError` from [`QuizSession::retry`].
    pub async fn retry(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        session.retry()?;
        self.cache.save_state(&session.snapshot()).await;
        Ok(())
    }

    /// Move to the next question, finishing the quiz after the last one.
    ///
    /// # Errors
    ///
    /// Propagates `SessionError` from [`QuizSession::advance`].
    pub async fn advance(&self, session: &mut QuizSession) -> Result<StepResult, SessionError> {
        if !session.advance()? {
            self.cache.save_state(&session.snapshot()).await;
            return Ok(StepResult {
                is_complete: false,
                stats: None,
            });
        }

        let stats = session.stats();
        info!(
            correct = stats.correct_answers,
            total = stats.total_questions,
            percentage = stats.percentage,
            "quiz complete"
        );
        self.cache.save_stats(&stats).await;
        self.cache.clear_state().await;
        Ok(StepResult {
            is_complete: true,
            stats: Some(stats),
        })
    }

    /// Stats of the last finished quiz.
    pub async fn last_stats(&self) -> Option<QuizStats> {
        self.cache.load_stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionId, QuizState};
    use quiz_core::time::{fixed_clock, fixed_now};
    use std::sync::Arc;
    use storage::repository::{InMemoryStore, KeyValueStore};

    fn question(id: u64) -> QuestionRecord {
        QuestionRecord::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["A".into(), "B".into()],
            "A",
        )
    }

    fn service(store: &InMemoryStore) -> QuizSessionService {
        QuizSessionService::new(fixed_clock(), PersistenceCache::new(Arc::new(store.clone())))
    }

    #[tokio::test]
    async fn correct_answer_marks_question_known() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let mut session = svc
            .start(vec![question(5), question(6)], SessionOptions::default())
            .await
            .unwrap();
        assert_eq!(session.started_at(), fixed_now());

        svc.answer(&mut session, 0).await.unwrap();
        assert_eq!(
            store.get("question_5_known").await.unwrap().as_deref(),
            Some("true")
        );

        svc.advance(&mut session).await.unwrap();
        svc.answer(&mut session, 1).await.unwrap();
        assert!(!store.contains("question_6_known").await.unwrap());
    }

    #[tokio::test]
    async fn state_is_saved_and_resumed() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let mut session = svc
            .start(vec![question(1), question(2)], SessionOptions::default())
            .await
            .unwrap();
        svc.answer(&mut session, 0).await.unwrap();
        svc.advance(&mut session).await.unwrap();

        let resumed = svc.resume().await.unwrap();
        assert_eq!(resumed.current_index(), 1);
        assert_eq!(resumed.score(), 1);
    }

    #[tokio::test]
    async fn completion_saves_stats_and_clears_state() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let mut session = svc
            .start(vec![question(1)], SessionOptions::default())
            .await
            .unwrap();
        svc.answer(&mut session, 1).await.unwrap();
        svc.retry(&mut session).await.unwrap();
        svc.answer(&mut session, 0).await.unwrap();

        let step = svc.advance(&mut session).await.unwrap();
        assert!(step.is_complete);
        let stats = step.stats.unwrap();
        assert_eq!(stats.correct_answers, 1);
        assert_eq!(stats.percentage, 100);

        assert_eq!(svc.last_stats().await, Some(stats));
        assert!(!store.contains("quiz_state").await.unwrap());
        assert!(svc.resume().await.is_none());
    }

    #[tokio::test]
    async fn inconsistent_state_is_discarded() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let state = QuizState {
            questions: vec![question(1)],
            current_question_index: 0,
            score: 1,
            answers: vec![None],
            is_completed: false,
            started_at: fixed_now(),
        };
        PersistenceCache::new(Arc::new(store.clone()))
            .save_state(&state)
            .await;
        assert!(store.contains("quiz_state").await.unwrap());

        assert!(svc.resume().await.is_none());
        assert!(!store.contains("quiz_state").await.unwrap());
    }

    #[tokio::test]
    async fn invalid_cached_question_is_discarded() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let state = QuizState {
            questions: vec![QuestionRecord::new(QuestionId::new(0), "", vec![], "Z")],
            current_question_index: 0,
            score: 0,
            answers: vec![None],
            is_completed: false,
            started_at: fixed_now(),
        };
        PersistenceCache::new(Arc::new(store.clone()))
            .save_state(&state)
            .await;
        assert!(store.contains("quiz_state").await.unwrap());

        assert!(svc.resume().await.is_none());
        assert!(!store.contains("quiz_state").await.unwrap());
    }
}
