use std::sync::Arc;

use storage::repository::{KeyValueStore, Storage};
use storage::{CacheKeys, PersistenceCache};

use crate::Clock;
use crate::error::AppServicesError;
use crate::question_bank::QuestionBankService;
use crate::sessions::QuizSessionService;
use crate::source::{QuizSource, SourceLocation};

/// Assembles the question bank and quiz services over one store.
#[derive(Clone)]
pub struct AppServices {
    source: SourceLocation,
    question_bank: Arc<QuestionBankService>,
    quiz: Arc<QuizSessionService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the source location is unusable or
    /// storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        source: &str,
        namespace: &str,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let location = SourceLocation::parse(source)?;
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::assemble(storage.store, location, namespace, clock))
    }

    /// Build services over a throwaway in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the source location is unusable.
    pub fn new_in_memory(
        source: &str,
        namespace: &str,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let location = SourceLocation::parse(source)?;
        Ok(Self::assemble(
            Storage::in_memory().store,
            location,
            namespace,
            clock,
        ))
    }

    fn assemble(
        store: Arc<dyn KeyValueStore>,
        location: SourceLocation,
        namespace: &str,
        clock: Clock,
    ) -> Self {
        let cache = PersistenceCache::with_keys(store, CacheKeys::with_namespace(namespace));
        let source = Arc::new(QuizSource::new(location.clone()));
        Self {
            source: location,
            question_bank: Arc::new(QuestionBankService::new(source, cache.clone())),
            quiz: Arc::new(QuizSessionService::new(clock, cache)),
        }
    }

    #[must_use]
    pub fn source(&self) -> &SourceLocation {
        &self.source
    }

    #[must_use]
    pub fn question_bank(&self) -> Arc<QuestionBankService> {
        Arc::clone(&self.question_bank)
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.quiz)
    }
}
