use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info, warn};

use quiz_core::ingest::DatasetParser;
use quiz_core::model::{QuestionId, QuestionRecord};
use quiz_core::stats::{DatasetStats, dataset_stats};
use quiz_core::validation::{ValidationResult, validate_questions};
use storage::PersistenceCache;

use crate::error::LoadError;
use crate::source::TextSource;

/// Where the questions of a load came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Cache,
    Source,
}

/// Result of a successful load: the validated questions and how they got here.
#[derive(Debug, Clone)]
pub struct LoadedBank {
    pub questions: Vec<QuestionRecord>,
    pub origin: LoadOrigin,
    pub validation: ValidationResult,
    pub stats: DatasetStats,
}

/// Loads the question bank (cache first, then source) and owns known flags.
#[derive(Clone)]
pub struct QuestionBankService {
    source: Arc<dyn TextSource>,
    cache: PersistenceCache,
    parser: DatasetParser,
}

impl QuestionBankService {
    #[must_use]
    pub fn new(source: Arc<dyn TextSource>, cache: PersistenceCache) -> Self {
        Self {
            source,
            cache,
            parser: DatasetParser::default(),
        }
    }

    #[must_use]
    pub fn with_parser(mut self, parser: DatasetParser) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn cache(&self) -> &PersistenceCache {
        &self.cache
    }

    /// Load the validated question list, or an empty list when nothing usable
    /// could be loaded.
    pub async fn load(&self) -> Vec<QuestionRecord> {
        match self.try_load().await {
            Ok(bank) => bank.questions,
            Err(err) => {
                error!(%err, "failed to load questions");
                Vec::new()
            }
        }
    }

    /// Load the question bank, preferring the cached snapshot.
    ///
    /// A fresh parse is written back to the cache once it validates. Any
    /// failure clears cached quiz data so the next attempt starts from the
    /// source again.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Fetch` if the source cannot be read and
    /// `LoadError::NoValidQuestions` if nothing survives validation.
    pub async fn try_load(&self) -> Result<LoadedBank, LoadError> {
        let result = self.load_inner().await;
        if result.is_err() {
            self.cache.clear_all().await;
        }
        result
    }

    /// Drop the cached snapshot and reload from the source. Known flags are kept.
    ///
    /// # Errors
    ///
    /// Same as [`Self::try_load`].
    pub async fn refresh(&self) -> Result<LoadedBank, LoadError> {
        self.cache.clear_all().await;
        self.try_load().await
    }

    async fn load_inner(&self) -> Result<LoadedBank, LoadError> {
        let cached = if self.cache.has_dataset().await {
            let snapshot = self.cache.load_dataset().await;
            if snapshot.is_none() {
                warn!("cached question snapshot is unreadable; reloading from source");
            }
            snapshot
        } else {
            None
        };

        let (candidates, origin) = match cached {
            Some(records) => (records, LoadOrigin::Cache),
            None => {
                let text = self.source.fetch_text().await?;
                (self.parser.parse(&text), LoadOrigin::Source)
            }
        };

        let validation = validate_questions(&candidates);
        if validation.valid_questions.is_empty() {
            return Err(LoadError::NoValidQuestions {
                errors: validation.errors,
            });
        }

        let questions = validation.valid_questions.clone();
        if origin == LoadOrigin::Source {
            self.cache.save_dataset(&questions).await;
        }

        let stats = dataset_stats(&questions);
        info!(
            count = questions.len(),
            ?origin,
            average_options = stats.average_options_count,
            "question bank ready"
        );

        Ok(LoadedBank {
            questions,
            origin,
            validation,
            stats,
        })
    }

    //
    // ─── KNOWN FLAGS ──────────────────────────────────────────────────────────
    //

    pub async fn is_known(&self, id: QuestionId) -> bool {
        self.cache.get_question_known(id).await
    }

    pub async fn set_known(&self, id: QuestionId, known: bool) {
        self.cache.set_question_known(id, known).await;
    }

    /// Flip the flag and return the new value.
    pub async fn toggle_known(&self, id: QuestionId) -> bool {
        let known = !self.cache.get_question_known(id).await;
        self.cache.set_question_known(id, known).await;
        known
    }

    /// Ids among `questions` currently flagged as known.
    pub async fn known_ids(&self, questions: &[QuestionRecord]) -> HashSet<QuestionId> {
        let mut known = HashSet::new();
        for question in questions {
            if self.cache.get_question_known(question.id()).await {
                known.insert(question.id());
            }
        }
        known
    }

    pub async fn known_count(&self, questions: &[QuestionRecord]) -> usize {
        self.cache
            .known_count(questions.iter().map(QuestionRecord::id))
            .await
    }
}
