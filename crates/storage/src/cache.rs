//! Local cache of the question bank and of per-question progress.
//!
//! Every failure is caught here: reads fall back to "absent" and writes are
//! dropped, both with a warning in the log. Callers never see a
//! `StorageError` from this module.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use quiz_core::model::{QuestionId, QuestionRecord, QuizState, QuizStats};

use crate::repository::KeyValueStore;

const DEFAULT_NAMESPACE: &str = "quiz";
const KNOWN_TRUE: &str = "true";
const KNOWN_FALSE: &str = "false";

/// Fixed keys of the cache.
///
/// Known flags live under `question_{id}_known` regardless of the namespace so
/// they outlive any dataset refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    pub dataset: String,
    pub state: String,
    pub stats: String,
}

impl CacheKeys {
    #[must_use]
    pub fn with_namespace(namespace: &str) -> Self {
        Self {
            dataset: format!("{namespace}_data"),
            state: format!("{namespace}_state"),
            stats: format!("{namespace}_stats"),
        }
    }

    #[must_use]
    pub fn known_flag(id: QuestionId) -> String {
        format!("question_{id}_known")
    }
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }
}

#[derive(Clone)]
pub struct PersistenceCache {
    store: Arc<dyn KeyValueStore>,
    keys: CacheKeys,
}

impl PersistenceCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_keys(store, CacheKeys::default())
    }

    #[must_use]
    pub fn with_keys(store: Arc<dyn KeyValueStore>, keys: CacheKeys) -> Self {
        Self { store, keys }
    }

    #[must_use]
    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    //
    // ─── DATASET SNAPSHOT ─────────────────────────────────────────────────────
    //

    /// Overwrite the stored snapshot with `records`.
    pub async fn save_dataset(&self, records: &[QuestionRecord]) {
        if self.write_json(&self.keys.dataset, &records).await {
            debug!(count = records.len(), "saved question snapshot");
        }
    }

    /// Returns `None` when no snapshot exists or it cannot be decoded.
    pub async fn load_dataset(&self) -> Option<Vec<QuestionRecord>> {
        let records: Vec<QuestionRecord> = self.read_json(&self.keys.dataset).await?;
        debug!(count = records.len(), "loaded question snapshot");
        Some(records)
    }

    /// Existence check that does not decode the snapshot.
    pub async fn has_dataset(&self) -> bool {
        match self.store.contains(&self.keys.dataset).await {
            Ok(found) => found,
            Err(err) => {
                warn!(%err, "failed to check for question snapshot");
                false
            }
        }
    }

    /// Drop the snapshot together with session state and stats. Known flags stay.
    pub async fn clear_all(&self) {
        for key in [&self.keys.dataset, &self.keys.state, &self.keys.stats] {
            if let Err(err) = self.store.remove(key).await {
                warn!(key = %key, %err, "failed to clear cache entry");
            }
        }
        debug!("cleared cached quiz data");
    }

    //
    // ─── KNOWN FLAGS ──────────────────────────────────────────────────────────
    //

    pub async fn set_question_known(&self, id: QuestionId, known: bool) {
        let value = if known { KNOWN_TRUE } else { KNOWN_FALSE };
        if let Err(err) = self.store.set(&CacheKeys::known_flag(id), value).await {
            warn!(%id, %err, "failed to save known flag");
        }
    }

    /// Missing or unreadable flags count as not known.
    pub async fn get_question_known(&self, id: QuestionId) -> bool {
        match self.store.get(&CacheKeys::known_flag(id)).await {
            Ok(value) => value.as_deref() == Some(KNOWN_TRUE),
            Err(err) => {
                warn!(%id, %err, "failed to read known flag");
                false
            }
        }
    }

    /// Number of `ids` currently flagged as known.
    pub async fn known_count(&self, ids: impl IntoIterator<Item = QuestionId> + Send) -> usize {
        let mut count = 0;
        for id in ids {
            if self.get_question_known(id).await {
                count += 1;
            }
        }
        count
    }

    //
    // ─── SESSION STATE & STATS ────────────────────────────────────────────────
    //

    pub async fn save_state(&self, state: &QuizState) {
        self.write_json(&self.keys.state, state).await;
    }

    pub async fn load_state(&self) -> Option<QuizState> {
        self.read_json(&self.keys.state).await
    }

    pub async fn clear_state(&self) {
        if let Err(err) = self.store.remove(&self.keys.state).await {
            warn!(%err, "failed to clear quiz state");
        }
    }

    pub async fn save_stats(&self, stats: &QuizStats) {
        self.write_json(&self.keys.stats, stats).await;
    }

    pub async fn load_stats(&self) -> Option<QuizStats> {
        self.read_json(&self.keys.stats).await
    }

    //
    // ─── HELPERS ──────────────────────────────────────────────────────────────
    //

    async fn write_json<T: Serialize + Sync + ?Sized>(&self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                warn!(key, %err, "failed to serialize cache entry");
                return false;
            }
        };
        match self.store.set(key, &json).await {
            Ok(()) => true,
            Err(err) => {
                warn!(key, %err, "failed to write cache entry");
                false
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(key, %err, "failed to read cache entry");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, %err, "discarding unreadable cache entry");
                None
            }
        }
    }
}
