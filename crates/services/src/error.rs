//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use quiz_core::model::QuizStateError;
use storage::sqlite::SqliteInitError;

/// Errors raised while reading the question table.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("question source responded with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("unsupported question source: {0}")]
    Unsupported(String),
}

/// Errors emitted by `QuestionBankService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("no valid questions found ({} problems reported)", .errors.len())]
    NoValidQuestions { errors: Vec<String> },
}

/// Errors emitted by quiz sessions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("session already completed")]
    Completed,
    #[error("current question already answered")]
    AlreadyAnswered,
    #[error("current question has not been answered")]
    NotAnswered,
    #[error("option {index} does not exist ({count} options)")]
    OptionOutOfRange { index: usize, count: usize },
    #[error(transparent)]
    State(#[from] QuizStateError),
}

/// Errors raised while assembling `AppServices`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Source(#[from] FetchError),
}
