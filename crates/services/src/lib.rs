#![forbid(unsafe_code)]

pub mod app_services;
pub mod browse;
pub mod error;
pub mod question_bank;
pub mod sessions;
pub mod source;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use browse::{BrowseCounts, BrowseEntry, BrowseFilter, browse, browse_counts};
pub use error::{AppServicesError, FetchError, LoadError, SessionError};
pub use question_bank::{LoadOrigin, LoadedBank, QuestionBankService};
pub use sessions::{
    AnswerOutcome, QuizSession, QuizSessionService, SessionOptions, SessionProgress, StepResult,
};
pub use source::{QuizSource, SourceLocation, TextSource};
