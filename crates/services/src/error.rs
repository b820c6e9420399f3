//! Shared error types for the services crate.

use thiserror::Error;

use ktet_core::model::{BankError, QuizResultError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while loading the question bank.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankLoadError {
    #[error("invalid question bank source: {0}")]
    InvalidSource(String),
    #[error("could not read question bank file: {0}")]
    Io(#[from] std::io::Error),
    #[error("question bank request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Parse(#[from] BankError),
}

/// Errors emitted by the session assembler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssemblyError {
    #[error("no questions found for category: {0}")]
    CategoryNotFound(String),
    #[error("exam subject missing from question bank: {0}")]
    MissingSubject(String),
    #[error("could not assemble {required} questions, only found {found}")]
    InsufficientQuestions { found: usize, required: usize },
}

/// Errors emitted by quiz sessions and the services that start them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("exam has not been started")]
    NotStarted,
    #[error("session already finished")]
    AlreadyFinished,
    #[error("no option selected for the current question")]
    NoSelection,
    #[error("option {index} does not exist")]
    InvalidOption { index: usize },
    #[error(transparent)]
    Load(#[from] BankLoadError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// A single failed step of the post-session persistence task.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error("could not build quiz result: {0}")]
    InvalidResult(#[from] QuizResultError),
    #[error("could not save quiz result: {0}")]
    SaveResult(#[source] StorageError),
    #[error("could not update seen questions: {0}")]
    UpdateSeen(#[source] StorageError),
    #[error("persistence task failed: {0}")]
    Task(String),
}

/// Errors emitted by the LLM-backed services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiError {
    #[error("AI service is not configured")]
    Disabled,
    #[error("AI service returned an empty response")]
    EmptyResponse,
    #[error("AI request timed out")]
    Timeout,
    #[error("AI request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0:?} is not a quiz topic")]
    InvalidTopic(String),
    #[error("AI returned questions in an unreadable format: {0}")]
    InvalidFormat(String),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Bank(#[from] BankLoadError),
}
