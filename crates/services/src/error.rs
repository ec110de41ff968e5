//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{TranslationLengthMismatch, ValidationError};
use storage::StorageError;

/// Errors emitted while importing questions into the bank.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("row {row} rejected: {source} [{content}]")]
    InvalidRow {
        row: usize,
        content: String,
        #[source]
        source: ValidationError,
    },
    #[error("no questions found in import")]
    NoQuestions,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ExamSession` transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no exam in progress")]
    NotStarted,
    #[error("an exam is already in progress")]
    AlreadyInProgress,
    #[error("exam already submitted")]
    AlreadySubmitted,
    #[error("no questions imported")]
    EmptyBank,
    #[error("number of questions must be at least 1")]
    InvalidQuestionCount,
    #[error("time limit must be at least 1 second")]
    InvalidTimeLimit,
    #[error("`{0}` is not an option of the current question")]
    UnknownOption(String),
}

/// Errors from a translation provider. Never fatal to a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TranslationError {
    #[error("translation is not configured")]
    Disabled,
    #[error("cannot translate empty text")]
    EmptyText,
    #[error("translator returned an empty response")]
    EmptyResponse,
    #[error("translator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    LengthMismatch(#[from] TranslationLengthMismatch),
    #[error("{0}")]
    Provider(String),
}
