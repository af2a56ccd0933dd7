//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::LessonError;
use storage::repository::StorageError;

/// Errors emitted by `ProfileStore` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileStoreError {
    #[error("no user is signed in")]
    SignedOut,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LessonService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonServiceError {
    #[error("invalid lesson JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
