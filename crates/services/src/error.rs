//! Shared error types for the services crate.

use thiserror::Error;

use api::BackendError;
use quiz_core::SessionError;

/// Errors emitted by the quiz controller and favorite service.
///
/// Every kind surfaces to the user the same way (a transient message) and
/// always leaves the session in a recoverable phase; the variants exist so
/// callers can render distinct messages and tests can pin down causes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    /// Local validation: a quiz was started with no lessons selected. The
    /// session is untouched and no request goes out.
    #[error("no lessons selected")]
    NoLessonsSelected,

    /// Local validation: a quiz was started with a zero question count.
    #[error("question count must be at least 1")]
    InvalidCount,

    /// The fetch succeeded but matched zero questions; the session has
    /// entered the error phase rather than presenting an empty quiz.
    #[error("no questions matched the selected lessons")]
    EmptyResult,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
