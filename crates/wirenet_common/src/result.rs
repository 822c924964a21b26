//! Common result and error types for the wirenet engine.

/// The standard result type for fallible internal consistency checks.
///
/// `Err` indicates a bug in the engine itself, not a problem with the user's
/// circuit. Circuit problems such as width conflicts are recorded as
/// diagnostics on the snapshot and the operation still returns `Ok`.
pub type WirenetResult<T> = Result<T, InternalError>;

/// An internal error indicating a broken engine invariant.
///
/// These errors should never occur during normal operation. Bundle builds
/// that hit one are retried and, if the failure persists, publish a degraded
/// snapshot instead of surfacing the error to callers.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("internal engine error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
