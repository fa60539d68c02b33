//! Error types for the lock layer.

use thiserror::Error;

/// A result type using `LockError`.
pub type Result<T> = std::result::Result<T, LockError>;

/// Errors that can occur while talking to a lock backend.
///
/// Note that failing to acquire a held lock is not an error; it is the
/// `Busy` outcome. These errors cover backend faults only.
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock backend could not be reached or rejected the request.
    #[error("lock backend error: {0}")]
    Backend(String),
}
