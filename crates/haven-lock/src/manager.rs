//! The lock manager contract.
//!
//! Exactly one holder may own a key at a time. Acquisition is atomic and
//! non-blocking: the caller either becomes the holder or is told the key is
//! busy, and decides its own retry policy. A lock auto-expires after its TTL
//! with no external action, which is the sole recovery path when a holder
//! crashes mid-critical-section.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::key::{LockKey, LockToken};

/// Outcome of an acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The caller now holds the lock and must present this token to release it.
    Acquired(LockToken),
    /// Another holder owns the key; the caller must not enter the critical section.
    Busy,
}

impl AcquireOutcome {
    /// Return the token if the lock was acquired.
    #[must_use]
    pub const fn token(&self) -> Option<LockToken> {
        match self {
            Self::Acquired(token) => Some(*token),
            Self::Busy => None,
        }
    }
}

/// Outcome of a release attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The lock was held by the presented token and has been removed.
    Released,
    /// The presented token does not match the current holder (or the lock
    /// expired and was taken by someone else); nothing was removed.
    NotOwner,
}

/// Mutual-exclusion lease broker keyed by resource.
///
/// Implementations must guarantee that `acquire` is atomic with respect to
/// concurrent callers and that `release` never removes a lock whose stored
/// token differs from the presented one. Multi-key atomic locking is
/// deliberately unsupported; callers lock exactly one resource at a time.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Attempt to take the lock for `key`, valid for `ttl`.
    ///
    /// Callers must choose a TTL at least as long as their worst-case
    /// critical-section duration.
    ///
    /// # Errors
    ///
    /// Returns an error only on backend faults, never for a busy lock.
    async fn acquire(&self, key: &LockKey, ttl: Duration) -> Result<AcquireOutcome>;

    /// Release the lock for `key` if `token` still owns it.
    ///
    /// # Errors
    ///
    /// Returns an error only on backend faults.
    async fn release(&self, key: &LockKey, token: &LockToken) -> Result<ReleaseOutcome>;
}
