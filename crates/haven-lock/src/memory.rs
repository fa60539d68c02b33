//! In-process lock table.
//!
//! This backend serializes mutations within a single service instance. It is
//! the default for single-node deployments and tests; multi-instance
//! deployments plug a shared backend in behind the [`LockManager`] trait.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;
use crate::key::{LockKey, LockToken};
use crate::manager::{AcquireOutcome, LockManager, ReleaseOutcome};

/// A currently held lock.
#[derive(Debug, Clone, Copy)]
struct Holder {
    token: LockToken,
    expires_at: Instant,
}

impl Holder {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Lock manager backed by an in-process table.
///
/// Expired entries are treated as absent on acquisition and overwritten in
/// place, so an abandoned lock heals itself once its TTL elapses.
#[derive(Debug, Default)]
pub struct InMemoryLockManager {
    table: Mutex<HashMap<LockKey, Holder>>,
}

impl InMemoryLockManager {
    /// Create a new empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) locks currently held.
    #[must_use]
    pub fn live_count(&self) -> usize {
        let now = Instant::now();
        self.table.lock().values().filter(|h| h.is_live(now)).count()
    }

    /// Drop expired entries and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut table = self.table.lock();
        let before = table.len();
        table.retain(|_, holder| holder.is_live(now));
        before - table.len()
    }
}

#[async_trait]
impl LockManager for InMemoryLockManager {
    async fn acquire(&self, key: &LockKey, ttl: Duration) -> Result<AcquireOutcome> {
        let now = Instant::now();
        let mut table = self.table.lock();

        if let Some(holder) = table.get(key) {
            if holder.is_live(now) {
                return Ok(AcquireOutcome::Busy);
            }
            tracing::debug!(key = %key, "Reclaiming expired lock");
        }

        let token = LockToken::generate();
        table.insert(
            key.clone(),
            Holder {
                token,
                expires_at: now + ttl,
            },
        );

        Ok(AcquireOutcome::Acquired(token))
    }

    async fn release(&self, key: &LockKey, token: &LockToken) -> Result<ReleaseOutcome> {
        let mut table = self.table.lock();

        match table.get(key) {
            Some(holder) if holder.token == *token => {
                table.remove(key);
                Ok(ReleaseOutcome::Released)
            }
            _ => Ok(ReleaseOutcome::NotOwner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_core::LeaseId;

    fn test_key() -> LockKey {
        LockKey::lease(&LeaseId::generate())
    }

    #[tokio::test]
    async fn acquire_then_busy() {
        let locks = InMemoryLockManager::new();
        let key = test_key();

        let first = locks.acquire(&key, Duration::from_secs(30)).await.unwrap();
        assert!(matches!(first, AcquireOutcome::Acquired(_)));

        let second = locks.acquire(&key, Duration::from_secs(30)).await.unwrap();
        assert_eq!(second, AcquireOutcome::Busy);
    }

    #[tokio::test]
    async fn release_restores_availability() {
        let locks = InMemoryLockManager::new();
        let key = test_key();

        let token = locks
            .acquire(&key, Duration::from_secs(30))
            .await
            .unwrap()
            .token()
            .unwrap();

        let released = locks.release(&key, &token).await.unwrap();
        assert_eq!(released, ReleaseOutcome::Released);

        let again = locks.acquire(&key, Duration::from_secs(30)).await.unwrap();
        assert!(matches!(again, AcquireOutcome::Acquired(_)));
    }

    #[tokio::test]
    async fn release_with_wrong_token_is_not_owner() {
        let locks = InMemoryLockManager::new();
        let key = test_key();

        let holder = locks
            .acquire(&key, Duration::from_secs(30))
            .await
            .unwrap()
            .token()
            .unwrap();

        let stranger = LockToken::generate();
        let outcome = locks.release(&key, &stranger).await.unwrap();
        assert_eq!(outcome, ReleaseOutcome::NotOwner);

        // Lock must remain held by the original token.
        assert_eq!(
            locks.acquire(&key, Duration::from_secs(30)).await.unwrap(),
            AcquireOutcome::Busy
        );
        assert_eq!(
            locks.release(&key, &holder).await.unwrap(),
            ReleaseOutcome::Released
        );
    }

    #[tokio::test]
    async fn ttl_expiry_heals_abandoned_lock() {
        let locks = InMemoryLockManager::new();
        let key = test_key();

        let abandoned = locks
            .acquire(&key, Duration::from_millis(20))
            .await
            .unwrap()
            .token()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        // A new caller takes over without anyone releasing.
        let taken = locks.acquire(&key, Duration::from_secs(30)).await.unwrap();
        assert!(matches!(taken, AcquireOutcome::Acquired(_)));

        // The late original holder cannot revoke the new owner's lock.
        let outcome = locks.release(&key, &abandoned).await.unwrap();
        assert_eq!(outcome, ReleaseOutcome::NotOwner);
    }

    #[tokio::test]
    async fn release_after_expiry_without_contender() {
        let locks = InMemoryLockManager::new();
        let key = test_key();

        let token = locks
            .acquire(&key, Duration::from_millis(10))
            .await
            .unwrap()
            .token()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        // Nobody re-acquired; the token still matches the stored entry.
        let outcome = locks.release(&key, &token).await.unwrap();
        assert_eq!(outcome, ReleaseOutcome::Released);
    }

    #[tokio::test]
    async fn purge_drops_only_expired() {
        let locks = InMemoryLockManager::new();
        let short = test_key();
        let long = test_key();

        locks.acquire(&short, Duration::from_millis(10)).await.unwrap();
        locks.acquire(&long, Duration::from_secs(30)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(locks.purge_expired(), 1);
        assert_eq!(locks.live_count(), 1);
    }

    #[tokio::test]
    async fn independent_keys_do_not_contend() {
        let locks = InMemoryLockManager::new();
        let a = test_key();
        let b = test_key();

        let first = locks.acquire(&a, Duration::from_secs(30)).await.unwrap();
        let second = locks.acquire(&b, Duration::from_secs(30)).await.unwrap();

        assert!(matches!(first, AcquireOutcome::Acquired(_)));
        assert!(matches!(second, AcquireOutcome::Acquired(_)));
    }
}
