//! Fenced mutual-exclusion locks for haven resource mutation.
//!
//! Every state transition on a lease or contract runs under a short-lived
//! lock keyed by the resource id, so no two orchestrator instances mutate
//! the same resource concurrently. The primitives here are deliberately
//! small:
//!
//! - [`LockKey`] — deterministic key derived from resource kind and id
//! - [`LockToken`] — random fencing token proving current ownership
//! - [`LockManager`] — `acquire`/`release` with explicit busy/not-owner
//!   outcomes instead of errors or blocking waits
//! - [`InMemoryLockManager`] — the in-process table backend
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use haven_core::LeaseId;
//! use haven_lock::{AcquireOutcome, InMemoryLockManager, LockKey, LockManager};
//!
//! # async fn example() -> haven_lock::Result<()> {
//! let locks = InMemoryLockManager::new();
//! let key = LockKey::lease(&LeaseId::generate());
//!
//! match locks.acquire(&key, Duration::from_secs(30)).await? {
//!     AcquireOutcome::Acquired(token) => {
//!         // ... critical section ...
//!         locks.release(&key, &token).await?;
//!     }
//!     AcquireOutcome::Busy => {
//!         // caller decides whether and when to retry
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod key;
pub mod manager;
pub mod memory;

pub use error::{LockError, Result};
pub use key::{LockKey, LockToken};
pub use manager::{AcquireOutcome, LockManager, ReleaseOutcome};
pub use memory::InMemoryLockManager;
