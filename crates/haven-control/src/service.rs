//! Lifecycle orchestration service.
//!
//! `LifecycleService` is the single mutating entry point for leases and
//! contracts. Every transition follows the same shape:
//!
//! 1. acquire the resource's lock, failing fast with `ResourceBusy`;
//! 2. load the current record (cache, falling back to the store);
//! 3. consult the pure state machine;
//! 4. persist the replacement record and refresh the cache;
//! 5. release the lock on every exit path;
//! 6. only then run the transition's side effects (artifact regeneration,
//!    event publication), logging and swallowing their failures.
//!
//! Steps 1–4 are the only steps protected by the lock; nothing after the
//! release may assume exclusivity. A worker that dies mid-transition is
//! recovered by the lock's TTL: the next caller sees whatever state was
//! persisted and the stale lock expires on its own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use haven_cache::TtlCache;
use haven_core::{ContractId, LeaseId};
use haven_lock::{AcquireOutcome, InMemoryLockManager, LockKey, LockManager, LockToken, ReleaseOutcome};
use haven_store::{Contract, ContractState, Lease, LeaseState, Store};

use crate::contract::{self, ContractAction};
use crate::error::{ControlError, Result};
use crate::events::{Effect, EventKind, EventPublisher, LifecycleEvent, LogPublisher};
use crate::lease::{self, LeaseAction};
use crate::overlap;
use crate::render::{DocumentRenderer, NoopRenderer};
use crate::types::{ControlConfig, CreateContractRequest, CreateLeaseRequest, RenewContractRequest};

/// The lifecycle orchestrator for leases and contracts.
pub struct LifecycleService<S: Store> {
    store: Arc<S>,
    locks: Arc<dyn LockManager>,
    publisher: Arc<dyn EventPublisher>,
    renderer: Arc<dyn DocumentRenderer>,
    leases: TtlCache<LeaseId, Lease>,
    contracts: TtlCache<ContractId, Contract>,
    config: ControlConfig,
}

impl<S: Store> LifecycleService<S> {
    /// Create a new lifecycle service.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        locks: Arc<dyn LockManager>,
        publisher: Arc<dyn EventPublisher>,
        renderer: Arc<dyn DocumentRenderer>,
        config: ControlConfig,
    ) -> Self {
        Self {
            store,
            locks,
            publisher,
            renderer,
            leases: TtlCache::new(),
            contracts: TtlCache::new(),
            config,
        }
    }

    /// Create with an in-process lock table, a log-only publisher, a noop
    /// renderer, and default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(
            store,
            Arc::new(InMemoryLockManager::new()),
            Arc::new(LogPublisher),
            Arc::new(NoopRenderer),
            ControlConfig::default(),
        )
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ControlConfig {
        &self.config
    }

    // =========================================================================
    // Lock discipline
    // =========================================================================

    /// Take the lock or fail fast; callers decide their own retry policy.
    async fn acquire(&self, key: &LockKey) -> Result<LockToken> {
        match self.locks.acquire(key, self.config.lock_ttl).await? {
            AcquireOutcome::Acquired(token) => Ok(token),
            AcquireOutcome::Busy => Err(ControlError::ResourceBusy { key: key.clone() }),
        }
    }

    /// Release the lock; runs on every exit path and never fails the call.
    ///
    /// `NotOwner` here means the critical section overran the TTL and the
    /// key was reclaimed. The transition already committed, so the only
    /// correct reaction is to log it loudly.
    async fn release(&self, key: &LockKey, token: &LockToken) {
        match self.locks.release(key, token).await {
            Ok(ReleaseOutcome::Released) => {}
            Ok(ReleaseOutcome::NotOwner) => {
                tracing::warn!(key = %key, "Lock expired before release; TTL may be too short");
            }
            Err(error) => {
                tracing::warn!(key = %key, error = %error, "Failed to release lock");
            }
        }
    }

    // =========================================================================
    // Side effects (post-release, best-effort)
    // =========================================================================

    async fn publish(&self, event: LifecycleEvent) {
        if let Err(error) = self.publisher.publish(&event).await {
            tracing::warn!(
                kind = ?event.kind,
                resource_id = %event.resource_id,
                error = %error,
                "Failed to publish lifecycle event; transition is already committed"
            );
        }
    }

    async fn run_lease_effects(&self, lease: &Lease, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Publish(kind) => {
                    self.publish(LifecycleEvent::for_lease(kind, lease)).await;
                }
                // Leases carry no rendered artifact.
                Effect::RegenerateArtifact => {}
            }
        }
    }

    async fn run_contract_effects(&self, contract: &Contract, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Publish(kind) => {
                    self.publish(LifecycleEvent::for_contract(kind, contract)).await;
                }
                Effect::RegenerateArtifact => {
                    if let Err(error) = self.renderer.render_contract(contract).await {
                        tracing::warn!(
                            contract_id = %contract.contract_id,
                            error = %error,
                            "Failed to regenerate contract artifact"
                        );
                    }
                }
            }
        }
    }

    // =========================================================================
    // Lease operations
    // =========================================================================

    /// Create a lease in `PendingApproval`, guarding the property's
    /// availability under its lock.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInterval` for an empty interval, `ResourceBusy` if
    /// another creation on the same property is in flight, and
    /// `OverlapConflict` if a non-terminal lease already occupies part of
    /// the interval.
    pub async fn create_lease(&self, request: CreateLeaseRequest) -> Result<Lease> {
        if request.start_date >= request.end_date {
            return Err(ControlError::InvalidInterval {
                start: request.start_date,
                end: request.end_date,
            });
        }

        let key = LockKey::property(&request.property_id);
        let token = self.acquire(&key).await?;
        let outcome = self.create_lease_locked(&request);
        self.release(&key, &token).await;
        let lease = outcome?;

        tracing::info!(
            lease_id = %lease.lease_id,
            property_id = %lease.property_id,
            "Created lease"
        );

        self.publish(LifecycleEvent::for_lease(EventKind::LeaseCreated, &lease))
            .await;

        Ok(lease)
    }

    fn create_lease_locked(&self, request: &CreateLeaseRequest) -> Result<Lease> {
        if let Some(conflict) = overlap::find_conflict(
            &*self.store,
            &request.property_id,
            request.start_date,
            request.end_date,
        )? {
            return Err(ControlError::OverlapConflict {
                property_id: request.property_id,
                start: request.start_date,
                end: request.end_date,
                conflicting: conflict.lease_id,
            });
        }

        let now = Utc::now();
        let lease = Lease {
            lease_id: LeaseId::generate(),
            property_id: request.property_id,
            tenant_id: request.tenant_id,
            landlord_id: request.landlord_id,
            state: LeaseState::PendingApproval,
            start_date: request.start_date,
            end_date: request.end_date,
            created_at: now,
            updated_at: now,
        };

        self.store.put_lease(&lease)?;
        self.leases
            .put(lease.lease_id, lease.clone(), self.config.cache_ttl);

        Ok(lease)
    }

    /// Apply a lifecycle action to a lease under its lock.
    ///
    /// # Errors
    ///
    /// Returns `ResourceBusy` if another transition is in flight,
    /// `LeaseNotFound` for an unknown id, and the state machine's
    /// rejection otherwise.
    pub async fn apply_lease(&self, lease_id: &LeaseId, action: LeaseAction) -> Result<Lease> {
        let key = LockKey::lease(lease_id);
        let token = self.acquire(&key).await?;
        let outcome = self.apply_lease_locked(lease_id, action);
        self.release(&key, &token).await;
        let (lease, effects) = outcome?;

        tracing::info!(
            lease_id = %lease_id,
            action = %action,
            state = ?lease.state,
            "Applied lease transition"
        );

        self.run_lease_effects(&lease, effects).await;

        Ok(lease)
    }

    fn apply_lease_locked(
        &self,
        lease_id: &LeaseId,
        action: LeaseAction,
    ) -> Result<(Lease, Vec<Effect>)> {
        let current = match self.leases.get(lease_id) {
            Some(lease) => lease,
            None => self
                .store
                .get_lease(lease_id)?
                .ok_or(ControlError::LeaseNotFound(*lease_id))?,
        };

        let step = lease::step(&current, action)?;

        let mut next = current;
        next.state = step.next;
        next.updated_at = Utc::now();

        self.store.put_lease(&next)?;
        self.leases
            .put(next.lease_id, next.clone(), self.config.cache_ttl);

        Ok((next, step.effects))
    }

    /// Cache-through read of a lease. Never acquires the lock.
    ///
    /// # Errors
    ///
    /// Returns `LeaseNotFound` for an unknown id. A transient store error
    /// is retried once before surfacing.
    pub async fn get_lease(&self, lease_id: &LeaseId) -> Result<Lease> {
        if let Some(lease) = self.leases.get(lease_id) {
            return Ok(lease);
        }

        let lease = retry_read(|| self.store.get_lease(lease_id))?
            .ok_or(ControlError::LeaseNotFound(*lease_id))?;

        self.leases
            .put(lease.lease_id, lease.clone(), self.config.cache_ttl);

        Ok(lease)
    }

    // =========================================================================
    // Contract operations
    // =========================================================================

    /// Create a contract in `Draft`.
    ///
    /// Contract creation needs no availability check and the fresh id
    /// cannot be contended, so no lock is taken.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInterval` for an empty term, or a store error.
    pub async fn create_contract(&self, request: CreateContractRequest) -> Result<Contract> {
        self.create_contract_inner(request, None).await
    }

    async fn create_contract_inner(
        &self,
        request: CreateContractRequest,
        renewed_from: Option<ContractId>,
    ) -> Result<Contract> {
        if request.start_date >= request.end_date {
            return Err(ControlError::InvalidInterval {
                start: request.start_date,
                end: request.end_date,
            });
        }

        let now = Utc::now();
        let contract = Contract {
            contract_id: ContractId::generate(),
            property_id: request.property_id,
            tenant_id: request.tenant_id,
            landlord_id: request.landlord_id,
            state: ContractState::Draft,
            tenant_signed: false,
            landlord_signed: false,
            start_date: request.start_date,
            end_date: request.end_date,
            renewed_from,
            created_at: now,
            updated_at: now,
        };

        self.store.put_contract(&contract)?;
        self.contracts
            .put(contract.contract_id, contract.clone(), self.config.cache_ttl);

        tracing::info!(
            contract_id = %contract.contract_id,
            property_id = %contract.property_id,
            renewed_from = ?renewed_from,
            "Created contract"
        );

        self.publish(LifecycleEvent::for_contract(
            EventKind::ContractCreated,
            &contract,
        ))
        .await;

        Ok(contract)
    }

    /// Apply a lifecycle action to a contract under its lock.
    ///
    /// # Errors
    ///
    /// Returns `ResourceBusy` if another transition is in flight,
    /// `ContractNotFound` for an unknown id, and the state machine's
    /// rejection otherwise.
    pub async fn apply_contract(
        &self,
        contract_id: &ContractId,
        action: ContractAction,
    ) -> Result<Contract> {
        let key = LockKey::contract(contract_id);
        let token = self.acquire(&key).await?;
        let outcome = self.apply_contract_locked(contract_id, action);
        self.release(&key, &token).await;
        let (contract, effects) = outcome?;

        tracing::info!(
            contract_id = %contract_id,
            action = %action,
            state = ?contract.state,
            "Applied contract transition"
        );

        self.run_contract_effects(&contract, effects).await;

        Ok(contract)
    }

    fn apply_contract_locked(
        &self,
        contract_id: &ContractId,
        action: ContractAction,
    ) -> Result<(Contract, Vec<Effect>)> {
        let current = match self.contracts.get(contract_id) {
            Some(contract) => contract,
            None => self
                .store
                .get_contract(contract_id)?
                .ok_or(ControlError::ContractNotFound(*contract_id))?,
        };

        let step = contract::step(&current, action)?;

        let mut next = current;
        next.state = step.next;
        next.tenant_signed = step.tenant_signed;
        next.landlord_signed = step.landlord_signed;
        next.updated_at = Utc::now();

        self.store.put_contract(&next)?;
        self.contracts
            .put(next.contract_id, next.clone(), self.config.cache_ttl);

        Ok((next, step.effects))
    }

    /// Renew an expired contract: the old record moves to `Renewed` and a
    /// successor is created in `Draft` with `renewed_from` pointing back.
    ///
    /// The successor follows the normal create flow, including its
    /// `contract_created` announcement; the old record emits nothing.
    ///
    /// The successor's term is validated before the old record moves, so a
    /// bad request leaves the old contract in `Expired` and renewable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInterval` for an empty successor term, and fails
    /// like [`Self::apply_contract`] if the old contract is not `Expired`.
    pub async fn renew_contract(
        &self,
        contract_id: &ContractId,
        request: RenewContractRequest,
    ) -> Result<Contract> {
        if request.start_date >= request.end_date {
            return Err(ControlError::InvalidInterval {
                start: request.start_date,
                end: request.end_date,
            });
        }

        let old = self.apply_contract(contract_id, ContractAction::Renew).await?;

        self.create_contract_inner(
            CreateContractRequest {
                property_id: old.property_id,
                tenant_id: old.tenant_id,
                landlord_id: old.landlord_id,
                start_date: request.start_date,
                end_date: request.end_date,
            },
            Some(*contract_id),
        )
        .await
    }

    /// Cache-through read of a contract. Never acquires the lock.
    ///
    /// # Errors
    ///
    /// Returns `ContractNotFound` for an unknown id. A transient store
    /// error is retried once before surfacing.
    pub async fn get_contract(&self, contract_id: &ContractId) -> Result<Contract> {
        if let Some(contract) = self.contracts.get(contract_id) {
            return Ok(contract);
        }

        let contract = retry_read(|| self.store.get_contract(contract_id))?
            .ok_or(ControlError::ContractNotFound(*contract_id))?;

        self.contracts
            .put(contract.contract_id, contract.clone(), self.config.cache_ttl);

        Ok(contract)
    }

    // =========================================================================
    // Expiry sweep
    // =========================================================================

    /// Move every `Active` lease and contract whose end date has passed to
    /// `Expired`, through the normal locked apply path.
    ///
    /// The sweep is best-effort: records that are busy or that changed
    /// state since listing are skipped and picked up by the next sweep.
    /// It also drops expired cache entries, so the caches stay bounded in
    /// a long-running service. Returns `(leases_expired, contracts_expired)`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot be listed.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> Result<(u32, u32)> {
        let mut leases_expired = 0u32;
        for lease in self.store.list_leases_by_state(LeaseState::Active)? {
            if lease.end_date > now {
                continue;
            }
            match self.apply_lease(&lease.lease_id, LeaseAction::MarkExpired).await {
                Ok(_) => leases_expired += 1,
                Err(error) => {
                    tracing::warn!(
                        lease_id = %lease.lease_id,
                        error = %error,
                        "Skipping lease expiry; next sweep will retry"
                    );
                }
            }
        }

        let mut contracts_expired = 0u32;
        for contract in self.store.list_contracts_by_state(ContractState::Active)? {
            if contract.end_date > now {
                continue;
            }
            match self
                .apply_contract(&contract.contract_id, ContractAction::MarkExpired)
                .await
            {
                Ok(_) => contracts_expired += 1,
                Err(error) => {
                    tracing::warn!(
                        contract_id = %contract.contract_id,
                        error = %error,
                        "Skipping contract expiry; next sweep will retry"
                    );
                }
            }
        }

        let dropped = self.leases.purge_expired() + self.contracts.purge_expired();
        if dropped > 0 {
            tracing::debug!(dropped, "Dropped expired cache entries");
        }

        Ok((leases_expired, contracts_expired))
    }
}

/// Run an idempotent store read, retrying once on a transient error.
///
/// Mutating operations never go through this; retrying a write risks
/// doubled side effects.
fn retry_read<T>(mut read: impl FnMut() -> haven_store::Result<T>) -> haven_store::Result<T> {
    match read() {
        Ok(value) => Ok(value),
        Err(first) => {
            tracing::warn!(error = %first, "Store read failed; retrying once");
            read()
        }
    }
}
