//! Lifecycle transition events and the publisher seam.
//!
//! Events are announced best-effort, at-least-once, strictly after the
//! resource lock has been released: a committed transition is never rolled
//! back because the bus is down. The payload carries the resource id, its
//! counterparty references, and the event kind; subscribers resolve display
//! attributes themselves.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use haven_core::{PartyId, PropertyId};
use haven_store::{Contract, Lease};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of lifecycle transition being announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A lease was created in `PendingApproval`.
    LeaseCreated,
    /// A lease was approved and is now active.
    LeaseActivated,
    /// A lease was cancelled or terminated.
    LeaseTerminated,
    /// A lease ran past its end date.
    LeaseExpired,
    /// A contract was created in `Draft`.
    ContractCreated,
    /// Both parties signed; payment is now due.
    ContractPendingPayment,
    /// Payment confirmed; the contract is in force.
    ContractActivated,
    /// The contract was paused.
    ContractPaused,
    /// The contract was resumed.
    ContractResumed,
    /// The contract was terminated.
    ContractTerminated,
    /// The contract ran past its end date.
    ContractExpired,
}

impl EventKind {
    /// The bus topic this kind is published on.
    #[must_use]
    pub const fn topic(self) -> &'static str {
        match self {
            Self::LeaseCreated
            | Self::LeaseActivated
            | Self::LeaseTerminated
            | Self::LeaseExpired => "lease.lifecycle",
            Self::ContractCreated
            | Self::ContractPendingPayment
            | Self::ContractActivated
            | Self::ContractPaused
            | Self::ContractResumed
            | Self::ContractTerminated
            | Self::ContractExpired => "contract.lifecycle",
        }
    }
}

/// A side effect listed by a state machine transition.
///
/// Effects are executed by the orchestrator after the lock is released;
/// their failure is logged and swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Re-render the final contract artifact via the document renderer.
    RegenerateArtifact,
    /// Publish a lifecycle event on the bus.
    Publish(EventKind),
}

/// The payload announced for a lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// What happened.
    pub kind: EventKind,
    /// The lease or contract id, stringified.
    pub resource_id: String,
    /// The property bound to the resource.
    pub property_id: PropertyId,
    /// The tenant bound to the resource.
    pub tenant_id: PartyId,
    /// The landlord bound to the resource.
    pub landlord_id: PartyId,
    /// When the transition committed.
    pub occurred_at: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Build an event payload from a lease record.
    #[must_use]
    pub fn for_lease(kind: EventKind, lease: &Lease) -> Self {
        Self {
            kind,
            resource_id: lease.lease_id.to_string(),
            property_id: lease.property_id,
            tenant_id: lease.tenant_id,
            landlord_id: lease.landlord_id,
            occurred_at: Utc::now(),
        }
    }

    /// Build an event payload from a contract record.
    #[must_use]
    pub fn for_contract(kind: EventKind, contract: &Contract) -> Self {
        Self {
            kind,
            resource_id: contract.contract_id.to_string(),
            property_id: contract.property_id,
            tenant_id: contract.tenant_id,
            landlord_id: contract.landlord_id,
            occurred_at: Utc::now(),
        }
    }
}

/// Errors from the message bus.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The bus rejected or never received the event.
    #[error("bus error: {0}")]
    Bus(String),
}

/// Seam to the external message bus.
///
/// Implementations should be at-least-once with no ordering guarantee.
/// Callers treat failures as non-fatal.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one lifecycle event on its kind's topic.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus cannot accept the event.
    async fn publish(&self, event: &LifecycleEvent) -> std::result::Result<(), PublishError>;
}

/// Publisher that only logs, for deployments without a bus and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &LifecycleEvent) -> std::result::Result<(), PublishError> {
        tracing::info!(
            topic = event.kind.topic(),
            kind = ?event.kind,
            resource_id = %event.resource_id,
            property_id = %event.property_id,
            "Published lifecycle event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_core::{ContractId, LeaseId};
    use haven_store::{ContractState, LeaseState};

    fn days(n: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(n * 86_400, 0).unwrap()
    }

    #[test]
    fn topics_split_by_resource_kind() {
        assert_eq!(EventKind::LeaseActivated.topic(), "lease.lifecycle");
        assert_eq!(
            EventKind::ContractPendingPayment.topic(),
            "contract.lifecycle"
        );
    }

    #[test]
    fn lease_event_carries_counterparty_refs() {
        let lease = Lease {
            lease_id: LeaseId::generate(),
            property_id: PropertyId::from_bytes([7u8; 32]),
            tenant_id: PartyId::from_bytes([1u8; 32]),
            landlord_id: PartyId::from_bytes([2u8; 32]),
            state: LeaseState::Active,
            start_date: days(10),
            end_date: days(20),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let event = LifecycleEvent::for_lease(EventKind::LeaseActivated, &lease);
        assert_eq!(event.resource_id, lease.lease_id.to_string());
        assert_eq!(event.property_id, lease.property_id);
        assert_eq!(event.tenant_id, lease.tenant_id);
        assert_eq!(event.landlord_id, lease.landlord_id);
    }

    #[test]
    fn event_kind_serializes_snake_case() {
        let contract = Contract {
            contract_id: ContractId::generate(),
            property_id: PropertyId::from_bytes([7u8; 32]),
            tenant_id: PartyId::from_bytes([1u8; 32]),
            landlord_id: PartyId::from_bytes([2u8; 32]),
            state: ContractState::PendingPayment,
            tenant_signed: true,
            landlord_signed: true,
            start_date: days(10),
            end_date: days(375),
            renewed_from: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let event = LifecycleEvent::for_contract(EventKind::ContractPendingPayment, &contract);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("contract_pending_payment"));
    }
}
