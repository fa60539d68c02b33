//! Error types for lifecycle orchestration.
//!
//! Every rejected transition names the current state and the attempted
//! action, so callers can decide whether a retry is meaningful. Idempotency
//! guards (`AlreadySigned`, `*AlreadyTerminal`) are surfaced distinctly from
//! `Invalid*Transition` so a repeated action can be treated as a harmless
//! no-op rather than a failure.

use haven_core::{ContractId, LeaseId, PropertyId};
use haven_lock::{LockError, LockKey};
use haven_store::{ContractState, LeaseState, Party, StoreError};
use thiserror::Error;

use crate::contract::ContractAction;
use crate::lease::LeaseAction;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur in lifecycle operations.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The requested lease was not found.
    #[error("lease not found: {0}")]
    LeaseNotFound(LeaseId),

    /// The requested contract was not found.
    #[error("contract not found: {0}")]
    ContractNotFound(ContractId),

    /// Another worker holds the resource's transition lock. Retryable with
    /// backoff; the in-flight transition will release the lock or its TTL
    /// will expire.
    #[error("resource busy: {key} is locked by another worker")]
    ResourceBusy {
        /// The contended lock key.
        key: LockKey,
    },

    /// The requested action is illegal from the lease's current state.
    #[error("invalid transition for lease {lease_id}: cannot apply {action} in state {state:?}")]
    InvalidLeaseTransition {
        /// The lease being transitioned.
        lease_id: LeaseId,
        /// The current state.
        state: LeaseState,
        /// The attempted action.
        action: LeaseAction,
    },

    /// The requested action is illegal from the contract's current state.
    #[error(
        "invalid transition for contract {contract_id}: cannot apply {action} in state {state:?}"
    )]
    InvalidContractTransition {
        /// The contract being transitioned.
        contract_id: ContractId,
        /// The current state.
        state: ContractState,
        /// The attempted action.
        action: ContractAction,
    },

    /// The party has already signed this contract.
    #[error("contract {contract_id} already signed by {party}")]
    AlreadySigned {
        /// The contract in question.
        contract_id: ContractId,
        /// The party that repeated its signature.
        party: Party,
    },

    /// The lease is already in a terminal state; the repeated action is a no-op.
    #[error("lease {lease_id} is already terminal in state {state:?}")]
    LeaseAlreadyTerminal {
        /// The lease in question.
        lease_id: LeaseId,
        /// Its terminal state.
        state: LeaseState,
    },

    /// The contract is already in a terminal state; the repeated action is a no-op.
    #[error("contract {contract_id} is already terminal in state {state:?}")]
    ContractAlreadyTerminal {
        /// The contract in question.
        contract_id: ContractId,
        /// Its terminal state.
        state: ContractState,
    },

    /// The requested interval is empty or inverted.
    #[error("invalid interval: start {start} is not before end {end}")]
    InvalidInterval {
        /// Requested start (inclusive).
        start: chrono::DateTime<chrono::Utc>,
        /// Requested end (exclusive).
        end: chrono::DateTime<chrono::Utc>,
    },

    /// The requested interval conflicts with an existing non-terminal lease.
    #[error(
        "property {property_id} is unavailable for [{start}, {end}): conflicts with lease {conflicting}"
    )]
    OverlapConflict {
        /// The contended property.
        property_id: PropertyId,
        /// Requested start (inclusive).
        start: chrono::DateTime<chrono::Utc>,
        /// Requested end (exclusive).
        end: chrono::DateTime<chrono::Utc>,
        /// The lease already occupying part of the interval.
        conflicting: LeaseId,
    },

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Lock backend error.
    #[error("lock error: {0}")]
    Lock(#[from] LockError),
}

impl ControlError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::LeaseNotFound(_) | Self::ContractNotFound(_) => 404,
            Self::ResourceBusy { .. } => 423,
            Self::InvalidLeaseTransition { .. }
            | Self::InvalidContractTransition { .. }
            | Self::AlreadySigned { .. }
            | Self::LeaseAlreadyTerminal { .. }
            | Self::ContractAlreadyTerminal { .. }
            | Self::OverlapConflict { .. } => 409,
            Self::InvalidInterval { .. } => 422,
            Self::Store(_) | Self::Lock(_) => 500,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    ///
    /// `InvalidTransition`-class rejections are never retriable; the state
    /// machine will keep rejecting them.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::ResourceBusy { .. } | Self::Store(_) | Self::Lock(_)
        )
    }
}
