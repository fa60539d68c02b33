//! Domain records persisted in the store.
//!
//! Leases and contracts are immutable values from the orchestrator's point
//! of view: every transition replaces the whole record, and `updated_at` is
//! refreshed on each successful write. Records in a terminal state are kept
//! for audit and history, never deleted.

use chrono::{DateTime, Utc};
use haven_core::{ContractId, LeaseId, PartyId, PropertyId};
use serde::{Deserialize, Serialize};

/// A rental lease record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    /// Unique identifier, assigned at creation.
    pub lease_id: LeaseId,
    /// The property this lease occupies.
    pub property_id: PropertyId,
    /// The tenant bound to the lease.
    pub tenant_id: PartyId,
    /// The landlord bound to the lease.
    pub landlord_id: PartyId,
    /// Current lifecycle state.
    pub state: LeaseState,
    /// Start of the occupied interval (inclusive).
    pub start_date: DateTime<Utc>,
    /// End of the occupied interval (exclusive), so back-to-back leases do
    /// not conflict.
    pub end_date: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful transition.
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle states for a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LeaseState {
    /// Created, waiting for landlord approval.
    PendingApproval = 1,
    /// Approved and occupying its interval.
    Active = 2,
    /// Cancelled before approval or terminated while active.
    Terminated = 3,
    /// Ran past its end date.
    Expired = 4,
}

impl LeaseState {
    /// Convert the state to its numeric representation.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Try to convert a numeric value to a `LeaseState`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::PendingApproval),
            2 => Some(Self::Active),
            3 => Some(Self::Terminated),
            4 => Some(Self::Expired),
            _ => None,
        }
    }

    /// True for states with no further transitions.
    ///
    /// Terminal leases also stop blocking the property's availability.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated | Self::Expired)
    }
}

/// A rental contract record.
///
/// A contract reaches `PendingPayment` exactly when both signature flags are
/// true; each flag is monotonic and settable once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    /// Unique identifier, assigned at creation.
    pub contract_id: ContractId,
    /// The property the contract covers.
    pub property_id: PropertyId,
    /// The tenant party.
    pub tenant_id: PartyId,
    /// The landlord party.
    pub landlord_id: PartyId,
    /// Current lifecycle state.
    pub state: ContractState,
    /// Whether the tenant has signed.
    pub tenant_signed: bool,
    /// Whether the landlord has signed.
    pub landlord_signed: bool,
    /// Contract term start (inclusive).
    pub start_date: DateTime<Utc>,
    /// Contract term end (exclusive).
    pub end_date: DateTime<Utc>,
    /// The expired contract this one renews, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewed_from: Option<ContractId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful transition.
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Whether the given party has already signed.
    #[must_use]
    pub const fn signed_by(&self, party: Party) -> bool {
        match party {
            Party::Tenant => self.tenant_signed,
            Party::Landlord => self.landlord_signed,
        }
    }
}

/// Lifecycle states for a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ContractState {
    /// Drafted, no signatures yet.
    Draft = 1,
    /// One party has signed, waiting for the other.
    PendingSignature = 2,
    /// Both parties signed, waiting for payment confirmation.
    PendingPayment = 3,
    /// Payment confirmed, contract in force.
    Active = 4,
    /// Temporarily suspended; resumable.
    Paused = 5,
    /// Terminated by a party.
    Terminated = 6,
    /// Ran past its end date; eligible for renewal.
    Expired = 7,
    /// Superseded by a renewal contract.
    Renewed = 8,
}

impl ContractState {
    /// Convert the state to its numeric representation.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Try to convert a numeric value to a `ContractState`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Draft),
            2 => Some(Self::PendingSignature),
            3 => Some(Self::PendingPayment),
            4 => Some(Self::Active),
            5 => Some(Self::Paused),
            6 => Some(Self::Terminated),
            7 => Some(Self::Expired),
            8 => Some(Self::Renewed),
            _ => None,
        }
    }

    /// True for states with no further transitions.
    ///
    /// `Expired` is terminal except for the renewal edge, which moves the
    /// old record to `Renewed` and creates a fresh contract; an expired
    /// contract never re-enters `Active`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated | Self::Expired | Self::Renewed)
    }
}

/// A counterparty role on a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// The tenant side of the contract.
    Tenant,
    /// The landlord side of the contract.
    Landlord,
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tenant => write!(f, "tenant"),
            Self::Landlord => write!(f, "landlord"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_state_numeric_roundtrip() {
        for state in [
            LeaseState::PendingApproval,
            LeaseState::Active,
            LeaseState::Terminated,
            LeaseState::Expired,
        ] {
            assert_eq!(LeaseState::from_u8(state.as_u8()), Some(state));
        }
        assert_eq!(LeaseState::from_u8(0), None);
        assert_eq!(LeaseState::from_u8(9), None);
    }

    #[test]
    fn contract_state_numeric_roundtrip() {
        for state in [
            ContractState::Draft,
            ContractState::PendingSignature,
            ContractState::PendingPayment,
            ContractState::Active,
            ContractState::Paused,
            ContractState::Terminated,
            ContractState::Expired,
            ContractState::Renewed,
        ] {
            assert_eq!(ContractState::from_u8(state.as_u8()), Some(state));
        }
        assert_eq!(ContractState::from_u8(0), None);
    }

    #[test]
    fn terminal_lease_states() {
        assert!(LeaseState::Terminated.is_terminal());
        assert!(LeaseState::Expired.is_terminal());
        assert!(!LeaseState::PendingApproval.is_terminal());
        assert!(!LeaseState::Active.is_terminal());
    }

    #[test]
    fn terminal_contract_states() {
        assert!(ContractState::Terminated.is_terminal());
        assert!(ContractState::Expired.is_terminal());
        assert!(ContractState::Renewed.is_terminal());
        assert!(!ContractState::Draft.is_terminal());
        assert!(!ContractState::Paused.is_terminal());
    }
}
