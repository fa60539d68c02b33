//! Lease lifecycle state machine.
//!
//! Pure logic mapping (current record, action) to the next state and the
//! side effects to run after the transition commits. The machine never
//! silently no-ops: every pair outside the table below is rejected with an
//! error naming the current state and attempted action.
//!
//! # State Machine
//!
//! ```text
//!   ┌─────────────────┐ Approve  ┌────────┐ MarkExpired ┌─────────┐
//!   │ PendingApproval │─────────▶│ Active │────────────▶│ Expired │
//!   └───────┬─────────┘          └───┬────┘             └─────────┘
//!           │ Cancel       Terminate │
//!           ▼                        ▼
//!        ┌──────────────────────────────┐
//!        │          Terminated          │
//!        └──────────────────────────────┘
//! ```

use haven_store::{Lease, LeaseState};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ControlError, Result};
use crate::events::{Effect, EventKind};

/// A lifecycle verb applicable to a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseAction {
    /// Landlord approves the pending lease.
    Approve,
    /// Either party cancels before approval.
    Cancel,
    /// Either party ends the active lease.
    Terminate,
    /// Time passed the end date (external, clock-driven trigger).
    MarkExpired,
}

impl fmt::Display for LeaseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Cancel => write!(f, "cancel"),
            Self::Terminate => write!(f, "terminate"),
            Self::MarkExpired => write!(f, "mark_expired"),
        }
    }
}

/// The outcome of a valid lease transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseStep {
    /// The state to persist.
    pub next: LeaseState,
    /// Side effects to run after the write commits and the lock is released.
    pub effects: Vec<Effect>,
}

/// Evaluate `action` against the lease's current state.
///
/// # Errors
///
/// Returns `InvalidLeaseTransition` for pairs outside the transition table,
/// and `LeaseAlreadyTerminal` when a terminal-producing action is repeated
/// on an already terminal lease (idempotency guard, distinct so callers can
/// treat the repeat as a no-op).
pub fn step(lease: &Lease, action: LeaseAction) -> Result<LeaseStep> {
    use LeaseState::{Active, PendingApproval};

    match (lease.state, action) {
        (PendingApproval, LeaseAction::Approve) => Ok(LeaseStep {
            next: Active,
            effects: vec![Effect::Publish(EventKind::LeaseActivated)],
        }),
        (PendingApproval, LeaseAction::Cancel) | (Active, LeaseAction::Terminate) => {
            Ok(LeaseStep {
                next: LeaseState::Terminated,
                effects: vec![Effect::Publish(EventKind::LeaseTerminated)],
            })
        }
        (Active, LeaseAction::MarkExpired) => Ok(LeaseStep {
            next: LeaseState::Expired,
            effects: vec![Effect::Publish(EventKind::LeaseExpired)],
        }),
        (state, LeaseAction::Cancel | LeaseAction::Terminate | LeaseAction::MarkExpired)
            if state.is_terminal() =>
        {
            Err(ControlError::LeaseAlreadyTerminal {
                lease_id: lease.lease_id,
                state,
            })
        }
        (state, action) => Err(ControlError::InvalidLeaseTransition {
            lease_id: lease.lease_id,
            state,
            action,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use haven_core::{LeaseId, PartyId, PropertyId};

    fn lease_in(state: LeaseState) -> Lease {
        Lease {
            lease_id: LeaseId::generate(),
            property_id: PropertyId::from_bytes([7u8; 32]),
            tenant_id: PartyId::from_bytes([1u8; 32]),
            landlord_id: PartyId::from_bytes([2u8; 32]),
            state,
            start_date: Utc::now(),
            end_date: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn approve_activates() {
        let step = step(&lease_in(LeaseState::PendingApproval), LeaseAction::Approve).unwrap();
        assert_eq!(step.next, LeaseState::Active);
        assert_eq!(step.effects, vec![Effect::Publish(EventKind::LeaseActivated)]);
    }

    #[test]
    fn cancel_before_approval_terminates() {
        let step = step(&lease_in(LeaseState::PendingApproval), LeaseAction::Cancel).unwrap();
        assert_eq!(step.next, LeaseState::Terminated);
    }

    #[test]
    fn terminate_active() {
        let step = step(&lease_in(LeaseState::Active), LeaseAction::Terminate).unwrap();
        assert_eq!(step.next, LeaseState::Terminated);
        assert_eq!(
            step.effects,
            vec![Effect::Publish(EventKind::LeaseTerminated)]
        );
    }

    #[test]
    fn expire_active() {
        let step = step(&lease_in(LeaseState::Active), LeaseAction::MarkExpired).unwrap();
        assert_eq!(step.next, LeaseState::Expired);
    }

    #[test]
    fn approve_after_terminal_rejected() {
        let result = step(&lease_in(LeaseState::Terminated), LeaseAction::Approve);
        assert!(matches!(
            result,
            Err(ControlError::InvalidLeaseTransition {
                state: LeaseState::Terminated,
                action: LeaseAction::Approve,
                ..
            })
        ));
    }

    #[test]
    fn repeat_terminate_is_already_terminal() {
        let result = step(&lease_in(LeaseState::Terminated), LeaseAction::Terminate);
        assert!(matches!(
            result,
            Err(ControlError::LeaseAlreadyTerminal {
                state: LeaseState::Terminated,
                ..
            })
        ));

        let result = step(&lease_in(LeaseState::Expired), LeaseAction::MarkExpired);
        assert!(matches!(
            result,
            Err(ControlError::LeaseAlreadyTerminal { .. })
        ));
    }

    #[test]
    fn cancel_active_rejected() {
        // Cancel is only valid before approval.
        let result = step(&lease_in(LeaseState::Active), LeaseAction::Cancel);
        assert!(matches!(
            result,
            Err(ControlError::InvalidLeaseTransition { .. })
        ));
    }

    #[test]
    fn expire_pending_rejected() {
        let result = step(&lease_in(LeaseState::PendingApproval), LeaseAction::MarkExpired);
        assert!(matches!(
            result,
            Err(ControlError::InvalidLeaseTransition { .. })
        ));
    }
}
