//! Contract lifecycle state machine.
//!
//! Pure logic mapping (current record, action) to the next state, the
//! updated signature flags, and the side effects to run after the
//! transition commits. Signature flags are monotonic: each party signs at
//! most once, and the contract reaches `PendingPayment` exactly when both
//! flags are true.
//!
//! # State Machine
//!
//! ```text
//!  ┌───────┐ Sign(p) ┌──────────────────┐ Sign(other) ┌────────────────┐
//!  │ Draft │────────▶│ PendingSignature │────────────▶│ PendingPayment │
//!  └───────┘         └──────────────────┘             └───────┬────────┘
//!                                                             │ ConfirmPayment
//!                          Pause / Resume                     ▼
//!                    ┌────────┐ ◀───────────▶ ┌─────────────────┐
//!                    │ Paused │               │     Active      │
//!                    └───┬────┘               └───┬─────────┬───┘
//!                        │ Terminate    Terminate │         │ MarkExpired
//!                        ▼                        ▼         ▼
//!                     ┌───────────────────────────────┐ ┌─────────┐
//!                     │          Terminated           │ │ Expired │
//!                     └───────────────────────────────┘ └────┬────┘
//!                                                            │ Renew
//!                                                            ▼
//!                                                       ┌─────────┐
//!                                                       │ Renewed │
//!                                                       └─────────┘
//! ```
//!
//! `Renew` closes the old record; the successor contract is created
//! separately in `Draft` and follows the normal create flow.

use haven_store::{Contract, ContractState, Party};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ControlError, Result};
use crate::events::{Effect, EventKind};

/// A lifecycle verb applicable to a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractAction {
    /// One counterparty signs.
    Sign(Party),
    /// The payment gateway confirmed the initial payment.
    ConfirmPayment,
    /// Suspend the active contract.
    Pause,
    /// Resume a paused contract.
    Resume,
    /// End the contract.
    Terminate,
    /// Time passed the end date (external, clock-driven trigger).
    MarkExpired,
    /// Close the expired record in favor of a successor contract.
    Renew,
}

impl fmt::Display for ContractAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sign(party) => write!(f, "sign({party})"),
            Self::ConfirmPayment => write!(f, "confirm_payment"),
            Self::Pause => write!(f, "pause"),
            Self::Resume => write!(f, "resume"),
            Self::Terminate => write!(f, "terminate"),
            Self::MarkExpired => write!(f, "mark_expired"),
            Self::Renew => write!(f, "renew"),
        }
    }
}

/// The outcome of a valid contract transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractStep {
    /// The state to persist.
    pub next: ContractState,
    /// Signature flag for the tenant after the transition.
    pub tenant_signed: bool,
    /// Signature flag for the landlord after the transition.
    pub landlord_signed: bool,
    /// Side effects to run after the write commits and the lock is released.
    pub effects: Vec<Effect>,
}

impl ContractStep {
    /// A step that keeps both signature flags as they are on `contract`.
    fn keeping_flags(contract: &Contract, next: ContractState, effects: Vec<Effect>) -> Self {
        Self {
            next,
            tenant_signed: contract.tenant_signed,
            landlord_signed: contract.landlord_signed,
            effects,
        }
    }
}

/// Evaluate `action` against the contract's current state.
///
/// # Errors
///
/// Returns `AlreadySigned` when a party repeats its signature,
/// `ContractAlreadyTerminal` when a terminal-producing action is repeated on
/// an already terminal contract, and `InvalidContractTransition` for every
/// other pair outside the transition table.
pub fn step(contract: &Contract, action: ContractAction) -> Result<ContractStep> {
    use ContractState::{Active, Draft, Expired, Paused, PendingPayment, PendingSignature};

    match (contract.state, action) {
        (Draft | PendingSignature, ContractAction::Sign(party)) => sign(contract, party),

        (PendingPayment, ContractAction::ConfirmPayment) => Ok(ContractStep::keeping_flags(
            contract,
            Active,
            vec![Effect::Publish(EventKind::ContractActivated)],
        )),

        (Active, ContractAction::Pause) => Ok(ContractStep::keeping_flags(
            contract,
            Paused,
            vec![Effect::Publish(EventKind::ContractPaused)],
        )),

        (Paused, ContractAction::Resume) => Ok(ContractStep::keeping_flags(
            contract,
            Active,
            vec![Effect::Publish(EventKind::ContractResumed)],
        )),

        (Active | Paused, ContractAction::Terminate) => Ok(ContractStep::keeping_flags(
            contract,
            ContractState::Terminated,
            vec![Effect::Publish(EventKind::ContractTerminated)],
        )),

        (Active, ContractAction::MarkExpired) => Ok(ContractStep::keeping_flags(
            contract,
            Expired,
            vec![Effect::Publish(EventKind::ContractExpired)],
        )),

        // No event on the old record; the successor announces itself.
        (Expired, ContractAction::Renew) => Ok(ContractStep::keeping_flags(
            contract,
            ContractState::Renewed,
            vec![],
        )),

        (state, ContractAction::Terminate | ContractAction::MarkExpired)
            if state.is_terminal() =>
        {
            Err(ControlError::ContractAlreadyTerminal {
                contract_id: contract.contract_id,
                state,
            })
        }

        (state, action) => Err(ControlError::InvalidContractTransition {
            contract_id: contract.contract_id,
            state,
            action,
        }),
    }
}

/// Apply one party's signature.
fn sign(contract: &Contract, party: Party) -> Result<ContractStep> {
    if contract.signed_by(party) {
        return Err(ControlError::AlreadySigned {
            contract_id: contract.contract_id,
            party,
        });
    }

    let tenant_signed = contract.tenant_signed || party == Party::Tenant;
    let landlord_signed = contract.landlord_signed || party == Party::Landlord;

    if tenant_signed && landlord_signed {
        // Second signature: the final artifact is re-rendered exactly once.
        Ok(ContractStep {
            next: ContractState::PendingPayment,
            tenant_signed,
            landlord_signed,
            effects: vec![
                Effect::RegenerateArtifact,
                Effect::Publish(EventKind::ContractPendingPayment),
            ],
        })
    } else {
        Ok(ContractStep {
            next: ContractState::PendingSignature,
            tenant_signed,
            landlord_signed,
            effects: vec![],
        })
    }
}
