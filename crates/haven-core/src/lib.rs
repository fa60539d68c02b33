//! Core types and utilities for haven.
//!
//! This crate provides the foundational types used throughout the haven
//! rental platform:
//!
//! - **Identifiers**: Strongly-typed IDs for parties, properties, leases, and contracts
//! - **Parse errors**: [`IdError`] for malformed identifier input
//!
//! # Example
//!
//! ```
//! use haven_core::{PartyId, PropertyId, LeaseId, ContractId};
//!
//! // Parse a party ID from hex
//! let tenant = PartyId::from_hex(
//!     "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef"
//! ).unwrap();
//!
//! // Generate lease and contract IDs
//! let lease_id = LeaseId::generate();
//! let contract_id = ContractId::generate();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;

pub use ids::{ContractId, IdError, LeaseId, PartyId, PropertyId};
