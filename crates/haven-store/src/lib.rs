//! `RocksDB` storage layer for haven.
//!
//! This crate is the system of record for leases and contracts. It offers
//! strong read-after-write consistency for a single instance and replaces
//! records wholesale on write; the orchestrator owns all state mutation.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `leases`: Primary lease records, keyed by `lease_id`
//! - `leases_by_property`: Index for listing leases on a property
//! - `leases_by_state`: Index for listing leases by lifecycle state
//! - `contracts`: Primary contract records, keyed by `contract_id`
//! - `contracts_by_state`: Index for listing contracts by lifecycle state
//!
//! Records are never hard-deleted: terminal leases and contracts are kept
//! for audit and history, and the availability checker relies on their
//! terminal state rather than their absence.
//!
//! # Example
//!
//! ```no_run
//! use haven_store::{RocksStore, Store};
//! use haven_core::PropertyId;
//!
//! let store = RocksStore::open("/tmp/haven-db").unwrap();
//!
//! // List leases on a property
//! let property_id = PropertyId::from_bytes([0u8; 32]);
//! let leases = store.list_leases_by_property(&property_id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::{Contract, ContractState, Lease, LeaseState, Party};

use haven_core::{ContractId, LeaseId, PropertyId};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g., `RocksDB`, in-memory for testing). There are
/// deliberately no delete operations; lifecycle records are retained in
/// their terminal states.
pub trait Store: Send + Sync {
    // =========================================================================
    // Lease Operations
    // =========================================================================

    /// Insert or replace a lease record.
    ///
    /// This also maintains the property and state indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_lease(&self, lease: &Lease) -> Result<()>;

    /// Get a lease by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_lease(&self, lease_id: &LeaseId) -> Result<Option<Lease>>;

    /// List all leases referencing a property, in any state.
    ///
    /// The availability checker filters terminal states itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_leases_by_property(&self, property_id: &PropertyId) -> Result<Vec<Lease>>;

    /// List all leases in a given lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_leases_by_state(&self, state: LeaseState) -> Result<Vec<Lease>>;

    // =========================================================================
    // Contract Operations
    // =========================================================================

    /// Insert or replace a contract record.
    ///
    /// This also maintains the state index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_contract(&self, contract: &Contract) -> Result<()>;

    /// Get a contract by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_contract(&self, contract_id: &ContractId) -> Result<Option<Contract>>;

    /// List all contracts in a given lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_contracts_by_state(&self, state: ContractState) -> Result<Vec<Contract>>;
}
