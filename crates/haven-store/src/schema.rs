//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary lease records, keyed by `lease_id`.
    pub const LEASES: &str = "leases";

    /// Index: leases by property, keyed by `property_id || lease_id`.
    pub const LEASES_BY_PROPERTY: &str = "leases_by_property";

    /// Index: leases by state, keyed by `state || lease_id`.
    pub const LEASES_BY_STATE: &str = "leases_by_state";

    /// Primary contract records, keyed by `contract_id`.
    pub const CONTRACTS: &str = "contracts";

    /// Index: contracts by state, keyed by `state || contract_id`.
    pub const CONTRACTS_BY_STATE: &str = "contracts_by_state";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::LEASES,
        cf::LEASES_BY_PROPERTY,
        cf::LEASES_BY_STATE,
        cf::CONTRACTS,
        cf::CONTRACTS_BY_STATE,
    ]
}
