//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions to encode and decode keys for the primary
//! records and their indexes. All index keys are designed to support
//! efficient prefix scans.

use haven_core::{ContractId, LeaseId, PropertyId};

/// Encode a lease key (just the lease ID bytes).
#[must_use]
pub fn lease_key(lease_id: &LeaseId) -> Vec<u8> {
    lease_id.as_bytes().to_vec()
}

/// Encode a property-lease index key: `property_id || lease_id`.
///
/// This allows efficient prefix scans for all leases on a property.
#[must_use]
pub fn property_lease_key(property_id: &PropertyId, lease_id: &LeaseId) -> Vec<u8> {
    let mut key = Vec::with_capacity(48);
    key.extend_from_slice(property_id.as_bytes());
    key.extend_from_slice(lease_id.as_bytes());
    key
}

/// Encode a property prefix for scanning all leases on a property.
#[must_use]
pub fn property_prefix(property_id: &PropertyId) -> Vec<u8> {
    property_id.as_bytes().to_vec()
}

/// Extract the lease ID from a property-lease key.
///
/// # Panics
///
/// Panics if the key is not at least 48 bytes.
#[must_use]
pub fn extract_lease_id_from_property_lease_key(key: &[u8]) -> LeaseId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[32..48]);
    LeaseId::from_uuid(uuid::Uuid::from_bytes(bytes))
}

/// Encode a state-lease index key: `state || lease_id`.
#[must_use]
pub fn state_lease_key(state: u8, lease_id: &LeaseId) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.push(state);
    key.extend_from_slice(lease_id.as_bytes());
    key
}

/// Encode a contract key (just the contract ID bytes).
#[must_use]
pub fn contract_key(contract_id: &ContractId) -> Vec<u8> {
    contract_id.as_bytes().to_vec()
}

/// Encode a state-contract index key: `state || contract_id`.
#[must_use]
pub fn state_contract_key(state: u8, contract_id: &ContractId) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.push(state);
    key.extend_from_slice(contract_id.as_bytes());
    key
}

/// Encode a state prefix for scanning either state index.
#[must_use]
pub fn state_prefix(state: u8) -> Vec<u8> {
    vec![state]
}

/// Extract the lease ID from a state-lease key.
///
/// # Panics
///
/// Panics if the key is not at least 17 bytes.
#[must_use]
pub fn extract_lease_id_from_state_key(key: &[u8]) -> LeaseId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[1..17]);
    LeaseId::from_uuid(uuid::Uuid::from_bytes(bytes))
}

/// Extract the contract ID from a state-contract key.
///
/// # Panics
///
/// Panics if the key is not at least 17 bytes.
#[must_use]
pub fn extract_contract_id_from_state_key(key: &[u8]) -> ContractId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[1..17]);
    ContractId::from_uuid(uuid::Uuid::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_lease_key_roundtrip() {
        let property_id = PropertyId::from_bytes([1u8; 32]);
        let lease_id = LeaseId::generate();

        let key = property_lease_key(&property_id, &lease_id);
        assert_eq!(key.len(), 48);

        let extracted = extract_lease_id_from_property_lease_key(&key);
        assert_eq!(extracted, lease_id);
    }

    #[test]
    fn state_key_roundtrip() {
        let lease_id = LeaseId::generate();
        let key = state_lease_key(2, &lease_id);
        assert_eq!(key.len(), 17);
        assert_eq!(extract_lease_id_from_state_key(&key), lease_id);

        let contract_id = ContractId::generate();
        let key = state_contract_key(4, &contract_id);
        assert_eq!(extract_contract_id_from_state_key(&key), contract_id);
    }

    #[test]
    fn prefix_scan_simulation() {
        let property_id = PropertyId::from_bytes([1u8; 32]);
        let lease1 = LeaseId::generate();
        let lease2 = LeaseId::generate();

        let key1 = property_lease_key(&property_id, &lease1);
        let key2 = property_lease_key(&property_id, &lease2);
        let prefix = property_prefix(&property_id);

        // Both keys should start with the property prefix
        assert!(key1.starts_with(&prefix));
        assert!(key2.starts_with(&prefix));
    }
}
