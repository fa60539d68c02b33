//! Lock keys and fencing tokens.
//!
//! A lock key is derived deterministically from the resource kind and id, so
//! every service instance computes the same key for the same resource. The
//! token is a random value chosen at acquisition time; it proves ownership
//! and prevents a stale holder from releasing a lock it no longer owns.

use haven_core::{ContractId, LeaseId, PropertyId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A deterministic lock key of the form `lock:<kind>:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockKey(String);

impl LockKey {
    /// Key for a lease's transition lock.
    #[must_use]
    pub fn lease(lease_id: &LeaseId) -> Self {
        Self(format!("lock:lease:{lease_id}"))
    }

    /// Key for a contract's transition lock.
    #[must_use]
    pub fn contract(contract_id: &ContractId) -> Self {
        Self(format!("lock:contract:{contract_id}"))
    }

    /// Key for a property's creation lock.
    ///
    /// Lease creation locks the property rather than the (not yet existing)
    /// lease, so concurrent creations on the same property serialize.
    #[must_use]
    pub fn property(property_id: &PropertyId) -> Self {
        Self(format!("lock:property:{property_id}"))
    }

    /// Return the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A random fencing token proving current ownership of a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockToken(uuid::Uuid);

impl LockToken {
    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic() {
        let lease_id = LeaseId::generate();
        assert_eq!(LockKey::lease(&lease_id), LockKey::lease(&lease_id));

        let contract_id = ContractId::generate();
        assert_eq!(
            LockKey::contract(&contract_id),
            LockKey::contract(&contract_id)
        );
    }

    #[test]
    fn keys_carry_kind_prefix() {
        let lease_id = LeaseId::generate();
        assert!(LockKey::lease(&lease_id).as_str().starts_with("lock:lease:"));

        let property_id = PropertyId::from_bytes([3u8; 32]);
        assert!(LockKey::property(&property_id)
            .as_str()
            .starts_with("lock:property:"));
    }

    #[test]
    fn kinds_do_not_collide() {
        // Same UUID used as lease and contract id must map to distinct keys.
        let uuid = uuid::Uuid::new_v4();
        let lease_key = LockKey::lease(&LeaseId::from_uuid(uuid));
        let contract_key = LockKey::contract(&ContractId::from_uuid(uuid));
        assert_ne!(lease_key, contract_key);
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(LockToken::generate(), LockToken::generate());
    }
}
