//! Request types and configuration for lifecycle operations.

use chrono::{DateTime, Utc};
use haven_core::{PartyId, PropertyId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request to create a new lease on a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLeaseRequest {
    /// The property to lease.
    pub property_id: PropertyId,
    /// The tenant party.
    pub tenant_id: PartyId,
    /// The landlord party.
    pub landlord_id: PartyId,
    /// Start of the occupied interval (inclusive).
    pub start_date: DateTime<Utc>,
    /// End of the occupied interval (exclusive).
    pub end_date: DateTime<Utc>,
}

/// Request to create a new contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContractRequest {
    /// The property the contract covers.
    pub property_id: PropertyId,
    /// The tenant party.
    pub tenant_id: PartyId,
    /// The landlord party.
    pub landlord_id: PartyId,
    /// Contract term start (inclusive).
    pub start_date: DateTime<Utc>,
    /// Contract term end (exclusive).
    pub end_date: DateTime<Utc>,
}

/// Term for the successor contract created by a renewal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewContractRequest {
    /// New term start (inclusive).
    pub start_date: DateTime<Utc>,
    /// New term end (exclusive).
    pub end_date: DateTime<Utc>,
}

/// Configuration for the lifecycle service.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Lifetime of a transition lock. Must exceed the worst-case
    /// store-round-trip span of a critical section; TTL expiry is the only
    /// recovery when a holder crashes mid-transition.
    pub lock_ttl: Duration,
    /// Lifetime of a cached resource record. Bounds staleness only; the
    /// store stays the source of truth.
    pub cache_ttl: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = ControlConfig::default();
        assert_eq!(config.lock_ttl, Duration::from_secs(30));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn requests_serialize() {
        let request = CreateLeaseRequest {
            property_id: PropertyId::from_bytes([1u8; 32]),
            tenant_id: PartyId::from_bytes([2u8; 32]),
            landlord_id: PartyId::from_bytes([3u8; 32]),
            start_date: Utc::now(),
            end_date: Utc::now(),
        };

        let json = serde_json::to_string(&request).unwrap();
        let parsed: CreateLeaseRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.property_id, request.property_id);
    }
}
