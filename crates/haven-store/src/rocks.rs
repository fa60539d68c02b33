//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use haven_core::{ContractId, LeaseId, PropertyId};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::{Contract, ContractState, Lease, LeaseState};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Lease Operations
    // =========================================================================

    fn put_lease(&self, lease: &Lease) -> Result<()> {
        let cf_leases = self.cf(cf::LEASES)?;
        let cf_by_property = self.cf(cf::LEASES_BY_PROPERTY)?;
        let cf_by_state = self.cf(cf::LEASES_BY_STATE)?;

        let lease_key = keys::lease_key(&lease.lease_id);
        let property_lease_key = keys::property_lease_key(&lease.property_id, &lease.lease_id);
        let state_lease_key = keys::state_lease_key(lease.state.as_u8(), &lease.lease_id);
        let value = Self::serialize(lease)?;

        // Check if the lease exists to handle state index updates
        let old_state = self
            .db
            .get_cf(&cf_leases, &lease_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize::<Lease>(&data))
            .transpose()?
            .map(|l| l.state);

        let mut batch = WriteBatch::default();

        // Replace main record
        batch.put_cf(&cf_leases, &lease_key, &value);

        // Update property index (idempotent)
        batch.put_cf(&cf_by_property, &property_lease_key, []);

        // Update state index if state changed
        if let Some(old) = old_state {
            if old != lease.state {
                let old_state_key = keys::state_lease_key(old.as_u8(), &lease.lease_id);
                batch.delete_cf(&cf_by_state, &old_state_key);
            }
        }
        batch.put_cf(&cf_by_state, &state_lease_key, []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_lease(&self, lease_id: &LeaseId) -> Result<Option<Lease>> {
        let cf = self.cf(cf::LEASES)?;
        let key = keys::lease_key(lease_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_leases_by_property(&self, property_id: &PropertyId) -> Result<Vec<Lease>> {
        let cf_by_property = self.cf(cf::LEASES_BY_PROPERTY)?;
        let prefix = keys::property_prefix(property_id);

        let mut leases = Vec::new();
        let iter = self.db.iterator_cf(
            &cf_by_property,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            // Stop if we're past the prefix
            if !key.starts_with(&prefix) {
                break;
            }

            let lease_id = keys::extract_lease_id_from_property_lease_key(&key);
            if let Some(lease) = self.get_lease(&lease_id)? {
                leases.push(lease);
            }
        }

        Ok(leases)
    }

    fn list_leases_by_state(&self, state: LeaseState) -> Result<Vec<Lease>> {
        let cf_by_state = self.cf(cf::LEASES_BY_STATE)?;
        let prefix = keys::state_prefix(state.as_u8());

        let mut leases = Vec::new();
        let iter = self.db.iterator_cf(
            &cf_by_state,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            let lease_id = keys::extract_lease_id_from_state_key(&key);
            if let Some(lease) = self.get_lease(&lease_id)? {
                leases.push(lease);
            }
        }

        Ok(leases)
    }

    // =========================================================================
    // Contract Operations
    // =========================================================================

    fn put_contract(&self, contract: &Contract) -> Result<()> {
        let cf_contracts = self.cf(cf::CONTRACTS)?;
        let cf_by_state = self.cf(cf::CONTRACTS_BY_STATE)?;

        let contract_key = keys::contract_key(&contract.contract_id);
        let state_contract_key =
            keys::state_contract_key(contract.state.as_u8(), &contract.contract_id);
        let value = Self::serialize(contract)?;

        let old_state = self
            .db
            .get_cf(&cf_contracts, &contract_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize::<Contract>(&data))
            .transpose()?
            .map(|c| c.state);

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_contracts, &contract_key, &value);

        if let Some(old) = old_state {
            if old != contract.state {
                let old_state_key = keys::state_contract_key(old.as_u8(), &contract.contract_id);
                batch.delete_cf(&cf_by_state, &old_state_key);
            }
        }
        batch.put_cf(&cf_by_state, &state_contract_key, []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_contract(&self, contract_id: &ContractId) -> Result<Option<Contract>> {
        let cf = self.cf(cf::CONTRACTS)?;
        let key = keys::contract_key(contract_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_contracts_by_state(&self, state: ContractState) -> Result<Vec<Contract>> {
        let cf_by_state = self.cf(cf::CONTRACTS_BY_STATE)?;
        let prefix = keys::state_prefix(state.as_u8());

        let mut contracts = Vec::new();
        let iter = self.db.iterator_cf(
            &cf_by_state,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            let contract_id = keys::extract_contract_id_from_state_key(&key);
            if let Some(contract) = self.get_contract(&contract_id)? {
                contracts.push(contract);
            }
        }

        Ok(contracts)
    }
}
