//! Lifecycle control core for the haven rental platform.
//!
//! This crate provides the business logic for lease and contract
//! lifecycles. It coordinates the storage layer, the per-resource lock
//! table, the read cache, and the post-commit side effects (artifact
//! rendering, event publication).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API surface (caller)                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      LifecycleService                       │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │   Lease     │ │  Contract   │ │    Availability     │    │
//! │  │   Machine   │ │  Machine    │ │    (overlap)        │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!          │                │                    │
//!          ▼                ▼                    ▼
//!   ┌──────────┐     ┌──────────┐        ┌─────────────┐
//!   │  Store   │     │  Locks   │        │  Publisher  │
//!   │ (RocksDB)│     │ (fenced) │        │  Renderer   │
//!   └──────────┘     └──────────┘        └─────────────┘
//! ```
//!
//! Every mutation runs the same way: take the resource's lock (failing
//! fast with `ResourceBusy`), consult the pure state machine, persist,
//! release, and only then run side effects best-effort.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::{TimeZone, Utc};
//! use haven_control::{CreateLeaseRequest, LeaseAction, LifecycleService};
//! use haven_core::{PartyId, PropertyId};
//! use haven_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/var/lib/haven")?);
//! let service = LifecycleService::with_defaults(store);
//!
//! let lease = service
//!     .create_lease(CreateLeaseRequest {
//!         property_id: PropertyId::from_bytes([0u8; 32]),
//!         tenant_id: PartyId::from_bytes([1u8; 32]),
//!         landlord_id: PartyId::from_bytes([2u8; 32]),
//!         start_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
//!         end_date: Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap(),
//!     })
//!     .await?;
//!
//! let lease = service.apply_lease(&lease.lease_id, LeaseAction::Approve).await?;
//! println!("Lease {} is now {:?}", lease.lease_id, lease.state);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod contract;
pub mod error;
pub mod events;
pub mod lease;
pub mod overlap;
pub mod render;
pub mod service;
pub mod types;

pub use contract::{ContractAction, ContractStep};
pub use error::{ControlError, Result};
pub use events::{Effect, EventKind, EventPublisher, LifecycleEvent, LogPublisher, PublishError};
pub use lease::{LeaseAction, LeaseStep};
pub use render::{DocumentRenderer, NoopRenderer, RenderError};
pub use service::LifecycleService;
pub use types::{
    ControlConfig, CreateContractRequest, CreateLeaseRequest, RenewContractRequest,
};
