//! Core traits for the reconciliation system
//!
//! This module defines the abstract interfaces to the remote provider.
//!
//! - [`RecordStore`]: Retrieve, create, update and delete records
//! - [`ZoneStore`]: Manage the zones records live in

pub mod record_store;
pub mod zone_store;

pub use record_store::{ProviderFactory, RecordStore};
pub use zone_store::ZoneStore;
