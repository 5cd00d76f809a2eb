//! Test doubles and common utilities for contract tests
//!
//! [`InstrumentedStore`] wraps a [`MemoryStore`], counts every call it
//! receives and can be told to fail specific operations.

#![allow(dead_code)]

use async_trait::async_trait;
use dnsrec_core::error::{Error, Result};
use dnsrec_core::record::{Record, RecordId, RecordRequest, RecordUpdate, Zone};
use dnsrec_core::traits::{RecordStore, ZoneStore};
use dnsrec_core::{MemoryStore, ProviderHandle};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Failure modes a test can switch on
#[derive(Default)]
pub struct Faults {
    /// Reject every create with a provider error
    pub reject_create: AtomicBool,
    /// Reject every update with a provider error
    pub reject_update: AtomicBool,
    /// Reject every delete with a provider error
    pub reject_delete: AtomicBool,
    /// Report deletes as successful without removing anything
    pub ignore_delete: AtomicBool,
    /// Fail every retrieve with a transport error
    pub retrieve_transport_error: AtomicBool,
    /// Answer every retrieve with the record under a different id
    pub retrieve_foreign_id: AtomicBool,
}

/// Call counters, shared between clones
#[derive(Default)]
pub struct Calls {
    pub retrieve: AtomicUsize,
    pub create: AtomicUsize,
    pub update: AtomicUsize,
    pub delete: AtomicUsize,
}

impl Calls {
    /// Number of mutating calls (create + update + delete)
    pub fn mutations(&self) -> usize {
        self.create.load(Ordering::SeqCst)
            + self.update.load(Ordering::SeqCst)
            + self.delete.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.create.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.update.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.delete.load(Ordering::SeqCst)
    }

    pub fn retrieves(&self) -> usize {
        self.retrieve.load(Ordering::SeqCst)
    }
}

/// A MemoryStore that tracks calls and injects failures
#[derive(Clone, Default)]
pub struct InstrumentedStore {
    pub inner: MemoryStore,
    pub calls: Arc<Calls>,
    pub faults: Arc<Faults>,
}

impl InstrumentedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle sharing this store's data, counters and faults
    pub fn handle(&self) -> ProviderHandle {
        ProviderHandle::new(self.clone())
    }

    pub fn set(&self, fault: &AtomicBool, on: bool) {
        fault.store(on, Ordering::SeqCst);
    }
}

fn rejected(operation: &str) -> Error {
    Error::provider("instrumented", format!("{} rejected", operation))
}

#[async_trait]
impl RecordStore for InstrumentedStore {
    async fn retrieve_record(&self, domain: &str, id: &RecordId) -> Result<Record> {
        self.calls.retrieve.fetch_add(1, Ordering::SeqCst);
        if self.faults.retrieve_transport_error.load(Ordering::SeqCst) {
            return Err(Error::http("connection reset by peer"));
        }
        let mut record = self.inner.retrieve_record(domain, id).await?;
        if self.faults.retrieve_foreign_id.load(Ordering::SeqCst) {
            record.id = RecordId::new(format!("{}0", record.id));
        }
        Ok(record)
    }

    async fn create_record(&self, domain: &str, request: &RecordRequest) -> Result<Record> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        if self.faults.reject_create.load(Ordering::SeqCst) {
            return Err(rejected("create"));
        }
        self.inner.create_record(domain, request).await
    }

    async fn update_record(
        &self,
        domain: &str,
        id: &RecordId,
        update: &RecordUpdate,
    ) -> Result<Record> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        if self.faults.reject_update.load(Ordering::SeqCst) {
            return Err(rejected("update"));
        }
        self.inner.update_record(domain, id, update).await
    }

    async fn delete_record(&self, domain: &str, id: &RecordId) -> Result<()> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        if self.faults.reject_delete.load(Ordering::SeqCst) {
            return Err(rejected("delete"));
        }
        if self.faults.ignore_delete.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.inner.delete_record(domain, id).await
    }

    fn provider_name(&self) -> &'static str {
        "instrumented"
    }
}

#[async_trait]
impl ZoneStore for InstrumentedStore {
    async fn create_zone(&self, zone: &Zone) -> Result<Zone> {
        self.inner.create_zone(zone).await
    }

    async fn retrieve_zone(&self, name: &str) -> Result<Zone> {
        self.inner.retrieve_zone(name).await
    }

    async fn delete_zone(&self, name: &str) -> Result<()> {
        if self.faults.ignore_delete.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.inner.delete_zone(name).await
    }
}

/// Zone used by the contract tests
pub const ZONE: &str = "example.com";

/// A store with [`ZONE`] already created
pub async fn seeded_store() -> InstrumentedStore {
    let store = InstrumentedStore::new();
    store
        .inner
        .create_zone(&Zone::new(ZONE, "192.168.0.10"))
        .await
        .unwrap();
    store
}
