// # Memory Store
//
// In-memory implementation of RecordStore and ZoneStore.
//
// ## Purpose
//
// Provides a fast, fully local stand-in for a remote DNS provider. It follows
// the same contract a real provider does:
//
// - Records can only be created in zones that exist
// - Ids are assigned on creation and never reused within a store
// - Missing `(domain, id)` pairs are reported as `Error::NotFound`
// - Values are stored verbatim
//
// ## When to Use
//
// - Testing environments
// - Offline lifecycle runs (`DNSREC_PROVIDER_TYPE=memory`)

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::record::{Record, RecordId, RecordRequest, RecordUpdate, Zone};
use crate::traits::{RecordStore, ZoneStore};
use crate::Error;

#[derive(Debug, Default)]
struct Inner {
    zones: HashMap<String, Zone>,
    records: HashMap<String, BTreeMap<RecordId, Record>>,
    next_id: u64,
}

/// In-memory provider implementation
///
/// All zones and records live in maps protected by a RwLock. Clones share
/// the same underlying data.
///
/// # Example
///
/// ```rust,no_run
/// use dnsrec_core::record::{RecordRequest, RecordType, Zone};
/// use dnsrec_core::store::MemoryStore;
/// use dnsrec_core::traits::{RecordStore, ZoneStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStore::new();
///     store.create_zone(&Zone::new("example.com", "192.168.0.10")).await?;
///
///     let request = RecordRequest {
///         name: "www".to_string(),
///         record_type: RecordType::A,
///         data: "192.168.0.10".to_string(),
///         priority: None,
///         port: None,
///         weight: None,
///     };
///     let record = store.create_record("example.com", &request).await?;
///     assert_eq!(store.retrieve_record("example.com", &record.id).await?, record);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of records across all zones
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.values().map(BTreeMap::len).sum()
    }

    /// Check if the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Get the number of zones
    pub async fn zone_count(&self) -> usize {
        self.inner.read().await.zones.len()
    }

    /// List all records in a zone, ordered by id
    pub async fn records_in(&self, domain: &str) -> Vec<Record> {
        let guard = self.inner.read().await;
        guard
            .records
            .get(domain)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }
}

fn record_not_found(domain: &str, id: &RecordId) -> Error {
    Error::not_found(format!("record {} in domain {}", id, domain))
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn retrieve_record(&self, domain: &str, id: &RecordId) -> Result<Record, Error> {
        let guard = self.inner.read().await;
        guard
            .records
            .get(domain)
            .and_then(|records| records.get(id))
            .cloned()
            .ok_or_else(|| record_not_found(domain, id))
    }

    async fn create_record(&self, domain: &str, request: &RecordRequest) -> Result<Record, Error> {
        let mut guard = self.inner.write().await;
        if !guard.zones.contains_key(domain) {
            return Err(Error::not_found(format!("domain {}", domain)));
        }

        guard.next_id += 1;
        let record = Record {
            id: RecordId::from(guard.next_id),
            domain: domain.to_string(),
            name: request.name.clone(),
            record_type: request.record_type,
            data: request.data.clone(),
            priority: request.priority,
            port: request.port,
            weight: request.weight,
        };

        guard
            .records
            .entry(domain.to_string())
            .or_default()
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        domain: &str,
        id: &RecordId,
        update: &RecordUpdate,
    ) -> Result<Record, Error> {
        let mut guard = self.inner.write().await;
        let record = guard
            .records
            .get_mut(domain)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| record_not_found(domain, id))?;

        record.name = update.name.clone();
        record.data = update.data.clone();
        Ok(record.clone())
    }

    async fn delete_record(&self, domain: &str, id: &RecordId) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard
            .records
            .get_mut(domain)
            .and_then(|records| records.remove(id))
            .map(|_| ())
            .ok_or_else(|| record_not_found(domain, id))
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl ZoneStore for MemoryStore {
    async fn create_zone(&self, zone: &Zone) -> Result<Zone, Error> {
        let mut guard = self.inner.write().await;
        if guard.zones.contains_key(&zone.name) {
            return Err(Error::invalid_input(format!(
                "domain {} already exists",
                zone.name
            )));
        }
        guard.zones.insert(zone.name.clone(), zone.clone());
        Ok(zone.clone())
    }

    async fn retrieve_zone(&self, name: &str) -> Result<Zone, Error> {
        let guard = self.inner.read().await;
        guard
            .zones
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("domain {}", name)))
    }

    async fn delete_zone(&self, name: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        if guard.zones.remove(name).is_none() {
            return Err(Error::not_found(format!("domain {}", name)));
        }
        guard.records.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordType;

    fn a_record(name: &str, data: &str) -> RecordRequest {
        RecordRequest {
            name: name.to_string(),
            record_type: RecordType::A,
            data: data.to_string(),
            priority: None,
            port: None,
            weight: None,
        }
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        store
            .create_zone(&Zone::new("example.com", "192.168.0.10"))
            .await
            .unwrap();

        assert!(store.is_empty().await);

        let created = store
            .create_record("example.com", &a_record("www", "192.168.0.10"))
            .await
            .unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(store.len().await, 1);

        let fetched = store.retrieve_record("example.com", &created.id).await.unwrap();
        assert_eq!(fetched, created);

        store.delete_record("example.com", &created.id).await.unwrap();
        let err = store
            .retrieve_record("example.com", &created.id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_requires_existing_zone() {
        let store = MemoryStore::new();
        let err = store
            .create_record("missing.com", &a_record("www", "10.0.0.1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_ids_are_distinct() {
        let store = MemoryStore::new();
        store
            .create_zone(&Zone::new("example.com", "10.0.0.1"))
            .await
            .unwrap();

        let first = store
            .create_record("example.com", &a_record("www", "10.0.0.1"))
            .await
            .unwrap();
        let second = store
            .create_record("example.com", &a_record("www", "10.0.0.1"))
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_delete_zone_removes_records() {
        let store = MemoryStore::new();
        store
            .create_zone(&Zone::new("example.com", "10.0.0.1"))
            .await
            .unwrap();
        store
            .create_record("example.com", &a_record("www", "10.0.0.1"))
            .await
            .unwrap();

        store.delete_zone("example.com").await.unwrap();
        assert!(store.is_empty().await);
        assert_eq!(store.zone_count().await, 0);
    }
}
