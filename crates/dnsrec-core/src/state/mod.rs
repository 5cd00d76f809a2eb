//! Run state
//!
//! The run state threads the outcome of each lifecycle step into the next
//! one: resource address → last-known remote state. It also remembers every
//! record that was ever created during the run, so destroy verification can
//! cover records that were replaced along the way.

pub mod file;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::record::{Record, RecordId, Zone};
use crate::resource::ResourceAddress;

pub use file::RunStateFile;

/// Which kind of remote object a resource maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Domain,
    Record,
}

/// Last-known state of a single resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub kind: ResourceKind,
    /// Remote identifier (record id, or zone name for zones)
    pub id: String,
    /// String-keyed attributes as applied
    pub attributes: BTreeMap<String, String>,
    /// When this state was last written
    pub applied_at: DateTime<Utc>,
}

impl ResourceState {
    /// State for an observed record: `name`, `domain`, `value`, `type`
    pub(crate) fn from_record(record: &Record) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("name".to_string(), record.name.clone());
        attributes.insert("domain".to_string(), record.domain.clone());
        attributes.insert("value".to_string(), record.data.clone());
        attributes.insert("type".to_string(), record.record_type.to_string());
        for (key, value) in [
            ("priority", record.priority),
            ("port", record.port),
            ("weight", record.weight),
        ] {
            if let Some(value) = value {
                attributes.insert(key.to_string(), value.to_string());
            }
        }

        Self {
            kind: ResourceKind::Record,
            id: record.id.to_string(),
            attributes,
            applied_at: Utc::now(),
        }
    }

    /// State for an observed zone: `name`, `ip_address`
    pub(crate) fn from_zone(zone: &Zone) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("name".to_string(), zone.name.clone());
        attributes.insert("ip_address".to_string(), zone.ip_address.clone());

        Self {
            kind: ResourceKind::Domain,
            id: zone.name.clone(),
            attributes,
            applied_at: Utc::now(),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn record_id(&self) -> RecordId {
        RecordId::new(self.id.clone())
    }

    /// Owning zone for records, own name for zones
    pub fn domain(&self) -> &str {
        match self.kind {
            ResourceKind::Record => self.attribute("domain").unwrap_or_default(),
            ResourceKind::Domain => &self.id,
        }
    }
}

/// A record instantiated at some point during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
    pub address: ResourceAddress,
    pub domain: String,
    pub id: RecordId,
}

/// Explicit state threaded through a lifecycle run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    resources: BTreeMap<ResourceAddress, ResourceState>,
    created: Vec<CreatedRecord>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &ResourceAddress) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    /// String-keyed attribute lookup against applied state
    pub fn attribute(&self, address: &ResourceAddress, key: &str) -> Option<&str> {
        self.resources.get(address).and_then(|r| r.attribute(key))
    }

    /// Record the outcome of a record create or update
    pub fn put_record(&mut self, address: &ResourceAddress, record: &Record) {
        let already_known = self
            .created
            .iter()
            .any(|c| c.domain == record.domain && c.id == record.id);
        if !already_known {
            self.created.push(CreatedRecord {
                address: address.clone(),
                domain: record.domain.clone(),
                id: record.id.clone(),
            });
        }
        self.resources
            .insert(address.clone(), ResourceState::from_record(record));
    }

    /// Record the outcome of a zone create
    pub fn put_zone(&mut self, address: &ResourceAddress, zone: &Zone) {
        self.resources
            .insert(address.clone(), ResourceState::from_zone(zone));
    }

    pub fn remove(&mut self, address: &ResourceAddress) -> Option<ResourceState> {
        self.resources.remove(address)
    }

    /// Addresses in teardown order: records before zones
    pub fn teardown_order(&self) -> Vec<ResourceAddress> {
        let mut addresses: Vec<_> = self.resources.iter().collect();
        addresses.sort_by_key(|(_, state)| match state.kind {
            ResourceKind::Record => 0,
            ResourceKind::Domain => 1,
        });
        addresses.into_iter().map(|(addr, _)| addr.clone()).collect()
    }

    /// Every record created during the run, including replaced ones
    pub fn created_records(&self) -> &[CreatedRecord] {
        &self.created
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
