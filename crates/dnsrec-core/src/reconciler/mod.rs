//! Record reconciler
//!
//! The reconciler converges one remote record towards its declared state.
//! It is responsible for:
//! - Deciding which operation a declaration needs ([`RecordReconciler::plan`])
//! - Issuing one mutation per call ([`RecordReconciler::ensure`],
//!   [`RecordReconciler::destroy`]); a type change is the only exception and
//!   costs a delete followed by a create
//! - Mapping store failures onto the create/update/delete taxonomy
//!
//! ## Decision Table
//!
//! ```text
//! prior state            declared change          action
//! ─────────────────────  ───────────────────────  ─────────
//! none                   -                        Create
//! exists                 type or domain differs   Replace
//! exists                 name or data differs     Update
//! exists                 nothing differs          NoChange
//! ```
//!
//! Retries are not the reconciler's business: a failed call is reported once
//! and the caller decides what happens next.

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{DesiredRecord, Record, RecordId};
use crate::traits::RecordStore;

/// What it takes to converge a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// No record exists yet
    Create,
    /// Mutable fields differ; update in place, keeping the id
    Update,
    /// Immutable fields differ; delete and recreate with a new id
    Replace,
    /// Remote state already matches
    NoChange,
}

/// Converges individual records against a remote store
pub struct RecordReconciler {
    store: Arc<dyn RecordStore>,
}

impl RecordReconciler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Decide the operation needed to move `prior` to `desired`
    pub fn plan(&self, desired: &DesiredRecord, prior: Option<&Record>) -> ReconcileAction {
        let action = match prior {
            None => ReconcileAction::Create,
            Some(prior)
                if prior.record_type != desired.record_type || prior.domain != desired.domain =>
            {
                ReconcileAction::Replace
            }
            Some(prior) if prior.name != desired.name || prior.data != desired.data => {
                ReconcileAction::Update
            }
            Some(_) => ReconcileAction::NoChange,
        };

        debug!(
            "Planned {:?} for {} record {} in {}",
            action, desired.record_type, desired.name, desired.domain
        );
        action
    }

    /// Create the record, or update it in place when `existing_id` is given
    ///
    /// The record type is immutable remotely. When `existing_id` names a
    /// record of another type, that record is deleted and a new one is
    /// created, so the returned id differs from `existing_id`.
    ///
    /// # Errors
    ///
    /// - `Error::Create`: validation failed or the store rejected the create
    /// - `Error::NotFound`: `existing_id` no longer exists remotely
    /// - `Error::Update`: validation failed or the store rejected the update
    pub async fn ensure(
        &self,
        desired: &DesiredRecord,
        existing_id: Option<&RecordId>,
    ) -> Result<Record> {
        match existing_id {
            None => self.create(desired).await,
            Some(id) => self.update(desired, id).await,
        }
    }

    async fn create(&self, desired: &DesiredRecord) -> Result<Record> {
        desired
            .validate()
            .map_err(|e| Error::create(&desired.domain, &desired.name, e))?;

        let record = self
            .store
            .create_record(&desired.domain, &desired.request())
            .await
            .map_err(|e| Error::create(&desired.domain, &desired.name, e))?;

        if record.id.is_empty() {
            return Err(Error::create(
                &desired.domain,
                &desired.name,
                "store returned a record without an ID",
            ));
        }

        info!(
            "Created {} record {} in {} (id: {}, via {})",
            record.record_type,
            record.name,
            record.domain,
            record.id,
            self.store.provider_name()
        );
        Ok(record)
    }

    async fn update(&self, desired: &DesiredRecord, id: &RecordId) -> Result<Record> {
        desired
            .validate()
            .map_err(|e| Error::update(&desired.domain, id, e))?;

        let prior = self
            .store
            .retrieve_record(&desired.domain, id)
            .await
            .map_err(|e| match e {
                Error::NotFound(msg) => Error::NotFound(msg),
                other => Error::update(&desired.domain, id, other),
            })?;

        if prior.record_type != desired.record_type {
            return self.recreate(desired, &prior).await;
        }

        let record = self
            .store
            .update_record(&desired.domain, id, &desired.update())
            .await
            .map_err(|e| match e {
                Error::NotFound(msg) => Error::NotFound(msg),
                other => Error::update(&desired.domain, id, other),
            })?;

        info!(
            "Updated record {} in {} -> {} (id: {})",
            record.name, record.domain, record.data, record.id
        );
        Ok(record)
    }

    async fn recreate(&self, desired: &DesiredRecord, prior: &Record) -> Result<Record> {
        info!(
            "Record {} in {} changes type {} -> {}, recreating",
            prior.id, prior.domain, prior.record_type, desired.record_type
        );

        self.store
            .delete_record(&prior.domain, &prior.id)
            .await
            .map_err(|e| Error::update(&desired.domain, &prior.id, e))?;

        self.create(desired).await
    }

    /// Read a record back; `None` means it vanished remotely
    pub async fn refresh(&self, domain: &str, id: &RecordId) -> Result<Option<Record>> {
        match self.store.retrieve_record(domain, id).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => {
                debug!("Record {} in {} no longer exists", id, domain);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a record
    ///
    /// # Errors
    ///
    /// - `Error::NotFound`: the record was already gone
    /// - `Error::Delete`: the store rejected the delete
    pub async fn destroy(&self, domain: &str, id: &RecordId) -> Result<()> {
        self.store
            .delete_record(domain, id)
            .await
            .map_err(|e| match e {
                Error::NotFound(msg) => Error::NotFound(msg),
                other => Error::delete(domain, id, other),
            })?;

        info!("Deleted record {} in {}", id, domain);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordType, Zone};
    use crate::store::MemoryStore;
    use crate::traits::ZoneStore;

    async fn reconciler() -> (RecordReconciler, MemoryStore) {
        let store = MemoryStore::new();
        store
            .create_zone(&Zone::new("example.com", "192.168.0.10"))
            .await
            .unwrap();
        (RecordReconciler::new(Arc::new(store.clone())), store)
    }

    fn desired(data: &str) -> DesiredRecord {
        DesiredRecord::new("example.com", "terraform", RecordType::A, data)
    }

    #[tokio::test]
    async fn test_plan_decisions() {
        let (reconciler, _) = reconciler().await;
        let prior = reconciler.ensure(&desired("10.0.0.1"), None).await.unwrap();

        assert_eq!(reconciler.plan(&desired("10.0.0.1"), None), ReconcileAction::Create);
        assert_eq!(
            reconciler.plan(&desired("10.0.0.1"), Some(&prior)),
            ReconcileAction::NoChange
        );
        assert_eq!(
            reconciler.plan(&desired("10.0.0.2"), Some(&prior)),
            ReconcileAction::Update
        );

        let mut renamed = desired("10.0.0.1");
        renamed.name = "other".to_string();
        assert_eq!(reconciler.plan(&renamed, Some(&prior)), ReconcileAction::Update);

        let cname = DesiredRecord::new("example.com", "terraform", RecordType::Cname, "a.b");
        assert_eq!(reconciler.plan(&cname, Some(&prior)), ReconcileAction::Replace);

        let moved = DesiredRecord::new("example.net", "terraform", RecordType::A, "10.0.0.1");
        assert_eq!(reconciler.plan(&moved, Some(&prior)), ReconcileAction::Replace);
    }

    #[tokio::test]
    async fn test_refresh_maps_missing_to_none() {
        let (reconciler, _) = reconciler().await;
        let record = reconciler.ensure(&desired("10.0.0.1"), None).await.unwrap();

        assert!(reconciler
            .refresh("example.com", &record.id)
            .await
            .unwrap()
            .is_some());

        reconciler.destroy("example.com", &record.id).await.unwrap();
        assert!(reconciler
            .refresh("example.com", &record.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_destroy_missing_is_not_found() {
        let (reconciler, _) = reconciler().await;
        let err = reconciler
            .destroy("example.com", &RecordId::from(999u64))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
