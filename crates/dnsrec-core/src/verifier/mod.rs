//! State verifier
//!
//! Re-fetches records from the remote store and asserts identity, attribute
//! correctness and destruction. Every check performs a fresh retrieve.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{DestroyCheck, VerifierConfig};
use crate::error::{Error, Result};
use crate::record::{Record, RecordId};
use crate::traits::RecordStore;

/// Attributes a verified record must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedAttributes {
    pub data: String,
}

impl ExpectedAttributes {
    pub fn data(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

/// Verifies remote state against run state
pub struct StateVerifier {
    store: Arc<dyn RecordStore>,
    destroy_check: DestroyCheck,
}

impl StateVerifier {
    pub fn new(store: Arc<dyn RecordStore>, config: &VerifierConfig) -> Self {
        Self {
            store,
            destroy_check: config.destroy_check,
        }
    }

    /// Fetch the record and confirm it is the one run state points at
    pub async fn verify_exists(&self, domain: &str, record_id: &RecordId) -> Result<Record> {
        if record_id.is_empty() {
            return Err(Error::not_found("No Record ID is set"));
        }

        let record = self.store.retrieve_record(domain, record_id).await?;
        if record.id != *record_id {
            return Err(Error::not_found(format!(
                "Record not found: expected ID {}, store returned {}",
                record_id, record.id
            )));
        }

        debug!("Verified record {} exists in {}", record_id, domain);
        Ok(record)
    }

    /// Compare the record's data with the expected value
    ///
    /// Only `data` is compared; name, domain and type are checked against
    /// run state attributes by the driver.
    pub fn verify_attributes(&self, record: &Record, expected: &ExpectedAttributes) -> Result<()> {
        if record.data != expected.data {
            return Err(Error::mismatch("data", &expected.data, &record.data));
        }
        Ok(())
    }

    /// Confirm the record can no longer be retrieved
    pub async fn verify_destroyed(&self, domain: &str, record_id: &RecordId) -> Result<()> {
        match self.store.retrieve_record(domain, record_id).await {
            Ok(_) => Err(Error::StillExists {
                domain: domain.to_string(),
                id: record_id.to_string(),
            }),
            Err(e) if e.is_not_found() => {
                debug!("Verified record {} in {} is destroyed", record_id, domain);
                Ok(())
            }
            Err(e) => match self.destroy_check {
                DestroyCheck::Strict => Err(e),
                DestroyCheck::Loose => {
                    warn!(
                        "Treating retrieval error for record {} in {} as destroyed: {}",
                        record_id, domain, e
                    );
                    Ok(())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordRequest, RecordType, Zone};
    use crate::store::MemoryStore;
    use crate::traits::ZoneStore;

    async fn seeded() -> (StateVerifier, Record) {
        let store = MemoryStore::new();
        store
            .create_zone(&Zone::new("example.com", "192.168.0.10"))
            .await
            .unwrap();
        let record = store
            .create_record(
                "example.com",
                &RecordRequest {
                    name: "terraform".to_string(),
                    record_type: RecordType::A,
                    data: "192.168.0.10".to_string(),
                    priority: None,
                    port: None,
                    weight: None,
                },
            )
            .await
            .unwrap();
        let verifier = StateVerifier::new(Arc::new(store), &VerifierConfig::default());
        (verifier, record)
    }

    #[tokio::test]
    async fn test_verify_exists_returns_record() {
        let (verifier, record) = seeded().await;
        let found = verifier.verify_exists("example.com", &record.id).await.unwrap();
        assert_eq!(found, record);
    }

    #[tokio::test]
    async fn test_verify_exists_rejects_empty_id() {
        let (verifier, _) = seeded().await;
        let err = verifier
            .verify_exists("example.com", &RecordId::new(""))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not found: No Record ID is set");
    }

    #[tokio::test]
    async fn test_verify_exists_missing_record_is_not_found() {
        let (verifier, _) = seeded().await;
        let err = verifier
            .verify_exists("example.com", &RecordId::from(4242u64))
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_verify_attributes_reports_mismatch() {
        let (verifier, record) = seeded().await;
        assert!(verifier
            .verify_attributes(&record, &ExpectedAttributes::data("192.168.0.10"))
            .is_ok());

        match verifier.verify_attributes(&record, &ExpectedAttributes::data("192.168.0.11")) {
            Err(Error::AttributeMismatch {
                field,
                expected,
                actual,
            }) => {
                assert_eq!(field, "data");
                assert_eq!(expected, "192.168.0.11");
                assert_eq!(actual, "192.168.0.10");
            }
            other => panic!("expected attribute mismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_verify_destroyed_fails_for_live_record() {
        let (verifier, record) = seeded().await;
        let err = verifier
            .verify_destroyed("example.com", &record.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StillExists { .. }));
    }
}
