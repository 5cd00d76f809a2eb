// # Record Store Trait
//
// Defines the interface to the remote service that hosts DNS records.
//
// ## Implementations
//
// - In-memory: `dnsrec_core::store::MemoryStore`
// - DigitalOcean: `dnsrec-provider-digitalocean` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsrec_core::traits::RecordStore;
// use dnsrec_core::record::{RecordRequest, RecordType};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* RecordStore implementation */;
//
//     let created = store.create_record("example.com", &request).await?;
//     let fetched = store.retrieve_record("example.com", &created.id).await?;
//     assert_eq!(created, fetched);
//
//     store.delete_record("example.com", &created.id).await?;
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::record::{Record, RecordId, RecordRequest, RecordUpdate};

/// Trait for remote record store implementations
///
/// Records are addressed by `(domain, id)`. The id is assigned by the store on
/// creation and never changes afterwards.
///
/// # Trust Level: Untrusted
///
/// Stores are external integrations with strict limitations:
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Decide whether a create or an update is needed (owned by `RecordReconciler`)
/// - ❌ Cache records between calls (every verification is a fresh read)
/// - ❌ Normalize record data (values are stored verbatim)
/// - ❌ Spawn tasks or threads
///
/// ## Error Contract
///
/// A missing `(domain, id)` must be reported as [`crate::Error::NotFound`] so
/// callers can tell it apart from transport failures.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a single record
    ///
    /// # Returns
    ///
    /// - `Ok(Record)`: The record as currently stored
    /// - `Err(Error::NotFound)`: No such record
    /// - `Err(Error)`: Transport or provider failure
    async fn retrieve_record(&self, domain: &str, id: &RecordId) -> Result<Record, crate::Error>;

    /// Create a record in an existing zone
    ///
    /// Not idempotent: two calls create two records with distinct ids.
    async fn create_record(
        &self,
        domain: &str,
        request: &RecordRequest,
    ) -> Result<Record, crate::Error>;

    /// Update the mutable fields of an existing record
    async fn update_record(
        &self,
        domain: &str,
        id: &RecordId,
        update: &RecordUpdate,
    ) -> Result<Record, crate::Error>;

    /// Delete a record
    async fn delete_record(&self, domain: &str, id: &RecordId) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing provider handles from configuration
pub trait ProviderFactory: Send + Sync {
    /// Create a handle from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<crate::handle::ProviderHandle, crate::Error>;
}
