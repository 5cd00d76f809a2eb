// # Zone Store Trait
//
// Zones are the parents of records. A record can only be created inside a
// zone that already exists, so the lifecycle driver creates zones first and
// deletes them last.

use async_trait::async_trait;

use crate::record::Zone;

/// Trait for remote zone management
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// Create a zone
    async fn create_zone(&self, zone: &Zone) -> Result<Zone, crate::Error>;

    /// Fetch a zone by name
    ///
    /// Returns `Err(Error::NotFound)` if the zone does not exist.
    async fn retrieve_zone(&self, name: &str) -> Result<Zone, crate::Error>;

    /// Delete a zone and every record it holds
    async fn delete_zone(&self, name: &str) -> Result<(), crate::Error>;
}
