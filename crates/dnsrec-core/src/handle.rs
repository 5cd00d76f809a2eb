//! Typed provider handle
//!
//! Every component that talks to the remote provider receives a
//! [`ProviderHandle`] explicitly. The handle is cheap to clone and exposes the
//! record and zone halves of the provider as separate trait objects.

use std::fmt;
use std::sync::Arc;

use crate::traits::{RecordStore, ZoneStore};

/// Shared access to a remote provider
#[derive(Clone)]
pub struct ProviderHandle {
    records: Arc<dyn RecordStore>,
    zones: Arc<dyn ZoneStore>,
}

impl ProviderHandle {
    /// Build a handle from a single implementation of both store traits
    pub fn new<T>(provider: T) -> Self
    where
        T: RecordStore + ZoneStore + 'static,
    {
        Self::from_arc(Arc::new(provider))
    }

    /// Build a handle from a shared implementation, keeping the caller's `Arc`
    pub fn from_arc<T>(provider: Arc<T>) -> Self
    where
        T: RecordStore + ZoneStore + 'static,
    {
        Self {
            records: provider.clone(),
            zones: provider,
        }
    }

    pub fn records(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.records)
    }

    pub fn zones(&self) -> Arc<dyn ZoneStore> {
        Arc::clone(&self.zones)
    }

    pub fn provider_name(&self) -> &'static str {
        self.records.provider_name()
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("provider", &self.provider_name())
            .finish()
    }
}
