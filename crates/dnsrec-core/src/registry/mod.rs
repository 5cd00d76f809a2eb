//! Plugin-based provider registry
//!
//! Providers register a factory under their type name; a [`ProviderConfig`]
//! then selects the factory by [`ProviderConfig::type_name`]. The core crate
//! registers the in-memory provider itself, provider crates register their own:
//!
//! ```rust,ignore
//! use dnsrec_core::registry::ProviderRegistry;
//!
//! let registry = ProviderRegistry::with_builtin();
//! dnsrec_provider_digitalocean::register(&registry);
//!
//! let handle = registry.create_provider(&config)?;
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::handle::ProviderHandle;
use crate::store::MemoryStore;
use crate::traits::ProviderFactory;

/// Factory for [`MemoryStore`] providers
pub struct MemoryFactory;

impl ProviderFactory for MemoryFactory {
    fn create(&self, config: &ProviderConfig) -> Result<ProviderHandle> {
        match config {
            ProviderConfig::Memory => Ok(ProviderHandle::new(MemoryStore::new())),
            other => Err(Error::config(format!(
                "memory factory cannot build a '{}' provider",
                other.type_name()
            ))),
        }
    }
}

/// Provider registry keyed by provider type name
///
/// Uses interior mutability with RwLock, allowing concurrent reads and
/// exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Box<dyn ProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the providers shipped in this crate (`memory`)
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_provider("memory", Box::new(MemoryFactory));
        registry
    }

    /// Register a provider factory, replacing any previous one under `name`
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn ProviderFactory>) {
        let name = name.into();
        match self.providers.write() {
            Ok(mut providers) => {
                tracing::debug!("Registered provider factory: {}", name);
                providers.insert(name, factory);
            }
            Err(_) => tracing::error!("Provider registry lock poisoned; {} not registered", name),
        }
    }

    /// Build a provider handle from configuration
    ///
    /// # Errors
    ///
    /// - `Error::Config`: the configuration is invalid or its type is not registered
    /// - any error the factory itself returns
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<ProviderHandle> {
        config.validate()?;

        let provider_type = config.type_name();
        let providers = self
            .providers
            .read()
            .map_err(|_| Error::Other("provider registry lock poisoned".to_string()))?;

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .read()
            .map(|providers| providers.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers
            .read()
            .map(|providers| providers.contains_key(name))
            .unwrap_or(false)
    }
}
