// # dnsrec-core
//
// Core library for DNS record reconciliation and lifecycle verification.
//
// ## Architecture Overview
//
// - **RecordStore / ZoneStore**: Traits for the remote DNS provider
// - **RecordReconciler**: Converges one record towards its declared state
// - **StateVerifier**: Re-fetches records and asserts identity, data and destruction
// - **LifecycleDriver**: Runs multi-step test cases from creation to verified destruction
// - **ProviderRegistry**: Plugin-based registry building typed provider handles
//
// ## Design Principles
//
// 1. **Explicit context**: Providers reach components through a `ProviderHandle`, never a global
// 2. **One mutation per call**: No hidden retries inside the reconciler
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: The acceptance binary is a thin wrapper over this crate

pub mod config;
pub mod driver;
pub mod error;
pub mod handle;
pub mod reconciler;
pub mod record;
pub mod registry;
pub mod resource;
pub mod scenarios;
pub mod state;
pub mod store;
pub mod traits;
pub mod verifier;

// Re-export core types for convenience
pub use config::{DestroyCheck, DriverConfig, ProviderConfig, VerifierConfig};
pub use driver::{LifecycleDriver, LifecycleEvent, LifecyclePhase, RunReport};
pub use error::{Error, Result};
pub use handle::ProviderHandle;
pub use reconciler::{ReconcileAction, RecordReconciler};
pub use record::{DesiredRecord, Record, RecordId, RecordType, Zone};
pub use registry::ProviderRegistry;
pub use state::{RunState, RunStateFile};
pub use store::MemoryStore;
pub use traits::{RecordStore, ZoneStore};
pub use verifier::StateVerifier;
