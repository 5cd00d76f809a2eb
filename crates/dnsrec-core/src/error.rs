//! Error types for the record reconciliation core
//!
//! Every component in the workspace reports failures through [`Error`].
//! Variants fall into two groups: the reconciliation taxonomy (create, update,
//! delete, not-found, attribute mismatch, still-exists) and the ambient
//! transport/configuration errors a remote store can produce.

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// The remote store rejected a create, or local validation failed
    #[error("Failed to create record {name} in {domain}: {reason}")]
    Create {
        domain: String,
        name: String,
        reason: String,
    },

    /// The remote store rejected an update
    #[error("Failed to update record {id} in {domain}: {reason}")]
    Update {
        domain: String,
        id: String,
        reason: String,
    },

    /// The remote store rejected a delete
    #[error("Failed to delete record {id} in {domain}: {reason}")]
    Delete {
        domain: String,
        id: String,
        reason: String,
    },

    /// Record or zone not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Observed state diverges from the declared state
    #[error("Bad {field}: expected {expected}, got {actual}")]
    AttributeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// A record is still retrievable after it should have been destroyed
    #[error("Record {id} in {domain} still exists")]
    StillExists { domain: String, id: String },

    /// An in-place update produced a different remote identifier
    #[error("{address}: record ID changed from {previous} to {current} during update")]
    IdChanged {
        address: String,
        previous: String,
        current: String,
    },

    /// A failure localized to a lifecycle step and resource address
    #[error("step {step}, {address}: {source}")]
    Step {
        step: usize,
        address: String,
        #[source]
        source: Box<Error>,
    },

    /// A failure during teardown or destroy verification
    #[error("teardown, {address}: {source}")]
    Teardown {
        address: String,
        #[source]
        source: Box<Error>,
    },

    /// Run-state persistence errors
    #[error("State file error: {0}")]
    State(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// I/O errors (run-state files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "create failed" error
    pub fn create(
        domain: impl Into<String>,
        name: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Create {
            domain: domain.into(),
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an "update failed" error
    pub fn update(
        domain: impl Into<String>,
        id: impl std::fmt::Display,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Update {
            domain: domain.into(),
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a "delete failed" error
    pub fn delete(
        domain: impl Into<String>,
        id: impl std::fmt::Display,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Delete {
            domain: domain.into(),
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an attribute mismatch error
    pub fn mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::AttributeMismatch {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a run-state persistence error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Wrap an error with the step index and resource address it occurred at
    pub fn at_step(self, step: usize, address: impl Into<String>) -> Self {
        Self::Step {
            step,
            address: address.into(),
            source: Box::new(self),
        }
    }

    /// Wrap an error raised while tearing a resource down
    pub fn at_teardown(self, address: impl Into<String>) -> Self {
        Self::Teardown {
            address: address.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or the error it wraps) is a not-found error
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Step { source, .. } | Self::Teardown { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
