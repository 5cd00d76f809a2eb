//! Configuration types
//!
//! Typed configuration objects passed explicitly to the components that need
//! them. Nothing here is read from ambient or global state.

use serde::{Deserialize, Serialize};

/// Remote provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// DigitalOcean API v2
    #[serde(rename = "digitalocean")]
    DigitalOcean {
        /// DigitalOcean API token
        api_token: String,
        /// API base URL override (defaults to the public endpoint)
        #[serde(default)]
        api_base: Option<String>,
    },

    /// In-memory provider (not persistent)
    #[default]
    Memory,

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::DigitalOcean { api_token, api_base } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config(
                        "DigitalOcean API token cannot be empty",
                    ));
                }
                if let Some(base) = api_base
                    && !base.starts_with("https://")
                    && !base.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "DigitalOcean API base must use HTTP or HTTPS scheme. Got: {}",
                        base
                    )));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
            ProviderConfig::Memory => Ok(()),
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::DigitalOcean { .. } => "digitalocean",
            ProviderConfig::Memory => "memory",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// How destroy verification interprets a failed retrieve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestroyCheck {
    /// Only a not-found response proves destruction; other errors propagate
    #[default]
    Strict,
    /// Any retrieval error proves destruction
    Loose,
}

impl std::str::FromStr for DestroyCheck {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(DestroyCheck::Strict),
            "loose" => Ok(DestroyCheck::Loose),
            other => Err(crate::Error::config(format!(
                "destroy check mode '{}' is not valid. Valid modes: strict, loose",
                other
            ))),
        }
    }
}

/// State verifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Destroy verification mode
    #[serde(default)]
    pub destroy_check: DestroyCheck,
}

/// Lifecycle driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Verifier settings used for every check the driver runs
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Capacity of the lifecycle event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 256 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Tear down and verify destruction even when a step fails
    #[serde(default = "default_cleanup_on_failure")]
    pub cleanup_on_failure: bool,
}

impl DriverConfig {
    /// Validate the driver configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config(
                "event channel capacity must be > 0",
            ));
        }
        Ok(())
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            verifier: VerifierConfig::default(),
            event_channel_capacity: default_event_channel_capacity(),
            cleanup_on_failure: default_cleanup_on_failure(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    256
}

fn default_cleanup_on_failure() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digitalocean_config_requires_token() {
        let config = ProviderConfig::DigitalOcean {
            api_token: String::new(),
            api_base: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn digitalocean_config_rejects_bad_scheme() {
        let config = ProviderConfig::DigitalOcean {
            api_token: "token".to_string(),
            api_base: Some("ftp://api.example.com".to_string()),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn provider_config_deserializes_tagged() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{"type":"digitalocean","api_token":"abc"}"#).unwrap();
        assert_eq!(config.type_name(), "digitalocean");

        let config: ProviderConfig = serde_json::from_str(r#"{"type":"memory"}"#).unwrap();
        assert_eq!(config.type_name(), "memory");
    }

    #[test]
    fn destroy_check_defaults_to_strict() {
        assert_eq!(VerifierConfig::default().destroy_check, DestroyCheck::Strict);
        assert_eq!("LOOSE".parse::<DestroyCheck>().unwrap(), DestroyCheck::Loose);
        assert!("maybe".parse::<DestroyCheck>().is_err());
    }

    #[test]
    fn driver_config_rejects_zero_capacity() {
        let config = DriverConfig {
            event_channel_capacity: 0,
            ..DriverConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
