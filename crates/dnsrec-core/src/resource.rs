//! Declarative resource configuration
//!
//! A [`Configuration`] is the desired state of one lifecycle step: an ordered
//! list of resource blocks keyed by address. Record blocks may refer to a
//! zone block's attributes through `${<address>.<attribute>}` references,
//! which are resolved against the run state at apply time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::state::RunState;
use crate::{Error, Result};

/// Resource type name for zones
pub const DOMAIN_RESOURCE: &str = "digitalocean_domain";

/// Resource type name for records
pub const RECORD_RESOURCE: &str = "digitalocean_record";

/// Address of a resource within a configuration, `<type>.<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceAddress(String);

impl ResourceAddress {
    pub fn new(resource_type: &str, name: &str) -> Self {
        Self(format!("{}.{}", resource_type, name))
    }

    /// Shorthand for a record resource address
    pub fn record(name: &str) -> Self {
        Self::new(RECORD_RESOURCE, name)
    }

    /// Shorthand for a zone resource address
    pub fn domain(name: &str) -> Self {
        Self::new(DOMAIN_RESOURCE, name)
    }

    pub fn parse(address: &str) -> Result<Self> {
        match address.split_once('.') {
            Some((ty, name)) if !ty.is_empty() && !name.is_empty() => Ok(Self(address.to_string())),
            _ => Err(Error::config(format!(
                "resource address must look like <type>.<name>: {}",
                address
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An attribute value that is either literal or a reference to another resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Reference {
        address: ResourceAddress,
        attribute: String,
    },
    Literal(String),
}

impl AttrValue {
    /// Parse a raw value, recognizing `${<address>.<attribute>}` references
    pub fn parse(raw: &str) -> Result<Self> {
        let Some(inner) = raw.strip_prefix("${").and_then(|s| s.strip_suffix('}')) else {
            return Ok(AttrValue::Literal(raw.to_string()));
        };

        let (address, attribute) = inner
            .rsplit_once('.')
            .ok_or_else(|| Error::config(format!("malformed reference: {}", raw)))?;

        Ok(AttrValue::Reference {
            address: ResourceAddress::parse(address)?,
            attribute: attribute.to_string(),
        })
    }

    /// Resolve against the current run state
    pub fn resolve(&self, state: &RunState) -> Result<String> {
        match self {
            AttrValue::Literal(value) => Ok(value.clone()),
            AttrValue::Reference { address, attribute } => state
                .attribute(address, attribute)
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::config(format!("unresolved reference: {}.{}", address, attribute))
                }),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Literal(value.to_string())
    }
}

/// A zone declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainBlock {
    pub name: String,
    pub ip_address: String,
}

/// A record declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBlock {
    pub domain: AttrValue,
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub priority: Option<u16>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub weight: Option<u16>,
}

impl RecordBlock {
    pub fn new(
        domain: AttrValue,
        name: impl Into<String>,
        value: impl Into<String>,
        record_type: impl Into<String>,
    ) -> Self {
        Self {
            domain,
            name: name.into(),
            value: value.into(),
            record_type: record_type.into(),
            priority: None,
            port: None,
            weight: None,
        }
    }
}

/// A single resource block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceBlock {
    Domain(DomainBlock),
    Record(RecordBlock),
}

impl ResourceBlock {
    /// Zones are applied before records and destroyed after them
    pub fn apply_order(&self) -> u8 {
        match self {
            ResourceBlock::Domain(_) => 0,
            ResourceBlock::Record(_) => 1,
        }
    }
}

/// Desired state for one lifecycle step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub resources: Vec<(ResourceAddress, ResourceBlock)>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a zone resource
    pub fn with_domain(
        mut self,
        address: ResourceAddress,
        name: impl Into<String>,
        ip_address: impl Into<String>,
    ) -> Self {
        self.resources.push((
            address,
            ResourceBlock::Domain(DomainBlock {
                name: name.into(),
                ip_address: ip_address.into(),
            }),
        ));
        self
    }

    /// Declare a record resource
    pub fn with_record(mut self, address: ResourceAddress, block: RecordBlock) -> Self {
        self.resources.push((address, ResourceBlock::Record(block)));
        self
    }

    pub fn contains(&self, address: &ResourceAddress) -> bool {
        self.resources.iter().any(|(addr, _)| addr == address)
    }

    /// Resources in dependency order (zones first, declaration order otherwise)
    pub fn ordered(&self) -> Vec<&(ResourceAddress, ResourceBlock)> {
        let mut ordered: Vec<_> = self.resources.iter().collect();
        ordered.sort_by_key(|(_, block)| block.apply_order());
        ordered
    }

    /// Reject duplicate addresses
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for (address, _) in &self.resources {
            if !seen.insert(address) {
                return Err(Error::config(format!(
                    "duplicate resource address: {}",
                    address
                )));
            }
        }
        Ok(())
    }
}
