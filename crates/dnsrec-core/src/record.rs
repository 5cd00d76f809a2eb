//! Record and zone data model
//!
//! A [`Record`] is what the remote store reports back; a [`DesiredRecord`] is
//! what a configuration declares. Only `name` and `data` are mutable once a
//! record exists, which is why updates travel as a separate [`RecordUpdate`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::{Error, Result};

/// Opaque remote identifier, assigned by the store on creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
    /// Canonical name
    Cname,
    /// Mail exchange
    Mx,
    /// Free-form text
    Txt,
    /// Service locator
    Srv,
    /// Name server
    Ns,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
            RecordType::Srv => "SRV",
            RecordType::Ns => "NS",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "MX" => Ok(RecordType::Mx),
            "TXT" => Ok(RecordType::Txt),
            "SRV" => Ok(RecordType::Srv),
            "NS" => Ok(RecordType::Ns),
            other => Err(Error::invalid_input(format!(
                "unsupported record type: {}",
                other
            ))),
        }
    }
}

/// A record as observed in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub domain: String,
    pub name: String,
    pub record_type: RecordType,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
}

/// Payload for creating a record inside an existing zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    pub name: String,
    pub record_type: RecordType,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
}

/// Payload for updating an existing record
///
/// Carries only the mutable fields; type and domain cannot be expressed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub name: String,
    pub data: String,
}

/// The declared state of a single record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRecord {
    pub domain: String,
    pub name: String,
    pub record_type: RecordType,
    pub data: String,
    #[serde(default)]
    pub priority: Option<u16>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub weight: Option<u16>,
}

impl DesiredRecord {
    pub fn new(
        domain: impl Into<String>,
        name: impl Into<String>,
        record_type: RecordType,
        data: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
            record_type,
            data: data.into(),
            priority: None,
            port: None,
            weight: None,
        }
    }

    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Reject declarations the remote store would refuse anyway
    ///
    /// Hostname payloads (CNAME, NS, ...) are accepted verbatim: absolute,
    /// relative and external targets all pass untouched.
    pub fn validate(&self) -> Result<()> {
        if self.domain.is_empty() {
            return Err(Error::invalid_input("record domain cannot be empty"));
        }
        if self.data.is_empty() {
            return Err(Error::invalid_input("record value cannot be empty"));
        }

        match self.record_type {
            RecordType::A => {
                self.data.parse::<Ipv4Addr>().map_err(|_| {
                    Error::invalid_input(format!("A record value is not an IPv4 address: {}", self.data))
                })?;
            }
            RecordType::Aaaa => {
                self.data.parse::<Ipv6Addr>().map_err(|_| {
                    Error::invalid_input(format!(
                        "AAAA record value is not an IPv6 address: {}",
                        self.data
                    ))
                })?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Build the create payload for this declaration
    pub fn request(&self) -> RecordRequest {
        RecordRequest {
            name: self.name.clone(),
            record_type: self.record_type,
            data: self.data.clone(),
            priority: self.priority,
            port: self.port,
            weight: self.weight,
        }
    }

    /// Build the update payload (mutable fields only)
    pub fn update(&self) -> RecordUpdate {
        RecordUpdate {
            name: self.name.clone(),
            data: self.data.clone(),
        }
    }
}

/// A DNS zone, the parent of every record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub ip_address: String,
}

impl Zone {
    pub fn new(name: impl Into<String>, ip_address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip_address: ip_address.into(),
        }
    }
}
