// # DigitalOcean DNS Provider
//
// RecordStore and ZoneStore implementations backed by the DigitalOcean API v2.
//
// ## Behaviour
//
// - One HTTP request per trait call; retries and backoff belong to the caller
// - HTTP timeout of 30 seconds
// - Status codes mapped onto core errors (401/403, 404, 422, 429, 5xx)
// - Record data is sent and returned verbatim
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider fails fast if the token is empty
//
// ## API Reference
//
// - Retrieve record: GET `/v2/domains/:domain/records/:id`
// - Create record: POST `/v2/domains/:domain/records`
// - Update record: PUT `/v2/domains/:domain/records/:id`
// - Delete record: DELETE `/v2/domains/:domain/records/:id`
// - Create domain: POST `/v2/domains`
// - Retrieve domain: GET `/v2/domains/:name`
// - Delete domain: DELETE `/v2/domains/:name`

use async_trait::async_trait;
use dnsrec_core::config::ProviderConfig;
use dnsrec_core::record::{Record, RecordId, RecordRequest, RecordType, RecordUpdate, Zone};
use dnsrec_core::traits::{ProviderFactory, RecordStore, ZoneStore};
use dnsrec_core::{Error, ProviderHandle, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// DigitalOcean API base URL
pub const DIGITALOCEAN_API_BASE: &str = "https://api.digitalocean.com";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "digitalocean";

#[derive(Debug, Deserialize)]
struct RecordEnvelope {
    domain_record: WireRecord,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    id: u64,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    data: String,
    #[serde(default)]
    priority: Option<u16>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    weight: Option<u16>,
}

impl WireRecord {
    fn into_record(self, domain: &str) -> Result<Record> {
        let record_type: RecordType = self.record_type.parse().map_err(|_| {
            Error::provider(
                PROVIDER,
                format!("unsupported record type in response: {}", self.record_type),
            )
        })?;

        Ok(Record {
            id: RecordId::from(self.id),
            domain: domain.to_string(),
            name: self.name,
            record_type,
            data: self.data,
            priority: self.priority,
            port: self.port,
            weight: self.weight,
        })
    }
}

#[derive(Debug, Serialize)]
struct CreateRecordBody<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    data: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<u16>,
}

#[derive(Debug, Serialize)]
struct UpdateRecordBody<'a> {
    name: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct DomainEnvelope {
    domain: WireDomain,
}

#[derive(Debug, Deserialize)]
struct WireDomain {
    name: String,
    #[serde(default)]
    ip_address: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateDomainBody<'a> {
    name: &'a str,
    ip_address: &'a str,
}

/// DigitalOcean DNS provider
///
/// Stateless and single-shot: every trait call maps to exactly one request.
/// The Debug implementation does NOT expose the API token.
pub struct DigitalOceanProvider {
    /// DigitalOcean API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL, without trailing slash
    api_base: String,

    client: reqwest::Client,
}

impl std::fmt::Debug for DigitalOceanProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalOceanProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl DigitalOceanProvider {
    /// Create a provider against the public API
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::with_api_base(api_token, DIGITALOCEAN_API_BASE)
    }

    /// Create a provider against a custom API base URL
    ///
    /// # Errors
    ///
    /// - `Error::Config`: the token is empty or the HTTP client cannot be built
    pub fn with_api_base(api_token: impl Into<String>, api_base: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("DigitalOcean API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn records_url(&self, domain: &str) -> String {
        format!("{}/v2/domains/{}/records", self.api_base, domain)
    }

    fn record_url(&self, domain: &str, id: &RecordId) -> String {
        format!("{}/v2/domains/{}/records/{}", self.api_base, domain, id)
    }

    fn domain_url(&self, name: &str) -> String {
        format!("{}/v2/domains/{}", self.api_base, name)
    }

    /// Send a request and map any non-success status onto a core error
    ///
    /// `subject` describes the target for not-found messages.
    async fn send(&self, request: reqwest::RequestBuilder, subject: &str) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(status_error(status.as_u16(), subject, &error_text))
    }

    async fn read_record(&self, response: reqwest::Response, domain: &str) -> Result<Record> {
        let envelope: RecordEnvelope = response.json().await.map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;
        envelope.domain_record.into_record(domain)
    }
}

/// Map an unsuccessful HTTP status onto the core error taxonomy
fn status_error(status: u16, subject: &str, body: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(subject.to_string()),
        422 => Error::invalid_input(format!("{} rejected: {}", subject, body)),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::provider(
            PROVIDER,
            format!("DigitalOcean server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(PROVIDER, format!("Request failed: {} - {}", status, body)),
    }
}

#[async_trait]
impl RecordStore for DigitalOceanProvider {
    async fn retrieve_record(&self, domain: &str, id: &RecordId) -> Result<Record> {
        tracing::debug!("Retrieving DigitalOcean record {} in {}", id, domain);
        let subject = format!("record {} in domain {}", id, domain);
        let response = self
            .send(self.client.get(self.record_url(domain, id)), &subject)
            .await?;
        self.read_record(response, domain).await
    }

    async fn create_record(&self, domain: &str, request: &RecordRequest) -> Result<Record> {
        let body = CreateRecordBody {
            record_type: request.record_type.as_str(),
            name: &request.name,
            data: &request.data,
            priority: request.priority,
            port: request.port,
            weight: request.weight,
        };

        tracing::info!(
            "Creating DigitalOcean {} record {} in {}",
            request.record_type,
            request.name,
            domain
        );
        let subject = format!("domain {}", domain);
        let response = self
            .send(self.client.post(self.records_url(domain)).json(&body), &subject)
            .await?;
        self.read_record(response, domain).await
    }

    async fn update_record(
        &self,
        domain: &str,
        id: &RecordId,
        update: &RecordUpdate,
    ) -> Result<Record> {
        let body = UpdateRecordBody {
            name: &update.name,
            data: &update.data,
        };

        tracing::info!("Updating DigitalOcean record {} in {}", id, domain);
        let subject = format!("record {} in domain {}", id, domain);
        let response = self
            .send(self.client.put(self.record_url(domain, id)).json(&body), &subject)
            .await?;
        self.read_record(response, domain).await
    }

    async fn delete_record(&self, domain: &str, id: &RecordId) -> Result<()> {
        tracing::info!("Deleting DigitalOcean record {} in {}", id, domain);
        let subject = format!("record {} in domain {}", id, domain);
        self.send(self.client.delete(self.record_url(domain, id)), &subject)
            .await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

#[async_trait]
impl ZoneStore for DigitalOceanProvider {
    async fn create_zone(&self, zone: &Zone) -> Result<Zone> {
        let body = CreateDomainBody {
            name: &zone.name,
            ip_address: &zone.ip_address,
        };

        tracing::info!("Creating DigitalOcean domain {}", zone.name);
        let url = format!("{}/v2/domains", self.api_base);
        let response = self.send(self.client.post(url).json(&body), "domains").await?;

        let envelope: DomainEnvelope = response.json().await.map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        // The API does not echo ip_address back on create
        Ok(Zone::new(
            envelope.domain.name,
            envelope
                .domain
                .ip_address
                .unwrap_or_else(|| zone.ip_address.clone()),
        ))
    }

    async fn retrieve_zone(&self, name: &str) -> Result<Zone> {
        let subject = format!("domain {}", name);
        let response = self
            .send(self.client.get(self.domain_url(name)), &subject)
            .await?;

        let envelope: DomainEnvelope = response.json().await.map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;
        Ok(Zone::new(
            envelope.domain.name,
            envelope.domain.ip_address.unwrap_or_default(),
        ))
    }

    async fn delete_zone(&self, name: &str) -> Result<()> {
        tracing::info!("Deleting DigitalOcean domain {}", name);
        let subject = format!("domain {}", name);
        self.send(self.client.delete(self.domain_url(name)), &subject)
            .await?;
        Ok(())
    }
}

/// Factory for creating DigitalOcean providers
pub struct DigitalOceanFactory;

impl ProviderFactory for DigitalOceanFactory {
    fn create(&self, config: &ProviderConfig) -> Result<ProviderHandle> {
        match config {
            ProviderConfig::DigitalOcean {
                api_token,
                api_base,
            } => {
                let provider = match api_base {
                    Some(base) => DigitalOceanProvider::with_api_base(api_token.clone(), base.clone())?,
                    None => DigitalOceanProvider::new(api_token.clone())?,
                };
                Ok(ProviderHandle::new(provider))
            }
            _ => Err(Error::config("Invalid config for DigitalOcean provider")),
        }
    }
}

/// Register the DigitalOcean provider with a registry
///
/// # Example
///
/// ```rust
/// use dnsrec_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::with_builtin();
/// dnsrec_provider_digitalocean::register(&registry);
/// assert!(registry.has_provider("digitalocean"));
/// ```
pub fn register(registry: &dnsrec_core::ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(DigitalOceanFactory));
}
