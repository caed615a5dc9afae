//! Registry client for the VAT taxpayer "white list" API.
//!
//! One call to [`RegistryLookup::lookup`] issues exactly one `GET` request,
//! either directly or through a supplied egress handle, and maps the answer
//! to a [`ConfirmedResult`] or a classified [`LookupError`].

use crate::error::{LookupError, Result};
use crate::http::build_http_client;
use crate::proxy::EgressHandle;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use nipscan_core::{ConfirmedResult, Nip, RegistryConfig};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Trait for anything that can confirm a candidate against the registry.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    /// Look up a single candidate, optionally through an egress handle.
    async fn lookup(&self, nip: &Nip, egress: Option<&EgressHandle>) -> Result<ConfirmedResult>;
}

/// HTTP client for the registry search endpoint.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl RegistryClient {
    /// Create a new registry client from configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = build_http_client(timeout, &config.user_agent, None)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            user_agent: config.user_agent.clone(),
        })
    }

    /// Per-request timeout applied to direct and proxied clients.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// User agent sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Build the search URL for an identifier on a given date.
    #[must_use]
    pub fn lookup_url(&self, nip: &Nip, date: NaiveDate) -> String {
        format!(
            "{}/api/search/nip/{}?date={}",
            self.base_url,
            nip,
            date.format("%Y-%m-%d")
        )
    }

    /// Validate an externally supplied identifier and look it up directly.
    ///
    /// Invalid input fails with [`LookupError::InvalidCandidate`] before any
    /// network request is made.
    pub async fn check(&self, input: &str) -> Result<ConfirmedResult> {
        let nip = Nip::parse(input).map_err(|e| LookupError::InvalidCandidate(e.to_string()))?;
        self.lookup(&nip, None).await
    }
}

#[async_trait]
impl RegistryLookup for RegistryClient {
    async fn lookup(&self, nip: &Nip, egress: Option<&EgressHandle>) -> Result<ConfirmedResult> {
        let url = self.lookup_url(nip, Utc::now().date_naive());
        let client = egress.map_or(&self.client, EgressHandle::client);

        if let Some(handle) = egress {
            debug!("Looking up {} via {}", nip, handle.endpoint());
        } else {
            debug!("Looking up {} directly", nip);
        }

        let response = client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LookupError::Transport {
                status: Some(status.as_u16()),
                message,
            });
        }

        let body = response.text().await?;
        parse_lookup_body(nip, &body)
    }
}

/// Map a successful response body to a confirmed result.
///
/// A body without a `result.subject` object is [`LookupError::NotFound`]; a
/// body that is not the expected JSON structure is
/// [`LookupError::InvalidResponse`]. Absent `regon` maps to `None`, absent
/// account numbers to an empty list.
pub fn parse_lookup_body(nip: &Nip, body: &str) -> Result<ConfirmedResult> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| LookupError::InvalidResponse {
            message: format!("failed to parse response: {e}"),
        })?;

    let subject = response
        .result
        .and_then(|r| r.subject)
        .ok_or_else(|| LookupError::NotFound {
            nip: nip.to_string(),
        })?;

    Ok(ConfirmedResult {
        nip: subject.nip.unwrap_or_else(|| nip.to_string()),
        name: subject.name,
        vat_status: subject.status_vat.unwrap_or_default(),
        regon: subject.regon.filter(|r| !r.is_empty()),
        address: subject
            .working_address
            .or(subject.residence_address)
            .unwrap_or_default(),
        accounts: subject.account_numbers.unwrap_or_default(),
    })
}

// Registry API types

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    subject: Option<Subject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Subject {
    nip: Option<String>,
    name: String,
    status_vat: Option<String>,
    regon: Option<String>,
    working_address: Option<String>,
    residence_address: Option<String>,
    account_numbers: Option<Vec<String>>,
}
