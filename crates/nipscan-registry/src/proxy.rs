//! Proxy pool with deterministic rotation and cached egress handles.
//!
//! Endpoints come from a plain-text `host:port` list. Each endpoint gets one
//! lazily-built HTTP client (its egress handle) that is reused for the rest of
//! the run. Failing endpoints are never evicted; consecutive failures are
//! counted and logged so a dead proxy shows up in the logs.

use crate::error::Result;
use crate::http::build_http_client;
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Log a warning every time an endpoint reaches a multiple of this many
/// consecutive failures.
const FAILURE_WARN_INTERVAL: u32 = 10;

static ENDPOINT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z0-9._-]+):(\d+)$").expect("Endpoint regex is hardcoded and valid")
});

/// A proxy `host:port` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyEndpoint {
    host: String,
    port: u16,
}

impl ProxyEndpoint {
    /// Parse a single `host:port` line. Returns `None` for anything else.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let caps = ENDPOINT_PATTERN.captures(line)?;
        let port = caps[2].parse().ok()?;
        Some(Self {
            host: caps[1].to_string(),
            port,
        })
    }

    /// Host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port number.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// URL used to configure the HTTP proxy.
    #[must_use]
    pub fn proxy_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A reusable, proxy-routed HTTP client.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct EgressHandle {
    slot: usize,
    endpoint: ProxyEndpoint,
    client: Client,
}

impl EgressHandle {
    /// Endpoint this handle routes through.
    #[must_use]
    pub fn endpoint(&self) -> &ProxyEndpoint {
        &self.endpoint
    }

    /// HTTP client routed through the endpoint.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Parse a newline-delimited proxy list.
///
/// Lines are trimmed; blank lines, `#` comments and anything not shaped like
/// `host:port` are dropped. Duplicates keep their first position.
#[must_use]
pub fn parse_proxy_list(text: &str) -> Vec<ProxyEndpoint> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(ProxyEndpoint::parse)
        .filter(|endpoint| seen.insert(endpoint.clone()))
        .collect()
}

/// Fetch and parse the proxy list from `source_url`.
///
/// Any failure (connection error, non-success status, unreadable body) yields
/// an empty list so lookups fall back to direct connections.
pub async fn load_endpoints(source_url: &str, timeout: Duration) -> Vec<ProxyEndpoint> {
    let client = match build_http_client(timeout, "nipscan-proxy-loader", None) {
        Ok(client) => client,
        Err(e) => {
            warn!("Cannot build client for proxy list: {}", e);
            return Vec::new();
        }
    };

    let response = match client.get(source_url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Failed to fetch proxy list from {}: {}", source_url, e);
            return Vec::new();
        }
    };

    if !response.status().is_success() {
        warn!(
            "Proxy list at {} returned HTTP {}",
            source_url,
            response.status().as_u16()
        );
        return Vec::new();
    }

    match response.text().await {
        Ok(text) => parse_proxy_list(&text),
        Err(e) => {
            warn!("Failed to read proxy list body: {}", e);
            Vec::new()
        }
    }
}

/// Rotating pool of egress endpoints.
#[derive(Debug)]
pub struct ProxyPool {
    endpoints: Vec<ProxyEndpoint>,
    handles: Vec<OnceCell<EgressHandle>>,
    failures: Vec<AtomicU32>,
    timeout: Duration,
    user_agent: String,
}

impl ProxyPool {
    /// Create a pool over a fixed endpoint list.
    #[must_use]
    pub fn new(endpoints: Vec<ProxyEndpoint>, timeout: Duration, user_agent: &str) -> Self {
        let handles = endpoints.iter().map(|_| OnceCell::new()).collect();
        let failures = endpoints.iter().map(|_| AtomicU32::new(0)).collect();
        Self {
            endpoints,
            handles,
            failures,
            timeout,
            user_agent: user_agent.to_string(),
        }
    }

    /// Create an empty pool; every attempt goes direct.
    #[must_use]
    pub fn direct() -> Self {
        Self::new(Vec::new(), Duration::from_secs(1), "")
    }

    /// Fetch the endpoint list from `source_url` and build a pool from it.
    pub async fn from_source(
        source_url: &str,
        fetch_timeout: Duration,
        request_timeout: Duration,
        user_agent: &str,
    ) -> Self {
        let endpoints = load_endpoints(source_url, fetch_timeout).await;
        if endpoints.is_empty() {
            warn!("No usable proxies from {}, using direct connections", source_url);
        } else {
            info!("Loaded {} proxies from {}", endpoints.len(), source_url);
        }
        Self::new(endpoints, request_timeout, user_agent)
    }

    /// Number of endpoints in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether the pool has no endpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoints in rotation order.
    #[must_use]
    pub fn endpoints(&self) -> &[ProxyEndpoint] {
        &self.endpoints
    }

    /// Endpoint assigned to a zero-based attempt index, if any.
    #[must_use]
    pub fn endpoint_for_attempt(&self, attempt_index: u64) -> Option<&ProxyEndpoint> {
        self.slot_for(attempt_index).map(|slot| &self.endpoints[slot])
    }

    /// Egress handle for a zero-based attempt index.
    ///
    /// Rotation is `attempt_index % len`, so the same index always maps to the
    /// same endpoint. Handles are built on first use and cached. Returns `None`
    /// when the pool is empty or the endpoint's client cannot be built, in
    /// which case the attempt goes direct.
    #[must_use]
    pub fn select_for_attempt(&self, attempt_index: u64) -> Option<EgressHandle> {
        let slot = self.slot_for(attempt_index)?;
        match self.handles[slot].get_or_try_init(|| self.build_handle(slot)) {
            Ok(handle) => Some(handle.clone()),
            Err(e) => {
                warn!("Skipping proxy {}: {}", self.endpoints[slot], e);
                None
            }
        }
    }

    /// Record a failed lookup through `handle`.
    pub fn record_failure(&self, handle: &EgressHandle) {
        let count = self.failures[handle.slot].fetch_add(1, Ordering::Relaxed) + 1;
        if count % FAILURE_WARN_INTERVAL == 0 {
            warn!(
                "Proxy {} has failed {} consecutive lookups",
                handle.endpoint, count
            );
        }
    }

    /// Record a successful lookup through `handle`.
    pub fn record_success(&self, handle: &EgressHandle) {
        self.failures[handle.slot].store(0, Ordering::Relaxed);
    }

    /// Current consecutive failure count for an endpoint.
    #[must_use]
    pub fn consecutive_failures(&self, endpoint: &ProxyEndpoint) -> Option<u32> {
        let slot = self.endpoints.iter().position(|e| e == endpoint)?;
        Some(self.failures[slot].load(Ordering::Relaxed))
    }

    fn slot_for(&self, attempt_index: u64) -> Option<usize> {
        if self.endpoints.is_empty() {
            return None;
        }
        let len = self.endpoints.len() as u64;
        // Remainder is < len, which came from a usize
        #[allow(clippy::cast_possible_truncation)]
        let slot = (attempt_index % len) as usize;
        Some(slot)
    }

    fn build_handle(&self, slot: usize) -> Result<EgressHandle> {
        let endpoint = self.endpoints[slot].clone();
        debug!("Creating egress handle for {}", endpoint);
        let client = build_http_client(
            self.timeout,
            &self.user_agent,
            Some(&endpoint.proxy_url()),
        )?;
        Ok(EgressHandle {
            slot,
            endpoint,
            client,
        })
    }
}
