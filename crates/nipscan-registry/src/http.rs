//! Shared HTTP client construction.

use crate::error::{LookupError, Result};
use reqwest::{Client, Proxy};
use std::time::Duration;

/// Build an HTTP client with a request timeout, optionally routed through a proxy.
///
/// `proxy_url` is a full URL such as `http://10.0.0.1:8080`.
///
/// # Errors
/// Returns error if the proxy URL is malformed or the client cannot be created.
pub fn build_http_client(
    timeout: Duration,
    user_agent: &str,
    proxy_url: Option<&str>,
) -> Result<Client> {
    let mut builder = Client::builder().timeout(timeout).user_agent(user_agent);

    if let Some(url) = proxy_url {
        let proxy = Proxy::all(url)
            .map_err(|e| LookupError::Client(format!("invalid proxy {url}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| LookupError::Client(format!("failed to create HTTP client: {e}")))
}
