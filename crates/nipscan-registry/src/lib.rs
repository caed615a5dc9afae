//! Nipscan Registry - lookups against the VAT taxpayer registry.
//!
//! This crate owns all outbound HTTP for the discovery loop: the registry
//! client that confirms or rejects a candidate, and the proxy pool that
//! rotates lookups across egress endpoints.
//!
//! # Example
//!
//! ```rust,ignore
//! use nipscan_core::{generator, RegistryConfig};
//! use nipscan_registry::{RegistryClient, RegistryLookup};
//!
//! let client = RegistryClient::new(&RegistryConfig::default())?;
//! match client.lookup(&generator::generate(), None).await {
//!     Ok(found) => println!("{} - {}", found.nip, found.name),
//!     Err(e) if e.is_expected() => {}
//!     Err(e) => return Err(e.into()),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod http;
pub mod proxy;

// Re-export commonly used types
pub use client::{parse_lookup_body, RegistryClient, RegistryLookup};
pub use error::{LookupError, Result};
pub use proxy::{load_endpoints, parse_proxy_list, EgressHandle, ProxyEndpoint, ProxyPool};
