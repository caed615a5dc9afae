//! Nipscan Core - Foundation crate for the nipscan discovery tool.
//!
//! This crate provides the identifier model, the checksum engine, the candidate
//! generator, shared error types and configuration management that all other
//! nipscan crates depend on.
//!
//! # Modules
//!
//! - [`checksum`] - Weighted modulo-11 control digit computation and validation
//! - [`generator`] - Random candidate generation by rejection sampling
//! - [`types`] - Shared types (`Nip`, `ConfirmedResult`)
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//!
//! # Example
//!
//! ```rust
//! use nipscan_core::{checksum, generator};
//!
//! let candidate = generator::generate();
//! assert!(checksum::is_valid(candidate.as_str()));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod checksum;
pub mod config;
pub mod error;
pub mod generator;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, ProxyConfig, RegistryConfig, ScanConfig, StorageConfig, TelegramConfig,
};
pub use error::{ConfigError, ConfigResult, NipscanError};
pub use types::{ConfirmedResult, Nip};
