//! Nipscan Scanner - concurrent discovery orchestration.
//!
//! This crate runs the discovery loop: a fixed pool of workers that each
//! generate a candidate, pick an egress handle, ask the registry, and hand
//! confirmed results to the store and the notifier.
//!
//! # Features
//!
//! - Global attempt budget shared by all workers (claimed atomically)
//! - Deterministic proxy rotation keyed by attempt index
//! - Per-worker pacing delay
//! - Cooperative cancellation observed at the top of each iteration
//! - Periodic progress reports and a final summary
//!
//! # Example
//!
//! ```rust,ignore
//! use nipscan_scanner::{DiscoveryScheduler, SchedulerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let scheduler = DiscoveryScheduler::new(
//!     SchedulerConfig::from(&config.scan),
//!     Arc::new(registry_client),
//!     Arc::new(proxy_pool),
//!     Arc::new(result_store),
//!     notifier,
//! );
//!
//! let summary = scheduler.run(CancellationToken::new()).await?;
//! println!("{} attempts, {} confirmed", summary.stats.attempts, summary.stats.confirmed);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod report;
pub mod scheduler;
pub mod stats;

// Re-export commonly used types
pub use error::{Result, ScanError};
pub use report::{NoopReporter, ProgressReporter};
pub use scheduler::{DiscoveryScheduler, SchedulerConfig};
pub use stats::{format_percent, RunStats, RunSummary, StatsSnapshot};
