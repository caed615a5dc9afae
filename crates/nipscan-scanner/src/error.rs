//! Error types for the discovery scheduler.

use thiserror::Error;

/// Run-fatal scheduler errors.
///
/// Per-attempt lookup and persistence failures are handled inside the worker
/// loop and never surface here.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A worker task panicked or was aborted
    #[error("worker {worker_id} terminated abnormally: {reason}")]
    WorkerFailed {
        /// Index of the worker in the pool
        worker_id: usize,
        /// Panic or cancellation message
        reason: String,
    },
}

/// Result type alias for scheduler operations.
pub type Result<T> = std::result::Result<T, ScanError>;
