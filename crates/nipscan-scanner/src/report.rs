//! Reporting seam between the scheduler and the terminal.

use crate::stats::StatsSnapshot;
use nipscan_core::ConfirmedResult;

/// Receives progress from the discovery loop.
///
/// Called from worker tasks, so implementations must be cheap and must not
/// block.
pub trait ProgressReporter: Send + Sync {
    /// A claimed attempt number hit the reporting interval.
    fn on_progress(&self, _snapshot: &StatsSnapshot) {}

    /// A candidate was confirmed. Called for every confirmation regardless of
    /// the reporting interval.
    fn on_confirmed(&self, _result: &ConfirmedResult) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {}
