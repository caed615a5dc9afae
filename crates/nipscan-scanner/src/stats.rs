//! Run statistics shared by all workers.

use chrono::{DateTime, Utc};
use nipscan_core::ConfirmedResult;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Counters mutated by the workers and read by the reporting path.
///
/// The attempt counter doubles as the scheduling input for proxy rotation and
/// report cadence, so it is only ever advanced through
/// [`RunStats::claim_attempt`].
#[derive(Debug)]
pub struct RunStats {
    attempts: AtomicU64,
    confirmed: AtomicU64,
    started: Instant,
    started_at: DateTime<Utc>,
    last_confirmed: Mutex<Option<ConfirmedResult>>,
}

impl RunStats {
    /// Start a fresh set of counters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attempts: AtomicU64::new(0),
            confirmed: AtomicU64::new(0),
            started: Instant::now(),
            started_at: Utc::now(),
            last_confirmed: Mutex::new(None),
        }
    }

    /// Claim the next zero-based attempt index, unless the budget is spent.
    ///
    /// The increment and the budget check are one atomic step, so concurrent
    /// workers never overshoot `budget` or reuse an index.
    pub fn claim_attempt(&self, budget: Option<u64>) -> Option<u64> {
        self.attempts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |claimed| match budget {
                Some(limit) if claimed >= limit => None,
                _ => Some(claimed + 1),
            })
            .ok()
    }

    /// Count a confirmation and remember it as the latest.
    pub fn record_confirmed(&self, result: &ConfirmedResult) {
        self.confirmed.fetch_add(1, Ordering::Relaxed);
        *self
            .last_confirmed
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(result.clone());
    }

    /// Attempts claimed so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Confirmations so far.
    pub fn confirmed(&self) -> u64 {
        self.confirmed.load(Ordering::Relaxed)
    }

    /// Wall-clock start of the run.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Point-in-time copy for reporting. Values may be slightly stale.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            attempts: self.attempts(),
            confirmed: self.confirmed(),
            elapsed: self.started.elapsed(),
            last_confirmed: self
                .last_confirmed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy of the run counters at one moment.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    /// Attempts claimed
    pub attempts: u64,
    /// Candidates confirmed by the registry
    pub confirmed: u64,
    /// Time since the run started
    pub elapsed: Duration,
    /// Most recent confirmation
    pub last_confirmed: Option<ConfirmedResult>,
}

impl StatsSnapshot {
    /// Confirmed / attempts, or 0 before the first attempt.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_ratio(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.confirmed as f64 / self.attempts as f64
        }
    }

    /// Attempts per minute since the start of the run.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn attempts_per_minute(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.attempts as f64 / secs * 60.0
        } else {
            0.0
        }
    }
}

/// Final outcome of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Counters after every worker stopped
    pub stats: StatsSnapshot,
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
    /// Whether the run ended on cancellation rather than budget
    pub interrupted: bool,
}

/// Format `part / total` as a percentage with two decimals.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_percent(part: u64, total: u64) -> String {
    if total == 0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", part as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn result(nip: &str) -> ConfirmedResult {
        ConfirmedResult {
            nip: nip.to_string(),
            name: "ACME".to_string(),
            vat_status: "Czynny".to_string(),
            regon: None,
            address: String::new(),
            accounts: Vec::new(),
        }
    }

    #[test]
    fn test_claim_respects_budget() {
        let stats = RunStats::new();
        let claimed: Vec<u64> = std::iter::from_fn(|| stats.claim_attempt(Some(3))).collect();
        assert_eq!(claimed, vec![0, 1, 2]);
        assert_eq!(stats.attempts(), 3);
        assert_eq!(stats.claim_attempt(Some(3)), None);
        assert_eq!(stats.attempts(), 3);
    }

    #[test]
    fn test_unbounded_claims() {
        let stats = RunStats::new();
        for expected in 0..100 {
            assert_eq!(stats.claim_attempt(None), Some(expected));
        }
    }

    #[test]
    fn test_concurrent_claims_are_unique() {
        let stats = Arc::new(RunStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = stats.clone();
                std::thread::spawn(move || {
                    std::iter::from_fn(|| stats.claim_attempt(Some(10_000))).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread joined"))
            .collect();
        all.sort_unstable();

        assert_eq!(all, (0..10_000).collect::<Vec<_>>());
        assert_eq!(stats.attempts(), 10_000);
    }

    #[test]
    fn test_record_confirmed() {
        let stats = RunStats::new();
        stats.record_confirmed(&result("5260001246"));
        stats.record_confirmed(&result("1234563218"));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.confirmed, 2);
        assert_eq!(
            snapshot.last_confirmed.map(|r| r.nip).as_deref(),
            Some("1234563218")
        );
    }

    #[test]
    fn test_ratios() {
        let snapshot = StatsSnapshot {
            attempts: 200,
            confirmed: 3,
            elapsed: Duration::from_secs(30),
            last_confirmed: None,
        };
        assert!((snapshot.success_ratio() - 0.015).abs() < f64::EPSILON);
        assert!((snapshot.attempts_per_minute() - 400.0).abs() < 1e-9);

        let empty = StatsSnapshot {
            attempts: 0,
            confirmed: 0,
            elapsed: Duration::ZERO,
            last_confirmed: None,
        };
        assert!(empty.success_ratio().abs() < f64::EPSILON);
        assert!(empty.attempts_per_minute().abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0, 0), "0.00%");
        assert_eq!(format_percent(1, 3), "33.33%");
        assert_eq!(format_percent(3, 200), "1.50%");
    }
}
