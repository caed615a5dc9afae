//! Discovery scheduler.
//!
//! Runs a fixed pool of workers over a shared attempt budget. Each worker
//! claims an attempt index, generates a candidate, picks the egress handle for
//! that index and asks the registry. Confirmed results are counted, persisted
//! and announced; every other outcome is logged and the loop moves on.

use crate::error::{Result, ScanError};
use crate::report::{NoopReporter, ProgressReporter};
use crate::stats::{RunStats, RunSummary};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use nipscan_core::{checksum, generator, ConfirmedResult, ScanConfig};
use nipscan_notify::{discovery_message, Notifier};
use nipscan_registry::{LookupError, ProxyPool, RegistryLookup};
use nipscan_store::ResultStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Parameters of one discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Total attempts across all workers; `None` runs until cancelled
    pub attempts: Option<u64>,
    /// Pause after each attempt, per worker
    pub delay: Duration,
    /// Emit progress whenever the attempt number is a multiple of this
    pub report_every: u64,
    /// Number of workers
    pub concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for SchedulerConfig {
    fn from(scan: &ScanConfig) -> Self {
        Self {
            attempts: scan.attempts.filter(|&n| n > 0),
            delay: Duration::from_millis(scan.delay_ms),
            report_every: scan.report_every,
            concurrency: scan.concurrency.max(1),
        }
    }
}

/// State shared by every worker of a run.
struct RunContext {
    config: SchedulerConfig,
    stats: RunStats,
    registry: Arc<dyn RegistryLookup>,
    proxies: Arc<ProxyPool>,
    store: Arc<ResultStore>,
    notifier: Notifier,
    reporter: Arc<dyn ProgressReporter>,
    shutdown: CancellationToken,
}

/// Coordinates the worker pool for a discovery run.
pub struct DiscoveryScheduler {
    config: SchedulerConfig,
    registry: Arc<dyn RegistryLookup>,
    proxies: Arc<ProxyPool>,
    store: Arc<ResultStore>,
    notifier: Notifier,
    reporter: Arc<dyn ProgressReporter>,
}

impl DiscoveryScheduler {
    /// Create a scheduler. Progress is discarded until a reporter is attached.
    #[must_use]
    pub fn new(
        config: SchedulerConfig,
        registry: Arc<dyn RegistryLookup>,
        proxies: Arc<ProxyPool>,
        store: Arc<ResultStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            registry,
            proxies,
            store,
            notifier,
            reporter: Arc::new(NoopReporter),
        }
    }

    /// Attach a progress reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run until the attempt budget is spent or `shutdown` is cancelled.
    ///
    /// Workers observe cancellation before claiming an attempt and while
    /// sleeping between attempts; an in-flight lookup is allowed to finish.
    /// The returned summary is taken after every worker has stopped.
    pub async fn run(self, shutdown: CancellationToken) -> Result<RunSummary> {
        let concurrency = self.config.concurrency.max(1);

        info!(
            "Starting discovery: {} workers, budget {}, delay {:?}, {} proxies",
            concurrency,
            self.config
                .attempts
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
            self.config.delay,
            self.proxies.len()
        );

        let ctx = Arc::new(RunContext {
            config: self.config,
            stats: RunStats::new(),
            registry: self.registry,
            proxies: self.proxies,
            store: self.store,
            notifier: self.notifier,
            reporter: self.reporter,
            shutdown,
        });

        let mut workers: FuturesUnordered<_> = (0..concurrency)
            .map(|worker_id| {
                let ctx = ctx.clone();
                tokio::spawn(worker_loop(worker_id, ctx)).map(move |joined| (worker_id, joined))
            })
            .collect();

        let mut failure = None;
        while let Some((worker_id, joined)) = workers.next().await {
            if let Err(e) = joined {
                error!("Worker {} terminated abnormally: {}", worker_id, e);
                ctx.shutdown.cancel();
                failure.get_or_insert(ScanError::WorkerFailed {
                    worker_id,
                    reason: e.to_string(),
                });
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }

        let stats = ctx.stats.snapshot();
        let interrupted = ctx.shutdown.is_cancelled();
        info!(
            "Discovery finished: {} attempts, {} confirmed{}",
            stats.attempts,
            stats.confirmed,
            if interrupted { " (interrupted)" } else { "" }
        );

        Ok(RunSummary {
            stats,
            started_at: ctx.stats.started_at(),
            interrupted,
        })
    }
}

async fn worker_loop(worker_id: usize, ctx: Arc<RunContext>) {
    debug!("Worker {} started", worker_id);

    loop {
        if ctx.shutdown.is_cancelled() {
            break;
        }
        let Some(index) = ctx.stats.claim_attempt(ctx.config.attempts) else {
            break;
        };

        run_attempt(&ctx, index).await;

        let number = index + 1;
        if ctx.config.report_every > 0 && number % ctx.config.report_every == 0 {
            ctx.reporter.on_progress(&ctx.stats.snapshot());
        }

        if !ctx.config.delay.is_zero() {
            tokio::select! {
                () = ctx.shutdown.cancelled() => break,
                () = tokio::time::sleep(ctx.config.delay) => {}
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

async fn run_attempt(ctx: &RunContext, index: u64) {
    let candidate = generator::generate();
    if !checksum::is_valid(candidate.as_str()) {
        // The generator only emits valid candidates; skip rather than query.
        warn!("Generator produced invalid candidate {}", candidate);
        return;
    }

    let egress = ctx.proxies.select_for_attempt(index);

    match ctx.registry.lookup(&candidate, egress.as_ref()).await {
        Ok(result) => {
            if let Some(handle) = &egress {
                ctx.proxies.record_success(handle);
            }
            confirm(ctx, result).await;
        }
        Err(e) => {
            if let Some(handle) = &egress {
                match &e {
                    LookupError::Transport { .. } => ctx.proxies.record_failure(handle),
                    LookupError::NotFound { .. } => ctx.proxies.record_success(handle),
                    _ => {}
                }
            }
            if e.is_expected() {
                debug!("Attempt {} ({}): {}", index + 1, candidate, e);
            } else {
                warn!("Attempt {} ({}): {}", index + 1, candidate, e);
            }
        }
    }
}

async fn confirm(ctx: &RunContext, result: ConfirmedResult) {
    info!("Confirmed {} - {}", result.nip, result.name);

    ctx.stats.record_confirmed(&result);
    ctx.reporter.on_confirmed(&result);

    let text = discovery_message(&result);
    match ctx.store.try_add(result).await {
        Ok(true) => {}
        Ok(false) => debug!("Result already in journal"),
        Err(e) => error!("Failed to persist result: {}", e),
    }

    ctx.notifier.notify(text);
}
