//! nipscan - random search for registered NIP identifiers.

mod cli;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use colored::Colorize;
use nipscan_core::AppConfig;
use nipscan_notify::{NotificationChannel, NotifyError, Notifier, TelegramChannel};
use nipscan_registry::{LookupError, ProxyPool, RegistryClient};
use nipscan_scanner::{DiscoveryScheduler, SchedulerConfig};
use nipscan_store::ResultStore;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use terminal::TerminalReporter;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long queued notifications may keep the process alive after a run.
const NOTIFY_GRACE: Duration = Duration::from_secs(5);

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,nipscan=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load_with_env(cli.config.as_deref())
        .context("Failed to load configuration")?;
    cli.run.apply(&mut config);

    match cli.command {
        Some(Command::Config { print, init }) => config_command(&config, print, init),
        Some(Command::Check { nip }) => {
            config.validate().context("Invalid configuration")?;
            check(&config, &nip).await
        }
        None => {
            config.validate().context("Invalid configuration")?;
            discover(config).await
        }
    }
}

fn config_command(config: &AppConfig, print: bool, init: bool) -> Result<()> {
    if init {
        let path = AppConfig::default()
            .save()
            .context("Failed to write default configuration")?;
        println!("Wrote default configuration to {}", path.display());
    } else if print {
        print!("{}", config.to_toml().context("Failed to render configuration")?);
    } else {
        let path = AppConfig::config_path().context("Failed to resolve config path")?;
        println!("{}", path.display());
    }
    Ok(())
}

async fn check(config: &AppConfig, nip: &str) -> Result<()> {
    let client = RegistryClient::new(&config.registry).context("Failed to build registry client")?;

    match client.check(nip).await {
        Ok(result) => {
            println!("{}", terminal::result_block(&result));
            Ok(())
        }
        Err(LookupError::NotFound { nip }) => {
            println!("{} {}", "Not registered:".yellow().bold(), nip);
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Lookup of {nip} failed")),
    }
}

async fn discover(config: AppConfig) -> Result<()> {
    info!("Starting nipscan v{}", env!("CARGO_PKG_VERSION"));

    let registry =
        RegistryClient::new(&config.registry).context("Failed to build registry client")?;

    let proxies = if config.proxy.enabled {
        ProxyPool::from_source(
            &config.proxy.source_url,
            Duration::from_secs(config.proxy.fetch_timeout_secs),
            registry.timeout(),
            registry.user_agent(),
        )
        .await
    } else {
        ProxyPool::direct()
    };
    println!("{} {}", "Proxies loaded:".cyan(), proxies.len());

    let (notifier, delivery) = start_notifier(&config);
    println!(
        "{} {}",
        "Telegram:".cyan(),
        if notifier.is_enabled() { "active" } else { "disabled" }
    );

    let store = ResultStore::open(&config.storage.journal_path).await;
    println!(
        "{} {} ({})",
        "Previously found:".cyan(),
        store.len().await,
        store.path().display()
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping workers");
                shutdown.cancel();
            }
        }
    });

    let summary = DiscoveryScheduler::new(
        SchedulerConfig::from(&config.scan),
        Arc::new(registry),
        Arc::new(proxies),
        Arc::new(store),
        notifier,
    )
    .with_reporter(Arc::new(TerminalReporter))
    .run(shutdown)
    .await
    .context("Discovery run failed")?;

    println!("\n\n{}", terminal::summary_block(&summary));

    if let Some(delivery) = delivery {
        drain_notifications(delivery).await;
    }
    Ok(())
}

/// Start the Telegram delivery task when credentials are configured.
fn start_notifier(config: &AppConfig) -> (Notifier, Option<JoinHandle<()>>) {
    match TelegramChannel::from_config(&config.telegram) {
        Ok(channel) => {
            let channel: Arc<dyn NotificationChannel> = Arc::new(channel);
            let (notifier, task) = Notifier::spawn(channel, config.telegram.queue_capacity);
            (notifier, Some(task))
        }
        Err(NotifyError::Disabled) => {
            debug!("Telegram not configured, notifications disabled");
            (Notifier::disabled(), None)
        }
        Err(e) => {
            warn!("Telegram unavailable, notifications disabled: {}", e);
            (Notifier::disabled(), None)
        }
    }
}

/// Give queued notifications a bounded chance to go out.
///
/// The scheduler owned the last [`Notifier`], so the delivery task ends on its
/// own once the queue is empty.
async fn drain_notifications(mut delivery: JoinHandle<()>) {
    if tokio::time::timeout(NOTIFY_GRACE, &mut delivery).await.is_err() {
        warn!(
            "Pending notifications dropped after {}s grace period",
            NOTIFY_GRACE.as_secs()
        );
        delivery.abort();
    }
}
