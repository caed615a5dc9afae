//! Command-line arguments and their merge into [`AppConfig`].

use clap::{Args, Parser, Subcommand};
use nipscan_core::AppConfig;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "nipscan", version)]
#[command(about = "Discover registered NIP identifiers by random search against the VAT registry")]
pub struct Cli {
    /// Configuration file (defaults to the XDG config path)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate one identifier and look it up in the registry
    Check {
        /// Identifier, separators allowed (e.g. 526-000-12-46)
        nip: String,
    },

    /// Show or initialize the configuration file
    Config {
        /// Print the effective configuration as TOML
        #[arg(long, conflicts_with = "init")]
        print: bool,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

/// Overrides for a discovery run. Every flag takes precedence over the
/// environment and the config file.
#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Total attempts across all workers (0 = until interrupted)
    #[arg(short, long)]
    pub attempts: Option<u64>,

    /// Delay between attempts per worker, in milliseconds
    #[arg(short, long, value_name = "MS")]
    pub delay: Option<u64>,

    /// Print a status line every N attempts
    #[arg(short, long, value_name = "N")]
    pub report: Option<u64>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Route lookups through a public proxy list
    #[arg(long)]
    pub use_proxies: bool,

    /// Proxy list URL (implies --use-proxies)
    #[arg(long, value_name = "URL")]
    pub proxy_url: Option<String>,

    /// Result journal path
    #[arg(long, value_name = "PATH")]
    pub journal: Option<PathBuf>,
}

impl RunArgs {
    /// Apply flags on top of an already loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(attempts) = self.attempts {
            config.scan.attempts = (attempts > 0).then_some(attempts);
        }
        if let Some(delay) = self.delay {
            config.scan.delay_ms = delay;
        }
        if let Some(report) = self.report {
            config.scan.report_every = report;
        }
        if let Some(concurrency) = self.concurrency {
            config.scan.concurrency = concurrency;
        }
        if self.use_proxies {
            config.proxy.enabled = true;
        }
        if let Some(url) = &self.proxy_url {
            config.proxy.enabled = true;
            config.proxy.source_url.clone_from(url);
        }
        if let Some(journal) = &self.journal {
            config.storage.journal_path.clone_from(journal);
        }
    }
}
