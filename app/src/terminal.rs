//! User-facing terminal output: live status line, discovery lines and the
//! final summary. Diagnostics go through tracing on stderr instead.

use colored::Colorize;
use nipscan_core::ConfirmedResult;
use nipscan_scanner::{format_percent, ProgressReporter, RunSummary, StatsSnapshot};
use std::io::Write;
use std::time::Duration;

/// Prints progress to stdout as the scheduler reports it.
#[derive(Debug, Default)]
pub struct TerminalReporter;

impl ProgressReporter for TerminalReporter {
    fn on_progress(&self, snapshot: &StatsSnapshot) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r{}", status_line(snapshot));
        let _ = out.flush();
    }

    fn on_confirmed(&self, result: &ConfirmedResult) {
        println!("\n{}", discovery_line(result));
    }
}

/// One-line progress summary, rewritten in place.
pub fn status_line(snapshot: &StatsSnapshot) -> String {
    format!(
        "{} {} | {} {} | {} {} | {} {:.1} | {} {}",
        "Attempts:".dimmed(),
        snapshot.attempts,
        "Found:".dimmed(),
        snapshot.confirmed.to_string().green(),
        "Success:".dimmed(),
        format_percent(snapshot.confirmed, snapshot.attempts),
        "Rate/min:".dimmed(),
        snapshot.attempts_per_minute(),
        "Last:".dimmed(),
        last_found(snapshot.last_confirmed.as_ref()),
    )
}

pub fn discovery_line(result: &ConfirmedResult) -> String {
    format!(
        "{} {} {} ({})",
        "✅ Found".green().bold(),
        result.nip.bold(),
        result.name,
        result.vat_status
    )
}

/// Multi-line block printed once the run is over.
pub fn summary_block(summary: &RunSummary) -> String {
    let stats = &summary.stats;
    let mut lines = vec![
        format!("{}", "--- SUMMARY ---".bold()),
        format!("Started:    {}", summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Attempts:   {}", stats.attempts),
        format!("Found:      {}", stats.confirmed.to_string().green()),
        format!("Success:    {}", format_percent(stats.confirmed, stats.attempts)),
        format!("Elapsed:    {}", format_elapsed(stats.elapsed)),
        format!("Rate/min:   {:.1}", stats.attempts_per_minute()),
        format!("Last found: {}", last_found(stats.last_confirmed.as_ref())),
    ];
    if summary.interrupted {
        lines.push(format!("{}", "Interrupted before the attempt budget was spent".yellow()));
    }
    lines.join("\n")
}

/// Detail block for `nipscan check`.
pub fn result_block(result: &ConfirmedResult) -> String {
    let mut lines = vec![
        format!("{} {}", "✅ Registered:".green().bold(), result.nip.bold()),
        format!("Name:       {}", result.name),
        format!("VAT status: {}", result.vat_status),
    ];
    if let Some(regon) = &result.regon {
        lines.push(format!("REGON:      {regon}"));
    }
    if !result.address.is_empty() {
        lines.push(format!("Address:    {}", result.address));
    }
    for account in &result.accounts {
        lines.push(format!("Account:    {account}"));
    }
    lines.join("\n")
}

fn last_found(result: Option<&ConfirmedResult>) -> String {
    result.map_or_else(|| "-".to_string(), |r| format!("{} {}", r.nip, r.name))
}

/// Human-readable duration: `4.2s`, `3m 07s`, `1h 02m 03s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        return format!("{:.1}s", elapsed.as_secs_f64());
    }
    let (hours, minutes, seconds) = (secs / 3600, secs / 60 % 60, secs % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else {
        format!("{minutes}m {seconds:02}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result() -> ConfirmedResult {
        ConfirmedResult {
            nip: "5260001246".to_string(),
            name: "ACME SP. Z O.O.".to_string(),
            vat_status: "Czynny".to_string(),
            regon: Some("012345678".to_string()),
            address: "UL. PROSTA 1, 00-001 WARSZAWA".to_string(),
            accounts: vec!["12345678901234567890123456".to_string()],
        }
    }

    fn snapshot(last: Option<ConfirmedResult>) -> StatsSnapshot {
        StatsSnapshot {
            attempts: 200,
            confirmed: 3,
            elapsed: Duration::from_secs(60),
            last_confirmed: last,
        }
    }

    #[test]
    fn test_status_line() {
        colored::control::set_override(false);

        assert_eq!(
            status_line(&snapshot(None)),
            "Attempts: 200 | Found: 3 | Success: 1.50% | Rate/min: 200.0 | Last: -"
        );
        assert!(
            status_line(&snapshot(Some(result()))).ends_with("Last: 5260001246 ACME SP. Z O.O.")
        );
    }

    #[test]
    fn test_summary_block() {
        colored::control::set_override(false);

        let summary = RunSummary {
            stats: snapshot(Some(result())),
            started_at: Utc::now(),
            interrupted: true,
        };
        let block = summary_block(&summary);

        assert!(block.starts_with("--- SUMMARY ---"));
        assert!(block.contains("Attempts:   200"));
        assert!(block.contains("Success:    1.50%"));
        assert!(block.contains("Elapsed:    1m 00s"));
        assert!(block.contains("Last found: 5260001246"));
        assert!(block.contains("Interrupted"));
    }

    #[test]
    fn test_result_block() {
        colored::control::set_override(false);

        let block = result_block(&result());
        assert!(block.contains("REGON:      012345678"));
        assert!(block.contains("Address:    UL. PROSTA 1"));

        let mut bare = result();
        bare.regon = None;
        bare.address.clear();
        bare.accounts.clear();
        assert_eq!(block.lines().count(), 6);
        assert_eq!(result_block(&bare).lines().count(), 3);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(4200)), "4.2s");
        assert_eq!(format_elapsed(Duration::from_secs(187)), "3m 07s");
        assert_eq!(format_elapsed(Duration::from_secs(3723)), "1h 02m 03s");
    }
}
