//! CLI command implementations for the credit dashboard.
//!
//! Provides subcommand handlers for:
//! - `credit-dashboard predict <id>` — fetch the decision and default probability
//! - `credit-dashboard client <id>` — print the client's descriptive record
//! - `credit-dashboard health` — check data files, model and scoring endpoint
//! - `credit-dashboard history` — recent dashboard interactions
//! - `credit-dashboard config show|init|set|reset` — configuration management

use anyhow::{Context, Result};
use colored::Colorize;

use crate::analytics::logger::{self, InteractionLogEntry};
use crate::analytics::reporter;
use crate::config;
use crate::data::Dataset;
use crate::model::LinearModel;
use crate::scoring::{Decision, PredictionService, ScoringClient, ScoringReply};

// ---------------------------------------------------------------------------
// credit-dashboard predict
// ---------------------------------------------------------------------------

/// Look the client up locally, then ask the scoring service about it.
pub fn run_predict(client_id: &str) -> Result<()> {
    let cfg = config::load();
    let dataset = Dataset::load(&cfg.data)?;
    let selection = dataset.lookup_client(client_id)?;

    let client = ScoringClient::from_config(&cfg.scoring);
    let prediction = match client.fetch_prediction(selection.id)? {
        ScoringReply::Scored(prediction) => prediction,
        ScoringReply::Refusal(message) => anyhow::bail!("{message}"),
    };

    println!(
        "{}",
        format!("Model prediction for client {}", selection.id)
            .bold()
            .cyan()
    );
    println!("{}", "=".repeat(40));
    let decision = match prediction.decision {
        Decision::Granted => prediction.decision.to_string().green().bold(),
        Decision::Refused => prediction.decision.to_string().red().bold(),
    };
    println!("  {} {}", "Credit status:         ".bold(), decision);
    println!(
        "  {} {}",
        "Probability of default:".bold(),
        prediction.failure_label()
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// credit-dashboard client
// ---------------------------------------------------------------------------

/// Print the client's key/value record, identifier and label excluded.
pub fn run_client(client_id: &str) -> Result<()> {
    let cfg = config::load();
    let dataset = Dataset::load(&cfg.data)?;
    let selection = dataset.lookup_client(client_id)?;

    println!(
        "{}",
        format!("Descriptive information for client {}", selection.id)
            .bold()
            .cyan()
    );
    println!("{}", "=".repeat(60));

    let width = selection
        .display
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);
    for (name, value) in &selection.display {
        let rendered = value.to_string();
        let rendered = if value.is_missing() {
            rendered.dimmed()
        } else {
            rendered.normal()
        };
        println!("  {:<width$}  {}", name.bold(), rendered);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// credit-dashboard health
// ---------------------------------------------------------------------------

/// Check config files, both tables, the model artifact and the scoring API.
pub fn run_health() -> Result<()> {
    println!("{}", "Credit Dashboard Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    // 0. Config file status
    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.credit-dashboard/config.toml found"
        } else {
            "not found (run `credit-dashboard config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".credit-dashboard.toml found"
        } else {
            "none (optional)"
        },
    );

    // 1. Tables
    let dataset = Dataset::load(&cfg.data);
    match &dataset {
        Ok(dataset) => print_health_item(
            "Client tables",
            true,
            &format!(
                "{} clients, {} model features",
                format_number(dataset.clients().len()),
                dataset.features().columns().len()
            ),
        ),
        Err(e) => print_health_item("Client tables", false, &format!("{e:#}")),
    }

    // 2. Model artifact
    match LinearModel::load(&cfg.data.model_path) {
        Ok(model) => {
            let fits = match &dataset {
                Ok(dataset) => model.check_columns(dataset.features().columns()),
                Err(_) => Ok(()),
            };
            match fits {
                Ok(()) => print_health_item(
                    "Model artifact",
                    true,
                    &format!("{} coefficients", model.n_features()),
                ),
                Err(e) => print_health_item("Model artifact", false, &format!("{e:#}")),
            }
        }
        Err(e) => print_health_item("Model artifact", false, &format!("{e:#}")),
    }

    // 3. Scoring endpoint
    let client = ScoringClient::from_config(&cfg.scoring);
    let reachable = client.is_reachable();
    let detail = if reachable {
        format!("reachable at {}", client.url())
    } else {
        format!("not reachable at {}", client.url())
    };
    print_health_item("Scoring API", reachable, &detail);

    // 4. Interaction log
    let log_path = logger::interaction_log_path(&cfg.logging);
    let log_exists = log_path.as_ref().is_some_and(|p| p.exists());
    let log_detail = match (&log_path, cfg.logging.enabled) {
        (_, false) => "disabled".to_string(),
        (Some(p), true) if log_exists => p.display().to_string(),
        (Some(_), true) => "no interactions recorded yet".to_string(),
        (None, true) => "could not determine home directory".to_string(),
    };
    print_health_item("Interaction log", log_exists, &log_detail);

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// credit-dashboard history
// ---------------------------------------------------------------------------

/// Show the most recent interactions and a summary of them.
pub fn run_history(limit: usize) -> Result<()> {
    let cfg = config::load();
    let entries = logger::read_recent(&cfg.logging, limit);

    if entries.is_empty() {
        println!(
            "{}",
            "No interactions yet. Open the dashboard with `credit-dashboard serve`.".yellow()
        );
        return Ok(());
    }

    println!("{}", "Recent Dashboard Interactions".bold().cyan());
    println!("{}", "=".repeat(78));
    println!(
        "  {:<20} {:<8} {:<16} {:<16} {:>8}",
        "Time".bold(),
        "Client".bold(),
        "Section".bold(),
        "Outcome".bold(),
        "ms".bold()
    );
    for entry in &entries {
        print_history_row(entry);
    }

    let summary = reporter::summarize(&entries);
    println!();
    println!("  {} {}", "Interactions:    ".bold(), summary.total);
    println!("  {} {:.1}%", "Success rate:    ".bold(), summary.success_pct());
    println!("  {} {}", "Distinct clients:".bold(), summary.distinct_clients);
    println!("  {} {:.0} ms", "Avg latency:     ".bold(), summary.avg_latency_ms);
    let outcomes: Vec<String> = summary
        .outcomes
        .iter()
        .map(|(name, count)| format!("{name} {count}"))
        .collect();
    println!("  {} {}", "Outcomes:        ".bold(), outcomes.join(", "));

    Ok(())
}

fn print_history_row(entry: &InteractionLogEntry) {
    let time = chrono::DateTime::parse_from_rfc3339(&entry.timestamp)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|_| truncate(&entry.timestamp, 19));
    let outcome = match entry.status_code {
        Some(code) => format!("{} {code}", entry.outcome),
        None => entry.outcome.clone(),
    };
    println!(
        "  {:<20} {:<8} {:<16} {:<16} {:>8}",
        time,
        truncate(&entry.input, 8),
        entry.section,
        colorize_outcome(&outcome, entry.succeeded()),
        entry.latency_ms
    );
}

// ---------------------------------------------------------------------------
// credit-dashboard config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective Dashboard Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    // Show source info
    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.credit-dashboard/config.toml", global_exists);
    print_source(".credit-dashboard.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "CREDIT_DASHBOARD_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.credit-dashboard/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Edit the file to point the dashboard at your data and scoring API.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)
        .with_context(|| format!("failed to set {key}"))?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

fn colorize_outcome(outcome: &str, ok: bool) -> colored::ColoredString {
    if ok { outcome.green() } else { outcome.red() }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(307511), "307,511");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("100002", 8), "100002");
        assert_eq!(truncate("1000021234", 8), "1000021…");
        assert_eq!(truncate("éééé", 3), "éé…");
    }

    #[test]
    fn test_colorize_outcome_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(colorize_outcome("rendered", true).to_string(), "rendered");
        assert_eq!(colorize_outcome("not_found", false).to_string(), "not_found");
    }
}
