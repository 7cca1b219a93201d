//! Score command handler.
//!
//! Implements the `score` subcommand: resolve the target, evaluate it and
//! report the scorecard.

use super::{exit_codes, resolve_target, should_use_color, write_output, OutputTarget};
use crate::config::{AppConfig, Validatable};
use crate::hosting::GitHubClient;
use crate::metrics::MetricKind;
use crate::scoring::{Evaluation, MetricStatus, Scorer};
use anyhow::{bail, Result};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Output format of the `score` subcommand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Summary,
    /// Scorecard with per-metric status as JSON
    Json,
    /// Flat package rating record as JSON
    Rating,
}

/// Score command configuration
pub struct ScoreConfig {
    /// `owner/repo`, GitHub URL or npm package link
    pub target: String,
    pub output: OutputFormat,
    pub output_file: Option<PathBuf>,
    /// Exit with code 1 when the NetScore is below this
    pub min_score: Option<f64>,
    pub no_color: bool,
    pub app: AppConfig,
}

/// Run the score command, returning the desired exit code.
pub fn run_score(config: ScoreConfig) -> Result<i32> {
    let problems = config.app.validate();
    if !problems.is_empty() {
        let list: Vec<String> = problems.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", list.join("\n  "));
    }

    let repo = resolve_target(&config.target, &config.app.hosting)?;
    let client = Arc::new(GitHubClient::new(&config.app.hosting)?);
    let scorer = Scorer::new(client, &config.app)?;
    let evaluation = scorer.evaluate(&repo.owner, &repo.repo)?;

    for (kind, stats) in scorer.cache_stats() {
        tracing::debug!(
            "{kind} cache: {} entries, {} hits, {} misses",
            stats.total_entries,
            stats.hits,
            stats.misses
        );
    }

    let output_text = match config.output {
        OutputFormat::Json => format_score_json(&evaluation),
        OutputFormat::Rating => {
            serde_json::to_string_pretty(&evaluation.scorecard.to_rating()).unwrap_or_default()
        }
        OutputFormat::Summary => format_score_summary(&evaluation, should_use_color(config.no_color)),
    };
    write_output(&output_text, &OutputTarget::from_option(config.output_file))?;

    let net_score = evaluation.scorecard.net_score();
    if let Some(threshold) = config.min_score {
        if net_score < threshold {
            tracing::error!("NetScore {net_score:.3} is below minimum threshold {threshold:.3}");
            return Ok(exit_codes::BELOW_THRESHOLD);
        }
    }

    Ok(exit_codes::SUCCESS)
}

fn status_label(status: &MetricStatus) -> String {
    match status {
        MetricStatus::Pending => "pending".to_string(),
        MetricStatus::Scored => "scored".to_string(),
        MetricStatus::Unknown(reason) => format!("unknown ({reason})"),
        MetricStatus::TimedOut => "timed out".to_string(),
        MetricStatus::Panicked(message) => format!("panicked ({message})"),
    }
}

/// Format the evaluation as JSON
fn format_score_json(evaluation: &Evaluation) -> String {
    let card = &evaluation.scorecard;
    let metrics: serde_json::Map<String, serde_json::Value> = MetricKind::ALL
        .iter()
        .map(|kind| {
            let result = card.metric(*kind);
            let key = serde_json::to_value(kind)
                .ok()
                .and_then(|v| v.as_str().map(ToString::to_string))
                .unwrap_or_else(|| kind.name().to_string());
            (
                key,
                json!({
                    "value": result.value,
                    "latencySecs": result.latency_secs,
                    "weight": kind.weight(),
                    "status": card.status(*kind),
                }),
            )
        })
        .collect();

    let output = json!({
        "tool": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "repository": evaluation.repository.to_string(),
        "netScore": card.net_score(),
        "netScoreLatency": card.net_score_latency(),
        "metrics": metrics,
    });
    serde_json::to_string_pretty(&output).unwrap_or_default()
}

/// Format the evaluation for terminal output
fn format_score_summary(evaluation: &Evaluation, use_color: bool) -> String {
    let card = &evaluation.scorecard;
    let reset = if use_color { "\x1b[0m" } else { "" };
    let color_for = |value: f64| {
        if !use_color {
            ""
        } else if value >= 0.7 {
            "\x1b[32m" // Green
        } else if value >= 0.4 {
            "\x1b[33m" // Yellow
        } else {
            "\x1b[31m" // Red
        }
    };

    let mut lines = vec![
        format!("Repository Trust Report: {}", evaluation.repository),
        String::new(),
        format!(
            "NetScore: {}{:.3}{} ({:.3}s)",
            color_for(card.net_score()),
            card.net_score(),
            reset,
            card.net_score_latency()
        ),
        String::new(),
        "Metrics:".to_string(),
    ];

    for kind in MetricKind::ALL {
        let result = card.metric(kind);
        let status = card.status(kind);
        let note = if status == MetricStatus::Scored {
            String::new()
        } else {
            format!("  [{}]", status_label(&status))
        };
        lines.push(format!(
            "  {:<24}{}{:.3}{}  x{:<5} {:>8.3}s{note}",
            kind.name(),
            color_for(result.value),
            result.value,
            reset,
            kind.weight(),
            result.latency_secs,
        ));
    }

    let undetermined = card.undetermined();
    if !undetermined.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "{} metric(s) fell back to their default score.",
            undetermined.len()
        ));
    }

    lines.join("\n")
}
