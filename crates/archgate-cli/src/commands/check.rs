//! Check command implementation.

use super::output;
use crate::config_resolver::ResolvedConfig;
use crate::OutputFormat;
use anyhow::{bail, Context, Result};
use archgate_core::{Analyzer, Config, Reporter, Rule, SnapshotModel, ViolationAggregator};
use archgate_rules::{rule_by_name, Preset, RULE_NAMES};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Options for the check command.
#[derive(Debug, Default)]
pub struct CheckOptions {
    /// Snapshot path overriding `[analyzer] snapshot`.
    pub snapshot: Option<PathBuf>,
    /// Output directory overriding `[report] output_dir`.
    pub output_dir: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated rule filter, taking precedence over `preset`.
    pub rules: Option<String>,
    /// Rule preset (default: recommended).
    pub preset: Option<String>,
    /// Whether to write per-violation artifacts.
    pub artifacts: bool,
}

/// Runs the check command.
///
/// Returns `true` when the gate fails.
///
/// # Errors
///
/// Returns an error if the snapshot, rule selection, or reports cannot be
/// processed.
pub fn run(resolved: &ResolvedConfig, options: &CheckOptions) -> Result<bool> {
    let config = &resolved.config;
    debug!("Config source: {:?}", resolved.source);
    let snapshot = resolved.snapshot_path(options.snapshot.as_deref())?;
    let model = SnapshotModel::load(&snapshot, &config.index)
        .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))?;

    let output_dir = resolved.output_dir(options.output_dir.as_deref());
    let report_path = output_dir.join(&config.report.report_file);
    let violations_dir = output_dir.join(&config.report.violations_dir);

    let rules = select_rules(options.rules.as_deref(), options.preset.as_deref(), config)?;
    let analyzer = Analyzer::builder().rules(rules).config(config.clone()).build()?;
    info!("Running {} rule(s) against {}", analyzer.rule_count(), snapshot.display());

    let aggregator = ViolationAggregator::new();
    let summary = analyzer.analyze(&model, &aggregator);
    if !summary.index_warnings.is_empty() {
        warn!(
            "Global index is partial: {} source file(s) could not be read",
            summary.index_warnings.len()
        );
    }

    let reporter = Reporter::new(&aggregator);
    let report = reporter.write_consolidated_report(&report_path)?;
    if options.artifacts {
        reporter.write_violation_artifacts(&violations_dir)?;
    }

    output::print(&aggregator, &report, options.format)?;

    let fail_on = analyzer.fail_on();
    let blocked = aggregator.has_violations_at(fail_on);
    if blocked {
        eprintln!("{}", aggregator.format_gate_report(fail_on));
    }
    Ok(blocked)
}

/// Builds the rules named in `filter`, or the rules of `preset`.
///
/// # Errors
///
/// Returns an error naming the first unknown rule or an unknown preset.
pub fn select_rules(filter: Option<&str>, preset: Option<&str>, config: &Config) -> Result<Vec<Rule>> {
    let Some(filter) = filter else {
        let name = preset.unwrap_or("recommended");
        let Some(preset) = Preset::parse(name) else {
            bail!("Unknown preset `{name}`. Use `recommended` or `minimal`.");
        };
        return Ok(preset.rules(config));
    };

    let mut rules = Vec::new();
    for name in filter.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some(rule) = rule_by_name(name, config) else {
            bail!(
                "Unknown rule `{}`. Available rules: {}",
                name,
                RULE_NAMES.join(", ")
            );
        };
        rules.push(rule);
    }
    Ok(rules)
}
