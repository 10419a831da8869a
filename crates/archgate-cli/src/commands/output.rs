//! Terminal output for check results.

use anyhow::Result;
use archgate_core::{ConsolidatedReport, Severity, ViolationAggregator};

use crate::OutputFormat;

/// Print check results in the specified format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print(
    aggregator: &ViolationAggregator,
    report: &ConsolidatedReport,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(aggregator, report),
        OutputFormat::Json => return print_json(report),
        OutputFormat::Compact => print_compact(aggregator),
    }
    Ok(())
}

fn print_text(aggregator: &ViolationAggregator, report: &ConsolidatedReport) {
    let counts = report.by_severity;

    for violation in sorted(aggregator) {
        let severity_indicator = match violation.severity {
            Severity::Blocking => "\x1b[31mblocking\x1b[0m",
            Severity::Advisory => "\x1b[33madvisory\x1b[0m",
            Severity::Informational => "\x1b[34minformational\x1b[0m",
        };

        println!(
            "{} [{}] at {}",
            violation.rule, violation.code_unit, violation.location
        );
        println!("  {}: {}", severity_indicator, violation.message);
        if !violation.remediation_hint.is_empty() {
            println!("  = help: {}", violation.remediation_hint);
        }
        if !violation.doc_reference.is_empty() {
            println!("  = see: {}", violation.doc_reference);
        }
        println!();
    }

    let summary_color = if counts.blocking > 0 {
        "\x1b[31m"
    } else if counts.advisory > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} blocking, {} advisory, {} informational in {} unit(s) ({} passed)\x1b[0m",
        summary_color,
        counts.blocking,
        counts.advisory,
        counts.informational,
        report.total_units_analyzed,
        report.total_passed
    );
}

fn print_json(report: &ConsolidatedReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}

fn print_compact(aggregator: &ViolationAggregator) {
    for violation in sorted(aggregator) {
        println!(
            "{}: {} [{}] {}",
            violation.location, violation.severity, violation.rule, violation.message,
        );
    }
}

fn sorted(aggregator: &ViolationAggregator) -> Vec<archgate_core::Violation> {
    let mut violations = aggregator.violations();
    violations.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.location.file.cmp(&b.location.file))
            .then_with(|| a.location.line.cmp(&b.location.line))
    });
    violations
}
