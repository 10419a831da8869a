//! Consolidated JSON report and per-violation artifact files.

use crate::aggregator::ViolationAggregator;
use crate::manifest::compile;
use crate::result::RuleRunResult;
use crate::types::{SeverityCounts, Violation};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Category used in artifact names for rules without one.
pub const DEFAULT_CATEGORY: &str = "general";

/// Errors writing reports.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ReportError {
    /// The output directory could not be created.
    #[error("Failed to create directory {path}: {source}")]
    #[diagnostic(code(archgate::report::create_dir))]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A report file could not be written.
    #[error("Failed to write {path}: {source}")]
    #[diagnostic(code(archgate::report::write))]
    Write {
        /// File path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Artifacts from an earlier run could not be removed.
    #[error("Failed to clear stale artifact {path}: {source}")]
    #[diagnostic(code(archgate::report::clear))]
    Clear {
        /// File or directory path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The report could not be serialized.
    #[error("Failed to serialize report: {0}")]
    #[diagnostic(code(archgate::report::serialize))]
    Serialize(#[from] serde_json::Error),
}

/// Point-in-time summary of an aggregator, as written to `report.json`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedReport {
    /// ISO-8601 UTC creation time.
    pub timestamp: String,
    /// Units evaluated across all runs.
    pub total_units_analyzed: usize,
    /// Units that passed.
    pub total_passed: usize,
    /// Recorded violations.
    pub total_violations: usize,
    /// Violations per severity.
    pub by_severity: SeverityCounts,
    /// Runs sorted by code unit name, then rule name.
    pub rule_runs: Vec<RuleRunResult>,
}

/// Renders an aggregator's contents.
#[derive(Debug, Clone, Copy)]
pub struct Reporter<'a> {
    aggregator: &'a ViolationAggregator,
}

impl<'a> Reporter<'a> {
    /// Creates a reporter over `aggregator`.
    #[must_use]
    pub fn new(aggregator: &'a ViolationAggregator) -> Self {
        Self { aggregator }
    }

    /// Builds the report stamped with the current time.
    #[must_use]
    pub fn snapshot(&self) -> ConsolidatedReport {
        self.snapshot_at(Utc::now())
    }

    /// Builds the report stamped with `timestamp`.
    #[must_use]
    pub fn snapshot_at(&self, timestamp: DateTime<Utc>) -> ConsolidatedReport {
        let mut rule_runs = self.aggregator.runs();
        // Stable sort keeps ingestion order for equal keys.
        rule_runs.sort_by(|a, b| {
            a.code_unit_name
                .as_bytes()
                .cmp(b.code_unit_name.as_bytes())
                .then_with(|| a.rule_name.as_bytes().cmp(b.rule_name.as_bytes()))
        });
        let violations = self.aggregator.violations();

        ConsolidatedReport {
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            total_units_analyzed: rule_runs.iter().map(|r| r.units.len()).sum(),
            total_passed: rule_runs.iter().map(RuleRunResult::passed_count).sum(),
            total_violations: violations.len(),
            by_severity: SeverityCounts::tally(&violations),
            rule_runs,
        }
    }

    /// Writes the consolidated JSON report to `path`, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write_consolidated_report(&self, path: &Path) -> Result<ConsolidatedReport, ReportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir(parent)?;
        }
        let report = self.snapshot();
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).map_err(|e| ReportError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!(
            "Wrote report {} ({} run(s), {} violation(s))",
            path.display(),
            report.rule_runs.len(),
            report.total_violations
        );
        Ok(report)
    }

    /// Writes one text file per violation into `dir` and returns their paths.
    ///
    /// Files are named `<category>_<rule>_<NNN>.txt`, numbered per rule in
    /// (code unit, rule, file, line, message) order. Both name segments are
    /// reduced to `[a-z0-9-]`. Artifact files already in `dir` are removed
    /// first, so the directory holds exactly the current violations.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or a file cannot be written.
    pub fn write_violation_artifacts(&self, dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
        create_dir(dir)?;
        clear_stale_artifacts(dir)?;

        let mut violations = self.aggregator.violations();
        violations.sort_by(|a, b| {
            a.code_unit
                .cmp(&b.code_unit)
                .then_with(|| a.rule.cmp(&b.rule))
                .then_with(|| a.location.file.cmp(&b.location.file))
                .then_with(|| a.location.line.cmp(&b.location.line))
                .then_with(|| a.message.cmp(&b.message))
        });

        let mut sequence: HashMap<String, usize> = HashMap::new();
        let mut written = Vec::with_capacity(violations.len());
        for v in &violations {
            let rule = name_segment(&v.rule, "rule");
            let n = sequence.entry(rule.clone()).or_insert(0);
            *n += 1;
            let category = name_segment(
                v.category.as_deref().unwrap_or(DEFAULT_CATEGORY),
                DEFAULT_CATEGORY,
            );
            let path = dir.join(format!("{category}_{rule}_{n:03}.txt"));

            std::fs::write(&path, format_artifact(v)).map_err(|e| ReportError::Write {
                path: path.clone(),
                source: e,
            })?;
            debug!("Wrote artifact {}", path.display());
            written.push(path);
        }

        info!("Wrote {} violation artifact(s) to {}", written.len(), dir.display());
        Ok(written)
    }

    /// Renders a short terminal summary.
    #[must_use]
    pub fn format_text_summary(&self) -> String {
        let report = self.snapshot();
        let counts = report.by_severity;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Analyzed {} unit(s) in {} run(s): {} passed, {} violation(s)",
            report.total_units_analyzed,
            report.rule_runs.len(),
            report.total_passed,
            report.total_violations
        );
        let _ = writeln!(
            out,
            "  blocking: {}, advisory: {}, informational: {}",
            counts.blocking, counts.advisory, counts.informational
        );
        out
    }
}

/// Renders the fixed `KEY: value` artifact layout.
#[must_use]
pub fn format_artifact(v: &Violation) -> String {
    let fields = [
        ("RULE", v.rule.clone()),
        ("SEVERITY", v.severity.to_string()),
        ("DOC_REFERENCE", v.doc_reference.clone()),
        ("PROJECT", v.code_unit.clone()),
        ("FILE", v.location.file.display().to_string()),
        ("LINE", v.location.line.to_string()),
        ("MESSAGE", v.message.clone()),
        ("REMEDIATION_HINT", v.remediation_hint.clone()),
    ];
    let mut out = String::new();
    for (key, value) in fields {
        let _ = writeln!(out, "{key}: {}", single_line(&value));
    }
    out
}

fn single_line(value: &str) -> String {
    value.lines().map(str::trim).collect::<Vec<_>>().join(" ")
}

fn artifact_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compile(&RE, r"^[a-z0-9-]+_[a-z0-9-]+_[0-9]{3,}\.txt$")
}

/// Lowercases `raw` and replaces anything outside `[a-z0-9-]` with `-`.
fn name_segment(raw: &str, fallback: &str) -> String {
    let segment: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if segment.is_empty() {
        fallback.to_string()
    } else {
        segment
    }
}

fn clear_stale_artifacts(dir: &Path) -> Result<(), ReportError> {
    let clear_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ReportError::Clear { path, source }
    };

    let mut removed = 0;
    for entry in std::fs::read_dir(dir).map_err(clear_err(dir))? {
        let entry = entry.map_err(clear_err(dir))?;
        let path = entry.path();
        let is_artifact = path.is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| artifact_name_re().is_match(name));
        if is_artifact {
            std::fs::remove_file(&path).map_err(clear_err(&path))?;
            removed += 1;
        }
    }
    if removed > 0 {
        debug!("Removed {} stale artifact(s) from {}", removed, dir.display());
    }
    Ok(())
}

fn create_dir(path: &Path) -> Result<(), ReportError> {
    std::fs::create_dir_all(path).map_err(|e| ReportError::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::UnitAnalysisResult;
    use crate::rule::RuleDescriptor;
    use crate::types::{Location, Severity};

    fn run(rule: &str, unit: &str, failing: &[&str]) -> RuleRunResult {
        let descriptor = RuleDescriptor::new(rule, Severity::Advisory).category("design");
        let mut run = RuleRunResult::new(&descriptor, unit);
        run.push(UnitAnalysisResult::passed("Ok", "Acme.Ok", "Ok.cs", 1));
        for (i, name) in failing.iter().enumerate() {
            let v = Violation::new(
                rule,
                Severity::Advisory,
                unit,
                Location::new(format!("{name}.cs"), i + 1),
                format!("`{name}` should be sealed"),
            )
            .with_doc_ref("docs/adr/0001.md")
            .with_remediation_hint("Add the sealed modifier")
            .with_category(Some("design".to_string()));
            run.push(UnitAnalysisResult::failed(*name, format!("Acme.{name}"), v));
        }
        run
    }

    #[test]
    fn test_runs_sorted_by_unit_then_rule_ordinal() {
        let agg = ViolationAggregator::new();
        agg.ingest(vec![
            run("zeta", "b", &[]),
            run("alpha", "b", &[]),
            run("alpha", "B", &[]),
            run("alpha", "a", &[]),
        ]);
        let report = Reporter::new(&agg).snapshot();
        let keys: Vec<_> = report
            .rule_runs
            .iter()
            .map(|r| (r.code_unit_name.as_str(), r.rule_name.as_str()))
            .collect();
        assert_eq!(keys, vec![("B", "alpha"), ("a", "alpha"), ("b", "alpha"), ("b", "zeta")]);
    }

    #[test]
    fn test_empty_report_is_well_formed() {
        let dir = tempfile::tempdir().unwrap();
        let agg = ViolationAggregator::new();
        let reporter = Reporter::new(&agg);

        let path = dir.path().join("nested").join("report.json");
        let report = reporter.write_consolidated_report(&path).unwrap();
        assert_eq!(report.total_violations, 0);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["totalUnitsAnalyzed"], 0);
        assert_eq!(json["bySeverity"]["blocking"], 0);
        assert!(json["ruleRuns"].as_array().unwrap().is_empty());
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));

        let artifacts = reporter
            .write_violation_artifacts(&dir.path().join("violations"))
            .unwrap();
        assert!(artifacts.is_empty());
        assert!(dir.path().join("violations").is_dir());
    }

    #[test]
    fn test_totals() {
        let agg = ViolationAggregator::new();
        agg.ingest(vec![run("sealed-if-leaf", "Domain", &["Open", "Other"])]);
        let report = Reporter::new(&agg).snapshot();
        assert_eq!(report.total_units_analyzed, 3);
        assert_eq!(report.total_passed, 1);
        assert_eq!(report.total_violations, 2);
        assert_eq!(report.by_severity.advisory, 2);
    }

    #[test]
    fn test_artifacts_named_and_laid_out() {
        let dir = tempfile::tempdir().unwrap();
        let agg = ViolationAggregator::new();
        agg.ingest(vec![run("Sealed-If-Leaf", "Domain", &["Open", "Other"])]);

        let paths = Reporter::new(&agg).write_violation_artifacts(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["design_sealed-if-leaf_001.txt", "design_sealed-if-leaf_002.txt"]
        );

        let content = std::fs::read_to_string(&paths[0]).unwrap();
        let keys: Vec<_> = content
            .lines()
            .map(|l| l.split(':').next().unwrap())
            .collect();
        assert_eq!(
            keys,
            vec![
                "RULE",
                "SEVERITY",
                "DOC_REFERENCE",
                "PROJECT",
                "FILE",
                "LINE",
                "MESSAGE",
                "REMEDIATION_HINT"
            ]
        );
        assert!(content.contains("MESSAGE: `Open` should be sealed\n"));
        assert!(content.contains("SEVERITY: advisory\n"));
    }

    #[test]
    fn test_rewrite_removes_stale_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "keep").unwrap();
        let agg = ViolationAggregator::new();
        agg.ingest(vec![run("sealed-if-leaf", "Domain", &["Open", "Other"])]);
        let reporter = Reporter::new(&agg);
        assert_eq!(reporter.write_violation_artifacts(dir.path()).unwrap().len(), 2);

        agg.reset();
        agg.ingest(vec![run("sealed-if-leaf", "Domain", &["Open"])]);
        let written = reporter.write_violation_artifacts(dir.path()).unwrap();
        assert_eq!(written.len(), 1);

        let mut on_disk: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        on_disk.sort();
        assert_eq!(on_disk, vec!["README.md", "design_sealed-if-leaf_001.txt"]);
    }

    #[test]
    fn test_artifact_names_stay_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let agg = ViolationAggregator::new();
        let descriptor = RuleDescriptor::new("my rule", Severity::Blocking).category("../a/b");
        let mut run = RuleRunResult::new(&descriptor, "Domain");
        let v = Violation::new("my rule", Severity::Blocking, "Domain", Location::new("f", 1), "m")
            .with_category(Some("../a/b".to_string()));
        run.push(UnitAnalysisResult::failed("X", "Acme.X", v));
        agg.ingest(vec![run]);

        let paths = Reporter::new(&agg).write_violation_artifacts(dir.path()).unwrap();
        assert_eq!(paths, vec![dir.path().join("---a-b_my-rule_001.txt")]);
        assert!(paths[0].is_file());
    }

    #[test]
    fn test_artifact_flattens_newlines() {
        let v = Violation::new(
            "r",
            Severity::Blocking,
            "U",
            Location::new("f", 1),
            "line one\nline two",
        );
        let text = format_artifact(&v);
        assert!(text.contains("MESSAGE: line one line two\n"));
        assert_eq!(text.lines().count(), 8);
    }

    #[test]
    fn test_fixed_timestamp() {
        let agg = ViolationAggregator::new();
        let ts = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let report = Reporter::new(&agg).snapshot_at(ts);
        assert_eq!(report.timestamp, "2024-05-01T12:00:00Z");
    }
}
