//! End-to-end pipeline tests over the `layered` fixture: snapshot loading,
//! global index, analysis, aggregation, and reporting.

use archgate_core::{
    Analyzer, CodeModel, Config, GlobalIndexBuilder, IndexConfig, ProjectContext, ProjectRule,
    Reporter, RuleDescriptor, Severity, SnapshotModel, TypeContext, TypeRule, UnitStatus,
    Violation, ViolationAggregator,
};
use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/layered")
}

fn load() -> SnapshotModel {
    SnapshotModel::load(&fixture().join("symbols.json"), &IndexConfig::default()).unwrap()
}

/// Flags open classes nobody inherits from.
struct OpenLeaf(RuleDescriptor);

impl OpenLeaf {
    fn new() -> Self {
        Self(RuleDescriptor::new("open-leaf", Severity::Advisory).category("design"))
    }
}

impl TypeRule for OpenLeaf {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.0
    }

    fn evaluate(&self, ctx: &TypeContext<'_>) -> Option<Violation> {
        let s = ctx.symbol;
        if s.is_sealed || s.is_abstract || ctx.index.is_base_type(s) {
            return None;
        }
        Some(ctx.violation(&self.0, format!("`{}` is an open leaf", s.full_name), "seal it"))
    }
}

/// Forbids references to one named unit.
struct NoReferenceTo(RuleDescriptor, &'static str);

impl NoReferenceTo {
    fn new(target: &'static str) -> Self {
        Self(RuleDescriptor::new("no-reference", Severity::Blocking), target)
    }
}

impl ProjectRule for NoReferenceTo {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.0
    }

    fn evaluate(&self, ctx: &ProjectContext<'_>) -> Vec<Violation> {
        ctx.dependencies
            .code_unit_references
            .iter()
            .filter(|d| d.name == self.1 && ctx.code_unit.name() != self.1)
            .map(|d| ctx.violation(&self.0, d.line, format!("references {}", d.name), "remove it"))
            .collect()
    }
}

fn analyzer(parallelism: usize) -> Analyzer {
    Analyzer::builder()
        .type_rule(OpenLeaf::new())
        .project_rule(NoReferenceTo::new("Infra"))
        .config(Config::default())
        .parallelism(parallelism)
        .build()
        .unwrap()
}

#[test]
fn snapshot_resolves_units_sources_and_manifests() {
    let model = load();
    let names: Vec<&str> = model.list_code_units().iter().map(|u| u.name()).collect();
    assert_eq!(names, ["Domain", "Infra", "DomainEntities"]);

    let infra = &model.list_code_units()[1];
    assert_eq!(infra.source_files().len(), 2);

    let manifest = model.locate_manifest("Domain").unwrap();
    assert!(manifest.ends_with("Domain/Domain.csproj"));
    let deps = model.parse_manifest_dependencies(&manifest);
    let refs: Vec<(&str, usize)> = deps
        .code_unit_references
        .iter()
        .map(|d| (d.name.as_str(), d.line))
        .collect();
    assert_eq!(refs, [("DomainEntities", 6), ("Infra", 7)]);

    let deps = model.parse_manifest_dependencies(&model.locate_manifest("Infra").unwrap());
    assert_eq!(deps.package_references[0].name, "Dapper");
}

#[test]
fn global_index_merges_compiled_and_textual_bases() {
    let model = load();
    let build = GlobalIndexBuilder::new().build(model.list_code_units());
    assert!(build.index.contains("Acme.Domain.Entity"));
    assert!(build.index.contains("Entity"));
    // Only LegacyAggregate.cs, absent from the snapshot, inherits it.
    assert!(build.index.contains("AggregateRoot"));
    assert!(build.warnings.is_empty());
    assert_eq!(build.files_scanned, 6);

    let compiled_only = GlobalIndexBuilder::new()
        .text_scan(false)
        .build(model.list_code_units());
    assert!(!compiled_only.index.contains("AggregateRoot"));
}

#[test]
fn analysis_covers_every_unit_and_gates_on_blocking() {
    let model = load();
    let aggregator = ViolationAggregator::new();
    let summary = analyzer(1).analyze(&model, &aggregator);

    assert_eq!(summary.rules_run, 2);
    assert_eq!(summary.runs, 6);
    // Four Domain types, one Infra type, one forbidden edge.
    assert_eq!(summary.units_analyzed, 6);
    assert_eq!(summary.violations, 2);

    let violations = aggregator.violations();
    let open = violations.iter().find(|v| v.rule == "open-leaf").unwrap();
    assert!(open.message.contains("Acme.Domain.Open"));
    assert_eq!(open.severity, Severity::Advisory);

    let edge = violations.iter().find(|v| v.rule == "no-reference").unwrap();
    assert_eq!(edge.code_unit, "Domain");
    assert!(edge.location.file.ends_with("Domain/Domain.csproj"));
    assert_eq!(edge.location.line, 7);

    assert!(aggregator.has_blocking_violations());
    assert!(aggregator.format_gate_report(Severity::Blocking).contains("1 violation(s)"));
}

#[test]
fn report_is_ordered_and_deterministic_across_parallelism() {
    let model = load();
    let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

    let sequential = ViolationAggregator::new();
    analyzer(1).analyze(&model, &sequential);
    let parallel = ViolationAggregator::new();
    analyzer(4).analyze(&model, &parallel);

    let a = Reporter::new(&sequential).snapshot_at(at);
    let b = Reporter::new(&parallel).snapshot_at(at);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );

    assert_eq!(a.timestamp, "2026-01-02T03:04:05Z");
    assert_eq!(a.total_units_analyzed, 6);
    assert_eq!(a.total_passed, 4);
    assert_eq!(a.total_violations, 2);
    assert_eq!(a.by_severity.blocking, 1);
    assert_eq!(a.by_severity.advisory, 1);

    let order: Vec<(&str, &str)> = a
        .rule_runs
        .iter()
        .map(|r| (r.code_unit_name.as_str(), r.rule_name.as_str()))
        .collect();
    assert_eq!(
        order,
        [
            ("Domain", "no-reference"),
            ("Domain", "open-leaf"),
            ("DomainEntities", "no-reference"),
            ("DomainEntities", "open-leaf"),
            ("Infra", "no-reference"),
            ("Infra", "open-leaf"),
        ]
    );
    assert!(a.rule_runs[3].units.is_empty());
    assert_eq!(a.rule_runs[0].units[0].status(), UnitStatus::Failed);
}

#[test]
fn reanalysis_is_idempotent_until_reset() {
    let model = load();
    let analyzer = analyzer(1);
    let aggregator = ViolationAggregator::new();

    analyzer.analyze(&model, &aggregator);
    let second = analyzer.analyze(&model, &aggregator);
    assert_eq!(second.violations, 0);
    assert_eq!(aggregator.violation_count(), 2);
    assert_eq!(aggregator.runs().len(), 6);

    aggregator.reset();
    assert_eq!(aggregator.violation_count(), 0);
    analyzer.analyze(&model, &aggregator);
    assert_eq!(aggregator.violation_count(), 2);
}

#[test]
fn reports_and_artifacts_are_written() {
    let model = load();
    let aggregator = ViolationAggregator::new();
    analyzer(1).analyze(&model, &aggregator);

    let out = TempDir::new().unwrap();
    let reporter = Reporter::new(&aggregator);
    let report_path = out.path().join("archgate/report.json");
    reporter.write_consolidated_report(&report_path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["totalViolations"], 2);
    assert_eq!(json["ruleRuns"].as_array().unwrap().len(), 6);

    let written = reporter
        .write_violation_artifacts(&out.path().join("archgate/violations"))
        .unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["general_no-reference_001.txt", "design_open-leaf_001.txt"]);

    let artifact = std::fs::read_to_string(&written[0]).unwrap();
    assert!(artifact.starts_with("RULE: no-reference\n"));
    assert!(artifact.contains("SEVERITY: blocking"));
}

#[test]
fn empty_aggregator_reports_zeroes() {
    let aggregator = ViolationAggregator::new();
    let report = Reporter::new(&aggregator).snapshot();
    assert_eq!(report.total_units_analyzed, 0);
    assert_eq!(report.total_violations, 0);
    assert!(report.rule_runs.is_empty());
    assert!(!aggregator.has_blocking_violations());
}
