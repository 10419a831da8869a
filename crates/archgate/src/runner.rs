//! Test-suite entry point: run the rules, write the reports, fail on the gate.

use archgate_core::{
    Analyzer, Config, Reporter, Severity, SnapshotModel, ViolationAggregator,
};
use archgate_rules::Preset;
use std::path::{Path, PathBuf};

/// Runs archgate as part of a test suite.
///
/// `root` is the directory holding `archgate.toml`; relative paths in the
/// config resolve against it. Arguments override the config file.
/// Returns the aggregator when the gate passes so callers can assert more.
///
/// # Panics
///
/// Panics with a formatted report if violations at or above `fail_on`
/// severity are found, or if the config, snapshot, or reports cannot be
/// processed.
pub fn run_check(
    root: &Path,
    preset: Option<&str>,
    config_path: Option<&str>,
    fail_on: Option<&str>,
) -> ViolationAggregator {
    let config = load_config(root, config_path);

    let effective_preset = resolve_preset(preset);
    let effective_fail_on = resolve_fail_on(fail_on, &config);

    let Some(snapshot) = config.analyzer.snapshot.as_deref() else {
        panic!("archgate: no snapshot configured under [analyzer] in archgate.toml");
    };
    let snapshot = in_root(root, snapshot);
    let model = SnapshotModel::load(&snapshot, &config.index).unwrap_or_else(|e| {
        panic!("archgate: {e}");
    });

    let report_path = in_root(root, &config.report.report_path());
    let violations_dir = in_root(root, &config.report.violations_path());

    let analyzer = Analyzer::builder()
        .rules(effective_preset.rules(&config))
        .config(config)
        .build()
        .unwrap_or_else(|e| {
            panic!("archgate: failed to build analyzer: {e}");
        });

    let aggregator = ViolationAggregator::new();
    analyzer.analyze(&model, &aggregator);

    let reporter = Reporter::new(&aggregator);
    if let Err(e) = reporter
        .write_consolidated_report(&report_path)
        .and_then(|_| reporter.write_violation_artifacts(&violations_dir))
    {
        panic!("archgate: failed to write reports: {e}");
    }

    if aggregator.has_violations_at(effective_fail_on) {
        let report = aggregator.format_gate_report(effective_fail_on);
        panic!("{report}");
    }
    aggregator
}

fn in_root(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Reads the explicit config, then the project config in `root`, then
/// defaults.
fn load_config(root: &Path, explicit_path: Option<&str>) -> Config {
    let path = match explicit_path {
        Some(path) => Some(in_root(root, Path::new(path))),
        None => Config::find_in(root),
    };

    match path {
        Some(path) => Config::from_file(&path).unwrap_or_else(|e| {
            panic!("archgate: failed to load config from {}: {e}", path.display());
        }),
        None => Config::default(),
    }
}

/// Resolves the effective preset from the argument, defaulting to recommended.
fn resolve_preset(arg: Option<&str>) -> Preset {
    let name = arg.unwrap_or("recommended");
    Preset::parse(name).unwrap_or_else(|| {
        panic!("archgate: unknown preset `{name}`. Valid presets: recommended, minimal")
    })
}

/// Resolves the effective `fail_on` severity.
///
/// Priority: explicit argument > config file > default ("blocking").
fn resolve_fail_on(arg: Option<&str>, config: &Config) -> Severity {
    match arg {
        Some(name) => Severity::parse(name).unwrap_or_else(|| {
            panic!(
                "archgate: unknown severity `{name}`. Valid values: blocking, advisory, informational"
            )
        }),
        None => config
            .fail_on_severity()
            .unwrap_or_else(|e| panic!("archgate: {e}")),
    }
}
