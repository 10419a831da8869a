//! Core analyzer for orchestrating rule execution.

use crate::aggregator::ViolationAggregator;
use crate::config::Config;
use crate::context::{ProjectContext, TypeContext};
use crate::index::{GlobalIndex, GlobalIndexBuilder, IndexWarning};
use crate::model::{CodeModel, CodeUnit};
use crate::result::{RuleRunResult, UnitAnalysisResult};
use crate::rule::{ProjectRule, Rule, TypeRule};
use crate::types::Severity;

use std::any::Any;
use std::collections::{BTreeSet, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while setting up an analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Two registered rules share a name.
    #[error("Duplicate rule name: {0}")]
    DuplicateRule(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    rules: Vec<Rule>,
    config: Option<Config>,
    parallelism: Option<usize>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule of either shape.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds multiple rules.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Adds a per-type rule.
    #[must_use]
    pub fn type_rule<R: TypeRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Rule::from_type(rule));
        self
    }

    /// Adds a project-wide rule.
    #[must_use]
    pub fn project_rule<R: ProjectRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Rule::from_project(rule));
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets how many rules run concurrently, overriding the configuration.
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if two rules share a name or the configured
    /// `fail_on` threshold is invalid.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let mut names = HashSet::new();
        for rule in &self.rules {
            if !names.insert(rule.name().to_string()) {
                return Err(AnalyzerError::DuplicateRule(rule.name().to_string()));
            }
        }

        let config = self.config.unwrap_or_default();
        let fail_on = config.fail_on_severity()?;
        let parallelism = self
            .parallelism
            .or(config.analyzer.parallelism)
            .unwrap_or(1)
            .max(1);

        Ok(Analyzer {
            rules: self.rules,
            config,
            fail_on,
            parallelism,
        })
    }
}

/// Outcome of [`Analyzer::analyze`].
#[derive(Debug, Clone, Default)]
pub struct AnalysisSummary {
    /// Number of rules evaluated (disabled rules excluded).
    pub rules_run: usize,
    /// Number of rule run results produced.
    pub runs: usize,
    /// Number of evaluated units across all runs.
    pub units_analyzed: usize,
    /// Number of new violations handed to the aggregator.
    pub violations: usize,
    /// Number of names in the global index.
    pub index_size: usize,
    /// Sources skipped by the index text scan.
    pub index_warnings: Vec<IndexWarning>,
}

/// The main analyzer that orchestrates rule execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    rules: Vec<Rule>,
    config: Config,
    fail_on: Severity,
    parallelism: usize,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Registered rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gate threshold resolved from `fail_on`.
    #[must_use]
    pub fn fail_on(&self) -> Severity {
        self.fail_on
    }

    /// Severity a rule's violations carry in this run.
    #[must_use]
    pub fn effective_severity(&self, rule: &Rule) -> Severity {
        self.config
            .rule_severity(rule.name())
            .unwrap_or(rule.descriptor().default_severity)
    }

    /// Builds the index, runs every enabled rule, and feeds the aggregator.
    pub fn analyze<M>(&self, model: &M, aggregator: &ViolationAggregator) -> AnalysisSummary
    where
        M: CodeModel + ?Sized,
    {
        let units = model.list_code_units();
        info!(
            "Starting analysis: {} code unit(s), {} rule(s)",
            units.len(),
            self.rules.len()
        );

        let build = GlobalIndexBuilder::new()
            .text_scan(self.config.index.text_scan)
            .build(units);

        let enabled: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|rule| {
                let enabled = self.config.is_rule_enabled(rule.name());
                if !enabled {
                    debug!("Skipping disabled rule: {}", rule.name());
                }
                enabled
            })
            .collect();

        let mut summary = AnalysisSummary {
            rules_run: enabled.len(),
            index_size: build.index.len(),
            index_warnings: build.warnings,
            ..AnalysisSummary::default()
        };

        let tally = |results: Vec<RuleRunResult>| {
            let runs = results.len();
            let units: usize = results.iter().map(|r| r.units.len()).sum();
            let added = aggregator.ingest(results);
            (runs, units, added)
        };

        let workers = self.parallelism.min(enabled.len());
        let totals = if workers > 1 {
            debug!("Running rules on {} threads", workers);
            let next = AtomicUsize::new(0);
            std::thread::scope(|scope| {
                let handles: Vec<_> = (0..workers)
                    .map(|_| {
                        scope.spawn(|| {
                            let mut local = (0, 0, 0);
                            loop {
                                let i = next.fetch_add(1, Ordering::Relaxed);
                                let Some(rule) = enabled.get(i) else {
                                    break;
                                };
                                let (r, u, a) = tally(self.run(rule, model, units, &build.index));
                                local = (local.0 + r, local.1 + u, local.2 + a);
                            }
                            local
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .filter_map(|h| h.join().ok())
                    .fold((0, 0, 0), |acc, t| (acc.0 + t.0, acc.1 + t.1, acc.2 + t.2))
            })
        } else {
            enabled.iter().fold((0, 0, 0), |acc, rule| {
                let t = tally(self.run(rule, model, units, &build.index));
                (acc.0 + t.0, acc.1 + t.1, acc.2 + t.2)
            })
        };

        (summary.runs, summary.units_analyzed, summary.violations) = totals;
        info!(
            "Analysis complete: {} violation(s) across {} unit(s) in {} run(s)",
            summary.violations, summary.units_analyzed, summary.runs
        );
        summary
    }

    /// Runs one rule over `units`, in model order.
    ///
    /// Type rules yield one result per unit, even when it declares no types.
    /// Project rules skip units without a locatable manifest.
    pub fn run<M>(
        &self,
        rule: &Rule,
        model: &M,
        units: &[CodeUnit],
        index: &GlobalIndex,
    ) -> Vec<RuleRunResult>
    where
        M: CodeModel + ?Sized,
    {
        let severity = self.effective_severity(rule);
        debug!("Running rule {} ({}) at {}", rule.name(), rule.kind(), severity);

        match rule {
            Rule::Type(r) => units
                .iter()
                .map(|unit| run_type_rule(r.as_ref(), unit, index, severity))
                .collect(),
            Rule::Project(r) => {
                let known: BTreeSet<String> = model
                    .list_code_units()
                    .iter()
                    .map(|u| u.name().to_string())
                    .collect();
                units
                    .iter()
                    .filter_map(|unit| run_project_rule(r.as_ref(), model, unit, &known, severity))
                    .collect()
            }
        }
    }
}

fn run_type_rule(
    rule: &dyn TypeRule,
    unit: &CodeUnit,
    index: &GlobalIndex,
    severity: Severity,
) -> RuleRunResult {
    let descriptor = rule.descriptor();
    let mut run = RuleRunResult::new(descriptor, unit.name());

    for symbol in unit.declared_types() {
        let ctx = TypeContext::new(symbol, unit, index, severity);
        let outcome = contain(&descriptor.name, &symbol.full_name, || rule.evaluate(&ctx));
        run.push(match outcome.flatten() {
            Some(violation) => UnitAnalysisResult::failed(&symbol.name, &symbol.full_name, violation),
            None => UnitAnalysisResult::passed(
                &symbol.name,
                &symbol.full_name,
                &symbol.location.file,
                symbol.location.line,
            ),
        });
    }

    debug!(
        "{} on {}: {} passed, {} failed",
        descriptor.name,
        unit.name(),
        run.passed_count(),
        run.failed_count()
    );
    run
}

fn run_project_rule<M>(
    rule: &dyn ProjectRule,
    model: &M,
    unit: &CodeUnit,
    known: &BTreeSet<String>,
    severity: Severity,
) -> Option<RuleRunResult>
where
    M: CodeModel + ?Sized,
{
    let descriptor = rule.descriptor();
    let Some(manifest) = model.locate_manifest(unit.name()) else {
        debug!("{}: no manifest for {}, skipping", descriptor.name, unit.name());
        return None;
    };

    let dependencies = model.parse_manifest_dependencies(&manifest);
    let ctx = ProjectContext::new(unit, &dependencies, known, &manifest, severity);
    let violations = contain(&descriptor.name, unit.name(), || rule.evaluate(&ctx)).unwrap_or_default();

    let mut run = RuleRunResult::new(descriptor, unit.name());
    for violation in violations {
        let full_name = format!("{}: {}", unit.name(), violation.message);
        run.push(UnitAnalysisResult::failed(unit.name(), full_name, violation));
    }
    Some(run)
}

/// Runs `f`, turning a panic into `None`.
fn contain<T>(rule: &str, unit: &str, f: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            warn!(
                "Rule {} failed on {}: {}; treating as no violation",
                rule,
                unit,
                panic_message(payload.as_ref())
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
