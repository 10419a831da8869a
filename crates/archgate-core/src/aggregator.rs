//! Thread-safe collection of rule results for a whole run.
//!
//! The aggregator keeps every ingested [`RuleRunResult`] as history and a flat
//! list of the violations they contain. Re-submitting the same results is a
//! no-op: runs and unit outcomes are recognised by content [`Identity`].

use crate::result::{Identity, RuleRunResult};
use crate::types::{Severity, SeverityCounts, Violation};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Default)]
struct State {
    runs: Vec<RuleRunResult>,
    violations: Vec<Violation>,
    seen_runs: HashSet<Identity>,
    seen_units: HashSet<Identity>,
}

/// Collects results from every rule of a run. All methods take `&self` and
/// may be called from several threads at once.
#[derive(Debug, Default)]
pub struct ViolationAggregator {
    state: Mutex<State>,
}

impl ViolationAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State stays consistent across a panic in another holder: every
        // mutation below is a plain push or insert.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records results, skipping runs and unit outcomes already seen.
    ///
    /// A run overlapping an earlier one is kept with only its unseen units,
    /// so every recorded violation belongs to exactly one recorded run.
    /// Returns the number of new violations recorded.
    pub fn ingest(&self, results: impl IntoIterator<Item = RuleRunResult>) -> usize {
        let mut state = self.lock();
        let mut added = 0;

        for mut run in results {
            if !state.seen_runs.insert(run.identity()) {
                debug!(
                    "Skipping already ingested run {} / {}",
                    run.rule_name, run.code_unit_name
                );
                continue;
            }
            let ids: Vec<Identity> = run.units.iter().map(|u| run.unit_identity(u)).collect();
            let units = std::mem::take(&mut run.units);
            for (unit, id) in units.into_iter().zip(ids) {
                if !state.seen_units.insert(id) {
                    debug!(
                        "Dropping already recorded unit {} from {} / {}",
                        unit.unit_full_name(),
                        run.rule_name,
                        run.code_unit_name
                    );
                    continue;
                }
                if let Some(violation) = unit.violation() {
                    state.violations.push(violation.clone());
                    added += 1;
                }
                run.units.push(unit);
            }
            state.runs.push(run);
        }
        added
    }

    /// Returns true if any recorded violation is blocking.
    #[must_use]
    pub fn has_blocking_violations(&self) -> bool {
        self.lock().violations.iter().any(|v| v.severity.is_blocking())
    }

    /// Checks if any violation meets or exceeds the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.lock().violations.iter().any(|v| v.severity >= severity)
    }

    /// Snapshot of recorded violations in ingestion order.
    #[must_use]
    pub fn violations(&self) -> Vec<Violation> {
        self.lock().violations.clone()
    }

    /// Snapshot of ingested runs in ingestion order.
    #[must_use]
    pub fn runs(&self) -> Vec<RuleRunResult> {
        self.lock().runs.clone()
    }

    /// Number of recorded violations.
    #[must_use]
    pub fn violation_count(&self) -> usize {
        self.lock().violations.len()
    }

    /// Counts violations by severity.
    #[must_use]
    pub fn severity_counts(&self) -> SeverityCounts {
        SeverityCounts::tally(&self.lock().violations)
    }

    /// Forgets everything, for reuse across runs.
    pub fn reset(&self) {
        *self.lock() = State::default();
    }

    /// Formats violations at or above `fail_on` as a test failure report.
    ///
    /// Produces a human-readable multi-line report suitable for `panic!()`
    /// messages in `cargo test` integration.
    #[must_use]
    pub fn format_gate_report(&self, fail_on: Severity) -> String {
        use std::fmt::Write;

        let state = self.lock();
        let failing: Vec<&Violation> = state
            .violations
            .iter()
            .filter(|v| v.severity >= fail_on)
            .collect();

        let mut report = String::new();
        let _ = writeln!(report, "\n=== archgate: {} violation(s) ===\n", failing.len());

        for v in &failing {
            let _ = write!(report, "{}", v.format());
            let _ = writeln!(report);
        }

        let counts = SeverityCounts::tally(&state.violations);
        let units: usize = state.runs.iter().map(|r| r.units.len()).sum();
        let _ = writeln!(
            report,
            "Total: {} blocking, {} advisory, {} informational in {} unit(s)",
            counts.blocking, counts.advisory, counts.informational, units
        );

        report
    }
}
