//! Per-unit and per-(rule, code unit) analysis outcomes.

use crate::rule::RuleDescriptor;
use crate::types::{Severity, Violation};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Pass/fail status of one evaluated unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnitStatus {
    /// The rule found nothing.
    Passed,
    /// The rule reported a violation.
    Failed,
}

/// Outcome for one evaluated unit: a type, or one dependency edge of a project.
///
/// A violation is present iff the status is [`UnitStatus::Failed`]; the two
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitAnalysisResult {
    unit_name: String,
    unit_full_name: String,
    file: PathBuf,
    line: usize,
    status: UnitStatus,
    violation: Option<Violation>,
}

impl UnitAnalysisResult {
    /// Creates a passing result.
    #[must_use]
    pub fn passed(
        unit_name: impl Into<String>,
        unit_full_name: impl Into<String>,
        file: impl Into<PathBuf>,
        line: usize,
    ) -> Self {
        Self {
            unit_name: unit_name.into(),
            unit_full_name: unit_full_name.into(),
            file: file.into(),
            line,
            status: UnitStatus::Passed,
            violation: None,
        }
    }

    /// Creates a failing result carrying `violation`.
    #[must_use]
    pub fn failed(
        unit_name: impl Into<String>,
        unit_full_name: impl Into<String>,
        violation: Violation,
    ) -> Self {
        Self {
            unit_name: unit_name.into(),
            unit_full_name: unit_full_name.into(),
            file: violation.location.file.clone(),
            line: violation.location.line,
            status: UnitStatus::Failed,
            violation: Some(violation),
        }
    }

    /// Simple name of the unit.
    #[must_use]
    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    /// Fully-qualified (or synthesized) name of the unit.
    #[must_use]
    pub fn unit_full_name(&self) -> &str {
        &self.unit_full_name
    }

    /// File the unit lives in.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Line of the unit's declaration.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Pass/fail status.
    #[must_use]
    pub fn status(&self) -> UnitStatus {
        self.status
    }

    /// Returns true if the unit passed.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.status == UnitStatus::Passed
    }

    /// The violation, present iff failed.
    #[must_use]
    pub fn violation(&self) -> Option<&Violation> {
        self.violation.as_ref()
    }
}

/// Results of one rule over one code unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRunResult {
    /// Rule name.
    pub rule_name: String,
    /// Rule description.
    pub rule_description: String,
    /// Default severity declared by the rule.
    pub default_severity: Severity,
    /// Rationale document reference.
    pub doc_reference: String,
    /// Optional classification tag of the rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_category: Option<String>,
    /// Name of the code unit analyzed.
    pub code_unit_name: String,
    /// Per-unit outcomes in evaluation order.
    pub units: Vec<UnitAnalysisResult>,
}

impl RuleRunResult {
    /// Creates an empty result for `descriptor` over `code_unit_name`.
    #[must_use]
    pub fn new(descriptor: &RuleDescriptor, code_unit_name: impl Into<String>) -> Self {
        Self {
            rule_name: descriptor.name.clone(),
            rule_description: descriptor.description.clone(),
            default_severity: descriptor.default_severity,
            doc_reference: descriptor.doc_reference.clone(),
            rule_category: descriptor.category.clone(),
            code_unit_name: code_unit_name.into(),
            units: Vec::new(),
        }
    }

    /// Appends a unit outcome.
    pub fn push(&mut self, unit: UnitAnalysisResult) {
        self.units.push(unit);
    }

    /// Number of passed units.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.units.iter().filter(|u| u.is_passed()).count()
    }

    /// Number of failed units.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.units.len() - self.passed_count()
    }

    /// Iterates over the violations of failed units.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.units.iter().filter_map(UnitAnalysisResult::violation)
    }

    /// Content identity of one unit outcome within this run.
    #[must_use]
    pub fn unit_identity(&self, unit: &UnitAnalysisResult) -> Identity {
        Identity::of(&[
            self.rule_name.as_bytes(),
            self.code_unit_name.as_bytes(),
            unit.unit_full_name.as_bytes(),
            unit.file.to_string_lossy().as_bytes(),
            unit.line.to_string().as_bytes(),
        ])
    }

    /// Content identity of the whole run.
    #[must_use]
    pub fn identity(&self) -> Identity {
        let unit_ids: Vec<Identity> = self.units.iter().map(|u| self.unit_identity(u)).collect();
        let mut parts: Vec<&[u8]> = vec![self.rule_name.as_bytes(), self.code_unit_name.as_bytes()];
        parts.extend(unit_ids.iter().map(Identity::as_bytes));
        Identity::of(&parts)
    }
}

/// SHA-256 content hash used to recognise re-submitted results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity([u8; 32]);

impl Identity {
    /// Hashes the given parts, separated so that `["ab", "c"]` and
    /// `["a", "bc"]` differ.
    #[must_use]
    pub fn of(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        Self(digest)
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Location;

    fn descriptor() -> RuleDescriptor {
        RuleDescriptor::new("sealed-if-leaf", Severity::Advisory)
            .description("Leaf classes must be sealed")
            .doc_reference("docs/adr/0001.md")
    }

    fn failing(name: &str, line: usize) -> UnitAnalysisResult {
        let v = Violation::new(
            "sealed-if-leaf",
            Severity::Advisory,
            "Domain",
            Location::new("Order.cs", line),
            format!("`{name}` should be sealed"),
        );
        UnitAnalysisResult::failed(name, format!("Acme.{name}"), v)
    }

    #[test]
    fn failed_result_takes_location_from_violation() {
        let unit = failing("Open", 7);
        assert_eq!(unit.status(), UnitStatus::Failed);
        assert_eq!(unit.line(), 7);
        assert_eq!(unit.file(), Path::new("Order.cs"));
        assert!(unit.violation().is_some());
    }

    #[test]
    fn passed_result_has_no_violation() {
        let unit = UnitAnalysisResult::passed("Sealed", "Acme.Sealed", "Sealed.cs", 3);
        assert!(unit.is_passed());
        assert!(unit.violation().is_none());
    }

    #[test]
    fn counts_are_derived() {
        let mut run = RuleRunResult::new(&descriptor(), "Domain");
        run.push(UnitAnalysisResult::passed("A", "Acme.A", "A.cs", 1));
        run.push(failing("B", 2));
        run.push(failing("C", 3));
        assert_eq!(run.passed_count(), 1);
        assert_eq!(run.failed_count(), 2);
        assert_eq!(run.violations().count(), 2);
    }

    #[test]
    fn identity_is_content_based() {
        let mut a = RuleRunResult::new(&descriptor(), "Domain");
        a.push(failing("B", 2));
        let b = a.clone();
        assert_eq!(a.identity(), b.identity());

        let mut c = RuleRunResult::new(&descriptor(), "Domain");
        c.push(failing("B", 3));
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn identity_separates_parts() {
        let left = Identity::of(&[b"ab", b"c"]);
        let right = Identity::of(&[b"a", b"bc"]);
        assert_ne!(left, right);
        assert_eq!(left.to_string().len(), 64);
    }

    #[test]
    fn serializes_status_and_camel_case() {
        let mut run = RuleRunResult::new(&descriptor(), "Domain");
        run.push(UnitAnalysisResult::passed("A", "Acme.A", "A.cs", 1));
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["ruleName"], "sealed-if-leaf");
        assert_eq!(json["codeUnitName"], "Domain");
        assert_eq!(json["units"][0]["status"], "Passed");
        assert!(json["units"][0]["violation"].is_null());
    }
}
