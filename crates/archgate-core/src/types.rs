//! Core types for conformance violations.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for conformance violations.
///
/// Ordered from least to most severe, so `Severity::Blocking` compares
/// greater than every other level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suggestion only.
    #[serde(alias = "info")]
    Informational,
    /// Surfaced in reports but never fails the gate.
    #[serde(alias = "warning")]
    Advisory,
    /// Fails the pipeline gate.
    #[serde(alias = "error")]
    Blocking,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Self; 3] = [Self::Blocking, Self::Advisory, Self::Informational];

    /// Returns true for the level that fails the gate.
    #[must_use]
    pub fn is_blocking(self) -> bool {
        self == Self::Blocking
    }

    /// Parses a severity name, accepting the short aliases `error`,
    /// `warning` and `info`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "blocking" | "error" => Some(Self::Blocking),
            "advisory" | "warning" => Some(Self::Advisory),
            "informational" | "info" => Some(Self::Informational),
            _ => None,
        }
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Informational => "informational",
            Self::Advisory => "advisory",
            Self::Blocking => "blocking",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source location of a declaration or manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// File path, relative to the analyzed root where possible.
    pub file: PathBuf,
    /// Line number (1-indexed, 0 when unknown).
    pub line: usize,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// A conformance violation produced by a rule evaluation.
///
/// Every field is fixed at creation except `severity`, which an external
/// review workflow may lower through [`Violation::with_severity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Rule name (e.g., "sealed-if-leaf").
    pub rule: String,
    /// Severity of this violation.
    pub severity: Severity,
    /// Reference to supporting rationale (e.g., an ADR path).
    #[serde(default)]
    pub doc_reference: String,
    /// Name of the code unit that owns the failing unit.
    pub code_unit: String,
    /// Where the problem was found.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// Instruction aimed at a manual or automated fixer.
    #[serde(default)]
    pub remediation_hint: String,
    /// Optional classification tag copied from the rule descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Violation {
    /// Creates a new violation without doc reference or remediation hint.
    #[must_use]
    pub fn new(
        rule: impl Into<String>,
        severity: Severity,
        code_unit: impl Into<String>,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity,
            doc_reference: String::new(),
            code_unit: code_unit.into(),
            location,
            message: message.into(),
            remediation_hint: String::new(),
            category: None,
        }
    }

    /// Adds a design document reference to this violation.
    #[must_use]
    pub fn with_doc_ref(mut self, doc_ref: impl Into<String>) -> Self {
        self.doc_reference = doc_ref.into();
        self
    }

    /// Adds a remediation hint to this violation.
    #[must_use]
    pub fn with_remediation_hint(mut self, hint: impl Into<String>) -> Self {
        self.remediation_hint = hint.into();
        self
    }

    /// Sets the classification tag.
    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Returns a copy with a different severity.
    ///
    /// Intended for reviewer workflows that downgrade accepted findings.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Formats the violation for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} [{}] at {}\n",
            self.rule, self.code_unit, self.location
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if !self.remediation_hint.is_empty() {
            let _ = writeln!(output, "  = help: {}", self.remediation_hint);
        }
        if !self.doc_reference.is_empty() {
            let _ = writeln!(output, "  = see: {}", self.doc_reference);
        }
        output
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.location, self.severity, self.rule, self.message
        )?;
        if !self.doc_reference.is_empty() {
            write!(f, " (see: {})", self.doc_reference)?;
        }
        Ok(())
    }
}

/// Violation counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Number of blocking violations.
    pub blocking: usize,
    /// Number of advisory violations.
    pub advisory: usize,
    /// Number of informational violations.
    pub informational: usize,
}

impl SeverityCounts {
    /// Counts the given violations.
    #[must_use]
    pub fn tally<'a>(violations: impl IntoIterator<Item = &'a Violation>) -> Self {
        let mut counts = Self::default();
        for v in violations {
            counts.add(v.severity);
        }
        counts
    }

    /// Increments the counter for `severity`.
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Blocking => self.blocking += 1,
            Severity::Advisory => self.advisory += 1,
            Severity::Informational => self.informational += 1,
        }
    }

    /// Total across all severities.
    #[must_use]
    pub fn total(&self) -> usize {
        self.blocking + self.advisory + self.informational
    }
}
