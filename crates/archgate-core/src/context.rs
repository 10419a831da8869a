//! Context types for rule execution.

use crate::index::GlobalIndex;
use crate::model::{CodeUnit, ManifestDependencies, TypeSymbol};
use crate::rule::RuleDescriptor;
use crate::types::{Location, Severity, Violation};
use std::collections::BTreeSet;
use std::path::Path;

/// Context provided to per-type rules.
#[derive(Debug, Clone, Copy)]
pub struct TypeContext<'a> {
    /// The type being evaluated.
    pub symbol: &'a TypeSymbol,
    /// The code unit declaring it.
    pub code_unit: &'a CodeUnit,
    /// Frozen base-type index for the whole run.
    pub index: &'a GlobalIndex,
    /// Severity violations from this evaluation must carry.
    pub severity: Severity,
}

impl<'a> TypeContext<'a> {
    /// Creates a new type context.
    #[must_use]
    pub fn new(
        symbol: &'a TypeSymbol,
        code_unit: &'a CodeUnit,
        index: &'a GlobalIndex,
        severity: Severity,
    ) -> Self {
        Self {
            symbol,
            code_unit,
            index,
            severity,
        }
    }

    /// Declaration site of the symbol.
    #[must_use]
    pub fn location(&self) -> &'a Location {
        &self.symbol.location
    }

    /// Builds a violation located at the symbol's declaration.
    #[must_use]
    pub fn violation(
        &self,
        descriptor: &RuleDescriptor,
        message: impl Into<String>,
        remediation_hint: impl Into<String>,
    ) -> Violation {
        Violation::new(
            descriptor.name.clone(),
            self.severity,
            self.code_unit.name(),
            self.symbol.location.clone(),
            message,
        )
        .with_doc_ref(descriptor.doc_reference.clone())
        .with_remediation_hint(remediation_hint)
        .with_category(descriptor.category.clone())
    }
}

/// Context provided to project-wide rules.
#[derive(Debug, Clone, Copy)]
pub struct ProjectContext<'a> {
    /// The code unit being evaluated.
    pub code_unit: &'a CodeUnit,
    /// Dependencies parsed from its manifest.
    pub dependencies: &'a ManifestDependencies,
    /// Names of every code unit in the model.
    pub known_units: &'a BTreeSet<String>,
    /// The manifest the dependencies came from.
    pub manifest: &'a Path,
    /// Severity violations from this evaluation must carry.
    pub severity: Severity,
}

impl<'a> ProjectContext<'a> {
    /// Creates a new project context.
    #[must_use]
    pub fn new(
        code_unit: &'a CodeUnit,
        dependencies: &'a ManifestDependencies,
        known_units: &'a BTreeSet<String>,
        manifest: &'a Path,
        severity: Severity,
    ) -> Self {
        Self {
            code_unit,
            dependencies,
            known_units,
            manifest,
            severity,
        }
    }

    /// Returns true if `name` is a code unit of the analyzed model.
    #[must_use]
    pub fn is_known_unit(&self, name: &str) -> bool {
        self.known_units.contains(name)
    }

    /// Builds a violation located on `line` of the manifest.
    #[must_use]
    pub fn violation(
        &self,
        descriptor: &RuleDescriptor,
        line: usize,
        message: impl Into<String>,
        remediation_hint: impl Into<String>,
    ) -> Violation {
        Violation::new(
            descriptor.name.clone(),
            self.severity,
            self.code_unit.name(),
            Location::new(self.manifest, line),
            message,
        )
        .with_doc_ref(descriptor.doc_reference.clone())
        .with_remediation_hint(remediation_hint)
        .with_category(descriptor.category.clone())
    }
}
