//! Rule traits for defining conformance rules.
//!
//! A rule evaluates one of two unit shapes:
//!
//! - [`TypeRule`]: a single declared type, with the global index at hand.
//! - [`ProjectRule`]: one code unit's declared dependencies.
//!
//! [`Rule`] is the closed sum of both, which is what the analyzer iterates.

use crate::context::{ProjectContext, TypeContext};
use crate::types::{Severity, Violation};
use serde::Serialize;

/// Identity and metadata shared by every rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDescriptor {
    /// Unique, stable kebab-case name (e.g., "sealed-if-leaf").
    pub name: String,
    /// One-line description of what the rule checks.
    pub description: String,
    /// Severity used when configuration does not override it.
    pub default_severity: Severity,
    /// Path or URL of the rationale document.
    pub doc_reference: String,
    /// Optional classification tag (e.g., "design", "architecture").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl RuleDescriptor {
    /// Creates a descriptor with empty description and doc reference.
    #[must_use]
    pub fn new(name: impl Into<String>, default_severity: Severity) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            default_severity,
            doc_reference: String::new(),
            category: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the rationale document reference.
    #[must_use]
    pub fn doc_reference(mut self, doc_reference: impl Into<String>) -> Self {
        self.doc_reference = doc_reference.into();
        self
    }

    /// Sets the category tag.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// A rule evaluated once per declared type.
///
/// Implementations must be stateless and deterministic: the same symbol and
/// index always produce the same answer.
///
/// # Example
///
/// ```ignore
/// use archgate_core::{RuleDescriptor, Severity, TypeContext, TypeRule, Violation};
///
/// pub struct NoPublicFields {
///     descriptor: RuleDescriptor,
/// }
///
/// impl TypeRule for NoPublicFields {
///     fn descriptor(&self) -> &RuleDescriptor {
///         &self.descriptor
///     }
///
///     fn evaluate(&self, ctx: &TypeContext<'_>) -> Option<Violation> {
///         let field = ctx.symbol.members.iter().find(|m| m.is_public_field())?;
///         Some(ctx.violation(&self.descriptor, format!("`{}` is public", field.name), "Make it private"))
///     }
/// }
/// ```
pub trait TypeRule: Send + Sync {
    /// Returns the rule's identity and metadata.
    fn descriptor(&self) -> &RuleDescriptor;

    /// Evaluates one type. `None` means the type passes.
    fn evaluate(&self, ctx: &TypeContext<'_>) -> Option<Violation>;
}

/// A rule evaluated once per code unit over its manifest dependencies.
pub trait ProjectRule: Send + Sync {
    /// Returns the rule's identity and metadata.
    fn descriptor(&self) -> &RuleDescriptor;

    /// Evaluates one code unit. Each returned violation is one failed edge.
    fn evaluate(&self, ctx: &ProjectContext<'_>) -> Vec<Violation>;
}

/// Which unit shape a rule evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Per declared type.
    Type,
    /// Per code unit manifest.
    Project,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Type => f.write_str("type"),
            Self::Project => f.write_str("project"),
        }
    }
}

/// A rule of either shape.
pub enum Rule {
    /// Per-type rule.
    Type(Box<dyn TypeRule>),
    /// Per-code-unit rule.
    Project(Box<dyn ProjectRule>),
}

impl Rule {
    /// Wraps a type rule.
    #[must_use]
    pub fn from_type<R: TypeRule + 'static>(rule: R) -> Self {
        Self::Type(Box::new(rule))
    }

    /// Wraps a project rule.
    #[must_use]
    pub fn from_project<R: ProjectRule + 'static>(rule: R) -> Self {
        Self::Project(Box::new(rule))
    }

    /// Returns the rule's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &RuleDescriptor {
        match self {
            Self::Type(r) => r.descriptor(),
            Self::Project(r) => r.descriptor(),
        }
    }

    /// Returns the rule's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Returns which unit shape the rule evaluates.
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Type(_) => RuleKind::Type,
            Self::Project(_) => RuleKind::Project,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::GlobalIndex;
    use crate::model::{CodeUnit, TypeSymbol};
    use crate::types::Location;

    struct TestRule {
        descriptor: RuleDescriptor,
    }

    impl TestRule {
        fn new() -> Self {
            Self {
                descriptor: RuleDescriptor::new("test-rule", Severity::Advisory)
                    .description("A test rule")
                    .doc_reference("docs/test.md")
                    .category("testing"),
            }
        }
    }

    impl TypeRule for TestRule {
        fn descriptor(&self) -> &RuleDescriptor {
            &self.descriptor
        }

        fn evaluate(&self, ctx: &TypeContext<'_>) -> Option<Violation> {
            Some(ctx.violation(&self.descriptor, "Test violation", "Fix it"))
        }
    }

    #[test]
    fn test_rule_wrapping() {
        let rule = Rule::from_type(TestRule::new());
        assert_eq!(rule.name(), "test-rule");
        assert_eq!(rule.kind(), RuleKind::Type);
        assert_eq!(rule.descriptor().default_severity, Severity::Advisory);
        assert_eq!(rule.descriptor().category.as_deref(), Some("testing"));
        assert!(format!("{rule:?}").contains("test-rule"));
    }

    #[test]
    fn test_violation_carries_descriptor_metadata() {
        let rule = TestRule::new();
        let symbol = TypeSymbol::class("Acme.Order", "Domain", Location::new("Order.cs", 4));
        let unit = CodeUnit::new("Domain").with_type(symbol.clone());
        let index = GlobalIndex::default();
        let ctx = TypeContext::new(&symbol, &unit, &index, Severity::Blocking);

        let v = rule.evaluate(&ctx).unwrap();
        assert_eq!(v.rule, "test-rule");
        assert_eq!(v.severity, Severity::Blocking);
        assert_eq!(v.doc_reference, "docs/test.md");
        assert_eq!(v.code_unit, "Domain");
        assert_eq!(v.location, Location::new("Order.cs", 4));
        assert_eq!(v.remediation_hint, "Fix it");
        assert_eq!(v.category.as_deref(), Some("testing"));
    }
}
