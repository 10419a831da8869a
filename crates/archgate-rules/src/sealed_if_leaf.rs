//! Rule requiring leaf classes to be sealed.
//!
//! # Rationale
//!
//! A class nobody derives from gains nothing from being open. Sealing it
//! documents intent, lets the runtime devirtualize calls, and turns an
//! accidental future subclass into a deliberate decision.
//!
//! # Detected Patterns
//!
//! - A non-abstract, non-static class or record that is not sealed and does
//!   not appear as a base type anywhere in the codebase.
//!
//! The "anywhere" part comes from the [`GlobalIndex`](archgate_core::GlobalIndex),
//! so a class subclassed only from another code unit still passes.

use archgate_core::{
    RuleConfig, RuleDescriptor, Severity, TypeContext, TypeKind, TypeRule, Violation,
};

/// Rule name for sealed-if-leaf.
pub const NAME: &str = "sealed-if-leaf";

/// Rationale document for sealed-if-leaf.
pub const DOC: &str = "docs/adr/0001-sealed-leaf-classes.md";

/// Requires classes without subclasses to be sealed.
#[derive(Debug, Clone)]
pub struct SealedIfLeaf {
    descriptor: RuleDescriptor,
    /// Simple-name suffixes exempt from the rule (e.g., "Exception").
    pub ignore_suffixes: Vec<String>,
    /// Whether records are checked like classes (default: true).
    pub include_records: bool,
}

impl Default for SealedIfLeaf {
    fn default() -> Self {
        Self::new()
    }
}

impl SealedIfLeaf {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: RuleDescriptor::new(NAME, Severity::Advisory)
                .description("Classes with no subclasses anywhere in the codebase must be sealed")
                .doc_reference(DOC)
                .category("design"),
            ignore_suffixes: Vec::new(),
            include_records: true,
        }
    }

    /// Applies `[rules.sealed-if-leaf]` options.
    #[must_use]
    pub fn with_config(mut self, config: &RuleConfig) -> Self {
        self.ignore_suffixes = config.get_str_array("ignore_suffixes");
        self.include_records = config.get_bool("include_records", true);
        self
    }

    /// Exempts classes whose simple name ends with `suffix`.
    #[must_use]
    pub fn ignore_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.ignore_suffixes.push(suffix.into());
        self
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignore_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }
}

impl TypeRule for SealedIfLeaf {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn evaluate(&self, ctx: &TypeContext<'_>) -> Option<Violation> {
        let symbol = ctx.symbol;
        if !symbol.kind.is_class() || symbol.is_abstract || symbol.is_static || symbol.is_sealed {
            return None;
        }
        if symbol.kind == TypeKind::Record && !self.include_records {
            return None;
        }
        if self.is_ignored(&symbol.name) || ctx.index.is_base_type(symbol) {
            return None;
        }

        Some(ctx.violation(
            &self.descriptor,
            format!(
                "Class `{}` has no subclasses and should be sealed",
                symbol.full_name
            ),
            format!(
                "Add the `sealed` modifier to `{}` in {}",
                symbol.name,
                symbol.location
            ),
        ))
    }
}
