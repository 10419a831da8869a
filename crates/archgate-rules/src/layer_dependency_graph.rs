//! Rule enforcing allowed dependencies between architectural layers.
//!
//! # Rationale
//!
//! Inner layers (domain) must stay ignorant of outer layers (infrastructure,
//! presentation). A single stray project reference is enough to let
//! persistence concerns leak into the model, so each offending edge fails.
//!
//! # Detected Patterns
//!
//! - A direct code-unit reference from one layer to a layer the
//!   [`LayerPolicy`] does not allow.
//!
//! Only declared edges are checked. Units whose layer cannot be inferred on
//! either end are skipped.

use crate::layer::{LayerPolicy, LayerResolver};
use archgate_core::{
    Config, ProjectContext, ProjectRule, RuleDescriptor, Severity, Violation,
};
use tracing::debug;

/// Rule name for layer-dependency-graph.
pub const NAME: &str = "layer-dependency-graph";

/// Rationale document for layer-dependency-graph.
pub const DOC: &str = "docs/adr/0002-layer-dependencies.md";

/// Fails once per manifest reference that crosses a forbidden layer edge.
#[derive(Debug, Clone)]
pub struct LayerDependencyGraph {
    descriptor: RuleDescriptor,
    policy: LayerPolicy,
    resolver: LayerResolver,
}

impl Default for LayerDependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerDependencyGraph {
    /// Creates the rule with the built-in layer policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(LayerPolicy::default())
    }

    /// Creates the rule with an explicit policy.
    #[must_use]
    pub fn with_policy(policy: LayerPolicy) -> Self {
        Self {
            descriptor: RuleDescriptor::new(NAME, Severity::Blocking)
                .description("Code units may only reference layers their layer is allowed to depend on")
                .doc_reference(DOC)
                .category("architecture"),
            resolver: policy.resolver(),
            policy,
        }
    }

    /// Creates the rule with the policy from `[[layers]]` and
    /// `[layer-dependencies]`, falling back to the built-in one.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_policy(LayerPolicy::from_config(config))
    }

    /// The active policy.
    #[must_use]
    pub fn policy(&self) -> &LayerPolicy {
        &self.policy
    }
}

impl ProjectRule for LayerDependencyGraph {
    fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    fn evaluate(&self, ctx: &ProjectContext<'_>) -> Vec<Violation> {
        let source = ctx.code_unit.name();
        let Some(from_layer) = self.resolver.resolve(source) else {
            debug!("{}: no layer for {}, skipping", NAME, source);
            return Vec::new();
        };

        let mut violations = Vec::new();
        for dep in &ctx.dependencies.code_unit_references {
            let Some(to_layer) = self.resolver.resolve(&dep.name) else {
                continue;
            };
            if !ctx.is_known_unit(&dep.name) {
                debug!("{}: {} references unit {} outside the model", NAME, source, dep.name);
            }
            if self.policy.allows(from_layer, to_layer) {
                continue;
            }

            let allowed = self.policy.allowed_targets(from_layer);
            let allowed = if allowed.is_empty() {
                "no other layer".to_string()
            } else {
                allowed.join(", ")
            };
            violations.push(ctx.violation(
                &self.descriptor,
                dep.line,
                format!(
                    "`{source}` ({from_layer}) must not depend on `{}` ({to_layer})",
                    dep.name
                ),
                format!(
                    "Remove the reference to `{}` from {}; {from_layer} may depend on {allowed}",
                    dep.name,
                    ctx.manifest.display()
                ),
            ));
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archgate_core::{CodeUnit, DependencyRef, Location, ManifestDependencies};
    use std::collections::BTreeSet;
    use std::path::Path;

    fn evaluate(unit: &str, refs: &[(&str, usize)]) -> Vec<Violation> {
        let rule = LayerDependencyGraph::new();
        let unit = CodeUnit::new(unit);
        let deps = ManifestDependencies {
            code_unit_references: refs.iter().map(|(n, l)| DependencyRef::new(*n, *l)).collect(),
            package_references: vec![DependencyRef::new("Serilog", 9)],
        };
        let known: BTreeSet<String> = ["Domain", "Infra", "DomainEntities", "Api"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        let manifest = Path::new("Domain/Domain.csproj");
        let ctx = ProjectContext::new(&unit, &deps, &known, manifest, Severity::Blocking);
        rule.evaluate(&ctx)
    }

    #[test]
    fn forbidden_edge_yields_one_violation() {
        let violations = evaluate("Domain", &[("Infra", 4)]);
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.location, Location::new("Domain/Domain.csproj", 4));
        assert!(v.message.contains("`Infra`"));
        assert!(v.message.contains("(infrastructure)"));
        assert_eq!(v.severity, Severity::Blocking);
        assert_eq!(v.doc_reference, DOC);
    }

    #[test]
    fn allowed_edge_yields_none() {
        assert!(evaluate("Domain", &[("DomainEntities", 4)]).is_empty());
    }

    #[test]
    fn one_violation_per_edge() {
        let violations = evaluate("Domain", &[("Infra", 4), ("DomainEntities", 5), ("Api", 6)]);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[1].location.line, 6);
    }

    #[test]
    fn unclassified_units_are_skipped() {
        assert!(evaluate("Shared", &[("Infra", 4)]).is_empty());
        assert!(evaluate("Domain", &[("Shared", 4)]).is_empty());
    }

    #[test]
    fn same_layer_is_allowed() {
        assert!(evaluate("Acme.Domain", &[("Acme.Billing.Domain", 3)]).is_empty());
    }

    #[test]
    fn entities_layer_may_not_depend_on_domain() {
        let violations = evaluate("DomainEntities", &[("Domain", 2)]);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].remediation_hint.contains("no other layer"));
    }
}
