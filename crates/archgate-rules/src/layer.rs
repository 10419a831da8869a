//! Layer policy: which architectural layer may depend on which.

use archgate_core::{Config, LayerDef};
use std::collections::BTreeMap;
use tracing::warn;

/// Marker in an allowed list meaning "any layer".
pub const ANY_LAYER: &str = "*";

/// Layers plus the allowed layer-to-layer edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPolicy {
    layers: Vec<LayerDef>,
    allowed: BTreeMap<String, Vec<String>>,
}

impl Default for LayerPolicy {
    fn default() -> Self {
        let layer = |name: &str, suffixes: &[&str]| LayerDef {
            name: name.to_string(),
            suffixes: suffixes.iter().map(|s| (*s).to_string()).collect(),
        };
        let edges = |targets: &[&str]| -> Vec<String> {
            targets.iter().map(|s| (*s).to_string()).collect()
        };

        Self {
            layers: vec![
                layer("domain-entities", &["DomainEntities", "Domain.Entities"]),
                layer("domain", &["Domain"]),
                layer("application", &["Application"]),
                layer("infrastructure", &["Infrastructure", "Infra", "Persistence"]),
                layer("presentation", &["Api", "Web", "Presentation"]),
                layer("tests", &["Tests", "Test"]),
            ],
            allowed: [
                ("domain-entities", edges(&[])),
                ("domain", edges(&["domain-entities"])),
                ("application", edges(&["domain", "domain-entities"])),
                (
                    "infrastructure",
                    edges(&["application", "domain", "domain-entities"]),
                ),
                (
                    "presentation",
                    edges(&["application", "domain", "domain-entities", "infrastructure"]),
                ),
                ("tests", edges(&[ANY_LAYER])),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        }
    }
}

impl LayerPolicy {
    /// Creates a policy from explicit layers and allowed edges.
    ///
    /// Edges that name an undefined layer are kept but logged.
    #[must_use]
    pub fn new(layers: Vec<LayerDef>, allowed: BTreeMap<String, Vec<String>>) -> Self {
        for (from, targets) in &allowed {
            for name in std::iter::once(from).chain(targets) {
                if name != ANY_LAYER && !layers.iter().any(|l| &l.name == name) {
                    warn!("layer-dependencies references undefined layer `{}`", name);
                }
            }
        }
        Self { layers, allowed }
    }

    /// The configured policy when `[[layers]]` is present, the built-in one
    /// otherwise.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        if config.layers.is_empty() {
            Self::default()
        } else {
            Self::new(config.layers.clone(), config.layer_dependencies.clone())
        }
    }

    /// Defined layers.
    #[must_use]
    pub fn layers(&self) -> &[LayerDef] {
        &self.layers
    }

    /// Layers `from` may depend on, excluding itself.
    #[must_use]
    pub fn allowed_targets(&self, from: &str) -> &[String] {
        self.allowed
            .get(from)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns true if `from` may depend on `to`. A layer may always depend
    /// on itself.
    #[must_use]
    pub fn allows(&self, from: &str, to: &str) -> bool {
        from == to
            || self
                .allowed_targets(from)
                .iter()
                .any(|t| t == to || t == ANY_LAYER)
    }

    /// Builds a resolver for this policy's layers.
    #[must_use]
    pub fn resolver(&self) -> LayerResolver {
        LayerResolver::new(&self.layers)
    }
}

/// Maps code unit names to layers.
///
/// Resolution uses longest-suffix-match so that `Acme.Domain.Entities`
/// lands in a `Domain.Entities` layer rather than a broader one.
#[derive(Debug, Clone)]
pub struct LayerResolver {
    /// (lowercased suffix, layer name) sorted by suffix length descending.
    map: Vec<(String, String)>,
}

impl LayerResolver {
    /// Builds a resolver from layer definitions.
    #[must_use]
    pub fn new(layers: &[LayerDef]) -> Self {
        let mut map: Vec<(String, String)> = Vec::new();
        for layer in layers {
            for suffix in &layer.suffixes {
                map.push((suffix.to_ascii_lowercase(), layer.name.clone()));
            }
        }
        // Longest suffix first for correct matching
        map.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { map }
    }

    /// Which layer does this code unit belong to?
    #[must_use]
    pub fn resolve(&self, unit_name: &str) -> Option<&str> {
        let name = unit_name.to_ascii_lowercase();
        self.map
            .iter()
            .find(|(suffix, _)| ends_at_boundary(&name, suffix))
            .map(|(_, layer)| layer.as_str())
    }
}

fn ends_at_boundary(name: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    match name.strip_suffix(suffix) {
        Some("") => true,
        Some(rest) => rest.ends_with(|c: char| matches!(c, '.' | '-' | '_')),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_whole_name() {
        let r = LayerPolicy::default().resolver();
        assert_eq!(r.resolve("Domain"), Some("domain"));
        assert_eq!(r.resolve("Infra"), Some("infrastructure"));
        assert_eq!(r.resolve("DomainEntities"), Some("domain-entities"));
    }

    #[test]
    fn resolves_dotted_suffix() {
        let r = LayerPolicy::default().resolver();
        assert_eq!(r.resolve("Acme.Domain"), Some("domain"));
        assert_eq!(r.resolve("Acme.Domain.Entities"), Some("domain-entities"));
        assert_eq!(r.resolve("acme-web"), Some("presentation"));
        assert_eq!(r.resolve("Acme.Domain.Tests"), Some("tests"));
    }

    #[test]
    fn no_false_suffix_match() {
        let r = LayerPolicy::default().resolver();
        // "SubDomain" should NOT match "Domain"
        assert_eq!(r.resolve("Acme.SubDomain"), None);
        assert_eq!(r.resolve("Acme.Shared"), None);
    }

    #[test]
    fn default_edges() {
        let p = LayerPolicy::default();
        assert!(p.allows("domain", "domain-entities"));
        assert!(!p.allows("domain", "infrastructure"));
        assert!(p.allows("infrastructure", "domain"));
        assert!(p.allows("tests", "presentation"));
        assert!(p.allows("domain", "domain"));
        assert!(p.allowed_targets("unknown").is_empty());
    }

    #[test]
    fn configured_policy_replaces_default() {
        let config = Config::parse(
            r#"
[[layers]]
name = "core"
suffixes = ["Core"]

[[layers]]
name = "adapters"
suffixes = ["Adapters"]

[layer-dependencies]
adapters = ["core"]
"#,
        )
        .unwrap();
        let p = LayerPolicy::from_config(&config);
        assert_eq!(p.layers().len(), 2);
        assert_eq!(p.resolver().resolve("Acme.Domain"), None);
        assert!(p.allows("adapters", "core"));
        assert!(!p.allows("core", "adapters"));
    }
}
