//! Rule presets and lookup by name.

use crate::{LayerDependencyGraph, SealedIfLeaf};
use archgate_core::{Config, Rule};

/// Preset configurations for archgate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Every built-in rule.
    Recommended,
    /// Blocking rules only, for gradual adoption.
    Minimal,
}

impl Preset {
    /// Returns the rules for this preset, configured from `config`.
    #[must_use]
    pub fn rules(self, config: &Config) -> Vec<Rule> {
        match self {
            Self::Recommended => all_rules(config),
            Self::Minimal => minimal_rules(config),
        }
    }

    /// Parses a preset name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "recommended" => Some(Self::Recommended),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }
}

/// Names of every built-in rule, in registration order.
pub const RULE_NAMES: &[&str] = &[crate::sealed_if_leaf::NAME, crate::layer_dependency_graph::NAME];

/// Builds the named built-in rule, configured from `config`.
#[must_use]
pub fn rule_by_name(name: &str, config: &Config) -> Option<Rule> {
    match name {
        crate::sealed_if_leaf::NAME => {
            let rule = match config.rules.get(name) {
                Some(rule_config) => SealedIfLeaf::new().with_config(rule_config),
                None => SealedIfLeaf::new(),
            };
            Some(Rule::from_type(rule))
        }
        crate::layer_dependency_graph::NAME => {
            Some(Rule::from_project(LayerDependencyGraph::from_config(config)))
        }
        _ => None,
    }
}

/// Returns all available rules.
#[must_use]
pub fn all_rules(config: &Config) -> Vec<Rule> {
    RULE_NAMES
        .iter()
        .filter_map(|name| rule_by_name(name, config))
        .collect()
}

/// Returns the minimal set of rules.
///
/// For gradual adoption, only includes:
/// - `layer-dependency-graph`
#[must_use]
pub fn minimal_rules(config: &Config) -> Vec<Rule> {
    vec![Rule::from_project(LayerDependencyGraph::from_config(config))]
}
