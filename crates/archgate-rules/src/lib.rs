//! # archgate-rules
//!
//! Built-in conformance rules for archgate.
//!
//! ## Available Rules
//!
//! | Name | Kind | Default severity | Description |
//! |------|------|------------------|-------------|
//! | `sealed-if-leaf` | type | advisory | Classes with no subclasses must be sealed |
//! | `layer-dependency-graph` | project | blocking | Code unit references must follow the layer policy |
//!
//! ## Usage
//!
//! ```ignore
//! use archgate_core::Analyzer;
//! use archgate_rules::{LayerDependencyGraph, SealedIfLeaf};
//!
//! let analyzer = Analyzer::builder()
//!     .type_rule(SealedIfLeaf::new())
//!     .project_rule(LayerDependencyGraph::new())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod layer;
mod layer_dependency_graph;
mod presets;
mod sealed_if_leaf;

pub use layer::{LayerPolicy, LayerResolver, ANY_LAYER};
pub use layer_dependency_graph::LayerDependencyGraph;
pub use presets::{all_rules, minimal_rules, rule_by_name, Preset, RULE_NAMES};
pub use sealed_if_leaf::SealedIfLeaf;

/// Re-export core types for convenience.
pub use archgate_core::{Rule, Severity, Violation};
