//! # archgate-core
//!
//! Core engine for architecture conformance checks over a compiled codebase.
//!
//! This crate provides:
//!
//! - [`CodeModel`] and [`SnapshotModel`], the read-only view of code units and
//!   their declared types
//! - [`GlobalIndexBuilder`], which computes the whole-codebase base-type index
//! - [`TypeRule`] / [`ProjectRule`], joined as [`Rule`]
//! - [`Analyzer`] for running rules and feeding a [`ViolationAggregator`]
//! - [`Reporter`] for the consolidated JSON report and violation artifacts
//!
//! ## Example
//!
//! ```ignore
//! use archgate_core::{Analyzer, Config, Reporter, SnapshotModel, ViolationAggregator};
//!
//! let config = Config::from_file("archgate.toml".as_ref())?;
//! let model = SnapshotModel::load("build/symbols.json".as_ref(), &config.index)?;
//! let analyzer = Analyzer::builder()
//!     .type_rule(MyRule::new())
//!     .config(config)
//!     .build()?;
//!
//! let aggregator = ViolationAggregator::new();
//! analyzer.analyze(&model, &aggregator);
//! Reporter::new(&aggregator).write_consolidated_report("out/report.json".as_ref())?;
//! assert!(!aggregator.has_blocking_violations());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregator;
mod analyzer;
mod config;
mod context;
mod index;
mod manifest;
mod model;
mod reporter;
mod result;
mod rule;
mod snapshot;
mod types;

/// Name helpers shared by the index and rules.
pub mod utils;

pub use aggregator::ViolationAggregator;
pub use analyzer::{AnalysisSummary, Analyzer, AnalyzerBuilder, AnalyzerError};
pub use config::{
    AnalyzerConfig, Config, ConfigError, IndexConfig, LayerDef, ReportConfig, RuleConfig,
    PROJECT_CONFIG_NAMES,
};
pub use context::{ProjectContext, TypeContext};
pub use index::{scan_base_types, GlobalIndex, GlobalIndexBuilder, IndexBuild, IndexWarning};
pub use manifest::{parse_manifest, parse_manifest_str, ManifestFormat};
pub use model::{
    CodeModel, CodeUnit, DependencyRef, ManifestDependencies, Member, MemberKind, TypeKind,
    TypeSymbol, Visibility,
};
pub use reporter::{format_artifact, ConsolidatedReport, ReportError, Reporter, DEFAULT_CATEGORY};
pub use result::{Identity, RuleRunResult, UnitAnalysisResult, UnitStatus};
pub use rule::{ProjectRule, Rule, RuleDescriptor, RuleKind, TypeRule};
pub use snapshot::{SnapshotError, SnapshotModel};
pub use types::{Location, Severity, SeverityCounts, Violation};
