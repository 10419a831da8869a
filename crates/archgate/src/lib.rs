//! # archgate
//!
//! Architecture conformance checks over a compiled codebase.
//!
//! This is the main facade crate that re-exports core functionality and rules.
//!
//! ## Quick Start: Test-Suite Integration
//!
//! ```toml
//! [dev-dependencies]
//! archgate = "0.3"
//! ```
//!
//! ```rust,ignore
//! // tests/architecture.rs
//! #[test]
//! fn architecture() {
//!     archgate::run_check(std::path::Path::new("../.."), None, None, None);
//! }
//! ```
//!
//! The test reads `archgate.toml` from the given root, runs the rules over
//! the configured symbol snapshot, writes the reports, and panics with a
//! gate report when a violation reaches `fail_on` (default: blocking).
//!
//! ## Programmatic Usage
//!
//! ```rust,ignore
//! use archgate::{Analyzer, Config, Reporter, SnapshotModel, ViolationAggregator};
//! use archgate::rules::Preset;
//!
//! let config = Config::from_file("archgate.toml".as_ref())?;
//! let model = SnapshotModel::load("build/symbols.json".as_ref(), &config.index)?;
//! let analyzer = Analyzer::builder()
//!     .rules(Preset::Recommended.rules(&config))
//!     .config(config)
//!     .build()?;
//!
//! let aggregator = ViolationAggregator::new();
//! analyzer.analyze(&model, &aggregator);
//! Reporter::new(&aggregator).write_consolidated_report("out/report.json".as_ref())?;
//! ```

#![forbid(unsafe_code)]

// Re-export core types and traits
pub use archgate_core::*;

/// Built-in rules and presets.
pub mod rules {
    pub use archgate_rules::*;
}

mod runner;

pub use runner::run_check;
