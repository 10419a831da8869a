//! Configuration types for archgate.

use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Project-level config file names, checked in order.
pub const PROJECT_CONFIG_NAMES: &[&str] = &["archgate.toml", ".archgate.toml"];

/// Top-level configuration, usually read from `archgate.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Severity threshold for the gate (default: "blocking").
    /// Violations at or above this severity fail the run.
    #[serde(default)]
    pub fail_on: Option<String>,

    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Global index configuration.
    #[serde(default)]
    pub index: IndexConfig,

    /// Report output configuration.
    #[serde(default)]
    pub report: ReportConfig,

    /// Per-rule configurations.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,

    /// Architectural layers, replacing the built-in layer policy when set.
    #[serde(default)]
    pub layers: Vec<LayerDef>,

    /// Allowed layer-to-layer dependencies.
    #[serde(default, rename = "layer-dependencies")]
    pub layer_dependencies: BTreeMap<String, Vec<String>>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Returns the first of [`PROJECT_CONFIG_NAMES`] present in `dir`.
    #[must_use]
    pub fn find_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if a rule is enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_name: &str) -> bool {
        self.rules
            .get(rule_name)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_name: &str) -> Option<Severity> {
        self.rules.get(rule_name).and_then(|c| c.severity)
    }

    /// Resolves the gate threshold.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown severity name.
    pub fn fail_on_severity(&self) -> Result<Severity, ConfigError> {
        match self.fail_on.as_deref() {
            None => Ok(Severity::Blocking),
            Some(name) => Severity::parse(name).ok_or_else(|| ConfigError::UnknownSeverity {
                value: name.to_string(),
            }),
        }
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Path of the symbol snapshot written by the compiler front end.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,

    /// Number of rules evaluated concurrently (default: 1).
    #[serde(default)]
    pub parallelism: Option<usize>,
}

/// Configuration for the global index and source discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Extensions of source files scanned textually.
    #[serde(default = "default_extensions")]
    pub source_extensions: Vec<String>,

    /// Glob patterns to exclude from source discovery.
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,

    /// Whether to run the textual fallback scan.
    #[serde(default = "default_true")]
    pub text_scan: bool,

    /// Whether to respect .gitignore files during discovery.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            source_extensions: default_extensions(),
            exclude: default_excludes(),
            text_scan: true,
            respect_gitignore: true,
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["cs".to_string()]
}

fn default_excludes() -> Vec<String> {
    vec!["**/obj/**".to_string(), "**/bin/**".to_string()]
}

fn default_true() -> bool {
    true
}

/// Where reports are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Base output directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Consolidated report file name, relative to `output_dir`.
    #[serde(default = "default_report_file")]
    pub report_file: String,

    /// Per-violation artifact directory, relative to `output_dir`.
    #[serde(default = "default_violations_dir")]
    pub violations_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            report_file: default_report_file(),
            violations_dir: default_violations_dir(),
        }
    }
}

impl ReportConfig {
    /// Full path of the consolidated report.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }

    /// Full path of the artifact directory.
    #[must_use]
    pub fn violations_path(&self) -> PathBuf {
        self.output_dir.join(&self.violations_dir)
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("artifacts/archgate")
}

fn default_report_file() -> String {
    "report.json".to_string()
}

fn default_violations_dir() -> String {
    "violations".to_string()
}

/// One architectural layer, recognised by code unit name suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDef {
    /// Layer name (e.g., "domain").
    pub name: String,
    /// Code unit name suffixes that place a unit in this layer.
    pub suffixes: Vec<String>,
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Rule-specific options as key-value pairs.
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,
}

impl RuleConfig {
    /// Gets a boolean option with a default value.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// Gets a string array option.
    #[must_use]
    pub fn get_str_array(&self, key: &str) -> Vec<String> {
        self.options
            .get(key)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(code(archgate::config::io))]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    #[diagnostic(code(archgate::config::parse))]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// Unknown severity name.
    #[error("Unknown severity `{value}`")]
    #[diagnostic(
        code(archgate::config::severity),
        help("valid values: blocking, advisory, informational (or error, warning, info)")
    )]
    UnknownSeverity {
        /// The invalid value.
        value: String,
    },
}
