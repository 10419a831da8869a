//! Whole-codebase base-type index.
//!
//! Some rules cannot be decided from one declaration alone: "is anything
//! derived from this class?" needs every inheritance list in the codebase.
//! [`GlobalIndexBuilder`] computes that set once per run from compiled symbols,
//! then widens it with a textual scan of the sources for inheritance lists the
//! front end could not resolve. The resulting [`GlobalIndex`] is frozen and
//! shared read-only with every rule context.

use crate::manifest::compile;
use crate::model::{CodeUnit, TypeSymbol};
use crate::utils::names::{is_identifier, qualified_name, simple_name};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Set of type names used as a base type somewhere in the codebase.
///
/// Holds both qualified (`Acme.Domain.Entity`) and simple (`Entity`) forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlobalIndex {
    base_types: BTreeSet<String>,
}

impl GlobalIndex {
    /// Creates an index from explicit names, recording each in both forms.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();
        for name in names {
            index.record(name.as_ref());
        }
        index
    }

    /// Returns true if `name` is used as a base type.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.base_types.contains(name)
    }

    /// Returns true if `symbol` is inherited from anywhere, matched by full
    /// name or, for entries only known textually, by simple name.
    #[must_use]
    pub fn is_base_type(&self, symbol: &TypeSymbol) -> bool {
        self.contains(&symbol.full_name) || self.contains(&symbol.name)
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.base_types.len()
    }

    /// Returns true if no base type was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base_types.is_empty()
    }

    /// Iterates names in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.base_types.iter().map(String::as_str)
    }

    fn record(&mut self, raw: &str) -> bool {
        let qualified = qualified_name(raw);
        if !is_identifier(qualified) {
            return false;
        }
        let simple = simple_name(qualified);
        let added = self.base_types.insert(qualified.to_string());
        self.base_types.insert(simple.to_string()) || added
    }
}

/// A source file the text scan could not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexWarning {
    /// The skipped file.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// Output of [`GlobalIndexBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct IndexBuild {
    /// The frozen index.
    pub index: GlobalIndex,
    /// Files skipped during the text scan.
    pub warnings: Vec<IndexWarning>,
    /// Number of source files scanned successfully.
    pub files_scanned: usize,
    /// Names that only the text scan contributed.
    pub text_only_names: usize,
}

/// Builds a [`GlobalIndex`] from every code unit.
#[derive(Debug, Clone)]
pub struct GlobalIndexBuilder {
    text_scan: bool,
}

impl Default for GlobalIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalIndexBuilder {
    /// Creates a builder with the text scan enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { text_scan: true }
    }

    /// Enables or disables the textual fallback scan.
    #[must_use]
    pub fn text_scan(mut self, enabled: bool) -> Self {
        self.text_scan = enabled;
        self
    }

    /// Builds the index. Never fails; unreadable files become warnings.
    #[must_use]
    pub fn build(&self, units: &[CodeUnit]) -> IndexBuild {
        let mut build = IndexBuild::default();

        for unit in units {
            for symbol in unit.all_types() {
                for base in &symbol.base_types {
                    build.index.record(base);
                }
            }
        }
        let compiled_names = build.index.len();
        debug!("Compiled symbols contributed {} base-type names", compiled_names);

        if self.text_scan {
            for unit in units {
                for file in unit.source_files() {
                    self.scan_file(file, &mut build);
                }
            }
            build.text_only_names = build.index.len() - compiled_names;
        }

        info!(
            "Global index built: {} names ({} from text scan), {} file(s) scanned, {} warning(s)",
            build.index.len(),
            build.text_only_names,
            build.files_scanned,
            build.warnings.len()
        );
        build
    }

    fn scan_file(&self, path: &Path, build: &mut IndexBuild) {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                for name in scan_base_types(&content) {
                    build.index.record(&name);
                }
                build.files_scanned += 1;
            }
            Err(e) => {
                warn!("Skipping unreadable source {}: {}", path.display(), e);
                build.warnings.push(IndexWarning {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

fn inheritance_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compile(
        &RE,
        r"\b(?:class|record|struct|interface)\s+[A-Za-z_]\w*\s*(?:<[^>{};]*>)?\s*(?:\([^)]*\))?\s*:\s*([^{;]+)",
    )
}

fn extends_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compile(&RE, r"\b(?:extends|implements)\s+([^{]+)")
}

fn where_clause_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compile(&RE, r"\bwhere\b")
}

fn implements_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compile(&RE, r"\bimplements\b")
}

/// Extracts base-type tokens from declaration inheritance lists in `source`.
///
/// Deliberately loose: comments and strings are not skipped, and any token
/// that looks like a type name is returned.
#[must_use]
pub fn scan_base_types(source: &str) -> Vec<String> {
    let mut found = Vec::new();
    for re in [inheritance_list_re(), extends_re()] {
        for caps in re.captures_iter(source) {
            let Some(list) = caps.get(1) else {
                continue;
            };
            let list = where_clause_re()
                .split(list.as_str())
                .next()
                .unwrap_or_default();
            let list = implements_re().replace_all(list, ",");
            for token in split_top_level(&list) {
                let token = token.split('(').next().unwrap_or_default().trim();
                let token = qualified_name(token);
                if is_identifier(token) {
                    found.push(token.to_string());
                }
            }
        }
    }
    found
}

/// Splits on commas that are not nested inside `<...>` or `(...)`.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}
