//! Manifest dependency extraction.
//!
//! Two manifest dialects are understood:
//!
//! - Cargo-style TOML: `[dependencies]` / `[build-dependencies]` entries with a
//!   `path` are code-unit references, all others are package references.
//! - MSBuild project files: `<ProjectReference Include="..\X\X.csproj"/>` and
//!   `<PackageReference Include="Pkg"/>`.
//!
//! Parsing never fails. Anything unreadable or malformed yields empty lists
//! and a warning.

use crate::model::{DependencyRef, ManifestDependencies};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Cargo tables that declare build-relevant dependencies.
const CARGO_DEPENDENCY_TABLES: &[&str] = &["dependencies", "build-dependencies"];

/// Manifest dialect, detected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// `Cargo.toml` or any other `*.toml` manifest.
    Cargo,
    /// `*.csproj`, `*.fsproj`, `*.vbproj`, `*.props`.
    MsBuild,
}

impl ManifestFormat {
    /// Detects the dialect of `path`.
    #[must_use]
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Cargo),
            "csproj" | "fsproj" | "vbproj" | "props" => Some(Self::MsBuild),
            _ => None,
        }
    }
}

/// Reads and parses the manifest at `path`.
#[must_use]
pub fn parse_manifest(path: &Path) -> ManifestDependencies {
    let Some(format) = ManifestFormat::detect(path) else {
        warn!("Unknown manifest format: {}", path.display());
        return ManifestDependencies::default();
    };
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read manifest {}: {}", path.display(), e);
            return ManifestDependencies::default();
        }
    };
    let deps = parse_manifest_str(&content, format);
    debug!(
        "Manifest {}: {} unit reference(s), {} package reference(s)",
        path.display(),
        deps.code_unit_references.len(),
        deps.package_references.len()
    );
    deps
}

/// Parses manifest text of the given dialect.
#[must_use]
pub fn parse_manifest_str(content: &str, format: ManifestFormat) -> ManifestDependencies {
    match format {
        ManifestFormat::Cargo => parse_cargo(content),
        ManifestFormat::MsBuild => parse_msbuild(content),
    }
}

fn parse_cargo(content: &str) -> ManifestDependencies {
    let table = match content.parse::<toml::Table>() {
        Ok(t) => t,
        Err(e) => {
            warn!("Malformed TOML manifest: {}", e.message());
            return ManifestDependencies::default();
        }
    };

    let mut deps = ManifestDependencies::default();
    for section in CARGO_DEPENDENCY_TABLES {
        let Some(entries) = table.get(*section).and_then(toml::Value::as_table) else {
            continue;
        };
        for (key, value) in entries {
            let detail = value.as_table();
            let name = detail
                .and_then(|d| d.get("package"))
                .and_then(toml::Value::as_str)
                .unwrap_or(key);
            let line = cargo_entry_line(content, section, key);
            let dep = DependencyRef::new(name, line);
            if detail.is_some_and(|d| d.contains_key("path")) {
                deps.code_unit_references.push(dep);
            } else {
                deps.package_references.push(dep);
            }
        }
    }
    deps
}

/// Finds the line declaring `key` inside `[section]`, or as `[section.key]`.
fn cargo_entry_line(content: &str, section: &str, key: &str) -> usize {
    let header = format!("[{section}]");
    let dotted = format!("[{section}.{key}]");
    let mut in_section = false;

    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.starts_with('[') {
            if line == dotted {
                return i + 1;
            }
            in_section = line == header;
            continue;
        }
        if !in_section {
            continue;
        }
        let bare = line.trim_start_matches('"');
        if let Some(rest) = bare.strip_prefix(key) {
            if rest.starts_with(|c: char| matches!(c, '=' | ' ' | '\t' | '.' | '"')) {
                return i + 1;
            }
        }
    }
    0
}

fn project_reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compile(
        &RE,
        r#"<ProjectReference\b[^>]*?\bInclude\s*=\s*["']([^"']+)["']"#,
    )
}

fn package_reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compile(
        &RE,
        r#"<PackageReference\b[^>]*?\bInclude\s*=\s*["']([^"']+)["']"#,
    )
}

pub(crate) fn compile(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern `{pattern}`: {e}"))
    })
}

fn parse_msbuild(content: &str) -> ManifestDependencies {
    if !content.contains("<Project") {
        warn!("Malformed MSBuild manifest: missing <Project> element");
        return ManifestDependencies::default();
    }

    let mut deps = ManifestDependencies::default();
    for caps in project_reference_re().captures_iter(content) {
        let (Some(whole), Some(include)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let normalized = include.as_str().replace('\\', "/");
        let Some(stem) = Path::new(&normalized).file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        deps.code_unit_references
            .push(DependencyRef::new(stem, line_of(content, whole.start())));
    }
    for caps in package_reference_re().captures_iter(content) {
        let (Some(whole), Some(include)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        deps.package_references.push(DependencyRef::new(
            include.as_str().trim(),
            line_of(content, whole.start()),
        ));
    }
    deps
}

/// 1-based line number of a byte offset.
pub(crate) fn line_of(content: &str, offset: usize) -> usize {
    content[..offset.min(content.len())].matches('\n').count() + 1
}
