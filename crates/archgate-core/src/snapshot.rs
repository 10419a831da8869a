//! JSON symbol snapshot adapter.
//!
//! The compiler front end writes one JSON document describing every code unit
//! and its declared types. [`SnapshotModel`] loads it, resolves relative paths
//! against the snapshot's directory, and implements [`CodeModel`].
//!
//! ```json
//! {
//!   "codeUnits": [
//!     {
//!       "name": "Acme.Domain",
//!       "manifestPath": "src/Acme.Domain/Acme.Domain.csproj",
//!       "sourceRoot": "src/Acme.Domain",
//!       "types": [
//!         { "fullName": "Acme.Domain.Order", "kind": "class",
//!           "file": "src/Acme.Domain/Order.cs", "line": 3,
//!           "isSealed": false, "baseTypes": ["Acme.Domain.Entity"] }
//!       ]
//!     }
//!   ]
//! }
//! ```

use crate::config::IndexConfig;
use crate::manifest::parse_manifest;
use crate::model::{CodeModel, CodeUnit, ManifestDependencies, Member, TypeKind, TypeSymbol};
use crate::types::Location;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Errors loading a snapshot.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum SnapshotError {
    /// IO error reading the snapshot.
    #[error("Failed to read snapshot {path}: {source}")]
    #[diagnostic(
        code(archgate::snapshot::io),
        help("run the compiler front end first, or set [analyzer] snapshot in archgate.toml")
    )]
    Io {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Snapshot is not valid JSON of the expected shape.
    #[error("Failed to parse snapshot {path}: {source}")]
    #[diagnostic(code(archgate::snapshot::parse))]
    Parse {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Invalid exclude glob in `[index]`.
    #[error("Invalid exclude pattern `{pattern}`: {source}")]
    #[diagnostic(code(archgate::snapshot::glob))]
    Glob {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        source: glob::PatternError,
    },

    /// Two code units share a name.
    #[error("Duplicate code unit `{0}` in snapshot")]
    #[diagnostic(code(archgate::snapshot::duplicate))]
    DuplicateUnit(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotDto {
    #[serde(default)]
    code_units: Vec<CodeUnitDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeUnitDto {
    name: String,
    #[serde(default)]
    manifest_path: Option<PathBuf>,
    #[serde(default)]
    source_root: Option<PathBuf>,
    #[serde(default)]
    source_files: Option<Vec<PathBuf>>,
    #[serde(default)]
    types: Vec<TypeDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeDto {
    full_name: String,
    #[serde(default)]
    name: Option<String>,
    kind: TypeKind,
    file: PathBuf,
    #[serde(default)]
    line: usize,
    #[serde(default)]
    is_sealed: bool,
    #[serde(default)]
    is_abstract: bool,
    #[serde(default)]
    is_static: bool,
    #[serde(default)]
    base_types: Vec<String>,
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    containing_type: Option<String>,
    #[serde(default)]
    compiler_generated: bool,
}

/// A [`CodeModel`] backed by a JSON snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotModel {
    root: PathBuf,
    units: Vec<CodeUnit>,
}

impl SnapshotModel {
    /// Loads a snapshot file. Relative paths inside it resolve against the
    /// file's directory; source files are discovered per `index` when the
    /// snapshot does not list them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a unit name
    /// repeats, or an exclude pattern is invalid.
    pub fn load(path: &Path, index: &IndexConfig) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|e| SnapshotError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let root = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
        let model = Self::parse(&content, &root, index).map_err(|e| match e {
            SnapshotError::Parse { source, .. } => SnapshotError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        info!(
            "Loaded snapshot {}: {} code unit(s)",
            path.display(),
            model.units.len()
        );
        Ok(model)
    }

    /// Parses snapshot JSON with `root` as the base for relative paths.
    ///
    /// # Errors
    ///
    /// See [`SnapshotModel::load`].
    pub fn parse(content: &str, root: &Path, index: &IndexConfig) -> Result<Self, SnapshotError> {
        let dto: SnapshotDto = serde_json::from_str(content).map_err(|e| SnapshotError::Parse {
            path: PathBuf::from("<input>"),
            source: e,
        })?;
        let discovery = SourceDiscovery::new(index)?;

        let mut units = Vec::with_capacity(dto.code_units.len());
        for unit in dto.code_units {
            if units.iter().any(|u: &CodeUnit| u.name() == unit.name) {
                return Err(SnapshotError::DuplicateUnit(unit.name));
            }
            units.push(convert_unit(unit, root, &discovery));
        }
        Ok(Self {
            root: root.to_path_buf(),
            units,
        })
    }

    /// Wraps already-built units.
    #[must_use]
    pub fn from_units(root: impl Into<PathBuf>, units: Vec<CodeUnit>) -> Self {
        Self {
            root: root.into(),
            units,
        }
    }

    /// Base directory for relative paths.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unit(&self, name: &str) -> Option<&CodeUnit> {
        self.units.iter().find(|u| u.name() == name)
    }
}

impl CodeModel for SnapshotModel {
    fn list_code_units(&self) -> &[CodeUnit] {
        &self.units
    }

    fn locate_manifest(&self, unit_name: &str) -> Option<PathBuf> {
        let unit = self.unit(unit_name)?;
        if let Some(path) = unit.manifest_path() {
            let path = resolve(&self.root, path);
            return path.is_file().then_some(path);
        }
        // Undeclared: try the conventional names inside the source root.
        let dir = resolve(&self.root, unit.source_root());
        [format!("{unit_name}.csproj"), "Cargo.toml".to_string()]
            .into_iter()
            .map(|file| dir.join(file))
            .find(|p| p.is_file())
    }

    fn parse_manifest_dependencies(&self, manifest: &Path) -> ManifestDependencies {
        parse_manifest(manifest)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn convert_unit(dto: CodeUnitDto, root: &Path, discovery: &SourceDiscovery) -> CodeUnit {
    let source_root = resolve(root, dto.source_root.as_deref().unwrap_or(Path::new("")));
    let source_files = match dto.source_files {
        Some(files) => files.iter().map(|f| resolve(root, f)).collect(),
        None => discovery.discover(&source_root),
    };
    debug!(
        "Code unit {}: {} type(s), {} source file(s)",
        dto.name,
        dto.types.len(),
        source_files.len()
    );

    let mut unit = CodeUnit::new(&dto.name)
        .with_source_root(&source_root)
        .with_source_files(source_files);
    if let Some(manifest) = dto.manifest_path {
        unit = unit.with_manifest(resolve(root, &manifest));
    }
    for ty in dto.types {
        unit = unit.with_type(convert_type(ty, &dto.name, root));
    }
    unit
}

fn convert_type(dto: TypeDto, unit_name: &str, root: &Path) -> TypeSymbol {
    let mut symbol = TypeSymbol::new(
        dto.full_name,
        dto.kind,
        unit_name,
        Location::new(resolve(root, &dto.file), dto.line),
    );
    if let Some(name) = dto.name {
        symbol.name = name;
    }
    symbol.is_sealed = dto.is_sealed;
    symbol.is_abstract = dto.is_abstract;
    symbol.is_static = dto.is_static;
    symbol.base_types = dto.base_types;
    symbol.members = dto.members;
    symbol.containing_type = dto.containing_type;
    symbol.compiler_generated = dto.compiler_generated;
    symbol
}

/// Finds source files under a unit's root.
struct SourceDiscovery {
    extensions: Vec<String>,
    exclude: Vec<glob::Pattern>,
    respect_gitignore: bool,
}

impl SourceDiscovery {
    fn new(config: &IndexConfig) -> Result<Self, SnapshotError> {
        let exclude = config
            .exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| SnapshotError::Glob {
                    pattern: p.clone(),
                    source: e,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            extensions: config
                .source_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            exclude,
            respect_gitignore: config.respect_gitignore,
        })
    }

    fn discover(&self, dir: &Path) -> Vec<PathBuf> {
        if !dir.is_dir() {
            warn!("Source root {} does not exist", dir.display());
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = ignore::WalkBuilder::new(dir)
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .require_git(false)
            .build()
            .filter_map(Result::ok)
            .map(ignore::DirEntry::into_path)
            .filter(|p| p.is_file() && self.wants(p))
            .collect();
        files.sort();
        files
    }

    fn wants(&self, path: &Path) -> bool {
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)));
        if !matches_ext {
            return false;
        }
        let path_str = path.to_string_lossy().replace('\\', "/");
        !self.exclude.iter().any(|p| p.matches(&path_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
  "codeUnits": [
    {
      "name": "Acme.Domain",
      "manifestPath": "Acme.Domain/Acme.Domain.csproj",
      "sourceRoot": "Acme.Domain",
      "types": [
        { "fullName": "Acme.Domain.Order", "kind": "class", "file": "Acme.Domain/Order.cs", "line": 3,
          "baseTypes": ["Acme.Domain.Entity"],
          "members": [{ "name": "Id", "kind": "property", "visibility": "public", "returnType": "Guid" }] },
        { "fullName": "<Program>$", "kind": "class", "file": "Acme.Domain/Program.cs", "line": 1,
          "compilerGenerated": true },
        { "fullName": "Acme.Domain.Weird", "kind": "module", "file": "Acme.Domain/Weird.cs" }
      ]
    },
    { "name": "Acme.Empty", "sourceFiles": [] }
  ]
}"#;

    #[test]
    fn test_parse_resolves_paths() {
        let model = SnapshotModel::parse(SNAPSHOT, Path::new("/repo"), &IndexConfig::default()).unwrap();
        let units = model.list_code_units();
        assert_eq!(units.len(), 2);

        let domain = &units[0];
        assert_eq!(domain.name(), "Acme.Domain");
        assert_eq!(
            domain.manifest_path(),
            Some(Path::new("/repo/Acme.Domain/Acme.Domain.csproj"))
        );
        let declared: Vec<_> = domain.declared_types().map(|t| t.name.as_str()).collect();
        assert_eq!(declared, vec!["Order", "Weird"]);

        let order = &domain.all_types()[0];
        assert_eq!(order.location, Location::new("/repo/Acme.Domain/Order.cs", 3));
        assert_eq!(order.base_types, vec!["Acme.Domain.Entity"]);
        assert_eq!(order.members[0].return_type.as_deref(), Some("Guid"));
        assert_eq!(domain.all_types()[2].kind, TypeKind::Other);
    }

    #[test]
    fn test_duplicate_unit_rejected() {
        let json = r#"{"codeUnits":[{"name":"A"},{"name":"A"}]}"#;
        let result = SnapshotModel::parse(json, Path::new("."), &IndexConfig::default());
        assert!(matches!(result, Err(SnapshotError::DuplicateUnit(name)) if name == "A"));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let result = SnapshotModel::parse("{", Path::new("."), &IndexConfig::default());
        assert!(matches!(result, Err(SnapshotError::Parse { .. })));
    }

    #[test]
    fn test_discovers_sources_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let unit_dir = dir.path().join("Acme.Infra");
        std::fs::create_dir_all(unit_dir.join("obj")).unwrap();
        std::fs::write(unit_dir.join("Repo.cs"), "class Repo {}").unwrap();
        std::fs::write(unit_dir.join("notes.txt"), "").unwrap();
        std::fs::write(unit_dir.join("obj").join("Gen.cs"), "").unwrap();
        std::fs::write(unit_dir.join("Acme.Infra.csproj"), "<Project></Project>").unwrap();

        let json = r#"{"codeUnits":[{"name":"Acme.Infra","sourceRoot":"Acme.Infra"}]}"#;
        std::fs::write(dir.path().join("symbols.json"), json).unwrap();

        let model =
            SnapshotModel::load(&dir.path().join("symbols.json"), &IndexConfig::default()).unwrap();
        let unit = &model.list_code_units()[0];
        assert_eq!(unit.source_files(), &[unit_dir.join("Repo.cs")]);
        assert_eq!(
            model.locate_manifest("Acme.Infra"),
            Some(unit_dir.join("Acme.Infra.csproj"))
        );
        assert_eq!(model.locate_manifest("Missing"), None);
    }

    #[test]
    fn test_declared_but_missing_manifest_is_absent() {
        let unit = CodeUnit::new("Acme.App").with_manifest("/nonexistent/Acme.App.csproj");
        let model = SnapshotModel::from_units("/", vec![unit]);
        assert_eq!(model.locate_manifest("Acme.App"), None);
    }

    #[test]
    fn test_fallback_manifest_resolves_against_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Acme.App.csproj"), "<Project />").unwrap();
        let nested = dir.path().join("Acme.Lib");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("Acme.Lib.csproj"), "<Project />").unwrap();

        let model = SnapshotModel::from_units(
            dir.path(),
            vec![
                CodeUnit::new("Acme.App"),
                CodeUnit::new("Acme.Lib").with_source_root("Acme.Lib"),
            ],
        );
        assert_eq!(
            model.locate_manifest("Acme.App"),
            Some(dir.path().join("Acme.App.csproj"))
        );
        assert_eq!(
            model.locate_manifest("Acme.Lib"),
            Some(nested.join("Acme.Lib.csproj"))
        );
    }

    #[test]
    fn test_missing_snapshot_is_io_error() {
        let result = SnapshotModel::load(Path::new("/nonexistent/symbols.json"), &IndexConfig::default());
        assert!(matches!(result, Err(SnapshotError::Io { .. })));
    }
}
