//! Read-only view of a compiled codebase.
//!
//! The types here are produced by an external compiler front end (see
//! [`crate::snapshot`] for the JSON adapter) and consumed by the index builder
//! and rules. Nothing in this module performs I/O.

use crate::types::Location;
use crate::utils::names;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Reference class.
    Class,
    /// Record class.
    Record,
    /// Value type.
    Struct,
    /// Interface.
    Interface,
    /// Enumeration.
    Enum,
    /// Delegate type.
    Delegate,
    /// Anything the front end could not classify.
    #[serde(other)]
    Other,
}

impl TypeKind {
    /// Returns true for kinds that participate in class inheritance.
    #[must_use]
    pub fn is_class(self) -> bool {
        matches!(self, Self::Class | Self::Record)
    }
}

/// Declared accessibility of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible everywhere.
    Public,
    /// Visible inside the declaring code unit.
    Internal,
    /// Visible to subclasses.
    Protected,
    /// Visible inside the declaring type.
    #[default]
    Private,
}

/// Kind of a type member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    /// Method.
    Method,
    /// Property.
    Property,
    /// Field.
    Field,
    /// Constructor.
    Constructor,
    /// Event.
    Event,
    /// Unclassified member.
    #[serde(other)]
    Other,
}

/// A member of a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Member name.
    pub name: String,
    /// Member kind.
    pub kind: MemberKind,
    /// Declared accessibility.
    #[serde(default)]
    pub visibility: Visibility,
    /// Whether the member is static.
    #[serde(default)]
    pub is_static: bool,
    /// Return or value type, when meaningful.
    #[serde(default)]
    pub return_type: Option<String>,
}

/// One declared type with the structural facts rules need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSymbol {
    /// Fully-qualified name (e.g., `Acme.Domain.Order`).
    pub full_name: String,
    /// Simple name (e.g., `Order`).
    pub name: String,
    /// Type kind.
    pub kind: TypeKind,
    /// Name of the declaring code unit.
    pub code_unit: String,
    /// Declaration location.
    pub location: Location,
    /// Declared `sealed` (or `final`).
    pub is_sealed: bool,
    /// Declared `abstract`.
    pub is_abstract: bool,
    /// Declared `static`.
    pub is_static: bool,
    /// Names of declared base types, as written or resolved.
    pub base_types: Vec<String>,
    /// Declared members.
    pub members: Vec<Member>,
    /// Full name of the enclosing type for nested declarations.
    pub containing_type: Option<String>,
    /// Emitted by the compiler rather than written by a person.
    pub compiler_generated: bool,
}

impl TypeSymbol {
    /// Creates a symbol; the simple name is derived from `full_name`.
    #[must_use]
    pub fn new(
        full_name: impl Into<String>,
        kind: TypeKind,
        code_unit: impl Into<String>,
        location: Location,
    ) -> Self {
        let full_name = full_name.into();
        let name = names::simple_name(&full_name).to_string();
        Self {
            full_name,
            name,
            kind,
            code_unit: code_unit.into(),
            location,
            is_sealed: false,
            is_abstract: false,
            is_static: false,
            base_types: Vec::new(),
            members: Vec::new(),
            containing_type: None,
            compiler_generated: false,
        }
    }

    /// Shorthand for a class symbol.
    #[must_use]
    pub fn class(full_name: impl Into<String>, code_unit: impl Into<String>, location: Location) -> Self {
        Self::new(full_name, TypeKind::Class, code_unit, location)
    }

    /// Marks the type sealed.
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.is_sealed = true;
        self
    }

    /// Marks the type abstract.
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Marks the type static.
    #[must_use]
    pub fn static_type(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Adds a base type name.
    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base_types.push(base.into());
        self
    }

    /// Records the enclosing type of a nested declaration.
    #[must_use]
    pub fn nested_in(mut self, containing: impl Into<String>) -> Self {
        self.containing_type = Some(containing.into());
        self
    }

    /// Marks the type as compiler-generated.
    #[must_use]
    pub fn generated(mut self) -> Self {
        self.compiler_generated = true;
        self
    }

    /// Returns true if the symbol must not be enumerated for rules.
    ///
    /// Covers synthesized entry points such as `<Program>$`.
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.compiler_generated || self.name.starts_with('<')
    }
}

/// One independently compiled module (a project, crate, or assembly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeUnit {
    name: String,
    manifest_path: Option<PathBuf>,
    source_root: PathBuf,
    types: Vec<TypeSymbol>,
    source_files: Vec<PathBuf>,
}

impl CodeUnit {
    /// Creates an empty code unit.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            manifest_path: None,
            source_root: PathBuf::new(),
            types: Vec::new(),
            source_files: Vec::new(),
        }
    }

    /// Sets the manifest path.
    #[must_use]
    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    /// Sets the source root directory.
    #[must_use]
    pub fn with_source_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_root = path.into();
        self
    }

    /// Appends a declared type.
    #[must_use]
    pub fn with_type(mut self, symbol: TypeSymbol) -> Self {
        self.types.push(symbol);
        self
    }

    /// Replaces the list of source files available for text scanning.
    #[must_use]
    pub fn with_source_files(mut self, files: Vec<PathBuf>) -> Self {
        self.source_files = files;
        self
    }

    /// Unit name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Manifest path as declared by the front end.
    #[must_use]
    pub fn manifest_path(&self) -> Option<&Path> {
        self.manifest_path.as_deref()
    }

    /// Source root directory.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Declared types in declaration order, nested types included, excluding
    /// compiler-generated entry points.
    pub fn declared_types(&self) -> impl Iterator<Item = &TypeSymbol> {
        self.types.iter().filter(|t| !t.is_excluded())
    }

    /// Every symbol, excluded ones included.
    #[must_use]
    pub fn all_types(&self) -> &[TypeSymbol] {
        &self.types
    }

    /// Source files for the textual fallback scan.
    #[must_use]
    pub fn source_files(&self) -> &[PathBuf] {
        &self.source_files
    }
}

/// A dependency declared in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyRef {
    /// Referenced code unit or package name.
    pub name: String,
    /// 1-based manifest line of the declaration (0 when unknown).
    pub line: usize,
}

impl DependencyRef {
    /// Creates a new dependency reference.
    #[must_use]
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
        }
    }
}

/// Direct dependencies declared by a code unit's manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDependencies {
    /// References to other code units.
    pub code_unit_references: Vec<DependencyRef>,
    /// References to external packages.
    pub package_references: Vec<DependencyRef>,
}

impl ManifestDependencies {
    /// Returns true when no dependency is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code_unit_references.is_empty() && self.package_references.is_empty()
    }

    /// Names of referenced code units.
    pub fn code_unit_names(&self) -> impl Iterator<Item = &str> {
        self.code_unit_references.iter().map(|d| d.name.as_str())
    }

    /// Names of referenced packages.
    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.package_references.iter().map(|d| d.name.as_str())
    }
}

/// Interface to the compiler front end's output.
///
/// Implementations must be cheap to query; every method is called from the
/// analyzer, possibly from several threads.
pub trait CodeModel: Sync {
    /// Every code unit, in the front end's order.
    fn list_code_units(&self) -> &[CodeUnit];

    /// Resolves the manifest of `unit_name`, if one exists on disk.
    fn locate_manifest(&self, unit_name: &str) -> Option<PathBuf>;

    /// Parses declared dependencies. Malformed or unreadable manifests yield
    /// empty lists, never an error.
    fn parse_manifest_dependencies(&self, manifest: &Path) -> ManifestDependencies;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_name_is_derived() {
        let t = TypeSymbol::class("Acme.Domain.Order", "Domain", Location::new("Order.cs", 1));
        assert_eq!(t.name, "Order");
        assert_eq!(t.kind, TypeKind::Class);
    }

    #[test]
    fn declared_types_skip_generated_entry_points() {
        let unit = CodeUnit::new("App")
            .with_type(TypeSymbol::class("<Program>$", "App", Location::new("Program.cs", 1)))
            .with_type(TypeSymbol::class("Acme.App.Startup", "App", Location::new("Startup.cs", 1)))
            .with_type(
                TypeSymbol::class("Acme.App.Generated", "App", Location::new("Gen.cs", 1)).generated(),
            );
        let names: Vec<&str> = unit.declared_types().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Startup"]);
        assert_eq!(unit.all_types().len(), 3);
    }

    #[test]
    fn nested_types_are_listed_flatly_in_order() {
        let unit = CodeUnit::new("Domain")
            .with_type(TypeSymbol::class("Acme.Outer", "Domain", Location::new("Outer.cs", 1)))
            .with_type(
                TypeSymbol::class("Acme.Outer.Inner", "Domain", Location::new("Outer.cs", 5))
                    .nested_in("Acme.Outer"),
            );
        let names: Vec<&str> = unit.declared_types().map(|t| t.full_name.as_str()).collect();
        assert_eq!(names, vec!["Acme.Outer", "Acme.Outer.Inner"]);
    }

    #[test]
    fn type_kind_deserializes_unknown_as_other() {
        let kind: TypeKind = serde_json::from_str("\"module\"").unwrap();
        assert_eq!(kind, TypeKind::Other);
        assert!(TypeKind::Record.is_class());
        assert!(!TypeKind::Interface.is_class());
    }

    #[test]
    fn manifest_dependencies_names() {
        let deps = ManifestDependencies {
            code_unit_references: vec![DependencyRef::new("Infra", 4)],
            package_references: vec![DependencyRef::new("Serilog", 7)],
        };
        assert_eq!(deps.code_unit_names().collect::<Vec<_>>(), vec!["Infra"]);
        assert_eq!(deps.package_names().collect::<Vec<_>>(), vec!["Serilog"]);
        assert!(!deps.is_empty());
        assert!(ManifestDependencies::default().is_empty());
    }
}
