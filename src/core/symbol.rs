use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Closed classification of top-level declarations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    TypeAlias,
    Interface,
    Class,
    Enum,
    Function,
    Const,
    Let,
    Var,
    ModuleBlock,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::TypeAlias => "type-alias",
            SymbolKind::Interface => "interface",
            SymbolKind::Class => "class",
            SymbolKind::Enum => "enum",
            SymbolKind::Function => "function",
            SymbolKind::Const => "const",
            SymbolKind::Let => "let",
            SymbolKind::Var => "var",
            SymbolKind::ModuleBlock => "module-block",
        }
    }

    /// True for declarations that only exist in the type system.
    pub fn is_type_only(&self) -> bool {
        matches!(self, SymbolKind::TypeAlias | SymbolKind::Interface)
    }
}

/// Byte and line/column span of a declaration in its source file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceLocation {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

/// Opaque handle to the declaring node in the parsed tree. The tree must
/// outlive the symbol table; the handle is only meaningful for the run that
/// produced it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeclarationRef {
    pub file: usize,
    pub node_id: usize,
    pub start: usize,
    pub end: usize,
}

impl DeclarationRef {
    /// Whether `other` lies on the same declaration chain: equal to, inside,
    /// or enclosing this span within the same file.
    pub fn same_chain(&self, other: &DeclarationRef) -> bool {
        self.file == other.file
            && ((self.start <= other.start && other.end <= self.end)
                || (other.start <= self.start && self.end <= other.end))
    }
}

/// A top-level named declaration.
///
/// Identity is the fully qualified id `<file_key>:<name>`, unique across the
/// project and used in every edge and query. `dependencies` and `dependents`
/// are id sets, never direct references, so the graph may cycle freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub id: String,
    pub kind: SymbolKind,
    pub type_text: String,
    pub declaration_ref: DeclarationRef,
    pub is_exported: bool,
    pub documentation: String,
    pub location: SourceLocation,
    pub file_key: String,
    pub dependencies: BTreeSet<String>,
    pub dependents: BTreeSet<String>,
    /// Set when a variable's initializer was a function or arrow literal.
    pub function_initializer: bool,
}

impl Symbol {
    pub fn new(
        name: &str,
        file_key: &str,
        kind: SymbolKind,
        declaration_ref: DeclarationRef,
        location: SourceLocation,
    ) -> Self {
        Self {
            name: name.to_string(),
            id: qualified_id(file_key, name),
            kind,
            type_text: String::new(),
            declaration_ref,
            is_exported: false,
            documentation: String::new(),
            location,
            file_key: file_key.to_string(),
            dependencies: BTreeSet::new(),
            dependents: BTreeSet::new(),
            function_initializer: false,
        }
    }

    pub fn with_type_text(mut self, type_text: String) -> Self {
        self.type_text = type_text;
        self
    }

    pub fn with_documentation(mut self, documentation: String) -> Self {
        self.documentation = documentation;
        self
    }

    pub fn exported(mut self, is_exported: bool) -> Self {
        self.is_exported = is_exported;
        self
    }

    pub fn with_function_initializer(mut self, function_initializer: bool) -> Self {
        self.function_initializer = function_initializer;
        self
    }

    /// Kind for downstream categorization. Storage kind follows the variable
    /// keyword, but a `const f = () => …` reads as a function to consumers.
    pub fn reported_kind(&self) -> SymbolKind {
        if self.function_initializer
            && matches!(self.kind, SymbolKind::Const | SymbolKind::Let | SymbolKind::Var)
        {
            SymbolKind::Function
        } else {
            self.kind
        }
    }
}

/// How an imported name was introduced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImportStyle {
    Default,
    Named,
    Namespace,
}

impl ImportStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStyle::Default => "default",
            ImportStyle::Named => "named",
            ImportStyle::Namespace => "namespace",
        }
    }
}

/// One local name introduced by an import statement. Imports are not
/// symbols; they translate a local identifier to the exporting module and
/// the name it exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Import {
    pub local_name: String,
    /// Module specifier exactly as written.
    pub from_module: String,
    /// Specifier reduced to the file key it resolves to (see
    /// [`normalize_specifier`]).
    pub normalized_module: String,
    pub style: ImportStyle,
    /// What the exporting module calls it: `default` for default imports,
    /// `*` for namespace imports.
    pub original_name: String,
}

/// A re-exported name (`export { a as b } from './m'`). Produces no symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReExport {
    pub exported_name: String,
    pub original_name: String,
    pub from_module: String,
    pub normalized_module: String,
}

/// Per-file extraction record: exported and internal symbols plus the import
/// translation table, each in source order. Insertion order is observable in
/// report output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSymbols {
    pub file_key: String,
    pub exports: IndexMap<String, Symbol>,
    pub internal: IndexMap<String, Symbol>,
    pub imports: IndexMap<String, Import>,
    pub reexports: Vec<ReExport>,
    /// Non-fatal extraction notes (skipped anonymous or unresolvable
    /// declarations). Surfaced by reports under strict mode.
    pub warnings: Vec<String>,
}

impl FileSymbols {
    pub fn new(file_key: &str) -> Self {
        Self {
            file_key: file_key.to_string(),
            ..Default::default()
        }
    }

    /// Routes a symbol into `exports` or `internal` by its export flag.
    pub fn add_symbol(&mut self, symbol: Symbol) {
        if symbol.is_exported {
            self.exports.insert(symbol.name.clone(), symbol);
        } else {
            self.internal.insert(symbol.name.clone(), symbol);
        }
    }

    pub fn add_import(&mut self, import: Import) {
        self.imports.insert(import.local_name.clone(), import);
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.exports.get(name).or_else(|| self.internal.get(name))
    }

    pub fn symbol_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        if self.exports.contains_key(name) {
            self.exports.get_mut(name)
        } else {
            self.internal.get_mut(name)
        }
    }

    /// Exported symbols first, then internal, each in source order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.exports.values().chain(self.internal.values())
    }

    pub fn symbols_mut(&mut self) -> impl Iterator<Item = &mut Symbol> {
        self.exports.values_mut().chain(self.internal.values_mut())
    }

    pub fn symbol_count(&self) -> usize {
        self.exports.len() + self.internal.len()
    }
}

/// Builds the canonical `<file_key>:<name>` id.
pub fn qualified_id(file_key: &str, name: &str) -> String {
    format!("{}:{}", file_key, name)
}

/// Splits an id back into its file-key and name portions at the first `:`.
/// File keys never contain `:` (sanitized at construction), so the split is
/// unambiguous.
pub fn split_id(id: &str) -> (&str, &str) {
    match id.split_once(':') {
        Some((file_key, name)) => (file_key, name),
        None => ("", id),
    }
}

/// File key for a project path: the basename without extension, with `:`
/// and path separators escaped so the id grammar stays unambiguous.
pub fn file_key_for_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    sanitize_key(&stem)
}

/// Normalizes a module specifier to the file key it points at. Relative
/// specifiers are joined onto the importing file's directory and reduced to
/// their final component with any `.ts`/`.tsx`/`.js` suffix stripped; bare
/// specifiers pass through unchanged apart from `:` escaping.
pub fn normalize_specifier(specifier: &str, importing_file: &Path) -> String {
    if specifier.starts_with('.') {
        let dir = importing_file.parent().unwrap_or_else(|| Path::new(""));
        let joined = dir.join(specifier);
        let last = joined
            .components()
            .last()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .unwrap_or_else(|| specifier.to_string());
        let trimmed = last
            .strip_suffix(".tsx")
            .or_else(|| last.strip_suffix(".ts"))
            .or_else(|| last.strip_suffix(".js"))
            .unwrap_or(&last);
        sanitize_key(trimmed)
    } else {
        sanitize_key(specifier)
    }
}

fn sanitize_key(raw: &str) -> String {
    raw.replace([':', '/', '\\'], "_")
}
