use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tree_sitter::{Node as TSNode, Parser, Tree};

use crate::core::symbol::{file_key_for_path, SourceLocation};
use crate::error::AnalysisError;

/// Pseudo file key owning standard-library globals (`console`, `Math`, …).
pub const LIB_FILE_KEY: &str = "lib";

const LIB_GLOBALS: &[&str] = &[
    "Array", "ArrayBuffer", "BigInt", "Boolean", "DataView", "Date", "Error", "EvalError",
    "Function", "Infinity", "Intl", "JSON", "Map", "Math", "NaN", "Number", "Object", "Promise",
    "Proxy", "RangeError", "ReferenceError", "Reflect", "RegExp", "Set", "String", "Symbol",
    "SyntaxError", "TypeError", "URIError", "WeakMap", "WeakSet", "clearInterval", "clearTimeout",
    "console", "decodeURI", "decodeURIComponent", "encodeURI", "encodeURIComponent", "eval",
    "fetch", "globalThis", "isFinite", "isNaN", "parseFloat", "parseInt", "queueMicrotask",
    "setInterval", "setTimeout", "structuredClone", "undefined",
];

/// Analysis policy knobs. All default to off; the CLI maps flags onto them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CompilerOptions {
    /// Emit dependencies on standard-library globals (`lib:console`, …).
    pub include_system_symbols: bool,
    /// Emit dependencies on bare-specifier (third-party) modules.
    pub include_node_modules: bool,
    /// Emit type-position references from value-level symbols too.
    pub follow_type_only_imports: bool,
    /// Fail analysis when the frontend reports any diagnostic.
    pub strict: bool,
}

/// A parse-level problem in one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Where a resolved declaration lives relative to the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolOrigin {
    Project,
    ThirdParty,
    System,
}

/// What kind of binding a name resolved to.
///
/// Interface and class members never appear here: member positions are
/// filtered out before resolution is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Parameter,
    Variable,
    Function,
    Class,
    Interface,
    TypeAlias,
    Enum,
    Namespace,
    ImportBinding,
    LibGlobal,
}

/// The declaration a name resolved to. For standard-library globals there is
/// no declaring node; everything else points back into a parsed tree.
#[derive(Debug, Clone)]
pub struct Declaration<'p> {
    pub node: Option<TSNode<'p>>,
    pub file: usize,
    pub kind: DeclKind,
    pub origin: SymbolOrigin,
    pub name: String,
}

/// One parsed root file: path, derived file key, source text, and tree.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_key: String,
    pub text: String,
    tree: Tree,
}

impl SourceFile {
    pub fn root(&self) -> TSNode<'_> {
        self.tree.root_node()
    }

    pub fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Declaration-only files contribute no symbols.
    pub fn is_declaration_file(&self) -> bool {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(".d.ts"))
            .unwrap_or(false)
    }
}

/// The parsing and name-resolution frontend.
///
/// Owns the source text and syntax tree of every root file for the lifetime
/// of the analysis; the symbol table keeps opaque handles into these trees,
/// so a `Program` must outlive any table built from it. Resolution is purely
/// lexical: innermost scope outward, then top-level declarations and import
/// bindings, then a fixed set of standard-library globals.
#[derive(Debug)]
pub struct Program {
    files: Vec<SourceFile>,
    options: CompilerOptions,
    diagnostics: Vec<Diagnostic>,
}

impl Program {
    /// Reads and parses every root file. An empty list or a missing file is
    /// `InvalidInput`; a file the grammar cannot produce a tree for is
    /// `CheckerError`. Syntax errors inside an otherwise-parsed file become
    /// diagnostics, not failures.
    pub fn load(root_files: &[PathBuf], options: CompilerOptions) -> Result<Self, AnalysisError> {
        if root_files.is_empty() {
            return Err(AnalysisError::InvalidInput {
                reason: "root-files list is empty".to_string(),
            });
        }

        let mut files = Vec::with_capacity(root_files.len());
        let mut diagnostics = Vec::new();

        for path in root_files {
            let text = fs::read_to_string(path).map_err(|err| AnalysisError::InvalidInput {
                reason: format!("cannot read {}: {}", path.display(), err),
            })?;

            let mut parser = Parser::new();
            let language = if path.extension().and_then(|e| e.to_str()) == Some("tsx") {
                tree_sitter_typescript::language_tsx()
            } else {
                tree_sitter_typescript::language_typescript()
            };
            parser
                .set_language(language)
                .map_err(|err| AnalysisError::CheckerError {
                    file: path.display().to_string(),
                    message: err.to_string(),
                })?;
            let tree = parser
                .parse(&text, None)
                .ok_or_else(|| AnalysisError::CheckerError {
                    file: path.display().to_string(),
                    message: "parser produced no tree".to_string(),
                })?;

            let file_key = file_key_for_path(path);
            collect_syntax_diagnostics(&tree, &file_key, &mut diagnostics);

            files.push(SourceFile {
                path: path.clone(),
                file_key,
                text,
                tree,
            });
        }

        Ok(Self {
            files,
            options,
            diagnostics,
        })
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn file(&self, index: usize) -> &SourceFile {
        &self.files[index]
    }

    pub fn file_key(&self, index: usize) -> &str {
        &self.files[index].file_key
    }

    /// Node text via its byte range.
    pub fn text_of(&self, file: usize, node: TSNode<'_>) -> &str {
        let bytes = self.files[file].bytes();
        std::str::from_utf8(&bytes[node.byte_range()]).unwrap_or("")
    }

    pub fn location_of(&self, node: TSNode<'_>) -> SourceLocation {
        let start = node.start_position();
        SourceLocation {
            start: node.start_byte(),
            end: node.end_byte(),
            line: start.row + 1,
            column: start.column,
        }
    }

    /// Resolves an identifier occurrence to the declaration that introduced
    /// its name in scope, walking enclosing scopes innermost-first. Names
    /// that nothing declares fall back to the standard-library global set.
    pub fn resolve<'p>(&'p self, file: usize, ident: TSNode<'p>) -> Option<Declaration<'p>> {
        let name = self.text_of(file, ident);
        if name.is_empty() {
            return None;
        }

        let mut child = ident;
        while let Some(scope) = child.parent() {
            if let Some(decl) = self.binding_in_scope(file, scope, name) {
                return Some(decl);
            }
            child = scope;
        }

        if LIB_GLOBALS.contains(&name) {
            return Some(Declaration {
                node: None,
                file,
                kind: DeclKind::LibGlobal,
                origin: SymbolOrigin::System,
                name: name.to_string(),
            });
        }
        None
    }

    /// Looks for a binding of `name` introduced directly by `scope`.
    fn binding_in_scope<'p>(
        &'p self,
        file: usize,
        scope: TSNode<'p>,
        name: &str,
    ) -> Option<Declaration<'p>> {
        match scope.kind() {
            "function_declaration"
            | "generator_function_declaration"
            | "function"
            | "generator_function"
            | "method_definition"
            | "arrow_function" => {
                if let Some(param) = self.parameter_binding(file, scope, name) {
                    return Some(param);
                }
                // A function expression's own name is visible in its body.
                if let Some(fn_name) = scope.child_by_field_name("name") {
                    if self.text_of(file, fn_name) == name {
                        return Some(self.project_decl(file, scope, DeclKind::Function, name));
                    }
                }
                None
            }
            "statement_block" | "program" => {
                let top_level = scope.kind() == "program";
                let mut cursor = scope.walk();
                for statement in scope.named_children(&mut cursor) {
                    if let Some(decl) = self.binding_in_statement(file, statement, name, top_level)
                    {
                        return Some(decl);
                    }
                }
                None
            }
            "for_statement" | "for_in_statement" => {
                let initializer = scope
                    .child_by_field_name("initializer")
                    .or_else(|| scope.child_by_field_name("left"))?;
                self.declarator_binding(file, initializer, name)
            }
            "catch_clause" => {
                let param = scope.child_by_field_name("parameter")?;
                if self.pattern_binds(file, param, name) {
                    Some(self.project_decl(file, param, DeclKind::Parameter, name))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn parameter_binding<'p>(
        &'p self,
        file: usize,
        function: TSNode<'p>,
        name: &str,
    ) -> Option<Declaration<'p>> {
        // Arrow functions with a single bare identifier use the `parameter`
        // field; everything else carries a `formal_parameters` list.
        if let Some(single) = function.child_by_field_name("parameter") {
            if self.text_of(file, single) == name {
                return Some(self.project_decl(file, single, DeclKind::Parameter, name));
            }
        }
        let params = function.child_by_field_name("parameters")?;
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "required_parameter" | "optional_parameter" | "rest_parameter" => {
                    let pattern = param
                        .child_by_field_name("pattern")
                        .unwrap_or(param);
                    if self.pattern_binds(file, pattern, name) {
                        return Some(self.project_decl(file, param, DeclKind::Parameter, name));
                    }
                }
                "identifier" => {
                    if self.text_of(file, param) == name {
                        return Some(self.project_decl(file, param, DeclKind::Parameter, name));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Whether a binding pattern (identifier, object, or array destructuring)
    /// introduces `name`.
    fn pattern_binds(&self, file: usize, pattern: TSNode<'_>, name: &str) -> bool {
        match pattern.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                self.text_of(file, pattern) == name
            }
            "object_pattern" | "array_pattern" | "pair_pattern" | "rest_pattern"
            | "assignment_pattern" => {
                let mut cursor = pattern.walk();
                let result = pattern
                    .named_children(&mut cursor)
                    .any(|child| self.pattern_binds(file, child, name));
                result
            }
            _ => false,
        }
    }

    /// Declarations introduced by one statement. At the top level this also
    /// covers import bindings and unwraps `export` statements.
    fn binding_in_statement<'p>(
        &'p self,
        file: usize,
        statement: TSNode<'p>,
        name: &str,
        top_level: bool,
    ) -> Option<Declaration<'p>> {
        match statement.kind() {
            "export_statement" => {
                let inner = statement.child_by_field_name("declaration")?;
                self.binding_in_statement(file, inner, name, top_level)
            }
            "function_declaration" | "generator_function_declaration" => {
                self.named_decl(file, statement, DeclKind::Function, name)
            }
            "class_declaration" | "abstract_class_declaration" => {
                self.named_decl(file, statement, DeclKind::Class, name)
            }
            "interface_declaration" => self.named_decl(file, statement, DeclKind::Interface, name),
            "type_alias_declaration" => {
                self.named_decl(file, statement, DeclKind::TypeAlias, name)
            }
            "enum_declaration" => self.named_decl(file, statement, DeclKind::Enum, name),
            "module" | "internal_module" => {
                self.named_decl(file, statement, DeclKind::Namespace, name)
            }
            "expression_statement" => {
                let inner = statement.named_child(0)?;
                if inner.kind() == "internal_module" {
                    self.named_decl(file, inner, DeclKind::Namespace, name)
                } else {
                    None
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                self.declarator_binding(file, statement, name)
            }
            "import_statement" if top_level => self.import_binding(file, statement, name),
            _ => None,
        }
    }

    fn named_decl<'p>(
        &'p self,
        file: usize,
        node: TSNode<'p>,
        kind: DeclKind,
        name: &str,
    ) -> Option<Declaration<'p>> {
        let name_node = node.child_by_field_name("name")?;
        if self.text_of(file, name_node) == name {
            Some(self.project_decl(file, node, kind, name))
        } else {
            None
        }
    }

    fn declarator_binding<'p>(
        &'p self,
        file: usize,
        declaration: TSNode<'p>,
        name: &str,
    ) -> Option<Declaration<'p>> {
        let mut cursor = declaration.walk();
        for declarator in declaration.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let pattern = declarator.child_by_field_name("name")?;
            if self.pattern_binds(file, pattern, name) {
                return Some(self.project_decl(file, declarator, DeclKind::Variable, name));
            }
        }
        None
    }

    /// Matches `name` against the bindings of one import statement,
    /// classifying origin by the specifier. Named and default bindings of a
    /// relative import resolve through to the exporting file's declaration
    /// when that file is loaded, so callers see the real declaration kind;
    /// the hop is not followed transitively, which keeps circular imports
    /// from recursing.
    fn import_binding<'p>(
        &'p self,
        file: usize,
        import: TSNode<'p>,
        name: &str,
    ) -> Option<Declaration<'p>> {
        let specifier = self.import_specifier_text(file, import);
        let origin = match &specifier {
            Some(spec) if spec.starts_with('.') => SymbolOrigin::Project,
            Some(_) => SymbolOrigin::ThirdParty,
            None => SymbolOrigin::Project,
        };

        let binding_decl = |node: TSNode<'p>| Declaration {
            node: Some(node),
            file,
            kind: DeclKind::ImportBinding,
            origin,
            name: name.to_string(),
        };

        let mut cursor = import.walk();
        for child in import.named_children(&mut cursor) {
            if child.kind() != "import_clause" {
                continue;
            }
            let mut clause_cursor = child.walk();
            for binding in child.named_children(&mut clause_cursor) {
                match binding.kind() {
                    "identifier" => {
                        if self.text_of(file, binding) == name {
                            return Some(binding_decl(binding));
                        }
                    }
                    "namespace_import" => {
                        let mut ns_cursor = binding.walk();
                        for ns_name in binding.named_children(&mut ns_cursor) {
                            if ns_name.kind() == "identifier"
                                && self.text_of(file, ns_name) == name
                            {
                                return Some(binding_decl(binding));
                            }
                        }
                    }
                    "named_imports" => {
                        let mut named_cursor = binding.walk();
                        for spec in binding.named_children(&mut named_cursor) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            let local = spec
                                .child_by_field_name("alias")
                                .or_else(|| spec.child_by_field_name("name"));
                            if let Some(local) = local {
                                if self.text_of(file, local) == name {
                                    let original = spec
                                        .child_by_field_name("name")
                                        .map(|n| self.text_of(file, n).to_string())
                                        .unwrap_or_else(|| name.to_string());
                                    if let Some(target) = self.resolve_import_target(
                                        file,
                                        specifier.as_deref(),
                                        &original,
                                    ) {
                                        return Some(target);
                                    }
                                    return Some(binding_decl(spec));
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        None
    }

    /// One-hop lookup of an imported name's declaration in the exporting
    /// file. Import statements in the target are not followed.
    fn resolve_import_target<'p>(
        &'p self,
        importing_file: usize,
        specifier: Option<&str>,
        original_name: &str,
    ) -> Option<Declaration<'p>> {
        let spec = specifier?;
        if !spec.starts_with('.') {
            return None;
        }
        let key = crate::core::symbol::normalize_specifier(
            spec,
            &self.files[importing_file].path,
        );
        let target = self.files.iter().position(|f| f.file_key == key)?;

        let root = self.files[target].root();
        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            if let Some(decl) =
                self.binding_in_statement(target, statement, original_name, false)
            {
                return Some(decl);
            }
        }
        None
    }

    /// The import's module specifier with surrounding quotes stripped.
    pub fn import_specifier_text(&self, file: usize, import: TSNode<'_>) -> Option<String> {
        let source = import.child_by_field_name("source")?;
        Some(self.string_value(file, source))
    }

    pub fn string_value(&self, file: usize, string_node: TSNode<'_>) -> String {
        self.text_of(file, string_node)
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .to_string()
    }

    fn project_decl<'p>(
        &'p self,
        file: usize,
        node: TSNode<'p>,
        kind: DeclKind,
        name: &str,
    ) -> Declaration<'p> {
        Declaration {
            node: Some(node),
            file,
            kind,
            origin: SymbolOrigin::Project,
            name: name.to_string(),
        }
    }

    // --- predicates ------------------------------------------------------

    pub fn is_parameter(&self, decl: &Declaration<'_>) -> bool {
        decl.kind == DeclKind::Parameter
    }

    pub fn is_type_alias(&self, decl: &Declaration<'_>) -> bool {
        decl.kind == DeclKind::TypeAlias
    }

    pub fn is_interface(&self, decl: &Declaration<'_>) -> bool {
        decl.kind == DeclKind::Interface
    }

    pub fn is_class(&self, decl: &Declaration<'_>) -> bool {
        decl.kind == DeclKind::Class
    }

    pub fn is_function_like(&self, node: TSNode<'_>) -> bool {
        matches!(
            node.kind(),
            "function_declaration"
                | "generator_function_declaration"
                | "function"
                | "generator_function"
                | "method_definition"
                | "arrow_function"
        )
    }

    pub fn is_variable_declaration(&self, node: TSNode<'_>) -> bool {
        matches!(node.kind(), "lexical_declaration" | "variable_declaration")
    }

    /// Identifier-like occurrences worth classifying. Shorthand object
    /// properties (`{ x }`) read the binding `x`, so they count.
    pub fn is_identifier(&self, node: TSNode<'_>) -> bool {
        matches!(
            node.kind(),
            "identifier" | "type_identifier" | "shorthand_property_identifier"
        )
    }

    pub fn is_property_access(&self, node: TSNode<'_>) -> bool {
        matches!(node.kind(), "member_expression" | "subscript_expression")
    }

    /// Whether the node sits where only a type expression is legal: inside a
    /// type annotation, type arguments or parameters, an interface body or
    /// heritage clause, a type alias value, or the type side of `as`.
    pub fn is_type_position(&self, node: TSNode<'_>) -> bool {
        let mut child = node;
        while let Some(parent) = child.parent() {
            match parent.kind() {
                "type_annotation"
                | "type_arguments"
                | "type_parameter"
                | "type_parameters"
                | "constraint"
                | "default_type"
                | "extends_type_clause"
                | "implements_clause"
                | "type_predicate"
                | "type_query"
                | "index_type_query" => return true,
                "type_alias_declaration" | "interface_declaration" => {
                    let is_name = parent
                        .child_by_field_name("name")
                        .map(|n| n.id() == child.id())
                        .unwrap_or(false);
                    return !is_name;
                }
                "as_expression" | "satisfies_expression" => {
                    let is_type_side = parent
                        .named_child(1)
                        .map(|n| n.id() == child.id())
                        .unwrap_or(false);
                    if is_type_side {
                        return true;
                    }
                }
                _ => {}
            }
            child = parent;
        }
        false
    }

    // --- display helpers -------------------------------------------------

    /// Textual rendering of a declaration's type, for display only.
    pub fn type_to_string(&self, file: usize, node: TSNode<'_>) -> String {
        match node.kind() {
            "function_declaration"
            | "generator_function_declaration"
            | "function"
            | "generator_function"
            | "arrow_function"
            | "method_definition" => {
                let params = node
                    .child_by_field_name("parameters")
                    .or_else(|| node.child_by_field_name("parameter"))
                    .map(|p| self.text_of(file, p).to_string())
                    .unwrap_or_else(|| "()".to_string());
                let ret = node
                    .child_by_field_name("return_type")
                    .map(|r| self.text_of(file, r).to_string())
                    .unwrap_or_default();
                format!("{}{}", params, ret)
            }
            "variable_declarator" => node
                .child_by_field_name("type")
                .map(|t| annotation_text(self.text_of(file, t)))
                .or_else(|| {
                    node.child_by_field_name("value")
                        .map(|v| self.text_of(file, v).to_string())
                })
                .unwrap_or_default(),
            "class_declaration" | "abstract_class_declaration" => {
                self.heading_text(file, node, "class")
            }
            "interface_declaration" => self.heading_text(file, node, "interface"),
            "enum_declaration" => self.heading_text(file, node, "enum"),
            "type_alias_declaration" => node
                .child_by_field_name("value")
                .map(|v| self.text_of(file, v).to_string())
                .unwrap_or_default(),
            "module" | "internal_module" => self.heading_text(file, node, "namespace"),
            _ => String::new(),
        }
    }

    fn heading_text(&self, file: usize, node: TSNode<'_>, keyword: &str) -> String {
        node.child_by_field_name("name")
            .map(|n| format!("{} {}", keyword, self.text_of(file, n)))
            .unwrap_or_else(|| keyword.to_string())
    }

    /// Leading comment block of a declaration, with comment markers
    /// stripped. Empty when no comment precedes it.
    pub fn documentation_of(&self, file: usize, node: TSNode<'_>) -> String {
        let mut doc_lines: Vec<String> = Vec::new();
        let mut sibling = node.prev_sibling();
        while let Some(comment) = sibling {
            if comment.kind() != "comment" {
                break;
            }
            doc_lines.push(strip_comment_markers(self.text_of(file, comment)));
            sibling = comment.prev_sibling();
        }
        doc_lines.reverse();
        doc_lines.join("\n")
    }
}

fn annotation_text(raw: &str) -> String {
    raw.trim_start_matches(':').trim().to_string()
}

fn strip_comment_markers(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(block) = trimmed
        .strip_prefix("/**")
        .or_else(|| trimmed.strip_prefix("/*"))
    {
        block
            .strip_suffix("*/")
            .unwrap_or(block)
            .lines()
            .map(|line| line.trim().trim_start_matches('*').trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        trimmed.trim_start_matches("//").trim().to_string()
    }
}

/// Walks the tree for ERROR and MISSING nodes and records one diagnostic
/// per occurrence.
fn collect_syntax_diagnostics(tree: &Tree, file_key: &str, out: &mut Vec<Diagnostic>) {
    let root = tree.root_node();
    if !root.has_error() {
        return;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let at = node.start_position();
            out.push(Diagnostic {
                file: file_key.to_string(),
                message: if node.is_missing() {
                    format!("missing {}", node.kind())
                } else {
                    "syntax error".to_string()
                },
                line: at.row + 1,
                column: at.column,
            });
            continue;
        }
        if node.has_error() {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                stack.push(child);
            }
        }
    }
}
