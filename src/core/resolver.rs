use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};
use tree_sitter::Node as TSNode;

use crate::checker::{DeclKind, Program, SymbolOrigin};
use crate::checker::program::LIB_FILE_KEY;
use crate::core::symbol::{qualified_id, Import, Symbol, SymbolKind};

/// Classifies every identifier occurrence inside a symbol's subtree and
/// emits fully qualified dependency ids for the ones that reference other
/// top-level symbols.
///
/// The walk carries explicit state: a visited-node set plus the local names
/// that shadow outer bindings, split into `local_functions` and
/// `local_variables`. Nothing module-level is mutated.
pub struct DependencyResolver<'p> {
    program: &'p Program,
}

struct WalkState {
    visited: HashSet<usize>,
    local_functions: HashSet<String>,
    local_variables: HashSet<String>,
}

impl<'p> DependencyResolver<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self { program }
    }

    /// Dependencies of `symbol`, whose declaration subtree is `root` in
    /// `file`. `imports` is the owning file's import translation table.
    pub fn collect_dependencies(
        &self,
        file: usize,
        symbol: &Symbol,
        root: TSNode<'p>,
        imports: &IndexMap<String, Import>,
    ) -> BTreeSet<String> {
        let mut state = WalkState {
            visited: HashSet::new(),
            local_functions: HashSet::new(),
            local_variables: HashSet::new(),
        };
        self.collect_local_names(file, root, &mut state);

        let mut dependencies = BTreeSet::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !state.visited.insert(node.id()) {
                continue;
            }
            if self.program.is_identifier(node) {
                if let Some(id) = self.classify(file, symbol, node, imports, &state) {
                    if id != symbol.id {
                        dependencies.insert(id);
                    }
                }
            }
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                stack.push(child);
            }
        }
        dependencies
    }

    /// Gathers the names that shadow outer references anywhere in the
    /// subtree: parameters of every enclosed function-like, identifiers
    /// bound by variable declarators, and inner function declaration names.
    fn collect_local_names(&self, file: usize, root: TSNode<'p>, state: &mut WalkState) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "function_declaration" | "generator_function_declaration" => {
                    // The subtree root's own name is the symbol itself, not
                    // a shadowing local.
                    if node.id() != root.id() {
                        if let Some(name) = node.child_by_field_name("name") {
                            state
                                .local_functions
                                .insert(self.program.text_of(file, name).to_string());
                        }
                    }
                    self.collect_parameter_names(file, node, state);
                }
                "function" | "generator_function" | "arrow_function" | "method_definition" => {
                    self.collect_parameter_names(file, node, state);
                }
                "variable_declarator" => {
                    if let Some(pattern) = node.child_by_field_name("name") {
                        self.collect_pattern_names(file, pattern, &mut state.local_variables);
                    }
                }
                "catch_clause" => {
                    if let Some(param) = node.child_by_field_name("parameter") {
                        self.collect_pattern_names(file, param, &mut state.local_variables);
                    }
                }
                _ => {}
            }
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                stack.push(child);
            }
        }
    }

    fn collect_parameter_names(&self, file: usize, function: TSNode<'p>, state: &mut WalkState) {
        if let Some(single) = function.child_by_field_name("parameter") {
            self.collect_pattern_names(file, single, &mut state.local_variables);
        }
        if let Some(params) = function.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                let pattern = param.child_by_field_name("pattern").unwrap_or(param);
                self.collect_pattern_names(file, pattern, &mut state.local_variables);
            }
        }
    }

    fn collect_pattern_names(&self, file: usize, pattern: TSNode<'p>, out: &mut HashSet<String>) {
        match pattern.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                out.insert(self.program.text_of(file, pattern).to_string());
            }
            "object_pattern" | "array_pattern" | "pair_pattern" | "rest_pattern"
            | "assignment_pattern" => {
                let mut cursor = pattern.walk();
                for child in pattern.named_children(&mut cursor) {
                    self.collect_pattern_names(file, child, out);
                }
            }
            _ => {}
        }
    }

    /// The classification ladder for one identifier occurrence. Returns the
    /// dependency id to emit, or `None` when the occurrence is a member
    /// access, a local, a self-reference, a filtered origin, or a
    /// type-position reference dropped by policy.
    fn classify(
        &self,
        file: usize,
        symbol: &Symbol,
        node: TSNode<'p>,
        imports: &IndexMap<String, Import>,
        state: &WalkState,
    ) -> Option<String> {
        let name = self.program.text_of(file, node);

        // Member accesses reference a property of some value, not a
        // top-level symbol.
        if let Some(parent) = node.parent() {
            if self.program.is_property_access(parent) {
                let is_property = parent
                    .child_by_field_name("property")
                    .map(|p| p.id() == node.id())
                    .unwrap_or(false);
                if is_property {
                    return None;
                }
            }
        }

        let decl = self.program.resolve(file, node)?;

        if self.program.is_parameter(&decl) {
            return None;
        }

        if state.local_functions.contains(name) || state.local_variables.contains(name) {
            return None;
        }

        // Self-references, including recursion through any ancestor chain.
        if let Some(decl_node) = decl.node {
            if decl.file == symbol.declaration_ref.file {
                let (start, end) = (decl_node.start_byte(), decl_node.end_byte());
                let (own_start, own_end) =
                    (symbol.declaration_ref.start, symbol.declaration_ref.end);
                if (start <= own_start && own_end <= end) || (own_start <= start && end <= own_end)
                {
                    return None;
                }
            }
        }

        if self.dropped_by_type_policy(symbol, node, &decl.kind) {
            return None;
        }

        let options = self.program.options();
        match decl.origin {
            SymbolOrigin::System if !options.include_system_symbols => return None,
            SymbolOrigin::ThirdParty if !options.include_node_modules => return None,
            _ => {}
        }

        // Imported names keep the exporting module's identity so edges line
        // up whether or not that file has been extracted yet.
        if let Some(import) = imports.get(name) {
            return Some(qualified_id(
                &import.normalized_module,
                &import.original_name,
            ));
        }

        let file_key = if decl.kind == DeclKind::LibGlobal {
            LIB_FILE_KEY
        } else {
            self.program.file_key(decl.file)
        };
        Some(qualified_id(file_key, name))
    }

    /// Type-position policy: interfaces and type aliases always record the
    /// types they mention (that is where type reachability is traced);
    /// value-level symbols drop references to type-only declarations at type
    /// positions unless `follow_type_only_imports` asks for them.
    fn dropped_by_type_policy(&self, symbol: &Symbol, node: TSNode<'p>, kind: &DeclKind) -> bool {
        let type_like_target = matches!(
            kind,
            DeclKind::Interface | DeclKind::TypeAlias | DeclKind::Class
        );
        if !type_like_target {
            return false;
        }
        if matches!(symbol.kind, SymbolKind::Interface | SymbolKind::TypeAlias) {
            return false;
        }
        if self.program.options().follow_type_only_imports {
            return false;
        }
        self.program.is_type_position(node)
    }
}
