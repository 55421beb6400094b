use tree_sitter::Node as TSNode;

use crate::checker::Program;
use crate::core::resolver::DependencyResolver;
use crate::core::symbol::{
    normalize_specifier, DeclarationRef, FileSymbols, Import, ImportStyle, ReExport, Symbol,
    SymbolKind,
};
use crate::error::AnalysisError;

/// Per-file symbol extraction.
///
/// Pass 1 walks only the file's top-level statement list, producing one
/// symbol per named declaration and the import translation table. Pass 2
/// walks each symbol's declaration subtree to compute its dependency set.
pub struct SymbolExtractor<'p> {
    program: &'p Program,
}

impl<'p> SymbolExtractor<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self { program }
    }

    pub fn extract(&self, file: usize) -> Result<FileSymbols, AnalysisError> {
        let source = self.program.file(file);
        let file_key = source.file_key.clone();
        let root = source.root();

        let mut record = FileSymbols::new(&file_key);
        // Symbols paired with the subtree pass 2 walks for each.
        let mut pending: Vec<(Symbol, TSNode<'p>)> = Vec::new();
        let mut export_lists: Vec<String> = Vec::new();

        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            self.collect_statement(
                file,
                statement,
                false,
                &mut record,
                &mut pending,
                &mut export_lists,
            );
        }

        // `export { a, b }` without a source marks earlier declarations.
        for name in export_lists {
            if let Some(position) = pending.iter().position(|(s, _)| s.name == name) {
                pending[position].0.is_exported = true;
            }
        }

        let resolver = DependencyResolver::new(self.program);
        for (mut symbol, subtree) in pending {
            symbol.dependencies =
                resolver.collect_dependencies(file, &symbol, subtree, &record.imports);
            record.add_symbol(symbol);
        }

        Ok(record)
    }

    fn collect_statement(
        &self,
        file: usize,
        statement: TSNode<'p>,
        exported: bool,
        record: &mut FileSymbols,
        pending: &mut Vec<(Symbol, TSNode<'p>)>,
        export_lists: &mut Vec<String>,
    ) {
        match statement.kind() {
            "export_statement" => {
                self.collect_export(file, statement, record, pending, export_lists)
            }
            "import_statement" => self.collect_import(file, statement, record),
            "function_declaration" | "generator_function_declaration" => {
                self.push_named(file, statement, SymbolKind::Function, exported, record, pending)
            }
            "class_declaration" | "abstract_class_declaration" => {
                self.push_named(file, statement, SymbolKind::Class, exported, record, pending)
            }
            "interface_declaration" => {
                self.push_named(file, statement, SymbolKind::Interface, exported, record, pending)
            }
            "type_alias_declaration" => {
                self.push_named(file, statement, SymbolKind::TypeAlias, exported, record, pending)
            }
            "enum_declaration" => {
                self.push_named(file, statement, SymbolKind::Enum, exported, record, pending)
            }
            "module" | "internal_module" => self.push_named(
                file,
                statement,
                SymbolKind::ModuleBlock,
                exported,
                record,
                pending,
            ),
            "expression_statement" => {
                // `namespace N {}` arrives wrapped in an expression statement.
                if let Some(inner) = statement.named_child(0) {
                    if inner.kind() == "internal_module" {
                        self.push_named(
                            file,
                            inner,
                            SymbolKind::ModuleBlock,
                            exported,
                            record,
                            pending,
                        );
                    }
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                self.collect_variables(file, statement, exported, pending)
            }
            _ => {}
        }
    }

    fn collect_export(
        &self,
        file: usize,
        statement: TSNode<'p>,
        record: &mut FileSymbols,
        pending: &mut Vec<(Symbol, TSNode<'p>)>,
        export_lists: &mut Vec<String>,
    ) {
        if let Some(declaration) = statement.child_by_field_name("declaration") {
            self.collect_statement(file, declaration, true, record, pending, export_lists);
            return;
        }

        let source = self.program.import_specifier_text(file, statement);
        let mut cursor = statement.walk();
        let mut saw_clause = false;
        for child in statement.named_children(&mut cursor) {
            if child.kind() != "export_clause" {
                continue;
            }
            saw_clause = true;
            let mut clause_cursor = child.walk();
            for spec in child.named_children(&mut clause_cursor) {
                if spec.kind() != "export_specifier" {
                    continue;
                }
                let original = spec
                    .child_by_field_name("name")
                    .map(|n| self.program.text_of(file, n).to_string())
                    .unwrap_or_default();
                let exported_name = spec
                    .child_by_field_name("alias")
                    .map(|n| self.program.text_of(file, n).to_string())
                    .unwrap_or_else(|| original.clone());
                match &source {
                    // Re-export: recorded, produces no symbol.
                    Some(module) => record.reexports.push(ReExport {
                        exported_name,
                        original_name: original,
                        from_module: module.clone(),
                        normalized_module: normalize_specifier(
                            module,
                            &self.program.file(file).path,
                        ),
                    }),
                    None => export_lists.push(original),
                }
            }
        }

        // `export default <literal>` has no identifier to bind.
        if !saw_clause && statement.child_by_field_name("value").is_some() {
            record
                .warnings
                .push("anonymous default export skipped".to_string());
        }
    }

    fn collect_import(&self, file: usize, statement: TSNode<'p>, record: &mut FileSymbols) {
        let Some(module) = self.program.import_specifier_text(file, statement) else {
            return;
        };
        let normalized = normalize_specifier(&module, &self.program.file(file).path);

        let mut cursor = statement.walk();
        for child in statement.named_children(&mut cursor) {
            if child.kind() != "import_clause" {
                continue;
            }
            let mut clause_cursor = child.walk();
            for binding in child.named_children(&mut clause_cursor) {
                match binding.kind() {
                    "identifier" => record.add_import(Import {
                        local_name: self.program.text_of(file, binding).to_string(),
                        from_module: module.clone(),
                        normalized_module: normalized.clone(),
                        style: ImportStyle::Default,
                        original_name: "default".to_string(),
                    }),
                    "namespace_import" => {
                        let mut ns_cursor = binding.walk();
                        for ns_name in binding.named_children(&mut ns_cursor) {
                            if ns_name.kind() == "identifier" {
                                record.add_import(Import {
                                    local_name: self.program.text_of(file, ns_name).to_string(),
                                    from_module: module.clone(),
                                    normalized_module: normalized.clone(),
                                    style: ImportStyle::Namespace,
                                    original_name: "*".to_string(),
                                });
                            }
                        }
                    }
                    "named_imports" => {
                        let mut named_cursor = binding.walk();
                        for spec in binding.named_children(&mut named_cursor) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            let Some(name_node) = spec.child_by_field_name("name") else {
                                continue;
                            };
                            let original = self.program.text_of(file, name_node).to_string();
                            let local = spec
                                .child_by_field_name("alias")
                                .map(|a| self.program.text_of(file, a).to_string())
                                .unwrap_or_else(|| original.clone());
                            record.add_import(Import {
                                local_name: local,
                                from_module: module.clone(),
                                normalized_module: normalized.clone(),
                                style: ImportStyle::Named,
                                original_name: original,
                            });
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// Declarations that carry their name in a `name` field: functions,
    /// classes, interfaces, aliases, enums, namespaces.
    fn push_named(
        &self,
        file: usize,
        node: TSNode<'p>,
        kind: SymbolKind,
        exported: bool,
        record: &mut FileSymbols,
        pending: &mut Vec<(Symbol, TSNode<'p>)>,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            record.warnings.push(format!(
                "unnamed {} at line {} skipped",
                node.kind(),
                node.start_position().row + 1
            ));
            return;
        };
        let name = self.program.string_value(file, name_node);
        if name.is_empty() {
            record.warnings.push(format!(
                "unresolvable {} at line {} skipped",
                node.kind(),
                node.start_position().row + 1
            ));
            return;
        }

        let file_key = &self.program.file(file).file_key;
        let symbol = Symbol::new(
            &name,
            file_key,
            kind,
            declaration_ref(file, node),
            self.program.location_of(node),
        )
        .exported(exported)
        .with_type_text(self.program.type_to_string(file, node))
        .with_documentation(self.program.documentation_of(file, statement_of(node)));

        pending.push((symbol, node));
    }

    /// One symbol per declared identifier. A declarator whose initializer is
    /// a function or arrow literal attaches the literal as its declaration,
    /// so the dependency walk sees the parameter list and body directly.
    fn collect_variables(
        &self,
        file: usize,
        statement: TSNode<'p>,
        exported: bool,
        pending: &mut Vec<(Symbol, TSNode<'p>)>,
    ) {
        let kind = match statement.child(0).map(|t| t.kind()) {
            Some("let") => SymbolKind::Let,
            Some("var") => SymbolKind::Var,
            _ => SymbolKind::Const,
        };

        let mut cursor = statement.walk();
        for declarator in statement.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name_node) = declarator.child_by_field_name("name") else {
                continue;
            };
            if name_node.kind() != "identifier" {
                // Destructuring at the top level declares several names with
                // no per-name subtree; each identifier becomes a symbol over
                // the whole declarator.
                let mut names = std::collections::HashSet::new();
                self.collect_binding_identifiers(file, name_node, &mut names);
                let mut sorted: Vec<String> = names.into_iter().collect();
                sorted.sort();
                for name in sorted {
                    self.push_variable(file, &name, kind, declarator, declarator, exported, pending);
                }
                continue;
            }

            let name = self.program.text_of(file, name_node).to_string();
            let value = declarator.child_by_field_name("value");
            let is_function_literal = value
                .map(|v| matches!(v.kind(), "arrow_function" | "function" | "generator_function"))
                .unwrap_or(false);
            let subtree = if is_function_literal {
                value.unwrap_or(declarator)
            } else {
                declarator
            };
            self.push_variable(file, &name, kind, declarator, subtree, exported, pending);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push_variable(
        &self,
        file: usize,
        name: &str,
        kind: SymbolKind,
        declarator: TSNode<'p>,
        subtree: TSNode<'p>,
        exported: bool,
        pending: &mut Vec<(Symbol, TSNode<'p>)>,
    ) {
        let file_key = &self.program.file(file).file_key;
        let function_initializer = subtree.id() != declarator.id();
        let symbol = Symbol::new(
            name,
            file_key,
            kind,
            declaration_ref(file, subtree),
            self.program.location_of(declarator),
        )
        .exported(exported)
        .with_function_initializer(function_initializer)
        .with_type_text(self.program.type_to_string(file, declarator))
        .with_documentation(self.program.documentation_of(
            file,
            statement_of(declarator),
        ));

        pending.push((symbol, subtree));
    }

    fn collect_binding_identifiers(
        &self,
        file: usize,
        pattern: TSNode<'p>,
        out: &mut std::collections::HashSet<String>,
    ) {
        match pattern.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                out.insert(self.program.text_of(file, pattern).to_string());
            }
            _ => {
                let mut cursor = pattern.walk();
                for child in pattern.named_children(&mut cursor) {
                    self.collect_binding_identifiers(file, child, out);
                }
            }
        }
    }
}

fn declaration_ref(file: usize, node: TSNode<'_>) -> DeclarationRef {
    DeclarationRef {
        file,
        node_id: node.id(),
        start: node.start_byte(),
        end: node.end_byte(),
    }
}

/// The enclosing top-level statement, where leading doc comments attach.
fn statement_of(node: TSNode<'_>) -> TSNode<'_> {
    let mut current = node;
    while let Some(parent) = current.parent() {
        if parent.kind() == "program" {
            return current;
        }
        current = parent;
    }
    node
}
