use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::core::cancel::CancelToken;
use crate::core::symbol::{FileSymbols, Symbol};
use crate::error::AnalysisError;

/// Project-wide symbol store and dependency graph.
///
/// Symbols live inside their owning [`FileSymbols`] record; `global` is a
/// flat id index pointing back into them. Edges are id sets rather than
/// references, so the graph may cycle and a file can be detached without
/// reference surgery. Every iterable this type exposes is either in file
/// insertion order or sorted id order; nothing observes hash ordering.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProjectSymbolTable {
    files: IndexMap<String, FileSymbols>,
    global: HashMap<String, String>,
    forward_edges: BTreeMap<String, BTreeSet<String>>,
    reverse_edges: BTreeMap<String, BTreeSet<String>>,
}

impl ProjectSymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a per-file record, indexing every symbol under its
    /// `<file_key>:<name>` id and wiring the forward and reverse edges its
    /// dependency sets declare. The check-then-mutate split keeps the table
    /// untouched when any id collides.
    pub fn insert_file(&mut self, file_symbols: FileSymbols) -> Result<(), AnalysisError> {
        for symbol in file_symbols.symbols() {
            if self.global.contains_key(&symbol.id) {
                return Err(AnalysisError::DuplicateSymbol {
                    id: symbol.id.clone(),
                });
            }
        }

        for symbol in file_symbols.symbols() {
            self.global
                .insert(symbol.id.clone(), file_symbols.file_key.clone());
            for dep in &symbol.dependencies {
                if dep == &symbol.id {
                    continue;
                }
                self.forward_edges
                    .entry(symbol.id.clone())
                    .or_default()
                    .insert(dep.clone());
                self.reverse_edges
                    .entry(dep.clone())
                    .or_default()
                    .insert(symbol.id.clone());
            }
        }

        self.files
            .insert(file_symbols.file_key.clone(), file_symbols);
        Ok(())
    }

    /// Deletes every symbol the file owns and detaches all edges incident to
    /// them, in both directions. The file's imports are dropped with it.
    pub fn remove_file(&mut self, file_key: &str) -> Option<FileSymbols> {
        let removed = self.files.shift_remove(file_key)?;

        for symbol in removed.symbols() {
            self.global.remove(&symbol.id);

            if let Some(targets) = self.forward_edges.remove(&symbol.id) {
                for target in targets {
                    if let Some(back) = self.reverse_edges.get_mut(&target) {
                        back.remove(&symbol.id);
                        if back.is_empty() {
                            self.reverse_edges.remove(&target);
                        }
                    }
                }
            }
            if let Some(sources) = self.reverse_edges.remove(&symbol.id) {
                for source in sources {
                    if let Some(out) = self.forward_edges.get_mut(&source) {
                        out.remove(&symbol.id);
                        if out.is_empty() {
                            self.forward_edges.remove(&source);
                        }
                    }
                }
            }
        }

        Some(removed)
    }

    /// Re-wires edges pointing into `file_key` from dependency sets declared
    /// by symbols in other files. Used after a single-file refresh, where
    /// `remove_file` detached incoming edges that the unrefreshed files
    /// still declare.
    pub fn restore_incoming_edges(&mut self, file_key: &str) {
        let mut restored: Vec<(String, String)> = Vec::new();
        for (owner_key, file) in &self.files {
            if owner_key == file_key {
                continue;
            }
            for symbol in file.symbols() {
                for dep in &symbol.dependencies {
                    let (dep_file, _) = crate::core::symbol::split_id(dep);
                    if dep_file == file_key {
                        restored.push((symbol.id.clone(), dep.clone()));
                    }
                }
            }
        }
        for (source, target) in restored {
            self.forward_edges
                .entry(source.clone())
                .or_default()
                .insert(target.clone());
            self.reverse_edges.entry(target).or_default().insert(source);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Symbol> {
        let file_key = self.global.get(id)?;
        let file = self.files.get(file_key)?;
        let (_, name) = crate::core::symbol::split_id(id);
        file.symbol(name)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Symbol> {
        let file_key = self.global.get(id)?.clone();
        let file = self.files.get_mut(&file_key)?;
        let (_, name) = crate::core::symbol::split_id(id);
        file.symbol_mut(name)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.global.contains_key(id)
    }

    /// Symbols in file insertion order, exports before internals per file.
    pub fn all_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.files.values().flat_map(|file| file.symbols())
    }

    /// Every symbol id, sorted.
    pub fn all_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.global.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn all_files(&self) -> impl Iterator<Item = &FileSymbols> {
        self.files.values()
    }

    pub fn file(&self, file_key: &str) -> Option<&FileSymbols> {
        self.files.get(file_key)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.global.len()
    }

    pub fn edge_count(&self) -> usize {
        self.forward_edges.values().map(|set| set.len()).sum()
    }

    /// Ids the symbol depends on. Empty set for unknown ids.
    pub fn dependencies(&self, id: &str) -> BTreeSet<String> {
        self.forward_edges.get(id).cloned().unwrap_or_default()
    }

    /// Ids that depend on the symbol. Empty set for unknown ids.
    pub fn dependents(&self, id: &str) -> BTreeSet<String> {
        self.reverse_edges.get(id).cloned().unwrap_or_default()
    }

    /// Copies each symbol's dependents set out of the reverse-edge index.
    /// The edge maps are already consistent; this materializes the
    /// convenience view on the symbols themselves.
    pub fn populate_dependents(&mut self) {
        let snapshot: Vec<(String, BTreeSet<String>)> = self
            .reverse_edges
            .iter()
            .map(|(id, sources)| (id.clone(), sources.clone()))
            .collect();
        for (id, sources) in snapshot {
            if let Some(symbol) = self.get_mut(&id) {
                symbol.dependents = sources;
            }
        }
    }

    /// Breadth-first forward closure from `roots`. Roots are always members
    /// of the result, including ids that match no symbol (callers report
    /// those as missing). The result is a sorted set.
    pub fn forward_closure(&self, roots: &[String]) -> BTreeSet<String> {
        self.closure(roots, &self.forward_edges)
    }

    /// Breadth-first reverse closure from `targets`, over reverse edges.
    pub fn reverse_closure(&self, targets: &[String]) -> BTreeSet<String> {
        self.closure(targets, &self.reverse_edges)
    }

    fn closure(
        &self,
        roots: &[String],
        edges: &BTreeMap<String, BTreeSet<String>>,
    ) -> BTreeSet<String> {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        for root in roots {
            if seen.insert(root.clone()) {
                queue.push_back(root.clone());
            }
        }
        while let Some(id) = queue.pop_front() {
            if let Some(next) = edges.get(&id) {
                for neighbor in next {
                    if seen.insert(neighbor.clone()) {
                        queue.push_back(neighbor.clone());
                    }
                }
            }
        }
        seen
    }

    /// Enumerates cycles with a grey/black depth-first search started from
    /// every symbol in sorted id order, so output is stable across runs.
    /// A back edge onto a grey node records the slice of the current path
    /// from that node's first occurrence. The same vertex set may appear
    /// more than once under rotation; callers may canonicalize.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        self.find_cycles_with(&CancelToken::new())
            .unwrap_or_default()
    }

    /// Cycle enumeration with a cancellation check between DFS roots.
    pub fn find_cycles_with(
        &self,
        cancel: &CancelToken,
    ) -> Result<Vec<Vec<String>>, AnalysisError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Grey,
            Black,
        }

        let roots = self.all_ids();
        let mut color: HashMap<&str, Color> = roots
            .iter()
            .map(|id| (id.as_str(), Color::White))
            .collect();
        let mut cycles: Vec<Vec<String>> = Vec::new();
        let empty = BTreeSet::new();

        for root in &roots {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            if color.get(root.as_str()).copied() != Some(Color::White) {
                continue;
            }

            // Explicit stack: (node, iterator over its sorted neighbors).
            let mut path: Vec<&str> = Vec::new();
            let mut stack: Vec<(&str, std::collections::btree_set::Iter<String>)> = Vec::new();

            color.insert(root.as_str(), Color::Grey);
            path.push(root.as_str());
            stack.push((
                root.as_str(),
                self.forward_edges.get(root).unwrap_or(&empty).iter(),
            ));

            while !stack.is_empty() {
                let next = stack
                    .last_mut()
                    .map(|(_, neighbors)| neighbors.next())
                    .expect("non-empty stack");
                match next {
                    Some(next) => match color.get(next.as_str()).copied() {
                        Some(Color::Grey) => {
                            let start =
                                path.iter().position(|n| *n == next.as_str()).unwrap_or(0);
                            cycles.push(path[start..].iter().map(|n| n.to_string()).collect());
                        }
                        Some(Color::White) => {
                            color.insert(next.as_str(), Color::Grey);
                            path.push(next.as_str());
                            stack.push((
                                next.as_str(),
                                self.forward_edges
                                    .get(next.as_str())
                                    .unwrap_or(&empty)
                                    .iter(),
                            ));
                        }
                        // Black, or an id with no extracted symbol.
                        _ => {}
                    },
                    None => {
                        if let Some((done, _)) = stack.pop() {
                            color.insert(done, Color::Black);
                            path.pop();
                        }
                    }
                }
            }
        }

        Ok(cycles)
    }

    /// Everything not reached by the live set, as a sorted set.
    pub fn find_unused(&self, live: &BTreeSet<String>) -> BTreeSet<String> {
        self.global
            .keys()
            .filter(|id| !live.contains(*id))
            .cloned()
            .collect()
    }
}
