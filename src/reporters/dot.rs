use std::fmt::Write as _;

use crate::core::{ProjectAnalysisResult, TreeShakingResult};

const DEFAULT_MAX_NODES: usize = 100;

/// Graphviz rendering of the dependency graph. Included symbols are
/// lightgreen, unused lightcoral; edges are only drawn when both ends made
/// it into the displayed subset.
pub struct DotReporter {
    max_nodes: usize,
    included_only: bool,
}

impl DotReporter {
    pub fn new() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
            included_only: false,
        }
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_included_only(mut self, included_only: bool) -> Self {
        self.included_only = included_only;
        self
    }

    pub fn format(
        &self,
        analysis: &ProjectAnalysisResult,
        shake: &TreeShakingResult,
    ) -> String {
        let mut displayed: Vec<(&String, bool)> = Vec::new();
        for id in &shake.included {
            displayed.push((id, true));
        }
        if !self.included_only {
            for id in &shake.unused {
                displayed.push((id, false));
            }
        }
        displayed.truncate(self.max_nodes);

        let mut out = String::new();
        writeln!(out, "digraph Dependencies {{").unwrap();
        writeln!(out, "  rankdir=LR;").unwrap();
        writeln!(out, "  node [shape=box, style=filled];").unwrap();

        for (id, included) in &displayed {
            let label = analysis
                .table
                .get(id)
                .map(|symbol| symbol.name.clone())
                .unwrap_or_else(|| {
                    let (_, name) = crate::core::split_id(id);
                    name.to_string()
                });
            let fill = if *included { "lightgreen" } else { "lightcoral" };
            writeln!(
                out,
                "  \"{}\" [label=\"{}\", fillcolor={}];",
                escape(id),
                escape(&label),
                fill
            )
            .unwrap();
        }

        for (id, _) in &displayed {
            for dep in analysis.table.dependencies(id) {
                if displayed.iter().any(|(other, _)| *other == &dep) {
                    writeln!(out, "  \"{}\" -> \"{}\";", escape(id), escape(&dep)).unwrap();
                }
            }
        }

        writeln!(out, "}}").unwrap();
        out
    }
}

impl Default for DotReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// The only escaping DOT needs here: literal quotes inside labels.
fn escape(text: &str) -> String {
    text.replace('"', "\\\"")
}
