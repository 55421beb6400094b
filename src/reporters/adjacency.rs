use std::fmt::Write as _;

use crate::core::{ProjectAnalysisResult, TreeShakingResult};

/// Plain adjacency list over every symbol in the result, sorted by local
/// name. Each symbol is followed by its sorted dependencies, or `(none)`.
pub struct AdjacencyReporter {
    with_locations: bool,
}

impl AdjacencyReporter {
    pub fn new() -> Self {
        Self {
            with_locations: false,
        }
    }

    /// Append `file:line` to each symbol heading.
    pub fn with_locations(mut self, with_locations: bool) -> Self {
        self.with_locations = with_locations;
        self
    }

    pub fn format(
        &self,
        analysis: &ProjectAnalysisResult,
        shake: &TreeShakingResult,
    ) -> String {
        let mut ids: Vec<&String> = shake.included.iter().chain(shake.unused.iter()).collect();
        // Sorted by local name, ties broken by the full id.
        ids.sort_by(|a, b| {
            let (_, name_a) = crate::core::split_id(a);
            let (_, name_b) = crate::core::split_id(b);
            name_a.cmp(name_b).then_with(|| a.cmp(b))
        });

        let mut out = String::new();
        for id in ids {
            match analysis.table.get(id) {
                Some(symbol) if self.with_locations => {
                    writeln!(
                        out,
                        "{} ({}:{})",
                        symbol.name, symbol.file_key, symbol.location.line
                    )
                    .unwrap();
                }
                Some(symbol) => writeln!(out, "{}", symbol.name).unwrap(),
                None => {
                    let (_, name) = crate::core::split_id(id);
                    writeln!(out, "{} (missing)", name).unwrap();
                }
            }

            let deps = analysis.table.dependencies(id);
            if deps.is_empty() {
                writeln!(out, "  (none)").unwrap();
            } else {
                for dep in deps {
                    writeln!(out, "  {}", dep).unwrap();
                }
            }
        }
        out
    }
}

impl Default for AdjacencyReporter {
    fn default() -> Self {
        Self::new()
    }
}
