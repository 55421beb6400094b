use serde::{Deserialize, Serialize};

use crate::core::ProjectSymbolTable;
use crate::error::AnalysisError;

/// Who is affected when a symbol changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub target: String,
    pub direct_dependents: Vec<String>,
    pub all_dependents: Vec<String>,
    pub count: usize,
}

/// Cycle enumeration with duplicates collapsed: each cycle is rotated so
/// its smallest id leads, then identical rotations are deduplicated.
pub fn find_circular_dependencies(table: &ProjectSymbolTable) -> Vec<Vec<String>> {
    let mut canonical: Vec<Vec<String>> = table
        .find_cycles()
        .into_iter()
        .map(rotate_to_smallest)
        .collect();
    canonical.sort();
    canonical.dedup();
    canonical
}

/// Reverse transitive closure from one symbol: its direct dependents and
/// everything that transitively reaches it.
pub fn impact_analysis(
    table: &ProjectSymbolTable,
    id: &str,
) -> Result<ImpactAnalysis, AnalysisError> {
    if !table.contains(id) {
        return Err(AnalysisError::MissingEntryPoint { id: id.to_string() });
    }

    let direct_dependents: Vec<String> = table.dependents(id).into_iter().collect();
    let all_dependents: Vec<String> = table
        .reverse_closure(&[id.to_string()])
        .into_iter()
        .filter(|dependent| dependent != id)
        .collect();
    let count = all_dependents.len();

    Ok(ImpactAnalysis {
        target: id.to_string(),
        direct_dependents,
        all_dependents,
        count,
    })
}

/// Top-k symbols ranked by how many dependencies they declare, ties broken
/// by id.
pub fn find_largest_symbols(table: &ProjectSymbolTable, k: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = table
        .all_ids()
        .into_iter()
        .map(|id| {
            let degree = table.dependencies(&id).len();
            (id, degree)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(k);
    ranked
}

fn rotate_to_smallest(cycle: Vec<String>) -> Vec<String> {
    if cycle.is_empty() {
        return cycle;
    }
    let pivot = cycle
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(index, _)| index)
        .unwrap_or(0);
    let mut rotated = Vec::with_capacity(cycle.len());
    rotated.extend_from_slice(&cycle[pivot..]);
    rotated.extend_from_slice(&cycle[..pivot]);
    rotated
}
