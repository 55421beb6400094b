use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::analyzer::ProjectAnalysisResult;
use crate::core::symbol::split_id;

/// Counts for one tree-shaking run. `removal_rate` is the percentage of
/// symbols outside the live set, rounded to two decimals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeShakingStatistics {
    pub total_symbols: usize,
    pub included_count: usize,
    pub unused_count: usize,
    pub removal_rate: f64,
}

/// The live set and its complement, grouped for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeShakingResult {
    pub entry_points: Vec<String>,
    /// Entry ids that matched no symbol. They stay in the closure so
    /// reports can flag them; they never fail the operation.
    pub missing_entry_points: Vec<String>,
    pub included: BTreeSet<String>,
    pub unused: BTreeSet<String>,
    pub included_by_file: BTreeMap<String, Vec<String>>,
    pub unused_by_file: BTreeMap<String, Vec<String>>,
    pub statistics: TreeShakingStatistics,
}

/// Computes the forward closure from declared entry points and everything
/// that falls outside it.
pub struct TreeShaker;

impl TreeShaker {
    pub fn new() -> Self {
        Self
    }

    pub fn shake(
        &self,
        analysis: &ProjectAnalysisResult,
        entry_points: &[String],
    ) -> TreeShakingResult {
        let table = &analysis.table;

        let missing_entry_points: Vec<String> = entry_points
            .iter()
            .filter(|id| !table.contains(id))
            .cloned()
            .collect();

        let included = table.forward_closure(entry_points);
        let unused = table.find_unused(&included);

        let total_symbols = table.symbol_count();
        let unused_count = unused.len();
        let included_count = total_symbols - unused_count;
        let removal_rate = if total_symbols == 0 {
            0.0
        } else {
            round2(100.0 * unused_count as f64 / total_symbols as f64)
        };

        TreeShakingResult {
            entry_points: entry_points.to_vec(),
            missing_entry_points,
            included_by_file: group_by_file(&included),
            unused_by_file: group_by_file(&unused),
            included,
            unused,
            statistics: TreeShakingStatistics {
                total_symbols,
                included_count,
                unused_count,
                removal_rate,
            },
        }
    }
}

impl Default for TreeShaker {
    fn default() -> Self {
        Self::new()
    }
}

fn group_by_file(ids: &BTreeSet<String>) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for id in ids {
        let (file_key, _) = split_id(id);
        grouped.entry(file_key.to_string()).or_default().push(id.clone());
    }
    grouped
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
