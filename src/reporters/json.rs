use anyhow::Result;
use serde_json::json;
use std::fs;
use std::path::Path;

use crate::core::{ProjectAnalysisResult, TreeShakingResult};

/// Machine-readable report. Field names are stable; the format only ever
/// grows. Keys: `timestamp`, `entry_points`, `statistics`,
/// `includedSymbols`, `unusedSymbols`, `fileAnalysis`.
pub struct JsonReporter {
    timestamp: Option<String>,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self { timestamp: None }
    }

    /// Pins the report timestamp. Without it each report stamps the current
    /// UTC time; pinning makes two runs over identical input byte-identical.
    pub fn with_timestamp(mut self, timestamp: String) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn format_to_file(
        &self,
        analysis: &ProjectAnalysisResult,
        shake: &TreeShakingResult,
        output_path: &Path,
    ) -> Result<()> {
        fs::write(output_path, self.format(analysis, shake)?)?;
        Ok(())
    }

    pub fn format(
        &self,
        analysis: &ProjectAnalysisResult,
        shake: &TreeShakingResult,
    ) -> Result<String> {
        let timestamp = self
            .timestamp
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

        let included: Vec<&String> = shake.included.iter().collect();
        let unused: Vec<&String> = shake.unused.iter().collect();

        let mut file_analysis = serde_json::Map::new();
        for file in analysis.table.all_files() {
            let total = file.symbol_count();
            let included_here = shake
                .included_by_file
                .get(&file.file_key)
                .map(|ids| ids.len())
                .unwrap_or(0);
            let unused_here = shake
                .unused_by_file
                .get(&file.file_key)
                .map(|ids| ids.len())
                .unwrap_or(0);
            let removal_rate = if total == 0 {
                0.0
            } else {
                (100.0 * unused_here as f64 / total as f64 * 100.0).round() / 100.0
            };
            file_analysis.insert(
                file.file_key.clone(),
                json!({
                    "totalSymbols": total,
                    "includedSymbols": included_here,
                    "unusedSymbols": unused_here,
                    "removalRate": removal_rate,
                }),
            );
        }

        let report = json!({
            "timestamp": timestamp,
            "entry_points": shake.entry_points,
            "statistics": {
                "totalSymbols": shake.statistics.total_symbols,
                "includedSymbols": shake.statistics.included_count,
                "unusedSymbols": shake.statistics.unused_count,
                "removalRate": shake.statistics.removal_rate,
            },
            "includedSymbols": included,
            "unusedSymbols": unused,
            "fileAnalysis": file_analysis,
        });

        Ok(serde_json::to_string_pretty(&report)?)
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}
