use std::fmt::Write as _;

use crate::core::{ProjectAnalysisResult, TreeShakingResult};

/// Plain-text reports: a short summary and a per-file detailed listing.
pub struct TextReporter {
    show_warnings: bool,
}

impl TextReporter {
    pub fn new() -> Self {
        Self {
            show_warnings: false,
        }
    }

    /// Include per-file extraction warnings (strict-mode surface).
    pub fn with_warnings(mut self, show_warnings: bool) -> Self {
        self.show_warnings = show_warnings;
        self
    }

    pub fn summary(&self, shake: &TreeShakingResult) -> String {
        let stats = &shake.statistics;
        let mut out = String::new();
        writeln!(out, "Tree-shaking summary").unwrap();
        writeln!(out, "  total symbols:    {}", stats.total_symbols).unwrap();
        writeln!(out, "  included:         {}", stats.included_count).unwrap();
        writeln!(out, "  unused:           {}", stats.unused_count).unwrap();
        writeln!(out, "  removal rate:     {:.2}%", stats.removal_rate).unwrap();
        out
    }

    pub fn detailed(
        &self,
        analysis: &ProjectAnalysisResult,
        shake: &TreeShakingResult,
    ) -> String {
        let mut out = self.summary(shake);

        writeln!(out, "\nEntry points").unwrap();
        for entry in &shake.entry_points {
            if shake.missing_entry_points.contains(entry) {
                writeln!(out, "  {} (missing)", entry).unwrap();
            } else {
                writeln!(out, "  {}", entry).unwrap();
            }
        }

        writeln!(out, "\nIncluded symbols").unwrap();
        self.write_grouped(&mut out, analysis, &shake.included_by_file);

        writeln!(out, "\nUnused symbols").unwrap();
        self.write_grouped(&mut out, analysis, &shake.unused_by_file);

        if self.show_warnings {
            let mut wrote_header = false;
            for file in analysis.table.all_files() {
                for warning in &file.warnings {
                    if !wrote_header {
                        writeln!(out, "\nWarnings").unwrap();
                        wrote_header = true;
                    }
                    writeln!(out, "  {}: {}", file.file_key, warning).unwrap();
                }
            }
        }

        out
    }

    fn write_grouped(
        &self,
        out: &mut String,
        analysis: &ProjectAnalysisResult,
        grouped: &std::collections::BTreeMap<String, Vec<String>>,
    ) {
        if grouped.is_empty() {
            writeln!(out, "  (none)").unwrap();
            return;
        }
        for (file_key, ids) in grouped {
            writeln!(out, "  {}:", file_key).unwrap();
            for id in ids {
                match analysis.table.get(id) {
                    Some(symbol) if !symbol.type_text.is_empty() => {
                        writeln!(
                            out,
                            "    {} [{}] {}",
                            symbol.name,
                            symbol.reported_kind().as_str(),
                            symbol.type_text
                        )
                        .unwrap();
                    }
                    Some(symbol) => {
                        writeln!(out, "    {} [{}]", symbol.name, symbol.reported_kind().as_str())
                            .unwrap();
                    }
                    None => {
                        writeln!(out, "    {} (missing)", id).unwrap();
                    }
                }
            }
        }
    }
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}
