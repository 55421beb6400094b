use std::fmt::Write as _;

use crate::core::{ProjectAnalysisResult, TreeShakingResult};

/// The detailed report rendered as Markdown headings and tables.
pub struct MarkdownReporter;

impl MarkdownReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(
        &self,
        analysis: &ProjectAnalysisResult,
        shake: &TreeShakingResult,
    ) -> String {
        let stats = &shake.statistics;
        let mut out = String::new();

        writeln!(out, "# Tree-Shaking Report\n").unwrap();
        writeln!(out, "| Metric | Value |").unwrap();
        writeln!(out, "|---|---|").unwrap();
        writeln!(out, "| Total symbols | {} |", stats.total_symbols).unwrap();
        writeln!(out, "| Included | {} |", stats.included_count).unwrap();
        writeln!(out, "| Unused | {} |", stats.unused_count).unwrap();
        writeln!(out, "| Removal rate | {:.2}% |", stats.removal_rate).unwrap();

        writeln!(out, "\n## Entry Points\n").unwrap();
        for entry in &shake.entry_points {
            if shake.missing_entry_points.contains(entry) {
                writeln!(out, "- `{}` **(missing)**", entry).unwrap();
            } else {
                writeln!(out, "- `{}`", entry).unwrap();
            }
        }

        writeln!(out, "\n## Included Symbols\n").unwrap();
        self.write_grouped(&mut out, analysis, &shake.included_by_file);

        writeln!(out, "\n## Unused Symbols\n").unwrap();
        self.write_grouped(&mut out, analysis, &shake.unused_by_file);

        out
    }

    fn write_grouped(
        &self,
        out: &mut String,
        analysis: &ProjectAnalysisResult,
        grouped: &std::collections::BTreeMap<String, Vec<String>>,
    ) {
        if grouped.is_empty() {
            writeln!(out, "_(none)_").unwrap();
            return;
        }
        for (file_key, ids) in grouped {
            writeln!(out, "### {}\n", file_key).unwrap();
            writeln!(out, "| Symbol | Kind | Type |").unwrap();
            writeln!(out, "|---|---|---|").unwrap();
            for id in ids {
                match analysis.table.get(id) {
                    Some(symbol) => writeln!(
                        out,
                        "| `{}` | {} | `{}` |",
                        symbol.name,
                        symbol.reported_kind().as_str(),
                        escape_pipes(&symbol.type_text)
                    )
                    .unwrap(),
                    None => writeln!(out, "| `{}` | missing | |", id).unwrap(),
                }
            }
            writeln!(out).unwrap();
        }
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_pipes(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
