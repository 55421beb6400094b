use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::checker::{CompilerOptions, Diagnostic, Program};
use crate::core::cancel::CancelToken;
use crate::core::extractor::SymbolExtractor;
use crate::core::table::ProjectSymbolTable;
use crate::error::AnalysisError;

/// Aggregate counts over a finished analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectStatistics {
    pub total_files: usize,
    pub total_symbols: usize,
    pub exported_symbols: usize,
    pub internal_symbols: usize,
    pub total_imports: usize,
    pub total_edges: usize,
    pub symbols_per_file: BTreeMap<String, usize>,
}

/// Everything an analysis run produces: the populated table, the inputs it
/// was run over, frontend diagnostics, and summary statistics.
#[derive(Debug, Serialize)]
pub struct ProjectAnalysisResult {
    #[serde(skip)]
    pub table: ProjectSymbolTable,
    pub root_files: Vec<PathBuf>,
    pub options: CompilerOptions,
    pub diagnostics: Vec<Diagnostic>,
    pub statistics: ProjectStatistics,
}

/// Drives extraction over every root file and assembles the project graph.
///
/// Files that fail extraction are dropped and reported; the table is only
/// ever mutated in whole-file units, so a failure mid-run leaves no partial
/// file behind.
pub struct ProjectAnalyzer {
    cancel: CancelToken,
}

impl ProjectAnalyzer {
    pub fn new() -> Self {
        Self {
            cancel: CancelToken::new(),
        }
    }

    /// Installs a shared cancellation token, checked between files.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn analyze(&self, program: &Program) -> Result<ProjectAnalysisResult, AnalysisError> {
        let mut diagnostics: Vec<Diagnostic> = program.diagnostics().to_vec();
        if program.options().strict && !diagnostics.is_empty() {
            return Err(AnalysisError::HasDiagnostics {
                count: diagnostics.len(),
            });
        }

        let mut table = ProjectSymbolTable::new();
        let extractor = SymbolExtractor::new(program);

        for index in 0..program.file_count() {
            if self.cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            let source = program.file(index);
            if source.is_declaration_file() {
                continue;
            }
            match extractor.extract(index) {
                Ok(file_symbols) => table.insert_file(file_symbols)?,
                Err(AnalysisError::CheckerError { file, message }) => {
                    eprintln!("Warning: skipping {}: {}", file, message);
                    diagnostics.push(Diagnostic {
                        file,
                        message,
                        line: 0,
                        column: 0,
                    });
                }
                Err(other) => return Err(other),
            }
        }

        table.populate_dependents();
        let statistics = Self::statistics(&table);

        Ok(ProjectAnalysisResult {
            table,
            root_files: program.files().map(|f| f.path.clone()).collect(),
            options: *program.options(),
            diagnostics,
            statistics,
        })
    }

    /// Atomic per-file refresh: the file's prior symbols and every edge
    /// incident to them are removed, the file is re-extracted and
    /// reinserted, and edges declared by other files into this one are
    /// restored.
    pub fn refresh_file(
        &self,
        program: &Program,
        result: &mut ProjectAnalysisResult,
        file_key: &str,
    ) -> Result<(), AnalysisError> {
        let index = program
            .files()
            .position(|f| f.file_key == file_key)
            .ok_or_else(|| AnalysisError::InvalidInput {
                reason: format!("no root file with key '{}'", file_key),
            })?;

        result.table.remove_file(file_key);
        let extractor = SymbolExtractor::new(program);
        let file_symbols = extractor.extract(index)?;
        result.table.insert_file(file_symbols)?;
        result.table.restore_incoming_edges(file_key);
        result.table.populate_dependents();
        result.statistics = Self::statistics(&result.table);
        Ok(())
    }

    fn statistics(table: &ProjectSymbolTable) -> ProjectStatistics {
        let mut stats = ProjectStatistics {
            total_files: table.file_count(),
            total_symbols: table.symbol_count(),
            total_edges: table.edge_count(),
            ..Default::default()
        };
        for file in table.all_files() {
            stats.exported_symbols += file.exports.len();
            stats.internal_symbols += file.internal.len();
            stats.total_imports += file.imports.len();
            stats
                .symbols_per_file
                .insert(file.file_key.clone(), file.symbol_count());
        }
        stats
    }
}

impl Default for ProjectAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
