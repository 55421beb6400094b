use thiserror::Error;

/// Failure taxonomy for project analysis.
///
/// Errors that make a single file's symbols unreliable are recoverable: the
/// analyzer drops the file, records a diagnostic, and continues. Errors that
/// would leave the graph inconsistent abort the whole operation.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The root-files list was empty or named a file that does not exist.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The parsing frontend failed on one file. Recoverable per file.
    #[error("checker failed on {file}: {message}")]
    CheckerError { file: String, message: String },

    /// `insert_file` was called while a symbol id already exists. Callers
    /// must remove a file before reinserting it.
    #[error("duplicate symbol id '{id}'")]
    DuplicateSymbol { id: String },

    /// An entry-point id matched no symbol. Non-fatal; recorded on results
    /// so reports can flag it.
    #[error("entry point '{id}' does not match any symbol")]
    MissingEntryPoint { id: String },

    /// Strict mode was requested and the frontend reported diagnostics.
    #[error("analysis aborted: {count} compiler diagnostic(s) in strict mode")]
    HasDiagnostics { count: usize },

    /// A cooperative cancellation signal tripped mid-operation.
    #[error("operation cancelled")]
    Cancelled,
}
