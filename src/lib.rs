//! # SHAKEDOWN
//!
//! Whole-project symbol and dependency analysis for TypeScript sources.
//!
//! SHAKEDOWN extracts every top-level named declaration from a set of root
//! files, resolves identifier references against lexical scope, and builds a
//! project-wide directed dependency graph over symbols. The graph answers
//! three queries: forward transitive closure from entry points (tree-shake),
//! reverse transitive closure from a target (impact), and cycle enumeration.
//!
//! ## Pipeline
//!
//! Root files are parsed into a [`checker::Program`], each file is walked by
//! the [`core::SymbolExtractor`], the [`core::ProjectAnalyzer`] merges the
//! per-file records into a [`core::ProjectSymbolTable`], and the
//! [`core::TreeShaker`] and `reporters` answer queries over the finished
//! table.
//!
//! ## Output Formats
//!
//! Text summary, detailed text, JSON, Markdown, Graphviz DOT, and a plain
//! adjacency list. All outputs are deterministic for identical inputs.

pub mod checker;
pub mod core;
pub mod error;
pub mod reporters;

pub use error::AnalysisError;
