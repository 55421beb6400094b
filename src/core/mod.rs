pub mod analyzer;
pub mod cancel;
pub mod extractor;
pub mod resolver;
pub mod shaker;
pub mod symbol;
pub mod table;

pub use analyzer::{ProjectAnalysisResult, ProjectAnalyzer, ProjectStatistics};
pub use cancel::CancelToken;
pub use extractor::SymbolExtractor;
pub use resolver::DependencyResolver;
pub use shaker::{TreeShaker, TreeShakingResult, TreeShakingStatistics};
pub use symbol::{
    qualified_id, split_id, DeclarationRef, FileSymbols, Import, ImportStyle, ReExport,
    SourceLocation, Symbol, SymbolKind,
};
pub use table::ProjectSymbolTable;
