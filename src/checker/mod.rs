pub mod program;
pub mod scanner;

pub use program::{
    CompilerOptions, DeclKind, Declaration, Diagnostic, Program, SourceFile, SymbolOrigin,
};
pub use scanner::FileScanner;
