//! `parsegen_bytecode` owns the serializable compiled-grammar artifact
//! and the table-compression routines shared by the lexical DFA
//! bundle and the ACTION/GOTO tables. It depends on `parsegen_core` for
//! the grammar/table types it compresses, and is in turn the only thing
//! `parsegen_rust_runtime` depends on — the runtime never sees a
//! `Grammar` or `ParsingTable` directly, only the compiled artifact.

pub mod artifact;
pub mod build;
pub mod compress;

pub use artifact::{CompiledGrammar, CompiledLexicon, CompiledNonTerminal, CompiledProduction, CompiledTerminal, ModeDfa};
pub use build::compile_to_artifact;
pub use compress::{CompressedMatrix, DenseMatrix};
