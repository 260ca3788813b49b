//! Grammar builder: lowers a DSL-produced AST into the symbol
//! table, production list, and lexical spec that the automaton and
//! table builder consume.

pub mod ast;
pub mod builder;
pub mod types;

pub use ast::GrammarAst;
pub use builder::build;
pub use types::{Grammar, Production};
