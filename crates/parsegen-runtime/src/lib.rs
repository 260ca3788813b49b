//! `parsegen_rust_runtime` drives a compiled [`parsegen_bytecode::CompiledGrammar`]
//! against raw input: the lexer, the table-driven parser with LAC
//! and panic-mode recovery, and the default tree builder. It
//! depends only on `parsegen_bytecode` — never on `parsegen_core` — so
//! a consuming binary can embed a pre-compiled artifact without pulling
//! in the grammar analysis pipeline at all.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod tree;

pub use error::SyntaxError;
pub use lexer::{Lexer, ModeStep};
pub use parser::{Parser, ParserState};
pub use token::{Position, Token, TokenStream};
pub use tree::{DefaultTreeBuilder, SemanticActionSet, TreeNode};
