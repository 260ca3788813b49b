//! `parsegen` is the facade over the three-crate pipeline: compile a
//! grammar with `parsegen_core`, assemble it into a portable artifact
//! with `parsegen_bytecode`, then drive that artifact against input
//! with `parsegen_rust_runtime`. Most callers only need this crate.

pub use parsegen_bytecode::{compile_to_artifact, CompiledGrammar};
pub use parsegen_core::error::{GeneratorError, GeneratorResult};
pub use parsegen_core::grammar::ast::{
  AlternativeAst, AssocDirective, FragmentAst, GrammarAst, LexicalProductionAst, PrecedenceBlock, PrecedenceLevel, ProductionAst, SymbolRefAst,
};
pub use parsegen_core::journal::{CompressionLevel, GeneratorConfig, GrammarClass, Journal, PrecedenceOrder};
pub use parsegen_rust_runtime::{DefaultTreeBuilder, Lexer, Parser, ParserState, SemanticActionSet, SyntaxError, Token, TokenStream, TreeNode};

/// Compiles a grammar AST straight to a runtime-ready artifact under
/// the given configuration. Equivalent to constructing a [`Journal`]
/// and calling [`compile_to_artifact`] directly, for callers who don't
/// need the journal's diagnostics afterward.
pub fn compile(ast: &GrammarAst, config: GeneratorConfig) -> GeneratorResult<CompiledGrammar> {
  let mut journal = Journal::new(config);
  compile_to_artifact(ast, &mut journal)
}

/// Parses `input` against a compiled grammar, building the default
/// concrete syntax tree. Returns the tree (if one was produced before
/// the parser got stuck) alongside whatever syntax errors recovery
/// collected along the way.
pub fn parse<'g>(grammar: &'g CompiledGrammar, input: &'g [u8]) -> (Option<TreeNode>, Vec<SyntaxError>) {
  let lexer = Lexer::new(grammar, input);
  let builder = DefaultTreeBuilder::new(grammar);
  let mut parser = Parser::new(grammar, lexer, builder);
  parser.run();
  let errors = parser.errors().to_vec();
  let mut builder = parser.into_actions();
  (builder.take_root(), errors)
}
