//! `parsegen_core` compiles a lowered grammar and lexical spec into an
//! LR parsing table and a set of per-mode lexical DFAs. It has no
//! dependency on the runtime that consumes its output (`parsegen_bytecode`
//! and `parsegen_rust_runtime` own the serialized artifact and the
//! driver loop, respectively) and no dependency on any textual front
//! end — grammars are built from [`grammar::GrammarAst`] values that an
//! external DSL parser (or a caller constructing them directly) supplies.

pub mod automaton;
pub mod error;
pub mod grammar;
pub mod journal;
pub mod lexspec;
pub mod regex;
pub mod symbol;
pub mod table;

pub use automaton::{build_automaton, Automaton};
pub use error::{GeneratorError, GeneratorResult};
pub use grammar::{Grammar, GrammarAst};
pub use journal::{GeneratorConfig, GrammarClass, Journal};
pub use table::{build_table, ParsingTable};

/// Runs the full compile pipeline (grammar lowering, automaton
/// construction, table building) over an already lowered grammar AST,
/// returning the parsing table alongside the grammar it was built from.
pub fn compile_grammar(ast: &GrammarAst, journal: &mut Journal) -> GeneratorResult<(Grammar, ParsingTable)> {
  let props = regex::unicode::BuiltinProperties;
  let grammar = grammar::build(ast, journal, &props)?;
  let class = journal.config().class;
  let automaton = automaton::build_automaton(&grammar, class);
  let table = table::build_table(&grammar, &automaton, journal)?;
  Ok((grammar, table))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::ast::*;

  #[test]
  fn compiles_a_minimal_grammar_end_to_end() {
    let ast = GrammarAst {
      name: "g".into(),
      start: Some("s".into()),
      precedence_blocks: vec![],
      productions: vec![ProductionAst {
        lhs: "s".into(),
        alternatives: vec![AlternativeAst { symbols: vec![SymbolRefAst::terminal("a")], ..Default::default() }],
      }],
      lexical_productions: vec![LexicalProductionAst { name: "a".into(), pattern_src: "a".into(), ..Default::default() }],
      fragments: vec![],
    };
    let mut journal = Journal::new(GeneratorConfig::new());
    let (grammar, table) = compile_grammar(&ast, &mut journal).unwrap();
    assert!(table.num_states > 0);
    assert_eq!(grammar.productions[0].lhs, grammar.augmented_start);
  }
}
