//! Assembles a [`CompiledGrammar`] from a lowered `Grammar` and its
//! `ParsingTable`, applying the configured compression level to both
//! the ACTION/GOTO arrays' underlying DFA matrices and the lexical
//! spec's per-mode DFAs.

use crate::artifact::{CompiledGrammar, CompiledLexicon, CompiledNonTerminal, CompiledProduction, CompiledTerminal, ModeDfa};
use crate::compress::{deduplicate_rows, displace_rows, CompressedMatrix, DenseMatrix};
use parsegen_core::error::GeneratorResult;
use parsegen_core::journal::{CompressionLevel, Journal};
use parsegen_core::regex::dfa::Dfa;
use parsegen_core::regex::unicode::BuiltinProperties;
use parsegen_core::symbol::SymbolKind;
use parsegen_core::table::ParsingTable;
use parsegen_core::{compile_grammar, Grammar, GrammarAst};

pub fn compile_to_artifact(ast: &GrammarAst, journal: &mut Journal) -> GeneratorResult<CompiledGrammar> {
  let (grammar, table) = compile_grammar(ast, journal)?;
  let level = journal.config().compression;
  let class = journal.config().class;
  Ok(assemble(&grammar, &table, level, class))
}

fn dfa_to_dense(dfa: &Dfa) -> DenseMatrix {
  let mut entries = vec![-1i64; dfa.states.len() * 256];
  for (i, state) in dfa.states.iter().enumerate() {
    for &(lo, hi, target) in &state.transitions {
      for b in lo..=hi {
        entries[i * 256 + b as usize] = target as i64;
      }
    }
  }
  DenseMatrix { rows: dfa.states.len(), entries, empty: -1 }
}

fn compress(matrix: DenseMatrix, level: CompressionLevel) -> CompressedMatrix {
  match level {
    CompressionLevel::Uncompressed => CompressedMatrix::Uncompressed(matrix),
    CompressionLevel::RowDeduplicated => deduplicate_rows(&matrix),
    CompressionLevel::RowDisplaced => displace_rows(&matrix),
  }
}

fn assemble(grammar: &Grammar, table: &ParsingTable, level: CompressionLevel, class: parsegen_core::journal::GrammarClass) -> CompiledGrammar {
  let terminals: Vec<CompiledTerminal> = grammar
    .symbols
    .iter()
    .filter(|s| s.is_terminal())
    .map(|s| CompiledTerminal { id: s.id, name: s.name.clone(), alias: s.alias.clone(), skip: is_skip_terminal(grammar, s.id) })
    .collect();
  let nonterminals: Vec<CompiledNonTerminal> = grammar
    .symbols
    .iter()
    .filter(|s| s.kind == SymbolKind::NonTerminal || s.kind == SymbolKind::AugmentedStart)
    .map(|s| CompiledNonTerminal { id: s.id, name: s.name.clone() })
    .collect();

  let productions: Vec<CompiledProduction> = grammar
    .productions
    .iter()
    .map(|p| CompiledProduction { number: p.number, lhs: p.lhs, rhs_len: p.rhs.len() as u32, recover: p.recover, ast_rewrite: p.ast_rewrite.clone() })
    .collect();

  let num_terminals = terminals.len();
  let num_nonterminals = nonterminals.len();
  let mut action = vec![0i32; table.num_states * num_terminals];
  let mut goto = vec![-1i32; table.num_states * num_nonterminals];
  for state in 0..table.num_states {
    for (ti, t) in terminals.iter().enumerate() {
      action[state * num_terminals + ti] = table.action(state as u32, t.id);
    }
    for (ni, n) in nonterminals.iter().enumerate() {
      goto[state * num_nonterminals + ni] = table.goto(state as u32, n.id);
    }
  }

  let props = BuiltinProperties;
  let dfas = grammar.lexical_spec.compile_modes(&props).expect("lexical spec already validated during grammar build");
  let mut modes = Vec::new();
  for mode in &grammar.lexical_spec.modes {
    let dfa = &dfas[&mode.id];
    let dense = dfa_to_dense(dfa);
    let transitions = compress(dense, level);
    let accept: Vec<i64> = dfa.states.iter().map(|s| s.accept.map(|a| a as i64).unwrap_or(-1)).collect();
    let kind_transitions = mode
      .kinds
      .iter()
      .map(|&kid| {
        let kind = &grammar.lexical_spec.kinds[kid as usize];
        match kind.transition {
          parsegen_core::lexspec::ModeTransition::Push(m) => (Some(m), false),
          parsegen_core::lexspec::ModeTransition::Pop => (None, true),
          parsegen_core::lexspec::ModeTransition::None => (None, false),
        }
      })
      .collect();
    let global_kind_id = mode
      .kinds
      .iter()
      .map(|&kid| grammar.symbols.lookup(&grammar.lexical_spec.kinds[kid as usize].name).expect("lexical kind interned as a terminal"))
      .collect();
    let skip = mode.kinds.iter().map(|&kid| grammar.lexical_spec.kinds[kid as usize].skip).collect();
    modes.push(ModeDfa { mode_id: mode.id, start_state: dfa.start, transitions, accept, kind_transitions, global_kind_id, skip });
  }

  CompiledGrammar {
    name: grammar.name.clone(),
    terminals,
    nonterminals,
    productions,
    num_states: table.num_states,
    action,
    goto,
    num_terminals,
    num_nonterminals,
    error_trapper: table.error_trapper.clone(),
    eof_id: grammar.symbols.eof(),
    error_id: grammar.symbols.error_symbol(),
    start_symbol: grammar.start_symbol,
    lexicon: CompiledLexicon { modes },
    class,
    num_conflicts_resolved: table.conflicts_resolved,
  }
}

fn is_skip_terminal(grammar: &Grammar, id: parsegen_core::symbol::SymbolId) -> bool {
  grammar.lexical_spec.kinds.iter().any(|k| grammar.symbols.lookup(&k.name) == Some(id) && k.skip)
}

#[cfg(test)]
mod tests {
  use super::*;
  use parsegen_core::grammar::ast::*;
  use parsegen_core::journal::GeneratorConfig;

  #[test]
  fn assembles_a_minimal_artifact() {
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
    let artifact = compile_to_artifact(&ast, &mut journal).unwrap();
    assert!(artifact.num_states > 0);
    assert_eq!(artifact.lexicon.modes.len(), 1);
  }
}
