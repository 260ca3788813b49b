//! The serializable compiled-grammar artifact: symbol
//! tables, productions, ACTION/GOTO arrays, and the per-mode lexical
//! DFA bundle, every matrix encoded at the configured compression
//! level. JSON transport of this record is an external collaborator
//! this module only defines the in-memory shape.

use crate::compress::CompressedMatrix;
use parsegen_core::journal::GrammarClass;
use parsegen_core::symbol::SymbolId;

#[derive(Debug, Clone)]
pub struct CompiledTerminal {
  pub id: SymbolId,
  pub name: String,
  pub alias: Option<String>,
  pub skip: bool,
}

#[derive(Debug, Clone)]
pub struct CompiledNonTerminal {
  pub id: SymbolId,
  pub name: String,
}

#[derive(Debug, Clone)]
pub struct CompiledProduction {
  pub number: u32,
  pub lhs: SymbolId,
  pub rhs_len: u32,
  pub recover: bool,
  pub ast_rewrite: Option<Vec<i32>>,
}

/// One mode's compiled DFA: the byte-class transition matrix plus an
/// accept map from state to mode-kind-id.
#[derive(Debug, Clone)]
pub struct ModeDfa {
  pub mode_id: u32,
  pub start_state: usize,
  pub transitions: CompressedMatrix,
  pub accept: Vec<i64>,
  /// mode-kind-id -> (push target mode, is pop).
  pub kind_transitions: Vec<(Option<u32>, bool)>,
  /// mode-kind-id -> the kind's grammar-wide terminal id.
  pub global_kind_id: Vec<SymbolId>,
  /// mode-kind-id -> whether matches of this kind are dropped by the
  /// parser runtime rather than surfaced as tokens.
  pub skip: Vec<bool>,
}

#[derive(Debug, Clone)]
pub struct CompiledLexicon {
  pub modes: Vec<ModeDfa>,
}

#[derive(Debug, Clone)]
pub struct CompiledGrammar {
  pub name: String,
  pub terminals: Vec<CompiledTerminal>,
  pub nonterminals: Vec<CompiledNonTerminal>,
  pub productions: Vec<CompiledProduction>,
  pub num_states: usize,
  /// ACTION[state][term] flattened; index with `state * num_terminals + term_index`.
  pub action: Vec<i32>,
  pub goto: Vec<i32>,
  pub num_terminals: usize,
  pub num_nonterminals: usize,
  pub error_trapper: Vec<bool>,
  pub eof_id: SymbolId,
  pub error_id: SymbolId,
  pub start_symbol: SymbolId,
  pub lexicon: CompiledLexicon,
  /// Which analysis class actually produced `action`/`goto` — classification
  /// metadata only, not consulted by the runtime.
  pub class: GrammarClass,
  pub num_conflicts_resolved: usize,
}

impl CompiledGrammar {
  pub fn terminal_index(&self, id: SymbolId) -> Option<usize> {
    self.terminals.iter().position(|t| t.id == id)
  }

  pub fn nonterminal_index(&self, id: SymbolId) -> Option<usize> {
    self.nonterminals.iter().position(|n| n.id == id)
  }

  pub fn action_at(&self, state: u32, term_index: usize) -> i32 {
    self.action[state as usize * self.num_terminals + term_index]
  }

  pub fn goto_at(&self, state: u32, nonterm_index: usize) -> i32 {
    self.goto[state as usize * self.num_nonterminals + nonterm_index]
  }
}
