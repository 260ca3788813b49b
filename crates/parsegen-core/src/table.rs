//! Table builder: populates ACTION/GOTO from the automaton,
//! resolving shift/reduce and reduce/reduce conflicts by precedence and
//! associativity, and logging every resolution to the
//! active `Journal` report.

use crate::automaton::Automaton;
use crate::error::{ctor, GeneratorError, GeneratorResult, Span};
use crate::grammar::Grammar;
use crate::journal::report::{ConflictReason, ConflictResolution, ReportType};
use crate::journal::Journal;
use crate::symbol::{Associativity, SymbolId};
use std::collections::HashMap;

/// Encoded as: negative = shift to `|x|`,
/// positive = reduce production `x`, zero = error.
pub type Action = i32;
/// Non-negative = target state; `-1` = error (no GOTO defined).
pub type Goto = i32;

/// Sentinel ACTION value for "reduce the augmented-start production and
/// stop" — distinguished from an ordinary reduce by being outside any
/// real production-number range.
pub const ACCEPT_ACTION: Action = i32::MAX;

#[derive(Debug, Clone)]
pub struct ParsingTable {
  pub num_states: usize,
  pub action: HashMap<(u32, SymbolId), Action>,
  pub goto: HashMap<(u32, SymbolId), Goto>,
  pub error_trapper: Vec<bool>,
  /// How many shift/reduce or reduce/reduce collisions the table build
  /// had to break a tie on, for the classification metadata
  /// names ("a separate optional report artifact").
  pub conflicts_resolved: usize,
}

impl ParsingTable {
  pub fn action(&self, state: u32, term: SymbolId) -> Action {
    *self.action.get(&(state, term)).unwrap_or(&0)
  }

  pub fn goto(&self, state: u32, nonterm: SymbolId) -> Goto {
    *self.goto.get(&(state, nonterm)).unwrap_or(&-1)
  }
}

pub fn build_table(grammar: &Grammar, automaton: &Automaton, journal: &mut Journal) -> GeneratorResult<ParsingTable> {
  let mut action: HashMap<(u32, SymbolId), Action> = HashMap::new();
  let mut goto: HashMap<(u32, SymbolId), Goto> = HashMap::new();
  let mut error_trapper = vec![false; automaton.states.len()];
  let mut conflicts_resolved = 0usize;
  let mut errors: Vec<GeneratorError> = Vec::new();

  for state in &automaton.states {
    for (&sym, &target) in &state.shifts {
      if sym == grammar.symbols.error_symbol() {
        error_trapper[state.number as usize] = true;
      }
      action.insert((state.number, sym), -(target as i32));
    }
    for (&sym, &target) in &state.gotos {
      goto.insert((state.number, sym), target as i32);
    }

    for item in &state.reduce_items {
      let prod = &grammar.productions[item.production as usize];
      let is_accept = prod.lhs == grammar.augmented_start;
      let lookaheads = state.lookaheads.get(item).cloned().unwrap_or_default();

      for &term in &lookaheads {
        let existing = action.get(&(state.number, term)).copied().unwrap_or(0);
        let proposed = if is_accept { ACCEPT_ACTION } else { prod.number as i32 };

        if existing == 0 {
          action.insert((state.number, term), proposed);
          continue;
        }
        if existing < 0 {
          if let Some(err) = resolve_shift_reduce(grammar, journal, &mut action, state.number, term, existing, prod, proposed) {
            errors.push(err);
          }
          conflicts_resolved += 1;
        } else if existing > 0 && existing != proposed {
          resolve_reduce_reduce(grammar, journal, &mut action, state.number, term, existing, proposed);
          conflicts_resolved += 1;
        }
      }
    }
  }

  if !errors.is_empty() {
    return Err(errors);
  }

  Ok(ParsingTable { num_states: automaton.states.len(), action, goto, error_trapper, conflicts_resolved })
}

/// Resolves one shift/reduce collision, returning the unresolvable-conflict
/// error when precedence is equal on both sides and associativity is
/// `none` (including plain `#assign`) — there is then no rule left to
/// break the tie, so the table build reports it rather than guessing.
fn resolve_shift_reduce(
  grammar: &Grammar,
  journal: &mut Journal,
  action: &mut HashMap<(u32, SymbolId), Action>,
  state: u32,
  term: SymbolId,
  shift_action: Action,
  reduce_prod: &crate::grammar::Production,
  reduce_action: Action,
) -> Option<GeneratorError> {
  let term_sym = grammar.symbols.get(term);
  let mut error = None;

  let (chosen, reason) = if term_sym.precedence != 0 && reduce_prod.precedence != 0 {
    if term_sym.precedence > reduce_prod.precedence {
      (shift_action, ConflictReason::ResolvedByPrecedence)
    } else if term_sym.precedence < reduce_prod.precedence {
      (reduce_action, ConflictReason::ResolvedByPrecedence)
    } else {
      match term_sym.associativity {
        Associativity::Left => (reduce_action, ConflictReason::ResolvedByAssociativity),
        Associativity::Right => (shift_action, ConflictReason::ResolvedByAssociativity),
        Associativity::None => {
          error = Some(ctor::unresolvable_conflict(
            Span::default(),
            format!(
              "state {state} on `{}`: shift/reduce conflict at equal precedence with no associativity to break the tie (reducing production {})",
              term_sym.name, reduce_prod.number
            ),
          ));
          (shift_action, ConflictReason::Unresolved)
        }
      }
    }
  } else {
    (shift_action, ConflictReason::ResolvedByShift)
  };

  journal.conflict(
    ReportType::TableBuild,
    ConflictResolution {
      state: state as usize,
      symbol_name: term_sym.name.clone(),
      participating_productions: vec![reduce_prod.number as usize],
      chosen_action: describe_action(chosen),
      reason,
    },
  );
  action.insert((state, term), chosen);
  error
}

fn resolve_reduce_reduce(
  grammar: &Grammar,
  journal: &mut Journal,
  action: &mut HashMap<(u32, SymbolId), Action>,
  state: u32,
  term: SymbolId,
  existing: Action,
  proposed: Action,
) {
  let chosen = existing.min(proposed);
  let term_sym = grammar.symbols.get(term);
  journal.conflict(
    ReportType::TableBuild,
    ConflictResolution {
      state: state as usize,
      symbol_name: term_sym.name.clone(),
      participating_productions: vec![existing as usize, proposed as usize],
      chosen_action: describe_action(chosen),
      reason: ConflictReason::ResolvedByProdOrder,
    },
  );
  action.insert((state, term), chosen);
}

fn describe_action(action: Action) -> String {
  if action == ACCEPT_ACTION {
    "accept".to_string()
  } else if action < 0 {
    format!("shift {}", -action)
  } else {
    format!("reduce {action}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::automaton::build_automaton;
  use crate::grammar::ast::*;
  use crate::journal::config::{GeneratorConfig, GrammarClass};
  use crate::regex::unicode::BuiltinProperties;

  fn expr_grammar() -> Grammar {
    let ast = GrammarAst {
      name: "expr".into(),
      start: Some("expr".into()),
      precedence_blocks: vec![PrecedenceBlock {
        levels: vec![PrecedenceLevel { assoc: AssocDirective::Left, symbols: vec!["plus".into()] }],
      }],
      productions: vec![ProductionAst {
        lhs: "expr".into(),
        alternatives: vec![
          AlternativeAst { symbols: vec![SymbolRefAst::nonterminal("expr"), SymbolRefAst::terminal("plus"), SymbolRefAst::nonterminal("expr")], ..Default::default() },
          AlternativeAst { symbols: vec![SymbolRefAst::terminal("int")], ..Default::default() },
        ],
      }],
      lexical_productions: vec![
        LexicalProductionAst { name: "plus".into(), pattern_src: "\\+".into(), ..Default::default() },
        LexicalProductionAst { name: "int".into(), pattern_src: "[0-9]+".into(), ..Default::default() },
      ],
      fragments: vec![],
    };
    let mut journal = Journal::new(GeneratorConfig::new());
    crate::grammar::build(&ast, &mut journal, &BuiltinProperties).unwrap()
  }

  #[test]
  fn left_associative_operator_prefers_reduce() {
    let grammar = expr_grammar();
    let automaton = build_automaton(&grammar, GrammarClass::Lalr1);
    let mut journal = Journal::new(GeneratorConfig::new());
    let table = build_table(&grammar, &automaton, &mut journal).unwrap();
    assert!(table.num_states > 0);
  }

  #[test]
  fn equal_precedence_with_no_associativity_is_unresolvable() {
    let ast = GrammarAst {
      name: "ambiguous".into(),
      start: Some("expr".into()),
      precedence_blocks: vec![PrecedenceBlock {
        levels: vec![PrecedenceLevel { assoc: AssocDirective::Assign, symbols: vec!["lt".into()] }],
      }],
      productions: vec![ProductionAst {
        lhs: "expr".into(),
        alternatives: vec![
          AlternativeAst {
            symbols: vec![SymbolRefAst::nonterminal("expr"), SymbolRefAst::terminal("lt"), SymbolRefAst::nonterminal("expr")],
            prec_symbol: Some("lt".into()),
            ..Default::default()
          },
          AlternativeAst { symbols: vec![SymbolRefAst::terminal("int")], ..Default::default() },
        ],
      }],
      lexical_productions: vec![
        LexicalProductionAst { name: "lt".into(), pattern_src: "<".into(), ..Default::default() },
        LexicalProductionAst { name: "int".into(), pattern_src: "[0-9]+".into(), ..Default::default() },
      ],
      fragments: vec![],
    };
    let mut journal = Journal::new(GeneratorConfig::new());
    let grammar = crate::grammar::build(&ast, &mut journal, &BuiltinProperties).unwrap();
    let automaton = build_automaton(&grammar, GrammarClass::Lalr1);
    let result = build_table(&grammar, &automaton, &mut journal);
    assert!(result.is_err(), "non-associative equal-precedence shift/reduce conflict must be reported, not silently resolved");
  }
}
