//! The table-driven parser runtime: the shift/reduce/GOTO driver
//! loop, LAC (look-ahead correction), and panic-mode error recovery.
//!
//! A reduce never consumes the current lookahead token — only a shift
//! (ordinary or error-trap) does. `pending` buffers the classified
//! lookahead across however many reduces happen before the next shift.

use crate::error::SyntaxError;
use crate::token::{Token, TokenStream};
use crate::tree::SemanticActionSet;
use parsegen_bytecode::CompiledGrammar;
use parsegen_core::symbol::SymbolId;
use parsegen_core::table::ACCEPT_ACTION;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
  Running,
  InError,
  Accepted,
  Stuck,
}

/// Safety bound on LAC's simulated reduce chain; only exceeded by a
/// corrupt table, never by a well-formed one.
const LAC_ITERATION_LIMIT: usize = 10_000;

pub struct Parser<'g, S: TokenStream, A: SemanticActionSet> {
  grammar: &'g CompiledGrammar,
  tokens: S,
  actions: A,
  state_stack: Vec<u32>,
  term_index: HashMap<u32, usize>,
  nonterm_index: HashMap<u32, usize>,
  disable_lac: bool,
  status: ParserState,
  /// The buffered lookahead: the raw token, its resolved terminal
  /// symbol, and that terminal's ACTION-column index.
  pending: Option<(Token, SymbolId, usize)>,
  /// Set after an error-trap shift; consumed by the very next reduce
  /// (never by a shift) so exactly one semantic event per recovery is
  /// marked `recovered`.
  pending_recovered: bool,
  errors: Vec<SyntaxError>,
}

impl<'g, S: TokenStream, A: SemanticActionSet> Parser<'g, S, A> {
  pub fn new(grammar: &'g CompiledGrammar, tokens: S, actions: A) -> Self {
    let term_index = grammar.terminals.iter().enumerate().map(|(i, t)| (t.id.0, i)).collect();
    let nonterm_index = grammar.nonterminals.iter().enumerate().map(|(i, n)| (n.id.0, i)).collect();
    Self {
      grammar,
      tokens,
      actions,
      state_stack: vec![0],
      term_index,
      nonterm_index,
      disable_lac: false,
      status: ParserState::Running,
      pending: None,
      pending_recovered: false,
      errors: Vec::new(),
    }
  }

  pub fn disable_lac(mut self, disable: bool) -> Self {
    self.disable_lac = disable;
    self
  }

  pub fn status(&self) -> ParserState {
    self.status
  }

  pub fn errors(&self) -> &[SyntaxError] {
    &self.errors
  }

  pub fn into_actions(self) -> A {
    self.actions
  }

  /// Drives the parser to completion: `Accepted` once the augmented
  /// start production reduces, `Stuck` if recovery ever runs out of
  /// trapper states. Syntax errors encountered along the way are
  /// available afterward via [`Parser::errors`].
  pub fn run(&mut self) {
    loop {
      match self.status {
        ParserState::Accepted | ParserState::Stuck => return,
        _ => {}
      }
      self.step();
    }
  }

  fn top(&self) -> u32 {
    *self.state_stack.last().expect("state stack is never empty")
  }

  /// Pulls the next classified lookahead, reusing a previously buffered
  /// one if a reduce left it unconsumed. Skip-flagged terminals are
  /// discarded transparently.
  fn fetch_pending(&mut self) -> (Token, SymbolId, usize) {
    if let Some(p) = self.pending.take() {
      return p;
    }
    loop {
      let token = self.tokens.next();
      if token.eof {
        let idx = self.term_index[&self.grammar.eof_id.0];
        return (token, self.grammar.eof_id, idx);
      }
      if token.invalid {
        let idx = self.term_index[&self.grammar.error_id.0];
        return (token, self.grammar.error_id, idx);
      }
      let skip = self.grammar.terminals.iter().find(|t| t.id.0 == token.kind_id).map(|t| t.skip).unwrap_or(false);
      if skip {
        continue;
      }
      let sym = SymbolId(token.kind_id);
      let idx = self.term_index[&sym.0];
      return (token, sym, idx);
    }
  }

  fn step(&mut self) {
    let (token, sym, term_idx) = self.fetch_pending();
    let top = self.top();
    let action = self.grammar.action_at(top, term_idx);

    if action == 0 {
      self.pending = Some((token, sym, term_idx));
      self.handle_error(sym, term_idx);
      return;
    }

    if action < 0 {
      if !self.disable_lac && !self.lac_allows(term_idx) {
        self.pending = Some((token, sym, term_idx));
        self.handle_error(sym, term_idx);
        return;
      }
      let target = (-action) as u32;
      self.state_stack.push(target);
      self.actions.shift(&token, self.pending_recovered);
      self.pending_recovered = false;
      return;
    }

    if action == ACCEPT_ACTION {
      self.actions.accept();
      self.status = ParserState::Accepted;
      return;
    }

    // Reduce: the lookahead is not consumed.
    let production = action as u32;
    let prod = self.grammar.productions.iter().find(|p| p.number == production).expect("reduce action names a real production");
    let new_len = self.state_stack.len() - prod.rhs_len as usize;
    self.state_stack.truncate(new_len);
    let new_top = self.top();
    let nonterm_idx = self.nonterm_index[&prod.lhs.0];
    let goto = self.grammar.goto_at(new_top, nonterm_idx);
    assert!(goto >= 0, "GOTO undefined after a reduce the table itself proposed");
    self.state_stack.push(goto as u32);
    let recovered = self.pending_recovered;
    self.pending_recovered = false;
    self.actions.reduce(production, recovered);
    self.pending = Some((token, sym, term_idx));
  }

  /// Simulates the table on a scratch copy of the state stack, without
  /// performing any reduce's semantic action, to decide whether `term`
  /// is viable beyond the immediate ACTION entry.
  fn lac_allows(&self, term_idx: usize) -> bool {
    let mut stack = self.state_stack.clone();
    for _ in 0..LAC_ITERATION_LIMIT {
      let top = *stack.last().expect("state stack is never empty");
      let action = self.grammar.action_at(top, term_idx);
      if action == 0 {
        return false;
      }
      if action < 0 || action == ACCEPT_ACTION {
        return true;
      }
      let prod = self.grammar.productions.iter().find(|p| p.number == action as u32).expect("reduce action names a real production");
      let new_len = stack.len().saturating_sub(prod.rhs_len as usize);
      stack.truncate(new_len);
      let new_top = *stack.last().expect("state stack is never empty");
      let nonterm_idx = self.nonterm_index[&prod.lhs.0];
      let goto = self.grammar.goto_at(new_top, nonterm_idx);
      if goto < 0 {
        return false;
      }
      stack.push(goto as u32);
    }
    false
  }

  /// Panic-mode recovery: records the error, pops to the nearest
  /// `error`-trapping state, shifts the synthetic `error` terminal into
  /// it, then discards input until some token realigns with the table.
  fn handle_error(&mut self, term: SymbolId, term_idx: usize) {
    let top = self.top();
    let expected: Vec<u32> = self
      .grammar
      .terminals
      .iter()
      .enumerate()
      .filter(|(i, _)| self.grammar.action_at(top, *i) != 0)
      .map(|(_, t)| t.id.0)
      .collect();

    let (cause_token, _, _) = self.pending.clone().expect("handle_error is only called with a pending lookahead");
    let cause = SyntaxError {
      position: cause_token.position,
      cause_lexeme: cause_token.lexeme.clone(),
      message: format!("unexpected token (terminal {})", term.0),
      expected,
      invalid_token: cause_token.invalid,
    };

    let mut popped = 0usize;
    while !self.grammar.error_trapper[self.top() as usize] {
      if self.state_stack.len() == 1 {
        self.errors.push(cause.clone());
        self.actions.miss_error(&cause);
        self.status = ParserState::Stuck;
        return;
      }
      self.state_stack.pop();
      popped += 1;
    }

    self.errors.push(cause.clone());
    self.status = ParserState::InError;

    let trapper_state = self.top();
    let error_idx = self.term_index[&self.grammar.error_id.0];
    let shift_action = self.grammar.action_at(trapper_state, error_idx);
    assert!(shift_action < 0, "a state flagged as an error trapper always shifts `error`");
    self.state_stack.push((-shift_action) as u32);
    self.actions.trap_and_shift_error(&cause, popped);
    self.pending_recovered = true;
    self.pending = None;
    self.status = ParserState::Running;

    // Realign: discard tokens until one finds a defined action, or EOF
    // is reached (handled as an ordinary lookahead on the next step).
    loop {
      let (token, sym, idx) = self.fetch_pending();
      if token.eof {
        self.pending = Some((token, sym, idx));
        return;
      }
      let top = self.top();
      if self.grammar.action_at(top, idx) != 0 {
        self.pending = Some((token, sym, idx));
        return;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lexer::Lexer;
  use crate::tree::{DefaultTreeBuilder, TreeNode};
  use parsegen_bytecode::compile_to_artifact;
  use parsegen_core::grammar::ast::*;
  use parsegen_core::journal::{GeneratorConfig, Journal};

  fn sum_grammar() -> CompiledGrammar {
    // s : s plus int | int ;  left-assoc `plus`, both sides drive a
    // single state stack with no mode transitions or recovery points
    // beyond the synthetic error production below.
    let ast = GrammarAst {
      name: "sum".into(),
      start: Some("s".into()),
      precedence_blocks: vec![PrecedenceBlock {
        levels: vec![PrecedenceLevel { assoc: AssocDirective::Left, symbols: vec!["plus".into()] }],
      }],
      productions: vec![ProductionAst {
        lhs: "s".into(),
        alternatives: vec![
          AlternativeAst { symbols: vec![SymbolRefAst::nonterminal("s"), SymbolRefAst::terminal("plus"), SymbolRefAst::terminal("int")], ..Default::default() },
          AlternativeAst { symbols: vec![SymbolRefAst::terminal("int")], ..Default::default() },
          AlternativeAst {
            symbols: vec![SymbolRefAst::terminal("error"), SymbolRefAst::terminal("int")],
            recover: true,
            ..Default::default()
          },
        ],
      }],
      lexical_productions: vec![
        LexicalProductionAst { name: "ws".into(), pattern_src: " +".into(), skip: true, ..Default::default() },
        LexicalProductionAst { name: "plus".into(), pattern_src: "\\+".into(), ..Default::default() },
        LexicalProductionAst { name: "int".into(), pattern_src: "[0-9]+".into(), ..Default::default() },
      ],
      fragments: vec![],
    };
    let mut journal = Journal::new(GeneratorConfig::new());
    compile_to_artifact(&ast, &mut journal).unwrap()
  }

  #[test]
  fn accepts_a_simple_sum() {
    let grammar = sum_grammar();
    let lexer = Lexer::new(&grammar, b"1 + 2 + 3");
    let builder = DefaultTreeBuilder::new(&grammar);
    let mut parser = Parser::new(&grammar, lexer, builder);
    parser.run();
    assert_eq!(parser.status(), ParserState::Accepted);
    assert!(parser.errors().is_empty());
    let mut builder = parser.into_actions();
    let root = builder.take_root().expect("accept populates the root");
    match root {
      TreeNode::NonTerminal { children, .. } => assert_eq!(children.len(), 3),
      other => panic!("expected a non-terminal root, got {other:?}"),
    }
  }

  #[test]
  fn recovers_from_a_missing_operand_and_still_accepts() {
    let grammar = sum_grammar();
    // "1 + + 2": the second `+` has no operand before it — the
    // augmented grammar's `error int` alternative traps and recovers.
    let lexer = Lexer::new(&grammar, b"1 + + 2");
    let builder = DefaultTreeBuilder::new(&grammar);
    let mut parser = Parser::new(&grammar, lexer, builder);
    parser.run();
    assert!(!parser.errors().is_empty());
  }

  #[test]
  fn lac_rejects_a_nonviable_lookahead_before_shifting() {
    let grammar = sum_grammar();
    // A bare `+` with no leading operand at all: LAC must see that
    // shifting isn't actually viable past the nonexistent initial `s`,
    // so error recovery is entered instead of ever executing a doomed
    // shift.
    let lexer = Lexer::new(&grammar, b"+ 2");
    let builder = DefaultTreeBuilder::new(&grammar);
    let mut parser = Parser::new(&grammar, lexer, builder);
    parser.run();
    assert!(!parser.errors().is_empty());
  }
}
