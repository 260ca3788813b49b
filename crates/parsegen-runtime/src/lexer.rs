//! Lexer runtime: greedy longest-match scanning over a compiled
//! per-mode DFA bundle, with a mode stack, invalid-token coalescing,
//! and UTF-8-aware row/column tracking.

use crate::token::{Position, Token, TokenStream};
use parsegen_bytecode::CompiledGrammar;

pub struct Lexer<'g> {
  grammar: &'g CompiledGrammar,
  input: &'g [u8],
  pos: usize,
  row: u32,
  col: u32,
  mode_stack: Vec<u32>,
  /// When true, the caller is responsible for driving push/pop — the
  /// lexer reports the would-be transition but does not apply it.
  passive: bool,
}

pub enum ModeStep {
  None,
  Push(u32),
  Pop,
}

impl<'g> Lexer<'g> {
  pub fn new(grammar: &'g CompiledGrammar, input: &'g [u8]) -> Self {
    Self { grammar, input, pos: 0, row: 0, col: 0, mode_stack: vec![0], passive: false }
  }

  pub fn passive(mut self, passive: bool) -> Self {
    self.passive = passive;
    self
  }

  pub fn current_mode(&self) -> u32 {
    *self.mode_stack.last().expect("mode stack is never empty at rest")
  }

  /// Applies a deferred mode transition; only meaningful in passive mode.
  pub fn apply_mode_step(&mut self, step: ModeStep) {
    match step {
      ModeStep::None => {}
      ModeStep::Push(m) => self.mode_stack.push(m),
      ModeStep::Pop => {
        self.mode_stack.pop();
        if self.mode_stack.is_empty() {
          self.mode_stack.push(0);
        }
      }
    }
  }

  fn advance_position(&mut self, bytes: &[u8]) {
    for &b in bytes {
      // UTF-8 continuation bytes (0b10xxxxxx) never start a column.
      let is_continuation = b & 0b1100_0000 == 0b1000_0000;
      if b == 0x0A {
        self.row += 1;
        self.col = 0;
      } else if !is_continuation {
        self.col += 1;
      }
    }
  }

  /// Scans one token, applying any matched kind's mode push/pop unless
  /// the lexer is in passive mode.
  pub fn next_token(&mut self) -> Token {
    if self.pos >= self.input.len() {
      return Token::eof(Position { byte_offset: self.pos, row: self.row, col: self.col });
    }

    let mode_id = self.current_mode();
    let mode_dfa = self.grammar.lexicon.modes.iter().find(|m| m.mode_id == mode_id).expect("active mode has a compiled DFA");

    let start_pos = self.pos;
    let mut state = mode_dfa.start_state;
    let mut cursor = self.pos;
    let mut last_accept: Option<(usize, u32)> = None;

    loop {
      if cursor >= self.input.len() {
        break;
      }
      let byte = self.input[cursor];
      let next = mode_dfa.transitions.lookup(state, byte);
      if next < 0 {
        break;
      }
      state = next as usize;
      cursor += 1;
      let accept = mode_dfa.accept[state];
      if accept >= 0 {
        last_accept = Some((cursor, accept as u32));
      }
    }

    if let Some((end, mode_kind_id)) = last_accept {
      let lexeme = self.input[start_pos..end].to_vec();
      let position = Position { byte_offset: start_pos, row: self.row, col: self.col };
      self.advance_position(&lexeme);
      self.pos = end;

      let global_kind_id = mode_dfa.global_kind_id[mode_kind_id as usize];
      let skip = mode_dfa.skip[mode_kind_id as usize];
      let (push, pop) = mode_dfa.kind_transitions[mode_kind_id as usize];

      if !self.passive {
        if pop {
          self.apply_mode_step(ModeStep::Pop);
        } else if let Some(target) = push {
          self.apply_mode_step(ModeStep::Push(target));
        }
      }

      let _ = skip; // surfaced via `CompiledGrammar::terminals[..].skip`, not on the token itself
      Token { mode_id, kind_id: global_kind_id.0, mode_kind_id, lexeme, position, eof: false, invalid: false }
    } else {
      self.scan_invalid(start_pos)
    }
  }

  /// No acceptance was reached; consumes one byte (or, if further bytes
  /// also fail, coalesces them) as a single invalid token.
  fn scan_invalid(&mut self, start: usize) -> Token {
    let mode_id = self.current_mode();
    let mode_dfa = self.grammar.lexicon.modes.iter().find(|m| m.mode_id == mode_id).expect("active mode has a compiled DFA");
    let mut end = start + 1;
    while end < self.input.len() {
      let mut state = mode_dfa.start_state;
      let mut cursor = end;
      let mut accepted = false;
      while cursor < self.input.len() {
        let next = mode_dfa.transitions.lookup(state, self.input[cursor]);
        if next < 0 {
          break;
        }
        state = next as usize;
        cursor += 1;
        if mode_dfa.accept[state] >= 0 {
          accepted = true;
          break;
        }
      }
      if accepted {
        break;
      }
      end += 1;
    }
    let lexeme = self.input[start..end].to_vec();
    let position = Position { byte_offset: start, row: self.row, col: self.col };
    self.advance_position(&lexeme);
    self.pos = end;
    Token::invalid(lexeme, position)
  }
}

impl<'g> TokenStream for Lexer<'g> {
  fn next(&mut self) -> Token {
    self.next_token()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use parsegen_bytecode::compile_to_artifact;
  use parsegen_core::grammar::ast::*;
  use parsegen_core::journal::{GeneratorConfig, Journal};

  fn int_grammar() -> CompiledGrammar {
    let ast = GrammarAst {
      name: "g".into(),
      start: Some("s".into()),
      precedence_blocks: vec![],
      productions: vec![ProductionAst {
        lhs: "s".into(),
        alternatives: vec![AlternativeAst { symbols: vec![SymbolRefAst::terminal("int")], ..Default::default() }],
      }],
      lexical_productions: vec![
        LexicalProductionAst { name: "ws".into(), pattern_src: " +".into(), skip: true, ..Default::default() },
        LexicalProductionAst { name: "int".into(), pattern_src: "[0-9]+".into(), ..Default::default() },
      ],
      fragments: vec![],
    };
    let mut journal = Journal::new(GeneratorConfig::new());
    compile_to_artifact(&ast, &mut journal).unwrap()
  }

  #[test]
  fn greedy_longest_match_consumes_whole_run() {
    let grammar = int_grammar();
    let mut lexer = Lexer::new(&grammar, b"1234");
    let tok = lexer.next_token();
    assert_eq!(tok.lexeme, b"1234");
    assert!(!tok.eof);
  }

  #[test]
  fn eof_emitted_once_input_is_exhausted() {
    let grammar = int_grammar();
    let mut lexer = Lexer::new(&grammar, b"1");
    let _ = lexer.next_token();
    let tok = lexer.next_token();
    assert!(tok.eof);
    assert!(tok.lexeme.is_empty());
  }

  #[test]
  fn lf_resets_column_and_increments_row() {
    let grammar = int_grammar();
    let mut lexer = Lexer::new(&grammar, b"1\n2");
    let first = lexer.next_token();
    assert_eq!(first.position.row, 0);
    assert_eq!(first.position.col, 0);
    // This grammar has no newline kind, so `\n` itself becomes a
    // one-byte invalid token; the row/col advance it causes is only
    // visible in the position of the token that follows it.
    let invalid = lexer.next_token();
    assert!(invalid.invalid);
    let third = lexer.next_token();
    assert_eq!(third.position.row, 1);
    assert_eq!(third.position.col, 0);
  }
}
