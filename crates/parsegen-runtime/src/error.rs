//! Runtime diagnostics: syntax errors produced during a
//! parse, including invalid-token errors surfaced as a special case.

use crate::token::Position;

#[derive(Debug, Clone)]
pub struct SyntaxError {
  pub position: Position,
  /// The token that triggered recovery, or the cause of a fatal error.
  pub cause_lexeme: Vec<u8>,
  pub message: String,
  /// Terminal ids `t` for which `ACTION[state, t] != error` held at the
  /// moment of failure.
  pub expected: Vec<u32>,
  /// True when the cause token itself was lexically invalid.
  pub invalid_token: bool,
}
