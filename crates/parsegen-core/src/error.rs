use std::fmt::{self, Display};

/// A source location: row/col plus byte range, stripped of the
/// source-slice ownership that belongs to an (out-of-scope) front-end
/// parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
  pub offset: usize,
  pub length: usize,
  pub row: u32,
  pub col: u32,
}

impl Span {
  pub fn new(offset: usize, length: usize, row: u32, col: u32) -> Self {
    Self { offset, length, row, col }
  }
}

/// Diagnostic category: a coarse category plus a stable numeric code
/// plus a human slug, so reports stay greppable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
  Lexical,
  Grammar,
  Analysis,
}

impl Display for ErrorCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ErrorCategory::Lexical => "lexical",
      ErrorCategory::Grammar => "grammar",
      ErrorCategory::Analysis => "analysis",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorId {
  pub category: ErrorCategory,
  pub code: u32,
  pub slug: &'static str,
}

impl Display for ErrorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{:03}:{}", self.category, self.code, self.slug)
  }
}

/// One compile-time diagnostic, grouped under three kinds
/// (`LexicalSpecError`, `GrammarError`, `AnalysisError`). Rather than a
/// closed enum per kind, `GeneratorError` is one shape carrying an
/// `ErrorId` that pins down which of the three kinds, and which specific
/// condition, produced it.
#[derive(Debug, Clone)]
pub struct GeneratorError {
  pub id: ErrorId,
  pub message: String,
  pub inline_message: String,
  pub loc: Span,
}

impl Display for GeneratorError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "[{}] {} ({}:{}): {}",
      self.id, self.message, self.loc.row, self.loc.col, self.inline_message
    )
  }
}

impl std::error::Error for GeneratorError {}

impl GeneratorError {
  pub fn new(id: ErrorId, loc: Span, message: impl Into<String>, inline_message: impl Into<String>) -> Self {
    Self { id, loc, message: message.into(), inline_message: inline_message.into() }
  }
}

macro_rules! error_ctor {
  ($name:ident, $category:expr, $code:expr, $slug:expr, $message:expr) => {
    pub fn $name(loc: Span, detail: impl Into<String>) -> GeneratorError {
      let detail = detail.into();
      GeneratorError::new(
        ErrorId { category: $category, code: $code, slug: $slug },
        loc,
        $message,
        detail,
      )
    }
  };
}

pub mod ctor {
  use super::*;
  use ErrorCategory::*;

  error_ctor!(invalid_regex, Lexical, 0, "invalid-regex", "The regular expression could not be parsed.");
  error_ctor!(cycle_in_fragment, Lexical, 1, "cycle-in-fragment", "Fragment expansion forms a cycle.");
  error_ctor!(duplicate_kind, Lexical, 2, "duplicate-kind", "A non-fragment lexical kind with this name already exists.");
  error_ctor!(spelling_collision, Lexical, 3, "spelling-collision", "Kind names collide after spelling normalization.");

  error_ctor!(undefined_symbol, Grammar, 0, "undefined-symbol", "Symbol is referenced but never defined.");
  error_ctor!(unused_symbol, Grammar, 1, "unused-symbol", "Symbol is defined but never referenced.");
  error_ctor!(duplicate_alternative, Grammar, 2, "duplicate-alternative", "The same alternative appears twice for one non-terminal.");
  error_ctor!(reserved_symbol_used, Grammar, 3, "reserved-symbol-used", "`error` may only appear as the first symbol of a `#recover` alternative.");
  error_ctor!(skip_on_used_terminal, Grammar, 4, "skip-on-used-terminal", "A terminal cannot be both referenced by a production and marked `#skip`.");
  error_ctor!(label_collision, Grammar, 5, "label-collision", "Two `@label`s collide within the same alternative.");
  error_ctor!(invalid_ast_reference, Grammar, 6, "invalid-ast-reference", "`#ast` rewrite index is out of the alternative's bounds.");

  error_ctor!(unresolvable_conflict, Analysis, 0, "unresolvable-conflict", "A shift/reduce conflict could not be resolved without explicit precedence.");
}

pub type GeneratorResult<T> = Result<T, Vec<GeneratorError>>;
