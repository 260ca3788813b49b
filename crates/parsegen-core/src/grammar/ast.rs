//! Grammar AST — the contract between the (out-of-scope)
//! textual DSL parser and the builder in [`super::builder`]. Callers
//! that already have a DSL front end construct these types directly;
//! callers that want to build a grammar programmatically can construct
//! them by hand just as easily.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssocDirective {
  Left,
  Right,
  Assign,
}

#[derive(Debug, Clone)]
pub struct PrecedenceLevel {
  pub assoc: AssocDirective,
  pub symbols: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PrecedenceBlock {
  /// Declaration order; interpreted per the active `PrecedenceOrder`.
  pub levels: Vec<PrecedenceLevel>,
}

/// A reference to a symbol within an alternative's RHS. `is_terminal`
/// records how the DSL spelled the reference (`'literal'`/`"regex"` vs a
/// bare identifier) since that's the only place the distinction is
/// syntactically visible.
#[derive(Debug, Clone)]
pub struct SymbolRefAst {
  pub name: String,
  pub is_terminal: bool,
  pub label: Option<String>,
}

impl SymbolRefAst {
  pub fn nonterminal(name: impl Into<String>) -> Self {
    Self { name: name.into(), is_terminal: false, label: None }
  }

  pub fn terminal(name: impl Into<String>) -> Self {
    Self { name: name.into(), is_terminal: true, label: None }
  }

  pub fn labeled(mut self, label: impl Into<String>) -> Self {
    self.label = Some(label.into());
    self
  }
}

#[derive(Debug, Clone, Default)]
pub struct AlternativeAst {
  pub symbols: Vec<SymbolRefAst>,
  pub ast_rewrite: Option<Vec<i32>>,
  pub prec_symbol: Option<String>,
  pub recover: bool,
}

#[derive(Debug, Clone)]
pub struct ProductionAst {
  pub lhs: String,
  pub alternatives: Vec<AlternativeAst>,
}

#[derive(Debug, Clone, Default)]
pub struct LexicalProductionAst {
  pub name: String,
  pub pattern_src: String,
  pub skip: bool,
  pub push_mode: Option<String>,
  pub pop: bool,
  /// Modes this kind is active in; empty means the default mode only.
  pub modes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FragmentAst {
  pub name: String,
  pub pattern_src: String,
}

#[derive(Debug, Clone, Default)]
pub struct GrammarAst {
  pub name: String,
  /// The start non-terminal; defaults to the first production's LHS
  /// when absent.
  pub start: Option<String>,
  pub precedence_blocks: Vec<PrecedenceBlock>,
  pub productions: Vec<ProductionAst>,
  pub lexical_productions: Vec<LexicalProductionAst>,
  pub fragments: Vec<FragmentAst>,
}
