#![allow(non_snake_case)]

/// Which analysis class is used to compute reduce lookaheads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarClass {
  /// Knuth/DeRemer channel propagation.
  Lalr1,
  /// FOLLOW(LHS) reduce lookaheads.
  Slr1,
  /// Attempt LALR(1); fall back to SLR(1) for any non-terminal whose
  /// LALR(1) lookaheads could not be resolved without reporting a
  /// conflict. Recorded per-state in the compiled grammar's metrics.
  Lalr1WithSlr1Fallback,
}

/// DFA / table compression level shared by the lexical DFA and the
/// ACTION/GOTO tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompressionLevel {
  /// Dense row-major matrix.
  Uncompressed = 0,
  /// Equal rows share storage.
  RowDeduplicated = 1,
  /// Row-displacement (open-addressed) encoding.
  RowDisplaced = 2,
}

/// Which way `#prec` block ordering maps to binding strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecedenceOrder {
  /// Earlier `#prec` lines bind tighter (higher precedence). This is the
  /// convention a `mul`-before-`add` precedence ordering requires.
  EarlierIsHigher,
  /// Earlier lines are lower precedence.
  EarlierIsLower,
}

impl Default for PrecedenceOrder {
  fn default() -> Self {
    PrecedenceOrder::EarlierIsHigher
  }
}

/// Global (but not process-wide) configuration for one compilation run.
/// Threaded explicitly through `compile_grammar`; there is no singleton.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
  pub class: GrammarClass,
  pub compression: CompressionLevel,
  pub precedence_order: PrecedenceOrder,
  /// When true, a `Report` describing every conflict resolution is
  /// retained on the compiled grammar as a separate optional artifact.
  pub report: bool,
  /// When true, the parser runtime generated to consume this grammar
  /// should disable LAC (look-ahead correction).
  pub disable_lac: bool,
}

impl Default for GeneratorConfig {
  fn default() -> Self {
    Self {
      class: GrammarClass::Lalr1,
      compression: CompressionLevel::RowDisplaced,
      precedence_order: PrecedenceOrder::default(),
      report: true,
      disable_lac: false,
    }
  }
}

impl GeneratorConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn class(mut self, class: GrammarClass) -> Self {
    self.class = class;
    self
  }

  pub fn compression(mut self, level: CompressionLevel) -> Self {
    self.compression = level;
    self
  }

  pub fn precedence_order(mut self, order: PrecedenceOrder) -> Self {
    self.precedence_order = order;
    self
  }

  pub fn report(mut self, enable: bool) -> Self {
    self.report = enable;
    self
  }

  pub fn disable_lac(mut self, disable: bool) -> Self {
    self.disable_lac = disable;
    self
  }

  /// Convenience preset for SLR(1) analysis with uncompressed tables
  /// and reporting on.
  pub fn slr1() -> Self {
    Self::new().class(GrammarClass::Slr1).compression(CompressionLevel::Uncompressed)
  }
}
