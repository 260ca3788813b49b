use std::fmt::{self, Display};

/// One compilation stage's diagnostic bucket: every report is keyed by
/// which stage produced it so `Journal::render` can group output the
/// way a human reading a compiler log expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportType {
  SymbolResolution,
  RegexCompile,
  LexicalCompile,
  GrammarLower,
  Automaton,
  TableBuild,
}

impl Display for ReportType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ReportType::SymbolResolution => "symbol-resolution",
      ReportType::RegexCompile => "regex-compile",
      ReportType::LexicalCompile => "lexical-compile",
      ReportType::GrammarLower => "grammar-lower",
      ReportType::Automaton => "automaton",
      ReportType::TableBuild => "table-build",
    };
    f.write_str(name)
  }
}

/// A single resolved conflict, retained when `GeneratorConfig::report` is
/// set: every resolution is logged with enough context to render a
/// human-readable report.
#[derive(Debug, Clone)]
pub struct ConflictResolution {
  pub state: usize,
  pub symbol_name: String,
  pub participating_productions: Vec<usize>,
  pub chosen_action: String,
  pub reason: ConflictReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
  /// Shift/reduce resolved by comparing precedence of terminal vs.
  /// production.
  ResolvedByPrecedence,
  /// Shift/reduce resolved by `left`/`right` associativity.
  ResolvedByAssociativity,
  /// Shift/reduce with no precedence information on one or both sides;
  /// the table builder defaults to shift.
  ResolvedByShift,
  /// Reduce/reduce resolved by taking the lower production number.
  ResolvedByProdOrder,
  /// Shift/reduce at equal precedence with no associativity (or a plain
  /// `#assign`) to break the tie — recorded for visibility, but the
  /// table build also raises an `AnalysisError` for this case.
  Unresolved,
}

impl Display for ConflictReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ConflictReason::ResolvedByPrecedence => "resolved by precedence",
      ConflictReason::ResolvedByAssociativity => "resolved by associativity",
      ConflictReason::ResolvedByShift => "resolved by default-shift",
      ConflictReason::ResolvedByProdOrder => "resolved by production order",
      ConflictReason::Unresolved => "unresolved — no associativity to break the tie",
    };
    f.write_str(s)
  }
}

/// Accumulated diagnostic state for one `ReportType`. Doubles as the
/// system's "logging": `notes` are informational trace lines, the way the
/// teacher's `Report` carries timing/debug text rather than going through
/// a separate logging crate.
#[derive(Debug, Clone, Default)]
pub struct Report {
  pub notes: Vec<String>,
  pub conflicts: Vec<ConflictResolution>,
}

impl Report {
  pub fn note(&mut self, msg: impl Into<String>) {
    self.notes.push(msg.into());
  }

  pub fn conflict(&mut self, resolution: ConflictResolution) {
    self.conflicts.push(resolution);
  }
}

/// Renders every collected report as a human-readable table, satisfying
/// a separate optional report artifact.
pub fn render(reports: &[(ReportType, Report)]) -> String {
  let mut out = String::new();
  for (kind, report) in reports {
    if report.notes.is_empty() && report.conflicts.is_empty() {
      continue;
    }
    out.push_str(&format!("== {kind} ==\n"));
    for note in &report.notes {
      out.push_str(&format!("  note: {note}\n"));
    }
    for c in &report.conflicts {
      out.push_str(&format!(
        "  state {} on `{}`: productions {:?} -> {} ({})\n",
        c.state, c.symbol_name, c.participating_productions, c.chosen_action, c.reason
      ));
    }
  }
  out
}
