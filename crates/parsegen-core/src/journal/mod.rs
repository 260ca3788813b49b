//! The journal is the source of truth for configuring one compilation run
//! and for tracking and reporting diagnostics that occur during it: a
//! `Journal` owns per-stage `Report`s and the accumulated batch of every
//! compile-time error.

pub mod config;
pub mod report;

pub use config::{CompressionLevel, GeneratorConfig, GrammarClass, PrecedenceOrder};
pub use report::{render, ConflictReason, ConflictResolution, Report, ReportType};

use crate::error::GeneratorError;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct Journal {
  config: GeneratorConfig,
  errors: Vec<GeneratorError>,
  reports: BTreeMap<ReportType, Report>,
}

impl Journal {
  pub fn new(config: GeneratorConfig) -> Self {
    Self { config, errors: Vec::new(), reports: BTreeMap::new() }
  }

  pub fn config(&self) -> &GeneratorConfig {
    &self.config
  }

  pub fn add_error(&mut self, error: GeneratorError) {
    #[cfg(feature = "auto_print_errors")]
    eprintln!("{error}");
    self.errors.push(error);
  }

  pub fn has_errors(&self) -> bool {
    !self.errors.is_empty()
  }

  pub fn errors(&self) -> &[GeneratorError] {
    &self.errors
  }

  pub fn into_errors(self) -> Vec<GeneratorError> {
    self.errors
  }

  pub fn report_mut(&mut self, kind: ReportType) -> &mut Report {
    self.reports.entry(kind).or_default()
  }

  pub fn note(&mut self, kind: ReportType, msg: impl Into<String>) {
    if self.config.report {
      self.report_mut(kind).note(msg);
    }
  }

  pub fn conflict(&mut self, kind: ReportType, resolution: ConflictResolution) {
    if self.config.report {
      self.report_mut(kind).conflict(resolution);
    }
  }

  /// Renders every report gathered during this run, or `None` when
  /// `GeneratorConfig::report` was disabled.
  pub fn render_report(&self) -> Option<String> {
    if !self.config.report {
      return None;
    }
    let entries: Vec<_> = self.reports.iter().map(|(k, v)| (*k, v.clone())).collect();
    Some(render(&entries))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::{ctor, ErrorCategory};

  #[test]
  fn batches_errors_without_early_return() {
    let mut j = Journal::new(GeneratorConfig::new());
    j.add_error(ctor::undefined_symbol(Default::default(), "foo"));
    j.add_error(ctor::unused_symbol(Default::default(), "bar"));
    assert!(j.has_errors());
    assert_eq!(j.errors().len(), 2);
    assert_eq!(j.errors()[0].id.category, ErrorCategory::Grammar);
  }

  #[test]
  fn report_renders_only_when_enabled() {
    let mut j = Journal::new(GeneratorConfig::new().report(false));
    j.note(ReportType::Automaton, "built 4 states");
    assert!(j.render_report().is_none());

    let mut j = Journal::new(GeneratorConfig::new().report(true));
    j.note(ReportType::Automaton, "built 4 states");
    assert!(j.render_report().unwrap().contains("built 4 states"));
  }
}
