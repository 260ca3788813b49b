//! Regex-to-DFA compilation pipeline: parse → resolve
//! fragments → Thompson NFA → subset construction → minimization.

pub mod ast;
pub mod dfa;
pub mod nfa;
pub mod parser;
pub mod unicode;

use crate::error::GeneratorError;
use ast::Node;
use dfa::Dfa;
use std::collections::HashMap;
use unicode::PropertyTable;

/// One named pattern contributing an accepting path to a combined DFA,
/// tagged with the entry index that decides priority on ties.
pub struct PatternEntry {
  pub entry_index: usize,
  pub pattern: Node,
}

/// Runs the full pipeline for a set of patterns that share one fragment
/// namespace (typically: every kind defined in a single lexer mode).
/// Fragment references are resolved against `fragments` before Thompson
/// construction; the result is priority-ordered by `entry_index`.
pub fn compile_patterns(
  entries: &[PatternEntry],
  fragments: &HashMap<String, Node>,
  props: &dyn PropertyTable,
) -> Result<Dfa, GeneratorError> {
  let mut resolved = Vec::with_capacity(entries.len());
  for entry in entries {
    let node = nfa::resolve_fragments(&entry.pattern, fragments)?;
    resolved.push((entry.entry_index, node));
  }
  let nfa = nfa::build_combined(&resolved, props)?;
  let raw = dfa::subset_construction(&nfa);
  Ok(dfa::minimize(&raw))
}

/// Parses and compiles a single pattern string in one step, with no
/// fragment namespace — convenient for ad hoc single-pattern matching
/// (e.g. validating one literal terminal's spelling).
pub fn compile_single(pattern_src: &str, props: &dyn PropertyTable) -> Result<Dfa, GeneratorError> {
  let node = parser::parse_pattern(pattern_src)?;
  let entries = [PatternEntry { entry_index: 0, pattern: node }];
  compile_patterns(&entries, &HashMap::new(), props)
}

#[cfg(test)]
mod tests {
  use super::*;
  use unicode::BuiltinProperties;

  #[test]
  fn compiles_and_matches_single_pattern() {
    let dfa = compile_single("[a-z]+", &BuiltinProperties).unwrap();
    let mut state = dfa.start;
    for byte in b"hello" {
      let next = dfa.states[state].transitions.iter().find(|&&(lo, hi, _)| lo <= *byte && *byte <= hi).map(|&(_, _, t)| t);
      state = next.expect("transition should exist for lowercase byte");
    }
    assert_eq!(dfa.states[state].accept, Some(0));
  }

  #[test]
  fn fragment_namespace_is_shared_across_patterns() {
    let mut fragments = HashMap::new();
    fragments.insert("digit".to_string(), parser::parse_pattern("[0-9]").unwrap());
    let entries = vec![
      PatternEntry { entry_index: 0, pattern: parser::parse_pattern("\\f{digit}+").unwrap() },
      PatternEntry { entry_index: 1, pattern: parser::parse_pattern("[a-z]+").unwrap() },
    ];
    let dfa = compile_patterns(&entries, &fragments, &BuiltinProperties).unwrap();
    assert!(!dfa.states.is_empty());
  }
}
