//! Thompson construction: regex AST -> byte-level NFA with one ε-closed
//! accept per alternative. Fragment references must be
//! resolved (`resolve_fragments`) before a tree reaches `build_combined`.

use super::ast::Node;
use super::unicode::{codepoint_range_to_byte_sequences, PropertyTable};
use crate::error::{ctor, GeneratorError, Span};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct NfaState {
  pub epsilons: Vec<usize>,
  /// (lo, hi, target) byte-range transitions.
  pub byte_trans: Vec<(u8, u8, usize)>,
  /// Set exactly on an accepting state; holds the originating pattern's
  /// entry index (lower wins priority ties).
  pub accept: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Nfa {
  pub states: Vec<NfaState>,
  pub start: usize,
}

/// Walks `node`, replacing every `FragmentRef(name)` with a clone of
/// `fragments[name]`'s (already-resolved) tree. Cycles are detected with
/// the standard white/grey/black DFS coloring and reported as
/// `CycleInFragment`.
pub fn resolve_fragments(node: &Node, fragments: &HashMap<String, Node>) -> Result<Node, GeneratorError> {
  let mut resolved = HashMap::new();
  let mut visiting = HashSet::new();
  resolve_inner(node, fragments, &mut visiting, &mut resolved)
}

fn resolve_inner(
  node: &Node,
  fragments: &HashMap<String, Node>,
  visiting: &mut HashSet<String>,
  resolved: &mut HashMap<String, Node>,
) -> Result<Node, GeneratorError> {
  Ok(match node {
    Node::Epsilon => Node::Epsilon,
    Node::CodepointRange(l, h) => Node::CodepointRange(*l, *h),
    Node::Property(n, v) => Node::Property(n.clone(), v.clone()),
    Node::Concat(parts) => {
      Node::Concat(parts.iter().map(|p| resolve_inner(p, fragments, visiting, resolved)).collect::<Result<_, _>>()?)
    }
    Node::Alt(parts) => {
      Node::Alt(parts.iter().map(|p| resolve_inner(p, fragments, visiting, resolved)).collect::<Result<_, _>>()?)
    }
    Node::Star(inner) => Node::Star(Box::new(resolve_inner(inner, fragments, visiting, resolved)?)),
    Node::Plus(inner) => Node::Plus(Box::new(resolve_inner(inner, fragments, visiting, resolved)?)),
    Node::Optional(inner) => Node::Optional(Box::new(resolve_inner(inner, fragments, visiting, resolved)?)),
    Node::FragmentRef(name) => {
      if let Some(cached) = resolved.get(name) {
        return Ok(cached.clone());
      }
      if visiting.contains(name) {
        return Err(ctor::cycle_in_fragment(Span::default(), format!("fragment `{name}` references itself")));
      }
      let target =
        fragments.get(name).ok_or_else(|| ctor::cycle_in_fragment(Span::default(), format!("fragment `{name}` is undefined")))?;
      visiting.insert(name.clone());
      let expanded = resolve_inner(target, fragments, visiting, resolved)?;
      visiting.remove(name);
      resolved.insert(name.clone(), expanded.clone());
      expanded
    }
  })
}

struct Builder<'p> {
  states: Vec<NfaState>,
  props: &'p dyn PropertyTable,
}

impl<'p> Builder<'p> {
  fn new_state(&mut self) -> usize {
    self.states.push(NfaState::default());
    self.states.len() - 1
  }

  fn add_eps(&mut self, from: usize, to: usize) {
    self.states[from].epsilons.push(to);
  }

  fn add_byte(&mut self, from: usize, lo: u8, hi: u8, to: usize) {
    self.states[from].byte_trans.push((lo, hi, to));
  }

  /// Builds a dangling fragment `(start, end)` with no incoming/outgoing
  /// edges beyond what's internal to the fragment — the classic Thompson
  /// construction shape.
  fn build(&mut self, node: &Node) -> Result<(usize, usize), GeneratorError> {
    match node {
      Node::Epsilon => {
        let s = self.new_state();
        let e = self.new_state();
        self.add_eps(s, e);
        Ok((s, e))
      }
      Node::CodepointRange(lo, hi) => self.build_codepoint_range(*lo, *hi),
      Node::Property(name, value) => {
        let ranges = self
          .props
          .resolve(name, value)
          .ok_or_else(|| ctor::invalid_regex(Span::default(), format!("unknown property \\p{{{name}={value}}}")))?;
        let s = self.new_state();
        let e = self.new_state();
        for (lo, hi) in ranges {
          let (rs, re) = self.build_codepoint_range(lo, hi)?;
          self.add_eps(s, rs);
          self.add_eps(re, e);
        }
        Ok((s, e))
      }
      Node::FragmentRef(name) => {
        Err(ctor::cycle_in_fragment(Span::default(), format!("unresolved fragment reference `{name}` reached NFA construction")))
      }
      Node::Concat(parts) => {
        if parts.is_empty() {
          return self.build(&Node::Epsilon);
        }
        let mut iter = parts.iter();
        let (mut s, mut e) = self.build(iter.next().unwrap())?;
        let start = s;
        for part in iter {
          let (ns, ne) = self.build(part)?;
          self.add_eps(e, ns);
          s = ns;
          e = ne;
        }
        Ok((start, e))
      }
      Node::Alt(parts) => {
        let s = self.new_state();
        let e = self.new_state();
        for part in parts {
          let (ps, pe) = self.build(part)?;
          self.add_eps(s, ps);
          self.add_eps(pe, e);
        }
        Ok((s, e))
      }
      Node::Star(inner) => {
        let s = self.new_state();
        let e = self.new_state();
        let (is, ie) = self.build(inner)?;
        self.add_eps(s, is);
        self.add_eps(ie, is);
        self.add_eps(ie, e);
        self.add_eps(s, e);
        Ok((s, e))
      }
      Node::Plus(inner) => {
        let s = self.new_state();
        let e = self.new_state();
        let (is, ie) = self.build(inner)?;
        self.add_eps(s, is);
        self.add_eps(ie, is);
        self.add_eps(ie, e);
        Ok((s, e))
      }
      Node::Optional(inner) => {
        let s = self.new_state();
        let e = self.new_state();
        let (is, ie) = self.build(inner)?;
        self.add_eps(s, is);
        self.add_eps(ie, e);
        self.add_eps(s, e);
        Ok((s, e))
      }
    }
  }

  fn build_codepoint_range(&mut self, lo: u32, hi: u32) -> Result<(usize, usize), GeneratorError> {
    let sequences = codepoint_range_to_byte_sequences(lo, hi);
    let s = self.new_state();
    let e = self.new_state();
    for seq in sequences {
      let mut cur = s;
      for (i, &(blo, bhi)) in seq.iter().enumerate() {
        let next = if i + 1 == seq.len() { e } else { self.new_state() };
        self.add_byte(cur, blo, bhi, next);
        cur = next;
      }
      if seq.is_empty() {
        self.add_eps(s, e);
      }
    }
    Ok((s, e))
  }
}

/// Builds one NFA covering every `(entry_index, pattern)` pair, each
/// pattern's final state tagged with its entry index so the DFA subset
/// construction can later pick the lowest-index winner on ties.
pub fn build_combined(patterns: &[(usize, Node)], props: &dyn PropertyTable) -> Result<Nfa, GeneratorError> {
  let mut builder = Builder { states: Vec::new(), props };
  let start = builder.new_state();
  for (entry_index, pattern) in patterns {
    let (ps, pe) = builder.build(pattern)?;
    builder.add_eps(start, ps);
    builder.states[pe].accept = Some(*entry_index);
  }
  Ok(Nfa { states: builder.states, start })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::regex::parser::parse_pattern;
  use crate::regex::unicode::BuiltinProperties;

  #[test]
  fn single_literal_builds_reachable_accept() {
    let node = parse_pattern("ab").unwrap();
    let nfa = build_combined(&[(0, node)], &BuiltinProperties).unwrap();
    assert!(nfa.states.iter().any(|s| s.accept == Some(0)));
  }

  #[test]
  fn fragment_cycle_is_rejected() {
    let mut fragments = HashMap::new();
    fragments.insert("a".to_string(), Node::FragmentRef("b".to_string()));
    fragments.insert("b".to_string(), Node::FragmentRef("a".to_string()));
    let node = Node::FragmentRef("a".to_string());
    assert!(resolve_fragments(&node, &fragments).is_err());
  }

  #[test]
  fn fragment_expansion_succeeds() {
    let mut fragments = HashMap::new();
    fragments.insert("digit".to_string(), parse_pattern("[0-9]").unwrap());
    let node = parse_pattern("\\f{digit}+").unwrap();
    let resolved = resolve_fragments(&node, &fragments).unwrap();
    let nfa = build_combined(&[(0, resolved)], &BuiltinProperties).unwrap();
    assert!(!nfa.states.is_empty());
  }
}
