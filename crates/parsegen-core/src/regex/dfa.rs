//! Subset construction from a Thompson NFA to a byte-level DFA, followed
//! by Hopcroft-style minimization. Acceptance is
//! priority-ordered: when a DFA state's subset contains more than one
//! NFA accept state, the lowest entry index wins.

use super::nfa::Nfa;
use std::collections::{BTreeSet, HashMap, VecDeque};

pub type NfaStateSet = BTreeSet<usize>;

#[derive(Debug, Clone, Default)]
pub struct DfaState {
  /// Byte-class transition rows, kept in the condensed non-overlapping
  /// form subset construction naturally produces: `(lo, hi, target)`.
  pub transitions: Vec<(u8, u8, usize)>,
  pub accept: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Dfa {
  pub states: Vec<DfaState>,
  pub start: usize,
}

fn epsilon_closure(nfa: &Nfa, seeds: &[usize]) -> NfaStateSet {
  let mut closure: NfaStateSet = seeds.iter().copied().collect();
  let mut stack: Vec<usize> = seeds.to_vec();
  while let Some(s) = stack.pop() {
    for &eps in &nfa.states[s].epsilons {
      if closure.insert(eps) {
        stack.push(eps);
      }
    }
  }
  closure
}

/// Picks the lowest entry index among any accepting states in `set`.
fn winning_accept(nfa: &Nfa, set: &NfaStateSet) -> Option<usize> {
  set.iter().filter_map(|&s| nfa.states[s].accept).min()
}

/// Builds the set of byte boundaries at which some transition in `set`
/// starts or ends, so the combined alphabet can be partitioned into
/// maximal non-overlapping byte-class intervals.
fn byte_partition(nfa: &Nfa, set: &NfaStateSet) -> Vec<(u8, u8)> {
  let mut cut_points: BTreeSet<u16> = BTreeSet::new();
  cut_points.insert(0);
  cut_points.insert(256);
  for &s in set {
    for &(lo, hi, _) in &nfa.states[s].byte_trans {
      cut_points.insert(lo as u16);
      cut_points.insert(hi as u16 + 1);
    }
  }
  let points: Vec<u16> = cut_points.into_iter().collect();
  points.windows(2).map(|w| (w[0] as u8, (w[1] - 1) as u8)).collect()
}

/// Runs subset construction over `nfa`, producing one DFA whose states
/// are ε-closed NFA subsets and whose transitions are a byte-class
/// partition of the union of contributing NFA transitions.
pub fn subset_construction(nfa: &Nfa) -> Dfa {
  let start_set = epsilon_closure(nfa, &[nfa.start]);
  let mut state_ids: HashMap<NfaStateSet, usize> = HashMap::new();
  let mut states: Vec<DfaState> = Vec::new();
  let mut queue: VecDeque<NfaStateSet> = VecDeque::new();

  state_ids.insert(start_set.clone(), 0);
  states.push(DfaState::default());
  queue.push_back(start_set);

  while let Some(set) = queue.pop_front() {
    let id = state_ids[&set];
    states[id].accept = winning_accept(nfa, &set);

    for (lo, hi) in byte_partition(nfa, &set) {
      let mut targets: Vec<usize> = Vec::new();
      for &s in &set {
        for &(tlo, thi, target) in &nfa.states[s].byte_trans {
          if tlo <= lo && hi <= thi {
            targets.push(target);
          }
        }
      }
      if targets.is_empty() {
        continue;
      }
      let closure = epsilon_closure(nfa, &targets);
      let is_new = !state_ids.contains_key(&closure);
      let target_id = *state_ids.entry(closure.clone()).or_insert_with(|| {
        states.push(DfaState::default());
        states.len() - 1
      });
      if is_new {
        queue.push_back(closure);
      }
      states[id].transitions.push((lo, hi, target_id));
    }
  }
  Dfa { states, start: 0 }
}

/// Hopcroft-style minimization: repeatedly refines an equivalence
/// partition over states until transitions agree within every class.
pub fn minimize(dfa: &Dfa) -> Dfa {
  let n = dfa.states.len();
  if n == 0 {
    return dfa.clone();
  }

  // Initial partition: by accept-label (None, or Some(entry_index)).
  let mut class_of: Vec<usize> = vec![0; n];
  let mut labels: Vec<Option<usize>> = Vec::new();
  for (i, state) in dfa.states.iter().enumerate() {
    let idx = labels.iter().position(|l| *l == state.accept).unwrap_or_else(|| {
      labels.push(state.accept);
      labels.len() - 1
    });
    class_of[i] = idx;
  }

  loop {
    let mut refined: Vec<usize> = vec![0; n];
    let num_classes = class_of.iter().copied().max().unwrap_or(0) + 1;
    let mut next_class_id = 0;
    let mut signature_to_class: HashMap<(usize, Vec<(u8, u8, usize)>), usize> = HashMap::new();

    for cls in 0..num_classes {
      let members: Vec<usize> = (0..n).filter(|&i| class_of[i] == cls).collect();
      for &i in &members {
        let sig: Vec<(u8, u8, usize)> =
          dfa.states[i].transitions.iter().map(|&(lo, hi, t)| (lo, hi, class_of[t])).collect();
        let key = (cls, sig);
        let id = *signature_to_class.entry(key).or_insert_with(|| {
          let id = next_class_id;
          next_class_id += 1;
          id
        });
        refined[i] = id;
      }
    }

    if refined == class_of {
      break;
    }
    class_of = refined;
  }

  let num_classes = class_of.iter().copied().max().unwrap_or(0) + 1;
  let mut new_states: Vec<DfaState> = vec![DfaState::default(); num_classes];
  let mut seen: Vec<bool> = vec![false; num_classes];
  for i in 0..n {
    let cls = class_of[i];
    if seen[cls] {
      continue;
    }
    seen[cls] = true;
    new_states[cls].accept = dfa.states[i].accept;
    new_states[cls].transitions = dfa.states[i].transitions.iter().map(|&(lo, hi, t)| (lo, hi, class_of[t])).collect();
  }
  Dfa { states: new_states, start: class_of[dfa.start] }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::regex::nfa::build_combined;
  use crate::regex::parser::parse_pattern;
  use crate::regex::unicode::BuiltinProperties;

  #[test]
  fn subset_construction_accepts_matching_input() {
    let node = parse_pattern("ab").unwrap();
    let nfa = build_combined(&[(0, node)], &BuiltinProperties).unwrap();
    let dfa = subset_construction(&nfa);
    let mut state = dfa.start;
    for byte in b"ab" {
      let next = dfa.states[state].transitions.iter().find(|&&(lo, hi, _)| lo <= *byte && *byte <= hi).map(|&(_, _, t)| t);
      state = next.expect("transition should exist");
    }
    assert_eq!(dfa.states[state].accept, Some(0));
  }

  #[test]
  fn minimization_preserves_acceptance() {
    let node = parse_pattern("a|b").unwrap();
    let nfa = build_combined(&[(0, node)], &BuiltinProperties).unwrap();
    let dfa = subset_construction(&nfa);
    let min = minimize(&dfa);
    for byte in [b'a', b'b'] {
      let next = min.states[min.start].transitions.iter().find(|&&(lo, hi, _)| lo <= byte && byte <= hi).map(|&(_, _, t)| t);
      let target = next.expect("transition should exist");
      assert_eq!(min.states[target].accept, Some(0));
    }
  }

  #[test]
  fn priority_ordering_picks_lowest_entry_index_on_tie() {
    let a = parse_pattern("a").unwrap();
    let b = parse_pattern("a").unwrap();
    let nfa = build_combined(&[(5, a), (1, b)], &BuiltinProperties).unwrap();
    let dfa = subset_construction(&nfa);
    let target = dfa.states[dfa.start].transitions.iter().find(|&&(lo, hi, _)| lo <= b'a' && b'a' <= hi).map(|&(_, _, t)| t).unwrap();
    assert_eq!(dfa.states[target].accept, Some(1));
  }
}
