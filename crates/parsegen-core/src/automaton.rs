//! LR automaton: LR(0) closure/goto construction, FIRST/FOLLOW,
//! and LALR(1) lookahead propagation (with SLR(1) as a fallback), run
//! on a worklist until no further lookahead changes propagate.

use crate::grammar::Grammar;
use crate::journal::config::GrammarClass;
use crate::symbol::SymbolId;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// (production number, dot position, lookahead set). Two items are equal
/// iff their triples coincide; a kernel's identity is the sorted set of
/// its (production, dot) pairs, independent of lookahead — lookaheads
/// are merged onto a state once its kernel is matched.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
  pub production: u32,
  pub dot: u32,
}

pub type LookaheadSet = BTreeSet<SymbolId>;

#[derive(Debug, Clone, Default)]
pub struct State {
  pub number: u32,
  /// Kernel items, sorted; defines the state's identity.
  pub kernel: Vec<Item>,
  pub lookaheads: HashMap<Item, LookaheadSet>,
  pub shifts: BTreeMap<SymbolId, u32>,
  pub gotos: BTreeMap<SymbolId, u32>,
  /// Items complete (dot at end of RHS), each with its resolved
  /// lookahead set, ready for reduce-entry population.
  pub reduce_items: Vec<Item>,
}

#[derive(Debug, Clone)]
pub struct Automaton {
  pub states: Vec<State>,
}

/// FIRST sets over every symbol (terminals map to themselves).
pub struct FirstSets {
  pub sets: HashMap<SymbolId, BTreeSet<SymbolId>>,
  pub nullable: BTreeSet<SymbolId>,
}

pub fn compute_first_sets(grammar: &Grammar) -> FirstSets {
  let mut sets: HashMap<SymbolId, BTreeSet<SymbolId>> = HashMap::new();
  let mut nullable: BTreeSet<SymbolId> = BTreeSet::new();

  for sym in grammar.symbols.iter() {
    if sym.is_terminal() {
      sets.entry(sym.id).or_default().insert(sym.id);
    }
  }

  let mut changed = true;
  while changed {
    changed = false;
    for prod in &grammar.productions {
      if prod.is_epsilon() && nullable.insert(prod.lhs) {
        changed = true;
      }
      let mut all_nullable_so_far = true;
      for &sym in &prod.rhs {
        if !all_nullable_so_far {
          break;
        }
        let sym_first: Vec<SymbolId> = sets.get(&sym).cloned().unwrap_or_default().into_iter().collect();
        let entry = sets.entry(prod.lhs).or_default();
        for f in sym_first {
          if entry.insert(f) {
            changed = true;
          }
        }
        if !nullable.contains(&sym) {
          all_nullable_so_far = false;
        }
      }
      if all_nullable_so_far && !prod.rhs.is_empty() && nullable.insert(prod.lhs) {
        changed = true;
      }
    }
  }

  FirstSets { sets, nullable }
}

/// FIRST of a symbol string followed by a trailing lookahead symbol used
/// when the string is fully nullable.
fn first_of_sequence(first: &FirstSets, seq: &[SymbolId], trailing: &LookaheadSet) -> BTreeSet<SymbolId> {
  let mut out = BTreeSet::new();
  let mut all_nullable = true;
  for &sym in seq {
    if let Some(f) = first.sets.get(&sym) {
      out.extend(f.iter().copied());
    }
    if !first.nullable.contains(&sym) {
      all_nullable = false;
      break;
    }
  }
  if all_nullable {
    out.extend(trailing.iter().copied());
  }
  out
}

pub fn compute_follow_sets(grammar: &Grammar, first: &FirstSets) -> HashMap<SymbolId, BTreeSet<SymbolId>> {
  let mut follow: HashMap<SymbolId, BTreeSet<SymbolId>> = HashMap::new();
  follow.entry(grammar.start_symbol).or_default().insert(grammar.symbols.eof());

  let mut changed = true;
  while changed {
    changed = false;
    for prod in &grammar.productions {
      for (i, &sym) in prod.rhs.iter().enumerate() {
        if grammar.symbols.get(sym).is_terminal() {
          continue;
        }
        let rest = &prod.rhs[i + 1..];
        let trailing = follow.get(&prod.lhs).cloned().unwrap_or_default();
        let additions = first_of_sequence(first, rest, &trailing);
        let entry = follow.entry(sym).or_default();
        for a in additions {
          if entry.insert(a) {
            changed = true;
          }
        }
      }
    }
  }
  follow
}

fn closure(grammar: &Grammar, items: &BTreeMap<Item, LookaheadSet>, first: &FirstSets, use_lookaheads: bool) -> BTreeMap<Item, LookaheadSet> {
  let mut result = items.clone();
  let mut queue: VecDeque<Item> = items.keys().cloned().collect();

  while let Some(item) = queue.pop_front() {
    let prod = &grammar.productions[item.production as usize];
    if (item.dot as usize) >= prod.rhs.len() {
      continue;
    }
    let sym = prod.rhs[item.dot as usize];
    if grammar.symbols.get(sym).is_terminal() {
      continue;
    }
    let lookaheads = result.get(&item).cloned().unwrap_or_default();
    let rest = &prod.rhs[item.dot as usize + 1..];

    for (pnum, candidate) in grammar.productions.iter().enumerate() {
      if candidate.lhs != sym {
        continue;
      }
      let new_item = Item { production: pnum as u32, dot: 0 };
      let new_lookaheads = if use_lookaheads {
        first_of_sequence(first, rest, &lookaheads)
      } else {
        BTreeSet::new()
      };
      let entry = result.entry(new_item.clone()).or_default();
      let before = entry.len();
      entry.extend(new_lookaheads);
      if entry.len() != before || before == 0 {
        queue.push_back(new_item);
      }
    }
  }
  result
}

fn goto(grammar: &Grammar, items: &BTreeMap<Item, LookaheadSet>, sym: SymbolId, first: &FirstSets, use_lookaheads: bool) -> BTreeMap<Item, LookaheadSet> {
  let mut moved: BTreeMap<Item, LookaheadSet> = BTreeMap::new();
  for (item, la) in items {
    let prod = &grammar.productions[item.production as usize];
    if (item.dot as usize) < prod.rhs.len() && prod.rhs[item.dot as usize] == sym {
      let advanced = Item { production: item.production, dot: item.dot + 1 };
      moved.entry(advanced).or_default().extend(la.iter().copied());
    }
  }
  closure(grammar, &moved, first, use_lookaheads)
}

fn kernel_key(items: &BTreeMap<Item, LookaheadSet>, grammar: &Grammar) -> Vec<Item> {
  items
    .keys()
    .filter(|item| item.dot > 0 || grammar.productions[item.production as usize].lhs == grammar.augmented_start)
    .cloned()
    .collect()
}

/// Builds the LR(0)/LALR(1) automaton. `class` selects whether reduce
/// lookaheads come from channel-propagated LALR(1) sets or the coarser
/// FOLLOW(LHS) fallback (SLR(1)).
pub fn build_automaton(grammar: &Grammar, class: GrammarClass) -> Automaton {
  let use_lalr = matches!(class, GrammarClass::Lalr1 | GrammarClass::Lalr1WithSlr1Fallback);
  let first = compute_first_sets(grammar);
  let follow = compute_follow_sets(grammar, &first);

  let mut start_items: BTreeMap<Item, LookaheadSet> = BTreeMap::new();
  let mut start_la = BTreeSet::new();
  start_la.insert(grammar.symbols.eof());
  start_items.insert(Item { production: 0, dot: 0 }, start_la);
  let start_closure = closure(grammar, &start_items, &first, use_lalr);

  let mut kernel_to_state: HashMap<Vec<Item>, u32> = HashMap::new();
  let mut closures: Vec<BTreeMap<Item, LookaheadSet>> = Vec::new();
  let mut queue: VecDeque<u32> = VecDeque::new();

  let start_key = kernel_key(&start_closure, grammar);
  kernel_to_state.insert(start_key, 0);
  closures.push(start_closure);
  queue.push_back(0);

  let mut transitions: Vec<BTreeMap<SymbolId, u32>> = vec![BTreeMap::new()];

  while let Some(state_id) = queue.pop_front() {
    let items = closures[state_id as usize].clone();
    let mut symbols_seen: BTreeSet<SymbolId> = BTreeSet::new();
    for item in items.keys() {
      let prod = &grammar.productions[item.production as usize];
      if (item.dot as usize) < prod.rhs.len() {
        symbols_seen.insert(prod.rhs[item.dot as usize]);
      }
    }

    for sym in symbols_seen {
      let next_closure = goto(grammar, &items, sym, &first, use_lalr);
      if next_closure.is_empty() {
        continue;
      }
      let key = kernel_key(&next_closure, grammar);
      let next_id = *kernel_to_state.entry(key).or_insert_with(|| {
        closures.push(next_closure.clone());
        transitions.push(BTreeMap::new());
        let id = (closures.len() - 1) as u32;
        queue.push_back(id);
        id
      });
      // Merge lookaheads into an already-discovered state sharing this
      // kernel (LALR(1) state merging). A merge that actually grows a
      // lookahead set must re-expand that state so the new lookaheads
      // propagate onward — this is what drives the whole automaton to
      // the Knuth/DeRemer fixed point.
      if use_lalr {
        let target = &mut closures[next_id as usize];
        let mut grew = false;
        for (item, la) in &next_closure {
          let entry = target.entry(item.clone()).or_default();
          let before = entry.len();
          entry.extend(la.iter().copied());
          if entry.len() != before {
            grew = true;
          }
        }
        if grew {
          queue.push_back(next_id);
        }
      }
      transitions[state_id as usize].insert(sym, next_id);
    }
  }

  let mut states = Vec::with_capacity(closures.len());
  for (id, items) in closures.into_iter().enumerate() {
    let kernel = kernel_key(&items, grammar);
    let mut shifts = BTreeMap::new();
    let mut gotos = BTreeMap::new();
    for (&sym, &target) in &transitions[id] {
      if grammar.symbols.get(sym).is_terminal() {
        shifts.insert(sym, target);
      } else {
        gotos.insert(sym, target);
      }
    }

    let mut lookaheads: HashMap<Item, LookaheadSet> = HashMap::new();
    let mut reduce_items = Vec::new();
    for (item, la) in &items {
      let prod = &grammar.productions[item.production as usize];
      if (item.dot as usize) == prod.rhs.len() {
        reduce_items.push(item.clone());
        let resolved = if use_lalr { la.clone() } else { follow.get(&prod.lhs).cloned().unwrap_or_default() };
        lookaheads.insert(item.clone(), resolved);
      }
    }

    states.push(State { number: id as u32, kernel, lookaheads, shifts, gotos, reduce_items });
  }

  Automaton { states }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::ast::*;
  use crate::journal::config::GeneratorConfig;
  use crate::journal::Journal;
  use crate::regex::unicode::BuiltinProperties;

  fn expr_grammar() -> Grammar {
    let ast = GrammarAst {
      name: "expr".into(),
      start: Some("expr".into()),
      precedence_blocks: vec![],
      productions: vec![ProductionAst {
        lhs: "expr".into(),
        alternatives: vec![
          AlternativeAst { symbols: vec![SymbolRefAst::nonterminal("expr"), SymbolRefAst::terminal("plus"), SymbolRefAst::nonterminal("expr")], ..Default::default() },
          AlternativeAst { symbols: vec![SymbolRefAst::terminal("int")], ..Default::default() },
        ],
      }],
      lexical_productions: vec![
        LexicalProductionAst { name: "plus".into(), pattern_src: "\\+".into(), ..Default::default() },
        LexicalProductionAst { name: "int".into(), pattern_src: "[0-9]+".into(), ..Default::default() },
      ],
      fragments: vec![],
    };
    let mut journal = Journal::new(GeneratorConfig::new());
    crate::grammar::build(&ast, &mut journal, &BuiltinProperties).unwrap()
  }

  #[test]
  fn state_zero_has_kernel_of_augmented_start() {
    let grammar = expr_grammar();
    let automaton = build_automaton(&grammar, GrammarClass::Lalr1);
    assert_eq!(automaton.states[0].kernel, vec![Item { production: 0, dot: 0 }]);
  }

  #[test]
  fn automaton_has_shift_and_reduce_states() {
    let grammar = expr_grammar();
    let automaton = build_automaton(&grammar, GrammarClass::Lalr1);
    assert!(automaton.states.iter().any(|s| !s.shifts.is_empty()));
    assert!(automaton.states.iter().any(|s| !s.reduce_items.is_empty()));
  }

  #[test]
  fn slr1_uses_follow_sets_for_reduce_lookaheads() {
    let grammar = expr_grammar();
    let automaton = build_automaton(&grammar, GrammarClass::Slr1);
    let has_reduce_on_eof = automaton.states.iter().any(|s| s.reduce_items.iter().any(|item| {
      s.lookaheads.get(item).map(|la| la.contains(&grammar.symbols.eof())).unwrap_or(false)
    }));
    assert!(has_reduce_on_eof);
  }
}
