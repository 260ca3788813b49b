//! Lowers a [`GrammarAst`] to a [`Grammar`]: interns symbols, numbers
//! productions (augmented start first), propagates precedence from
//! `#prec` blocks, and reports grammar-lowering diagnostics.

use super::ast::{AssocDirective, GrammarAst};
use super::types::{Grammar, Production};
use crate::error::{ctor, GeneratorError, GeneratorResult, Span};
use crate::journal::config::PrecedenceOrder;
use crate::journal::Journal;
use crate::lexspec::{LexicalSpec, ModeTransition};
use crate::regex::unicode::PropertyTable;
use crate::symbol::{Associativity, SymbolId, SymbolKind, SymbolTable};
use std::collections::{HashMap, HashSet};

pub fn build(ast: &GrammarAst, journal: &mut Journal, props: &dyn PropertyTable) -> GeneratorResult<Grammar> {
  let mut errors = Vec::new();
  let mut symbols = SymbolTable::new();

  for p in &ast.productions {
    symbols.intern(&p.lhs, SymbolKind::NonTerminal);
  }

  let lexical_spec = lower_lexical(ast, &mut symbols, props, &mut errors);
  apply_precedence(ast, &mut symbols, journal.config().precedence_order);

  let start_name = ast.start.clone().or_else(|| ast.productions.first().map(|p| p.lhs.clone()));
  let start_symbol = match start_name {
    Some(name) => symbols.intern(&name, SymbolKind::NonTerminal),
    None => {
      errors.push(ctor::undefined_symbol(Span::default(), "grammar has no productions to derive a start symbol from"));
      return Err(errors);
    }
  };
  let augmented_start = symbols.add_augmented_start("S'");

  let mut productions = vec![Production {
    number: 0,
    lhs: augmented_start,
    rhs: vec![start_symbol],
    precedence: 0,
    associativity: Associativity::None,
    recover: false,
    ast_rewrite: None,
  }];

  let mut seen_alternatives: HashSet<(SymbolId, Vec<SymbolId>)> = HashSet::new();
  let mut used_terminals: HashSet<SymbolId> = HashSet::new();
  let mut defined_nonterminals: HashSet<SymbolId> = HashSet::new();
  let mut number = 1u32;

  for p in &ast.productions {
    let lhs = symbols.lookup(&p.lhs).expect("interned in first pass");
    defined_nonterminals.insert(lhs);

    for alt in &p.alternatives {
      let mut rhs = Vec::with_capacity(alt.symbols.len());
      let mut labels: HashSet<&str> = HashSet::new();

      for (i, sym_ref) in alt.symbols.iter().enumerate() {
        if sym_ref.name == "error" {
          if i != 0 || !alt.recover {
            errors.push(ctor::reserved_symbol_used(
              Span::default(),
              format!("`error` used outside a `#recover` alternative's first position, in production `{}`", p.lhs),
            ));
          }
          rhs.push(symbols.error_symbol());
          continue;
        }
        if let Some(label) = &sym_ref.label {
          if !labels.insert(label.as_str()) {
            errors.push(ctor::label_collision(Span::default(), format!("label `@{label}` used twice in one alternative of `{}`", p.lhs)));
          }
        }
        let id = if sym_ref.is_terminal {
          let id = symbols.intern(&sym_ref.name, SymbolKind::Terminal);
          used_terminals.insert(id);
          id
        } else {
          let id = symbols.intern(&sym_ref.name, SymbolKind::NonTerminal);
          id
        };
        rhs.push(id);
      }

      if let Some(rewrite) = &alt.ast_rewrite {
        for &entry in rewrite {
          let idx = entry.unsigned_abs() as usize;
          if idx == 0 || idx > rhs.len() {
            errors.push(ctor::invalid_ast_reference(
              Span::default(),
              format!("`#ast` index {entry} is out of bounds for a {}-symbol alternative of `{}`", rhs.len(), p.lhs),
            ));
          }
        }
      }

      if !seen_alternatives.insert((lhs, rhs.clone())) {
        errors.push(ctor::duplicate_alternative(Span::default(), format!("`{}` has two identical alternatives", p.lhs)));
      }

      let (precedence, associativity) = match &alt.prec_symbol {
        Some(name) => match symbols.lookup(name) {
          Some(id) => {
            let sym = symbols.get(id);
            (sym.precedence, sym.associativity)
          }
          None => (0, Associativity::None),
        },
        None => (0, Associativity::None),
      };

      productions.push(Production {
        number,
        lhs,
        rhs,
        precedence,
        associativity,
        recover: alt.recover,
        ast_rewrite: alt.ast_rewrite.clone(),
      });
      number += 1;
    }
  }

  for sym in symbols.iter() {
    if sym.kind == SymbolKind::NonTerminal && !defined_nonterminals.contains(&sym.id) {
      errors.push(ctor::undefined_symbol(Span::default(), format!("non-terminal `{}` is referenced but never defined", sym.name)));
    }
  }
  for kind in &lexical_spec.kinds {
    if kind.fragment {
      continue;
    }
    let id = symbols.lookup(&kind.name);
    if let Some(id) = id {
      if kind.skip && used_terminals.contains(&id) {
        errors.push(ctor::skip_on_used_terminal(Span::default(), format!("terminal `{}` is both `#skip` and referenced by a production", kind.name)));
      }
      if !kind.skip && !used_terminals.contains(&id) {
        errors.push(ctor::unused_symbol(Span::default(), format!("terminal `{}` is defined but never referenced", kind.name)));
      }
    }
  }

  if !errors.is_empty() {
    return Err(errors);
  }

  Ok(Grammar { name: ast.name.clone(), symbols, productions, lexical_spec, start_symbol, augmented_start })
}

fn lower_lexical(ast: &GrammarAst, symbols: &mut SymbolTable, props: &dyn PropertyTable, errors: &mut Vec<GeneratorError>) -> LexicalSpec {
  let _ = props;
  let mut spec = LexicalSpec::new();

  for frag in &ast.fragments {
    if let Err(mut e) = spec.add_fragment(&frag.name, &frag.pattern_src) {
      errors.append(&mut e);
    }
  }

  let mut kind_ids: HashMap<String, u32> = HashMap::new();
  for lp in &ast.lexical_productions {
    if lp.name == "error" || lp.name == "{EOF}" {
      errors.push(ctor::reserved_symbol_used(Span::default(), format!("lexical kind cannot use the reserved name `{}`", lp.name)));
      continue;
    }
    symbols.intern(&lp.name, SymbolKind::Terminal);
    let transition = if lp.pop {
      ModeTransition::Pop
    } else if lp.push_mode.is_some() {
      // Resolved to a concrete ModeId once every mode name is known, below.
      ModeTransition::None
    } else {
      ModeTransition::None
    };
    match spec.add_kind(&lp.name, &lp.pattern_src, lp.skip, transition) {
      Ok(id) => {
        kind_ids.insert(lp.name.clone(), id);
      }
      Err(mut e) => errors.append(&mut e),
    }
  }

  let mut mode_order: Vec<String> = vec!["default".to_string()];
  for lp in &ast.lexical_productions {
    for m in &lp.modes {
      if !mode_order.contains(m) {
        mode_order.push(m.clone());
      }
    }
    if let Some(target) = &lp.push_mode {
      if !mode_order.contains(target) {
        mode_order.push(target.clone());
      }
    }
  }

  let mut mode_ids: HashMap<String, u32> = HashMap::new();
  for (i, name) in mode_order.iter().enumerate() {
    mode_ids.insert(name.clone(), i as u32);
  }

  for name in &mode_order {
    let kinds: Vec<u32> = ast
      .lexical_productions
      .iter()
      .filter(|lp| {
        if lp.modes.is_empty() {
          name == "default"
        } else {
          lp.modes.iter().any(|m| m == name)
        }
      })
      .filter_map(|lp| kind_ids.get(&lp.name).copied())
      .collect();
    if let Err(mut e) = spec.add_mode(name.clone(), kinds) {
      errors.append(&mut e);
    }
  }

  // Rewrite push transitions now that mode ids are known.
  for lp in &ast.lexical_productions {
    if let Some(target) = &lp.push_mode {
      if let (Some(&kid), Some(&mid)) = (kind_ids.get(&lp.name), mode_ids.get(target)) {
        if let Some(kind) = spec.kinds.iter_mut().find(|k| k.id == kid) {
          kind.transition = ModeTransition::Push(mid);
        }
      }
    }
  }

  spec
}

fn apply_precedence(ast: &GrammarAst, symbols: &mut SymbolTable, order: PrecedenceOrder) {
  let levels: Vec<_> = ast.precedence_blocks.iter().flat_map(|b| b.levels.iter()).collect();
  let total = levels.len();
  for (i, level) in levels.iter().enumerate() {
    let precedence = match order {
      PrecedenceOrder::EarlierIsHigher => (total - i) as u16,
      PrecedenceOrder::EarlierIsLower => (i + 1) as u16,
    };
    let assoc = match level.assoc {
      AssocDirective::Left => Associativity::Left,
      AssocDirective::Right => Associativity::Right,
      AssocDirective::Assign => Associativity::None,
    };
    for name in &level.symbols {
      let id = symbols.intern(name, SymbolKind::Terminal);
      symbols.set_precedence(id, precedence, assoc);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::ast::*;
  use crate::journal::config::GeneratorConfig;
  use crate::regex::unicode::BuiltinProperties;

  fn minimal_ast() -> GrammarAst {
    GrammarAst {
      name: "g".into(),
      start: Some("expr".into()),
      precedence_blocks: vec![],
      productions: vec![ProductionAst {
        lhs: "expr".into(),
        alternatives: vec![AlternativeAst { symbols: vec![SymbolRefAst::terminal("int")], ..Default::default() }],
      }],
      lexical_productions: vec![LexicalProductionAst { name: "int".into(), pattern_src: "[0-9]+".into(), ..Default::default() }],
      fragments: vec![],
    }
  }

  #[test]
  fn builds_augmented_start_as_production_zero() {
    let mut journal = Journal::new(GeneratorConfig::new());
    let grammar = build(&minimal_ast(), &mut journal, &BuiltinProperties).unwrap();
    assert_eq!(grammar.productions[0].number, 0);
    assert_eq!(grammar.productions[0].lhs, grammar.augmented_start);
  }

  #[test]
  fn undefined_nonterminal_is_reported() {
    let mut ast = minimal_ast();
    ast.productions[0].alternatives[0].symbols.push(SymbolRefAst::nonterminal("missing"));
    let mut journal = Journal::new(GeneratorConfig::new());
    let result = build(&ast, &mut journal, &BuiltinProperties);
    assert!(result.is_err());
  }

  #[test]
  fn precedence_block_earlier_is_higher_by_default() {
    let mut ast = minimal_ast();
    ast.precedence_blocks.push(PrecedenceBlock {
      levels: vec![
        PrecedenceLevel { assoc: AssocDirective::Left, symbols: vec!["mul".into()] },
        PrecedenceLevel { assoc: AssocDirective::Left, symbols: vec!["add".into()] },
      ],
    });
    let mut journal = Journal::new(GeneratorConfig::new());
    let grammar = build(&ast, &mut journal, &BuiltinProperties).unwrap();
    let mul = grammar.symbols.lookup("mul").unwrap();
    let add = grammar.symbols.lookup("add").unwrap();
    assert!(grammar.symbols.get(mul).precedence > grammar.symbols.get(add).precedence);
  }
}
