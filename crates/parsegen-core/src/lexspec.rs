//! Lexical specification. Models the set of token kinds, their
//! patterns, per-kind flags, and the mode graph, then compiles each mode
//! to an uncompressed DFA bundle. Compression of those
//! bundles into a runtime table is `parsegen_bytecode`'s job.

use crate::error::{ctor, GeneratorError, GeneratorResult, Span};
use crate::regex::ast::Node;
use crate::regex::dfa::Dfa;
use crate::regex::unicode::PropertyTable;
use crate::regex::{compile_patterns, PatternEntry};
use std::collections::HashMap;

/// Lower-cases a kind name and strips underscores, so `MyToken` and
/// `my_token` collide the way spelling-normalized names must.
fn normalize_kind_name(name: &str) -> String {
  name.chars().filter(|&c| c != '_').flat_map(|c| c.to_lowercase()).collect()
}

pub type ModeId = u32;
pub type KindId = u32;

/// One lexical mode: a set of kinds active while the mode is on top of
/// the lexer's mode stack (a push/pop model).
#[derive(Debug, Clone)]
pub struct Mode {
  pub id: ModeId,
  pub name: String,
  pub kinds: Vec<KindId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
  None,
  Push(ModeId),
  Pop,
}

/// One token kind: a compiled pattern plus the directives that control
/// how a match of this kind affects the lexer and the parser that
/// consumes its output.
#[derive(Debug, Clone)]
pub struct Kind {
  pub id: KindId,
  pub name: String,
  pub pattern_src: String,
  pattern: Node,
  /// Matches of this kind are discarded before reaching the parser.
  pub skip: bool,
  /// Never itself matched; only referenced through `\f{name}`.
  pub fragment: bool,
  pub transition: ModeTransition,
}

#[derive(Debug, Clone, Default)]
pub struct LexicalSpec {
  pub modes: Vec<Mode>,
  pub kinds: Vec<Kind>,
  fragments: HashMap<String, Node>,
  spellings: HashMap<String, KindId>,
  /// Normalized kind name -> the kind that claimed it, shared across
  /// every non-default mode so those modes share one name namespace.
  non_default_mode_names: HashMap<String, KindId>,
}

impl LexicalSpec {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a fragment pattern (never itself a matchable kind). Later
  /// fragments may reference earlier ones; cycles surface once a kind
  /// referencing this fragment is compiled.
  pub fn add_fragment(&mut self, name: impl Into<String>, pattern_src: &str) -> GeneratorResult<()> {
    let name = name.into();
    let node = crate::regex::parser::parse_pattern(pattern_src).map_err(|e| vec![e])?;
    self.fragments.insert(name, node);
    Ok(())
  }

  /// Adds a matchable or skip-only kind, spelling-normalizing its source
  /// text (leading/trailing whitespace trimmed) and rejecting a second
  /// kind with the same normalized spelling.
  pub fn add_kind(&mut self, name: impl Into<String>, pattern_src: &str, skip: bool, transition: ModeTransition) -> GeneratorResult<KindId> {
    let name = name.into();
    let spelling = pattern_src.trim().to_string();
    if let Some(&existing) = self.spellings.get(&spelling) {
      return Err(vec![ctor::duplicate_kind(Span::default(), format!(
        "kind `{name}` has the same spelling as kind `{}`",
        self.kinds[existing as usize].name
      ))]);
    }
    let node = crate::regex::parser::parse_pattern(pattern_src).map_err(|e| vec![e])?;
    let id = self.kinds.len() as KindId;
    self.kinds.push(Kind { id, name, pattern_src: pattern_src.to_string(), pattern: node, skip, fragment: false, transition });
    self.spellings.insert(spelling, id);
    Ok(id)
  }

  /// Registers a mode's active kind set, rejecting a normalized-name
  /// (lower-cased, underscores stripped) collision between two distinct
  /// kinds within the mode, and — for any mode other than the implicit
  /// `default` mode — against every other non-default mode, since those
  /// modes share one name namespace. A kind legitimately active in more
  /// than one non-default mode (the same `KindId` recurring) is not a
  /// collision.
  pub fn add_mode(&mut self, name: impl Into<String>, kinds: Vec<KindId>) -> GeneratorResult<ModeId> {
    let name = name.into();
    let is_default = name == "default";
    let mut seen_in_mode: HashMap<String, KindId> = HashMap::new();

    for &kid in &kinds {
      let kind_name = &self.kinds[kid as usize].name;
      let normalized = normalize_kind_name(kind_name);

      if let Some(&other) = seen_in_mode.get(&normalized) {
        if other != kid {
          return Err(vec![ctor::spelling_collision(
            Span::default(),
            format!("kind `{kind_name}` collides with `{}` in mode `{name}` after name normalization (`{normalized}`)", self.kinds[other as usize].name),
          )]);
        }
      } else {
        seen_in_mode.insert(normalized.clone(), kid);
      }

      if !is_default {
        if let Some(&other) = self.non_default_mode_names.get(&normalized) {
          if other != kid {
            return Err(vec![ctor::spelling_collision(
              Span::default(),
              format!(
                "kind `{kind_name}` in mode `{name}` normalizes to `{normalized}`, already claimed by `{}` in another non-default mode",
                self.kinds[other as usize].name
              ),
            )]);
          }
        }
      }
    }

    if !is_default {
      for &kid in &kinds {
        let normalized = normalize_kind_name(&self.kinds[kid as usize].name);
        self.non_default_mode_names.insert(normalized, kid);
      }
    }

    let id = self.modes.len() as ModeId;
    self.modes.push(Mode { id, name, kinds });
    Ok(id)
  }

  /// Compiles every mode's active kinds into one priority-ordered DFA.
  /// Entry index equals the kind's declaration order within the mode,
  /// which is also the lowest-index-wins tie-break priority requires.
  pub fn compile_modes(&self, props: &dyn PropertyTable) -> GeneratorResult<HashMap<ModeId, Dfa>> {
    let mut out = HashMap::new();
    let mut errors = Vec::new();
    for mode in &self.modes {
      let entries: Vec<PatternEntry> = mode
        .kinds
        .iter()
        .enumerate()
        .map(|(i, &kid)| PatternEntry { entry_index: i, pattern: self.kinds[kid as usize].pattern.clone() })
        .collect();
      match compile_patterns(&entries, &self.fragments, props) {
        Ok(dfa) => {
          out.insert(mode.id, dfa);
        }
        Err(e) => errors.push(e),
      }
    }
    if errors.is_empty() {
      Ok(out)
    } else {
      Err(errors)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::regex::unicode::BuiltinProperties;

  #[test]
  fn duplicate_spelling_is_rejected() {
    let mut spec = LexicalSpec::new();
    spec.add_kind("plus", "\\+", false, ModeTransition::None).unwrap();
    let err = spec.add_kind("plus_again", "\\+", false, ModeTransition::None);
    assert!(err.is_err());
  }

  #[test]
  fn mode_compiles_to_priority_ordered_dfa() {
    let mut spec = LexicalSpec::new();
    let kw = spec.add_kind("kw_if", "if", false, ModeTransition::None).unwrap();
    let id = spec.add_kind("ident", "[a-z]+", false, ModeTransition::None).unwrap();
    spec.add_mode("default", vec![kw, id]).unwrap();
    let dfas = spec.compile_modes(&BuiltinProperties).unwrap();
    assert_eq!(dfas.len(), 1);
  }

  #[test]
  fn fragment_shared_across_kinds_in_same_mode() {
    let mut spec = LexicalSpec::new();
    spec.add_fragment("digit", "[0-9]").unwrap();
    let int_kind = spec.add_kind("int", "\\f{digit}+", false, ModeTransition::None).unwrap();
    spec.add_mode("default", vec![int_kind]).unwrap();
    assert!(spec.compile_modes(&BuiltinProperties).is_ok());
  }

  #[test]
  fn normalized_name_collision_within_a_mode_is_rejected() {
    let mut spec = LexicalSpec::new();
    let a = spec.add_kind("MyToken", "a", false, ModeTransition::None).unwrap();
    let b = spec.add_kind("my_token", "b", false, ModeTransition::None).unwrap();
    let err = spec.add_mode("default", vec![a, b]);
    assert!(err.is_err());
  }

  #[test]
  fn normalized_name_collision_across_non_default_modes_is_rejected() {
    let mut spec = LexicalSpec::new();
    let a = spec.add_kind("StrStart", "a", false, ModeTransition::None).unwrap();
    let b = spec.add_kind("str_start", "b", false, ModeTransition::None).unwrap();
    spec.add_mode("string", vec![a]).unwrap();
    let err = spec.add_mode("interp", vec![b]);
    assert!(err.is_err());
  }

  #[test]
  fn same_kind_reused_across_non_default_modes_is_not_a_collision() {
    let mut spec = LexicalSpec::new();
    let shared = spec.add_kind("ws", "[ ]+", true, ModeTransition::None).unwrap();
    spec.add_mode("string", vec![shared]).unwrap();
    let result = spec.add_mode("interp", vec![shared]);
    assert!(result.is_ok());
  }

  #[test]
  fn default_mode_is_exempt_from_the_cross_mode_namespace() {
    let mut spec = LexicalSpec::new();
    let a = spec.add_kind("plus", "\\+", false, ModeTransition::None).unwrap();
    let b = spec.add_kind("Plus", "\\+\\+", false, ModeTransition::None).unwrap();
    spec.add_mode("default", vec![a]).unwrap();
    // Non-default modes still collide with each other, but "default"
    // never registers into the shared non-default namespace, so this
    // call below only fails if it collides within "other" itself.
    let result = spec.add_mode("other", vec![b]);
    assert!(result.is_ok());
  }
}
