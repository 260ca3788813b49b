//! Tree builder: default CST/AST node construction from shift and
//! reduce events. `SemanticActionSet` is the pluggable
//! seam; `DefaultTreeBuilder` is the CST/AST implementation the parser
//! runtime uses unless a caller supplies their own.

use crate::error::SyntaxError;
use crate::token::{Position, Token};
use parsegen_bytecode::CompiledGrammar;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
  Terminal { kind_id: u32, lexeme: Vec<u8>, position: Position },
  NonTerminal { kind_id: u32, children: Vec<TreeNode> },
  Error { kind_id: u32 },
}

/// The pluggable seam: `shift`, `reduce`, `accept`,
/// `trap_and_shift_error`, `miss_error`.
pub trait SemanticActionSet {
  fn shift(&mut self, token: &Token, recovered: bool);
  fn reduce(&mut self, production: u32, recovered: bool);
  fn accept(&mut self);
  fn trap_and_shift_error(&mut self, cause: &SyntaxError, popped: usize);
  fn miss_error(&mut self, cause: &SyntaxError);
}

/// Builds one node per shift (terminal leaf), one per reduce
/// (non-terminal with popped children, rewritten per `#ast` if
/// present), and an error leaf on `trap_and_shift_error`.
pub struct DefaultTreeBuilder<'g> {
  grammar: &'g CompiledGrammar,
  stack: Vec<TreeNode>,
  root: Option<TreeNode>,
  fatal: Option<SyntaxError>,
}

impl<'g> DefaultTreeBuilder<'g> {
  pub fn new(grammar: &'g CompiledGrammar) -> Self {
    Self { grammar, stack: Vec::new(), root: None, fatal: None }
  }

  pub fn take_root(&mut self) -> Option<TreeNode> {
    self.root.take()
  }

  pub fn fatal(&self) -> Option<&SyntaxError> {
    self.fatal.as_ref()
  }
}

impl<'g> SemanticActionSet for DefaultTreeBuilder<'g> {
  fn shift(&mut self, token: &Token, _recovered: bool) {
    self.stack.push(TreeNode::Terminal { kind_id: token.kind_id, lexeme: token.lexeme.clone(), position: token.position });
  }

  fn reduce(&mut self, production: u32, _recovered: bool) {
    let prod = self.grammar.productions.iter().find(|p| p.number == production).expect("reduce on a known production");
    let split_at = self.stack.len() - prod.rhs_len as usize;
    let children: Vec<TreeNode> = self.stack.split_off(split_at);

    let node = match &prod.ast_rewrite {
      Some(rewrite) => TreeNode::NonTerminal { kind_id: prod.lhs.0, children: apply_rewrite(&children, rewrite) },
      None => TreeNode::NonTerminal { kind_id: prod.lhs.0, children },
    };
    self.stack.push(node);
  }

  fn accept(&mut self) {
    self.root = self.stack.pop();
  }

  fn trap_and_shift_error(&mut self, _cause: &SyntaxError, _popped: usize) {
    self.stack.push(TreeNode::Error { kind_id: self.grammar.error_id.0 });
  }

  fn miss_error(&mut self, cause: &SyntaxError) {
    self.fatal = Some(cause.clone());
  }
}

/// Applies one production's `#ast` rewrite list: positive `k` takes
/// child `k` (1-based); negative `-k` splices child `k`'s own children
/// in place, flattening one level.
fn apply_rewrite(children: &[TreeNode], rewrite: &[i32]) -> Vec<TreeNode> {
  let mut out = Vec::new();
  for &entry in rewrite {
    let idx = (entry.unsigned_abs() as usize).saturating_sub(1);
    let Some(child) = children.get(idx) else { continue };
    if entry > 0 {
      out.push(child.clone());
    } else {
      match child {
        TreeNode::NonTerminal { children: grandchildren, .. } => out.extend(grandchildren.iter().cloned()),
        other => out.push(other.clone()),
      }
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn splice_flattens_one_level() {
    let list = TreeNode::NonTerminal {
      kind_id: 1,
      children: vec![TreeNode::Terminal { kind_id: 2, lexeme: b"a".to_vec(), position: Position::default() }],
    };
    let head = TreeNode::Terminal { kind_id: 3, lexeme: b"x".to_vec(), position: Position::default() };
    let out = apply_rewrite(&[head.clone(), list.clone()], &[1, -2]);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0], head);
  }
}
