//! Regex AST — the output of `regex::parser::parse`. One tree per
//! pattern string; `\f{name}` fragment references are resolved (and
//! checked for cycles) before the tree reaches Thompson construction.

#[derive(Debug, Clone)]
pub enum Node {
  /// Matches the empty string.
  Epsilon,
  /// A single Unicode scalar-value range, inclusive on both ends.
  /// Surrogate code points are never present (rejected at parse time).
  CodepointRange(u32, u32),
  /// A `\p{Name=Value}` escape, resolved to code-point ranges only once
  /// it reaches NFA construction (so the same AST can be reused against
  /// different property tables in principle, though in practice one
  /// table is used per compilation).
  Property(String, String),
  Concat(Vec<Node>),
  Alt(Vec<Node>),
  Star(Box<Node>),
  Plus(Box<Node>),
  Optional(Box<Node>),
  /// `\f{name}` — replaced by the referenced fragment's tree during
  /// `resolve_fragments`.
  FragmentRef(String),
}

impl Node {
  pub fn concat(mut parts: Vec<Node>) -> Node {
    if parts.len() == 1 {
      parts.pop().unwrap()
    } else {
      Node::Concat(parts)
    }
  }

  pub fn alt(mut parts: Vec<Node>) -> Node {
    if parts.len() == 1 {
      parts.pop().unwrap()
    } else {
      Node::Alt(parts)
    }
  }
}
