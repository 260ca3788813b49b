//! Recursive-descent parser for the regex pattern language. Supports
//! `|`, concatenation, `*`, `+`, `?`, `(` `)`, `[` `]` with
//! `^` complement and ranges, `\u{HHHH}`, `\p{Name=Value}`, `\f{name}`,
//! and pattern-meta escapes.

use super::ast::Node;
use crate::error::{ctor, GeneratorError};
use std::iter::Peekable;
use std::str::Chars;

pub fn parse_pattern(src: &str) -> Result<Node, GeneratorError> {
  let mut p = Parser { chars: src.chars().peekable(), pos: 0 };
  let node = p.parse_alt()?;
  if p.chars.peek().is_some() {
    return Err(invalid(p.pos, "unexpected trailing characters in pattern"));
  }
  Ok(node)
}

fn invalid(pos: usize, detail: &str) -> GeneratorError {
  ctor::invalid_regex(crate::error::Span::new(pos, 1, 0, pos as u32), detail.to_string())
}

struct Parser<'a> {
  chars: Peekable<Chars<'a>>,
  pos: usize,
}

impl<'a> Parser<'a> {
  fn bump(&mut self) -> Option<char> {
    let c = self.chars.next();
    if c.is_some() {
      self.pos += 1;
    }
    c
  }

  fn peek(&mut self) -> Option<char> {
    self.chars.peek().copied()
  }

  fn expect(&mut self, c: char) -> Result<(), GeneratorError> {
    match self.bump() {
      Some(found) if found == c => Ok(()),
      _ => Err(invalid(self.pos, &format!("expected `{c}`"))),
    }
  }

  // alt := seq ('|' seq)*
  fn parse_alt(&mut self) -> Result<Node, GeneratorError> {
    let mut alts = vec![self.parse_seq()?];
    while self.peek() == Some('|') {
      self.bump();
      alts.push(self.parse_seq()?);
    }
    Ok(Node::alt(alts))
  }

  // seq := term*
  fn parse_seq(&mut self) -> Result<Node, GeneratorError> {
    let mut parts = Vec::new();
    while let Some(c) = self.peek() {
      if c == '|' || c == ')' {
        break;
      }
      parts.push(self.parse_term()?);
    }
    if parts.is_empty() {
      Ok(Node::Epsilon)
    } else {
      Ok(Node::concat(parts))
    }
  }

  // term := atom ('*' | '+' | '?')?
  fn parse_term(&mut self) -> Result<Node, GeneratorError> {
    let atom = self.parse_atom()?;
    match self.peek() {
      Some('*') => {
        self.bump();
        Ok(Node::Star(Box::new(atom)))
      }
      Some('+') => {
        self.bump();
        Ok(Node::Plus(Box::new(atom)))
      }
      Some('?') => {
        self.bump();
        Ok(Node::Optional(Box::new(atom)))
      }
      _ => Ok(atom),
    }
  }

  fn parse_atom(&mut self) -> Result<Node, GeneratorError> {
    match self.peek() {
      Some('(') => {
        self.bump();
        let inner = self.parse_alt()?;
        self.expect(')')?;
        Ok(inner)
      }
      Some('[') => self.parse_class(),
      Some('\\') => self.parse_escape(),
      Some(c) => {
        self.bump();
        Ok(Node::CodepointRange(c as u32, c as u32))
      }
      None => Err(invalid(self.pos, "unexpected end of pattern")),
    }
  }

  fn parse_escape(&mut self) -> Result<Node, GeneratorError> {
    self.bump(); // consume '\'
    match self.bump() {
      Some('u') => self.parse_unicode_escape(),
      Some('p') => self.parse_property_escape(),
      Some('f') => self.parse_fragment_escape(),
      Some('n') => Ok(Node::CodepointRange(0x0A, 0x0A)),
      Some('t') => Ok(Node::CodepointRange(0x09, 0x09)),
      Some('r') => Ok(Node::CodepointRange(0x0D, 0x0D)),
      // pattern-meta escape: the literal character itself.
      Some(c) => Ok(Node::CodepointRange(c as u32, c as u32)),
      None => Err(invalid(self.pos, "dangling escape at end of pattern")),
    }
  }

  fn parse_unicode_escape(&mut self) -> Result<Node, GeneratorError> {
    self.expect('{')?;
    let mut hex = String::new();
    while let Some(c) = self.peek() {
      if c == '}' {
        break;
      }
      hex.push(c);
      self.bump();
    }
    self.expect('}')?;
    let cp = u32::from_str_radix(&hex, 16).map_err(|_| invalid(self.pos, "invalid \\u{...} escape"))?;
    Ok(Node::CodepointRange(cp, cp))
  }

  fn parse_property_escape(&mut self) -> Result<Node, GeneratorError> {
    self.expect('{')?;
    let mut name = String::new();
    while let Some(c) = self.peek() {
      if c == '=' || c == '}' {
        break;
      }
      name.push(c);
      self.bump();
    }
    let mut value = String::new();
    if self.peek() == Some('=') {
      self.bump();
      while let Some(c) = self.peek() {
        if c == '}' {
          break;
        }
        value.push(c);
        self.bump();
      }
    }
    self.expect('}')?;
    Ok(Node::Property(name, value))
  }

  fn parse_fragment_escape(&mut self) -> Result<Node, GeneratorError> {
    self.expect('{')?;
    let mut name = String::new();
    while let Some(c) = self.peek() {
      if c == '}' {
        break;
      }
      name.push(c);
      self.bump();
    }
    self.expect('}')?;
    Ok(Node::FragmentRef(name))
  }

  // class := '[' '^'? class_item+ ']'
  fn parse_class(&mut self) -> Result<Node, GeneratorError> {
    self.expect('[')?;
    let negate = if self.peek() == Some('^') {
      self.bump();
      true
    } else {
      false
    };
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    while let Some(c) = self.peek() {
      if c == ']' {
        break;
      }
      let lo = self.parse_class_char()?;
      if self.peek() == Some('-') {
        // Lookahead: a trailing `-` right before `]` is a literal dash.
        let mut after = self.chars.clone();
        after.next();
        if after.peek() == Some(&']') {
          ranges.push((lo, lo));
          continue;
        }
        self.bump();
        let hi = self.parse_class_char()?;
        ranges.push((lo, hi));
      } else {
        ranges.push((lo, lo));
      }
    }
    self.expect(']')?;
    if negate {
      ranges = complement_ranges(&ranges);
    }
    let alts = ranges.into_iter().map(|(l, h)| Node::CodepointRange(l, h)).collect::<Vec<_>>();
    if alts.is_empty() {
      Ok(Node::Epsilon)
    } else {
      Ok(Node::alt(alts))
    }
  }

  fn parse_class_char(&mut self) -> Result<u32, GeneratorError> {
    if self.peek() == Some('\\') {
      self.bump();
      return match self.bump() {
        Some('n') => Ok(0x0A),
        Some('t') => Ok(0x09),
        Some('r') => Ok(0x0D),
        Some(c) => Ok(c as u32),
        None => Err(invalid(self.pos, "dangling escape in character class")),
      };
    }
    match self.bump() {
      Some(c) => Ok(c as u32),
      None => Err(invalid(self.pos, "unterminated character class")),
    }
  }
}

/// Complements a sorted/overlap-tolerant set of code-point ranges
/// against the full Unicode scalar-value space (excluding surrogates).
fn complement_ranges(ranges: &[(u32, u32)]) -> Vec<(u32, u32)> {
  let mut sorted = ranges.to_vec();
  sorted.sort();
  let mut merged: Vec<(u32, u32)> = Vec::new();
  for (lo, hi) in sorted {
    if let Some(last) = merged.last_mut() {
      if lo <= last.1 + 1 {
        last.1 = last.1.max(hi);
        continue;
      }
    }
    merged.push((lo, hi));
  }
  let mut out = Vec::new();
  let mut cursor = 0u32;
  for (lo, hi) in merged {
    if cursor < lo {
      out.push((cursor, lo - 1));
    }
    cursor = hi.saturating_add(1);
  }
  if cursor <= 0x10FFFF {
    out.push((cursor, 0x10FFFF));
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_concat_and_alt() {
    let node = parse_pattern("ab|c").unwrap();
    match node {
      Node::Alt(parts) => assert_eq!(parts.len(), 2),
      other => panic!("expected alt, got {other:?}"),
    }
  }

  #[test]
  fn parses_star_plus_opt() {
    assert!(matches!(parse_pattern("a*").unwrap(), Node::Star(_)));
    assert!(matches!(parse_pattern("a+").unwrap(), Node::Plus(_)));
    assert!(matches!(parse_pattern("a?").unwrap(), Node::Optional(_)));
  }

  #[test]
  fn parses_unicode_escape() {
    let node = parse_pattern("\\u{1F600}").unwrap();
    match node {
      Node::CodepointRange(lo, hi) => {
        assert_eq!(lo, 0x1F600);
        assert_eq!(hi, 0x1F600);
      }
      other => panic!("expected codepoint range, got {other:?}"),
    }
  }

  #[test]
  fn parses_fragment_and_property_refs() {
    assert!(matches!(parse_pattern("\\f{ident_start}").unwrap(), Node::FragmentRef(name) if name == "ident_start"));
    assert!(matches!(parse_pattern("\\p{gc=L}").unwrap(), Node::Property(n, v) if n == "gc" && v == "L"));
  }

  #[test]
  fn negated_class_complements() {
    let node = parse_pattern("[^a]").unwrap();
    match node {
      Node::Alt(parts) => assert!(parts.len() > 1),
      other => panic!("expected a multi-range alt, got {other:?}"),
    }
  }

  #[test]
  fn trailing_dash_is_literal() {
    let node = parse_pattern("[a-]").unwrap();
    match node {
      Node::Alt(parts) => assert_eq!(parts.len(), 2),
      other => panic!("expected alt of two literals, got {other:?}"),
    }
  }
}
