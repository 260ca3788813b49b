//! UTF-8 byte-level matching support: every code-point
//! range is expanded into a set of byte-sequence blocks so that each
//! block becomes a straight run of byte-class transitions, and surrogate
//! code points are excluded. The actual Unicode Character Database
//! backing `\p{Name=Value}` is an out-of-scope external collaborator;
//! `PropertyTable` is the narrow interface a real UCD
//! ingestion pipeline would implement, and `BuiltinProperties` is a
//! minimal stand-in covering the handful of properties common grammars
//! actually use.

pub const SURROGATE_LOW: u32 = 0xD800;
pub const SURROGATE_HIGH: u32 = 0xDFFF;

/// Boundaries at which a code-point range must be split so every
/// resulting sub-range encodes to UTF-8 byte sequences of uniform
/// length and uniform per-byte class ranges.
pub const BLOCK_BOUNDARIES: [u32; 8] = [0x7F, 0x7FF, 0xFFF, 0xCFFF, 0xD7FF, 0xFFFF, 0x3FFFF, 0xFFFFF];

/// A straight sequence of byte-class transitions: each `(lo, hi)` pair is
/// one byte position's allowed range.
pub type ByteSequence = Vec<(u8, u8)>;

/// Splits `[lo, hi]` at the block boundaries and excludes the surrogate
/// range, returning the maximal sub-ranges that need no further
/// splitting for UTF-8 encoding purposes.
pub fn split_codepoint_range(lo: u32, hi: u32) -> Vec<(u32, u32)> {
  let mut out = Vec::new();
  let mut cur = lo;
  while cur <= hi {
    // Exclude surrogates entirely.
    if cur >= SURROGATE_LOW && cur <= SURROGATE_HIGH {
      cur = SURROGATE_HIGH + 1;
      if cur > hi {
        break;
      }
      continue;
    }
    // Find the next boundary strictly greater than cur, or hi.
    let mut next_boundary = hi;
    for &b in BLOCK_BOUNDARIES.iter() {
      if b >= cur && b < next_boundary {
        next_boundary = b;
      }
    }
    // Don't let a split cross into the surrogate range uncut.
    if cur < SURROGATE_LOW && next_boundary >= SURROGATE_LOW {
      next_boundary = SURROGATE_LOW - 1;
    }
    out.push((cur, next_boundary));
    if next_boundary == u32::MAX {
      break;
    }
    cur = next_boundary + 1;
  }
  out
}

/// Encodes a single code point to its UTF-8 byte sequence.
fn encode_utf8(cp: u32) -> Vec<u8> {
  let c = char::from_u32(cp).unwrap_or('\u{FFFD}');
  let mut buf = [0u8; 4];
  c.encode_utf8(&mut buf).as_bytes().to_vec()
}

/// Converts one (already block-split) code-point range into one or more
/// `ByteSequence`s that together cover exactly the range's encoding, no
/// more and no less. A position-wise zip of `lo`'s and `hi`'s bytes is
/// only correct when every byte but the last is identical between the
/// two endpoints; once a non-final byte differs, the continuation bytes
/// on either side of that split don't move in lockstep with the leading
/// byte, so the range is decomposed recursively: a prefix sharing `lo`'s
/// leading byte, a suffix sharing `hi`'s leading byte, and (when the
/// leading bytes aren't adjacent) a full box spanning every leading byte
/// strictly between them with unconstrained continuation bytes.
pub fn range_to_byte_sequences(lo: u32, hi: u32) -> Vec<ByteSequence> {
  let lo_bytes = encode_utf8(lo);
  let hi_bytes = encode_utf8(hi);
  debug_assert_eq!(lo_bytes.len(), hi_bytes.len(), "block splitting must equalize utf8 length");
  let mut out = Vec::new();
  split_bytes(&lo_bytes, &hi_bytes, &mut out);
  out
}

fn split_bytes(lo: &[u8], hi: &[u8], out: &mut Vec<ByteSequence>) {
  let n = lo.len();
  if n == 1 {
    out.push(vec![(lo[0], hi[0])]);
    return;
  }
  if lo[0] == hi[0] {
    let mut tails = Vec::new();
    split_bytes(&lo[1..], &hi[1..], &mut tails);
    for mut seq in tails {
      seq.insert(0, (lo[0], lo[0]));
      out.push(seq);
    }
    return;
  }
  // Piece 1: leading byte lo[0], continuation bytes from lo's own suffix
  // up through the maximal all-0xBF suffix.
  let max_tail = vec![0xBFu8; n - 1];
  let mut prefix_tails = Vec::new();
  split_bytes(&lo[1..], &max_tail, &mut prefix_tails);
  for mut seq in prefix_tails {
    seq.insert(0, (lo[0], lo[0]));
    out.push(seq);
  }
  // Piece 2: every leading byte strictly between lo[0] and hi[0] admits
  // any continuation bytes at all, so it's one unconstrained box.
  if lo[0] + 1 <= hi[0] - 1 {
    let mut seq = vec![(lo[0] + 1, hi[0] - 1)];
    seq.extend(std::iter::repeat((0x80u8, 0xBFu8)).take(n - 1));
    out.push(seq);
  }
  // Piece 3: leading byte hi[0], continuation bytes from the minimal
  // all-0x80 suffix through hi's own suffix.
  let min_tail = vec![0x80u8; n - 1];
  let mut suffix_tails = Vec::new();
  split_bytes(&min_tail, &hi[1..], &mut suffix_tails);
  for mut seq in suffix_tails {
    seq.insert(0, (hi[0], hi[0]));
    out.push(seq);
  }
}

/// Expands a full code-point range straight to its byte-sequence blocks.
pub fn codepoint_range_to_byte_sequences(lo: u32, hi: u32) -> Vec<ByteSequence> {
  split_codepoint_range(lo, hi).into_iter().flat_map(|(l, h)| range_to_byte_sequences(l, h)).collect()
}

/// Resolves `\p{Name=Value}` escapes to code-point ranges.
pub trait PropertyTable {
  fn resolve(&self, name: &str, value: &str) -> Option<Vec<(u32, u32)>>;
}

/// A minimal built-in table covering the Unicode general-category-style
/// properties grammars reach for most often. A full UCD ingestion
/// pipeline (out of scope here) would replace this wholesale.
pub struct BuiltinProperties;

impl PropertyTable for BuiltinProperties {
  fn resolve(&self, name: &str, value: &str) -> Option<Vec<(u32, u32)>> {
    match (name, value) {
      ("gc", "L") | ("General_Category", "Letter") => Some(vec![(0x41, 0x5A), (0x61, 0x7A), (0xAA, 0xAA), (0xB5, 0xB5), (0xC0, 0x2AF)]),
      ("gc", "Nd") | ("General_Category", "Decimal_Number") => Some(vec![(0x30, 0x39)]),
      ("gc", "Zs") | ("General_Category", "Space_Separator") => Some(vec![(0x20, 0x20), (0xA0, 0xA0)]),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn excludes_surrogates() {
    let blocks = split_codepoint_range(0xD700, 0xE000);
    for (lo, hi) in &blocks {
      assert!(*hi < SURROGATE_LOW || *lo > SURROGATE_HIGH, "block {:?} overlaps surrogate range", (lo, hi));
    }
  }

  #[test]
  fn ascii_range_is_one_byte_sequence() {
    let seqs = codepoint_range_to_byte_sequences(0x30, 0x39);
    assert_eq!(seqs.len(), 1);
    assert_eq!(seqs[0], vec![(0x30, 0x39)]);
  }

  #[test]
  fn splits_at_two_byte_boundary() {
    // 0x7F is the last 1-byte code point, 0x80 needs 2 bytes.
    let blocks = split_codepoint_range(0x7E, 0x81);
    assert!(blocks.iter().any(|&(l, h)| l == 0x7E && h == 0x7F));
    assert!(blocks.iter().any(|&(l, _)| l == 0x80));
  }

  fn matches(seqs: &[ByteSequence], bytes: &[u8]) -> bool {
    seqs.iter().any(|seq| seq.len() == bytes.len() && seq.iter().zip(bytes).all(|(&(lo, hi), &b)| lo <= b && b <= hi))
  }

  #[test]
  fn non_block_aligned_multibyte_range_covers_every_codepoint() {
    // U+00C0..U+02AF spans the `\p{gc=L}` "Letter" entry from the
    // built-in property table: its leading byte changes (0xC3..0xCA)
    // partway through, so a naive per-position zip of the endpoints'
    // bytes would miss every code point whose leading byte sits strictly
    // between the two and whose trailing byte falls outside the
    // endpoints' own trailing-byte range.
    let (lo, hi) = (0xC0u32, 0x2AFu32);
    let seqs = codepoint_range_to_byte_sequences(lo, hi);
    for cp in lo..=hi {
      let bytes = encode_utf8(cp);
      assert!(matches(&seqs, &bytes), "code point U+{cp:04X} not covered by any byte sequence");
    }
    // Boundary code points just outside the range must not match.
    assert!(!matches(&seqs, &encode_utf8(lo - 1)));
    assert!(!matches(&seqs, &encode_utf8(hi + 1)));
  }

  #[test]
  fn letter_property_range_0xf0_to_0xf9_is_covered() {
    // The specific sub-range the naive zip implementation used to drop.
    let seqs = codepoint_range_to_byte_sequences(0xC0, 0x2AF);
    for cp in 0xF0u32..=0xF9 {
      assert!(matches(&seqs, &encode_utf8(cp)), "code point U+{cp:04X} not covered");
    }
  }
}
