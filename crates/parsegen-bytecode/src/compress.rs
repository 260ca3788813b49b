//! Row-dedup and row-displacement table compression, shared by
//! the lexical DFA bundle and the ACTION/GOTO tables.

/// A dense row-major `rows × 256` matrix, the uncompressed encoding
/// every compression level is built from.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
  pub rows: usize,
  /// `entries[row * 256 + byte]`.
  pub entries: Vec<i64>,
  /// Sentinel value meaning "no transition"; never a valid target.
  pub empty: i64,
}

#[derive(Debug, Clone)]
pub enum CompressedMatrix {
  Uncompressed(DenseMatrix),
  /// Equal rows share one storage slot; `row_of[state]` indexes into
  /// `entries` in units of 256.
  RowDeduplicated { row_of: Vec<u32>, entries: Vec<i64>, empty: i64 },
  /// Row-displacement (open addressing): `offset[state] + byte` indexes
  /// into `bounds`/`entries`; a hit requires `bounds[idx] == state`.
  RowDisplaced { offset: Vec<i64>, bounds: Vec<i64>, entries: Vec<i64>, empty: i64 },
}

impl CompressedMatrix {
  pub fn lookup(&self, state: usize, byte: u8) -> i64 {
    match self {
      CompressedMatrix::Uncompressed(m) => m.entries[state * 256 + byte as usize],
      CompressedMatrix::RowDeduplicated { row_of, entries, empty } => {
        let row = row_of[state] as usize;
        entries.get(row * 256 + byte as usize).copied().unwrap_or(*empty)
      }
      CompressedMatrix::RowDisplaced { offset, bounds, entries, empty } => {
        let d = offset[state];
        if d < 0 {
          return *empty;
        }
        let idx = (d as usize) + byte as usize;
        if bounds.get(idx).copied() == Some(state as i64) {
          entries[idx]
        } else {
          *empty
        }
      }
    }
  }
}

/// Level 1: groups rows by exact content equality, keeping one physical
/// copy per distinct row.
pub fn deduplicate_rows(m: &DenseMatrix) -> CompressedMatrix {
  let mut unique_rows: Vec<&[i64]> = Vec::new();
  let mut row_of = Vec::with_capacity(m.rows);

  for r in 0..m.rows {
    let row = &m.entries[r * 256..(r + 1) * 256];
    let existing = unique_rows.iter().position(|&u| u == row);
    let idx = existing.unwrap_or_else(|| {
      unique_rows.push(row);
      unique_rows.len() - 1
    });
    row_of.push(idx as u32);
  }

  let mut entries = Vec::with_capacity(unique_rows.len() * 256);
  for row in unique_rows {
    entries.extend_from_slice(row);
  }
  CompressedMatrix::RowDeduplicated { row_of, entries, empty: m.empty }
}

/// Level 2: row displacement. Rows are assigned, by descending density
/// (most non-empty columns first), the smallest offset at which every
/// non-empty column lands on a free (or already-matching) slot. This is
/// the classic open-addressed compact-transition-table encoding.
pub fn displace_rows(m: &DenseMatrix) -> CompressedMatrix {
  let mut row_order: Vec<usize> = (0..m.rows).collect();
  row_order.sort_by_key(|&r| {
    let density = (0..256).filter(|&b| m.entries[r * 256 + b] != m.empty).count();
    std::cmp::Reverse(density)
  });

  let mut bounds: Vec<i64> = Vec::new();
  let mut entries: Vec<i64> = Vec::new();
  let mut offset = vec![-1i64; m.rows];

  for r in row_order {
    let cols: Vec<usize> = (0..256).filter(|&b| m.entries[r * 256 + b] != m.empty).collect();
    if cols.is_empty() {
      offset[r] = 0;
      continue;
    }
    let mut d: i64 = 0;
    loop {
      let fits = cols.iter().all(|&c| {
        let idx = (d as usize) + c;
        idx >= bounds.len() || bounds[idx] < 0
      });
      if fits {
        break;
      }
      d += 1;
    }
    let needed = (d as usize) + 256;
    if bounds.len() < needed {
      bounds.resize(needed, -1);
      entries.resize(needed, m.empty);
    }
    for &c in &cols {
      let idx = (d as usize) + c;
      bounds[idx] = r as i64;
      entries[idx] = m.entries[r * 256 + c];
    }
    offset[r] = d;
  }

  CompressedMatrix::RowDisplaced { offset, bounds, entries, empty: m.empty }
}
