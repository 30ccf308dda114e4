//! Dense bit-matrix codec: plain-text grids, and packing/unpacking between
//! a matrix and the canonical quadtree.
//!
//! The text form is a header `rows cols rulestring` followed by one line
//! per row, `.` for dead and `#` for alive (a few common aliases are
//! accepted on input). Packing pads the grid up to the next power-of-two
//! square; unpacking extracts an arbitrary window whose offsets are
//! [`BigInt`]s, so a pattern can be read back after astronomically long
//! advances.

use core::fmt;

use crate::bigint::BigInt;
use crate::quad::{QuadId, Store};
use crate::rule::{Rule, RuleError};

/// A dense `m × n` grid of 0/1 cells with its rule metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    m: usize,
    n: usize,
    rule: Rule,
    cells: Vec<u8>,
}

/// Matrix text rejection; line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    MissingHeader,
    BadHeader(String),
    BadRule(RuleError),
    ShortRow { line: usize },
    BadCell { line: usize, found: char },
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixError::MissingHeader => write!(f, "empty input: expected `rows cols rule` header"),
            MatrixError::BadHeader(h) => write!(f, "malformed matrix header {h:?}"),
            MatrixError::BadRule(e) => write!(f, "bad rule in matrix header: {e}"),
            MatrixError::ShortRow { line } => write!(f, "line {line}: row shorter than declared width"),
            MatrixError::BadCell { line, found } => {
                write!(f, "line {line}: unrecognised cell character {found:?}")
            }
        }
    }
}

impl std::error::Error for MatrixError {}

impl From<RuleError> for MatrixError {
    fn from(e: RuleError) -> Self {
        MatrixError::BadRule(e)
    }
}

impl Matrix {
    /// All-dead `m × n` grid.
    pub fn new(m: usize, n: usize, rule: Rule) -> Matrix {
        Matrix { m, n, rule, cells: vec![0; m * n] }
    }

    pub fn rows(&self) -> usize {
        self.m
    }

    pub fn cols(&self) -> usize {
        self.n
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> u8 {
        self.cells[r * self.n + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: u8) {
        debug_assert!(v <= 1);
        self.cells[r * self.n + c] = v;
    }

    /// Parse the text form.
    pub fn parse(input: &str) -> Result<Matrix, MatrixError> {
        let mut lines = input.lines().enumerate();
        let (_, header) = lines
            .by_ref()
            .find(|(_, l)| !l.trim().is_empty())
            .ok_or(MatrixError::MissingHeader)?;

        let mut fields = header.split_whitespace();
        let (m, n) = match (fields.next(), fields.next()) {
            (Some(m), Some(n)) => match (m.parse::<usize>(), n.parse::<usize>()) {
                (Ok(m), Ok(n)) => (m, n),
                _ => return Err(MatrixError::BadHeader(header.to_owned())),
            },
            _ => return Err(MatrixError::BadHeader(header.to_owned())),
        };
        let rule = match fields.next() {
            Some(r) => Rule::parse(r)?,
            None => Rule::conway(),
        };
        if fields.next().is_some() {
            return Err(MatrixError::BadHeader(header.to_owned()));
        }

        let mut mat = Matrix::new(m, n, rule);
        for r in 0..m {
            let (line_no, row) = loop {
                match lines.next() {
                    // Blank separators are tolerated between rows.
                    Some((_, l)) if l.trim().is_empty() => {}
                    Some((i, l)) => break (i + 1, l.trim_end()),
                    None => return Err(MatrixError::ShortRow { line: r + 2 }),
                }
            };
            let mut cols = 0;
            for ch in row.chars() {
                if cols == n {
                    break;
                }
                let v = match ch {
                    '.' | '0' | ' ' => 0,
                    '#' | '1' | 'O' | 'o' | '*' => 1,
                    _ => return Err(MatrixError::BadCell { line: line_no, found: ch }),
                };
                mat.set(r, cols, v);
                cols += 1;
            }
            if cols < n {
                return Err(MatrixError::ShortRow { line: line_no });
            }
        }
        Ok(mat)
    }
}

impl fmt::Display for Matrix {
    /// The emitted text round-trips through [`Matrix::parse`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} {}", self.m, self.n, self.rule)?;
        let mut row = String::with_capacity(self.n + 1);
        for r in 0..self.m {
            row.clear();
            for c in 0..self.n {
                row.push(if self.get(r, c) != 0 { '#' } else { '.' });
            }
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

// ── Matrix → quadtree ────────────────────────────────────────────────────────

/// Pack a matrix into the canonical quad for its power-of-two padding.
///
/// The result depth `d` is the smallest with `2^(d+1) ≥ max(m, n)`; cells
/// outside the matrix are dead.
pub fn matrix_to_quad(store: &mut Store, mat: &Matrix) -> QuadId {
    let mut side = 2usize;
    let mut d = 0u32;
    while side < mat.m.max(mat.n) {
        side <<= 1;
        d += 1;
    }
    pack_window(store, mat, 0, 0, d)
}

fn pack_window(store: &mut Store, mat: &Matrix, mmin: usize, nmin: usize, d: u32) -> QuadId {
    if mmin >= mat.m || nmin >= mat.n {
        return store.dead(d);
    }
    if d == 0 {
        let mut bits = 0u8;
        for i in 0..2 {
            for j in 0..2 {
                if mmin + i < mat.m && nmin + j < mat.n {
                    bits |= mat.get(mmin + i, nmin + j) << (3 - 2 * i - j);
                }
            }
        }
        return store.leaf(bits);
    }
    let s = 1usize << d;
    let mut kids = [QuadId(0); 4];
    for (i, kid) in kids.iter_mut().enumerate() {
        *kid = pack_window(
            store,
            mat,
            mmin + if i & 2 != 0 { s } else { 0 },
            nmin + if i & 1 != 0 { s } else { 0 },
            d - 1,
        );
    }
    store.cons(kids, d)
}

// ── Quadtree → matrix ────────────────────────────────────────────────────────

/// Copy the `[mmin, mmin + out.rows()) × [nmin, nmin + out.cols())` window
/// of `q`'s plane into `out`, starting at `out`'s top-left corner.
///
/// Offsets are big integers; only the coordinates that survive truncation
/// into a leaf are ever materialised as machine words. Cells of the window
/// beyond `q`'s side are left untouched, so callers that want zero-fill
/// start from a fresh matrix.
pub fn quad_to_matrix(store: &Store, q: QuadId, mmin: &BigInt, nmin: &BigInt, out: &mut Matrix) {
    if out.m == 0 || out.n == 0 {
        return;
    }
    let mmax = mmin.plus_u64(out.m as u64);
    let nmax = nmin.plus_u64(out.n as u64);
    let d = store.depth(q);
    fill(store, q, d, (mmin, &mmax), (nmin, &nmax), (0, 0), out);
}

/// One axis of the window projected into a child: the child row/column,
/// the sub-window, and the output offset where it lands.
struct AxisPart {
    half: usize,
    min: BigInt,
    max: BigInt,
    out: usize,
}

/// Classify a window `[min, max)` against the child boundary `2^d`.
///
/// Yields the non-empty parts in child order: entirely one side gives one
/// part (upper-half coordinates truncated by `2^d`), a straddle gives two,
/// with the upper part's output offset advanced past the lower slice.
fn split_axis(min: &BigInt, max: &BigInt, d: u32, out: usize) -> Vec<AxisPart> {
    let mut parts = Vec::with_capacity(2);
    if min.ge_pow2(d) {
        // Entirely in the upper half.
        parts.push(AxisPart {
            half: 1,
            min: min.sub_pow2(d),
            max: max.sub_pow2(d),
            out,
        });
    } else if max.ge_pow2(d) && *max != BigInt::pow2(d) {
        // Straddles the boundary. The lower slice's length is a machine
        // integer (it is bounded by the output dimension), so truncated
        // arithmetic recovers it exactly.
        let boundary = if d < 64 { 1u64 << d } else { 0 };
        let lower_len = boundary.wrapping_sub(min.low_u64()) as usize;
        parts.push(AxisPart {
            half: 0,
            min: min.clone(),
            max: BigInt::pow2(d),
            out,
        });
        parts.push(AxisPart {
            half: 1,
            min: BigInt::zero(),
            max: max.sub_pow2(d),
            out: out + lower_len,
        });
    } else {
        // Entirely in the lower half.
        parts.push(AxisPart {
            half: 0,
            min: min.clone(),
            max: max.clone(),
            out,
        });
    }
    parts
}

fn fill(
    store: &Store,
    q: QuadId,
    d: u32,
    rows: (&BigInt, &BigInt),
    cols: (&BigInt, &BigInt),
    out_at: (usize, usize),
    out: &mut Matrix,
) {
    let (mmin, mmax) = rows;
    let (nmin, nmax) = cols;
    // Windows entirely beyond this node's side write nothing.
    if mmin.ge_pow2(d + 1) || nmin.ge_pow2(d + 1) {
        return;
    }
    if d == 0 {
        let r0 = mmin.low_u64() as usize;
        let r1 = (mmax.low_u64().min(2)) as usize;
        let c0 = nmin.low_u64() as usize;
        let c1 = (nmax.low_u64().min(2)) as usize;
        let bits = store.leaf_bits(q);
        for r in r0..r1 {
            for c in c0..c1 {
                out.set(
                    out_at.0 + (r - r0),
                    out_at.1 + (c - c0),
                    crate::quad::node::leaf_cell(bits, r as u32, c as u32),
                );
            }
        }
        return;
    }
    let kids = store.children(q);
    let row_parts = split_axis(mmin, mmax, d, out_at.0);
    let col_parts = split_axis(nmin, nmax, d, out_at.1);
    for rp in &row_parts {
        for cp in &col_parts {
            let kid = kids[(rp.half << 1) | cp.half];
            fill(
                store,
                kid,
                d - 1,
                (&rp.min, &rp.max),
                (&cp.min, &cp.max),
                (rp.out, cp.out),
                out,
            );
        }
    }
}
