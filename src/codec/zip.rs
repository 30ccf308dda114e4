//! The run-length zip: bottom-up quadtree construction straight from RLE
//! runs, without ever materialising a bitmap.
//!
//! One pass merges two adjacent rows of runs into a single row whose
//! values describe 2×2 blocks; the reducer turns four cell bits into a
//! leaf. Because the row representation is generic in its payload, the
//! same pass then merges rows of depth-`k` handles into rows of
//! depth-`(k+1)` handles, so iterating the pass log₂(side) times yields
//! the canonical root. Work is proportional to the run count of each
//! pass, not to the area covered.

use crate::codec::rle::{RleLine, RleMap, RleToken};
use crate::quad::node::pack_leaf;
use crate::quad::{QuadId, Store};

/// Run length handed out by an exhausted stream: effectively infinite, so
/// the live side of a pairing always supplies the binding repeat count.
/// Even, so halving never strands a remainder.
const DEFAULT_RUN: usize = (usize::MAX / 2) & !1;

/// Streaming view of one row that yields horizontal pairs:
/// `(pair, repeat)` meaning `repeat` consecutive side-by-side value pairs.
///
/// A run of odd length contributes its last unit to a mixed pair with the
/// start of the following run; past the end of the row the implicit
/// default (dead) value continues forever, with [`empty`](Self::empty)
/// reporting that the underlying runs are exhausted.
struct PairStream<'a, V: Copy> {
    tokens: &'a [RleToken<V>],
    at: usize,
    cur: RleToken<V>,
    default: V,
    exhausted: bool,
    /// Current pair of values, left first.
    pair: [V; 2],
    /// How many times the pair repeats; consumed by the zip loop.
    repeat: usize,
    /// The underlying runs have run out (the stream now yields defaults).
    empty: bool,
}

impl<'a, V: Copy> PairStream<'a, V> {
    fn new(tokens: &'a [RleToken<V>], default: V) -> PairStream<'a, V> {
        let mut s = PairStream {
            tokens,
            at: 0,
            cur: RleToken { value: default, repeat: 0 },
            default,
            exhausted: false,
            pair: [default; 2],
            repeat: 0,
            empty: false,
        };
        s.advance();
        s
    }

    /// Pull the next underlying run into `cur`, switching to the endless
    /// default run at the end of the row.
    fn pop(&mut self) {
        match self.tokens.get(self.at) {
            Some(&tok) => {
                self.cur = tok;
                self.at += 1;
            }
            None => {
                self.exhausted = true;
                self.cur = RleToken { value: self.default, repeat: DEFAULT_RUN };
            }
        }
    }

    /// Form the next `(pair, repeat)` record.
    fn advance(&mut self) {
        if self.cur.repeat == 0 || self.exhausted {
            self.pop();
            self.empty = self.exhausted;
        }
        if self.cur.repeat == 1 {
            // Odd tail: couple the last unit with the head of the next run.
            self.repeat = 1;
            self.pair[0] = self.cur.value;
            self.pop();
            self.cur.repeat -= 1;
            self.pair[1] = self.cur.value;
        } else {
            self.repeat = self.cur.repeat / 2;
            self.cur.repeat %= 2;
            self.pair = [self.cur.value; 2];
        }
    }
}

/// Merge two vertically adjacent rows into one row of 2×2 blocks.
///
/// `reduce` receives the four constituent values in NW, NE, SW, SE order.
/// At least one input row must be non-empty; the loop runs until both
/// underlying rows are exhausted, so the output never ends in a padding
/// block. Equal adjacent outputs are re-merged into single runs.
pub fn zip_lines<V, W, F>(
    store: &mut Store,
    top: &[RleToken<V>],
    bottom: &[RleToken<V>],
    default: V,
    mut reduce: F,
) -> Vec<RleToken<W>>
where
    V: Copy,
    W: Copy + PartialEq,
    F: FnMut(&mut Store, [V; 4]) -> W,
{
    debug_assert!(!top.is_empty() || !bottom.is_empty());
    let mut a = PairStream::new(top, default);
    let mut b = PairStream::new(bottom, default);
    let mut out: Vec<RleToken<W>> = Vec::new();
    loop {
        let value = reduce(store, [a.pair[0], a.pair[1], b.pair[0], b.pair[1]]);
        let repeat = a.repeat.min(b.repeat);
        match out.last_mut() {
            Some(last) if last.value == value => last.repeat += repeat,
            _ => out.push(RleToken { value, repeat }),
        }
        for stream in [&mut a, &mut b] {
            stream.repeat -= repeat;
            if stream.repeat == 0 {
                stream.advance();
            }
        }
        if a.empty && b.empty {
            return out;
        }
    }
}

/// One vertical halving pass: pair adjacent rows of `map` and zip each
/// pair, producing a map with half the row extent.
///
/// Pairing walks the stored rows in order; a row belongs to the output row
/// `line_num / 2`. An odd row pairs with the implicitly empty row above
/// it; an even row pairs with its successor when that is the very next
/// row, and with the implicitly empty row below otherwise.
pub fn zip_adjacent<V, W, F>(
    store: &mut Store,
    map: &RleMap<V>,
    default: V,
    mut reduce: F,
) -> RleMap<W>
where
    V: Copy,
    W: Copy + PartialEq,
    F: FnMut(&mut Store, [V; 4]) -> W,
{
    let mut lines = Vec::new();
    let mut i = 0;
    while i < map.lines.len() {
        let line = &map.lines[i];
        let (top, bottom): (&[RleToken<V>], &[RleToken<V>]) = if line.line_num % 2 == 1 {
            i += 1;
            (&[], &line.tokens)
        } else if map
            .lines
            .get(i + 1)
            .is_some_and(|next| next.line_num == line.line_num + 1)
        {
            i += 2;
            (&line.tokens, &map.lines[i - 1].tokens)
        } else {
            i += 1;
            (&line.tokens, &[])
        };
        lines.push(RleLine {
            line_num: line.line_num / 2,
            tokens: zip_lines(store, top, bottom, default, &mut reduce),
        });
    }
    RleMap {
        x: map.x.div_ceil(2),
        y: map.y.div_ceil(2),
        rule: map.rule.clone(),
        lines,
    }
}

/// Build the canonical quad for an RLE cell map, bottom-up.
///
/// The first pass packs cell bits into leaves; pass `k` thereafter conses
/// depth-`(k−2)` handles at depth `k−1`. The result depth `d` is the
/// smallest with `2^(d+1) ≥ max(width, height)`, the same padding rule
/// the matrix codec uses, so both constructions agree on equal patterns.
pub fn rle_to_quad(store: &mut Store, map: &RleMap<u8>) -> QuadId {
    let extent = map.width().max(map.height());
    let mut side = 2usize;
    let mut depth = 0u32;
    while side < extent {
        side <<= 1;
        depth += 1;
    }
    if map.lines.is_empty() {
        return store.dead(depth);
    }

    let mut rows = zip_adjacent(store, map, 0u8, |s, [c0, c1, c2, c3]| {
        s.leaf(pack_leaf(c0, c1, c2, c3))
    });
    for pass in 2..=depth + 1 {
        let default = store.dead(pass - 2);
        rows = zip_adjacent(store, &rows, default, |s, kids| s.cons(kids, pass - 1));
    }
    debug_assert_eq!(rows.lines.len(), 1);
    debug_assert_eq!(rows.lines[0].line_num, 0);
    debug_assert_eq!(rows.lines[0].tokens.len(), 1);
    rows.lines[0].tokens[0].value
}
