//! The Hashlife stepping engine.
//!
//! A full step of a depth-`d` node returns its depth-`(d−1)` centre
//! advanced by `2^(d−1)` generations, memoized on the node so canonical
//! sharing turns repeated subpatterns into cache hits. `step_by` relaxes
//! the advance to any power of two up to the full step, and `destiny`
//! composes those skips to advance a pattern by an arbitrary [`BigInt`]
//! generation count, tracking where the original origin lands.

use crate::bigint::BigInt;
use crate::quad::node::{leaf_cell, pack_leaf, Node, QuadId};
use crate::quad::store::Store;

/// Result of advancing a pattern by an arbitrary generation count.
///
/// Cell `(r, c)` of the original pattern's frame is found at
/// `(origin + r, origin + c)` in `quad`'s frame (the same offset applies
/// to both axes; padding and recentring are symmetric).
#[derive(Debug, Clone)]
pub struct Destiny {
    pub quad: QuadId,
    pub origin: BigInt,
}

impl Store {
    // ── Full step ────────────────────────────────────────────────────────────

    /// Advance the centre of `q` by `2^(depth−1)` generations.
    ///
    /// Memoized: the second call with the same node is a pointer-equal
    /// cache hit. `q` must be an inner node (`depth ≥ 1`).
    pub fn step(&mut self, q: QuadId) -> QuadId {
        if let Some(r) = self.memo(q) {
            return r;
        }
        let result = if self.depth(q) == 1 {
            self.step_base(q)
        } else {
            self.step_inner(q)
        };
        self.set_memo(q, result);
        result
    }

    /// Depth-1 base case: one generation of the 4×4 cell block, read off
    /// the rule table for each of the four centre cells.
    fn step_base(&mut self, q: QuadId) -> QuadId {
        let kids = self.children(q);
        let mut grid = [[0u8; 4]; 4];
        for (i, &k) in kids.iter().enumerate() {
            let bits = self.leaf_bits(k);
            let (r0, c0) = ((i as u32 >> 1) * 2, (i as u32 & 1) * 2);
            for r in 0..2 {
                for c in 0..2 {
                    grid[(r0 + r) as usize][(c0 + c) as usize] = leaf_cell(bits, r, c);
                }
            }
        }
        let mut centre = [0u8; 4];
        for (i, cell) in centre.iter_mut().enumerate() {
            let (r, c) = (1 + i / 2, 1 + i % 2);
            let mut hood = 0u16;
            for nr in r - 1..=r + 1 {
                for nc in c - 1..=c + 1 {
                    hood = (hood << 1) | grid[nr][nc] as u16;
                }
            }
            *cell = self.rule().next(hood);
        }
        self.leaf(pack_leaf(centre[0], centre[1], centre[2], centre[3]))
    }

    /// Depth ≥ 2 recursion: nine overlapping half-size sub-squares, each
    /// fully stepped, regrouped into four overlapping quarters and stepped
    /// again. Two half-steps make the full `2^(d−1)` advance.
    fn step_inner(&mut self, q: QuadId) -> QuadId {
        let d = self.depth(q);
        let n = self.nine(q);
        let mut m = [n[0]; 9];
        for (i, &sub) in n.iter().enumerate() {
            m[i] = self.step(sub);
        }
        let mut quarters = [m[0]; 4];
        for (i, quarter) in quarters.iter_mut().enumerate() {
            let (r, c) = (i >> 1, i & 1);
            let group = [
                m[3 * r + c],
                m[3 * r + c + 1],
                m[3 * (r + 1) + c],
                m[3 * (r + 1) + c + 1],
            ];
            let g = self.cons(group, d - 1);
            *quarter = self.step(g);
        }
        self.cons(quarters, d - 1)
    }

    // ── Power-of-two skip ────────────────────────────────────────────────────

    /// Advance the centre of `q` by `2^e` generations, for any
    /// `e ≤ depth − 1`.
    ///
    /// At `e = depth − 1` this is the memoized full step. Below that, the
    /// nine sub-squares are each advanced by `2^e` and the four regrouped
    /// quarters contribute their un-stepped centres, so no further time
    /// passes. Only full steps occupy the memo slot.
    pub fn step_by(&mut self, q: QuadId, e: u32) -> QuadId {
        let d = self.depth(q);
        debug_assert!(d >= 1 && e <= d - 1);
        if e == d - 1 {
            return self.step(q);
        }
        let n = self.nine(q);
        let mut m = [n[0]; 9];
        for (i, &sub) in n.iter().enumerate() {
            m[i] = self.step_by(sub, e);
        }
        let mut quarters = [m[0]; 4];
        for (i, quarter) in quarters.iter_mut().enumerate() {
            let (r, c) = (i >> 1, i & 1);
            let group = [
                m[3 * r + c],
                m[3 * r + c + 1],
                m[3 * (r + 1) + c],
                m[3 * (r + 1) + c + 1],
            ];
            let g = self.cons(group, d - 1);
            *quarter = self.centre(g);
        }
        self.cons(quarters, d - 1)
    }

    /// The nine overlapping depth-`(d−1)` sub-squares of a depth-`d ≥ 2`
    /// node, row-major: four corners are the children themselves, the rest
    /// are re-arranged grandchildren (edge midpoints and the centre).
    fn nine(&mut self, q: QuadId) -> [QuadId; 9] {
        let d = self.depth(q);
        debug_assert!(d >= 2);
        let [nw, ne, sw, se] = self.children(q);
        let g = |s: &Self, k: QuadId| s.children(k);
        let (gnw, gne, gsw, gse) = (g(self, nw), g(self, ne), g(self, sw), g(self, se));
        let north = self.cons([gnw[1], gne[0], gnw[3], gne[2]], d - 1);
        let south = self.cons([gsw[1], gse[0], gsw[3], gse[2]], d - 1);
        let west = self.cons([gnw[2], gnw[3], gsw[0], gsw[1]], d - 1);
        let east = self.cons([gne[2], gne[3], gse[0], gse[1]], d - 1);
        let mid = self.cons([gnw[3], gne[2], gsw[1], gse[0]], d - 1);
        [nw, north, ne, west, mid, east, sw, south, se]
    }

    // ── Geometry ─────────────────────────────────────────────────────────────

    /// Central depth-`(d−1)` sub-square of an inner node.
    pub fn centre(&mut self, q: QuadId) -> QuadId {
        let d = self.depth(q);
        debug_assert!(d >= 1);
        let [nw, ne, sw, se] = self.children(q);
        if d == 1 {
            let cells = pack_leaf(
                leaf_cell(self.leaf_bits(nw), 1, 1),
                leaf_cell(self.leaf_bits(ne), 1, 0),
                leaf_cell(self.leaf_bits(sw), 0, 1),
                leaf_cell(self.leaf_bits(se), 0, 0),
            );
            return self.leaf(cells);
        }
        let centre = [
            self.children(nw)[3],
            self.children(ne)[2],
            self.children(sw)[1],
            self.children(se)[0],
        ];
        self.cons(centre, d - 1)
    }

    /// Wrap `q` centred inside a dead border, one depth up.
    pub fn pad(&mut self, q: QuadId) -> QuadId {
        let d = self.depth(q);
        match *self.node(q) {
            Node::Leaf(bits) => {
                let nw = self.leaf(pack_leaf(0, 0, 0, leaf_cell(bits, 0, 0)));
                let ne = self.leaf(pack_leaf(0, 0, leaf_cell(bits, 0, 1), 0));
                let sw = self.leaf(pack_leaf(0, leaf_cell(bits, 1, 0), 0, 0));
                let se = self.leaf(pack_leaf(leaf_cell(bits, 1, 1), 0, 0, 0));
                self.cons([nw, ne, sw, se], 1)
            }
            Node::Inner([nw, ne, sw, se]) => {
                let dead = self.dead(d - 1);
                let pnw = self.cons([dead, dead, dead, nw], d);
                let pne = self.cons([dead, dead, ne, dead], d);
                let psw = self.cons([dead, sw, dead, dead], d);
                let pse = self.cons([se, dead, dead, dead], d);
                self.cons([pnw, pne, psw, pse], d + 1)
            }
        }
    }

    /// True iff every live cell of `q` lies in its central half, i.e. the
    /// outward-facing quarters of all four children are dead.
    pub fn centered(&mut self, q: QuadId) -> bool {
        let d = self.depth(q);
        debug_assert!(d >= 1);
        let kids = self.children(q);
        if d == 1 {
            // Only the inward cell of each leaf child may be live.
            const OUTWARD: [u8; 4] = [0b1110, 0b1101, 0b1011, 0b0111];
            return kids
                .iter()
                .zip(OUTWARD)
                .all(|(&k, mask)| self.leaf_bits(k) & mask == 0);
        }
        let dead = self.dead(d - 2);
        for (i, &k) in kids.iter().enumerate() {
            let g = self.children(k);
            // Grandchild diagonally opposite the centre (index 3 - i) is
            // the only one allowed to be live.
            for (j, &gk) in g.iter().enumerate() {
                if j != 3 - i && gk != dead {
                    return false;
                }
            }
        }
        true
    }

    // ── Arbitrary-length advance ─────────────────────────────────────────────

    /// Advance `q` by `t` generations.
    ///
    /// Walks the bits of `t` from most to least significant; each set bit
    /// `e` contributes one `2^e` skip. Before each skip the pattern is
    /// padded until the root is at least depth `e + 2`, all live cells sit
    /// in the central quarter, and the running origin offset can absorb
    /// the recentring. The skip's growth of at most `2^(e+1)` cells per
    /// axis then fits the returned centre window, and `origin` stays
    /// non-negative.
    pub fn destiny(&mut self, mut q: QuadId, t: &BigInt) -> Destiny {
        let mut origin = BigInt::zero();
        let Some(msb) = t.log2() else {
            return Destiny { quad: q, origin };
        };
        for e in (0..=msb).rev() {
            if !t.bit(e) {
                continue;
            }
            loop {
                let d = self.depth(q);
                if d >= e + 2 && origin.ge_pow2(d - 1) && self.quarter_centered(q) {
                    break;
                }
                origin = origin.add(&BigInt::pow2(d));
                q = self.pad(q);
            }
            let d = self.depth(q);
            q = self.step_by(q, e);
            origin = origin.sub_pow2(d - 1);
        }
        Destiny { quad: q, origin }
    }

    /// Live cells confined to the central quarter: centred at this depth
    /// and at the next one down.
    fn quarter_centered(&mut self, q: QuadId) -> bool {
        if !self.centered(q) {
            return false;
        }
        let c = self.centre(q);
        self.centered(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn store() -> Store {
        Store::new(Rule::conway())
    }

    /// Build a depth-1 node from a 4×4 cell grid.
    fn quad4(s: &mut Store, grid: [[u8; 4]; 4]) -> QuadId {
        let mut kids = [QuadId(0); 4];
        for (i, kid) in kids.iter_mut().enumerate() {
            let (r0, c0) = (i / 2 * 2, i % 2 * 2);
            *kid = s.leaf(pack_leaf(
                grid[r0][c0],
                grid[r0][c0 + 1],
                grid[r0 + 1][c0],
                grid[r0 + 1][c0 + 1],
            ));
        }
        s.cons(kids, 1)
    }

    #[test]
    fn base_case_block_is_still_life() {
        let mut s = store();
        let q = quad4(
            &mut s,
            [[0, 0, 0, 0], [0, 1, 1, 0], [0, 1, 1, 0], [0, 0, 0, 0]],
        );
        let r = s.step(q);
        assert_eq!(s.leaf_bits(r), pack_leaf(1, 1, 1, 1));
    }

    #[test]
    fn base_case_spinner_rotates() {
        let mut s = store();
        // Vertical domino through the centre column: the two centre cells
        // each see one neighbour and die; the side cells see three and are
        // born — but only the centre 2×2 is reported.
        let q = quad4(
            &mut s,
            [[0, 1, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0], [0, 0, 0, 0]],
        );
        let r = s.step(q);
        // Blinker: vertical triple becomes horizontal through row 1.
        assert_eq!(s.leaf_bits(r), pack_leaf(1, 1, 0, 0));
    }

    #[test]
    fn step_is_memoized_pointer_equal() {
        let mut s = store();
        let q = quad4(
            &mut s,
            [[0, 0, 0, 0], [0, 1, 1, 0], [0, 1, 1, 0], [0, 0, 0, 0]],
        );
        let a = s.step(q);
        let nodes = s.len();
        let b = s.step(q);
        assert_eq!(a, b);
        assert_eq!(s.len(), nodes);
    }

    #[test]
    fn dead_steps_to_dead() {
        let mut s = store();
        for d in 1..6 {
            let q = s.dead(d);
            let r = s.step(q);
            let expect = s.dead(d - 1);
            assert_eq!(r, expect);
        }
    }

    #[test]
    fn pad_then_centre_is_identity() {
        let mut s = store();
        let q = quad4(
            &mut s,
            [[1, 0, 1, 0], [0, 1, 0, 1], [1, 1, 0, 0], [0, 0, 1, 1]],
        );
        let p = s.pad(q);
        assert_eq!(s.depth(p), 2);
        assert_eq!(s.centre(p), q);
        assert!(s.centered(p));
    }

    #[test]
    fn pad_leaf_preserves_cells() {
        let mut s = store();
        let q = s.leaf(pack_leaf(1, 0, 0, 1));
        let p = s.pad(q);
        assert_eq!(s.depth(p), 1);
        assert_eq!(s.centre(p), q);
    }

    #[test]
    fn centered_rejects_border_activity() {
        let mut s = store();
        let q = quad4(
            &mut s,
            [[1, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
        );
        assert!(!s.centered(q));
        let inner = quad4(
            &mut s,
            [[0, 0, 0, 0], [0, 1, 1, 0], [0, 0, 1, 0], [0, 0, 0, 0]],
        );
        assert!(s.centered(inner));
    }

    #[test]
    fn step_by_full_equals_step() {
        let mut s = store();
        let q = quad4(
            &mut s,
            [[0, 1, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0], [0, 0, 0, 0]],
        );
        let p = s.pad(q); // depth 2
        assert_eq!(s.step_by(p, 1), s.step(p));
    }

    #[test]
    fn step_by_zero_advances_one_generation() {
        let mut s = store();
        // Blinker in a padded depth-2 node: one generation via step_by(_, 0)
        // must match one generation via a depth-1 full step of the centre.
        let q = quad4(
            &mut s,
            [[0, 0, 0, 0], [0, 1, 1, 1], [0, 0, 0, 0], [0, 0, 0, 0]],
        );
        let p = s.pad(q);
        let skipped = s.step_by(p, 0);
        let direct = s.step(q);
        // The depth-1 result sits at the centre of the skipped result.
        let skipped_centre = s.centre(skipped);
        assert_eq!(skipped_centre, direct);
    }

    #[test]
    fn destiny_of_empty_is_dead() {
        let mut s = store();
        let q = s.dead(3);
        let t = BigInt::from_u64(910);
        let out = s.destiny(q, &t);
        assert!(s.is_dead(out.quad));
    }

    #[test]
    fn destiny_zero_generations_is_identity() {
        let mut s = store();
        let q = quad4(
            &mut s,
            [[0, 0, 0, 0], [0, 1, 1, 0], [0, 1, 1, 0], [0, 0, 0, 0]],
        );
        let out = s.destiny(q, &BigInt::zero());
        assert_eq!(out.quad, q);
        assert!(out.origin.is_zero());
    }
}
