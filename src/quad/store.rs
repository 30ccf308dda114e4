//! Hash-consing store for quadtree nodes.
//!
//! The store owns every node in an arena and guarantees canonical sharing:
//! two structurally equal nodes are the same [`QuadId`]. Lookup goes
//! through a chained-bucket hash table keyed on `(depth, payload)`; chains
//! are threaded through the nodes themselves via an intrusive `link` field.
//! The all-dead subtree of each depth is built lazily and cached so
//! `dead(d)` is O(1) after the first request.
//!
//! The memo slot (`next`) on every node is reserved for the stepping
//! engine; the store itself never reads it.

use crate::quad::node::{Node, QuadId, Slot, NIL};
use crate::rule::Rule;
use xxhash_rust::xxh32::xxh32;

/// Initial bucket count; always a power of two so growth can mask instead
/// of divide.
const INITIAL_BUCKETS: usize = 1 << 12;

/// Canonicalizing arena of quadtree nodes, with the active rule installed.
pub struct Store {
    rule: Rule,
    slots: Vec<Slot>,
    buckets: Vec<u32>,
    /// Canonical all-dead node per depth, extended on demand.
    dead: Vec<QuadId>,
}

impl Store {
    /// Create an empty store with `rule` installed for stepping.
    pub fn new(rule: Rule) -> Store {
        Store {
            rule,
            slots: Vec::new(),
            buckets: vec![NIL; INITIAL_BUCKETS],
            dead: Vec::new(),
        }
    }

    /// The rule every step in this store applies.
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Number of canonical nodes currently interned.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // ── Node accessors ───────────────────────────────────────────────────────

    #[inline]
    pub fn depth(&self, q: QuadId) -> u32 {
        self.slots[q.0 as usize].depth
    }

    #[inline]
    pub fn node(&self, q: QuadId) -> &Node {
        &self.slots[q.0 as usize].node
    }

    /// Children of an inner node. Calling this on a leaf is a logic error.
    #[inline]
    pub fn children(&self, q: QuadId) -> [QuadId; 4] {
        match self.slots[q.0 as usize].node {
            Node::Inner(kids) => kids,
            Node::Leaf(_) => unreachable!("children() on a leaf"),
        }
    }

    /// Packed 2×2 map of a leaf. Calling this on an inner node is a logic
    /// error.
    #[inline]
    pub fn leaf_bits(&self, q: QuadId) -> u8 {
        match self.slots[q.0 as usize].node {
            Node::Leaf(bits) => bits,
            Node::Inner(_) => unreachable!("leaf_bits() on an inner node"),
        }
    }

    #[inline]
    pub(crate) fn memo(&self, q: QuadId) -> Option<QuadId> {
        self.slots[q.0 as usize].next
    }

    /// Record a step result. Monotonic: an existing value is never
    /// replaced (canonicalisation makes any second computation equal).
    #[inline]
    pub(crate) fn set_memo(&mut self, q: QuadId, result: QuadId) {
        let slot = &mut self.slots[q.0 as usize];
        debug_assert!(slot.next.is_none() || slot.next == Some(result));
        slot.next.get_or_insert(result);
    }

    // ── Canonical constructors ───────────────────────────────────────────────

    /// Canonical leaf for a 4-bit cell map.
    pub fn leaf(&mut self, bits: u8) -> QuadId {
        debug_assert!(bits < 16);
        self.intern(0, Node::Leaf(bits))
    }

    /// Canonical inner node over four children of depth `depth − 1`.
    ///
    /// Idempotent: equal inputs return the same handle.
    pub fn cons(&mut self, children: [QuadId; 4], depth: u32) -> QuadId {
        debug_assert!(depth >= 1);
        debug_assert!(children.iter().all(|&k| self.depth(k) == depth - 1));
        self.intern(depth, Node::Inner(children))
    }

    /// Canonical all-dead node of the given depth.
    pub fn dead(&mut self, depth: u32) -> QuadId {
        while self.dead.len() <= depth as usize {
            let q = match self.dead.last().copied() {
                None => self.leaf(0),
                Some(prev) => self.cons([prev; 4], self.dead.len() as u32),
            };
            self.dead.push(q);
        }
        self.dead[depth as usize]
    }

    /// Whether `q` is the all-dead node of its depth.
    pub fn is_dead(&mut self, q: QuadId) -> bool {
        let d = self.depth(q);
        self.dead(d) == q
    }

    // ── Hash table internals ─────────────────────────────────────────────────

    fn intern(&mut self, depth: u32, node: Node) -> QuadId {
        let hash = hash_key(depth, &node);
        let mask = (self.buckets.len() - 1) as u32;
        let mut at = self.buckets[(hash & mask) as usize];
        while at != NIL {
            let slot = &self.slots[at as usize];
            if slot.depth == depth && slot.node == node {
                return QuadId(at);
            }
            at = slot.link;
        }

        if self.slots.len() + 1 > self.buckets.len() / 4 * 3 {
            self.grow();
        }
        let id = self.slots.len() as u32;
        let mask = (self.buckets.len() - 1) as u32;
        let bucket = (hash & mask) as usize;
        self.slots.push(Slot {
            depth,
            node,
            next: None,
            link: self.buckets[bucket],
            hash,
        });
        self.buckets[bucket] = id;
        QuadId(id)
    }

    /// Double the bucket table and rethread every chain in place.
    fn grow(&mut self) {
        let new_len = self.buckets.len() * 2;
        self.buckets.clear();
        self.buckets.resize(new_len, NIL);
        let mask = (new_len - 1) as u32;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let bucket = (slot.hash & mask) as usize;
            slot.link = self.buckets[bucket];
            self.buckets[bucket] = i as u32;
        }
    }

    /// Occupancy diagnostics, reported at display level 3.
    pub fn stats(&self) {
        let mut used = 0usize;
        let mut longest = 0usize;
        for &head in &self.buckets {
            if head == NIL {
                continue;
            }
            used += 1;
            let mut n = 0;
            let mut at = head;
            while at != NIL {
                n += 1;
                at = self.slots[at as usize].link;
            }
            longest = longest.max(n);
        }
        crate::displaylevel!(
            3,
            "store: {} nodes, {}/{} buckets used, longest chain {}\n",
            self.slots.len(),
            used,
            self.buckets.len(),
            longest
        );
    }
}

/// Mix a node key down to a bucket hash.
fn hash_key(depth: u32, node: &Node) -> u32 {
    let mut key = [0u8; 20];
    key[..4].copy_from_slice(&depth.to_le_bytes());
    let len = match node {
        Node::Leaf(bits) => {
            key[4] = *bits;
            5
        }
        Node::Inner(kids) => {
            for (i, k) in kids.iter().enumerate() {
                key[4 + i * 4..8 + i * 4].copy_from_slice(&k.0.to_le_bytes());
            }
            20
        }
    };
    xxh32(&key[..len], 0)
}
