//! Hashlife: hash-consed quadtrees with memoized time evolution for
//! Life-family cellular automata.
//!
//! The engine represents a pattern as a canonical quadtree ([`quad`]),
//! advances it by power-of-two generation counts with per-node memoization
//! ([`quad::step`]), and converts between quadtrees and external pattern
//! encodings (dense matrices and Life RLE text), including a run-length
//! zip that assembles the quadtree directly from runs ([`codec::zip`]).
//! Coordinates and generation counts are arbitrary-precision ([`bigint`]),
//! so patterns can be advanced and sampled at scales far beyond any
//! machine word.

pub mod bigint;
pub mod cli;
pub mod codec;
pub mod quad;
pub mod rule;

/// Arbitrary-precision unsigned integer used for coordinates and times.
pub use bigint::BigInt;
/// Canonical handles, the node store, and destiny results.
pub use quad::{Destiny, Node, QuadId, Store};
/// B/S rules and their 512-entry successor tables.
pub use rule::Rule;
/// The codec entry points.
pub use codec::{
    matrix_to_quad, quad_to_matrix, read_rle, rle_to_quad, write_rle, Matrix, RleMap,
};
