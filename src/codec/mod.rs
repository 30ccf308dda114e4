//! Pattern codecs: dense matrices, RLE text, and the run-length zip that
//! builds quadtrees straight from runs.

pub mod matrix;
pub mod rle;
pub mod zip;

pub use matrix::{matrix_to_quad, quad_to_matrix, Matrix, MatrixError};
pub use rle::{read_rle, write_rle, RleError, RleLine, RleMap, RleToken};
pub use zip::{rle_to_quad, zip_adjacent, zip_lines};
