//! Command-line support: format dispatch by file extension and the
//! round-trip operations the binary runs.

pub mod constants;

use anyhow::{Context, Result};

use crate::codec::{matrix_to_quad, read_rle, rle_to_quad, write_rle, Matrix};
use crate::quad::Store;
use constants::RLE_EXTENSION;

/// Pattern file format, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternFormat {
    /// `.rle` files use the Life run-length encoding.
    Rle,
    /// Everything else is read as a dense text matrix.
    Matrix,
}

/// Pick the codec for a path: `.rle` selects RLE, any other extension (or
/// none) the dense matrix reader.
pub fn pattern_format(path: &str) -> PatternFormat {
    if path.ends_with(RLE_EXTENSION) {
        PatternFormat::Rle
    } else {
        PatternFormat::Matrix
    }
}

/// Parse the pattern file at `path` and re-emit it on stdout.
///
/// At display level ≥ 3 the pattern is additionally packed into the node
/// store and occupancy statistics are reported.
pub fn run_file(path: &str) -> Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    match pattern_format(path) {
        PatternFormat::Rle => {
            let map = read_rle(&text).with_context(|| format!("parsing {path}"))?;
            if constants::display_level() >= 3 {
                let mut store = Store::new(map.rule.clone());
                rle_to_quad(&mut store, &map);
                store.stats();
            }
            print!("{}", write_rle(&map));
        }
        PatternFormat::Matrix => {
            let mat = Matrix::parse(&text).with_context(|| format!("parsing {path}"))?;
            if constants::display_level() >= 3 {
                let mut store = Store::new(mat.rule().clone());
                matrix_to_quad(&mut store, &mat);
                store.stats();
            }
            print!("{mat}");
        }
    }
    Ok(())
}
