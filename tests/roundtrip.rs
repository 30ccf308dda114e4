// tests/roundtrip.rs — codec properties: matrix and RLE round trips, and
// agreement between the run-length zip and the dense packer.

use hashlife::bigint::BigInt;
use hashlife::codec::rle::{read_rle, write_rle, RleMap};
use hashlife::codec::{matrix_to_quad, quad_to_matrix, rle_to_quad, Matrix};
use hashlife::quad::Store;
use hashlife::rule::Rule;

/// Deterministic pseudo-random bit for cell `(r, c)` of pattern `seed`.
fn noise(seed: u64, r: usize, c: usize) -> u8 {
    let mut x = seed
        .wrapping_mul(0x9e37_79b9_7f4a_7c15)
        .wrapping_add((r as u64) << 32 | c as u64);
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    ((x >> 17) & 1) as u8
}

fn noise_matrix(seed: u64, m: usize, n: usize) -> Matrix {
    let mut mat = Matrix::new(m, n, Rule::conway());
    for r in 0..m {
        for c in 0..n {
            mat.set(r, c, noise(seed, r, c));
        }
    }
    mat
}

// ── Matrix round trip ────────────────────────────────────────────────────────

#[test]
fn matrix_quad_round_trip_various_shapes() {
    let mut store = Store::new(Rule::conway());
    for (seed, m, n) in [(1u64, 1, 1), (2, 2, 2), (3, 3, 5), (4, 8, 8), (5, 13, 4), (6, 16, 31)] {
        let mat = noise_matrix(seed, m, n);
        let q = matrix_to_quad(&mut store, &mat);
        let mut out = Matrix::new(m, n, Rule::conway());
        quad_to_matrix(&store, q, &BigInt::zero(), &BigInt::zero(), &mut out);
        assert_eq!(out, mat, "{m}x{n} grid");
    }
}

#[test]
fn matrix_text_round_trip() {
    let mat = noise_matrix(9, 7, 11);
    let text = mat.to_string();
    assert_eq!(Matrix::parse(&text).unwrap(), mat);
}

// ── RLE round trip ───────────────────────────────────────────────────────────

#[test]
fn rle_emit_parse_round_trip() {
    for text in [
        "x = 3, y = 3, rule = B3/S23\nbob$2bo$3o!\n",
        "x = 2, y = 2, rule = B3/S23\n2o$2o!\n",
        "x = 6, y = 3, rule = B36/S23\n2b2o$o4bo$3o!\n",
        "x = 1, y = 5, rule = B3/S23\n4$o!\n",
    ] {
        let map = read_rle(text).unwrap();
        let emitted = write_rle(&map);
        assert_eq!(read_rle(&emitted).unwrap(), map, "round trip of {text:?}");
    }
}

#[test]
fn rle_round_trip_of_noise() {
    let mat = noise_matrix(11, 24, 40);
    let map = RleMap::from_matrix(&mat);
    let emitted = write_rle(&map);
    let reparsed = read_rle(&emitted).unwrap();
    assert_eq!(reparsed, map);
    assert_eq!(reparsed.to_matrix(), mat);
}

// ── Zip agreement with the dense packer ──────────────────────────────────────

#[test]
fn zip_agrees_with_matrix_packer_on_power_of_two_sides() {
    let mut store = Store::new(Rule::conway());
    for (seed, side) in [(21u64, 2usize), (22, 4), (23, 8), (24, 16)] {
        let mat = noise_matrix(seed, side, side);
        let map = RleMap::from_matrix(&mat);
        let via_zip = rle_to_quad(&mut store, &map);
        let via_matrix = matrix_to_quad(&mut store, &mat);
        assert_eq!(via_zip, via_matrix, "side {side}");
    }
}

#[test]
fn zip_agrees_on_ragged_shapes() {
    let mut store = Store::new(Rule::conway());
    for (seed, m, n) in [(31u64, 1, 7), (32, 9, 2), (33, 5, 5), (34, 12, 17)] {
        let mat = noise_matrix(seed, m, n);
        let map = RleMap::from_matrix(&mat);
        let via_zip = rle_to_quad(&mut store, &map);
        let via_matrix = matrix_to_quad(&mut store, &mat);
        assert_eq!(via_zip, via_matrix, "{m}x{n}");
    }
}

#[test]
fn zip_handles_sparse_patterns_with_blank_rows() {
    let mut store = Store::new(Rule::conway());
    let text = "x = 9, y = 9, rule = B3/S23\no8$8bo!\n";
    let map = read_rle(text).unwrap();
    let via_zip = rle_to_quad(&mut store, &map);
    let via_matrix = matrix_to_quad(&mut store, &map.to_matrix());
    assert_eq!(via_zip, via_matrix);
    assert_eq!(store.depth(via_zip), 3);
}

// ── S5: matrix ⇄ RLE ⇄ quad on one fixed bitmap ─────────────────────────────

#[test]
fn eight_by_eight_bitmap_survives_every_encoding() {
    let mut store = Store::new(Rule::conway());
    let mat = noise_matrix(42, 8, 8);

    // Dense path.
    let q = matrix_to_quad(&mut store, &mat);
    let mut out = Matrix::new(8, 8, Rule::conway());
    quad_to_matrix(&store, q, &BigInt::zero(), &BigInt::zero(), &mut out);
    assert_eq!(out, mat);

    // Run-length path lands on the identical canonical node.
    let map = RleMap::from_matrix(&mat);
    assert_eq!(rle_to_quad(&mut store, &map), q);

    // Text forms round-trip too.
    assert_eq!(Matrix::parse(&mat.to_string()).unwrap(), mat);
    assert_eq!(read_rle(&write_rle(&map)).unwrap(), map);
}
