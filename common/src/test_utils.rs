//! Helpers shared by the scan tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::FloatExt;

/// Relative tolerance for comparing tree-ordered sums against a sequential reference.
pub const REL_TOL: f32 = 1e-4;

/// Values in `[0, 1)` so prefix sums are monotonic and never cancel.
pub fn random_sequence(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(0.0..1.0)).collect()
}

/// Sequential exclusive scan accumulated in f64.
pub fn reference_exclusive_scan(input: &[f32]) -> Vec<f32> {
    let mut acc = 0.0f64;
    input
        .iter()
        .map(|&x| {
            let result = acc;
            acc += x as f64;
            result as f32
        })
        .collect()
}

pub fn assert_scan_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            a.relative_eq(e, REL_TOL),
            "mismatch at {}: got {}, expected {}",
            i,
            a,
            e
        );
    }
}

/// Smallest `k` with `block_size^k >= len`, the expected recursion depth for `len >= 2`.
pub fn ceil_log(len: usize, block_size: usize) -> usize {
    let mut depth = 0;
    let mut capacity = 1usize;
    while capacity < len {
        capacity *= block_size;
        depth += 1;
    }
    depth
}
