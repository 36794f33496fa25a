//! Percentile-bucket sampling bias (`numTests`).
//!
//! The bucket table is a design constant, not operator-configurable; it is
//! inlined as a range check rather than precomputed.

/// Returns how many times an entry at rank `idx` (out of `total`) should be
/// tested before the cursor advances.
///
/// `p = floor(idx * 100 / total)`; entries in the top percentile buckets are
/// tested up to 10x more often than the bulk of the corpus, which sits in
/// the `0..=90` bucket and is tested once per pass.
///
/// Panics if `idx > total`.
pub fn num_tests(idx: usize, total: usize) -> u32 {
    assert!(total > 0, "num_tests called with an empty corpus");
    if idx > total {
        crate::fatal!("num_tests: idx ({idx}) > total ({total})");
        panic!("num_tests: idx ({idx}) exceeds total ({total})");
    }
    let p = idx * 100 / total;
    match p {
        0..=90 => 1,
        91..=92 => 2,
        93..=94 => 3,
        95..=96 => 4,
        97..=98 => 5,
        _ => 10,
    }
}
