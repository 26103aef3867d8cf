//! Tests for order statistics.

use super::*;

// ---------------------------------------------------------------------------
// Median tests
// ---------------------------------------------------------------------------

#[test]
fn test_median_odd() {
    let mut values = [1.0f64, 3.0, 2.0, 5.0, 4.0];
    assert!((median_f64_mut(&mut values) - 3.0).abs() < f64::EPSILON);
}

#[test]
fn test_median_even() {
    let mut values = [4.0f64, 1.0, 3.0, 2.0];
    assert!((median_f64_mut(&mut values) - 2.5).abs() < f64::EPSILON);
}

#[test]
fn test_median_single() {
    let mut values = [42.0f64];
    assert!((median_f64_mut(&mut values) - 42.0).abs() < f64::EPSILON);
}

#[test]
fn test_median_with_duplicates() {
    let mut values = [7.0f64, 7.0, 1.0, 7.0];
    assert!((median_f64_mut(&mut values) - 7.0).abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// MAD tests
// ---------------------------------------------------------------------------

#[test]
fn test_mad_around_given_center() {
    let values = [10.0f64, 12.0, 11.0];
    assert!((mad_f64(&values, 11.0) - 1.0).abs() < 1e-12);
}

#[test]
fn test_mad_uniform_is_zero() {
    let values = [3.5f64; 5];
    assert!(mad_f64(&values, 3.5).abs() < 1e-12);
}

#[test]
fn test_mad_with_outlier() {
    // One wild value does not move the MAD.
    let values = [10.0f64, 11.0, 12.0, 11.0, 1000.0];
    assert!((mad_f64(&values, 11.0) - 1.0).abs() < 1e-12);
}

// ---------------------------------------------------------------------------
// Percentile tests
// ---------------------------------------------------------------------------

#[test]
fn test_percentile_extremes() {
    let samples = [5u16, 1, 9, 3, 7];
    assert!((percentile_u16(&samples, 0.0) - 1.0).abs() < 1e-12);
    assert!((percentile_u16(&samples, 100.0) - 9.0).abs() < 1e-12);
    assert!((percentile_u16(&samples, 50.0) - 5.0).abs() < 1e-12);
}

#[test]
fn test_percentile_interpolates_between_ranks() {
    // Sorted: 0..=99, rank for 1% = 0.99.
    let samples: Vec<u16> = (0..100).rev().collect();
    assert!((percentile_u16(&samples, 1.0) - 0.99).abs() < 1e-9);

    // Sorted [10, 20], 25% -> rank 0.25 -> 12.5.
    assert!((percentile_u16(&[20, 10], 25.0) - 12.5).abs() < 1e-9);
}

#[test]
fn test_percentile_with_ties() {
    let samples = [4u16, 4, 4, 8];
    // rank = 0.5 * 3 = 1.5 -> between 4 and 4.
    assert!((percentile_u16(&samples, 50.0) - 4.0).abs() < 1e-12);
    // rank = 0.9 * 3 = 2.7 -> 4 + 0.7 * 4.
    assert!((percentile_u16(&samples, 90.0) - 6.8).abs() < 1e-9);
}

#[test]
fn test_percentile_single_sample() {
    assert!((percentile_u16(&[123], 37.0) - 123.0).abs() < 1e-12);
}

#[test]
fn test_percentile_full_u16_range() {
    let samples = [0u16, u16::MAX];
    assert!((percentile_u16(&samples, 50.0) - 32767.5).abs() < 1e-9);
}

#[test]
fn test_percentile_does_not_reorder_input() {
    let samples = [3u16, 1, 2];
    let _ = percentile_u16(&samples, 50.0);
    assert_eq!(samples, [3, 1, 2]);
}
