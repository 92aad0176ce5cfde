//! Inverse-CDF sampling from empirical percentile tables
//!
//! A [`PercentileTable`] is a discrete empirical CDF. Sampling inverts it: a
//! uniform draw `u ∈ [0, 1)` becomes the percentile rank `u * 100`, and the
//! value is linearly interpolated between the two breakpoints bracketing that
//! rank. Ranks below the first breakpoint clamp to the table minimum, ranks
//! above the last clamp to the maximum — there is no extrapolation, so every
//! sample stays inside the table's [min, max] bounds.
//!
//! Table validity (strictly increasing percentiles, non-decreasing values) is
//! established when the trace is loaded; sampling itself cannot fail.

use crate::trace::PercentileTable;

/// Draw one value from the empirical distribution described by `table`
///
/// `u` must lie in `[0, 1)`; it is the caller's uniform draw, so that one
/// random stream can drive many tables deterministically.
pub fn sample_percentiles(table: &PercentileTable, u: f64) -> f64 {
    let rank = u * 100.0;
    let points = table.points();

    if rank <= points[0].0 {
        return points[0].1;
    }
    if rank >= points[points.len() - 1].0 {
        return points[points.len() - 1].1;
    }

    // Index of the first breakpoint at or above the rank. The bounds checks
    // above guarantee both neighbors exist.
    let hi = points.partition_point(|&(p, _)| p < rank);
    let (p_lo, v_lo) = points[hi - 1];
    let (p_hi, v_hi) = points[hi];

    v_lo + (rank - p_lo) / (p_hi - p_lo) * (v_hi - v_lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_table() -> PercentileTable {
        // Percentile p maps to value p, so interpolation is easy to verify.
        let points = vec![
            (0.0, 0.0),
            (1.0, 1.0),
            (25.0, 25.0),
            (50.0, 50.0),
            (75.0, 75.0),
            (99.0, 99.0),
            (100.0, 100.0),
        ];
        PercentileTable::new("duration", "test", points).unwrap()
    }

    fn memory_table() -> PercentileTable {
        let points = vec![
            (1.0, 100.0),
            (5.0, 500.0),
            (25.0, 2500.0),
            (50.0, 5000.0),
            (75.0, 7500.0),
            (95.0, 9500.0),
            (99.0, 9900.0),
            (100.0, 10000.0),
        ];
        PercentileTable::new("memory", "test", points).unwrap()
    }

    #[test]
    fn test_interpolation_on_identity_table() {
        let table = identity_table();
        assert!((sample_percentiles(&table, 0.50) - 50.0).abs() < 1e-9);
        assert!((sample_percentiles(&table, 0.62) - 62.0).abs() < 1e-9);
        assert!((sample_percentiles(&table, 0.995) - 99.5).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_between_breakpoints() {
        let table = memory_table();
        // Rank 82.17 sits between (75, 7500) and (95, 9500).
        let expected = 7500.0 + (82.17 - 75.0) / 20.0 * 2000.0;
        assert!((sample_percentiles(&table, 0.8217) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_extremes_clamp_to_table_bounds() {
        let table = memory_table();
        // Ranks below the first breakpoint clamp to the minimum.
        assert_eq!(sample_percentiles(&table, 0.0), 100.0);
        assert_eq!(sample_percentiles(&table, 0.005), 100.0);
        // u → 1 approaches the maximum without ever exceeding it.
        assert!((sample_percentiles(&table, 0.9999999) - 10000.0).abs() < 0.01);

        // A table ending below the 100th percentile clamps above its last
        // breakpoint.
        let short = PercentileTable::new(
            "duration",
            "test",
            vec![(1.0, 10.0), (50.0, 20.0), (99.0, 30.0)],
        )
        .unwrap();
        assert_eq!(sample_percentiles(&short, 0.995), 30.0);
    }

    #[test]
    fn test_samples_stay_within_bounds() {
        use rand::Rng;
        use rand::SeedableRng;
        use rand_xoshiro::Xoshiro256PlusPlus;

        let table = memory_table();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        for _ in 0..10_000 {
            let v = sample_percentiles(&table, rng.gen_range(0.0..1.0));
            assert!(v >= table.min_value() && v <= table.max_value());
        }
    }

    #[test]
    fn test_single_point_table() {
        let table = PercentileTable::new("memory", "test", vec![(50.0, 128.0)]).unwrap();
        assert_eq!(sample_percentiles(&table, 0.0), 128.0);
        assert_eq!(sample_percentiles(&table, 0.99), 128.0);
    }
}
