//! Inter-arrival-time generation
//!
//! This module produces the per-minute gap sequences of the replay schedule.
//! Each supported distribution implements the [`GapSampler`] trait ("generate
//! `count` raw gaps"), and [`generate_minute`] turns raw gaps into a schedule
//! minute that sums to exactly the 60-second window.
//!
//! # No spillover
//!
//! Uniform and exponential gaps are drawn in their natural units, summed to a
//! raw total, then linearly rescaled so the minute closes at exactly
//! 60,000,000 µs. A uniform linear scale preserves the relative proportions
//! among gaps, so the distribution's shape survives the rescale — the raw
//! total is retained for goodness-of-fit checks against the unscaled family.
//! The floating-point residue of the rescale is folded into the final gap,
//! which keeps the window exact even at a million invocations per minute.

use rand::Rng;
use rand_distr::{Distribution as RandDistribution, Exp};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::IatDistribution;

/// One simulated minute, in microseconds
pub const MINUTE_IN_MICROSECONDS: f64 = 60_000_000.0;

/// Rate of the raw exponential gap generator. Only the rescaled shape is
/// observable, so the rate is fixed rather than configurable.
const EXPONENTIAL_RATE: f64 = 1.0;

/// Gap sequence for one simulated minute
#[derive(Debug, Clone, PartialEq)]
pub struct MinuteGaps {
    /// Rescaled gaps, microseconds; sums to the minute window
    pub gaps: Vec<f64>,
    /// Sum of the raw gaps before rescaling, kept for distribution validation
    pub raw_total: f64,
}

/// Raw gap generation, one implementation per distribution
///
/// Implementations draw in whatever units are natural for the distribution;
/// [`generate_minute`] owns the rescale to the minute window. Raw gaps must be
/// strictly positive so the rescale is well defined.
pub trait GapSampler: Send {
    /// Generate `count` raw gaps
    fn raw_gaps(&self, rng: &mut Xoshiro256PlusPlus, count: usize) -> Vec<f64>;
}

/// Evenly spaced gaps: every gap is `window / count`
pub struct EquidistantGaps;

impl GapSampler for EquidistantGaps {
    fn raw_gaps(&self, _rng: &mut Xoshiro256PlusPlus, count: usize) -> Vec<f64> {
        vec![MINUTE_IN_MICROSECONDS / count as f64; count]
    }
}

/// Gaps drawn uniformly from (0, 1]
pub struct UniformGaps;

impl GapSampler for UniformGaps {
    fn raw_gaps(&self, rng: &mut Xoshiro256PlusPlus, count: usize) -> Vec<f64> {
        // 1 - U over [0, 1) yields (0, 1]: strictly positive, same distribution.
        (0..count).map(|_| 1.0 - rng.gen_range(0.0..1.0)).collect()
    }
}

/// Gaps drawn from an exponential distribution (Poisson arrivals)
pub struct ExponentialGaps {
    exp: Exp<f64>,
}

impl ExponentialGaps {
    pub fn new() -> Self {
        Self {
            exp: Exp::new(EXPONENTIAL_RATE).expect("valid exponential rate"),
        }
    }
}

impl Default for ExponentialGaps {
    fn default() -> Self {
        Self::new()
    }
}

impl GapSampler for ExponentialGaps {
    fn raw_gaps(&self, rng: &mut Xoshiro256PlusPlus, count: usize) -> Vec<f64> {
        (0..count).map(|_| self.exp.sample(rng)).collect()
    }
}

/// Select the gap sampler for a distribution tag
pub fn gap_sampler(distribution: IatDistribution) -> Box<dyn GapSampler> {
    match distribution {
        IatDistribution::Equidistant => Box::new(EquidistantGaps),
        IatDistribution::Uniform => Box::new(UniformGaps),
        IatDistribution::Exponential => Box::new(ExponentialGaps::new()),
    }
}

/// Generate one schedule minute: raw gaps, rescaled to the 60 s window
///
/// `count == 0` yields an empty minute with raw total 0; no spillover check
/// applies to it.
pub fn generate_minute(
    sampler: &dyn GapSampler,
    rng: &mut Xoshiro256PlusPlus,
    count: usize,
) -> MinuteGaps {
    if count == 0 {
        return MinuteGaps {
            gaps: Vec::new(),
            raw_total: 0.0,
        };
    }

    let mut gaps = sampler.raw_gaps(rng, count);
    let raw_total: f64 = gaps.iter().sum();
    debug_assert!(raw_total > 0.0, "raw gaps must be strictly positive");

    let scale = MINUTE_IN_MICROSECONDS / raw_total;
    for gap in &mut gaps {
        *gap *= scale;
    }

    // Fold the floating-point residue into the last gap so the minute closes
    // exactly, independent of count.
    let scaled_total: f64 = gaps.iter().sum();
    let last = gaps.len() - 1;
    gaps[last] += MINUTE_IN_MICROSECONDS - scaled_total;

    MinuteGaps { gaps, raw_total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const EPSILON: f64 = 1e-3;

    fn minute_sum(minute: &MinuteGaps) -> f64 {
        minute.gaps.iter().sum()
    }

    #[test]
    fn test_equidistant_exact_gaps() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(123456789);
        let minute = generate_minute(&EquidistantGaps, &mut rng, 5);

        assert_eq!(minute.gaps, vec![12_000_000.0; 5]);
        assert_eq!(minute_sum(&minute), MINUTE_IN_MICROSECONDS);
    }

    #[test]
    fn test_equidistant_minutes_are_identical() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(123456789);
        let first = generate_minute(&EquidistantGaps, &mut rng, 5);
        for _ in 0..4 {
            let minute = generate_minute(&EquidistantGaps, &mut rng, 5);
            assert_eq!(minute.gaps, first.gaps);
        }
    }

    #[test]
    fn test_zero_count_yields_empty_minute() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        for sampler in [gap_sampler(IatDistribution::Equidistant),
                        gap_sampler(IatDistribution::Uniform),
                        gap_sampler(IatDistribution::Exponential)] {
            let minute = generate_minute(sampler.as_ref(), &mut rng, 0);
            assert!(minute.gaps.is_empty());
            assert_eq!(minute.raw_total, 0.0);
        }
    }

    #[test]
    fn test_no_spillover_uniform() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(123456789);
        for count in [1, 25, 1000] {
            let minute = generate_minute(&UniformGaps, &mut rng, count);
            assert_eq!(minute.gaps.len(), count);
            assert!((minute_sum(&minute) - MINUTE_IN_MICROSECONDS).abs() < EPSILON);
        }
    }

    #[test]
    fn test_no_spillover_exponential() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(123456789);
        for count in [1, 25, 1000] {
            let minute = generate_minute(&ExponentialGaps::new(), &mut rng, count);
            assert_eq!(minute.gaps.len(), count);
            assert!((minute_sum(&minute) - MINUTE_IN_MICROSECONDS).abs() < EPSILON);
        }
    }

    #[test]
    fn test_no_spillover_million_invocations() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(123456789);
        for sampler in [gap_sampler(IatDistribution::Uniform),
                        gap_sampler(IatDistribution::Exponential)] {
            let minute = generate_minute(sampler.as_ref(), &mut rng, 1_000_000);
            assert_eq!(minute.gaps.len(), 1_000_000);
            assert!((minute_sum(&minute) - MINUTE_IN_MICROSECONDS).abs() < EPSILON);
        }
    }

    #[test]
    fn test_single_invocation_takes_whole_window() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let minute = generate_minute(&ExponentialGaps::new(), &mut rng, 1);
        assert_eq!(minute.gaps, vec![MINUTE_IN_MICROSECONDS]);
    }

    #[test]
    fn test_gaps_are_positive() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(99);
        for sampler in [gap_sampler(IatDistribution::Uniform),
                        gap_sampler(IatDistribution::Exponential)] {
            let minute = generate_minute(sampler.as_ref(), &mut rng, 10_000);
            assert!(minute.gaps.iter().all(|&g| g > 0.0));
        }
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let mut a = Xoshiro256PlusPlus::seed_from_u64(123456789);
        let mut b = Xoshiro256PlusPlus::seed_from_u64(123456789);
        let sampler = ExponentialGaps::new();

        let first = generate_minute(&sampler, &mut a, 25);
        let second = generate_minute(&sampler, &mut b, 25);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rescale_preserves_proportions() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let raw = UniformGaps.raw_gaps(&mut rng, 25);
        let raw_total: f64 = raw.iter().sum();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let minute = generate_minute(&UniformGaps, &mut rng, 25);

        // Ratios between gaps survive the linear rescale (last gap absorbs
        // only the floating-point residue).
        for i in 1..24 {
            let expected = raw[i] / raw[0];
            let actual = minute.gaps[i] / minute.gaps[0];
            assert!((expected - actual).abs() < 1e-9);
        }
        assert!((minute.raw_total - raw_total).abs() < 1e-9);
    }
}
