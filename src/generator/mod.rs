//! Workload specification generation
//!
//! This module is the core of the harness: it turns an empirical [`Function`]
//! profile into a precise, reproducible replay schedule. For every simulated
//! minute it emits exact inter-arrival gaps (see [`iat`]) and, for every
//! invocation, a target execution profile sampled from the function's
//! percentile tables (see [`sampler`]).
//!
//! # Determinism
//!
//! A [`SpecificationGenerator`] owns one seeded xoshiro256++ stream for its
//! lifetime. Generation is a pure function of {seed, function, distribution}
//! apart from advancing that stream: identical inputs reproduce identical
//! schedules. Within a minute the draw order is fixed — gaps first, then a
//! runtime and a memory draw per invocation.
//!
//! # Sharing
//!
//! The produced [`InvocationData`] is never mutated after construction, so any
//! number of dispatcher tasks may read it concurrently without locks. The
//! generator itself is single-owner: its random stream must not be advanced
//! from two threads.

pub mod iat;
pub mod sampler;

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::config::IatDistribution;
use crate::trace::Function;
use iat::{gap_sampler, generate_minute};
use sampler::sample_percentiles;

/// Target execution profile for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeSpecification {
    /// Requested busy-spin duration, milliseconds
    pub runtime_ms: u32,
    /// Requested memory footprint, MiB
    pub memory_mib: u32,
}

/// A complete replay schedule for one function
///
/// `iat[m][i]` and `spec[m][i]` describe the same invocation: wait `iat[m][i]`
/// microseconds after the previous invocation of minute `m`, then fire with
/// the profile `spec[m][i]`. `raw_duration[m]` is the pre-rescale gap total of
/// minute `m`, retained only for statistical validation of the distribution
/// shape.
///
/// Immutable after construction; safe for unsynchronized concurrent reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationData {
    /// Inter-arrival gaps per minute, microseconds
    pub iat: Vec<Vec<f64>>,
    /// Pre-rescale gap totals per minute
    pub raw_duration: Vec<f64>,
    /// Execution profiles per minute, parallel to `iat`
    pub spec: Vec<Vec<RuntimeSpecification>>,
}

impl InvocationData {
    /// Total number of scheduled invocations
    pub fn total_invocations(&self) -> usize {
        self.iat.iter().map(Vec::len).sum()
    }
}

/// Seeded generator producing replay schedules
///
/// One instance per function is the intended usage; instances are cheap and
/// their streams independent. See the module docs for the ownership rules.
pub struct SpecificationGenerator {
    rng: Xoshiro256PlusPlus,
}

impl SpecificationGenerator {
    /// Create a generator with its own seeded random stream
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Generate the full replay schedule for `function`
    ///
    /// Iterates `function.invocations_per_minute`; minutes with count zero
    /// produce empty sequences. An all-zero schedule is valid, not an error.
    pub fn generate_invocation_data(
        &mut self,
        function: &Function,
        distribution: IatDistribution,
    ) -> InvocationData {
        let sampler = gap_sampler(distribution);
        let minutes = function.invocations_per_minute.len();

        let mut iat = Vec::with_capacity(minutes);
        let mut raw_duration = Vec::with_capacity(minutes);
        let mut spec = Vec::with_capacity(minutes);

        for &count in &function.invocations_per_minute {
            let minute = generate_minute(sampler.as_ref(), &mut self.rng, count);
            iat.push(minute.gaps);
            raw_duration.push(minute.raw_total);

            let mut profiles = Vec::with_capacity(count);
            for _ in 0..count {
                let runtime =
                    sample_percentiles(&function.runtime_stats, self.rng.gen_range(0.0..1.0));
                let memory =
                    sample_percentiles(&function.memory_stats, self.rng.gen_range(0.0..1.0));
                profiles.push(RuntimeSpecification {
                    runtime_ms: runtime.round() as u32,
                    memory_mib: memory.round() as u32,
                });
            }
            spec.push(profiles);
        }

        InvocationData {
            iat,
            raw_duration,
            spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::PercentileTable;
    use iat::MINUTE_IN_MICROSECONDS;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    const SEED: u64 = 123456789;

    fn test_function(invocations: Vec<usize>) -> Function {
        let runtime = PercentileTable::new(
            "duration",
            "test",
            vec![
                (0.0, 0.0),
                (1.0, 1.0),
                (25.0, 25.0),
                (50.0, 50.0),
                (75.0, 75.0),
                (99.0, 99.0),
                (100.0, 100.0),
            ],
        )
        .unwrap();
        let memory = PercentileTable::new(
            "memory",
            "test",
            vec![
                (1.0, 100.0),
                (5.0, 500.0),
                (25.0, 2500.0),
                (50.0, 5000.0),
                (75.0, 7500.0),
                (95.0, 9500.0),
                (99.0, 9900.0),
                (100.0, 10000.0),
            ],
        )
        .unwrap();

        Function {
            name: "test".to_string(),
            endpoint: String::new(),
            runtime_stats: runtime,
            memory_stats: memory,
            invocations_per_minute: invocations,
        }
    }

    fn assert_no_spillover(data: &InvocationData) {
        for minute in &data.iat {
            if minute.is_empty() {
                continue;
            }
            let sum: f64 = minute.iter().sum();
            assert!(
                (sum - MINUTE_IN_MICROSECONDS).abs() < 1e-3,
                "minute sums to {} µs",
                sum
            );
        }
    }

    #[test]
    fn test_sequences_are_parallel() {
        let function = test_function(vec![5, 0, 12, 3]);
        let mut generator = SpecificationGenerator::new(SEED);
        let data = generator.generate_invocation_data(&function, IatDistribution::Exponential);

        assert_eq!(data.iat.len(), 4);
        assert_eq!(data.raw_duration.len(), 4);
        assert_eq!(data.spec.len(), 4);
        for (minute, &count) in function.invocations_per_minute.iter().enumerate() {
            assert_eq!(data.iat[minute].len(), count);
            assert_eq!(data.spec[minute].len(), count);
        }
        assert_eq!(data.total_invocations(), 20);
        assert_no_spillover(&data);
    }

    #[test]
    fn test_equidistant_schedule() {
        let function = test_function(vec![5; 5]);
        let mut generator = SpecificationGenerator::new(SEED);
        let data = generator.generate_invocation_data(&function, IatDistribution::Equidistant);

        for minute in &data.iat {
            assert_eq!(minute, &vec![12_000_000.0; 5]);
        }
        assert_no_spillover(&data);
    }

    #[test]
    fn test_all_zero_minutes_is_not_an_error() {
        let function = test_function(vec![0, 0, 0]);
        let mut generator = SpecificationGenerator::new(SEED);
        let data = generator.generate_invocation_data(&function, IatDistribution::Uniform);

        assert_eq!(data.total_invocations(), 0);
        assert!(data.iat.iter().all(Vec::is_empty));
        assert!(data.spec.iter().all(Vec::is_empty));
        assert_eq!(data.raw_duration, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fixed_seed_reproduces_schedule() {
        let function = test_function(vec![25, 7, 0, 100]);
        for distribution in [IatDistribution::Uniform, IatDistribution::Exponential] {
            let first =
                SpecificationGenerator::new(SEED).generate_invocation_data(&function, distribution);
            let second =
                SpecificationGenerator::new(SEED).generate_invocation_data(&function, distribution);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let function = test_function(vec![25]);
        let first = SpecificationGenerator::new(1)
            .generate_invocation_data(&function, IatDistribution::Uniform);
        let second = SpecificationGenerator::new(2)
            .generate_invocation_data(&function, IatDistribution::Uniform);
        assert_ne!(first.iat, second.iat);
    }

    #[test]
    fn test_profiles_stay_within_table_bounds() {
        let function = test_function(vec![200, 200]);
        let mut generator = SpecificationGenerator::new(SEED);
        let data = generator.generate_invocation_data(&function, IatDistribution::Uniform);

        for profile in data.spec.iter().flatten() {
            assert!(profile.runtime_ms <= 100);
            assert!((100..=10000).contains(&profile.memory_mib));
        }
    }

    #[test]
    fn test_concurrent_reads_match_serial_read() {
        let function = test_function(vec![5]);
        let mut generator = SpecificationGenerator::new(SEED);
        let data =
            Arc::new(generator.generate_invocation_data(&function, IatDistribution::Equidistant));

        let serial: HashSet<RuntimeSpecification> = data.spec[0].iter().copied().collect();

        let concurrent = Arc::new(Mutex::new(HashSet::new()));
        std::thread::scope(|scope| {
            for i in 0..5 {
                let data = Arc::clone(&data);
                let concurrent = Arc::clone(&concurrent);
                scope.spawn(move || {
                    let profile = data.spec[0][i];
                    concurrent.lock().unwrap().insert(profile);
                });
            }
        });

        assert_eq!(*concurrent.lock().unwrap(), serial);

        // The same seed reproduces the same multiset on a fresh generator.
        let again = SpecificationGenerator::new(SEED)
            .generate_invocation_data(&function, IatDistribution::Equidistant);
        let again: HashSet<RuntimeSpecification> = again.spec[0].iter().copied().collect();
        assert_eq!(again, serial);
    }
}
