//! Goodness-of-fit validation for generated schedules
//!
//! A one-sample Kolmogorov–Smirnov test against the raw gap families the IAT
//! generator draws from: U(0, 1) for the uniform sampler, Exp(1) for the
//! exponential one. The rescale that closes each minute is a linear scale, so
//! raw samples are recovered from a scheduled minute as
//! `gap * raw_total / 60_000_000` and tested unscaled.
//!
//! This is a verification-time interface only: nothing in the dispatch path
//! depends on it.

use crate::generator::iat::MINUTE_IN_MICROSECONDS;

/// Raw gap family to test against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapFamily {
    /// U(0, 1)
    Uniform,
    /// Exp(rate 1)
    Exponential,
}

impl GapFamily {
    /// Closed-form CDF of the family
    fn cdf(&self, x: f64) -> f64 {
        match self {
            GapFamily::Uniform => x.clamp(0.0, 1.0),
            GapFamily::Exponential => {
                if x <= 0.0 {
                    0.0
                } else {
                    1.0 - (-x).exp()
                }
            }
        }
    }
}

/// Result of a Kolmogorov–Smirnov test
#[derive(Debug, Clone, Copy)]
pub struct KsReport {
    /// Sup distance between the empirical and theoretical CDFs
    pub statistic: f64,
    /// Critical value at the requested significance level
    pub critical: f64,
    /// Sample count
    pub n: usize,
    /// Whether the sample is consistent with the family at this level
    pub passed: bool,
}

/// One-sample Kolmogorov–Smirnov test of `samples` against `family`
///
/// `alpha` is the significance level (e.g. 0.05). Uses the Stephens
/// approximation for the critical value, accurate from small n onward. An
/// empty sample trivially passes: a zero-invocation minute has no shape to
/// test.
pub fn ks_test(samples: &[f64], family: GapFamily, alpha: f64) -> KsReport {
    let n = samples.len();
    if n == 0 {
        return KsReport {
            statistic: 0.0,
            critical: 0.0,
            n,
            passed: true,
        };
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n_f = n as f64;
    let mut statistic: f64 = 0.0;
    for (i, &x) in sorted.iter().enumerate() {
        let cdf = family.cdf(x);
        let below = cdf - i as f64 / n_f;
        let above = (i + 1) as f64 / n_f - cdf;
        statistic = statistic.max(below).max(above);
    }

    // c(alpha) = sqrt(-ln(alpha/2) / 2); 1.358 at alpha = 0.05
    let c = (-(alpha / 2.0).ln() / 2.0).sqrt();
    let critical = c / (n_f.sqrt() + 0.12 + 0.11 / n_f.sqrt());

    KsReport {
        statistic,
        critical,
        n,
        passed: statistic < critical,
    }
}

/// Recover the raw (pre-rescale) gaps of one scheduled minute
///
/// Inverts the linear rescale using the minute's retained raw total. The
/// result is suitable for [`ks_test`] against the requested family.
pub fn raw_minute_samples(gaps: &[f64], raw_total: f64) -> Vec<f64> {
    gaps.iter()
        .map(|gap| gap * raw_total / MINUTE_IN_MICROSECONDS)
        .collect()
}
