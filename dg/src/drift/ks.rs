//! Two-sample Kolmogorov-Smirnov test
//!
//! The statistic is the largest vertical distance between the two empirical
//! CDFs. Internally it is kept as the integer `h = max |i*n2 - j*n1|` where
//! `i` and `j` count the samples at or below each observed value, so
//! `D = h / (n1 * n2)` and the exact p-value can be computed without rounding
//! the statistic.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;

/// Largest sample size for which `Auto` uses the exact distribution
pub const EXACT_MAX_SAMPLE: usize = 10_000;

/// How the p-value is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KsMethod {
    /// Exact for samples up to [`EXACT_MAX_SAMPLE`], asymptotic above
    #[default]
    Auto,
    /// Exact two-sided distribution via lattice path counting
    Exact,
    /// Kolmogorov limiting distribution with small-sample correction
    Asymptotic,
}

/// Statistic and two-sided p-value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Run the two-sided two-sample KS test
///
/// Samples must be non-empty and free of NaN.
pub fn ks_2samp(a: &[f64], b: &[f64], method: KsMethod) -> Result<KsResult, ValidationError> {
    debug!(n1 = a.len(), n2 = b.len(), ?method, "ks_2samp: called");
    if a.is_empty() || b.is_empty() {
        return Err(ValidationError::StatisticalTest(format!(
            "KS test needs two non-empty samples, got sizes {} and {}",
            a.len(),
            b.len()
        )));
    }
    if a.iter().chain(b.iter()).any(|v| v.is_nan()) {
        return Err(ValidationError::StatisticalTest("KS test input contains NaN".to_string()));
    }

    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let (n1, n2) = (a.len() as u64, b.len() as u64);
    let h = max_deviation(&a, &b);
    let statistic = h as f64 / (n1 * n2) as f64;

    let exact = match method {
        KsMethod::Exact => true,
        KsMethod::Asymptotic => false,
        KsMethod::Auto => a.len().max(b.len()) <= EXACT_MAX_SAMPLE,
    };

    let p_value = if h == 0 {
        1.0
    } else if exact {
        exact_p_value(a.len(), b.len(), h)
    } else {
        asymptotic_p_value(statistic, a.len(), b.len())
    };

    Ok(KsResult {
        statistic,
        p_value: p_value.clamp(0.0, 1.0),
    })
}

/// `max |i*n2 - j*n1|` over every observed value, both samples sorted
fn max_deviation(a: &[f64], b: &[f64]) -> u64 {
    let (n1, n2) = (a.len() as i128, b.len() as i128);
    let (mut i, mut j) = (0usize, 0usize);
    let mut h = 0i128;

    while i < a.len() || j < b.len() {
        // Next distinct value; advance past every copy of it in both samples
        let v = match (a.get(i), b.get(j)) {
            (Some(&x), Some(&y)) => x.min(y),
            (Some(&x), None) => x,
            (None, Some(&y)) => y,
            (None, None) => break,
        };
        while i < a.len() && a[i] <= v {
            i += 1;
        }
        while j < b.len() && b[j] <= v {
            j += 1;
        }
        h = h.max((i as i128 * n2 - j as i128 * n1).abs());
    }

    h as u64
}

/// Probability that a uniformly random lattice path from `(0, 0)` to
/// `(n1, n2)` reaches `|i*n2 - j*n1| >= h`
///
/// Mass is pushed forward one row at a time with hypergeometric step
/// probabilities; any mass stepping onto a cell at or beyond the boundary is
/// absorbed into the result. Summing the absorbed mass keeps tiny p-values
/// accurate where `1 - P(stay inside)` would cancel to zero.
fn exact_p_value(n1: usize, n2: usize, h: u64) -> f64 {
    let (n1i, n2i, h) = (n1 as i128, n2 as i128, h as i128);
    let outside = |i: usize, j: usize| (i as i128 * n2i - j as i128 * n1i).abs() >= h;

    let mut absorbed = 0.0f64;
    let mut row = vec![0.0f64; n2 + 1];
    row[0] = 1.0;

    for i in 0..=n1 {
        let mut next = vec![0.0f64; n2 + 1];
        for j in 0..=n2 {
            let mass = row[j];
            if mass == 0.0 {
                continue;
            }
            let remaining = ((n1 - i) + (n2 - j)) as f64;
            if remaining == 0.0 {
                continue;
            }

            if i < n1 {
                let step = mass * (n1 - i) as f64 / remaining;
                if outside(i + 1, j) {
                    absorbed += step;
                } else {
                    next[j] += step;
                }
            }
            if j < n2 {
                let step = mass * (n2 - j) as f64 / remaining;
                if outside(i, j + 1) {
                    absorbed += step;
                } else {
                    row[j + 1] += step;
                }
            }
        }
        row = next;
    }

    absorbed
}

/// Kolmogorov survival function at `(sqrt(en) + 0.12 + 0.11 / sqrt(en)) * d`
fn asymptotic_p_value(d: f64, n1: usize, n2: usize) -> f64 {
    let en = (n1 as f64 * n2 as f64) / (n1 + n2) as f64;
    let root = en.sqrt();
    let lambda = (root + 0.12 + 0.11 / root) * d;
    kolmogorov_sf(lambda)
}

fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda < 0.2 {
        // Series converges too slowly here and the value is 1 to double precision
        return 1.0;
    }

    let a2 = -2.0 * lambda * lambda;
    let mut sign = 1.0;
    let mut sum = 0.0;
    let mut previous_term = 0.0;

    for k in 1..=100 {
        let k = k as f64;
        let term = sign * 2.0 * (a2 * k * k).exp();
        sum += term;
        if term.abs() <= 1e-10 * previous_term || term.abs() <= 1e-16 * sum {
            return sum;
        }
        sign = -sign;
        previous_term = term.abs();
    }

    1.0
}
