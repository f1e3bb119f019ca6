//! Log-likelihood accumulation over independent trials.
//!
//! Each trial contributes exactly one term. A trial with probability zero
//! drives the total to negative infinity; that is a legitimate value, not an
//! error. NaN inputs are rejected so they never leak into the total.

use serde::{Deserialize, Serialize};

use crate::error::{IblError, IblResult};

/// Slack allowed above 1 for probabilities produced by floating point sums.
const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Running sum of per-trial log-likelihood terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogLikelihood {
    total: f64,
    trials: usize,
}

impl Default for LogLikelihood {
    fn default() -> Self {
        Self::new()
    }
}

impl LogLikelihood {
    pub fn new() -> Self {
        Self {
            total: 0.0,
            trials: 0,
        }
    }

    /// Add a trial with probability `p` (a discrete outcome such as a choice).
    pub fn add_probability(&mut self, p: f64) -> IblResult<()> {
        if p.is_nan() || p < 0.0 || p > 1.0 + PROBABILITY_TOLERANCE {
            return Err(IblError::invalid_probability(p));
        }
        self.push(p.min(1.0).ln());
        Ok(())
    }

    /// Add a trial given as a log probability.
    pub fn add_log_probability(&mut self, lp: f64) -> IblResult<()> {
        if lp.is_nan() || lp > PROBABILITY_TOLERANCE {
            return Err(IblError::invalid_probability(lp.exp()));
        }
        self.push(lp.min(0.0));
        Ok(())
    }

    /// Add a trial given as a log density (continuous outcomes, may be > 0).
    pub fn add_log_density(&mut self, ld: f64) -> IblResult<()> {
        if ld.is_nan() || ld == f64::INFINITY {
            return Err(IblError::numerical(format!("log density {} is not usable", ld)));
        }
        self.push(ld);
        Ok(())
    }

    fn push(&mut self, term: f64) {
        // -inf + finite stays -inf; +inf is rejected above so NaN cannot appear
        self.total += term;
        self.trials += 1;
    }

    /// Total log-likelihood.
    pub fn value(&self) -> f64 {
        self.total
    }

    /// Number of trials added.
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Whether some trial had probability zero.
    pub fn is_impossible(&self) -> bool {
        self.total == f64::NEG_INFINITY
    }
}

/// Sum log densities of independent trials.
pub fn sum_log_densities<I>(terms: I) -> IblResult<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut acc = LogLikelihood::new();
    for term in terms {
        acc.add_log_density(term)?;
    }
    Ok(acc.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_of_logs() {
        let probs = [0.5, 0.25, 0.8, 0.1];
        let mut acc = LogLikelihood::new();
        for p in probs {
            acc.add_probability(p).unwrap();
        }
        let expected: f64 = probs.iter().map(|p| p.ln()).sum();
        assert!((acc.value() - expected).abs() < 1e-12);
        assert_eq!(acc.trials(), 4);
    }

    #[test]
    fn test_zero_probability_is_negative_infinity() {
        let mut acc = LogLikelihood::new();
        acc.add_probability(0.3).unwrap();
        acc.add_probability(0.0).unwrap();
        acc.add_probability(0.9).unwrap();
        assert_eq!(acc.value(), f64::NEG_INFINITY);
        assert!(acc.is_impossible());
        assert!(!acc.value().is_nan());

        acc.add_log_density(f64::NEG_INFINITY).unwrap();
        assert_eq!(acc.value(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_rejects_invalid_probabilities() {
        let mut acc = LogLikelihood::new();
        assert!(acc.add_probability(f64::NAN).is_err());
        assert!(acc.add_probability(-0.1).is_err());
        assert!(acc.add_probability(1.5).is_err());
        assert!(acc.add_log_probability(0.5).is_err());
        assert!(acc.add_log_density(f64::NAN).is_err());
        assert!(acc.add_log_density(f64::INFINITY).is_err());
        assert_eq!(acc.trials(), 0);
        assert_eq!(acc.value(), 0.0);
    }

    #[test]
    fn test_rounding_above_one_is_clamped() {
        let mut acc = LogLikelihood::new();
        acc.add_probability(1.0 + 1e-12).unwrap();
        assert_eq!(acc.value(), 0.0);
    }

    #[test]
    fn test_log_density_may_be_positive() {
        let total = sum_log_densities([1.2, -0.4, 0.3]).unwrap();
        assert!((total - 1.1).abs() < 1e-12);
    }
}
