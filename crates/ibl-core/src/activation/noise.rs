//! Logistic noise and retrieval probability for ACT-R activation.
//!
//! ```text
//! P(recall) = 1 / (1 + exp((tau - A) / s))
//! ```
//!
//! Where:
//! - `tau` = retrieval threshold
//! - `A` = activation
//! - `s` = noise scale parameter
//!
//! Activation noise follows a logistic distribution with location 0 and
//! scale `s`.

use rand::Rng;
use std::f64::consts::PI;

use super::config::ActivationConfig;

/// Sample activation noise from a logistic distribution with scale
/// `config.noise`.
///
/// Uses the inverse CDF `s * ln(u / (1 - u))` with `u` drawn from the open
/// unit interval.
pub fn activation_noise<R: Rng + ?Sized>(rng: &mut R, config: &ActivationConfig) -> f64 {
    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
    config.noise * (u / (1.0 - u)).ln()
}

/// Probability that a chunk with activation `activation` is retrieved
/// rather than falling below the threshold.
///
/// # Example
///
/// ```
/// use ibl_core::activation::{retrieval_probability, ActivationConfig};
///
/// let config = ActivationConfig::default();
///
/// assert!(retrieval_probability(1.0, &config) > 0.9);
/// assert!(retrieval_probability(-5.0, &config) < 0.1);
/// let at_threshold = retrieval_probability(config.retrieval_threshold, &config);
/// assert!((at_threshold - 0.5).abs() < 1e-12);
/// ```
pub fn retrieval_probability(activation: f64, config: &ActivationConfig) -> f64 {
    let exponent = (config.retrieval_threshold - activation) / config.noise;

    // Guard against overflow
    if exponent > 700.0 {
        return 0.0;
    }
    if exponent < -700.0 {
        return 1.0;
    }

    1.0 / (1.0 + exponent.exp())
}

/// Variance of the logistic distribution with scale `s`: `(s * pi)^2 / 3`.
pub fn logistic_variance(scale: f64) -> f64 {
    (scale * PI).powi(2) / 3.0
}

/// Standard deviation of the logistic distribution.
pub fn logistic_std_dev(scale: f64) -> f64 {
    logistic_variance(scale).sqrt()
}
