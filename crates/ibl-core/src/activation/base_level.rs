//! ACT-R base-level learning.
//!
//! Implements the base-level learning equation:
//!
//! ```text
//! B_i = ln(sum(t_j^(-d))) + beta
//! ```
//!
//! Where:
//! - `t_j` is the time (in seconds) since the j-th presentation
//! - `d` is the decay parameter (typically 0.5)
//! - `beta` is the base-level constant
//!
//! and its optimized-learning approximation, which only needs the number of
//! presentations and the lifetime of the chunk:
//!
//! ```text
//! B_i = ln(n / (1 - d)) - d * ln(L) + beta
//! ```
//!
//! Presentation times and `now` share one simulation clock in seconds.
//! Presentations later than `now` have not happened yet and are ignored.

use super::config::{ActivationConfig, BllMode};

/// Calculate base-level activation from a presentation history.
///
/// Returns negative infinity when no presentation precedes `now`.
/// The base-level constant is included.
///
/// # Example
///
/// ```
/// use ibl_core::activation::{base_level_activation, ActivationConfig};
///
/// let config = ActivationConfig::default();
///
/// let old = base_level_activation(&[0.0], 100.0, &config);
/// let recent = base_level_activation(&[99.0], 100.0, &config);
/// assert!(recent > old);
/// ```
pub fn base_level_activation(presentations: &[f64], now: f64, config: &ActivationConfig) -> f64 {
    let raw = match config.bll_mode {
        BllMode::Exact => exact(presentations, now, config),
        BllMode::Optimized => optimized(presentations, now, config),
    };
    raw + config.base_constant
}

fn exact(presentations: &[f64], now: f64, config: &ActivationConfig) -> f64 {
    let sum: f64 = presentations
        .iter()
        .filter(|&&t| t <= now)
        .map(|&t| (now - t).max(config.min_time).powf(-config.decay))
        .sum();

    // ln(0) = -inf, which is what an empty history should produce
    sum.ln()
}

fn optimized(presentations: &[f64], now: f64, config: &ActivationConfig) -> f64 {
    let mut n = 0usize;
    let mut first = f64::INFINITY;
    for &t in presentations.iter().filter(|&&t| t <= now) {
        n += 1;
        first = first.min(t);
    }
    if n == 0 {
        return f64::NEG_INFINITY;
    }

    let lifetime = (now - first).max(config.min_time);
    (n as f64 / (1.0 - config.decay)).ln() - config.decay * lifetime.ln()
}

/// Seconds until a single presentation decays from `current_activation`
/// down to `threshold`.
///
/// For a single presentation `B = -d * ln(t) + beta`, so the crossing lag is
/// `exp((beta - threshold) / d)`. The result is measured from the
/// presentation time. Returns `None` when the activation is already at or
/// below the threshold, or when the crossing lies more than a year away.
pub fn time_until_threshold(
    current_activation: f64,
    threshold: f64,
    config: &ActivationConfig,
) -> Option<f64> {
    if current_activation <= threshold {
        return None;
    }

    let ln_t = (config.base_constant - threshold) / config.decay;
    let t = ln_t.exp();

    if !t.is_finite() || t > 365.0 * 24.0 * 60.0 * 60.0 {
        return None;
    }

    Some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history() {
        let config = ActivationConfig::default();
        let activation = base_level_activation(&[], 10.0, &config);
        assert_eq!(activation, f64::NEG_INFINITY);
    }

    #[test]
    fn test_future_presentations_ignored() {
        let config = ActivationConfig::default();
        assert_eq!(base_level_activation(&[20.0], 10.0, &config), f64::NEG_INFINITY);

        let with_future = base_level_activation(&[5.0, 20.0], 10.0, &config);
        let without = base_level_activation(&[5.0], 10.0, &config);
        assert_eq!(with_future, without);
    }

    #[test]
    fn test_single_presentation_value() {
        let config = ActivationConfig::default();
        // lag 4, d = 0.5: ln(4^-0.5) = -0.5 * ln 4
        let activation = base_level_activation(&[6.0], 10.0, &config);
        assert!((activation - (-0.5 * 4f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_recency_effect() {
        let config = ActivationConfig::default();
        let recent = base_level_activation(&[99.0], 100.0, &config);
        let old = base_level_activation(&[0.0], 100.0, &config);
        assert!(recent > old, "Recent {} should be > old {}", recent, old);
    }

    #[test]
    fn test_frequency_effect() {
        let config = ActivationConfig::default();
        let single = base_level_activation(&[90.0], 100.0, &config);
        let multiple = base_level_activation(&[90.0, 90.0, 90.0], 100.0, &config);
        assert!(
            (multiple - single - 3f64.ln()).abs() < 1e-12,
            "Three identical presentations add ln 3"
        );
    }

    #[test]
    fn test_base_constant_effect() {
        let plain = ActivationConfig::default();
        let boosted = ActivationConfig::default().with_base_constant(1.0);
        let a = base_level_activation(&[1.0, 4.0], 10.0, &plain);
        let b = base_level_activation(&[1.0, 4.0], 10.0, &boosted);
        assert!((b - a - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_decay_parameter_effect() {
        let slow = ActivationConfig::default().with_decay(0.3);
        let fast = ActivationConfig::default().with_decay(0.7);
        let slow_activation = base_level_activation(&[0.0], 100.0, &slow);
        let fast_activation = base_level_activation(&[0.0], 100.0, &fast);
        assert!(slow_activation > fast_activation);
    }

    #[test]
    fn test_min_time_guard() {
        let config = ActivationConfig::default();
        let activation = base_level_activation(&[10.0], 10.0, &config);
        assert!(activation.is_finite(), "Activation should be finite");
        let expected = config.min_time.powf(-config.decay).ln();
        assert!((activation - expected).abs() < 1e-12);
    }

    #[test]
    fn test_optimized_matches_formula() {
        let config = ActivationConfig::default().with_bll_mode(BllMode::Optimized);
        let presentations = [0.0, 20.0, 50.0, 80.0];
        let activation = base_level_activation(&presentations, 100.0, &config);
        let expected = (4.0 / 0.5f64).ln() - 0.5 * 100f64.ln();
        assert!((activation - expected).abs() < 1e-12);
    }

    #[test]
    fn test_optimized_tracks_exact_for_spread_presentations() {
        let exact_cfg = ActivationConfig::default();
        let opt_cfg = ActivationConfig::default().with_bll_mode(BllMode::Optimized);
        let presentations: Vec<f64> = (0..100).map(|i| i as f64 * 10.0).collect();
        let now = 1000.0;
        let exact_activation = base_level_activation(&presentations, now, &exact_cfg);
        let opt_activation = base_level_activation(&presentations, now, &opt_cfg);
        assert!(
            (exact_activation - opt_activation).abs() < 0.25,
            "exact {} vs optimized {}",
            exact_activation,
            opt_activation
        );
    }

    #[test]
    fn test_time_until_threshold() {
        let config = ActivationConfig::default();

        let result = time_until_threshold(1.0, -2.0, &config);
        // exp(2 / 0.5) = e^4
        assert!((result.unwrap() - 4f64.exp()).abs() < 1e-9);

        assert!(time_until_threshold(-3.0, -2.0, &config).is_none());
        assert!(time_until_threshold(1.0, -20.0, &config).is_none());
    }
}
