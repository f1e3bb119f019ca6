//! Softmax choice rule.
//!
//! ```text
//! Pr(choice = a) = exp(v_a / phi) / sum_c exp(v_c / phi)
//! ```
//!
//! Values are shifted by their maximum before exponentiating, so large
//! utilities cannot overflow.

use crate::error::{ensure_positive, IblError, IblResult};

fn check_values(values: &[f64], temperature: f64) -> IblResult<f64> {
    if values.is_empty() {
        return Err(IblError::empty("choice set"));
    }
    ensure_positive("temperature", temperature)?;
    if values.iter().any(|v| v.is_nan() || *v == f64::INFINITY) {
        return Err(IblError::numerical("choice values contain NaN or +inf"));
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return Err(IblError::Numerical {
            message: "every choice value is -inf".to_string(),
            code: crate::error::ErrorCode::NumNoFiniteValue,
        });
    }
    Ok(max)
}

/// Choice probabilities for `values` at temperature `temperature`.
///
/// Entries equal to negative infinity receive probability 0.
///
/// # Example
///
/// ```
/// use ibl_core::choice::softmax;
///
/// let probs = softmax(&[1.0, 2.0, 3.0], 0.5).unwrap();
/// assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
/// assert!(probs[2] > probs[1] && probs[1] > probs[0]);
/// ```
pub fn softmax(values: &[f64], temperature: f64) -> IblResult<Vec<f64>> {
    let max = check_values(values, temperature)?;
    let weights: Vec<f64> = values
        .iter()
        .map(|v| ((v - max) / temperature).exp())
        .collect();
    // the maximum contributes exp(0) = 1, so the sum is at least 1
    let total: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| w / total).collect())
}

/// Log choice probabilities, computed without exponentiating the winner.
pub fn log_softmax(values: &[f64], temperature: f64) -> IblResult<Vec<f64>> {
    let max = check_values(values, temperature)?;
    let log_total = values
        .iter()
        .map(|v| ((v - max) / temperature).exp())
        .sum::<f64>()
        .ln();
    Ok(values
        .iter()
        .map(|v| (v - max) / temperature - log_total)
        .collect())
}

/// Probability of choosing option `index`.
pub fn choice_probability(values: &[f64], index: usize, temperature: f64) -> IblResult<f64> {
    if index >= values.len() {
        return Err(IblError::index_out_of_range("choice", index, values.len()));
    }
    Ok(softmax(values, temperature)?[index])
}
