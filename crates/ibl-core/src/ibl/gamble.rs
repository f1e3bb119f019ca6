//! Gambles: discrete outcome distributions an agent chooses between.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{IblError, IblResult};

/// Allowed deviation of the probabilities' sum from 1.
const SUM_TOLERANCE: f64 = 1e-6;

/// A gamble paying `outcomes[i]` with probability `probabilities[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gamble {
    pub label: String,
    pub outcomes: Vec<f64>,
    pub probabilities: Vec<f64>,
}

impl Gamble {
    /// Create a validated gamble.
    pub fn new(
        label: impl Into<String>,
        outcomes: Vec<f64>,
        probabilities: Vec<f64>,
    ) -> IblResult<Self> {
        let gamble = Self {
            label: label.into(),
            outcomes,
            probabilities,
        };
        gamble.validate()?;
        Ok(gamble)
    }

    /// A gamble that always pays `outcome`.
    pub fn sure(label: impl Into<String>, outcome: f64) -> Self {
        Self {
            label: label.into(),
            outcomes: vec![outcome],
            probabilities: vec![1.0],
        }
    }

    /// Check lengths, finiteness, and that probabilities form a distribution.
    pub fn validate(&self) -> IblResult<()> {
        if self.label.is_empty() {
            return Err(IblError::empty("gamble label"));
        }
        if self.outcomes.is_empty() {
            return Err(IblError::empty(format!("outcomes of gamble '{}'", self.label)));
        }
        if self.outcomes.len() != self.probabilities.len() {
            return Err(IblError::validation(format!(
                "gamble '{}' has {} outcomes but {} probabilities",
                self.label,
                self.outcomes.len(),
                self.probabilities.len()
            )));
        }
        if self.outcomes.iter().any(|v| !v.is_finite()) {
            return Err(IblError::validation(format!(
                "gamble '{}' has a non-finite outcome",
                self.label
            )));
        }
        if self.probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(IblError::validation(format!(
                "gamble '{}' has a negative or non-finite probability",
                self.label
            )));
        }
        let total: f64 = self.probabilities.iter().sum();
        if (total - 1.0).abs() > SUM_TOLERANCE {
            return Err(IblError::invalid_parameter(
                format!("probabilities of gamble '{}' sum to {}", self.label, total),
                "Make the probabilities of each gamble sum to 1",
            ));
        }
        Ok(())
    }

    /// Play the gamble once.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> IblResult<f64> {
        let index = WeightedIndex::new(&self.probabilities)
            .map_err(|e| IblError::numerical(format!("gamble '{}': {}", self.label, e)))?;
        Ok(self.outcomes[index.sample(rng)])
    }

    /// Expected value `sum_i p_i * v_i`.
    pub fn expected_value(&self) -> f64 {
        self.outcomes
            .iter()
            .zip(&self.probabilities)
            .map(|(v, p)| v * p)
            .sum()
    }
}

/// The classic safe/risky pair: 3 for sure, or 4 with probability 0.8.
pub fn default_gambles() -> Vec<Gamble> {
    vec![
        Gamble::sure("safe", 3.0),
        Gamble {
            label: "risky".to_string(),
            outcomes: vec![4.0, 0.0],
            probabilities: vec![0.8, 0.2],
        },
    ]
}
