//! Configuration for the ACT-R activation model.
//!
//! Provides the parameters for base-level learning, logistic activation
//! noise, and the retrieval threshold.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{ensure_finite, ensure_positive, IblError, IblResult};

/// How base-level activation is computed from a presentation history.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BllMode {
    /// Sum over every presentation: `B = ln(sum((t - t_j)^(-d)))`.
    #[default]
    Exact,
    /// ACT-R optimized learning: `B = ln(n / (1 - d)) - d * ln(L)`.
    Optimized,
}

/// Configuration for ACT-R activation.
///
/// ```text
/// B_i = ln(sum(t_j^(-d))) + beta
/// ```
///
/// Where:
/// - `t_j` is the time (in seconds) since the j-th presentation
/// - `d` is the decay parameter (typically 0.5)
/// - `beta` is the base-level constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// Decay parameter (d). Higher values mean faster forgetting.
    pub decay: f64,

    /// Logistic noise scale (s).
    ///
    /// Also sets the blending temperature `s * sqrt(2)` and the default
    /// race scale `s * pi / sqrt(3)`.
    pub noise: f64,

    /// Retrieval threshold (tau). The failure accumulator races with `mu = -tau`.
    pub retrieval_threshold: f64,

    /// Base-level constant (beta), added to every activation.
    pub base_constant: f64,

    /// Smallest lag (seconds) used in the decay term, guarding `0^(-d)`.
    pub min_time: f64,

    /// Base-level computation mode.
    pub bll_mode: BllMode,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            decay: 0.5,
            noise: 0.4,
            retrieval_threshold: -2.0,
            base_constant: 0.0,
            min_time: 0.05,
            bll_mode: BllMode::Exact,
        }
    }
}

impl ActivationConfig {
    /// Create a new ActivationConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the decay parameter.
    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    /// Set the noise scale.
    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    /// Set the retrieval threshold.
    pub fn with_retrieval_threshold(mut self, threshold: f64) -> Self {
        self.retrieval_threshold = threshold;
        self
    }

    /// Set the base-level constant.
    pub fn with_base_constant(mut self, base_constant: f64) -> Self {
        self.base_constant = base_constant;
        self
    }

    /// Set the base-level mode.
    pub fn with_bll_mode(mut self, mode: BllMode) -> Self {
        self.bll_mode = mode;
        self
    }

    /// Temperature used when blending and when converting activations
    /// into retrieval probabilities: `s * sqrt(2)`.
    pub fn blending_temperature(&self) -> f64 {
        self.noise * std::f64::consts::SQRT_2
    }

    /// Lognormal race scale implied by the noise: `s * pi / sqrt(3)`.
    pub fn race_sigma(&self) -> f64 {
        self.noise * std::f64::consts::PI / 3f64.sqrt()
    }

    /// Check that every parameter is inside its valid range.
    pub fn validate(&self) -> IblResult<()> {
        ensure_positive("decay", self.decay)?;
        ensure_positive("noise", self.noise)?;
        ensure_positive("min_time", self.min_time)?;
        ensure_finite("retrieval_threshold", self.retrieval_threshold)?;
        ensure_finite("base_constant", self.base_constant)?;
        if self.bll_mode == BllMode::Optimized && self.decay >= 1.0 {
            return Err(IblError::invalid_parameter(
                format!("optimized learning requires decay < 1, got {}", self.decay),
                "Lower decay below 1 or use bll_mode = \"exact\"",
            ));
        }
        Ok(())
    }
}
