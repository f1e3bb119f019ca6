//! Lognormal distribution primitives used by the race model.
//!
//! ```text
//! pdf(t) = 1 / (t * sigma * sqrt(2 pi)) * exp(-(ln t - mu)^2 / (2 sigma^2))
//! cdf(t) = 1/2 + 1/2 * erf((ln t - mu) / (sqrt(2) sigma))
//! ```
//!
//! Both are defined for `t > 0`; at or below zero the density is 0 and the
//! distribution function is 0.

use rand::Rng;
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;
use std::f64::consts::{PI, SQRT_2};

use crate::error::{ensure_finite, ensure_positive, IblError, IblResult};

/// Lognormal distribution with location `mu` and scale `sigma` on the log
/// scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LogNormalParams", into = "LogNormalParams")]
pub struct LogNormal {
    mu: f64,
    sigma: f64,
}

#[derive(Serialize, Deserialize)]
struct LogNormalParams {
    mu: f64,
    sigma: f64,
}

impl TryFrom<LogNormalParams> for LogNormal {
    type Error = IblError;

    fn try_from(params: LogNormalParams) -> IblResult<Self> {
        LogNormal::new(params.mu, params.sigma)
    }
}

impl From<LogNormal> for LogNormalParams {
    fn from(dist: LogNormal) -> Self {
        Self {
            mu: dist.mu,
            sigma: dist.sigma,
        }
    }
}

impl LogNormal {
    /// Create a distribution; `mu` must be finite and `sigma` finite and > 0.
    pub fn new(mu: f64, sigma: f64) -> IblResult<Self> {
        ensure_finite("mu", mu)?;
        ensure_positive("sigma", sigma)?;
        Ok(Self { mu, sigma })
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    fn z(&self, t: f64) -> f64 {
        (t.ln() - self.mu) / self.sigma
    }

    /// Probability density at `t`.
    pub fn pdf(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        let z = self.z(t);
        (-0.5 * z * z).exp() / (t * self.sigma * (2.0 * PI).sqrt())
    }

    /// Log density at `t`; negative infinity for `t <= 0`.
    pub fn ln_pdf(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let z = self.z(t);
        -0.5 * z * z - t.ln() - self.sigma.ln() - 0.5 * (2.0 * PI).ln()
    }

    /// Cumulative distribution function at `t`.
    pub fn cdf(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        // 1/2 + 1/2 erf(x) == 1/2 erfc(-x), accurate in the lower tail
        0.5 * erfc(-self.z(t) / SQRT_2)
    }

    /// Survivor function `1 - cdf(t)`, accurate in the upper tail.
    pub fn sf(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 1.0;
        }
        0.5 * erfc(self.z(t) / SQRT_2)
    }

    /// Log survivor function; negative infinity once the survivor underflows.
    pub fn ln_sf(&self, t: f64) -> f64 {
        self.sf(t).ln()
    }

    /// Draw one variate.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let normal: f64 = rand_distr::StandardNormal.sample(rng);
        (self.mu + self.sigma * normal).exp()
    }

    /// Mean of the distribution: `exp(mu + sigma^2 / 2)`.
    pub fn mean(&self) -> f64 {
        (self.mu + 0.5 * self.sigma * self.sigma).exp()
    }
}
