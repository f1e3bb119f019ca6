//! Lognormal Race model.
//!
//! A set of accumulators race; accumulator `k` finishes after a lognormal
//! time with location `mu_k` and a shared scale `sigma`. The first to finish
//! determines the response, and the observed reaction time adds a fixed
//! encoding/response time `t_er`:
//!
//! ```text
//! likelihood(r, rt) = pdf(t; mu_r, sigma) * prod_{k != r} (1 - cdf(t; mu_k, sigma))
//! t = rt - t_er
//! ```
//!
//! Retrieval failure is not special-cased. Callers that model it add an
//! accumulator of their own (see [`crate::retrieval`]).

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{ensure_finite, ensure_positive, IblError, IblResult};
use crate::likelihood::LogLikelihood;
use crate::lognormal::LogNormal;

/// Number of Simpson intervals used to integrate a winner's density.
const QUADRATURE_INTERVALS: usize = 4000;

/// Half-width, in units of sigma, of the log-time integration window.
const QUADRATURE_SPAN: f64 = 12.0;

/// One observed (or simulated) race: which accumulator won, and when.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaceTrial {
    /// Index of the winning accumulator.
    pub winner: usize,
    /// Reaction time in seconds, including `t_er`.
    pub rt: f64,
}

/// Lognormal race between a fixed set of accumulators.
///
/// Deserializes from `{ mu, sigma, t_er }` through [`LognormalRace::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RaceParams", into = "RaceParams")]
pub struct LognormalRace {
    accumulators: Vec<LogNormal>,
    sigma: f64,
    t_er: f64,
}

#[derive(Serialize, Deserialize)]
struct RaceParams {
    mu: Vec<f64>,
    sigma: f64,
    t_er: f64,
}

impl TryFrom<RaceParams> for LognormalRace {
    type Error = IblError;

    fn try_from(params: RaceParams) -> IblResult<Self> {
        LognormalRace::new(params.mu, params.sigma, params.t_er)
    }
}

impl From<LognormalRace> for RaceParams {
    fn from(race: LognormalRace) -> Self {
        Self {
            mu: race.mu(),
            sigma: race.sigma,
            t_er: race.t_er,
        }
    }
}

impl LognormalRace {
    /// Create a race.
    ///
    /// Requires at least one accumulator, finite `mu` values, a finite
    /// `sigma > 0`, and a finite `t_er >= 0`.
    pub fn new(mu: Vec<f64>, sigma: f64, t_er: f64) -> IblResult<Self> {
        if mu.is_empty() {
            return Err(IblError::empty("race accumulators"));
        }
        ensure_positive("sigma", sigma)?;
        let accumulators = mu
            .into_iter()
            .map(|m| LogNormal::new(m, sigma))
            .collect::<IblResult<Vec<_>>>()?;
        ensure_finite("t_er", t_er)?;
        if t_er < 0.0 {
            return Err(IblError::invalid_parameter(
                format!("t_er must be >= 0, got {}", t_er),
                "Set t_er to the non-decision time in seconds",
            ));
        }
        Ok(Self {
            accumulators,
            sigma,
            t_er,
        })
    }

    /// Location parameters, one per accumulator.
    pub fn mu(&self) -> Vec<f64> {
        self.accumulators.iter().map(LogNormal::mu).collect()
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn t_er(&self) -> f64 {
        self.t_er
    }

    /// Number of accumulators.
    pub fn len(&self) -> usize {
        self.accumulators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulators.is_empty()
    }

    fn check_winner(&self, winner: usize) -> IblResult<()> {
        if winner < self.accumulators.len() {
            Ok(())
        } else {
            Err(IblError::index_out_of_range("winner", winner, self.accumulators.len()))
        }
    }

    /// Joint density of `winner` finishing first at reaction time `rt`.
    pub fn likelihood(&self, winner: usize, rt: f64) -> IblResult<f64> {
        self.check_winner(winner)?;
        let t = rt - self.t_er;
        if t <= 0.0 {
            return Ok(0.0);
        }
        let mut density = self.accumulators[winner].pdf(t);
        for k in (0..self.len()).filter(|&k| k != winner) {
            density *= self.accumulators[k].sf(t);
        }
        Ok(density)
    }

    /// Log of [`LognormalRace::likelihood`], computed in log space.
    ///
    /// Returns negative infinity (never NaN) when the density underflows or
    /// `rt <= t_er`.
    pub fn ln_likelihood(&self, winner: usize, rt: f64) -> IblResult<f64> {
        self.check_winner(winner)?;
        let t = rt - self.t_er;
        if t <= 0.0 {
            return Ok(f64::NEG_INFINITY);
        }
        let mut total = self.accumulators[winner].ln_pdf(t);
        for k in (0..self.len()).filter(|&k| k != winner) {
            total += self.accumulators[k].ln_sf(t);
        }
        Ok(total)
    }

    /// Summed log-likelihood of independent trials.
    pub fn ln_likelihood_trials(&self, trials: &[RaceTrial]) -> IblResult<f64> {
        let mut acc = LogLikelihood::new();
        for trial in trials {
            acc.add_log_density(self.ln_likelihood(trial.winner, trial.rt)?)?;
        }
        Ok(acc.value())
    }

    /// Simulate one race.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> RaceTrial {
        let mut winner = 0;
        let mut best = f64::INFINITY;
        for k in 0..self.len() {
            let t = self.accumulators[k].sample(rng);
            if t < best {
                best = t;
                winner = k;
            }
        }
        RaceTrial {
            winner,
            rt: best + self.t_er,
        }
    }

    /// Probability that `winner` finishes first, integrating its density
    /// over all times.
    ///
    /// Uses composite Simpson quadrature on `x = ln t`, where the winner's
    /// density becomes a normal density in `x`.
    pub fn winner_probability(&self, winner: usize) -> IblResult<f64> {
        self.check_winner(winner)?;

        // integrand <= winner's normal density in x; window centred on its mu
        let center = self.accumulators[winner].mu();
        let lo = center - QUADRATURE_SPAN * self.sigma;
        let hi = center + QUADRATURE_SPAN * self.sigma;
        let h = (hi - lo) / QUADRATURE_INTERVALS as f64;
        let norm = 1.0 / (self.sigma * (2.0 * PI).sqrt());

        let integrand = |x: f64| {
            let z = (x - center) / self.sigma;
            let mut value = norm * (-0.5 * z * z).exp();
            let t = x.exp();
            for k in (0..self.len()).filter(|&k| k != winner) {
                value *= self.accumulators[k].sf(t);
            }
            value
        };

        let mut sum = integrand(lo) + integrand(hi);
        for i in 1..QUADRATURE_INTERVALS {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += weight * integrand(lo + i as f64 * h);
        }
        Ok((sum * h / 3.0).clamp(0.0, 1.0))
    }

    /// Winner probabilities for every accumulator.
    pub fn winner_probabilities(&self) -> Vec<f64> {
        (0..self.len())
            .map(|k| self.winner_probability(k).unwrap_or(0.0))
            .collect()
    }
}
