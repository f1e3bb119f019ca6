//! Memory retrieval timed by a Lognormal Race.
//!
//! Every chunk matching a request runs an accumulator with `mu = -A`, its
//! negated activation. A failure accumulator with `mu = -tau` (the
//! retrieval threshold) always takes part and is always the last one. All
//! accumulators share `sigma`, which defaults to the logistic noise scale
//! converted to a standard deviation, `s * pi / sqrt(3)`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::activation::ActivationConfig;
use crate::error::{ensure_finite, ensure_positive, IblError, IblResult};
use crate::likelihood::LogLikelihood;
use crate::memory::{DeclarativeMemory, Request, RetrievalProbabilities};
use crate::race::LognormalRace;

/// Parameters specific to timed retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Race scale. `None` derives it from the activation noise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sigma: Option<f64>,
    /// Encoding plus response time added to every retrieval time (seconds).
    pub encoding_response_time: f64,
    /// Whether a successful retrieval presents the chunk again at `time + rt`.
    pub reinforce_on_retrieval: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            sigma: None,
            encoding_response_time: 0.3,
            reinforce_on_retrieval: true,
        }
    }
}

impl RetrievalConfig {
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = Some(sigma);
        self
    }

    pub fn with_encoding_response_time(mut self, t_er: f64) -> Self {
        self.encoding_response_time = t_er;
        self
    }

    pub fn with_reinforcement(mut self, reinforce: bool) -> Self {
        self.reinforce_on_retrieval = reinforce;
        self
    }

    pub fn validate(&self) -> IblResult<()> {
        if let Some(sigma) = self.sigma {
            ensure_positive("sigma", sigma)?;
        }
        ensure_finite("encoding_response_time", self.encoding_response_time)?;
        if self.encoding_response_time < 0.0 {
            return Err(IblError::invalid_parameter(
                "encoding_response_time must be >= 0",
                "Set encoding_response_time to a non-negative number of seconds",
            ));
        }
        Ok(())
    }
}

/// Result of a retrieval attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetrievalResponse {
    Retrieved { chunk: usize },
    Failure,
}

/// A retrieval request issued at a given time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedRequest {
    pub time: f64,
    pub request: Request,
}

/// One observed (or simulated) retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalTrial {
    pub time: f64,
    pub request: Request,
    pub response: RetrievalResponse,
    /// Reaction time in seconds, including the encoding/response time.
    pub rt: f64,
}

/// The race for one request: accumulators and the chunk behind each one.
#[derive(Debug, Clone)]
pub struct RetrievalRace {
    pub race: LognormalRace,
    /// Chunk id of every accumulator except the last (failure) one.
    pub candidates: Vec<usize>,
}

impl RetrievalRace {
    /// Accumulator index of a response, or `None` if the chunk was not in
    /// the retrieval set.
    pub fn accumulator(&self, response: RetrievalResponse) -> Option<usize> {
        match response {
            RetrievalResponse::Failure => Some(self.candidates.len()),
            RetrievalResponse::Retrieved { chunk } => {
                self.candidates.iter().position(|&c| c == chunk)
            }
        }
    }

    fn response(&self, winner: usize) -> RetrievalResponse {
        match self.candidates.get(winner) {
            Some(&chunk) => RetrievalResponse::Retrieved { chunk },
            None => RetrievalResponse::Failure,
        }
    }
}

/// ACT-R retrieval with Lognormal Race timing.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalModel {
    activation: ActivationConfig,
    config: RetrievalConfig,
}

impl RetrievalModel {
    pub fn new(activation: ActivationConfig, config: RetrievalConfig) -> IblResult<Self> {
        activation.validate()?;
        config.validate()?;
        Ok(Self { activation, config })
    }

    pub fn activation(&self) -> &ActivationConfig {
        &self.activation
    }

    /// Race scale in effect.
    pub fn sigma(&self) -> f64 {
        self.config
            .sigma
            .unwrap_or_else(|| self.activation.race_sigma())
    }

    /// Build the race for `request` at `now`.
    ///
    /// Matching chunks that have not been presented yet cannot finish and
    /// are left out of the retrieval set.
    pub fn race(
        &self,
        memory: &DeclarativeMemory,
        request: &Request,
        now: f64,
    ) -> IblResult<RetrievalRace> {
        let mut candidates = Vec::new();
        let mut mu = Vec::new();
        for chunk in memory.matching(request) {
            let activation = memory.activation(chunk.id, now, &self.activation)?;
            if activation.is_finite() {
                candidates.push(chunk.id);
                mu.push(-activation);
            }
        }
        mu.push(-self.activation.retrieval_threshold);

        let race = LognormalRace::new(mu, self.sigma(), self.config.encoding_response_time)?;
        Ok(RetrievalRace { race, candidates })
    }

    /// Probability of each response to `request` at `now`.
    pub fn response_probabilities(
        &self,
        memory: &DeclarativeMemory,
        request: &Request,
        now: f64,
    ) -> IblResult<RetrievalProbabilities> {
        let retrieval = self.race(memory, request, now)?;
        let mut probs = retrieval.race.winner_probabilities();
        let failure = probs.pop().unwrap_or(1.0);
        Ok(RetrievalProbabilities {
            chunks: retrieval.candidates.into_iter().zip(probs).collect(),
            failure,
        })
    }

    /// Simulate a sequence of retrievals starting from `memory`.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        memory: &DeclarativeMemory,
        requests: &[TimedRequest],
        rng: &mut R,
    ) -> IblResult<Vec<RetrievalTrial>> {
        let mut memory = memory.clone();
        let mut trials = Vec::with_capacity(requests.len());

        for timed in requests {
            let retrieval = self.race(&memory, &timed.request, timed.time)?;
            let outcome = retrieval.race.sample(rng);
            let response = retrieval.response(outcome.winner);
            self.reinforce(&mut memory, response, timed.time + outcome.rt)?;

            debug!(time = timed.time, request = %timed.request, ?response, rt = outcome.rt, "simulated retrieval");
            trials.push(RetrievalTrial {
                time: timed.time,
                request: timed.request.clone(),
                response,
                rt: outcome.rt,
            });
        }
        Ok(trials)
    }

    /// Log-likelihood of observed retrievals starting from `memory`.
    ///
    /// A retrieved chunk that could not have won (it does not match the
    /// request, or has not been presented yet) contributes negative infinity.
    pub fn log_likelihood(
        &self,
        memory: &DeclarativeMemory,
        trials: &[RetrievalTrial],
    ) -> IblResult<f64> {
        let mut memory = memory.clone();
        let mut acc = LogLikelihood::new();

        for trial in trials {
            ensure_finite("rt", trial.rt)?;
            let retrieval = self.race(&memory, &trial.request, trial.time)?;
            let term = match retrieval.accumulator(trial.response) {
                Some(winner) => retrieval.race.ln_likelihood(winner, trial.rt)?,
                None => f64::NEG_INFINITY,
            };
            acc.add_log_density(term)?;
            self.reinforce(&mut memory, trial.response, trial.time + trial.rt)?;
        }

        if acc.is_impossible() {
            warn!(trials = acc.trials(), "retrieval data has zero likelihood");
        }
        Ok(acc.value())
    }

    fn reinforce(
        &self,
        memory: &mut DeclarativeMemory,
        response: RetrievalResponse,
        time: f64,
    ) -> IblResult<()> {
        if let (true, RetrievalResponse::Retrieved { chunk }) =
            (self.config.reinforce_on_retrieval, response)
        {
            memory.present(chunk, time)?;
        }
        Ok(())
    }
}
