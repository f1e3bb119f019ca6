//! Instance-Based Learning model of repeated choice.
//!
//! Every experienced (choice, outcome) pair becomes a chunk. Before each
//! choice the model blends the outcomes stored for each option, weighting
//! them by retrieval probability, and picks an option with a softmax over
//! the blended values. Memory starts with one optimistic chunk per option,
//! which drives early exploration.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::gamble::Gamble;
use crate::activation::ActivationConfig;
use crate::choice::softmax;
use crate::error::{ensure_finite, ensure_positive, IblError, IblResult};
use crate::likelihood::LogLikelihood;
use crate::memory::{slots, DeclarativeMemory, Request, SlotValue};

/// Slot holding the chosen option's label.
pub const CHOICE_SLOT: &str = "choice";
/// Slot holding the experienced outcome.
pub const OUTCOME_SLOT: &str = "outcome";

/// Choice-rule and task timing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceConfig {
    /// Softmax temperature (phi). `None` uses the blending temperature `s * sqrt(2)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Outcome stored in the initial chunk of every option.
    pub prior_outcome: f64,
    /// Seconds between consecutive trials.
    pub trial_interval: f64,
}

impl Default for ChoiceConfig {
    fn default() -> Self {
        Self {
            temperature: None,
            prior_outcome: 30.0,
            trial_interval: 1.0,
        }
    }
}

impl ChoiceConfig {
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_prior_outcome(mut self, prior_outcome: f64) -> Self {
        self.prior_outcome = prior_outcome;
        self
    }

    pub fn validate(&self) -> IblResult<()> {
        if let Some(t) = self.temperature {
            ensure_positive("temperature", t)?;
        }
        ensure_finite("prior_outcome", self.prior_outcome)?;
        ensure_positive("trial_interval", self.trial_interval)
    }
}

/// One trial of a repeated-choice experiment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IblTrial {
    /// Trial number, starting at 1.
    pub trial: usize,
    /// Time of the choice on the simulation clock (seconds).
    pub time: f64,
    /// Index of the chosen option.
    pub choice: usize,
    /// Outcome received.
    pub outcome: f64,
}

/// IBL model over a fixed set of gambles.
#[derive(Debug, Clone, PartialEq)]
pub struct IblModel {
    gambles: Vec<Gamble>,
    activation: ActivationConfig,
    choice: ChoiceConfig,
}

impl IblModel {
    /// Create a model; validates the gambles and both configs.
    pub fn new(
        gambles: Vec<Gamble>,
        activation: ActivationConfig,
        choice: ChoiceConfig,
    ) -> IblResult<Self> {
        if gambles.is_empty() {
            return Err(IblError::empty("gambles"));
        }
        for (i, gamble) in gambles.iter().enumerate() {
            gamble.validate()?;
            if gambles[..i].iter().any(|g| g.label == gamble.label) {
                return Err(IblError::validation(format!(
                    "duplicate gamble label '{}'",
                    gamble.label
                )));
            }
        }
        activation.validate()?;
        choice.validate()?;
        Ok(Self {
            gambles,
            activation,
            choice,
        })
    }

    pub fn gambles(&self) -> &[Gamble] {
        &self.gambles
    }

    pub fn activation(&self) -> &ActivationConfig {
        &self.activation
    }

    /// Softmax temperature in effect.
    pub fn temperature(&self) -> f64 {
        self.choice
            .temperature
            .unwrap_or_else(|| self.activation.blending_temperature())
    }

    /// Time of trial `index` (0-based).
    pub fn trial_time(&self, index: usize) -> f64 {
        (index + 1) as f64 * self.choice.trial_interval
    }

    fn request(&self, option: usize) -> Request {
        Request::new().with(CHOICE_SLOT, self.gambles[option].label.as_str())
    }

    fn record(&self, memory: &mut DeclarativeMemory, option: usize, outcome: f64, time: f64) {
        memory.add(
            slots([
                (CHOICE_SLOT, SlotValue::from(self.gambles[option].label.as_str())),
                (OUTCOME_SLOT, SlotValue::Number(outcome)),
            ]),
            time,
        );
    }

    /// Memory holding one prior chunk per option, presented at time 0.
    pub fn initial_memory(&self) -> DeclarativeMemory {
        let mut memory = DeclarativeMemory::new();
        for option in 0..self.gambles.len() {
            self.record(&mut memory, option, self.choice.prior_outcome, 0.0);
        }
        memory
    }

    /// Blended outcome of every option at `now`.
    ///
    /// An option with no usable chunk falls back to the prior outcome.
    pub fn blended_values(&self, memory: &DeclarativeMemory, now: f64) -> IblResult<Vec<f64>> {
        (0..self.gambles.len())
            .map(|option| {
                Ok(memory
                    .blended_value(&self.request(option), OUTCOME_SLOT, now, &self.activation)?
                    .unwrap_or(self.choice.prior_outcome))
            })
            .collect()
    }

    /// Probability of choosing each option at `now`.
    pub fn choice_probabilities(&self, memory: &DeclarativeMemory, now: f64) -> IblResult<Vec<f64>> {
        softmax(&self.blended_values(memory, now)?, self.temperature())
    }

    /// Simulate `n_trials` choices.
    pub fn simulate<R: Rng + ?Sized>(&self, n_trials: usize, rng: &mut R) -> IblResult<Vec<IblTrial>> {
        let mut memory = self.initial_memory();
        let mut trials = Vec::with_capacity(n_trials);

        for index in 0..n_trials {
            let time = self.trial_time(index);
            let probs = self.choice_probabilities(&memory, time)?;
            let choice = WeightedIndex::new(&probs)
                .map_err(|e| IblError::numerical(format!("choice probabilities: {}", e)))?
                .sample(rng);
            let outcome = self.gambles[choice].sample(rng)?;
            self.record(&mut memory, choice, outcome, time);

            debug!(trial = index + 1, time, choice, outcome, "simulated trial");
            trials.push(IblTrial {
                trial: index + 1,
                time,
                choice,
                outcome,
            });
        }
        Ok(trials)
    }

    /// Log-likelihood of an observed choice sequence.
    ///
    /// Replays the trials in order: each choice is scored against the memory
    /// built from the preceding trials, then its outcome is stored.
    pub fn log_likelihood(&self, trials: &[IblTrial]) -> IblResult<f64> {
        let mut memory = self.initial_memory();
        let mut acc = LogLikelihood::new();

        for trial in trials {
            if trial.choice >= self.gambles.len() {
                return Err(IblError::index_out_of_range(
                    "choice",
                    trial.choice,
                    self.gambles.len(),
                ));
            }
            ensure_finite("outcome", trial.outcome)?;
            let probs = self.choice_probabilities(&memory, trial.time)?;
            acc.add_probability(probs[trial.choice])?;
            self.record(&mut memory, trial.choice, trial.outcome, trial.time);
        }

        if acc.is_impossible() {
            warn!(trials = acc.trials(), "choice sequence has zero probability");
        }
        Ok(acc.value())
    }
}

/// Fraction of trials on which each option was chosen.
pub fn choice_proportions(trials: &[IblTrial], n_options: usize) -> Vec<f64> {
    let mut counts = vec![0usize; n_options];
    for trial in trials {
        if let Some(count) = counts.get_mut(trial.choice) {
            *count += 1;
        }
    }
    if trials.is_empty() {
        return vec![0.0; n_options];
    }
    counts
        .into_iter()
        .map(|c| c as f64 / trials.len() as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ibl::gamble::default_gambles;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model() -> IblModel {
        IblModel::new(
            default_gambles(),
            ActivationConfig::default().with_noise(0.3),
            ChoiceConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_validates() {
        assert!(IblModel::new(vec![], ActivationConfig::default(), ChoiceConfig::default()).is_err());
        let duplicate = vec![Gamble::sure("a", 1.0), Gamble::sure("a", 2.0)];
        assert!(IblModel::new(duplicate, ActivationConfig::default(), ChoiceConfig::default()).is_err());
        let bad_choice = ChoiceConfig::default().with_temperature(0.0);
        assert!(IblModel::new(default_gambles(), ActivationConfig::default(), bad_choice).is_err());
    }

    #[test]
    fn test_temperature_defaults_to_blending_temperature() {
        let m = model();
        assert!((m.temperature() - 0.3 * 2f64.sqrt()).abs() < 1e-12);

        let explicit = IblModel::new(
            default_gambles(),
            ActivationConfig::default(),
            ChoiceConfig::default().with_temperature(2.0),
        )
        .unwrap();
        assert_eq!(explicit.temperature(), 2.0);
    }

    #[test]
    fn test_initial_choice_is_uniform() {
        let m = model();
        let memory = m.initial_memory();
        assert_eq!(memory.len(), 2);
        let values = m.blended_values(&memory, 1.0).unwrap();
        assert_eq!(values, vec![30.0, 30.0]);
        let probs = m.choice_probabilities(&memory, 1.0).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bad_outcome_lowers_choice_probability() {
        let m = model();
        let mut memory = m.initial_memory();
        m.record(&mut memory, 1, 0.0, 1.0);
        let probs = m.choice_probabilities(&memory, 2.0).unwrap();
        assert!(probs[1] < probs[0]);
    }

    #[test]
    fn test_simulate_is_reproducible() {
        let m = model();
        let a = m.simulate(50, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = m.simulate(50, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
        assert_eq!(a[0].trial, 1);
        assert_eq!(a[49].time, 50.0);
        for trial in &a {
            let gamble = &m.gambles()[trial.choice];
            assert!(gamble.outcomes.contains(&trial.outcome));
        }
    }

    #[test]
    fn test_log_likelihood_is_sum_of_choice_log_probabilities() {
        let m = model();
        let trials = m.simulate(30, &mut StdRng::seed_from_u64(21)).unwrap();

        let mut memory = m.initial_memory();
        let mut expected = 0.0;
        for trial in &trials {
            let probs = m.choice_probabilities(&memory, trial.time).unwrap();
            expected += probs[trial.choice].ln();
            m.record(&mut memory, trial.choice, trial.outcome, trial.time);
        }

        let ll = m.log_likelihood(&trials).unwrap();
        assert!((ll - expected).abs() < 1e-9);
        assert!(ll < 0.0);
    }

    #[test]
    fn test_log_likelihood_of_empty_data_is_zero() {
        assert_eq!(model().log_likelihood(&[]).unwrap(), 0.0);
    }

    #[test]
    fn test_log_likelihood_rejects_unknown_choice() {
        let trial = IblTrial {
            trial: 1,
            time: 1.0,
            choice: 5,
            outcome: 0.0,
        };
        assert!(model().log_likelihood(&[trial]).is_err());
    }

    #[test]
    fn test_underflowing_choice_gives_negative_infinity() {
        // A tiny temperature makes the worse option practically impossible
        let m = IblModel::new(
            default_gambles(),
            ActivationConfig::default(),
            ChoiceConfig::default().with_temperature(1e-3),
        )
        .unwrap();
        let trials = [
            IblTrial { trial: 1, time: 1.0, choice: 1, outcome: 0.0 },
            IblTrial { trial: 2, time: 2.0, choice: 1, outcome: 0.0 },
        ];
        let ll = m.log_likelihood(&trials).unwrap();
        assert_eq!(ll, f64::NEG_INFINITY);
    }

    #[test]
    fn test_choice_proportions() {
        let trials = [
            IblTrial { trial: 1, time: 1.0, choice: 0, outcome: 3.0 },
            IblTrial { trial: 2, time: 2.0, choice: 1, outcome: 4.0 },
            IblTrial { trial: 3, time: 3.0, choice: 1, outcome: 0.0 },
            IblTrial { trial: 4, time: 4.0, choice: 1, outcome: 4.0 },
        ];
        assert_eq!(choice_proportions(&trials, 2), vec![0.25, 0.75]);
        assert_eq!(choice_proportions(&[], 2), vec![0.0, 0.0]);
    }
}
