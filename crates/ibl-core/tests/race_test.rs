//! Integration tests for the Lognormal Race and timed retrieval.

use ibl_core::fit::{GridSearch, ParameterAxis};
use ibl_core::memory::slots;
use ibl_core::{
    ActivationConfig, DeclarativeMemory, LognormalRace, Request, RetrievalConfig,
    RetrievalModel, RetrievalResponse, SlotValue, TimedRequest,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_sampled_win_rates_match_winner_probabilities() {
    let race = LognormalRace::new(vec![-1.0, -0.6, 0.0], 0.6, 0.25).unwrap();
    let mut rng = StdRng::seed_from_u64(17);

    let n = 20_000;
    let mut wins = [0usize; 3];
    for _ in 0..n {
        let trial = race.sample(&mut rng);
        assert!(trial.rt > race.t_er());
        wins[trial.winner] += 1;
    }

    for (k, p) in race.winner_probabilities().into_iter().enumerate() {
        let observed = wins[k] as f64 / n as f64;
        assert!(
            (observed - p).abs() < 0.02,
            "accumulator {}: observed {} expected {}",
            k,
            observed,
            p
        );
    }
}

#[test]
fn test_grid_search_recovers_location() {
    let truth = LognormalRace::new(vec![-1.0, 0.0], 0.5, 0.3).unwrap();
    let mut rng = StdRng::seed_from_u64(4);
    let trials: Vec<_> = (0..2000).map(|_| truth.sample(&mut rng)).collect();

    let grid = GridSearch::new(vec![ParameterAxis::linspace("mu0", -2.0, 0.0, 21).unwrap()]).unwrap();
    let result = grid
        .run(|params| {
            LognormalRace::new(vec![params["mu0"], 0.0], 0.5, 0.3)?.ln_likelihood_trials(&trials)
        })
        .unwrap();

    assert!(
        (result.best["mu0"] + 1.0).abs() < 0.15,
        "recovered mu0 = {}",
        result.best["mu0"]
    );
    assert_eq!(result.failed, 0);
}

fn memory() -> DeclarativeMemory {
    let mut memory = DeclarativeMemory::new();
    for (word, times) in [("apple", vec![1.0, 4.0, 7.0]), ("pear", vec![3.0]), ("plum", vec![6.0])] {
        for t in times {
            memory.add(
                slots([("kind", SlotValue::from("fruit")), ("word", word.into())]),
                t,
            );
        }
    }
    memory
}

#[test]
fn test_retrieval_frequencies_match_race_probabilities() {
    let model = RetrievalModel::new(
        ActivationConfig::default().with_retrieval_threshold(-1.0),
        RetrievalConfig::default().with_reinforcement(false),
    )
    .unwrap();
    let memory = memory();
    let request = Request::new().with("kind", "fruit");

    let probs = model.response_probabilities(&memory, &request, 10.0).unwrap();
    let total: f64 = probs.chunks.iter().map(|(_, p)| p).sum::<f64>() + probs.failure;
    assert!((total - 1.0).abs() < 1e-4);

    let n = 10_000;
    let requests: Vec<_> = (0..n)
        .map(|_| TimedRequest {
            time: 10.0,
            request: request.clone(),
        })
        .collect();
    let trials = model
        .simulate(&memory, &requests, &mut StdRng::seed_from_u64(23))
        .unwrap();

    let failures = trials
        .iter()
        .filter(|t| t.response == RetrievalResponse::Failure)
        .count();
    assert!((failures as f64 / n as f64 - probs.failure).abs() < 0.02);

    for (chunk, p) in probs.chunks {
        let wins = trials
            .iter()
            .filter(|t| t.response == RetrievalResponse::Retrieved { chunk })
            .count();
        assert!((wins as f64 / n as f64 - p).abs() < 0.02);
    }
}

#[test]
fn test_reinforced_retrievals_are_replayed_in_likelihood() {
    let activation = ActivationConfig::default().with_retrieval_threshold(-1.5);
    let reinforcing =
        RetrievalModel::new(activation.clone(), RetrievalConfig::default()).unwrap();
    let memory = memory();
    let requests: Vec<_> = (0..30)
        .map(|i| TimedRequest {
            time: 10.0 + 2.0 * i as f64,
            request: Request::new().with("word", "apple"),
        })
        .collect();

    let trials = reinforcing
        .simulate(&memory, &requests, &mut StdRng::seed_from_u64(2))
        .unwrap();
    let ll = reinforcing.log_likelihood(&memory, &trials).unwrap();
    assert!(ll.is_finite());

    let static_model = RetrievalModel::new(
        activation,
        RetrievalConfig::default().with_reinforcement(false),
    )
    .unwrap();
    let ll_static = static_model.log_likelihood(&memory, &trials).unwrap();
    assert!(ll_static.is_finite());
    if trials[..trials.len() - 1]
        .iter()
        .any(|t| matches!(t.response, RetrievalResponse::Retrieved { .. }))
    {
        assert_ne!(ll, ll_static);
    }
}
