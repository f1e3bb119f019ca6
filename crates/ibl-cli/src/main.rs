//! ibl - simulate, score, and fit IBL and Lognormal Race data.
//!
//! # Configuration
//!
//! Model parameters come from the defaults, then an optional `--config`
//! file (TOML, JSON, or YAML), then `IBL_*` environment variables (a `.env`
//! file is honored), then command-line flags.
//!
//! Logs go to stderr; results go to stdout as JSON.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ibl_core::data::{load_jsonl, save_jsonl};
use ibl_core::fit::{GridSearch, ParameterAxis};
use ibl_core::ibl::choice_proportions;
use ibl_core::{IblTrial, LognormalRace, ModelConfig, RaceTrial};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Instance-Based Learning and Lognormal Race models.
#[derive(Debug, Parser)]
#[command(name = "ibl")]
#[command(about = "Simulate, score, and fit IBL and Lognormal Race data")]
struct Cli {
    /// Model configuration file (.toml, .json, or .yaml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate repeated choices between the configured gambles.
    Simulate {
        /// Number of trials (defaults to the configured count).
        #[arg(long)]
        trials: Option<usize>,
        /// RNG seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Output JSONL path (defaults to `<data_dir>/ibl_trials.jsonl`).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Log-likelihood of a choice dataset.
    Loglik {
        /// Input JSONL path of IBL trials.
        #[arg(long)]
        data: PathBuf,
        /// Override the decay parameter.
        #[arg(long)]
        decay: Option<f64>,
        /// Override the activation noise.
        #[arg(long)]
        noise: Option<f64>,
    },
    /// Grid-search maximum-likelihood fit of decay and noise.
    Fit {
        /// Input JSONL path of IBL trials.
        #[arg(long)]
        data: PathBuf,
        /// Decay grid as `lo:hi:n` or a single value.
        #[arg(long, default_value = "0.1:0.9:9")]
        decay: String,
        /// Noise grid as `lo:hi:n` or a single value.
        #[arg(long, default_value = "0.1:1.0:10")]
        noise: String,
        /// Output path for the JSON fit report (if omitted, prints to stdout).
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Simulate races between lognormal accumulators.
    RaceSimulate {
        /// Comma-separated accumulator locations, e.g. `-1,-1.5`.
        #[arg(long, allow_hyphen_values = true)]
        mu: String,
        /// Shared accumulator scale.
        #[arg(long, default_value_t = 1.0)]
        sigma: f64,
        /// Encoding/response time added to every finishing time.
        #[arg(long, default_value_t = 0.3)]
        ter: f64,
        /// Number of races.
        #[arg(long, default_value_t = 100)]
        n: usize,
        /// RNG seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Output JSONL path (defaults to `<data_dir>/race_trials.jsonl`).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Log-likelihood of a race dataset.
    RaceLoglik {
        /// Input JSONL path of race trials.
        #[arg(long)]
        data: PathBuf,
        /// Comma-separated accumulator locations.
        #[arg(long, allow_hyphen_values = true)]
        mu: String,
        /// Shared accumulator scale.
        #[arg(long, default_value_t = 1.0)]
        sigma: f64,
        /// Encoding/response time.
        #[arg(long, default_value_t = 0.3)]
        ter: f64,
    },
}

#[derive(Debug, Serialize)]
struct SimulationSummary {
    path: PathBuf,
    trials: usize,
    proportions: Vec<(String, f64)>,
}

#[derive(Debug, Serialize)]
struct LoglikReport {
    data: PathBuf,
    trials: usize,
    /// `None` when the data is impossible under the model.
    log_likelihood: Option<f64>,
    impossible: bool,
}

impl LoglikReport {
    fn new(data: &Path, trials: usize, log_likelihood: f64) -> Self {
        let impossible = log_likelihood == f64::NEG_INFINITY;
        Self {
            data: data.to_path_buf(),
            trials,
            log_likelihood: (!impossible).then_some(log_likelihood),
            impossible,
        }
    }
}

#[derive(Debug, Serialize)]
struct FitReport {
    generated_at: String,
    data: PathBuf,
    trials: usize,
    best: ibl_core::Parameters,
    log_likelihood: f64,
    evaluated: usize,
    failed: usize,
}

#[derive(Debug, Serialize)]
struct RaceSummary {
    path: PathBuf,
    races: usize,
    win_rates: Vec<f64>,
    winner_probabilities: Vec<f64>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .with(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Simulate { trials, seed, out } => simulate(config, trials, seed, out),
        Command::Loglik { data, decay, noise } => loglik(config, &data, decay, noise),
        Command::Fit {
            data,
            decay,
            noise,
            report,
        } => fit(config, &data, &decay, &noise, report),
        Command::RaceSimulate {
            mu,
            sigma,
            ter,
            n,
            seed,
            out,
        } => race_simulate(&config, &mu, sigma, ter, n, seed, out),
        Command::RaceLoglik {
            data,
            mu,
            sigma,
            ter,
        } => race_loglik(&data, &mu, sigma, ter),
    }
}

/// `RUST_LOG` directives when given and valid, `info` otherwise.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn load_config(path: Option<&Path>) -> Result<ModelConfig> {
    let config = match path {
        Some(path) => ModelConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ModelConfig::default(),
    };
    let config = config.with_env().context("reading IBL_* environment")?;
    config.validate()?;
    Ok(config)
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a comma-separated list of accumulator locations.
fn parse_mu(list: &str) -> Result<Vec<f64>> {
    let mu = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("invalid mu value '{}'", s))
        })
        .collect::<Result<Vec<_>>>()?;
    if mu.is_empty() {
        bail!("--mu needs at least one value");
    }
    Ok(mu)
}

fn simulate(
    mut config: ModelConfig,
    trials: Option<usize>,
    seed: Option<u64>,
    out: Option<PathBuf>,
) -> Result<()> {
    let n_trials = trials.unwrap_or(config.simulation.trials);
    if seed.is_some() {
        config.simulation.seed = seed;
    }
    let path = out.unwrap_or_else(|| config.simulation.data_dir.join("ibl_trials.jsonl"));

    let model = config.ibl_model()?;
    let data = model.simulate(n_trials, &mut rng(config.simulation.seed))?;
    save_jsonl(&path, &data)?;
    info!(path = %path.display(), trials = data.len(), "simulated choices");

    let proportions = choice_proportions(&data, model.gambles().len());
    print_json(&SimulationSummary {
        path,
        trials: data.len(),
        proportions: model
            .gambles()
            .iter()
            .map(|g| g.label.clone())
            .zip(proportions)
            .collect(),
    })
}

fn loglik(
    mut config: ModelConfig,
    data: &Path,
    decay: Option<f64>,
    noise: Option<f64>,
) -> Result<()> {
    if let Some(decay) = decay {
        config.activation.decay = decay;
    }
    if let Some(noise) = noise {
        config.activation.noise = noise;
    }
    let trials: Vec<IblTrial> = load_jsonl(data)?;
    let log_likelihood = config.ibl_model()?.log_likelihood(&trials)?;

    print_json(&LoglikReport::new(data, trials.len(), log_likelihood))
}

fn fit(
    config: ModelConfig,
    data: &Path,
    decay: &str,
    noise: &str,
    report: Option<PathBuf>,
) -> Result<()> {
    let trials: Vec<IblTrial> = load_jsonl(data)?;
    let grid = GridSearch::new(vec![
        ParameterAxis::parse("decay", decay)?,
        ParameterAxis::parse("noise", noise)?,
    ])?;
    info!(points = grid.len(), trials = trials.len(), "fitting decay and noise");

    let result = grid.run(|params| {
        let mut candidate = config.clone();
        candidate.activation.decay = params["decay"];
        candidate.activation.noise = params["noise"];
        candidate.ibl_model()?.log_likelihood(&trials)
    })?;

    let fit_report = FitReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        data: data.to_path_buf(),
        trials: trials.len(),
        best: result.best,
        log_likelihood: result.log_likelihood,
        evaluated: result.points.len(),
        failed: result.failed,
    };

    match report {
        Some(path) => {
            std::fs::write(&path, serde_json::to_string_pretty(&fit_report)?)
                .with_context(|| format!("writing report {}", path.display()))?;
            info!(path = %path.display(), "wrote fit report");
            Ok(())
        }
        None => print_json(&fit_report),
    }
}

fn race_simulate(
    config: &ModelConfig,
    mu: &str,
    sigma: f64,
    ter: f64,
    n: usize,
    seed: Option<u64>,
    out: Option<PathBuf>,
) -> Result<()> {
    let race = LognormalRace::new(parse_mu(mu)?, sigma, ter)?;
    let path = out.unwrap_or_else(|| config.simulation.data_dir.join("race_trials.jsonl"));

    let mut rng = rng(seed.or(config.simulation.seed));
    let data: Vec<RaceTrial> = (0..n).map(|_| race.sample(&mut rng)).collect();
    save_jsonl(&path, &data)?;
    info!(path = %path.display(), races = n, "simulated races");

    let mut wins = vec![0usize; race.len()];
    for trial in &data {
        wins[trial.winner] += 1;
    }
    print_json(&RaceSummary {
        path,
        races: n,
        win_rates: wins
            .iter()
            .map(|&w| if n == 0 { 0.0 } else { w as f64 / n as f64 })
            .collect(),
        winner_probabilities: race.winner_probabilities(),
    })
}

fn race_loglik(data: &Path, mu: &str, sigma: f64, ter: f64) -> Result<()> {
    let race = LognormalRace::new(parse_mu(mu)?, sigma, ter)?;
    let trials: Vec<RaceTrial> = load_jsonl(data)?;
    let log_likelihood = race.ln_likelihood_trials(&trials)?;

    print_json(&LoglikReport::new(data, trials.len(), log_likelihood))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_mu() {
        assert_eq!(parse_mu("-1,-1.5").unwrap(), vec![-1.0, -1.5]);
        assert_eq!(parse_mu(" 0.5 , 2 ,").unwrap(), vec![0.5, 2.0]);
        assert!(parse_mu("").is_err());
        assert!(parse_mu("1,x").is_err());
    }

    #[test]
    fn test_parse_race_command() {
        let cli = Cli::parse_from([
            "ibl",
            "race-simulate",
            "--mu",
            "-1,-1.5",
            "--n",
            "10",
            "--seed",
            "4",
        ]);
        match cli.command {
            Command::RaceSimulate { mu, n, seed, sigma, .. } => {
                assert_eq!(mu, "-1,-1.5");
                assert_eq!(n, 10);
                assert_eq!(seed, Some(4));
                assert_eq!(sigma, 1.0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_fit_defaults_parse_as_grids() {
        let cli = Cli::parse_from(["ibl", "fit", "--data", "x.jsonl"]);
        let Command::Fit { decay, noise, .. } = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(ParameterAxis::parse("decay", &decay).unwrap().values.len(), 9);
        assert_eq!(ParameterAxis::parse("noise", &noise).unwrap().values.len(), 10);
    }

    #[test]
    fn test_log_filter_honors_bare_level() {
        use tracing::level_filters::LevelFilter;

        let filter = log_filter(Some("debug".to_string()));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = log_filter(None);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));

        let filter = log_filter(Some("ibl_core=trace".to_string()));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_loglik_report_flags_impossible_data() {
        let report = LoglikReport::new(Path::new("d.jsonl"), 3, f64::NEG_INFINITY);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["impossible"], serde_json::json!(true));
        assert!(json["log_likelihood"].is_null());

        let report = LoglikReport::new(Path::new("d.jsonl"), 3, -4.5);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["impossible"], serde_json::json!(false));
        assert_eq!(json["log_likelihood"], serde_json::json!(-4.5));
    }

    #[test]
    fn test_simulate_then_score() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("choices.jsonl");
        let mut config = ModelConfig::default();
        config.simulation.data_dir = dir.path().to_path_buf();

        simulate(config.clone(), Some(30), Some(9), Some(path.clone())).unwrap();
        let trials: Vec<IblTrial> = load_jsonl(&path).unwrap();
        assert_eq!(trials.len(), 30);

        loglik(config, &path, None, None).unwrap();
    }
}
