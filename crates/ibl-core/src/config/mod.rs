//! Configuration system for ibl.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::activation::{ActivationConfig, BllMode};
use crate::error::{IblError, IblResult};
use crate::ibl::{default_gambles, ChoiceConfig, Gamble, IblModel};
use crate::retrieval::{RetrievalConfig, RetrievalModel};

/// Simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of trials to simulate.
    pub trials: usize,
    /// RNG seed. `None` seeds from entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Directory for generated datasets.
    pub data_dir: PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|d| d.join("ibl"))
            .unwrap_or_else(|| PathBuf::from(".ibl"));

        Self {
            trials: 100,
            seed: None,
            data_dir,
        }
    }
}

/// Main model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Activation parameters shared by both models.
    pub activation: ActivationConfig,
    /// IBL choice rule.
    pub choice: ChoiceConfig,
    /// Lognormal Race retrieval.
    pub retrieval: RetrievalConfig,
    /// Simulation settings.
    pub simulation: SimulationConfig,
    /// Options offered on every IBL trial.
    pub gambles: Vec<Gamble>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            activation: ActivationConfig::default(),
            choice: ChoiceConfig::default(),
            retrieval: RetrievalConfig::default(),
            simulation: SimulationConfig::default(),
            gambles: default_gambles(),
        }
    }
}

fn parse_var<T, F>(get: &F, name: &str) -> IblResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| IblError::Configuration(format!("{}={}: {}", name, raw, e))),
        None => Ok(None),
    }
}

impl ModelConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> IblResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| IblError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| IblError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| IblError::Configuration(e.to_string()))?,
            _ => {
                return Err(IblError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> IblResult<Self> {
        Self::default().with_env()
    }

    /// Overlay `IBL_*` environment variables onto this configuration.
    pub fn with_env(self) -> IblResult<Self> {
        self.overlay(|name| std::env::var(name).ok())
    }

    /// Overlay `IBL_*` variables looked up through `get`.
    pub fn overlay<F>(mut self, get: F) -> IblResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(decay) = parse_var(&get, "IBL_DECAY")? {
            self.activation.decay = decay;
        }
        if let Some(noise) = parse_var(&get, "IBL_NOISE")? {
            self.activation.noise = noise;
        }
        if let Some(threshold) = parse_var(&get, "IBL_THRESHOLD")? {
            self.activation.retrieval_threshold = threshold;
        }
        if let Some(base_constant) = parse_var(&get, "IBL_BASE_CONSTANT")? {
            self.activation.base_constant = base_constant;
        }
        if let Some(mode) = parse_var::<BllMode, _>(&get, "IBL_BLL_MODE")? {
            self.activation.bll_mode = mode;
        }
        if let Some(temperature) = parse_var(&get, "IBL_TEMPERATURE")? {
            self.choice.temperature = Some(temperature);
        }
        if let Some(trials) = parse_var(&get, "IBL_TRIALS")? {
            self.simulation.trials = trials;
        }
        if let Some(seed) = parse_var(&get, "IBL_SEED")? {
            self.simulation.seed = Some(seed);
        }
        if let Some(dir) = get("IBL_DATA_DIR") {
            self.simulation.data_dir = PathBuf::from(dir);
        }
        Ok(self)
    }

    /// Validate every section.
    pub fn validate(&self) -> IblResult<()> {
        self.activation.validate()?;
        self.choice.validate()?;
        self.retrieval.validate()?;
        if self.gambles.is_empty() {
            return Err(IblError::empty("gambles"));
        }
        for gamble in &self.gambles {
            gamble.validate()?;
        }
        Ok(())
    }

    /// IBL model for the configured gambles.
    pub fn ibl_model(&self) -> IblResult<IblModel> {
        IblModel::new(
            self.gambles.clone(),
            self.activation.clone(),
            self.choice.clone(),
        )
    }

    /// Retrieval model sharing the configured activation parameters.
    pub fn retrieval_model(&self) -> IblResult<RetrievalModel> {
        RetrievalModel::new(self.activation.clone(), self.retrieval.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = ModelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gambles.len(), 2);
        assert_eq!(config.simulation.trials, 100);
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[activation]
decay = 0.4
bll_mode = "optimized"

[choice]
temperature = 0.25

[[gambles]]
label = "a"
outcomes = [1.0]
probabilities = [1.0]
"#
        )
        .unwrap();

        let config = ModelConfig::from_file(file.path()).unwrap();
        assert_eq!(config.activation.decay, 0.4);
        assert_eq!(config.activation.bll_mode, BllMode::Optimized);
        assert_eq!(config.activation.noise, 0.4);
        assert_eq!(config.choice.temperature, Some(0.25));
        assert_eq!(config.gambles.len(), 1);
        assert_eq!(config.retrieval, RetrievalConfig::default());
    }

    #[test]
    fn test_from_yaml_and_json_files() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "activation:\n  noise: 0.3\nretrieval:\n  encoding_response_time: 0.5").unwrap();
        let config = ModelConfig::from_file(yaml.path()).unwrap();
        assert_eq!(config.activation.noise, 0.3);
        assert_eq!(config.retrieval.encoding_response_time, 0.5);

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(json, r#"{{"simulation": {{"trials": 7, "seed": 3}}}}"#).unwrap();
        let config = ModelConfig::from_file(json.path()).unwrap();
        assert_eq!(config.simulation.trials, 7);
        assert_eq!(config.simulation.seed, Some(3));
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[activation]\nnoise = 0.0").unwrap();
        assert!(ModelConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = ModelConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, IblError::Configuration(_)));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_overlay_applies_variables() {
        let config = ModelConfig::default()
            .overlay(vars(&[
                ("IBL_DECAY", "0.3"),
                ("IBL_NOISE", " 0.7 "),
                ("IBL_BLL_MODE", "optimized"),
                ("IBL_TEMPERATURE", "1.5"),
                ("IBL_SEED", "42"),
                ("IBL_TRIALS", "12"),
                ("IBL_DATA_DIR", "/tmp/ibl-data"),
            ]))
            .unwrap();

        assert_eq!(config.activation.decay, 0.3);
        assert_eq!(config.activation.noise, 0.7);
        assert_eq!(config.activation.bll_mode, BllMode::Optimized);
        assert_eq!(config.choice.temperature, Some(1.5));
        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(config.simulation.trials, 12);
        assert_eq!(config.simulation.data_dir, PathBuf::from("/tmp/ibl-data"));
        assert_eq!(config.activation.retrieval_threshold, -2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlay_without_variables_keeps_config() {
        let config = ModelConfig::default().overlay(vars(&[])).unwrap();
        assert_eq!(config, ModelConfig::default());
    }

    #[test]
    fn test_overlay_rejects_malformed_values() {
        for (name, value) in [
            ("IBL_BLL_MODE", "sometimes"),
            ("IBL_DECAY", "half"),
            ("IBL_SEED", "-1"),
        ] {
            let err = ModelConfig::default()
                .overlay(vars(&[(name, value)]))
                .unwrap_err();
            assert!(matches!(err, IblError::Configuration(_)), "{}", name);
            assert!(err.to_string().contains(name));
        }
    }

    #[test]
    fn test_builds_models() {
        let mut config = ModelConfig::default();
        config.choice.temperature = Some(0.5);
        let ibl = config.ibl_model().unwrap();
        assert_eq!(ibl.temperature(), 0.5);
        assert_eq!(ibl.gambles().len(), 2);

        config.retrieval.sigma = Some(0.7);
        assert_eq!(config.retrieval_model().unwrap().sigma(), 0.7);
    }

    #[test]
    fn test_serde_round_trip_toml() {
        let config = ModelConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: ModelConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
