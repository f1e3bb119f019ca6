//! ibl-core - Instance-Based Learning and Lognormal Race models.
//!
//! This crate provides ACT-R declarative memory (base-level learning,
//! activation noise, blending), an Instance-Based Learning model of repeated
//! choice, a Lognormal Race model of retrieval timing, and exact
//! log-likelihoods for all of them so parameters can be fitted to data.
//!
//! # Example
//!
//! ```
//! use ibl_core::{LognormalRace, RaceTrial};
//!
//! // Two retrieval accumulators plus a failure accumulator.
//! let race = LognormalRace::new(vec![-1.0, -0.5, 2.0], 0.7, 0.3).unwrap();
//!
//! let ll = race
//!     .ln_likelihood_trials(&[RaceTrial { winner: 0, rt: 0.8 }])
//!     .unwrap();
//! assert!(ll.is_finite());
//!
//! let total: f64 = race.winner_probabilities().iter().sum();
//! assert!((total - 1.0).abs() < 1e-4);
//! ```

pub mod activation;
pub mod choice;
pub mod config;
pub mod data;
pub mod error;
pub mod fit;
pub mod ibl;
pub mod likelihood;
pub mod lognormal;
pub mod memory;
pub mod race;
pub mod retrieval;

// Re-export commonly used types
pub use activation::{ActivationConfig, BllMode};
pub use config::{ModelConfig, SimulationConfig};
pub use error::{ErrorCode, IblError, IblResult};
pub use fit::{FitResult, GridSearch, ParameterAxis, Parameters};
pub use ibl::{ChoiceConfig, Gamble, IblModel, IblTrial};
pub use likelihood::LogLikelihood;
pub use lognormal::LogNormal;
pub use memory::{Chunk, DeclarativeMemory, Request, SlotValue};
pub use race::{LognormalRace, RaceTrial};
pub use retrieval::{
    RetrievalConfig, RetrievalModel, RetrievalResponse, RetrievalTrial, TimedRequest,
};
