//! ACT-R activation.
//!
//! Activation determines how likely and how fast a chunk is retrieved.
//! Key principles:
//!
//! 1. **Recency**: recently presented chunks are more active
//! 2. **Frequency**: frequently presented chunks are more active
//! 3. **Decay**: activation decays as a power function of time
//! 4. **Noise**: retrieval is perturbed by logistic noise
//!
//! # Example
//!
//! ```
//! use ibl_core::activation::{base_level_activation, retrieval_probability, ActivationConfig};
//!
//! let config = ActivationConfig::default();
//!
//! // Chunk presented five times during the last minute
//! let presentations = [10.0, 25.0, 40.0, 50.0, 58.0];
//! let activation = base_level_activation(&presentations, 60.0, &config);
//! let prob = retrieval_probability(activation, &config);
//!
//! assert!(activation.is_finite());
//! assert!(prob > 0.0 && prob < 1.0);
//! ```

pub mod base_level;
pub mod config;
pub mod noise;

pub use base_level::{base_level_activation, time_until_threshold};
pub use config::{ActivationConfig, BllMode};
pub use noise::{activation_noise, logistic_std_dev, logistic_variance, retrieval_probability};
