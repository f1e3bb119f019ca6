//! Instance-Based Learning of repeated choices between gambles.
//!
//! # Example
//!
//! ```
//! use ibl_core::activation::ActivationConfig;
//! use ibl_core::ibl::{default_gambles, ChoiceConfig, IblModel};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let model = IblModel::new(
//!     default_gambles(),
//!     ActivationConfig::default(),
//!     ChoiceConfig::default(),
//! )
//! .unwrap();
//!
//! let trials = model.simulate(100, &mut StdRng::seed_from_u64(1)).unwrap();
//! let ll = model.log_likelihood(&trials).unwrap();
//! assert!(ll < 0.0);
//! ```

pub mod gamble;
pub mod model;

pub use gamble::{default_gambles, Gamble};
pub use model::{choice_proportions, ChoiceConfig, IblModel, IblTrial, CHOICE_SLOT, OUTCOME_SLOT};
