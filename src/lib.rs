//! Rust Neural Models Library
//!
//! Four small supervised models trained with plain stochastic gradient
//! descent on top of a minimal reverse-mode autodiff engine.
//!
//! # Modules
//!
//! - `nn`: Tensors, parameters and the per-step computation graph
//! - `layers`: Layer trait plus the dense layer and recurrent cell
//! - `optimizers`: Optimizer trait and SGD
//! - `models`: Perceptron, regression, digit and language identification models
//! - `dataset`: Dataset trait, in-memory / sequence datasets and loaders
//! - `config`: Per-model hyperparameters loaded from JSON
//! - `utils`: Shared utilities (RNG, activation kernels)
//! - `error`: Crate-wide error type
//!
//! # Example
//!
//! ```
//! use rust_neural_models::config::PerceptronConfig;
//! use rust_neural_models::dataset::synthetic;
//! use rust_neural_models::models::{PerceptronModel, StopReason};
//! use rust_neural_models::utils::SimpleRng;
//!
//! let mut rng = SimpleRng::new(7);
//! let data = synthetic::linearly_separable(40, 2, &mut rng).unwrap();
//! let mut model = PerceptronModel::new(2, PerceptronConfig::default(), &mut rng).unwrap();
//!
//! let report = model.train(&data).unwrap();
//! assert_eq!(report.stop_reason, StopReason::Converged);
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod layers;
pub mod models;
pub mod nn;
pub mod optimizers;
pub mod utils;

pub use error::{NnError, Result};
