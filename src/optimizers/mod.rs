//! Optimizer abstractions for neural network parameter updates
//!
//! Optimizers define how a gradient becomes a parameter update. Every model in
//! this crate trains with a fixed step size, so the only implementation is
//! vanilla SGD: `parameter = parameter - learning_rate * gradient`.
//!
//! # Example
//!
//! ```
//! use rust_neural_models::nn::{Parameter, Tensor};
//! use rust_neural_models::optimizers::{Optimizer, SGD};
//!
//! let mut optimizer = SGD::new(0.1);
//! let mut weights = Parameter::from_tensor(Tensor::row_vector(&[1.0, 2.0]));
//! optimizer.update(&mut weights, &Tensor::row_vector(&[1.0, -1.0])).unwrap();
//! assert!((weights.value().data()[0] - 0.9).abs() < 1e-6);
//! ```

pub mod sgd;

pub use sgd::SGD;

use crate::error::Result;
use crate::nn::{Parameter, Tensor};

/// Core trait for parameter update rules.
pub trait Optimizer {
    /// Applies the update rule to `parameter` in place.
    ///
    /// # Errors
    ///
    /// Fails with `NnError::ShapeMismatch` if the gradient does not have the
    /// parameter's shape; the parameter is left untouched in that case.
    fn update(&mut self, parameter: &mut Parameter, gradient: &Tensor) -> Result<()>;

    /// Get the learning rate for this optimizer.
    fn learning_rate(&self) -> f32;

    /// Set the learning rate for this optimizer.
    fn set_learning_rate(&mut self, lr: f32);
}
