//! Stochastic Gradient Descent (SGD) optimizer implementation
//!
//! Vanilla SGD with a fixed learning rate: `w = w - η * ∇L/∂w`.

use crate::error::Result;
use crate::nn::{Parameter, Tensor};
use crate::optimizers::Optimizer;

/// Stochastic Gradient Descent optimizer.
///
/// No momentum, no adaptive rates, no schedule: the learning rate given at
/// construction is used for every update.
///
/// # Example
///
/// ```
/// use rust_neural_models::nn::{Parameter, Tensor};
/// use rust_neural_models::optimizers::{Optimizer, SGD};
///
/// let mut optimizer = SGD::new(0.1);
/// let mut params = Parameter::from_tensor(Tensor::row_vector(&[1.0, 2.0, 3.0]));
/// let grads = Tensor::row_vector(&[0.1, 0.2, 0.3]);
///
/// optimizer.update(&mut params, &grads).unwrap();
/// let data = params.value().data();
/// assert!((data[0] - 0.99).abs() < 1e-6);
/// assert!((data[2] - 2.97).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct SGD {
    learning_rate: f32,
}

impl SGD {
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for SGD {
    fn update(&mut self, parameter: &mut Parameter, gradient: &Tensor) -> Result<()> {
        parameter.apply_gradient(gradient, -self.learning_rate)
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}
