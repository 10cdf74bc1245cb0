//! Learnable parameters
//!
//! A `Parameter` is an owned tensor whose shape is fixed at construction and
//! which only changes through `apply_gradient`.

use crate::error::{NnError, Result};
use crate::nn::Tensor;
use crate::utils::SimpleRng;

/// Fixed-shape, mutable weight or bias buffer.
#[derive(Debug, Clone)]
pub struct Parameter {
    value: Tensor,
}

impl Parameter {
    /// Creates a `rows × cols` parameter with Xavier initialization.
    ///
    /// Values are drawn uniformly from [-limit, limit] where
    /// limit = sqrt(6 / (rows + cols)).
    pub fn xavier(rows: usize, cols: usize, rng: &mut SimpleRng) -> Self {
        let limit = (6.0f32 / (rows + cols) as f32).sqrt();
        let mut value = Tensor::zeros(rows, cols);
        for x in value.data_mut() {
            *x = rng.gen_range_f32(-limit, limit);
        }
        Self { value }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            value: Tensor::zeros(rows, cols),
        }
    }

    pub fn from_tensor(value: Tensor) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Tensor {
        &self.value
    }

    pub fn shape(&self) -> (usize, usize) {
        self.value.shape()
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// In-place additive update: `value += step_size * gradient`.
    ///
    /// Gradient descent passes a negative step size; the perceptron rule
    /// passes the label as the step size and the input as the direction.
    ///
    /// # Errors
    ///
    /// `NnError::ShapeMismatch` when `gradient` does not match the parameter.
    pub fn apply_gradient(&mut self, gradient: &Tensor, step_size: f32) -> Result<()> {
        if gradient.shape() != self.value.shape() {
            return Err(NnError::ShapeMismatch {
                op: "apply_gradient",
                left: self.value.shape(),
                right: gradient.shape(),
            });
        }
        self.value.add_scaled(gradient, step_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xavier_range() {
        let mut rng = SimpleRng::new(42);
        let param = Parameter::xavier(100, 50, &mut rng);
        let limit = (6.0f32 / 150.0).sqrt();

        assert_eq!(param.shape(), (100, 50));
        for &w in param.value().data() {
            assert!(w >= -limit && w <= limit, "weight {w} outside [{}, {limit}]", -limit);
        }
    }

    #[test]
    fn test_xavier_deterministic() {
        let a = Parameter::xavier(10, 5, &mut SimpleRng::new(7));
        let b = Parameter::xavier(10, 5, &mut SimpleRng::new(7));
        assert_eq!(a.value(), b.value());
    }

    #[test]
    fn test_apply_gradient() {
        let mut param = Parameter::from_tensor(Tensor::row_vector(&[1.0, 2.0]));
        param
            .apply_gradient(&Tensor::row_vector(&[0.5, -1.0]), -0.1)
            .unwrap();
        let data = param.value().data();
        assert!((data[0] - 0.95).abs() < 1e-6);
        assert!((data[1] - 2.1).abs() < 1e-6);
    }

    #[test]
    fn test_zero_gradient_leaves_value_unchanged() {
        let mut param = Parameter::xavier(3, 4, &mut SimpleRng::new(1));
        let before = param.value().clone();

        param.apply_gradient(&Tensor::zeros(3, 4), -0.5).unwrap();

        assert_eq!(param.value(), &before);
    }

    #[test]
    fn test_apply_gradient_shape_mismatch() {
        let mut param = Parameter::zeros(2, 2);
        let err = param.apply_gradient(&Tensor::zeros(1, 2), 1.0).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch { op: "apply_gradient", .. }));
        assert_eq!(param.shape(), (2, 2));
    }
}
