//! Layer trait definition for neural network layers
//!
//! A layer owns its parameters. To run it, the layer is first bound to a
//! `Graph`, which records a snapshot of every parameter and returns the node
//! handles; the bound handles then drive the forward pass, possibly several
//! times (weight sharing across time steps). After `Graph::gradients`, the
//! gradients come back to the layer through `update_parameters`.

use crate::error::{NnError, Result};
use crate::nn::{Graph, NodeId, Parameter, Tensor};
use crate::optimizers::Optimizer;

/// Graph handles of a bound layer's parameters.
pub trait ParameterNodes {
    /// Node handles in the same order as `Layer::parameters`.
    fn nodes(&self) -> Vec<NodeId>;
}

/// Core trait for neural network layers.
///
/// # Example
///
/// ```
/// use rust_neural_models::layers::{DenseLayer, Layer, ParameterNodes};
/// use rust_neural_models::nn::{Graph, Tensor};
/// use rust_neural_models::optimizers::SGD;
/// use rust_neural_models::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let mut layer = DenseLayer::new(3, 2, &mut rng);
///
/// let mut graph = Graph::new();
/// let bound = layer.bind(&mut graph);
/// let x = graph.constant(Tensor::zeros(4, 3));
/// let y = bound.forward(&mut graph, x).unwrap();
/// let target = graph.constant(Tensor::zeros(4, 2));
/// let loss = graph.square_loss(y, target).unwrap();
///
/// let grads = graph.gradients(loss, &bound.nodes()).unwrap();
/// layer.update_parameters(&grads, &mut SGD::new(0.1)).unwrap();
/// ```
pub trait Layer {
    /// Handles returned by `bind`.
    type Bound: ParameterNodes;

    /// Records the current parameter values on `graph`.
    fn bind(&self, graph: &mut Graph) -> Self::Bound;

    fn parameters(&self) -> Vec<&Parameter>;

    fn parameters_mut(&mut self) -> Vec<&mut Parameter>;

    /// Get the input size of the layer.
    fn input_size(&self) -> usize;

    /// Get the output size of the layer.
    fn output_size(&self) -> usize;

    /// Total count of trainable values (weights and biases).
    fn parameter_count(&self) -> usize {
        self.parameters().iter().map(|p| p.len()).sum()
    }

    /// Applies one gradient per parameter, in `parameters` order.
    ///
    /// # Errors
    ///
    /// `NnError::ShapeMismatch` if the number of gradients differs from the
    /// number of parameters, or if any gradient has the wrong shape.
    fn update_parameters(&mut self, gradients: &[Tensor], optimizer: &mut dyn Optimizer) -> Result<()> {
        let parameters = self.parameters_mut();
        if parameters.len() != gradients.len() {
            return Err(NnError::ShapeMismatch {
                op: "update_parameters",
                left: (parameters.len(), 1),
                right: (gradients.len(), 1),
            });
        }
        for (parameter, gradient) in parameters.into_iter().zip(gradients) {
            optimizer.update(parameter, gradient)?;
        }
        Ok(())
    }
}
