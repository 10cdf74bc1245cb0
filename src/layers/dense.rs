//! Dense (fully connected) layer implementation
//!
//! This module provides a DenseLayer (also known as Linear or Fully Connected layer)
//! that performs the transformation: output = input × weights + biases

use crate::error::Result;
use crate::layers::{Layer, ParameterNodes};
use crate::nn::{Graph, NodeId, Parameter};
use crate::utils::SimpleRng;

/// Dense (fully connected) layer with weights and biases.
///
/// Performs the linear transformation: y = xW + b
/// where x is the input (batch_size × input_size),
/// W is the weight matrix (input_size × output_size),
/// and b is the bias vector (1 × output_size).
#[derive(Debug, Clone)]
pub struct DenseLayer {
    weights: Parameter,
    biases: Parameter,
}

impl DenseLayer {
    /// Create a new DenseLayer with Xavier initialization.
    ///
    /// Weights are sampled uniformly from [-limit, limit] with
    /// limit = sqrt(6 / (input_size + output_size)). The `1 × output_size`
    /// biases use the same scheme with their own shape.
    pub fn new(input_size: usize, output_size: usize, rng: &mut SimpleRng) -> Self {
        Self {
            weights: Parameter::xavier(input_size, output_size, rng),
            biases: Parameter::xavier(1, output_size, rng),
        }
    }

    pub fn weights(&self) -> &Parameter {
        &self.weights
    }

    pub fn biases(&self) -> &Parameter {
        &self.biases
    }
}

impl Layer for DenseLayer {
    type Bound = DenseNodes;

    fn bind(&self, graph: &mut Graph) -> DenseNodes {
        DenseNodes {
            weights: graph.parameter(&self.weights),
            biases: graph.parameter(&self.biases),
        }
    }

    fn parameters(&self) -> Vec<&Parameter> {
        vec![&self.weights, &self.biases]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.weights, &mut self.biases]
    }

    fn input_size(&self) -> usize {
        self.weights.shape().0
    }

    fn output_size(&self) -> usize {
        self.weights.shape().1
    }
}

/// A `DenseLayer` bound to a graph.
#[derive(Debug, Clone, Copy)]
pub struct DenseNodes {
    pub weights: NodeId,
    pub biases: NodeId,
}

impl DenseNodes {
    /// `input · W + b`.
    pub fn forward(&self, graph: &mut Graph, input: NodeId) -> Result<NodeId> {
        let z = graph.linear(input, self.weights)?;
        graph.add_bias(z, self.biases)
    }
}

impl ParameterNodes for DenseNodes {
    fn nodes(&self) -> Vec<NodeId> {
        vec![self.weights, self.biases]
    }
}
