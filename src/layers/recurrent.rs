//! Elman recurrent cell
//!
//! `h₀ = relu(x₀ Wx + b)` and `hᵢ = relu(xᵢ Wx + hᵢ₋₁ Wh + b)`. The same
//! three parameters serve every position, so a bound cell is applied in a
//! loop over however many steps the sequence has at run time.

use crate::error::{NnError, Result};
use crate::layers::{Layer, ParameterNodes};
use crate::nn::{Graph, NodeId, Parameter};
use crate::utils::SimpleRng;

#[derive(Debug, Clone)]
pub struct RecurrentCell {
    input_weights: Parameter,
    hidden_weights: Parameter,
    biases: Parameter,
}

impl RecurrentCell {
    /// Xavier-initialized weights and biases.
    pub fn new(input_size: usize, hidden_size: usize, rng: &mut SimpleRng) -> Self {
        Self {
            input_weights: Parameter::xavier(input_size, hidden_size, rng),
            hidden_weights: Parameter::xavier(hidden_size, hidden_size, rng),
            biases: Parameter::xavier(1, hidden_size, rng),
        }
    }

    pub fn input_weights(&self) -> &Parameter {
        &self.input_weights
    }

    pub fn hidden_weights(&self) -> &Parameter {
        &self.hidden_weights
    }

    pub fn biases(&self) -> &Parameter {
        &self.biases
    }
}

impl Layer for RecurrentCell {
    type Bound = RecurrentNodes;

    fn bind(&self, graph: &mut Graph) -> RecurrentNodes {
        RecurrentNodes {
            input_weights: graph.parameter(&self.input_weights),
            hidden_weights: graph.parameter(&self.hidden_weights),
            biases: graph.parameter(&self.biases),
        }
    }

    fn parameters(&self) -> Vec<&Parameter> {
        vec![&self.input_weights, &self.hidden_weights, &self.biases]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.input_weights, &mut self.hidden_weights, &mut self.biases]
    }

    fn input_size(&self) -> usize {
        self.input_weights.shape().0
    }

    fn output_size(&self) -> usize {
        self.input_weights.shape().1
    }
}

/// A `RecurrentCell` bound to a graph.
#[derive(Debug, Clone, Copy)]
pub struct RecurrentNodes {
    pub input_weights: NodeId,
    pub hidden_weights: NodeId,
    pub biases: NodeId,
}

impl RecurrentNodes {
    /// First position: no previous hidden state.
    pub fn start(&self, graph: &mut Graph, x: NodeId) -> Result<NodeId> {
        let z = graph.linear(x, self.input_weights)?;
        let z = graph.add_bias(z, self.biases)?;
        graph.relu(z)
    }

    /// Any later position.
    pub fn step(&self, graph: &mut Graph, x: NodeId, hidden: NodeId) -> Result<NodeId> {
        let from_input = graph.linear(x, self.input_weights)?;
        let from_hidden = graph.linear(hidden, self.hidden_weights)?;
        let z = graph.add(from_input, from_hidden)?;
        let z = graph.add_bias(z, self.biases)?;
        graph.relu(z)
    }

    /// Folds the cell over `steps` left to right and returns the final
    /// hidden state.
    pub fn run(&self, graph: &mut Graph, steps: &[NodeId]) -> Result<NodeId> {
        let (&first, rest) = steps.split_first().ok_or(NnError::EmptySequence)?;
        let mut hidden = self.start(graph, first)?;
        for &x in rest {
            hidden = self.step(graph, x, hidden)?;
        }
        Ok(hidden)
    }
}

impl ParameterNodes for RecurrentNodes {
    fn nodes(&self) -> Vec<NodeId> {
        vec![self.input_weights, self.hidden_weights, self.biases]
    }
}
