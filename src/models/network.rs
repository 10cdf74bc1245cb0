//! Two-layer feed-forward network shared by the regression and digit models.

use tracing::debug;

use crate::error::Result;
use crate::layers::{DenseLayer, DenseNodes, Layer, ParameterNodes};
use crate::nn::{Graph, NodeId, Tensor};
use crate::optimizers::Optimizer;
use crate::utils::SimpleRng;

/// Loss the network is trained against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// `mean((prediction - target)² / 2)`.
    Square,
    /// Softmax cross-entropy against one-hot labels.
    SoftmaxCrossEntropy,
}

/// `input → dense → relu → dense`.
#[derive(Debug, Clone)]
pub struct TwoLayerNetwork {
    hidden: DenseLayer,
    output: DenseLayer,
}

struct BoundNetwork {
    hidden: DenseNodes,
    output: DenseNodes,
}

impl TwoLayerNetwork {
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize, rng: &mut SimpleRng) -> Self {
        Self {
            hidden: DenseLayer::new(input_size, hidden_size, rng),
            output: DenseLayer::new(hidden_size, output_size, rng),
        }
    }

    pub fn hidden(&self) -> &DenseLayer {
        &self.hidden
    }

    pub fn output(&self) -> &DenseLayer {
        &self.output
    }

    /// Output layer values for a `batch × input_size` tensor.
    pub fn run(&self, x: &Tensor) -> Result<Tensor> {
        let mut graph = Graph::new();
        let (_, out) = self.forward(&mut graph, x)?;
        Ok(graph.value(out)?.clone())
    }

    /// Loss of the batch under `objective`.
    pub fn loss(&self, x: &Tensor, y: &Tensor, objective: Objective) -> Result<f32> {
        let mut graph = Graph::new();
        let (_, loss) = self.record_loss(&mut graph, x, y, objective)?;
        graph.as_scalar(loss)
    }

    /// One gradient step on a batch; returns the loss before the step.
    pub fn train_step(
        &mut self,
        x: &Tensor,
        y: &Tensor,
        objective: Objective,
        optimizer: &mut dyn Optimizer,
    ) -> Result<f32> {
        let mut graph = Graph::new();
        let (bound, loss) = self.record_loss(&mut graph, x, y, objective)?;
        let value = graph.as_scalar(loss)?;

        let hidden_nodes = bound.hidden.nodes();
        let nodes: Vec<NodeId> = hidden_nodes.iter().copied().chain(bound.output.nodes()).collect();
        let mut gradients = graph.gradients(loss, &nodes)?;
        let output_gradients = gradients.split_off(hidden_nodes.len());

        self.hidden.update_parameters(&gradients, optimizer)?;
        self.output.update_parameters(&output_gradients, optimizer)?;
        debug!(batch = x.rows(), loss = value, "train step");
        Ok(value)
    }

    fn forward(&self, graph: &mut Graph, x: &Tensor) -> Result<(BoundNetwork, NodeId)> {
        let bound = BoundNetwork {
            hidden: self.hidden.bind(graph),
            output: self.output.bind(graph),
        };
        let input = graph.constant(x.clone());
        let z = bound.hidden.forward(graph, input)?;
        let h = graph.relu(z)?;
        let out = bound.output.forward(graph, h)?;
        Ok((bound, out))
    }

    fn record_loss(
        &self,
        graph: &mut Graph,
        x: &Tensor,
        y: &Tensor,
        objective: Objective,
    ) -> Result<(BoundNetwork, NodeId)> {
        let (bound, out) = self.forward(graph, x)?;
        let target = graph.constant(y.clone());
        let loss = match objective {
            Objective::Square => graph.square_loss(out, target)?,
            Objective::SoftmaxCrossEntropy => graph.softmax_loss(out, target)?,
        };
        Ok((bound, loss))
    }
}
