//! Reverse-mode automatic differentiation over a tape of tensor operations
//!
//! A `Graph` records every operation of one forward pass in evaluation order.
//! Each node stores its computed value, so `gradients` only has to walk the
//! tape backwards once, accumulating the gradient of every node from the
//! nodes that consumed it.
//!
//! A graph is built per training step and dropped afterwards. Parameters are
//! copied onto the tape when bound, so the model stays free to update them
//! once the gradients have been extracted.
//!
//! # Example
//!
//! ```
//! use rust_neural_models::nn::{Graph, Parameter, Tensor};
//!
//! let w = Parameter::from_tensor(Tensor::new(2, 1, vec![0.5, -1.0]).unwrap());
//! let mut graph = Graph::new();
//! let x = graph.constant(Tensor::new(1, 2, vec![2.0, 1.0]).unwrap());
//! let w_node = graph.parameter(&w);
//! let y = graph.linear(x, w_node).unwrap();
//! let target = graph.constant(Tensor::scalar(1.0));
//! let loss = graph.square_loss(y, target).unwrap();
//!
//! let grads = graph.gradients(loss, &[w_node]).unwrap();
//! assert_eq!(grads[0].shape(), (2, 1));
//! ```

use crate::error::{NnError, Result};
use crate::nn::{Parameter, Tensor};
use crate::utils::{log_softmax_rows, relu_backward_inplace, relu_inplace, softmax_rows};

/// Handle to a node recorded on a `Graph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy)]
enum Op {
    Constant,
    Parameter,
    Linear { features: NodeId, weights: NodeId },
    AddBias { features: NodeId, bias: NodeId },
    Add { lhs: NodeId, rhs: NodeId },
    Relu { input: NodeId },
    DotProduct { features: NodeId, weights: NodeId },
    SquareLoss { predictions: NodeId, targets: NodeId },
    SoftmaxLoss { logits: NodeId, labels: NodeId },
}

#[derive(Debug)]
struct Node {
    op: Op,
    value: Tensor,
}

/// Tape of tensor operations supporting reverse-mode differentiation.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Records a value that gradients are not expected to flow into.
    pub fn constant(&mut self, value: Tensor) -> NodeId {
        self.push(Op::Constant, value)
    }

    /// Records a snapshot of a parameter's current value.
    pub fn parameter(&mut self, parameter: &Parameter) -> NodeId {
        self.push(Op::Parameter, parameter.value().clone())
    }

    pub fn value(&self, node: NodeId) -> Result<&Tensor> {
        self.nodes
            .get(node.0)
            .map(|n| &n.value)
            .ok_or(NnError::UnknownNode(node.0))
    }

    /// Extracts the value of a `1 × 1` node.
    pub fn as_scalar(&self, node: NodeId) -> Result<f32> {
        self.value(node)?.as_scalar()
    }

    /// `features × weights`: (B × I) · (I × O) → (B × O).
    pub fn linear(&mut self, features: NodeId, weights: NodeId) -> Result<NodeId> {
        let x = self.value(features)?;
        let w = self.value(weights)?;
        if x.cols() != w.rows() {
            return Err(NnError::ShapeMismatch {
                op: "linear",
                left: x.shape(),
                right: w.shape(),
            });
        }
        let value = x.matmul(w)?;
        Ok(self.push(Op::Linear { features, weights }, value))
    }

    /// Adds a `1 × O` bias to every row of a `B × O` node.
    pub fn add_bias(&mut self, features: NodeId, bias: NodeId) -> Result<NodeId> {
        let x = self.value(features)?;
        let b = self.value(bias)?;
        if b.rows() != 1 || b.cols() != x.cols() {
            return Err(NnError::ShapeMismatch {
                op: "add_bias",
                left: x.shape(),
                right: b.shape(),
            });
        }

        let mut value = x.clone();
        let cols = value.cols();
        for row in value.data_mut().chunks_exact_mut(cols.max(1)) {
            for (v, &bias) in row.iter_mut().zip(b.data()) {
                *v += bias;
            }
        }
        Ok(self.push(Op::AddBias { features, bias }, value))
    }

    /// Element-wise sum of two nodes of equal shape.
    pub fn add(&mut self, lhs: NodeId, rhs: NodeId) -> Result<NodeId> {
        let a = self.value(lhs)?;
        let b = self.value(rhs)?;
        if a.shape() != b.shape() {
            return Err(NnError::ShapeMismatch {
                op: "add",
                left: a.shape(),
                right: b.shape(),
            });
        }
        let mut value = a.clone();
        value.add_scaled(b, 1.0)?;
        Ok(self.push(Op::Add { lhs, rhs }, value))
    }

    pub fn relu(&mut self, input: NodeId) -> Result<NodeId> {
        let mut value = self.value(input)?.clone();
        relu_inplace(value.data_mut());
        Ok(self.push(Op::Relu { input }, value))
    }

    /// Row-wise dot product of a `B × D` node with a `1 × D` node → `B × 1`.
    pub fn dot_product(&mut self, features: NodeId, weights: NodeId) -> Result<NodeId> {
        let x = self.value(features)?;
        let w = self.value(weights)?;
        if w.rows() != 1 || w.cols() != x.cols() {
            return Err(NnError::ShapeMismatch {
                op: "dot_product",
                left: x.shape(),
                right: w.shape(),
            });
        }
        let value = x.matmul(&w.transpose())?;
        Ok(self.push(Op::DotProduct { features, weights }, value))
    }

    /// Mean of half squared differences over every element.
    pub fn square_loss(&mut self, predictions: NodeId, targets: NodeId) -> Result<NodeId> {
        let a = self.value(predictions)?;
        let b = self.value(targets)?;
        if a.shape() != b.shape() {
            return Err(NnError::ShapeMismatch {
                op: "square_loss",
                left: a.shape(),
                right: b.shape(),
            });
        }

        let n = a.len().max(1) as f32;
        let total: f32 = a
            .data()
            .iter()
            .zip(b.data())
            .map(|(&p, &t)| (p - t) * (p - t) / 2.0)
            .sum();
        Ok(self.push(
            Op::SquareLoss {
                predictions,
                targets,
            },
            Tensor::scalar(total / n),
        ))
    }

    /// Batch mean of the softmax cross-entropy between logits and label
    /// distributions (typically one-hot rows).
    ///
    /// # Errors
    ///
    /// `NnError::InvalidLabels` if a label row has negative entries or does
    /// not sum to 1.
    pub fn softmax_loss(&mut self, logits: NodeId, labels: NodeId) -> Result<NodeId> {
        let z = self.value(logits)?;
        let y = self.value(labels)?;
        if z.shape() != y.shape() {
            return Err(NnError::ShapeMismatch {
                op: "softmax_loss",
                left: z.shape(),
                right: y.shape(),
            });
        }
        for r in 0..y.rows() {
            let row = y.row(r);
            let sum: f32 = row.iter().sum();
            if row.iter().any(|&v| v < 0.0) || (sum - 1.0).abs() > 1e-4 {
                return Err(NnError::InvalidLabels);
            }
        }

        let mut log_probs = z.clone();
        log_softmax_rows(log_probs.data_mut(), z.rows(), z.cols());
        let total: f32 = log_probs
            .data()
            .iter()
            .zip(y.data())
            .map(|(&lp, &label)| -label * lp)
            .sum();
        let batch = z.rows().max(1) as f32;
        Ok(self.push(Op::SoftmaxLoss { logits, labels }, Tensor::scalar(total / batch)))
    }

    /// Gradients of a scalar `loss` node with respect to each of `nodes`.
    ///
    /// Nodes the loss does not depend on get a zero gradient. Each returned
    /// tensor has the shape of the node it was requested for.
    ///
    /// # Errors
    ///
    /// `NnError::NotScalar` if `loss` is not `1 × 1`; `NnError::UnknownNode`
    /// for handles that do not belong to this graph.
    pub fn gradients(&self, loss: NodeId, nodes: &[NodeId]) -> Result<Vec<Tensor>> {
        let loss_value = self.value(loss)?;
        if loss_value.shape() != (1, 1) {
            return Err(NnError::NotScalar {
                rows: loss_value.rows(),
                cols: loss_value.cols(),
            });
        }
        for node in nodes {
            self.value(*node)?;
        }

        let mut grads: Vec<Option<Tensor>> = vec![None; loss.0 + 1];
        grads[loss.0] = Some(Tensor::scalar(1.0));

        for index in (0..=loss.0).rev() {
            let (before, rest) = grads.split_at_mut(index);
            let Some(grad) = rest[0].as_ref() else {
                continue;
            };
            self.backward_node(index, grad, before)?;
        }

        Ok(nodes
            .iter()
            .map(|node| match grads.get(node.0).and_then(Option::as_ref) {
                Some(grad) => grad.clone(),
                None => {
                    let (rows, cols) = self.nodes[node.0].value.shape();
                    Tensor::zeros(rows, cols)
                }
            })
            .collect())
    }

    /// Pushes the gradient of node `index` into the slots of its inputs.
    /// Inputs always precede their consumer on the tape, so every input slot
    /// lives in `before`.
    fn backward_node(&self, index: usize, grad: &Tensor, before: &mut [Option<Tensor>]) -> Result<()> {
        match self.nodes[index].op {
            Op::Constant | Op::Parameter => {}
            Op::Linear { features, weights } => {
                let x = &self.nodes[features.0].value;
                let w = &self.nodes[weights.0].value;
                accumulate(&mut before[features.0], grad.matmul(&w.transpose())?)?;
                accumulate(&mut before[weights.0], x.transpose().matmul(grad)?)?;
            }
            Op::AddBias { features, bias } => {
                accumulate(&mut before[features.0], grad.clone())?;
                accumulate(&mut before[bias.0], grad.sum_rows())?;
            }
            Op::Add { lhs, rhs } => {
                accumulate(&mut before[lhs.0], grad.clone())?;
                accumulate(&mut before[rhs.0], grad.clone())?;
            }
            Op::Relu { input } => {
                let mut input_grad = grad.clone();
                relu_backward_inplace(self.nodes[input.0].value.data(), input_grad.data_mut());
                accumulate(&mut before[input.0], input_grad)?;
            }
            Op::DotProduct { features, weights } => {
                let x = &self.nodes[features.0].value;
                let w = &self.nodes[weights.0].value;
                accumulate(&mut before[features.0], grad.matmul(w)?)?;
                accumulate(&mut before[weights.0], grad.transpose().matmul(x)?)?;
            }
            Op::SquareLoss {
                predictions,
                targets,
            } => {
                let a = &self.nodes[predictions.0].value;
                let b = &self.nodes[targets.0].value;
                let scale = grad.as_scalar()? / a.len().max(1) as f32;

                let mut diff = a.clone();
                diff.add_scaled(b, -1.0)?;
                let da = diff.map(|d| d * scale);
                let db = da.map(|d| -d);
                accumulate(&mut before[predictions.0], da)?;
                accumulate(&mut before[targets.0], db)?;
            }
            Op::SoftmaxLoss { logits, labels } => {
                let z = &self.nodes[logits.0].value;
                let y = &self.nodes[labels.0].value;
                let scale = grad.as_scalar()? / z.rows().max(1) as f32;

                let mut probs = z.clone();
                softmax_rows(probs.data_mut(), z.rows(), z.cols());
                probs.add_scaled(y, -1.0)?;
                accumulate(&mut before[logits.0], probs.map(|d| d * scale))?;

                let mut log_probs = z.clone();
                log_softmax_rows(log_probs.data_mut(), z.rows(), z.cols());
                accumulate(&mut before[labels.0], log_probs.map(|lp| -lp * scale))?;
            }
        }
        Ok(())
    }

    fn push(&mut self, op: Op, value: Tensor) -> NodeId {
        self.nodes.push(Node { op, value });
        NodeId(self.nodes.len() - 1)
    }
}

fn accumulate(slot: &mut Option<Tensor>, contribution: Tensor) -> Result<()> {
    match slot {
        Some(existing) => existing.add_scaled(&contribution, 1.0),
        None => {
            *slot = Some(contribution);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(rows: usize, cols: usize, data: &[f32]) -> Tensor {
        Tensor::new(rows, cols, data.to_vec()).unwrap()
    }

    #[test]
    fn test_linear_forward() {
        let mut graph = Graph::new();
        let x = graph.constant(t(1, 2, &[1.0, 2.0]));
        let w = graph.constant(t(2, 3, &[1.0, 0.0, -1.0, 0.5, 2.0, 1.0]));
        let y = graph.linear(x, w).unwrap();
        assert_eq!(graph.value(y).unwrap().data(), &[2.0, 4.0, 1.0]);
    }

    #[test]
    fn test_add_bias_rejects_wrong_width() {
        let mut graph = Graph::new();
        let x = graph.constant(Tensor::zeros(4, 3));
        let b = graph.constant(Tensor::zeros(1, 2));
        assert!(matches!(
            graph.add_bias(x, b),
            Err(NnError::ShapeMismatch { op: "add_bias", .. })
        ));
    }

    #[test]
    fn test_dot_product_batch() {
        let mut graph = Graph::new();
        let x = graph.constant(t(2, 2, &[1.0, 1.0, -1.0, 2.0]));
        let w = graph.constant(t(1, 2, &[3.0, -1.0]));
        let score = graph.dot_product(x, w).unwrap();
        assert_eq!(graph.value(score).unwrap().data(), &[2.0, -5.0]);
    }

    #[test]
    fn test_square_loss_value_and_gradient() {
        let mut graph = Graph::new();
        let p = graph.constant(t(2, 1, &[1.0, 3.0]));
        let y = graph.constant(t(2, 1, &[0.0, 1.0]));
        let loss = graph.square_loss(p, y).unwrap();

        // ((1)^2 / 2 + (2)^2 / 2) / 2 = 1.25
        assert!((graph.as_scalar(loss).unwrap() - 1.25).abs() < 1e-6);

        let grads = graph.gradients(loss, &[p]).unwrap();
        assert_eq!(grads[0].data(), &[0.5, 1.0]);
    }

    #[test]
    fn test_softmax_loss_uniform_logits() {
        let mut graph = Graph::new();
        let z = graph.constant(Tensor::zeros(1, 4));
        let y = graph.constant(Tensor::one_hot(&[2], 4).unwrap());
        let loss = graph.softmax_loss(z, y).unwrap();
        assert!((graph.as_scalar(loss).unwrap() - 4.0f32.ln()).abs() < 1e-5);

        let grads = graph.gradients(loss, &[z]).unwrap();
        assert!((grads[0].get(0, 2) - (0.25 - 1.0)).abs() < 1e-6);
        assert!((grads[0].get(0, 0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_loss_rejects_bad_labels() {
        let mut graph = Graph::new();
        let z = graph.constant(Tensor::zeros(1, 2));
        let y = graph.constant(t(1, 2, &[0.7, 0.7]));
        assert!(matches!(graph.softmax_loss(z, y), Err(NnError::InvalidLabels)));
    }

    #[test]
    fn test_gradients_require_scalar_loss() {
        let mut graph = Graph::new();
        let x = graph.constant(Tensor::zeros(2, 2));
        let r = graph.relu(x).unwrap();
        assert!(matches!(
            graph.gradients(r, &[x]),
            Err(NnError::NotScalar { rows: 2, cols: 2 })
        ));
    }

    #[test]
    fn test_gradient_accumulates_over_reuse() {
        // loss = mean((x + x - 0)^2 / 2) with x = 3 -> d/dx = 2 * (2x) = 12
        let mut graph = Graph::new();
        let x = graph.constant(Tensor::scalar(3.0));
        let doubled = graph.add(x, x).unwrap();
        let zero = graph.constant(Tensor::scalar(0.0));
        let loss = graph.square_loss(doubled, zero).unwrap();

        let grads = graph.gradients(loss, &[x]).unwrap();
        assert!((grads[0].as_scalar().unwrap() - 12.0).abs() < 1e-5);
    }

    #[test]
    fn test_unrelated_node_gets_zero_gradient() {
        let mut graph = Graph::new();
        let x = graph.constant(Tensor::scalar(1.0));
        let unused = graph.constant(Tensor::zeros(2, 3));
        let y = graph.constant(Tensor::scalar(0.0));
        let loss = graph.square_loss(x, y).unwrap();

        let grads = graph.gradients(loss, &[unused]).unwrap();
        assert_eq!(grads[0], Tensor::zeros(2, 3));
    }

    #[test]
    fn test_unknown_node() {
        let mut other = Graph::new();
        let _ = other.constant(Tensor::scalar(1.0));
        let foreign = other.constant(Tensor::scalar(2.0));

        let graph = Graph::new();
        assert!(matches!(graph.value(foreign), Err(NnError::UnknownNode(1))));
    }
}
