// Tests for numerical gradient checking using finite differences.
// These tests verify that the graph's analytical gradients match central
// difference approximations for every operation the models use.
//
// Inputs and weights are picked so that no ReLU pre-activation sits within
// the perturbation distance of zero.

use approx::assert_relative_eq;
use rust_neural_models::nn::{Graph, NodeId, Parameter, Tensor};

const EPSILON: f32 = 1e-3;

fn tensor(rows: usize, cols: usize, data: &[f32]) -> Tensor {
    Tensor::new(rows, cols, data.to_vec()).unwrap()
}

// Compares graph gradients of `build` with finite differences for every
// element of every parameter.
fn check_gradients<F>(params: &[Tensor], build: F)
where
    F: Fn(&mut Graph, &[NodeId]) -> NodeId,
{
    let loss_of = |values: &[Tensor]| -> f32 {
        let mut graph = Graph::new();
        let nodes: Vec<NodeId> = values
            .iter()
            .map(|v| graph.parameter(&Parameter::from_tensor(v.clone())))
            .collect();
        let loss = build(&mut graph, &nodes);
        graph.as_scalar(loss).unwrap()
    };

    let mut graph = Graph::new();
    let nodes: Vec<NodeId> = params
        .iter()
        .map(|v| graph.parameter(&Parameter::from_tensor(v.clone())))
        .collect();
    let loss = build(&mut graph, &nodes);
    let analytic = graph.gradients(loss, &nodes).unwrap();

    for (p, grad) in analytic.iter().enumerate() {
        assert_eq!(grad.shape(), params[p].shape());
        for i in 0..params[p].len() {
            let mut plus = params.to_vec();
            plus[p].data_mut()[i] += EPSILON;
            let mut minus = params.to_vec();
            minus[p].data_mut()[i] -= EPSILON;

            let numeric = (loss_of(&plus) - loss_of(&minus)) / (2.0 * EPSILON);
            assert_relative_eq!(grad.data()[i], numeric, epsilon = 2e-3, max_relative = 1e-2);
        }
    }
}

// ============================================================================
// Feed-forward Gradient Tests
// ============================================================================

mod feed_forward_tests {
    use super::*;

    #[test]
    fn test_two_layer_softmax_network() {
        let x = tensor(3, 2, &[1.0, 0.5, 0.2, 0.8, 0.6, 0.3]);
        let labels = Tensor::one_hot(&[0, 2, 1], 3).unwrap();
        let params = vec![
            x,
            tensor(2, 4, &[0.5, -0.7, 0.3, -0.2, 0.4, -0.6, 0.9, -0.5]),
            tensor(1, 4, &[0.1, -0.1, 0.05, -0.05]),
            tensor(4, 3, &[0.2, -0.3, 0.5, 0.1, 0.4, -0.2, -0.5, 0.3, 0.2, 0.6, -0.1, 0.3]),
            tensor(1, 3, &[0.0, 0.1, -0.1]),
        ];

        check_gradients(&params, |graph, p| {
            let z = graph.linear(p[0], p[1]).unwrap();
            let z = graph.add_bias(z, p[2]).unwrap();
            let h = graph.relu(z).unwrap();
            let out = graph.linear(h, p[3]).unwrap();
            let out = graph.add_bias(out, p[4]).unwrap();
            let y = graph.constant(labels.clone());
            graph.softmax_loss(out, y).unwrap()
        });
    }

    #[test]
    fn test_square_loss_regression_network() {
        let targets = tensor(3, 1, &[0.5, -0.2, 0.1]);
        let params = vec![
            tensor(3, 1, &[0.5, 1.0, 1.5]),
            tensor(1, 3, &[0.8, -0.4, 0.6]),
            tensor(1, 3, &[0.1, -0.1, 0.2]),
            tensor(3, 1, &[0.3, -0.7, 0.2]),
            tensor(1, 1, &[0.05]),
        ];

        check_gradients(&params, |graph, p| {
            let z = graph.linear(p[0], p[1]).unwrap();
            let z = graph.add_bias(z, p[2]).unwrap();
            let h = graph.relu(z).unwrap();
            let out = graph.linear(h, p[3]).unwrap();
            let out = graph.add_bias(out, p[4]).unwrap();
            let y = graph.constant(targets.clone());
            graph.square_loss(out, y).unwrap()
        });
    }

    #[test]
    fn test_dot_product() {
        let targets = tensor(2, 1, &[1.0, -1.0]);
        let params = vec![
            tensor(2, 3, &[1.0, -2.0, 0.5, 0.3, 0.7, -1.1]),
            tensor(1, 3, &[0.4, 0.1, -0.6]),
        ];

        check_gradients(&params, |graph, p| {
            let score = graph.dot_product(p[0], p[1]).unwrap();
            let y = graph.constant(targets.clone());
            graph.square_loss(score, y).unwrap()
        });
    }
}

// ============================================================================
// Recurrent Gradient Tests
// ============================================================================

mod recurrent_tests {
    use super::*;

    #[test]
    fn test_two_step_recurrence_with_shared_weights() {
        let steps = [
            Tensor::one_hot(&[0, 2], 3).unwrap(),
            Tensor::one_hot(&[1, 1], 3).unwrap(),
        ];
        let labels = Tensor::one_hot(&[0, 1], 2).unwrap();
        let params = vec![
            tensor(3, 2, &[0.5, 0.3, 0.4, 0.6, 0.7, 0.2]),
            tensor(2, 2, &[0.3, -0.2, 0.1, 0.4]),
            tensor(1, 2, &[0.1, 0.1]),
            tensor(2, 2, &[0.5, -0.5, 0.3, 0.2]),
            tensor(1, 2, &[0.0, 0.0]),
        ];

        check_gradients(&params, |graph, p| {
            let x0 = graph.constant(steps[0].clone());
            let z = graph.linear(x0, p[0]).unwrap();
            let z = graph.add_bias(z, p[2]).unwrap();
            let mut h = graph.relu(z).unwrap();

            let x1 = graph.constant(steps[1].clone());
            let a = graph.linear(x1, p[0]).unwrap();
            let b = graph.linear(h, p[1]).unwrap();
            let z = graph.add(a, b).unwrap();
            let z = graph.add_bias(z, p[2]).unwrap();
            h = graph.relu(z).unwrap();

            let out = graph.linear(h, p[3]).unwrap();
            let out = graph.add_bias(out, p[4]).unwrap();
            let y = graph.constant(labels.clone());
            graph.softmax_loss(out, y).unwrap()
        });
    }
}
