//! Recurrent language identifier
//!
//! A word arrives as `L` one-hot character batches. An Elman cell folds them
//! into a hidden state, and a dense layer turns the final state into one
//! score per language:
//!
//! ```text
//! h = relu(x₀·Wx + bh)
//! h = relu(xᵢ·Wx + h·Wh + bh)      for i = 1..L
//! scores = h·Wy + by
//! ```
//!
//! The cell is bound to the graph once per forward pass, so all positions
//! share `Wx`, `Wh` and `bh` and their gradients are summed over time.

use tracing::{debug, info, warn};

use crate::config::LanguageIdConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::layers::{DenseLayer, DenseNodes, Layer, ParameterNodes, RecurrentCell, RecurrentNodes};
use crate::models::{
    begin_training, check_widths, ensure_not_empty, Model, StopReason, TrainingReport, TrainingState,
};
use crate::nn::{Graph, NodeId, Tensor};
use crate::optimizers::SGD;
use crate::utils::SimpleRng;

#[derive(Debug, Clone)]
pub struct LanguageIdModel {
    cell: RecurrentCell,
    output: DenseLayer,
    optimizer: SGD,
    config: LanguageIdConfig,
    state: TrainingState,
}

impl LanguageIdModel {
    /// # Errors
    ///
    /// `NnError::Config` if `config` fails validation.
    pub fn new(config: LanguageIdConfig, rng: &mut SimpleRng) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cell: RecurrentCell::new(config.num_chars, config.hidden_size, rng),
            output: DenseLayer::new(config.hidden_size, config.languages.len(), rng),
            optimizer: SGD::new(config.learning_rate),
            config,
            state: TrainingState::Initialized,
        })
    }

    pub fn cell(&self) -> &RecurrentCell {
        &self.cell
    }

    pub fn output(&self) -> &DenseLayer {
        &self.output
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    pub fn num_languages(&self) -> usize {
        self.config.languages.len()
    }

    /// Name of the language scored in column `index`.
    pub fn language_name(&self, index: usize) -> Option<&str> {
        self.config.languages.get(index).map(String::as_str)
    }

    /// Scores of shape `batch × num_languages`.
    ///
    /// # Errors
    ///
    /// `NnError::EmptySequence` for `xs = []`; `NnError::ShapeMismatch` if
    /// a step is not `batch × num_chars` with the same batch size throughout.
    pub fn run(&self, xs: &[Tensor]) -> Result<Tensor> {
        let mut graph = Graph::new();
        let (_, scores) = self.forward(&mut graph, xs)?;
        Ok(graph.value(scores)?.clone())
    }

    /// Softmax cross-entropy of a batch against one-hot language labels.
    pub fn get_loss(&self, xs: &[Tensor], y: &Tensor) -> Result<f32> {
        let mut graph = Graph::new();
        let (_, loss) = self.record_loss(&mut graph, xs, y)?;
        graph.as_scalar(loss)
    }

    /// Trains until `max_epochs` passes are done or validation accuracy
    /// reaches `target_accuracy`; the epoch cap is checked first.
    pub fn train<D>(&mut self, dataset: &D) -> Result<TrainingReport>
    where
        D: Dataset<Input = Vec<Tensor>>,
    {
        ensure_not_empty(dataset.len())?;
        check_widths(dataset, self.config.num_chars, self.config.languages.len())?;
        begin_training(&mut self.state)?;

        let mut epochs = 0;
        let mut accuracy = None;
        loop {
            if epochs >= self.config.max_epochs {
                warn!(epochs, ?accuracy, "language id stopped at the epoch limit");
                self.state = TrainingState::Converged;
                return Ok(TrainingReport {
                    epochs,
                    stop_reason: StopReason::EpochLimit,
                    metric: accuracy,
                });
            }
            if let Some(accuracy) = accuracy.filter(|&a| a >= self.config.target_accuracy) {
                self.state = TrainingState::Converged;
                return Ok(TrainingReport {
                    epochs,
                    stop_reason: StopReason::Converged,
                    metric: Some(accuracy),
                });
            }

            for (xs, y) in dataset.iterate_once(self.config.batch_size) {
                self.train_step(&xs, &y)?;
            }
            epochs += 1;

            let measured = dataset.validation_accuracy(&*self)?;
            info!(epoch = epochs, accuracy = measured, "language id epoch");
            accuracy = Some(measured);
        }
    }

    fn train_step(&mut self, xs: &[Tensor], y: &Tensor) -> Result<f32> {
        let mut graph = Graph::new();
        let (bound, loss) = self.record_loss(&mut graph, xs, y)?;
        let value = graph.as_scalar(loss)?;

        let cell_nodes = bound.cell.nodes();
        let nodes: Vec<NodeId> = cell_nodes.iter().copied().chain(bound.output.nodes()).collect();
        let mut gradients = graph.gradients(loss, &nodes)?;
        let output_gradients = gradients.split_off(cell_nodes.len());

        self.cell.update_parameters(&gradients, &mut self.optimizer)?;
        self.output.update_parameters(&output_gradients, &mut self.optimizer)?;
        debug!(batch = y.rows(), length = xs.len(), loss = value, "train step");
        Ok(value)
    }

    fn forward(&self, graph: &mut Graph, xs: &[Tensor]) -> Result<(Bound, NodeId)> {
        let bound = Bound {
            cell: self.cell.bind(graph),
            output: self.output.bind(graph),
        };
        let steps: Vec<NodeId> = xs.iter().map(|x| graph.constant(x.clone())).collect();
        let hidden = bound.cell.run(graph, &steps)?;
        let scores = bound.output.forward(graph, hidden)?;
        Ok((bound, scores))
    }

    fn record_loss(&self, graph: &mut Graph, xs: &[Tensor], y: &Tensor) -> Result<(Bound, NodeId)> {
        let (bound, scores) = self.forward(graph, xs)?;
        let labels = graph.constant(y.clone());
        let loss = graph.softmax_loss(scores, labels)?;
        Ok((bound, loss))
    }
}

struct Bound {
    cell: RecurrentNodes,
    output: DenseNodes,
}

impl Model for LanguageIdModel {
    type Input = Vec<Tensor>;

    fn run(&self, input: &Vec<Tensor>) -> Result<Tensor> {
        LanguageIdModel::run(self, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NnError;

    fn small_config() -> LanguageIdConfig {
        LanguageIdConfig {
            num_chars: 3,
            hidden_size: 6,
            languages: vec!["x".into(), "y".into()],
            ..LanguageIdConfig::default()
        }
    }

    #[test]
    fn test_run_shape_for_several_lengths() {
        let model = LanguageIdModel::new(small_config(), &mut SimpleRng::new(1)).unwrap();
        for length in 1..4 {
            let xs = vec![Tensor::one_hot(&[0, 1, 2, 0], 3).unwrap(); length];
            assert_eq!(model.run(&xs).unwrap().shape(), (4, 2));
        }
    }

    #[test]
    fn test_run_rejects_empty_sequence() {
        let model = LanguageIdModel::new(small_config(), &mut SimpleRng::new(1)).unwrap();
        assert!(matches!(model.run(&[]), Err(NnError::EmptySequence)));
    }

    #[test]
    fn test_language_name() {
        let model = LanguageIdModel::new(LanguageIdConfig::default(), &mut SimpleRng::new(1)).unwrap();
        assert_eq!(model.language_name(0), Some("English"));
        assert_eq!(model.language_name(4), Some("Polish"));
        assert_eq!(model.language_name(5), None);
    }
}
