//! Binary perceptron.

use tracing::{debug, info, warn};

use crate::config::PerceptronConfig;
use crate::dataset::Dataset;
use crate::error::{NnError, Result};
use crate::models::{
    begin_training, check_widths, ensure_not_empty, Model, StopReason, TrainingReport, TrainingState,
};
use crate::nn::{Graph, Parameter, Tensor};
use crate::utils::SimpleRng;

/// Linear classifier over `d`-dimensional points with labels `+1` / `-1`.
///
/// The decision boundary passes through the origin: there is no bias term.
#[derive(Debug, Clone)]
pub struct PerceptronModel {
    weights: Parameter,
    config: PerceptronConfig,
    state: TrainingState,
}

impl PerceptronModel {
    /// A `1 × dimensions` weight vector with Xavier initialization.
    ///
    /// # Errors
    ///
    /// `NnError::Config` for zero dimensions or an invalid `config`.
    pub fn new(dimensions: usize, config: PerceptronConfig, rng: &mut SimpleRng) -> Result<Self> {
        if dimensions == 0 {
            return Err(NnError::Config("perceptron needs at least one dimension".into()));
        }
        config.validate()?;
        Ok(Self {
            weights: Parameter::xavier(1, dimensions, rng),
            config,
            state: TrainingState::Initialized,
        })
    }

    pub fn get_weights(&self) -> &Parameter {
        &self.weights
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    /// Score `x · w` of every row of `x`, as a `batch × 1` tensor.
    pub fn run(&self, x: &Tensor) -> Result<Tensor> {
        let mut graph = Graph::new();
        let features = graph.constant(x.clone());
        let weights = graph.parameter(&self.weights);
        let score = graph.dot_product(features, weights)?;
        Ok(graph.value(score)?.clone())
    }

    /// `1` if the score of the single point `x` is non-negative, else `-1`.
    pub fn get_prediction(&self, x: &Tensor) -> Result<i32> {
        let score = self.run(x)?.as_scalar()?;
        Ok(if score >= 0.0 { 1 } else { -1 })
    }

    /// Repeats passes with batch size 1, adding `label × x` to the weights on
    /// every mistake, until a pass makes none or `max_passes` is reached.
    pub fn train<D>(&mut self, dataset: &D) -> Result<TrainingReport>
    where
        D: Dataset<Input = Tensor>,
    {
        ensure_not_empty(dataset.len())?;
        check_widths(dataset, self.weights.len(), 1)?;
        begin_training(&mut self.state)?;

        let mut passes = 0;
        loop {
            let mut mistakes = 0usize;
            for (x, y) in dataset.iterate_once(1) {
                let label = y.as_scalar()?;
                if self.get_prediction(&x)? as f32 != label {
                    self.weights.apply_gradient(&x, label)?;
                    mistakes += 1;
                }
            }
            passes += 1;
            info!(pass = passes, mistakes, "perceptron pass");

            if mistakes == 0 {
                self.state = TrainingState::Converged;
                return Ok(TrainingReport {
                    epochs: passes,
                    stop_reason: StopReason::Converged,
                    metric: Some(0.0),
                });
            }
            if passes >= self.config.max_passes {
                warn!(passes, mistakes, "perceptron stopped at the pass limit");
                self.state = TrainingState::Converged;
                return Ok(TrainingReport {
                    epochs: passes,
                    stop_reason: StopReason::EpochLimit,
                    metric: Some(mistakes as f32),
                });
            }
            debug!(weights = ?self.weights.value().data(), "perceptron weights");
        }
    }
}

impl Model for PerceptronModel {
    type Input = Tensor;

    fn run(&self, input: &Tensor) -> Result<Tensor> {
        PerceptronModel::run(self, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;
    use crate::error::NnError;

    fn model(weights: &[f32]) -> PerceptronModel {
        let mut model =
            PerceptronModel::new(weights.len(), PerceptronConfig::default(), &mut SimpleRng::new(1)).unwrap();
        model.weights = Parameter::from_tensor(Tensor::row_vector(weights));
        model
    }

    #[test]
    fn test_prediction_at_zero_score_is_positive() {
        let model = model(&[1.0, -1.0]);
        assert_eq!(model.get_prediction(&Tensor::row_vector(&[2.0, 2.0])).unwrap(), 1);
        assert_eq!(model.get_prediction(&Tensor::row_vector(&[0.0, 1.0])).unwrap(), -1);
    }

    #[test]
    fn test_run_batch() {
        let model = model(&[1.0, 2.0]);
        let x = Tensor::new(3, 2, vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(model.run(&x).unwrap().data(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_train_empty_dataset() {
        let mut model = model(&[1.0]);
        let empty = InMemoryDataset::new(Tensor::zeros(0, 1), Tensor::zeros(0, 1)).unwrap();
        assert!(matches!(model.train(&empty), Err(NnError::Dataset(_))));
        assert_eq!(model.state(), TrainingState::Initialized);
    }

    #[test]
    fn test_pass_limit() {
        // Opposite labels on the same point can never be separated.
        let x = Tensor::new(2, 1, vec![1.0, 1.0]).unwrap();
        let y = Tensor::new(2, 1, vec![1.0, -1.0]).unwrap();
        let data = InMemoryDataset::new(x, y).unwrap();

        let mut model =
            PerceptronModel::new(1, PerceptronConfig { max_passes: 5 }, &mut SimpleRng::new(2)).unwrap();
        let report = model.train(&data).unwrap();
        assert_eq!(report.epochs, 5);
        assert_eq!(report.stop_reason, StopReason::EpochLimit);
    }
}
