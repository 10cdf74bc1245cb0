//! Scalar regression with a two-layer ReLU network.

use tracing::{info, warn};

use crate::config::RegressionConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::models::network::{Objective, TwoLayerNetwork};
use crate::models::{
    begin_training, check_widths, ensure_not_empty, Model, StopReason, TrainingReport, TrainingState,
};
use crate::nn::Tensor;
use crate::optimizers::SGD;
use crate::utils::SimpleRng;

/// Approximates a function `ℝ → ℝ`, e.g. `sin(x)` on `[-2π, 2π]`.
#[derive(Debug, Clone)]
pub struct RegressionModel {
    network: TwoLayerNetwork,
    optimizer: SGD,
    config: RegressionConfig,
    state: TrainingState,
}

impl RegressionModel {
    /// # Errors
    ///
    /// `NnError::Config` if `config` fails validation.
    pub fn new(config: RegressionConfig, rng: &mut SimpleRng) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            network: TwoLayerNetwork::new(1, config.hidden_size, 1, rng),
            optimizer: SGD::new(config.learning_rate),
            config,
            state: TrainingState::Initialized,
        })
    }

    pub fn network(&self) -> &TwoLayerNetwork {
        &self.network
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    /// Predictions for a `batch × 1` input, as `batch × 1`.
    pub fn run(&self, x: &Tensor) -> Result<Tensor> {
        self.network.run(x)
    }

    /// Square loss of the batch.
    pub fn get_loss(&self, x: &Tensor, y: &Tensor) -> Result<f32> {
        self.network.loss(x, y, Objective::Square)
    }

    /// Trains until the loss over the whole dataset drops below
    /// `loss_threshold`, checked after every pass.
    pub fn train<D>(&mut self, dataset: &D) -> Result<TrainingReport>
    where
        D: Dataset<Input = Tensor>,
    {
        ensure_not_empty(dataset.len())?;
        check_widths(dataset, 1, 1)?;
        begin_training(&mut self.state)?;

        let mut epochs = 0;
        loop {
            for (x, y) in dataset.iterate_once(self.config.batch_size) {
                self.network.train_step(&x, &y, Objective::Square, &mut self.optimizer)?;
            }
            epochs += 1;

            let loss = self.full_loss(dataset)?;
            info!(epoch = epochs, loss, "regression epoch");

            if loss < self.config.loss_threshold {
                self.state = TrainingState::Converged;
                return Ok(TrainingReport {
                    epochs,
                    stop_reason: StopReason::Converged,
                    metric: Some(loss),
                });
            }
            if epochs >= self.config.max_epochs {
                warn!(epochs, loss, "regression stopped at the epoch limit");
                self.state = TrainingState::Converged;
                return Ok(TrainingReport {
                    epochs,
                    stop_reason: StopReason::EpochLimit,
                    metric: Some(loss),
                });
            }
        }
    }

    // The whole training set as a single batch.
    fn full_loss<D>(&self, dataset: &D) -> Result<f32>
    where
        D: Dataset<Input = Tensor>,
    {
        let mut total = 0.0;
        let mut rows = 0;
        for (x, y) in dataset.iterate_once(dataset.len()) {
            total += self.get_loss(&x, &y)? * x.rows() as f32;
            rows += x.rows();
        }
        Ok(total / rows.max(1) as f32)
    }
}

impl Model for RegressionModel {
    type Input = Tensor;

    fn run(&self, input: &Tensor) -> Result<Tensor> {
        RegressionModel::run(self, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;
    use crate::error::NnError;

    fn small_config() -> RegressionConfig {
        RegressionConfig {
            hidden_size: 16,
            learning_rate: 0.05,
            batch_size: 8,
            loss_threshold: 0.02,
            max_epochs: 2000,
        }
    }

    fn line() -> InMemoryDataset {
        let xs: Vec<f32> = (0..16).map(|i| -1.0 + i as f32 * 2.0 / 15.0).collect();
        let ys: Vec<f32> = xs.iter().map(|x| 0.5 * x).collect();
        InMemoryDataset::new(Tensor::new(16, 1, xs).unwrap(), Tensor::new(16, 1, ys).unwrap()).unwrap()
    }

    #[test]
    fn test_run_shape() {
        let model = RegressionModel::new(small_config(), &mut SimpleRng::new(1)).unwrap();
        assert_eq!(model.run(&Tensor::zeros(7, 1)).unwrap().shape(), (7, 1));
    }

    #[test]
    fn test_train_reaches_threshold() {
        let data = line();
        let mut model = RegressionModel::new(small_config(), &mut SimpleRng::new(4)).unwrap();
        let report = model.train(&data).unwrap();

        assert_eq!(report.stop_reason, StopReason::Converged);
        assert!(model.get_loss(data.x(), data.y()).unwrap() < 0.02);
        assert_eq!(model.state(), TrainingState::Converged);
    }

    #[test]
    fn test_train_twice_is_rejected() {
        let data = line();
        let mut model = RegressionModel::new(small_config(), &mut SimpleRng::new(4)).unwrap();
        model.train(&data).unwrap();
        assert!(matches!(model.train(&data), Err(NnError::AlreadyConverged)));
    }
}
