//! Handwritten digit classifier.

use tracing::{info, warn};

use crate::config::DigitClassificationConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::models::network::{Objective, TwoLayerNetwork};
use crate::models::{
    begin_training, check_widths, ensure_not_empty, Model, StopReason, TrainingReport, TrainingState,
};
use crate::nn::Tensor;
use crate::optimizers::SGD;
use crate::utils::SimpleRng;

/// Maps flattened `28 × 28` images to scores over the ten digits.
///
/// Inputs are `batch × input_size` (784 by default); outputs are
/// `batch × num_classes` unnormalized scores, where a higher score means
/// the model considers that class more likely.
#[derive(Debug, Clone)]
pub struct DigitClassificationModel {
    network: TwoLayerNetwork,
    optimizer: SGD,
    config: DigitClassificationConfig,
    state: TrainingState,
}

impl DigitClassificationModel {
    /// # Errors
    ///
    /// `NnError::Config` if `config` fails validation.
    pub fn new(config: DigitClassificationConfig, rng: &mut SimpleRng) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            network: TwoLayerNetwork::new(config.input_size, config.hidden_size, config.num_classes, rng),
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

    pub fn run(&self, x: &Tensor) -> Result<Tensor> {
        self.network.run(x)
    }

    /// Softmax cross-entropy of the batch against one-hot labels.
    pub fn get_loss(&self, x: &Tensor, y: &Tensor) -> Result<f32> {
        self.network.loss(x, y, Objective::SoftmaxCrossEntropy)
    }

    /// Trains until validation accuracy reaches `target_accuracy`, measured
    /// after every pass.
    ///
    /// # Errors
    ///
    /// `NnError::NoValidationData` if `dataset` has no validation split.
    pub fn train<D>(&mut self, dataset: &D) -> Result<TrainingReport>
    where
        D: Dataset<Input = Tensor>,
    {
        ensure_not_empty(dataset.len())?;
        check_widths(dataset, self.config.input_size, self.config.num_classes)?;
        begin_training(&mut self.state)?;

        let mut epochs = 0;
        loop {
            let mut loss_sum = 0.0;
            let mut batches = 0;
            for (x, y) in dataset.iterate_once(self.config.batch_size) {
                loss_sum +=
                    self.network
                        .train_step(&x, &y, Objective::SoftmaxCrossEntropy, &mut self.optimizer)?;
                batches += 1;
            }
            epochs += 1;

            let accuracy = dataset.validation_accuracy(&*self)?;
            info!(
                epoch = epochs,
                loss = loss_sum / batches.max(1) as f32,
                accuracy,
                "digit classification epoch"
            );

            if accuracy >= self.config.target_accuracy {
                self.state = TrainingState::Converged;
                return Ok(TrainingReport {
                    epochs,
                    stop_reason: StopReason::Converged,
                    metric: Some(accuracy),
                });
            }
            if epochs >= self.config.max_epochs {
                warn!(epochs, accuracy, "digit classification stopped at the epoch limit");
                self.state = TrainingState::Converged;
                return Ok(TrainingReport {
                    epochs,
                    stop_reason: StopReason::EpochLimit,
                    metric: Some(accuracy),
                });
            }
        }
    }
}

impl Model for DigitClassificationModel {
    type Input = Tensor;

    fn run(&self, input: &Tensor) -> Result<Tensor> {
        DigitClassificationModel::run(self, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;
    use crate::error::NnError;

    fn tiny_config() -> DigitClassificationConfig {
        DigitClassificationConfig {
            input_size: 4,
            hidden_size: 8,
            num_classes: 2,
            learning_rate: 0.5,
            batch_size: 4,
            target_accuracy: 1.0,
            max_epochs: 200,
        }
    }

    // Class 0 lights the first two pixels, class 1 the last two.
    fn two_patterns() -> InMemoryDataset {
        let rows = vec![
            vec![1.0, 1.0, 0.0, 0.0],
            vec![0.9, 0.8, 0.1, 0.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.1, 0.0, 0.9, 0.8],
        ];
        let x = Tensor::from_rows(&rows).unwrap();
        let y = Tensor::one_hot(&[0, 0, 1, 1], 2).unwrap();
        InMemoryDataset::new(x.clone(), y.clone())
            .unwrap()
            .with_validation(x, y)
            .unwrap()
    }

    #[test]
    fn test_run_shape() {
        let model = DigitClassificationModel::new(DigitClassificationConfig::default(), &mut SimpleRng::new(1)).unwrap();
        assert_eq!(model.run(&Tensor::zeros(3, 784)).unwrap().shape(), (3, 10));
    }

    #[test]
    fn test_train_reaches_target_accuracy() {
        let data = two_patterns();
        let mut model = DigitClassificationModel::new(tiny_config(), &mut SimpleRng::new(6)).unwrap();
        let report = model.train(&data).unwrap();

        assert_eq!(report.stop_reason, StopReason::Converged);
        assert!(data.validation_accuracy(&model).unwrap() >= 1.0);
    }

    #[test]
    fn test_train_requires_validation_split() {
        let data = InMemoryDataset::new(Tensor::zeros(2, 4), Tensor::one_hot(&[0, 1], 2).unwrap()).unwrap();
        let mut model = DigitClassificationModel::new(tiny_config(), &mut SimpleRng::new(6)).unwrap();

        assert!(matches!(model.train(&data), Err(NnError::NoValidationData)));
        assert_eq!(model.state(), TrainingState::Training);
    }
}
