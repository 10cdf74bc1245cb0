//! The four estimators and the pieces they share
//!
//! Every model follows the same lifecycle: constructed from a config and a
//! seeded RNG (`Initialized`), trained once (`Training`), and finished
//! (`Converged`) when its stop predicate or its safety bound is reached.

pub mod digit_classification;
pub mod language_id;
pub mod network;
pub mod perceptron;
pub mod regression;

pub use digit_classification::DigitClassificationModel;
pub use language_id::LanguageIdModel;
pub use perceptron::PerceptronModel;
pub use regression::RegressionModel;

use crate::dataset::Dataset;
use crate::error::{NnError, Result};
use crate::nn::Tensor;

/// Anything that maps a batch of inputs to a batch of predictions.
///
/// Datasets use it to score a model on their validation split.
pub trait Model {
    type Input;

    /// Predictions whose leading dimension is the batch size of `input`.
    fn run(&self, input: &Self::Input) -> Result<Tensor>;
}

/// Lifecycle of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingState {
    Initialized,
    Training,
    Converged,
}

/// Why `train` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The model's own criterion holds (zero mistakes, loss below the
    /// threshold or validation accuracy at the target).
    Converged,
    /// The configured pass / epoch limit was reached first.
    EpochLimit,
}

/// Summary of a finished training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Full passes over the dataset.
    pub epochs: usize,
    pub stop_reason: StopReason,
    /// Last value the stop predicate looked at: mistakes in the final pass
    /// (perceptron), loss over the whole dataset (regression) or validation
    /// accuracy (classifiers). `None` if it was never measured.
    pub metric: Option<f32>,
}

/// Moves a model into `Training`, refusing models that already finished.
pub(crate) fn begin_training(state: &mut TrainingState) -> Result<()> {
    if *state == TrainingState::Converged {
        return Err(NnError::AlreadyConverged);
    }
    *state = TrainingState::Training;
    Ok(())
}

pub(crate) fn ensure_not_empty(len: usize) -> Result<()> {
    if len == 0 {
        return Err(NnError::Dataset("cannot train on an empty dataset".into()));
    }
    Ok(())
}

/// Refuses datasets whose input or label columns differ from what the model
/// was built for.
pub(crate) fn check_widths<D: Dataset>(dataset: &D, inputs: usize, labels: usize) -> Result<()> {
    if dataset.input_width() != inputs || dataset.label_width() != labels {
        return Err(NnError::Config(format!(
            "model expects {inputs} input and {labels} label columns, dataset has {} and {}",
            dataset.input_width(),
            dataset.label_width()
        )));
    }
    Ok(())
}
