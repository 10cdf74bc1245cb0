//! Datasets the models train on
//!
//! A dataset hands out its training data as a lazy sequence of
//! `(input batch, label batch)` pairs covering every example exactly once per
//! call, and can score a model against its validation split.
//!
//! - `InMemoryDataset`: tabular `x` / `y` tensors (perceptron, regression, digits)
//! - `SequenceDataset`: one-hot character sequences bucketed by length (language id)
//! - `synthetic`: seeded generators for separable points and a sine wave
//! - `mnist`: IDX file reader producing an `InMemoryDataset`

pub mod memory;
pub mod mnist;
pub mod sequence;
pub mod synthetic;

pub use memory::InMemoryDataset;
pub use sequence::{Alphabet, SequenceDataset};

use crate::error::Result;
use crate::models::Model;
use crate::nn::Tensor;

/// One input batch with its label batch.
pub type Batch<I> = (I, Tensor);

/// Lazy sequence of batches borrowed from a dataset.
pub type Batches<'a, I> = Box<dyn Iterator<Item = Batch<I>> + 'a>;

pub trait Dataset {
    /// What a model receives per batch: a tensor, or one tensor per sequence
    /// position.
    type Input;

    /// Number of training examples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Columns of one input row (one sequence step for sequence data).
    fn input_width(&self) -> usize;

    /// Columns of one label row.
    fn label_width(&self) -> usize;

    /// One pass over the training data in batches of at most `batch_size`
    /// examples. Every call starts a fresh pass.
    fn iterate_once(&self, batch_size: usize) -> Batches<'_, Self::Input>;

    /// Fraction of validation examples whose highest score matches the label.
    ///
    /// # Errors
    ///
    /// `NnError::NoValidationData` when the dataset has no validation split;
    /// any error raised by `model.run`.
    fn validation_accuracy<M>(&self, model: &M) -> Result<f32>
    where
        M: Model<Input = Self::Input>;
}

/// `(correct, total)` where correct rows have the score argmax on the label argmax.
pub(crate) fn argmax_accuracy(scores: &Tensor, labels: &Tensor) -> (usize, usize) {
    let correct = scores
        .argmax_rows()
        .into_iter()
        .zip(labels.argmax_rows())
        .filter(|(predicted, expected)| predicted == expected)
        .count();
    (correct, labels.rows())
}
