//! Tabular in-memory dataset.

use std::cell::RefCell;

use crate::dataset::{argmax_accuracy, Batches, Dataset};
use crate::error::{NnError, Result};
use crate::models::Model;
use crate::nn::Tensor;
use crate::utils::SimpleRng;

/// Row-aligned input and label tensors, with an optional validation split.
///
/// Passes visit rows in storage order unless `reshuffle_each_pass` is set,
/// in which case every call to `iterate_once` draws a fresh permutation.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    x: Tensor,
    y: Tensor,
    validation: Option<(Tensor, Tensor)>,
    pass_rng: Option<RefCell<SimpleRng>>,
}

impl InMemoryDataset {
    /// # Errors
    ///
    /// `NnError::ShapeMismatch` if `x` and `y` have different row counts.
    pub fn new(x: Tensor, y: Tensor) -> Result<Self> {
        check_rows("dataset", &x, &y)?;
        Ok(Self {
            x,
            y,
            validation: None,
            pass_rng: None,
        })
    }

    /// Visits the training rows in a new random order on every pass.
    pub fn reshuffle_each_pass(mut self, rng: SimpleRng) -> Self {
        self.pass_rng = Some(RefCell::new(rng));
        self
    }

    /// Attaches a validation split of the same widths as the training data.
    pub fn with_validation(mut self, x: Tensor, y: Tensor) -> Result<Self> {
        check_rows("validation", &x, &y)?;
        if x.cols() != self.x.cols() || y.cols() != self.y.cols() {
            return Err(NnError::ShapeMismatch {
                op: "validation",
                left: (self.x.cols(), self.y.cols()),
                right: (x.cols(), y.cols()),
            });
        }
        self.validation = Some((x, y));
        Ok(self)
    }

    /// Moves the last `count` training rows into the validation split.
    pub fn split_validation(self, count: usize) -> Result<Self> {
        if count > self.x.rows() {
            return Err(NnError::Dataset(format!(
                "cannot hold out {count} of {} examples",
                self.x.rows()
            )));
        }
        let cut = self.x.rows() - count;
        let train_x = self.x.slice_rows(0, cut);
        let train_y = self.y.slice_rows(0, cut);
        let val_x = self.x.slice_rows(cut, self.x.rows());
        let val_y = self.y.slice_rows(cut, self.y.rows());
        let mut split = Self::new(train_x, train_y)?.with_validation(val_x, val_y)?;
        split.pass_rng = self.pass_rng;
        Ok(split)
    }

    /// Permutes the training rows.
    pub fn shuffle(&mut self, rng: &mut SimpleRng) {
        let mut order: Vec<usize> = (0..self.x.rows()).collect();
        rng.shuffle(&mut order);
        self.x = self.x.select_rows(&order);
        self.y = self.y.select_rows(&order);
    }

    pub fn x(&self) -> &Tensor {
        &self.x
    }

    pub fn y(&self) -> &Tensor {
        &self.y
    }

    pub fn validation(&self) -> Option<(&Tensor, &Tensor)> {
        self.validation.as_ref().map(|(x, y)| (x, y))
    }
}

impl Dataset for InMemoryDataset {
    type Input = Tensor;

    fn len(&self) -> usize {
        self.x.rows()
    }

    fn input_width(&self) -> usize {
        self.x.cols()
    }

    fn label_width(&self) -> usize {
        self.y.cols()
    }

    fn iterate_once(&self, batch_size: usize) -> Batches<'_, Tensor> {
        let batch_size = batch_size.max(1);
        let len = self.len();

        if let Some(rng) = &self.pass_rng {
            let mut order: Vec<usize> = (0..len).collect();
            rng.borrow_mut().shuffle(&mut order);
            return Box::new((0..len).step_by(batch_size).map(move |start| {
                let rows = &order[start..(start + batch_size).min(len)];
                (self.x.select_rows(rows), self.y.select_rows(rows))
            }));
        }

        Box::new((0..len).step_by(batch_size).map(move |start| {
            let end = start + batch_size;
            (self.x.slice_rows(start, end), self.y.slice_rows(start, end))
        }))
    }

    fn validation_accuracy<M>(&self, model: &M) -> Result<f32>
    where
        M: Model<Input = Tensor>,
    {
        let (x, y) = self.validation.as_ref().ok_or(NnError::NoValidationData)?;
        if x.rows() == 0 {
            return Err(NnError::NoValidationData);
        }
        let scores = model.run(x)?;
        let (correct, total) = argmax_accuracy(&scores, y);
        Ok(correct as f32 / total as f32)
    }
}

fn check_rows(op: &'static str, x: &Tensor, y: &Tensor) -> Result<()> {
    if x.rows() != y.rows() {
        return Err(NnError::ShapeMismatch {
            op,
            left: x.shape(),
            right: y.shape(),
        });
    }
    Ok(())
}
