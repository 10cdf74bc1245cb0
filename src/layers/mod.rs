//! Layer abstractions for neural networks
//!
//! This module provides the Layer trait and the two layer types the models
//! are assembled from: a dense layer and an Elman recurrent cell.

mod r#trait;
pub mod dense;
pub mod recurrent;

pub use r#trait::{Layer, ParameterNodes};
pub use dense::{DenseLayer, DenseNodes};
pub use recurrent::{RecurrentCell, RecurrentNodes};
