//! Tensor engine
//!
//! The minimal tensor and reverse-mode autodiff machinery the models are
//! assembled from: `Tensor` values, owned `Parameter` buffers and the
//! per-step `Graph` that records operations and computes gradients.

pub mod graph;
pub mod parameter;
pub mod tensor;

pub use graph::{Graph, NodeId};
pub use parameter::Parameter;
pub use tensor::Tensor;
