//! Shared utilities
//!
//! Seeded random number generation and the activation kernels used by the
//! graph operations.

pub mod activations;
pub mod rng;

pub use activations::{log_softmax_rows, relu_backward_inplace, relu_inplace, softmax_rows};
pub use rng::SimpleRng;
