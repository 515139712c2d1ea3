//! A small feedforward neural network library.
//!
//! Models are built from fully connected [`Layer`](arch::layers::Layer)s and trained with
//! stochastic gradient descent against a loss function owned by the optimizer.

pub mod arch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod linalg;
pub mod metrics;
pub mod optimization;
pub mod weight_gen;

pub use error::{MlErr, Result};
