use ndarray::{Array1, Array2};

use crate::Result;

/// Generates the initial parameters of a weighted layer.
///
/// `dim` is always `(input_dim, output_dim)` of the layer being initialized.
pub trait WeightGen {
    /// Returns a new weight matrix of shape `dim`.
    fn weights(&mut self, dim: (usize, usize)) -> Result<Array2<f32>>;

    /// Returns a new bias vector of length `dim.1`.
    fn bias(&mut self, dim: (usize, usize)) -> Result<Array1<f32>>;
}
