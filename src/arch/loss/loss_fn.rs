use ndarray::{Array1, ArrayView1};

use crate::Result;

/// A loss function evaluated over a single sample.
///
/// Implementors must fail with `MlErr::SizeMismatch` whenever `y_true` and `y_pred` have
/// different lengths.
pub trait LossFn {
    /// Computes the loss of predicting `y_pred` when `y_true` was expected.
    fn loss(&self, y_true: ArrayView1<f32>, y_pred: ArrayView1<f32>) -> Result<f32>;

    /// Computes the gradient of the loss with respect to `y_pred`, one element per output.
    fn loss_prime(
        &self,
        y_true: ArrayView1<f32>,
        y_pred: ArrayView1<f32>,
    ) -> Result<Array1<f32>>;

    /// Computes both the loss and its gradient.
    fn call(
        &self,
        y_true: ArrayView1<f32>,
        y_pred: ArrayView1<f32>,
    ) -> Result<(f32, Array1<f32>)> {
        Ok((self.loss(y_true, y_pred)?, self.loss_prime(y_true, y_pred)?))
    }
}
