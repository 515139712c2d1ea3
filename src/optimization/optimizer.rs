use ndarray::{Array, ArrayView, Dimension};

use crate::{Result, arch::loss::LossFn};

/// An optimization algorithm: maps a parameter tensor and its gradient to the updated
/// parameter tensor.
///
/// An optimizer also owns the loss function the model is trained against.
pub trait Optimizer {
    type Loss: LossFn;

    /// Returns the loss function this optimizer minimizes.
    fn loss_fn(&self) -> &Self::Loss;

    /// Computes the updated value of `current` given its `grad`.
    ///
    /// # Arguments
    /// * `current` - The current parameters, either a bias vector or a weight matrix.
    /// * `grad` - The gradient of the loss with respect to `current`, with the same shape.
    ///
    /// # Returns
    /// The updated parameters or `MlErr::SizeMismatch` if the shapes differ.
    fn apply_gradient<D: Dimension>(
        &self,
        current: ArrayView<f32, D>,
        grad: ArrayView<f32, D>,
    ) -> Result<Array<f32, D>>;
}
