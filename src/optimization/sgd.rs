use ndarray::{Array, ArrayView, Dimension};

use super::Optimizer;
use crate::{
    MlErr, Result,
    arch::loss::{Loss, LossFn},
};

/// Stochastic gradient descent optimization algorithm.
#[derive(Clone, Debug)]
pub struct Sgd<L: LossFn = Loss> {
    learning_rate: f32,
    loss_fn: L,
}

impl Sgd {
    /// Returns a new `Sgd` with a loss function resolved by name.
    ///
    /// # Arguments
    /// * `learning_rate` - The *length* of the steps taken on `apply_gradient`.
    /// * `loss_name` - The name of the loss function, see [`Loss::from_name`].
    ///
    /// # Returns
    /// `MlErr::InvalidConfig` if the learning rate isn't positive or the loss is unknown.
    pub fn new(learning_rate: f32, loss_name: &str) -> Result<Self> {
        Self::with_loss(learning_rate, Loss::from_name(loss_name)?)
    }
}

impl<L: LossFn> Sgd<L> {
    /// Returns a new `Sgd` that minimizes `loss_fn`.
    ///
    /// # Arguments
    /// * `learning_rate` - The *length* of the steps taken on `apply_gradient`.
    /// * `loss_fn` - The loss function.
    pub fn with_loss(learning_rate: f32, loss_fn: L) -> Result<Self> {
        if !(learning_rate.is_finite() && learning_rate > 0.) {
            return Err(MlErr::InvalidConfig(format!(
                "learning rate must be positive, got {learning_rate}"
            )));
        }

        Ok(Self {
            learning_rate,
            loss_fn,
        })
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}

impl<L: LossFn> Optimizer for Sgd<L> {
    type Loss = L;

    fn loss_fn(&self) -> &L {
        &self.loss_fn
    }

    /// Makes a step in the opposite direction of the gradient, with a length of
    /// `learning_rate`: `current - learning_rate * grad`.
    fn apply_gradient<D: Dimension>(
        &self,
        current: ArrayView<f32, D>,
        grad: ArrayView<f32, D>,
    ) -> Result<Array<f32, D>> {
        if current.shape() != grad.shape() {
            return Err(MlErr::SizeMismatch {
                what: "gradient",
                got: grad.len(),
                expected: current.len(),
            });
        }

        let mut updated = current.to_owned();
        updated.scaled_add(-self.learning_rate, &grad);
        Ok(updated)
    }
}
