use ndarray::{Array1, ArrayView1};

use super::{LossFn, check_lengths};
use crate::Result;

/// Mean squared error loss function.
#[derive(Default, Clone, Copy, Debug)]
pub struct Mse;

impl Mse {
    /// Returns a new `Mse`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    fn loss(&self, y_true: ArrayView1<f32>, y_pred: ArrayView1<f32>) -> Result<f32> {
        check_lengths(y_true, y_pred)?;

        let loss = (&y_pred - &y_true)
            .mapv(|x| x.powi(2))
            .mean()
            .unwrap_or_default();

        Ok(loss)
    }

    fn loss_prime(
        &self,
        y_true: ArrayView1<f32>,
        y_pred: ArrayView1<f32>,
    ) -> Result<Array1<f32>> {
        check_lengths(y_true, y_pred)?;
        Ok((&y_pred - &y_true) * (2.0 / y_pred.len() as f32))
    }
}
