use ndarray::{Array1, ArrayView1, Zip};

use super::{EPSILON, LossFn, check_lengths};
use crate::Result;

/// Binary cross-entropy, averaged over the outputs of a sample.
///
/// Predictions are clamped into `[ε, 1 - ε]` for both the loss and its gradient.
#[derive(Default, Clone, Copy, Debug)]
pub struct BinaryCrossEntropy;

impl BinaryCrossEntropy {
    /// Returns a new `BinaryCrossEntropy`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for BinaryCrossEntropy {
    fn loss(&self, y_true: ArrayView1<f32>, y_pred: ArrayView1<f32>) -> Result<f32> {
        check_lengths(y_true, y_pred)?;

        let total = Zip::from(&y_true).and(&y_pred).fold(0., |acc, &y, &p| {
            let p = p.clamp(EPSILON, 1. - EPSILON);
            acc - y * p.ln() - (1. - y) * (1. - p).ln()
        });

        Ok(total / y_true.len() as f32)
    }

    fn loss_prime(
        &self,
        y_true: ArrayView1<f32>,
        y_pred: ArrayView1<f32>,
    ) -> Result<Array1<f32>> {
        check_lengths(y_true, y_pred)?;

        let grad = Zip::from(&y_true).and(&y_pred).map_collect(|&y, &p| {
            let p = p.clamp(EPSILON, 1. - EPSILON);
            -(y / p) + (1. - y) / (1. - p)
        });

        Ok(grad)
    }
}
