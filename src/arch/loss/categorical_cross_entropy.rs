use ndarray::{Array1, ArrayView1, Zip};

use super::{EPSILON, LossFn, check_lengths};
use crate::Result;

/// Categorical cross-entropy, averaged over the outputs of a sample.
///
/// **Must be paired with a softmax output layer.** The gradient returned by `loss_prime`
/// is not the derivative of the cross-entropy alone but the combined softmax +
/// cross-entropy gradient `p - y`, which relies on the softmax layer forwarding it
/// untouched (see [`ActFn::Softmax`](crate::arch::activations::ActFn::Softmax)).
#[derive(Default, Clone, Copy, Debug)]
pub struct CategoricalCrossEntropy;

impl CategoricalCrossEntropy {
    /// Returns a new `CategoricalCrossEntropy`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for CategoricalCrossEntropy {
    fn loss(&self, y_true: ArrayView1<f32>, y_pred: ArrayView1<f32>) -> Result<f32> {
        check_lengths(y_true, y_pred)?;

        let total = Zip::from(&y_true).and(&y_pred).fold(0., |acc, &y, &p| {
            acc - y * p.clamp(EPSILON, 1. - EPSILON).ln()
        });

        Ok(total / y_true.len() as f32)
    }

    fn loss_prime(
        &self,
        y_true: ArrayView1<f32>,
        y_pred: ArrayView1<f32>,
    ) -> Result<Array1<f32>> {
        check_lengths(y_true, y_pred)?;
        Ok(&y_pred - &y_true)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::arr1;

    use super::*;

    #[test]
    fn test_loss_of_one_hot() {
        let y = arr1(&[0., 1., 0., 0.]);
        let p = arr1(&[0.1, 0.5, 0.2, 0.2]);

        let (loss, grad) = CategoricalCrossEntropy.call(y.view(), p.view()).unwrap();

        assert_relative_eq!(loss, -(0.5f32.ln()) / 4., epsilon = 1e-6);
        assert_relative_eq!(grad[0], 0.1, epsilon = 1e-6);
        assert_relative_eq!(grad[1], -0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_probability_on_true_class_stays_finite() {
        let y = arr1(&[1., 0.]);
        let p = arr1(&[0., 1.]);

        let loss = CategoricalCrossEntropy.loss(y.view(), p.view()).unwrap();
        assert!(loss.is_finite());
    }

    #[test]
    fn test_mismatched_lengths() {
        let y = arr1(&[1., 0.]);
        let p = arr1(&[1., 0., 0.]);

        assert!(CategoricalCrossEntropy.loss(y.view(), p.view()).is_err());
        assert!(CategoricalCrossEntropy.loss_prime(y.view(), p.view()).is_err());
    }
}
