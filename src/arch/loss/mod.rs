mod binary_cross_entropy;
mod categorical_cross_entropy;
mod loss;
mod loss_fn;
mod mse;

pub use binary_cross_entropy::BinaryCrossEntropy;
pub use categorical_cross_entropy::CategoricalCrossEntropy;
pub use loss::Loss;
pub use loss_fn::LossFn;
pub use mse::Mse;

use ndarray::ArrayView1;

use crate::{MlErr, Result};

/// Clamping bound applied to predictions before taking their logarithm.
///
/// `1 - EPSILON` must still be distinguishable from `1` in `f32`.
pub(crate) const EPSILON: f32 = 1e-7;

fn check_lengths(y_true: ArrayView1<f32>, y_pred: ArrayView1<f32>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(MlErr::SizeMismatch {
            what: "y_pred",
            got: y_pred.len(),
            expected: y_true.len(),
        });
    }

    Ok(())
}
