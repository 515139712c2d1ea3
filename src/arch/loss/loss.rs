use std::str::FromStr;

use ndarray::{Array1, ArrayView1};

use super::{BinaryCrossEntropy, CategoricalCrossEntropy, LossFn, Mse};
use crate::{MlErr, Result};

/// Any of the available loss functions, resolvable by name.
///
/// Loss functions hold no state, so clones are fully independent.
#[derive(Clone, Copy, Debug)]
pub enum Loss {
    BinaryCrossEntropy(BinaryCrossEntropy),
    CategoricalCrossEntropy(CategoricalCrossEntropy),
    Mse(Mse),
}

impl Loss {
    /// Resolves a loss function by name.
    ///
    /// Case is ignored and `-` or spaces are treated as `_`, so `Binary-CrossEntropy` is
    /// the same as `binary_crossentropy`.
    ///
    /// # Arguments
    /// * `name` - One of `binary_crossentropy` (`binary_cross_entropy`, `bce`),
    ///   `categorical_crossentropy` (`categorical_cross_entropy`, `cce`) or `mse`
    ///   (`mean_squared_error`).
    ///
    /// # Returns
    /// The loss function or `MlErr::InvalidConfig` if the name is unknown.
    pub fn from_name(name: &str) -> Result<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        let loss = match normalized.as_str() {
            "binary_crossentropy" | "binary_cross_entropy" | "bce" => {
                Self::BinaryCrossEntropy(BinaryCrossEntropy::new())
            }
            "categorical_crossentropy" | "categorical_cross_entropy" | "cce" => {
                Self::CategoricalCrossEntropy(CategoricalCrossEntropy::new())
            }
            "mse" | "mean_squared_error" => Self::Mse(Mse::new()),
            _ => {
                return Err(MlErr::InvalidConfig(format!(
                    "unknown loss function name: {name}"
                )));
            }
        };

        Ok(loss)
    }
}

impl FromStr for Loss {
    type Err = MlErr;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl LossFn for Loss {
    fn loss(&self, y_true: ArrayView1<f32>, y_pred: ArrayView1<f32>) -> Result<f32> {
        match self {
            Self::BinaryCrossEntropy(l) => l.loss(y_true, y_pred),
            Self::CategoricalCrossEntropy(l) => l.loss(y_true, y_pred),
            Self::Mse(l) => l.loss(y_true, y_pred),
        }
    }

    fn loss_prime(
        &self,
        y_true: ArrayView1<f32>,
        y_pred: ArrayView1<f32>,
    ) -> Result<Array1<f32>> {
        match self {
            Self::BinaryCrossEntropy(l) => l.loss_prime(y_true, y_pred),
            Self::CategoricalCrossEntropy(l) => l.loss_prime(y_true, y_pred),
            Self::Mse(l) => l.loss_prime(y_true, y_pred),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr1;

    use super::*;

    #[test]
    fn test_from_name_aliases() {
        for name in [
            "binary_crossentropy",
            "Binary-CrossEntropy",
            "binary cross entropy",
            "BCE",
        ] {
            assert!(
                matches!(Loss::from_name(name), Ok(Loss::BinaryCrossEntropy(_))),
                "{name}"
            );
        }

        assert!(matches!(
            "categorical_crossentropy".parse::<Loss>(),
            Ok(Loss::CategoricalCrossEntropy(_))
        ));
        assert!(matches!(Loss::from_name("mse"), Ok(Loss::Mse(_))));
    }

    #[test]
    fn test_from_name_unknown() {
        assert!(matches!(
            Loss::from_name("hinge"),
            Err(MlErr::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_clones_are_independent() {
        let original = Loss::from_name("binary_crossentropy").unwrap();
        let clone = original;

        let y = arr1(&[1., 0.]);
        let (_, clone_grad) = clone.call(y.view(), arr1(&[0.9, 0.1]).view()).unwrap();
        let (_, original_grad) = original.call(y.view(), arr1(&[0.5, 0.5]).view()).unwrap();
        let (_, clone_grad_again) = clone.call(y.view(), arr1(&[0.9, 0.1]).view()).unwrap();

        assert_ne!(clone_grad, original_grad);
        assert_eq!(clone_grad, clone_grad_again);
    }
}
