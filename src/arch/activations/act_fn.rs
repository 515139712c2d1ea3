use std::str::FromStr;

use ndarray::{Array1, ArrayView1};

use super::{Relu, Sigmoid, Softmax};
use crate::MlErr;

/// An activation function applied to the weighted sums of a layer.
#[derive(Clone, Copy, Debug, Default)]
pub enum ActFn {
    #[default]
    Identity,
    Sigmoid(Sigmoid),
    Relu(Relu),
    /// Softmax reports a *placeholder* local gradient of all ones.
    ///
    /// The real softmax Jacobian is not diagonal, so it cannot be expressed as an elementwise
    /// gradient. This is only correct when the layer is the output layer and the loss is
    /// [`CategoricalCrossEntropy`](crate::arch::loss::CategoricalCrossEntropy), whose gradient
    /// already is the combined softmax + cross-entropy gradient `p - y`. With any other loss,
    /// or in a hidden layer, the propagated gradient is wrong.
    Softmax(Softmax),
}

impl ActFn {
    pub fn identity() -> Self {
        Self::Identity
    }

    pub fn sigmoid() -> Self {
        Self::Sigmoid(Sigmoid)
    }

    pub fn relu() -> Self {
        Self::Relu(Relu)
    }

    pub fn softmax() -> Self {
        Self::Softmax(Softmax)
    }

    /// Resolves an activation function by name, ignoring case.
    ///
    /// # Arguments
    /// * `name` - One of `identity`/`linear`, `sigmoid`/`logistic`, `relu` or `softmax`.
    ///
    /// # Returns
    /// The activation or `MlErr::InvalidConfig` if the name is unknown.
    pub fn from_name(name: &str) -> Result<Self, MlErr> {
        let act_fn = match normalize(name).as_str() {
            "identity" | "linear" => Self::identity(),
            "sigmoid" | "logistic" => Self::sigmoid(),
            "relu" => Self::relu(),
            "softmax" => Self::softmax(),
            _ => {
                return Err(MlErr::InvalidConfig(format!(
                    "unknown activation function name: {name}"
                )));
            }
        };

        Ok(act_fn)
    }

    /// Applies the activation to `z`.
    ///
    /// # Returns
    /// A tuple of the output and the local gradient of the activation evaluated at `z`,
    /// both with the same length as `z`.
    pub fn call(&self, z: ArrayView1<f32>) -> (Array1<f32>, Array1<f32>) {
        match self {
            Self::Identity => (z.to_owned(), Array1::ones(z.len())),
            Self::Sigmoid(a) => (z.mapv(|z| a.f(z)), z.mapv(|z| a.df(z))),
            Self::Relu(a) => (z.mapv(|z| a.f(z)), z.mapv(|z| a.df(z))),
            Self::Softmax(a) => (a.f(z), Array1::ones(z.len())),
        }
    }
}

impl FromStr for ActFn {
    type Err = MlErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
