use ndarray::{Array2, ArrayView2};

use super::Dense;
use crate::{Result, arch::activations::ActFn, optimization::Optimizer, weight_gen::WeightGen};

/// A layer of a [`Model`](crate::arch::Model).
#[derive(Clone, Debug)]
pub enum Layer {
    Dense(Dense),
}
use Layer::*;

impl Layer {
    /// Creates a new fully connected layer.
    ///
    /// # Arguments
    /// * `dim` - The `(input_dim, output_dim)` of the layer.
    /// * `use_bias` - Whether the layer has a bias.
    /// * `act_fn` - The name of the activation function, see [`ActFn::from_name`].
    /// * `weight_gen` - The initializer of the parameters.
    pub fn dense<W>(
        dim: (usize, usize),
        use_bias: bool,
        act_fn: &str,
        weight_gen: &mut W,
    ) -> Result<Self>
    where
        W: WeightGen + ?Sized,
    {
        let act_fn = ActFn::from_name(act_fn)?;
        Ok(Dense(Dense::new(dim, use_bias, act_fn, weight_gen)?))
    }

    pub fn input_dim(&self) -> usize {
        match self {
            Dense(l) => l.input_dim(),
        }
    }

    pub fn output_dim(&self) -> usize {
        match self {
            Dense(l) => l.output_dim(),
        }
    }

    /// Returns the amount of trainable parameters in this layer.
    pub fn size(&self) -> usize {
        match self {
            Dense(l) => l.size(),
        }
    }

    pub fn as_dense(&self) -> Option<&Dense> {
        match self {
            Dense(l) => Some(l),
        }
    }

    pub fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Dense(l) => l.forward(x),
        }
    }

    pub fn backward<O: Optimizer>(
        &mut self,
        d: ArrayView2<f32>,
        optimizer: &O,
    ) -> Result<Array2<f32>> {
        match self {
            Dense(l) => l.backward(d, optimizer),
        }
    }
}

impl From<Dense> for Layer {
    fn from(layer: Dense) -> Self {
        Dense(layer)
    }
}
