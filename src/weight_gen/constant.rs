use ndarray::{Array1, Array2};

use super::WeightGen;
use crate::Result;

/// A weight generator that always generates the same value.
#[derive(Debug, Clone, Copy)]
pub struct ConstWeightGen {
    value: f32,
}

impl ConstWeightGen {
    /// Creates a new `ConstWeightGen` weight generator which always generates the same value.
    ///
    /// # Arguments
    /// * `value` - The value to fill every parameter with.
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl WeightGen for ConstWeightGen {
    fn weights(&mut self, dim: (usize, usize)) -> Result<Array2<f32>> {
        Ok(Array2::from_elem(dim, self.value))
    }

    fn bias(&mut self, dim: (usize, usize)) -> Result<Array1<f32>> {
        Ok(Array1::from_elem(dim.1, self.value))
    }
}
