use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

use super::WeightGen;
use crate::{MlErr, Result};

/// Glorot (Xavier) uniform initialization.
///
/// Samples every parameter from `U(-l, l)` where `l = sqrt(6 / (fan_in + fan_out))`. The
/// bias is drawn from the same range as the weights.
pub struct GlorotUniform<R: Rng> {
    rng: R,
}

impl<R: Rng> GlorotUniform<R> {
    /// Creates a new `GlorotUniform` weight generator.
    ///
    /// # Arguments
    /// * `rng` - The random number generator to sample from.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn distribution(&self, (fan_in, fan_out): (usize, usize)) -> Result<Uniform<f32>> {
        let limit = (6. / (fan_in + fan_out) as f32).sqrt();
        Uniform::new(-limit, limit).map_err(|e| {
            MlErr::InvalidConfig(format!(
                "cannot build glorot range for dim ({fan_in}, {fan_out}): {e}"
            ))
        })
    }
}

impl<R: Rng> WeightGen for GlorotUniform<R> {
    fn weights(&mut self, dim: (usize, usize)) -> Result<Array2<f32>> {
        let distribution = self.distribution(dim)?;
        Ok(Array2::random_using(dim, distribution, &mut self.rng))
    }

    fn bias(&mut self, dim: (usize, usize)) -> Result<Array1<f32>> {
        let distribution = self.distribution(dim)?;
        Ok(Array1::random_using(dim.1, distribution, &mut self.rng))
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::weight_gen::ConstWeightGen;

    #[test]
    fn test_glorot_samples_within_limit() {
        let mut weight_gen = GlorotUniform::new(StdRng::seed_from_u64(7));
        let limit = (6f32 / (784. + 128.)).sqrt();

        let w = weight_gen.weights((784, 128)).unwrap();
        let b = weight_gen.bias((784, 128)).unwrap();

        assert_eq!(w.dim(), (784, 128));
        assert_eq!(b.len(), 128);
        assert!(w.iter().chain(b.iter()).all(|x| x.abs() <= limit));
        assert!(w.iter().any(|&x| x != w[[0, 0]]));
    }

    #[test]
    fn test_glorot_is_reproducible_with_seed() {
        let mut a = GlorotUniform::new(StdRng::seed_from_u64(1));
        let mut b = GlorotUniform::new(StdRng::seed_from_u64(1));

        assert_eq!(a.weights((3, 2)).unwrap(), b.weights((3, 2)).unwrap());
    }

    #[test]
    fn test_glorot_rejects_empty_layer() {
        let mut weight_gen = GlorotUniform::new(StdRng::seed_from_u64(1));
        assert!(matches!(
            weight_gen.weights((0, 0)),
            Err(MlErr::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_const_fill() {
        let mut weight_gen = ConstWeightGen::new(0.5);

        assert!(weight_gen.weights((2, 3)).unwrap().iter().all(|&x| x == 0.5));
        assert_eq!(weight_gen.bias((2, 3)).unwrap().len(), 3);
    }
}
