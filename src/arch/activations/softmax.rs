use ndarray::{Array1, ArrayView1};

/// Softmax over a whole vector.
///
/// Unlike the other activations it is not elementwise, so it has no `df`: its Jacobian is
/// never materialized. See [`ActFn::Softmax`](super::ActFn::Softmax) for how the backward
/// pass deals with it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Softmax;

impl Softmax {
    pub fn f(&self, z: ArrayView1<f32>) -> Array1<f32> {
        let max = z.fold(f32::NEG_INFINITY, |max, &x| max.max(x));
        let exp = z.mapv(|x| (x - max).exp());
        let sum = exp.sum();

        exp / sum
    }
}
