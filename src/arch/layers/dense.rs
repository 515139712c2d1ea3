use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::{
    MlErr, Result,
    arch::activations::ActFn,
    linalg,
    optimization::Optimizer,
    weight_gen::WeightGen,
};

/// What `Dense::backward` needs from the last `Dense::forward`, one row per sample in the
/// order they were given.
#[derive(Clone, Debug)]
struct ForwardCache {
    inputs: Array2<f32>,
    act_grads: Array2<f32>,
}

/// A fully connected layer: `a = act_fn(x · W + b)` for every sample `x` of a batch.
///
/// The weights have shape `(input_dim, output_dim)` and the bias, if any, has length
/// `output_dim`.
///
/// A forward pass caches the batch inputs and the local gradient of the activation for
/// every sample. The next backward pass consumes that cache, so every `backward` must be
/// preceded by exactly one `forward` over the same batch.
#[derive(Clone, Debug)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: ActFn,
    weights: Array2<f32>,
    bias: Option<Array1<f32>>,

    // Forward metadata
    cache: Option<ForwardCache>,

    // Backward metadata
    weights_grad: Array2<f32>,
    bias_grad: Option<Array1<f32>>,
}

impl Dense {
    /// Creates a new `Dense` layer with parameters drawn from `weight_gen`.
    ///
    /// # Arguments
    /// * `dim` - The `(input_dim, output_dim)` of the layer, both must be positive.
    /// * `use_bias` - Whether the layer adds a bias to its weighted sums.
    /// * `act_fn` - The activation function.
    /// * `weight_gen` - The initializer of the weights and bias.
    ///
    /// # Returns
    /// A new `Dense` layer or an error if the dimensions are invalid.
    pub fn new<W>(
        dim: (usize, usize),
        use_bias: bool,
        act_fn: ActFn,
        weight_gen: &mut W,
    ) -> Result<Self>
    where
        W: WeightGen + ?Sized,
    {
        check_dim(dim)?;

        let weights = weight_gen.weights(dim)?;
        let bias = if use_bias {
            Some(weight_gen.bias(dim)?)
        } else {
            None
        };

        let layer = Self::from_params(weights, bias, act_fn)?;

        if layer.dim != dim {
            return Err(MlErr::SizeMismatch {
                what: "initial weights",
                got: layer.weights.len(),
                expected: dim.0 * dim.1,
            });
        }

        Ok(layer)
    }

    /// Creates a new `Dense` layer from existing parameters.
    ///
    /// # Arguments
    /// * `weights` - A `(input_dim, output_dim)` matrix.
    /// * `bias` - An optional bias of length `output_dim`.
    /// * `act_fn` - The activation function.
    pub fn from_params(
        weights: Array2<f32>,
        bias: Option<Array1<f32>>,
        act_fn: ActFn,
    ) -> Result<Self> {
        let dim = weights.dim();
        check_dim(dim)?;

        if let Some(bias) = &bias {
            if bias.len() != dim.1 {
                return Err(MlErr::SizeMismatch {
                    what: "bias",
                    got: bias.len(),
                    expected: dim.1,
                });
            }
        }

        Ok(Self {
            dim,
            act_fn,
            bias_grad: bias.as_ref().map(|_| Array1::zeros(dim.1)),
            weights_grad: Array2::zeros(dim),
            weights,
            bias,
            cache: None,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.dim.0
    }

    pub fn output_dim(&self) -> usize {
        self.dim.1
    }

    pub fn use_bias(&self) -> bool {
        self.bias.is_some()
    }

    pub fn act_fn(&self) -> ActFn {
        self.act_fn
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.weights.len() + self.bias.as_ref().map_or(0, |b| b.len())
    }

    pub fn weights(&self) -> ArrayView2<'_, f32> {
        self.weights.view()
    }

    /// Returns the bias of this layer, or `MlErr::IllegalState` if it has none.
    pub fn bias(&self) -> Result<ArrayView1<'_, f32>> {
        self.bias
            .as_ref()
            .map(|b| b.view())
            .ok_or(MlErr::IllegalState("the layer has no bias"))
    }

    /// Returns the batch-averaged weight gradient used in the last `backward` call (zeros
    /// before the first one).
    pub fn weights_gradients(&self) -> ArrayView2<'_, f32> {
        self.weights_grad.view()
    }

    /// Returns the batch-averaged bias gradient used in the last `backward` call, or
    /// `MlErr::IllegalState` if the layer has no bias.
    pub fn bias_gradients(&self) -> Result<ArrayView1<'_, f32>> {
        self.bias_grad
            .as_ref()
            .map(|b| b.view())
            .ok_or(MlErr::IllegalState("the layer has no bias"))
    }

    /// Returns the inputs of the last forward batch, if it wasn't consumed by a backward pass.
    pub fn cached_inputs(&self) -> Option<ArrayView2<'_, f32>> {
        self.cache.as_ref().map(|c| c.inputs.view())
    }

    /// Returns the activation gradients of the last forward batch, if it wasn't consumed by
    /// a backward pass.
    pub fn cached_act_grads(&self) -> Option<ArrayView2<'_, f32>> {
        self.cache.as_ref().map(|c| c.act_grads.view())
    }

    /// Makes a forward pass over a batch.
    ///
    /// Discards any previous cache and caches, sample by sample, the inputs and the
    /// activation's local gradients for the next `backward`.
    ///
    /// # Arguments
    /// * `x` - The batch, one sample of length `input_dim` per row.
    ///
    /// # Returns
    /// One output row of length `output_dim` per input row, in the same order.
    pub fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.cache = None;

        if x.ncols() != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "input sample",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let shape = (x.nrows(), self.dim.1);
        let mut a = Array2::zeros(shape);
        let mut act_grads = Array2::zeros(shape);

        for ((x, mut a), mut act_grad) in x
            .outer_iter()
            .zip(a.outer_iter_mut())
            .zip(act_grads.outer_iter_mut())
        {
            let (out, grad) = self.apply_weights(x)?;
            a.assign(&out);
            act_grad.assign(&grad);
        }

        self.cache = Some(ForwardCache {
            inputs: x.to_owned(),
            act_grads,
        });

        Ok(a)
    }

    /// Makes a backward pass over the batch of the last `forward` call and updates the
    /// parameters.
    ///
    /// For every sample `b` the local gradient `δ_b = act_grad_b ⊙ d_b` contributes
    /// `x_b ⊗ δ_b` to the weight gradient, `δ_b` to the bias gradient and `δ_b · Wᵀ` to the
    /// returned gradient. The parameter gradients are averaged over the batch and handed to
    /// `optimizer`. The returned gradient is computed with the weights as they were before
    /// the update.
    ///
    /// # Arguments
    /// * `d` - The gradient of the loss with respect to this layer's outputs, one row per
    ///   sample of the last forward batch.
    /// * `optimizer` - The optimizer that updates the weights and bias.
    ///
    /// # Returns
    /// The gradient of the loss with respect to this layer's inputs, one row per sample, or
    /// `MlErr::IllegalState` if there is no forward cache to consume. The cache is only
    /// consumed once `d` matches its shape.
    pub fn backward<O>(&mut self, d: ArrayView2<f32>, optimizer: &O) -> Result<Array2<f32>>
    where
        O: Optimizer,
    {
        let batch_size = self
            .cache
            .as_ref()
            .map(|c| c.inputs.nrows())
            .ok_or(MlErr::IllegalState(
                "backward pass requires a preceding forward pass",
            ))?;

        if d.nrows() != batch_size {
            return Err(MlErr::SizeMismatch {
                what: "gradient batch",
                got: d.nrows(),
                expected: batch_size,
            });
        }

        if d.ncols() != self.dim.1 {
            return Err(MlErr::SizeMismatch {
                what: "gradient sample",
                got: d.ncols(),
                expected: self.dim.1,
            });
        }

        if batch_size == 0 {
            return Err(MlErr::IllegalState(
                "cannot apply the gradients of an empty batch",
            ));
        }

        let ForwardCache { inputs, act_grads } = self.cache.take().ok_or(MlErr::IllegalState(
            "backward pass requires a preceding forward pass",
        ))?;

        let mut weights_grad = Array2::zeros(self.dim);
        let mut bias_grad: Option<Array1<f32>> =
            self.bias.as_ref().map(|_| Array1::zeros(self.dim.1));
        let mut d_prev = Array2::zeros((batch_size, self.dim.0));
        let weights_t = linalg::transpose(self.weights.view());

        for (((x, act_grad), d), mut d_prev) in inputs
            .outer_iter()
            .zip(act_grads.outer_iter())
            .zip(d.outer_iter())
            .zip(d_prev.outer_iter_mut())
        {
            let delta = linalg::hadamard(act_grad, d)?;

            linalg::add_assign(&mut weights_grad, linalg::outer(x, delta.view()).view())?;
            if let Some(bias_grad) = &mut bias_grad {
                linalg::add_assign(bias_grad, delta.view())?;
            }

            d_prev.assign(&linalg::vec_mat_mul(delta.view(), weights_t)?);
        }

        let n = batch_size as f32;

        weights_grad /= n;
        self.weights = optimizer.apply_gradient(self.weights.view(), weights_grad.view())?;

        if let (Some(bias), Some(bias_grad)) = (&mut self.bias, &mut bias_grad) {
            *bias_grad /= n;
            *bias = optimizer.apply_gradient(bias.view(), bias_grad.view())?;
        }

        self.weights_grad = weights_grad;
        self.bias_grad = bias_grad;

        Ok(d_prev)
    }

    /// Computes the output and activation gradient of a single sample.
    fn apply_weights(&self, x: ArrayView1<f32>) -> Result<(Array1<f32>, Array1<f32>)> {
        let z = linalg::vec_mat_mul(x, self.weights.view())?;
        let z = match &self.bias {
            Some(b) => linalg::add(z.view(), b.view())?,
            None => z,
        };

        Ok(self.act_fn.call(z.view()))
    }
}

fn check_dim(dim: (usize, usize)) -> Result<()> {
    if dim.0 == 0 || dim.1 == 0 {
        return Err(MlErr::InvalidConfig(format!(
            "layer dimensions must be positive, got {dim:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        arch::loss::{BinaryCrossEntropy, LossFn},
        optimization::Sgd,
        weight_gen::{ConstWeightGen, GlorotUniform},
    };

    fn ones(dim: (usize, usize), use_bias: bool, act_fn: ActFn) -> Dense {
        Dense::new(dim, use_bias, act_fn, &mut ConstWeightGen::new(1.)).unwrap()
    }

    #[test]
    fn test_forward_with_fixed_weights() {
        let mut layer = ones((2, 1), false, ActFn::identity());

        let a = layer.forward(arr2(&[[1., 2.]]).view()).unwrap();

        assert_eq!(a, arr2(&[[3.]]));
    }

    #[test]
    fn test_forward_adds_bias_and_applies_activation() {
        let weights = arr2(&[[1., -1.], [2., 0.]]);
        let mut layer =
            Dense::from_params(weights, Some(arr1(&[-5., 0.5])), ActFn::relu()).unwrap();

        let a = layer.forward(arr2(&[[1., 1.], [3., 1.]]).view()).unwrap();

        assert_eq!(a, arr2(&[[0., 0.], [0., 0.]]));
        assert_eq!(
            layer.cached_act_grads().unwrap(),
            arr2(&[[0., 0.], [0., 0.]])
        );

        let a = layer.forward(arr2(&[[4., 0.]]).view()).unwrap();
        assert_eq!(a, arr2(&[[0., 0.]]));

        let a = layer.forward(arr2(&[[2., 2.]]).view()).unwrap();
        assert_eq!(a, arr2(&[[1., 0.]]));
        assert_eq!(layer.cached_act_grads().unwrap(), arr2(&[[1., 0.]]));
    }

    #[test]
    fn test_forward_caches_each_sample_in_order() {
        let mut layer = ones((2, 3), true, ActFn::sigmoid());
        let x = arr2(&[[1., 2.], [0., 0.], [-1., 3.]]);

        let a = layer.forward(x.view()).unwrap();

        assert_eq!(a.dim(), (3, 3));
        assert_eq!(layer.cached_inputs().unwrap(), x);

        let act_grads = layer.cached_act_grads().unwrap();
        assert_eq!(act_grads.dim(), (3, 3));
        for (a, g) in a.iter().zip(act_grads.iter()) {
            assert_relative_eq!(*g, a * (1. - a), epsilon = 1e-6);
        }

        layer.forward(arr2(&[[5., 5.]]).view()).unwrap();
        assert_eq!(layer.cached_inputs().unwrap().nrows(), 1);
    }

    #[test]
    fn test_forward_rejects_wrong_sample_length() {
        let mut layer = ones((2, 1), false, ActFn::identity());

        let err = layer.forward(arr2(&[[1., 2., 3.]]).view()).unwrap_err();

        assert!(matches!(
            err,
            MlErr::SizeMismatch {
                got: 3,
                expected: 2,
                ..
            }
        ));
        assert!(layer.cached_inputs().is_none());
    }

    #[test]
    fn test_backward_single_sample() {
        let sgd = Sgd::new(0.1, "mse").unwrap();
        let mut layer = ones((2, 1), false, ActFn::identity());

        layer.forward(arr2(&[[1., 2.]]).view()).unwrap();
        let d_prev = layer.backward(arr2(&[[1.]]).view(), &sgd).unwrap();

        assert_eq!(d_prev, arr2(&[[1., 1.]]));
        assert_eq!(layer.weights_gradients(), arr2(&[[1.], [2.]]));
        assert_relative_eq!(layer.weights()[[0, 0]], 0.9, epsilon = 1e-6);
        assert_relative_eq!(layer.weights()[[1, 0]], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_backward_averages_over_batch() {
        let sgd = Sgd::new(0.1, "mse").unwrap();
        let mut layer = ones((2, 1), true, ActFn::identity());

        layer.forward(arr2(&[[1., 2.], [3., 4.]]).view()).unwrap();
        let d_prev = layer.backward(arr2(&[[1.], [1.]]).view(), &sgd).unwrap();

        assert_eq!(d_prev, arr2(&[[1., 1.], [1., 1.]]));
        assert_eq!(layer.weights_gradients(), arr2(&[[2.], [3.]]));
        assert_eq!(layer.bias_gradients().unwrap(), arr1(&[1.]));
        assert_relative_eq!(layer.weights()[[0, 0]], 0.8, epsilon = 1e-6);
        assert_relative_eq!(layer.weights()[[1, 0]], 0.7, epsilon = 1e-6);
        assert_relative_eq!(layer.bias().unwrap()[0], 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_backward_uses_weights_before_update() {
        let sgd = Sgd::new(1.0, "mse").unwrap();
        let weights = arr2(&[[1., 2.], [3., 4.], [5., 6.]]);
        let mut layer = Dense::from_params(weights, None, ActFn::identity()).unwrap();

        layer.forward(arr2(&[[1., 1., 1.]]).view()).unwrap();
        let d_prev = layer.backward(arr2(&[[1., -1.]]).view(), &sgd).unwrap();

        assert_eq!(d_prev, arr2(&[[-1., -1., -1.]]));
        assert_eq!(layer.weights(), arr2(&[[0., 3.], [2., 5.], [4., 7.]]));
    }

    #[test]
    fn test_backward_twice_is_rejected() {
        let sgd = Sgd::new(0.1, "mse").unwrap();
        let mut layer = ones((2, 1), false, ActFn::identity());

        layer.forward(arr2(&[[1., 2.]]).view()).unwrap();
        layer.backward(arr2(&[[1.]]).view(), &sgd).unwrap();
        let weights = layer.weights().to_owned();

        let err = layer.backward(arr2(&[[1.]]).view(), &sgd).unwrap_err();

        assert!(matches!(err, MlErr::IllegalState(_)));
        assert_eq!(layer.weights(), weights);
    }

    #[test]
    fn test_backward_without_forward_is_rejected() {
        let sgd = Sgd::new(0.1, "mse").unwrap();
        let mut layer = ones((2, 1), false, ActFn::identity());

        assert!(matches!(
            layer.backward(arr2(&[[1.]]).view(), &sgd),
            Err(MlErr::IllegalState(_))
        ));
    }

    #[test]
    fn test_backward_rejects_batch_size_mismatch() {
        let sgd = Sgd::new(0.1, "mse").unwrap();
        let mut layer = ones((2, 1), false, ActFn::identity());

        layer.forward(arr2(&[[1., 2.], [3., 4.]]).view()).unwrap();

        assert!(matches!(
            layer.backward(arr2(&[[1.]]).view(), &sgd),
            Err(MlErr::SizeMismatch {
                got: 1,
                expected: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_backward_keeps_cache_after_rejected_gradient() {
        let sgd = Sgd::new(0.5, "mse").unwrap();
        let mut layer = ones((2, 1), false, ActFn::identity());

        layer.forward(arr2(&[[1., 2.]]).view()).unwrap();

        assert!(matches!(
            layer.backward(arr2(&[[1.], [1.]]).view(), &sgd),
            Err(MlErr::SizeMismatch { .. })
        ));
        assert!(matches!(
            layer.backward(arr2(&[[1., 1.]]).view(), &sgd),
            Err(MlErr::SizeMismatch { .. })
        ));
        assert!(layer.cached_inputs().is_some());

        let d_prev = layer.backward(arr2(&[[1.]]).view(), &sgd).unwrap();

        assert_eq!(d_prev, arr2(&[[1., 1.]]));
        assert_eq!(layer.weights(), arr2(&[[0.5], [0.]]));
        assert!(layer.cached_inputs().is_none());
    }

    #[test]
    fn test_bias_accessors_without_bias() {
        let layer = ones((2, 1), false, ActFn::identity());

        assert!(!layer.use_bias());
        assert!(matches!(layer.bias(), Err(MlErr::IllegalState(_))));
        assert!(matches!(layer.bias_gradients(), Err(MlErr::IllegalState(_))));
        assert_eq!(layer.size(), 2);
    }

    #[test]
    fn test_invalid_construction() {
        let mut weight_gen = ConstWeightGen::new(1.);

        assert!(matches!(
            Dense::new((0, 3), true, ActFn::identity(), &mut weight_gen),
            Err(MlErr::InvalidConfig(_))
        ));
        assert!(matches!(
            Dense::from_params(
                Array2::ones((2, 3)),
                Some(Array1::ones(2)),
                ActFn::identity()
            ),
            Err(MlErr::SizeMismatch {
                what: "bias",
                got: 2,
                expected: 3,
            })
        ));
    }

    #[test]
    fn test_weight_gradient_matches_finite_differences() {
        let mut weight_gen = GlorotUniform::new(StdRng::seed_from_u64(3));
        let mut layer = Dense::new((3, 1), true, ActFn::sigmoid(), &mut weight_gen).unwrap();
        let sgd = Sgd::new(1e-3, "binary_crossentropy").unwrap();

        let x = arr2(&[[0.5, -1.0, 2.0]]);
        let y = arr1(&[1.]);
        let weights = layer.weights().to_owned();
        let bias = layer.bias().unwrap().to_owned();

        let loss_with = |weights: Array2<f32>| {
            let mut probe = Dense::from_params(weights, Some(bias.clone()), ActFn::sigmoid())
                .unwrap();
            let a = probe.forward(x.view()).unwrap();
            BinaryCrossEntropy.loss(y.view(), a.row(0)).unwrap()
        };

        let a = layer.forward(x.view()).unwrap();
        let d = BinaryCrossEntropy.loss_prime(y.view(), a.row(0)).unwrap();
        layer
            .backward(d.insert_axis(ndarray::Axis(0)).view(), &sgd)
            .unwrap();

        let eps = 1e-2;
        for i in 0..3 {
            let mut plus = weights.clone();
            plus[[i, 0]] += eps;
            let mut minus = weights.clone();
            minus[[i, 0]] -= eps;

            let numeric = (loss_with(plus) - loss_with(minus)) / (2. * eps);
            assert_relative_eq!(
                layer.weights_gradients()[[i, 0]],
                numeric,
                epsilon = 1e-3,
                max_relative = 1e-2
            );
        }
    }
}
