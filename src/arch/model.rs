use std::num::NonZeroUsize;

use log::{debug, trace};
use ndarray::{Array2, ArrayView2};

use super::{layers::Layer, loss::LossFn};
use crate::{MlErr, Result, dataset, optimization::Optimizer};

/// A feedforward model: information flows forward through its layers when computing an
/// output and backward when propagating the gradient of the loss.
///
/// The model exclusively owns its layers and its optimizer, which in turn owns the loss
/// function the model is trained against.
#[derive(Clone, Debug)]
pub struct Model<O: Optimizer> {
    layers: Vec<Layer>,
    optimizer: O,
}

impl<O: Optimizer> Model<O> {
    /// Creates a new `Model`.
    ///
    /// # Arguments
    /// * `layers` - The layers the model is composed of, in forward order.
    /// * `optimizer` - The optimizer used to update the layers' parameters.
    ///
    /// # Returns
    /// A new `Model`, `MlErr::InvalidConfig` if there are no layers or
    /// `MlErr::SizeMismatch` if a layer's input doesn't match the previous one's output.
    pub fn new<I>(layers: I, optimizer: O) -> Result<Self>
    where
        I: IntoIterator<Item = Layer>,
    {
        let layers: Vec<_> = layers.into_iter().collect();

        if layers.is_empty() {
            return Err(MlErr::InvalidConfig(
                "a model needs at least one layer".to_string(),
            ));
        }

        for pair in layers.windows(2) {
            if pair[0].output_dim() != pair[1].input_dim() {
                return Err(MlErr::SizeMismatch {
                    what: "consecutive layers",
                    got: pair[1].input_dim(),
                    expected: pair[0].output_dim(),
                });
            }
        }

        Ok(Self { layers, optimizer })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    pub fn input_dim(&self) -> usize {
        self.layers[0].input_dim()
    }

    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].output_dim()
    }

    /// Returns the amount of trainable parameters in the model.
    pub fn size(&self) -> usize {
        self.layers.iter().map(|layer| layer.size()).sum()
    }

    /// Makes a forward pass through the network.
    ///
    /// Every layer caches what it needs for a subsequent `backprop` over the same batch.
    ///
    /// # Arguments
    /// * `x` - The input batch, one sample per row.
    ///
    /// # Returns
    /// The prediction for the given input, one row per sample, or an error if occurred.
    pub fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mut y_pred = self.layers[0].forward(x)?;
        for layer in &mut self.layers[1..] {
            y_pred = layer.forward(y_pred.view())?;
        }

        Ok(y_pred)
    }

    /// Evaluates the optimizer's loss function over a batch.
    ///
    /// # Arguments
    /// * `y_true` - The expected outputs, one sample per row.
    /// * `y_pred` - The predicted outputs, one sample per row.
    ///
    /// # Returns
    /// The loss averaged over the samples and the gradient of each sample's loss with
    /// respect to its prediction, one row per sample. `MlErr::IllegalState` if the batch
    /// is empty.
    pub fn compute_loss(
        &self,
        y_true: ArrayView2<f32>,
        y_pred: ArrayView2<f32>,
    ) -> Result<(f32, Array2<f32>)> {
        if y_true.nrows() != y_pred.nrows() {
            return Err(MlErr::SizeMismatch {
                what: "predicted samples",
                got: y_pred.nrows(),
                expected: y_true.nrows(),
            });
        }

        if y_pred.nrows() == 0 {
            return Err(MlErr::IllegalState("cannot compute the loss of an empty batch"));
        }

        let loss_fn = self.optimizer.loss_fn();
        let mut loss = 0.;
        let mut loss_grad = Array2::zeros(y_pred.raw_dim());

        for ((y, y_pred), mut grad) in y_true
            .outer_iter()
            .zip(y_pred.outer_iter())
            .zip(loss_grad.outer_iter_mut())
        {
            let (sample_loss, sample_grad) = loss_fn.call(y, y_pred)?;
            loss += sample_loss;
            grad.assign(&sample_grad);
        }

        Ok((loss / y_pred.nrows() as f32, loss_grad))
    }

    /// Propagates the gradient of the loss backward through the layers, from the last to
    /// the first, updating each layer's parameters along the way.
    ///
    /// Must be called once, right after a `forward` over the batch `loss_grad` was computed
    /// for.
    ///
    /// # Arguments
    /// * `loss_grad` - The gradient of each sample's loss with respect to the model's output.
    ///
    /// # Returns
    /// `MlErr::IllegalState` if `loss_grad` is empty, or any error raised by the layers.
    pub fn backprop(&mut self, loss_grad: Array2<f32>) -> Result<()> {
        if loss_grad.is_empty() {
            return Err(MlErr::IllegalState(
                "backpropagation called before the loss gradient was computed",
            ));
        }

        let optimizer = &self.optimizer;
        self.layers
            .iter_mut()
            .rev()
            .try_fold(loss_grad, |d, layer| layer.backward(d.view(), optimizer))?;

        Ok(())
    }

    /// Performs a forward pass, evaluates the loss and backpropagates its gradient.
    ///
    /// # Arguments
    /// * `x` - The input batch.
    /// * `y` - The expected outputs for `x`.
    ///
    /// # Returns
    /// The batch loss, computed before the parameters were updated.
    pub fn training_step(&mut self, x: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
        let y_pred = self.forward(x)?;
        let (loss, loss_grad) = self.compute_loss(y, y_pred.view())?;
        self.backprop(loss_grad)?;

        trace!(samples = x.nrows(), loss = loss; "training step");
        Ok(loss)
    }

    /// Trains the model for `epochs` epochs.
    ///
    /// # Arguments
    /// * `x` - The training inputs, one sample per row.
    /// * `y` - The expected outputs.
    /// * `epochs` - The amount of passes over the whole data.
    /// * `batch_size` - The size of the contiguous batches each epoch is split into, the
    ///   last one may be smaller. `None` trains on the whole data in a single step.
    ///
    /// # Returns
    /// The loss of each epoch, the mean of its batch losses.
    pub fn fit(
        &mut self,
        x: ArrayView2<f32>,
        y: ArrayView2<f32>,
        epochs: usize,
        batch_size: Option<NonZeroUsize>,
    ) -> Result<Vec<f32>> {
        if x.nrows() != y.nrows() {
            return Err(MlErr::SizeMismatch {
                what: "training labels",
                got: y.nrows(),
                expected: x.nrows(),
            });
        }

        let Some(full_batch) = NonZeroUsize::new(x.nrows()) else {
            return Err(MlErr::IllegalState("cannot fit a model on an empty dataset"));
        };

        let batch_size = batch_size.unwrap_or(full_batch);
        let mut losses = Vec::with_capacity(epochs);

        for epoch in 0..epochs {
            let mut total_loss = 0.;
            let mut num_batches = 0;

            for (x, y) in dataset::batches(x, y, batch_size) {
                total_loss += self.training_step(x, y)?;
                num_batches += 1;
            }

            let loss = total_loss / num_batches as f32;
            debug!(epoch = epoch, loss = loss; "finished epoch");
            losses.push(loss);
        }

        Ok(losses)
    }
}
