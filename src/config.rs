//! JSON description of a model and of how to train it.

use std::{fs, num::NonZeroUsize, path::Path};

use log::info;
use rand::{SeedableRng, rngs::StdRng};
use serde::Deserialize;

use crate::{
    MlErr, Result,
    arch::{Model, layers::Layer},
    optimization::Sgd,
    weight_gen::{ConstWeightGen, GlorotUniform, WeightGen},
};

/// The full configuration of a model.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub layers: Vec<LayerConfig>,
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    /// Seed of the parameter initialization, OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// A fully connected layer.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    pub input_dim: usize,
    pub output_dim: usize,
    #[serde(default = "default_use_bias")]
    pub use_bias: bool,
    #[serde(default = "default_activation")]
    pub activation: String,
    #[serde(default)]
    pub init: InitConfig,
}

/// How the parameters of a layer are initialized.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitConfig {
    #[default]
    GlorotUniform,
    Const {
        value: f32,
    },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizerConfig {
    pub learning_rate: f32,
    pub loss: String,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrainingConfig {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    /// Contiguous batches of this size, full batch when absent.
    #[serde(default)]
    pub batch_size: Option<NonZeroUsize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: None,
        }
    }
}

fn default_use_bias() -> bool {
    true
}

fn default_activation() -> String {
    "identity".to_string()
}

fn default_epochs() -> usize {
    1
}

impl ModelConfig {
    /// Parses a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses the JSON configuration stored at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Builds the model described by this configuration.
    ///
    /// # Returns
    /// A new untrained model, or `MlErr::InvalidConfig` if any of its parts can't be
    /// resolved.
    pub fn build(&self) -> Result<Model<Sgd>> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let layers = self
            .layers
            .iter()
            .enumerate()
            .map(|(i, layer)| {
                let mut glorot;
                let mut constant;
                let weight_gen: &mut dyn WeightGen = match layer.init {
                    InitConfig::GlorotUniform => {
                        glorot = GlorotUniform::new(&mut rng);
                        &mut glorot
                    }
                    InitConfig::Const { value } => {
                        constant = ConstWeightGen::new(value);
                        &mut constant
                    }
                };

                Layer::dense(
                    (layer.input_dim, layer.output_dim),
                    layer.use_bias,
                    &layer.activation,
                    weight_gen,
                )
                .map_err(|e| in_layer(i, e))
            })
            .collect::<Result<Vec<_>>>()?;

        let optimizer = Sgd::new(self.optimizer.learning_rate, &self.optimizer.loss)?;
        let model = Model::new(layers, optimizer).map_err(|e| match e {
            MlErr::SizeMismatch {
                got, expected, ..
            } => MlErr::InvalidConfig(format!(
                "consecutive layers don't match, got input dim {got} and expected {expected}"
            )),
            e => e,
        })?;

        info!(
            layers = self.layers.len(),
            params = model.size(),
            loss = self.optimizer.loss.as_str(),
            lr = self.optimizer.learning_rate;
            "built model from config"
        );

        Ok(model)
    }
}

fn in_layer(i: usize, e: MlErr) -> MlErr {
    match e {
        MlErr::InvalidConfig(msg) => MlErr::InvalidConfig(format!("layer {i}: {msg}")),
        e => MlErr::InvalidConfig(format!("layer {i}: {e}")),
    }
}
