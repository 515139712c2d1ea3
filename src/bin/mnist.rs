use std::env;

use log::info;
use rand::{SeedableRng, rngs::StdRng};

use neural_network::{
    MlErr, Result,
    arch::{Model, layers::Layer},
    config::ModelConfig,
    dataset::Dataset,
    metrics,
    optimization::Sgd,
    weight_gen::GlorotUniform,
};

const DEFAULT_TRAIN: &str = "MNIST_train.txt";
const DEFAULT_TEST: &str = "MNIST_test.txt";
const DEFAULT_EPOCHS: usize = 50;
const NUM_CLASSES: usize = 10;
const PIXEL_SCALE: f32 = 255.;

fn main() -> Result<()> {
    env_logger::init();

    let train_path = env::var("MNIST_TRAIN").unwrap_or_else(|_| DEFAULT_TRAIN.to_string());
    let test_path = env::var("MNIST_TEST").unwrap_or_else(|_| DEFAULT_TEST.to_string());

    let (mut model, mut epochs, batch_size) = match env::var("MODEL_CONFIG") {
        Ok(path) => {
            let config = ModelConfig::load(&path)?;
            let model = config.build()?;
            (model, config.training.epochs, config.training.batch_size)
        }
        Err(_) => (default_model()?, DEFAULT_EPOCHS, None),
    };

    if let Ok(v) = env::var("EPOCHS") {
        epochs = v
            .parse()
            .map_err(|e| MlErr::InvalidConfig(format!("EPOCHS: {e}")))?;
    }

    let train = Dataset::from_labeled_csv(&train_path, NUM_CLASSES, PIXEL_SCALE)?;
    let test = Dataset::from_labeled_csv(&test_path, NUM_CLASSES, PIXEL_SCALE)?;
    info!(train = train.len(), test = test.len(); "loaded datasets");

    let losses = model.fit(train.x(), train.y(), epochs, batch_size)?;
    for (epoch, loss) in losses.iter().enumerate() {
        println!("Epoch {epoch} - Loss: {loss}");
    }

    let y_pred = model.forward(test.x())?;
    let accuracy = metrics::accuracy(y_pred.view(), test.y())?;
    println!("\nTest Accuracy: {:.2}%", accuracy * 100.);

    Ok(())
}

fn default_model() -> Result<Model<Sgd>> {
    let mut weight_gen = GlorotUniform::new(StdRng::from_os_rng());

    let layers = [
        Layer::dense((784, 128), true, "relu", &mut weight_gen)?,
        Layer::dense((128, 64), true, "relu", &mut weight_gen)?,
        Layer::dense((64, 10), false, "softmax", &mut weight_gen)?,
    ];

    Model::new(layers, Sgd::new(0.01, "categorical_crossentropy")?)
}
