use std::env;

use log::info;
use ndarray::arr2;
use rand::{SeedableRng, rngs::StdRng};

use neural_network::{
    MlErr, Result,
    arch::{Model, layers::Layer},
    optimization::Sgd,
    weight_gen::GlorotUniform,
};

const DEFAULT_EPOCHS: usize = 100_000;
const LOG_EVERY: usize = 100;

fn main() -> Result<()> {
    env_logger::init();

    let epochs = env_usize("EPOCHS")?.unwrap_or(DEFAULT_EPOCHS);
    let rng = match env_usize("SEED")? {
        Some(seed) => StdRng::seed_from_u64(seed as u64),
        None => StdRng::from_os_rng(),
    };
    let mut weight_gen = GlorotUniform::new(rng);

    let layers = [
        Layer::dense((2, 4), true, "sigmoid", &mut weight_gen)?,
        Layer::dense((4, 4), true, "sigmoid", &mut weight_gen)?,
        Layer::dense((4, 1), false, "sigmoid", &mut weight_gen)?,
    ];
    let mut model = Model::new(layers, Sgd::new(0.1, "binary_crossentropy")?)?;

    let x = arr2(&[[0., 0.], [0., 1.], [1., 0.], [1., 1.]]);
    let y = arr2(&[[0.], [1.], [1.], [0.]]);

    for epoch in 0..epochs {
        let loss = model.training_step(x.view(), y.view())?;
        if epoch % LOG_EVERY == 0 {
            info!(epoch = epoch, loss = loss; "training");
        }
    }

    let y_pred = model.forward(x.view())?;

    println!("Predictions after training:");
    for ((x, y_pred), y) in x.outer_iter().zip(y_pred.outer_iter()).zip(y.outer_iter()) {
        println!(
            "Input: [{}, {}] -> Predicted: {:.4}, True: {}",
            x[0], x[1], y_pred[0], y[0]
        );
    }

    Ok(())
}

fn env_usize(key: &'static str) -> Result<Option<usize>> {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .map(Some)
            .map_err(|e| MlErr::InvalidConfig(format!("{key}: {e}"))),
        Err(_) => Ok(None),
    }
}
