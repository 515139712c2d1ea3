mod constant;
mod glorot;
mod weight_gen;

pub use constant::ConstWeightGen;
pub use glorot::GlorotUniform;
pub use weight_gen::WeightGen;
