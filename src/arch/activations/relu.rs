/// Rectified linear unit, `max(z, 0)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Relu;

impl Relu {
    pub fn f(&self, z: f32) -> f32 {
        if z > 0. { z } else { 0. }
    }

    /// The derivative at exactly `0` is taken to be `0`.
    pub fn df(&self, z: f32) -> f32 {
        if z > 0. { 1. } else { 0. }
    }
}
