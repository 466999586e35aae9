use crate::noise::{NoiseApplier, PrivacyParams};

/// Noise applier that returns the same value on every draw.
#[derive(Debug, Clone, Copy)]
pub struct ConstantNoiseApplier {
    noise: i64,
}

impl ConstantNoiseApplier {
    pub fn new(noise: i64) -> Self {
        Self { noise }
    }
}

impl NoiseApplier for ConstantNoiseApplier {
    fn sample(&self, _params: &PrivacyParams) -> i64 {
        self.noise
    }
}
