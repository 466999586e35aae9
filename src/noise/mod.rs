pub mod applier;
pub mod runner;

pub use applier::{DpNoiseApplier, NoiseApplier};
pub use runner::{NoisedAggregationRunner, NoisedResult};

/// Noise distributions supported by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseDistribution {
    Laplace,
    Gaussian,
}

/// Differential-privacy parameters for one job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrivacyParams {
    pub distribution: NoiseDistribution,
    pub epsilon: f64,
    pub delta: f64,
    pub l1_sensitivity: f64,
}

impl PrivacyParams {
    /// The same parameters with a different epsilon, as used by the
    /// `debug_privacy_epsilon` override.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

/// Largest epsilon a job may request through `debug_privacy_epsilon`.
pub const EPSILON_MAX: f64 = 64.0;

/// Noise threshold below which buckets absent from the output domain are
/// dropped: one maximal contribution plus the Laplace tail at mass delta.
pub fn derive_threshold(params: &PrivacyParams) -> f64 {
    let scale = params.l1_sensitivity / params.epsilon;
    params.l1_sensitivity + scale * (1.0 / (2.0 * params.delta)).ln()
}
