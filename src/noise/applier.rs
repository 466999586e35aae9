use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::{NoiseDistribution, PrivacyParams};

/// Draws one additive noise sample. Implementations must be cheap to call
/// once per output bucket and safe to share across the run.
pub trait NoiseApplier: Send + Sync {
    fn sample(&self, params: &PrivacyParams) -> i64;
}

/// Production noise source: Laplace or Gaussian noise scaled from the job's
/// privacy parameters.
#[derive(Debug, Default)]
pub struct DpNoiseApplier;

impl DpNoiseApplier {
    pub fn new() -> Self {
        Self
    }
}

impl NoiseApplier for DpNoiseApplier {
    fn sample(&self, params: &PrivacyParams) -> i64 {
        let mut rng = rand::thread_rng();
        let sample = match params.distribution {
            NoiseDistribution::Laplace => {
                // Inverse-CDF sampling: scale b = L1 / epsilon.
                let b = params.l1_sensitivity / params.epsilon;
                let u: f64 = rng.gen_range(-0.5..0.5);
                -b * u.signum() * (1.0 - 2.0 * u.abs()).ln()
            }
            NoiseDistribution::Gaussian => {
                let sigma = (params.l1_sensitivity / params.epsilon)
                    * (2.0 * (1.25 / params.delta).ln()).sqrt();
                match Normal::new(0.0, sigma) {
                    Ok(normal) => normal.sample(&mut rng),
                    // Degenerate sigma (zero or non-finite) means no noise.
                    Err(_) => 0.0,
                }
            }
        };
        sample.round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(distribution: NoiseDistribution, epsilon: f64) -> PrivacyParams {
        PrivacyParams {
            distribution,
            epsilon,
            delta: 1e-5,
            l1_sensitivity: 4.0,
        }
    }

    #[test]
    fn laplace_noise_is_centered_and_scaled() {
        let applier = DpNoiseApplier::new();
        let p = params(NoiseDistribution::Laplace, 1.0);
        let n = 5_000;
        let sum: i64 = (0..n).map(|_| applier.sample(&p)).sum();
        let mean = sum as f64 / n as f64;
        // Mean of Laplace(0, 4) over 5k draws stays well inside +/- 1.
        assert!(mean.abs() < 1.0, "unexpected mean {mean}");
    }

    #[test]
    fn gaussian_noise_varies() {
        let applier = DpNoiseApplier::new();
        let p = params(NoiseDistribution::Gaussian, 0.5);
        let distinct: std::collections::HashSet<i64> =
            (0..100).map(|_| applier.sample(&p)).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn larger_epsilon_concentrates_laplace_noise() {
        let applier = DpNoiseApplier::new();
        let loose = params(NoiseDistribution::Laplace, 0.1);
        let tight = params(NoiseDistribution::Laplace, 10.0);
        let spread = |p: &PrivacyParams| -> f64 {
            let n = 2_000;
            (0..n).map(|_| applier.sample(p).abs() as f64).sum::<f64>() / n as f64
        };
        assert!(spread(&loose) > spread(&tight));
    }
}
