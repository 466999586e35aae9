use std::sync::Arc;

use log::debug;

use super::{derive_threshold, NoiseApplier, PrivacyParams};
use crate::engine::AggregationSnapshot;
use crate::model::fact::{AggregatedFact, DebugBucketAnnotation};
use crate::util::hashmap::{HashMap, HashSet};

/// Summary facts and, for debug runs, the annotated debug facts.
#[derive(Debug, Default)]
pub struct NoisedResult {
    pub summary: Vec<AggregatedFact>,
    pub debug: Option<Vec<AggregatedFact>>,
}

/// Applies the domain join, additive noise, and thresholding to a frozen
/// aggregation snapshot.
pub struct NoisedAggregationRunner {
    noise_applier: Arc<dyn NoiseApplier>,
    params: PrivacyParams,
    /// Test seam: fixed threshold instead of the derived one.
    threshold_override: Option<f64>,
    domain_optional: bool,
    thresholding_enabled: bool,
}

impl NoisedAggregationRunner {
    pub fn new(
        noise_applier: Arc<dyn NoiseApplier>,
        params: PrivacyParams,
        threshold_override: Option<f64>,
        domain_optional: bool,
        thresholding_enabled: bool,
    ) -> Self {
        Self {
            noise_applier,
            params,
            threshold_override,
            domain_optional,
            thresholding_enabled,
        }
    }

    /// Runs the noising algebra. `debug_epsilon` is the already-validated
    /// `debug_privacy_epsilon` override, if the job carried one.
    pub fn run(
        &self,
        snapshot: &AggregationSnapshot,
        domain: Option<&HashSet<u128>>,
        debug_run: bool,
        debug_epsilon: Option<f64>,
    ) -> NoisedResult {
        let params = match debug_epsilon {
            Some(epsilon) => self.params.with_epsilon(epsilon),
            None => self.params,
        };
        let threshold = self
            .threshold_override
            .unwrap_or_else(|| derive_threshold(&params));

        let keys_in_reports = snapshot.bucket_keys();
        let empty = HashSet::default();
        let keys_in_domain = domain.unwrap_or(&empty);

        // One draw per bucket, shared between summary and debug outputs.
        let mut noise: HashMap<u128, i64> = HashMap::default();
        let mut noise_for = |bucket: u128, applier: &dyn NoiseApplier| -> i64 {
            *noise
                .entry(bucket)
                .or_insert_with(|| applier.sample(&params))
        };

        let unnoised = |bucket: u128| snapshot.sum(bucket).unwrap_or(0);
        let passes_threshold = |unnoised_value: u64, noise_value: i64| -> bool {
            !self.thresholding_enabled
                || unnoised_value as f64 + noise_value as f64 >= threshold
        };

        let mut summary = Vec::new();
        let mut push_fact = |bucket: u128, thresholded: bool, applier: &dyn NoiseApplier,
                             out: &mut Vec<AggregatedFact>| {
            let unnoised_value = unnoised(bucket);
            let noise_value = noise_for(bucket, applier);
            if thresholded && !passes_threshold(unnoised_value, noise_value) {
                return;
            }
            out.push(AggregatedFact::new(
                bucket,
                clamp_metric(unnoised_value, noise_value),
                unnoised_value,
            ));
        };

        if domain.is_some() {
            for &bucket in keys_in_domain {
                // BOTH and DOMAIN_ONLY: never thresholded away.
                push_fact(bucket, false, self.noise_applier.as_ref(), &mut summary);
            }
            if self.domain_optional {
                for &bucket in keys_in_reports.difference(keys_in_domain) {
                    push_fact(bucket, true, self.noise_applier.as_ref(), &mut summary);
                }
            }
        } else {
            for &bucket in &keys_in_reports {
                push_fact(bucket, true, self.noise_applier.as_ref(), &mut summary);
            }
        }

        let debug = debug_run.then(|| {
            let mut facts = Vec::new();
            for &bucket in keys_in_reports.union(keys_in_domain) {
                let mut annotations = Vec::new();
                if keys_in_reports.contains(&bucket) {
                    annotations.push(DebugBucketAnnotation::InReports);
                }
                if keys_in_domain.contains(&bucket) {
                    annotations.push(DebugBucketAnnotation::InDomain);
                }
                let unnoised_value = unnoised(bucket);
                let noise_value = noise_for(bucket, self.noise_applier.as_ref());
                facts.push(AggregatedFact::with_annotations(
                    bucket,
                    clamp_metric(unnoised_value, noise_value),
                    unnoised_value,
                    annotations,
                ));
            }
            facts
        });

        debug!(
            "noised {} summary facts ({} debug facts) at threshold {threshold}",
            summary.len(),
            debug.as_ref().map(Vec::len).unwrap_or(0),
        );
        NoisedResult { summary, debug }
    }
}

/// `metric = clamp_to_i64(unnoised + noise)`.
fn clamp_metric(unnoised: u64, noise: i64) -> i64 {
    let noised = unnoised as i128 + noise as i128;
    noised.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::engine::AggregationEngine;
    use crate::noise::NoiseDistribution;
    use crate::testing::constant_noise::ConstantNoiseApplier;
    use crate::testing::report_generator::fake_report;

    fn laplace_params() -> PrivacyParams {
        PrivacyParams {
            distribution: NoiseDistribution::Laplace,
            epsilon: 0.1,
            delta: 1e-5,
            l1_sensitivity: 4.0,
        }
    }

    fn snapshot_with(reports: &[(u32, &str)]) -> AggregationSnapshot {
        let engine = AggregationEngine::new();
        for (param, id) in reports {
            engine.accept(&fake_report(*param, id));
            engine.accept(&fake_report(*param, &format!("{id}-dup")));
        }
        engine.into_snapshot()
    }

    fn runner(noise: i64, domain_optional: bool, thresholding: bool) -> NoisedAggregationRunner {
        NoisedAggregationRunner::new(
            Arc::new(ConstantNoiseApplier::new(noise)),
            laplace_params(),
            Some(0.0),
            domain_optional,
            thresholding,
        )
    }

    fn sorted(mut facts: Vec<AggregatedFact>) -> Vec<AggregatedFact> {
        facts.sort_by_key(|f| f.bucket);
        facts
    }

    #[test]
    fn no_domain_no_noise_keeps_all_buckets() {
        let snapshot = snapshot_with(&[(1, "a"), (2, "b")]);
        let result = runner(0, true, true).run(&snapshot, None, false, None);
        assert_eq!(
            sorted(result.summary),
            vec![AggregatedFact::new(1, 2, 2), AggregatedFact::new(2, 8, 8)]
        );
        assert!(result.debug.is_none());
    }

    #[test]
    fn negative_noise_thresholds_small_buckets() {
        let snapshot = snapshot_with(&[(1, "a"), (2, "b")]);
        let result = runner(-3, true, true).run(&snapshot, None, false, None);
        assert_eq!(sorted(result.summary), vec![AggregatedFact::new(2, 5, 8)]);
    }

    #[test]
    fn thresholding_disabled_keeps_small_buckets() {
        let snapshot = snapshot_with(&[(1, "a"), (2, "b")]);
        let result = runner(-3, true, false).run(&snapshot, None, false, None);
        assert_eq!(
            sorted(result.summary),
            vec![AggregatedFact::new(1, -1, 2), AggregatedFact::new(2, 5, 8)]
        );
    }

    #[test]
    fn domain_only_buckets_are_added_at_zero() {
        let snapshot = snapshot_with(&[(1, "a"), (2, "b")]);
        let domain: HashSet<u128> = [3u128].into_iter().collect();
        let result = runner(0, true, true).run(&snapshot, Some(&domain), false, None);
        assert_eq!(
            sorted(result.summary),
            vec![
                AggregatedFact::new(1, 2, 2),
                AggregatedFact::new(2, 8, 8),
                AggregatedFact::new(3, 0, 0),
            ]
        );
    }

    #[test]
    fn domain_buckets_are_never_thresholded() {
        let snapshot = snapshot_with(&[(1, "a"), (2, "b")]);
        let domain: HashSet<u128> = [2u128, 3].into_iter().collect();
        let result = runner(-3, true, true).run(&snapshot, Some(&domain), false, None);
        // Bucket 1 (reports-only) drops: 2 - 3 < 0. Buckets 2 and 3 stay.
        assert_eq!(
            sorted(result.summary),
            vec![AggregatedFact::new(2, 5, 8), AggregatedFact::new(3, -3, 0)]
        );
    }

    #[test]
    fn strict_domain_drops_report_only_buckets() {
        let snapshot = snapshot_with(&[(1, "a"), (2, "b")]);
        let domain: HashSet<u128> = [2u128].into_iter().collect();
        let result = runner(0, false, true).run(&snapshot, Some(&domain), false, None);
        assert_eq!(sorted(result.summary), vec![AggregatedFact::new(2, 8, 8)]);
    }

    #[test]
    fn debug_run_annotates_membership() {
        let snapshot = snapshot_with(&[(1, "a"), (2, "b")]);
        let domain: HashSet<u128> = [2u128, 3].into_iter().collect();
        let result = runner(-3, true, true).run(&snapshot, Some(&domain), true, None);
        let debug = sorted(result.debug.unwrap());
        assert_eq!(
            debug,
            vec![
                AggregatedFact::with_annotations(
                    1,
                    -1,
                    2,
                    vec![DebugBucketAnnotation::InReports]
                ),
                AggregatedFact::with_annotations(
                    2,
                    5,
                    8,
                    vec![
                        DebugBucketAnnotation::InReports,
                        DebugBucketAnnotation::InDomain
                    ]
                ),
                AggregatedFact::with_annotations(3, -3, 0, vec![DebugBucketAnnotation::InDomain]),
            ]
        );
    }

    /// Applier whose draws are all distinct, to prove each bucket's draw is
    /// reused across summary and debug outputs.
    struct SequenceNoiseApplier(Mutex<i64>);

    impl NoiseApplier for SequenceNoiseApplier {
        fn sample(&self, _params: &PrivacyParams) -> i64 {
            let mut next = self.0.lock().unwrap();
            *next += 1;
            *next
        }
    }

    #[test]
    fn noise_draw_is_shared_between_summary_and_debug() {
        let snapshot = snapshot_with(&[(1, "a"), (2, "b")]);
        let domain: HashSet<u128> = [3u128].into_iter().collect();
        let runner = NoisedAggregationRunner::new(
            Arc::new(SequenceNoiseApplier(Mutex::new(0))),
            laplace_params(),
            Some(f64::MIN),
            true,
            true,
        );
        let result = runner.run(&snapshot, Some(&domain), true, None);
        let debug = result.debug.unwrap();
        for fact in &result.summary {
            let twin = debug.iter().find(|d| d.bucket == fact.bucket).unwrap();
            assert_eq!(twin.metric, fact.metric, "bucket {}", fact.bucket);
        }
    }

    #[test]
    fn metric_is_clamped_to_i64() {
        assert_eq!(clamp_metric(u64::MAX, i64::MAX), i64::MAX);
        assert_eq!(clamp_metric(0, i64::MIN), i64::MIN);
        assert_eq!(clamp_metric(2, -3), -1);
    }

    #[test]
    fn debug_epsilon_override_changes_derived_threshold() {
        // Bucket 3 sums to 18: below the derived threshold for epsilon 0.1
        // (hundreds), above the one for epsilon 64 (under 5).
        let snapshot = snapshot_with(&[(3, "a")]);
        let runner = NoisedAggregationRunner::new(
            Arc::new(ConstantNoiseApplier::new(0)),
            laplace_params(),
            None,
            true,
            true,
        );
        let strict = runner.run(&snapshot, None, false, None);
        assert!(strict.summary.is_empty());
        let relaxed = runner.run(&snapshot, None, false, Some(64.0));
        assert!(!relaxed.summary.is_empty());
    }
}
