use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use log::warn;

use crate::budget::{derive_budget_unit, PrivacyBudgetUnit};
use crate::model::report::Report;
use crate::util::hashmap::{HashMap, HashSet};

/// Number of internal stripes. Must be a power of two; bucket low bits pick
/// the stripe.
const DEFAULT_STRIPES: usize = 16;

/// Running aggregate for one bucket: the saturating contribution sum and the
/// budget units covering those contributions.
#[derive(Debug, Default, Clone)]
pub struct BucketAggregate {
    pub sum: u64,
    pub units: HashSet<PrivacyBudgetUnit>,
}

impl BucketAggregate {
    /// Adds a contribution value, capping at the u64 ceiling. Returns true
    /// when the addition saturated.
    fn add(&mut self, value: u64) -> bool {
        match self.sum.checked_add(value) {
            Some(sum) => {
                self.sum = sum;
                false
            }
            None => {
                self.sum = u64::MAX;
                true
            }
        }
    }
}

/// Multi-writer accumulator for the parallel aggregation phase: bucket →
/// (sum, budget units), sharded into independently locked stripes so
/// concurrent shard pipelines rarely contend.
#[derive(Debug)]
pub struct AggregationEngine {
    stripes: Vec<Mutex<HashMap<u128, BucketAggregate>>>,
    saturated_sums: AtomicU64,
}

impl AggregationEngine {
    pub fn new() -> Self {
        Self::with_stripes(DEFAULT_STRIPES)
    }

    pub fn with_stripes(stripes: usize) -> Self {
        assert!(stripes.is_power_of_two(), "stripe count must be a power of two");
        Self {
            stripes: (0..stripes).map(|_| Mutex::new(HashMap::default())).collect(),
            saturated_sums: AtomicU64::new(0),
        }
    }

    fn stripe_for(&self, bucket: u128) -> &Mutex<HashMap<u128, BucketAggregate>> {
        let index = (bucket as usize) & (self.stripes.len() - 1);
        &self.stripes[index]
    }

    /// Accumulates every contribution of an accepted report. The report's
    /// budget unit is derived once and attached to each touched bucket.
    pub fn accept(&self, report: &Report) {
        let unit = derive_budget_unit(&report.shared_info);
        for contribution in &report.payload.contributions {
            self.accept_contribution(contribution.bucket, u64::from(contribution.value), &unit);
        }
    }

    fn accept_contribution(&self, bucket: u128, value: u64, unit: &PrivacyBudgetUnit) {
        let mut stripe = self.stripe_for(bucket).lock().expect("engine stripe poisoned");
        let aggregate = stripe.entry(bucket).or_default();
        if aggregate.add(value) {
            self.saturated_sums.fetch_add(1, Ordering::Relaxed);
            warn!("contribution sum for bucket {bucket} saturated");
        }
        aggregate.units.insert(unit.clone());
    }

    /// Freezes the engine into its single logical view. Callable only once
    /// every writer is done, which exclusive ownership enforces.
    pub fn into_snapshot(self) -> AggregationSnapshot {
        let mut buckets: HashMap<u128, BucketAggregate> = HashMap::default();
        for stripe in self.stripes {
            let stripe = stripe.into_inner().expect("engine stripe poisoned");
            buckets.extend(stripe);
        }
        AggregationSnapshot {
            buckets,
            saturated_sums: self.saturated_sums.into_inner(),
        }
    }
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the aggregation state after the parallel phase.
#[derive(Debug, Default)]
pub struct AggregationSnapshot {
    buckets: HashMap<u128, BucketAggregate>,
    saturated_sums: u64,
}

impl AggregationSnapshot {
    /// Non-empty bucket keys, in no particular order.
    pub fn bucket_keys(&self) -> HashSet<u128> {
        self.buckets.keys().copied().collect()
    }

    pub fn sum(&self, bucket: u128) -> Option<u64> {
        self.buckets.get(&bucket).map(|a| a.sum)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The deduplicated union of all buckets' unit sets.
    pub fn units(&self) -> Vec<PrivacyBudgetUnit> {
        let mut seen: HashSet<&PrivacyBudgetUnit> = HashSet::default();
        let mut units = Vec::new();
        for aggregate in self.buckets.values() {
            for unit in &aggregate.units {
                if seen.insert(unit) {
                    units.push(unit.clone());
                }
            }
        }
        units
    }

    /// Count of bucket sums that hit the u64 ceiling.
    pub fn saturated_sums(&self) -> u64 {
        self.saturated_sums
    }
}
