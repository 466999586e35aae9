use std::fmt;

/// Per-bucket annotation emitted on debug-run outputs, recording which side
/// of the domain join the bucket came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugBucketAnnotation {
    InReports,
    InDomain,
}

impl DebugBucketAnnotation {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebugBucketAnnotation::InReports => "IN_REPORTS",
            DebugBucketAnnotation::InDomain => "IN_DOMAIN",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "IN_REPORTS" => Some(DebugBucketAnnotation::InReports),
            "IN_DOMAIN" => Some(DebugBucketAnnotation::InDomain),
            _ => None,
        }
    }
}

impl fmt::Display for DebugBucketAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output row: a bucket with its noised and unnoised sums. Debug-run
/// facts additionally carry domain-membership annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedFact {
    pub bucket: u128,
    pub metric: i64,
    pub unnoised_metric: u64,
    pub debug_annotations: Option<Vec<DebugBucketAnnotation>>,
}

impl AggregatedFact {
    pub fn new(bucket: u128, metric: i64, unnoised_metric: u64) -> Self {
        Self {
            bucket,
            metric,
            unnoised_metric,
            debug_annotations: None,
        }
    }

    pub fn with_annotations(
        bucket: u128,
        metric: i64,
        unnoised_metric: u64,
        annotations: Vec<DebugBucketAnnotation>,
    ) -> Self {
        Self {
            bucket,
            metric,
            unnoised_metric,
            debug_annotations: Some(annotations),
        }
    }
}
