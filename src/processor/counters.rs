use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::model::error_counter::ErrorCounter;
use crate::util::hashmap::HashMap;

/// Shared per-record outcome bookkeeping for the parallel phase. Every
/// record is counted once; per-report errors are charged to exactly one
/// counter.
#[derive(Debug, Default)]
pub struct ReportOutcomeCounters {
    counts: Mutex<HashMap<ErrorCounter, u64>>,
    records_seen: AtomicU64,
    errors_seen: AtomicU64,
}

impl ReportOutcomeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_seen(&self) {
        self.records_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self, counter: ErrorCounter) {
        let mut counts = self.counts.lock().expect("error counts poisoned");
        *counts.entry(counter).or_default() += 1;
        self.errors_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn records_seen(&self) -> u64 {
        self.records_seen.load(Ordering::Relaxed)
    }

    pub fn errors_seen(&self) -> u64 {
        self.errors_seen.load(Ordering::Relaxed)
    }

    pub fn counts(&self) -> HashMap<ErrorCounter, u64> {
        self.counts.lock().expect("error counts poisoned").clone()
    }

    /// Early-exit rule: too many errors relative to records seen so far.
    pub fn threshold_breached(&self, threshold_percentage: f64) -> bool {
        let errors = self.errors_seen() as f64;
        let seen = self.records_seen() as f64;
        errors * 100.0 > threshold_percentage * seen
    }

    /// True when the job saw reports and every one of them failed the
    /// version gate.
    pub fn all_reports_unsupported_version(&self) -> bool {
        let seen = self.records_seen();
        seen > 0
            && self
                .counts
                .lock()
                .expect("error counts poisoned")
                .get(&ErrorCounter::UnsupportedReportVersion)
                .copied()
                .unwrap_or(0)
                == seen
    }
}
