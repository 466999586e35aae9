use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::model::fact::AggregatedFact;
use crate::model::job::Job;
use crate::result::{ResultLogError, ResultLogger};

/// Result logger that materializes facts in memory instead of uploading
/// them. Facts are stored sorted by bucket, mirroring the on-disk order.
#[derive(Default)]
pub struct InMemoryResultLogger {
    summary: Mutex<Option<Vec<AggregatedFact>>>,
    debug: Mutex<Option<Vec<AggregatedFact>>>,
    should_fail: AtomicBool,
}

impl InMemoryResultLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent log call fail.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Materialized summary facts; `None` until a summary was logged.
    pub fn summary_facts(&self) -> Option<Vec<AggregatedFact>> {
        self.summary.lock().expect("summary poisoned").clone()
    }

    /// Materialized debug facts; `None` until a debug file was logged.
    pub fn debug_facts(&self) -> Option<Vec<AggregatedFact>> {
        self.debug.lock().expect("debug poisoned").clone()
    }

    pub fn has_logged(&self) -> bool {
        self.summary_facts().is_some() || self.debug_facts().is_some()
    }
}

#[async_trait]
impl ResultLogger for InMemoryResultLogger {
    async fn log_results(
        &self,
        mut facts: Vec<AggregatedFact>,
        _job: &Job,
        debug_run: bool,
    ) -> Result<(), ResultLogError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(ResultLogError::Other("forced by test".to_string()));
        }
        facts.sort_by_key(|fact| fact.bucket);
        let slot = if debug_run { &self.debug } else { &self.summary };
        *slot.lock().expect("result slot poisoned") = Some(facts);
        Ok(())
    }
}
