use std::sync::Mutex;

use crate::model::error_counter::ErrorCounter;
use crate::model::job::Job;
use crate::model::report::Report;
use crate::util::hashmap::HashSet;
use crate::validation::ReportValidator;

/// Validator that rejects reports by report id.
#[derive(Default)]
pub struct FakeValidator {
    reject_ids: Mutex<HashSet<String>>,
}

impl FakeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reject_ids(&self, ids: impl IntoIterator<Item = String>) {
        *self.reject_ids.lock().expect("reject set poisoned") = ids.into_iter().collect();
    }
}

impl ReportValidator for FakeValidator {
    fn validate(&self, report: &Report, _job: &Job) -> Result<(), ErrorCounter> {
        if self
            .reject_ids
            .lock()
            .expect("reject set poisoned")
            .contains(&report.shared_info.report_id)
        {
            Err(ErrorCounter::ValidationRejected)
        } else {
            Ok(())
        }
    }
}
