pub mod report_version;

pub use report_version::{ReportVersionValidator, LATEST_VERSION};

use crate::model::error_counter::ErrorCounter;
use crate::model::job::Job;
use crate::model::report::Report;

/// One predicate over a decrypted report. A failing validator names the
/// error counter to charge the report against.
pub trait ReportValidator: Send + Sync {
    fn validate(&self, report: &Report, job: &Job) -> Result<(), ErrorCounter>;
}

impl<V: ReportValidator + ?Sized> ReportValidator for std::sync::Arc<V> {
    fn validate(&self, report: &Report, job: &Job) -> Result<(), ErrorCounter> {
        (**self).validate(report, job)
    }
}

/// Ordered list of validators; the first failure wins and the rest are not
/// consulted.
pub struct ValidatorChain {
    validators: Vec<Box<dyn ReportValidator>>,
}

impl ValidatorChain {
    pub fn new(validators: Vec<Box<dyn ReportValidator>>) -> Self {
        Self { validators }
    }

    pub fn validate(&self, report: &Report, job: &Job) -> Result<(), ErrorCounter> {
        for validator in &self.validators {
            validator.validate(report, job)?;
        }
        Ok(())
    }
}
