use log::warn;

use super::ReportValidator;
use crate::model::error_counter::ErrorCounter;
use crate::model::job::Job;
use crate::model::report::Report;

/// Latest shared_info version emitted by clients this deployment supports.
pub const LATEST_VERSION: &str = "0.1";

/// Major version this deployment accepts. Minor bumps are compatible by
/// contract; a different major is not.
const SUPPORTED_MAJOR: u64 = 0;

/// Rejects reports whose `shared_info.version` major part differs from the
/// supported major.
#[derive(Debug, Default)]
pub struct ReportVersionValidator;

impl ReportVersionValidator {
    pub fn new() -> Self {
        Self
    }
}

fn major_version(version: &str) -> Option<u64> {
    version.split('.').next()?.parse().ok()
}

impl ReportValidator for ReportVersionValidator {
    fn validate(&self, report: &Report, _job: &Job) -> Result<(), ErrorCounter> {
        match major_version(&report.shared_info.version) {
            Some(SUPPORTED_MAJOR) => Ok(()),
            _ => {
                warn!(
                    "report {} carries unsupported shared_info.version {:?}",
                    report.shared_info.report_id, report.shared_info.version
                );
                Err(ErrorCounter::UnsupportedReportVersion)
            }
        }
    }
}
