use core::fmt;

/// Categories for per-report errors and other counted conditions surfaced in
/// the job's error summary. Per-report counters also feed the
/// `NumReportsWithErrors` total; bookkeeping counters do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCounter {
    /// Ciphertext, associated data, or payload could not be decrypted/parsed.
    DecryptionError,

    /// The decryption key service failed for a reason that is not fatal for
    /// the job.
    ServiceError,

    /// The report's shared_info.version major is not supported.
    UnsupportedReportVersion,

    /// A validator in the chain rejected the report.
    ValidationRejected,

    /// Bookkeeping: a bucket's contribution sum hit the u64 ceiling and was
    /// capped.
    ContributionSumSaturated,

    /// Total number of reports that failed with any per-report error.
    NumReportsWithErrors,
}

impl ErrorCounter {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCounter::DecryptionError => "DECRYPTION_ERROR",
            ErrorCounter::ServiceError => "SERVICE_ERROR",
            ErrorCounter::UnsupportedReportVersion => "UNSUPPORTED_REPORT_VERSION",
            ErrorCounter::ValidationRejected => "VALIDATION_REJECTED",
            ErrorCounter::ContributionSumSaturated => "CONTRIBUTION_SUM_SATURATED",
            ErrorCounter::NumReportsWithErrors => "NUM_REPORTS_WITH_ERRORS",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCounter::DecryptionError => "Report could not be decrypted.",
            ErrorCounter::ServiceError => {
                "Report could not be processed because of a key service error."
            }
            ErrorCounter::UnsupportedReportVersion => {
                "Report shared_info.version is not supported."
            }
            ErrorCounter::ValidationRejected => "Report was rejected by validation.",
            ErrorCounter::ContributionSumSaturated => {
                "Bucket contribution sum exceeded the representable maximum and was capped."
            }
            ErrorCounter::NumReportsWithErrors => "Total number of reports with errors.",
        }
    }
}

impl fmt::Display for ErrorCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
