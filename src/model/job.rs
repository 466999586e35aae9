use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Job parameter keys understood by the aggregation processor.
pub const JOB_PARAM_ATTRIBUTION_REPORT_TO: &str = "attribution_report_to";
pub const JOB_PARAM_OUTPUT_DOMAIN_BUCKET_NAME: &str = "output_domain_bucket_name";
pub const JOB_PARAM_OUTPUT_DOMAIN_BLOB_PREFIX: &str = "output_domain_blob_prefix";
pub const JOB_PARAM_DEBUG_RUN: &str = "debug_run";
pub const JOB_PARAM_DEBUG_PRIVACY_EPSILON: &str = "debug_privacy_epsilon";
pub const JOB_PARAM_REPORT_ERROR_THRESHOLD_PERCENTAGE: &str =
    "report_error_threshold_percentage";

/// One leased aggregation job. Intake and leasing happen outside this crate;
/// this is the view the processor needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub job_key: String,
    pub request_info: RequestInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestInfo {
    pub input_data_bucket_name: String,
    pub input_data_blob_prefix: String,
    pub output_data_bucket_name: String,
    pub output_data_blob_prefix: String,
    pub job_parameters: HashMap<String, String>,
}

impl Job {
    /// Looks up a job parameter, treating a present-but-empty value the same
    /// as an absent one.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.raw_parameter(key).filter(|v| !v.is_empty())
    }

    /// Looks up a job parameter, keeping present-but-empty values distinct
    /// from absent ones. The output-domain pair needs this: an empty blob
    /// prefix is a valid prefix.
    pub fn raw_parameter(&self, key: &str) -> Option<&str> {
        self.request_info
            .job_parameters
            .get(key)
            .map(String::as_str)
    }
}

/// Outcome of one processed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub job_key: String,
    pub result_info: ResultInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultInfo {
    pub return_code: String,
    pub return_message: String,
    pub finished_at: DateTime<Utc>,
    pub error_summary: ErrorSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorSummary {
    pub error_counts: Vec<ErrorCount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCount {
    pub category: String,
    pub description: String,
    pub count: u64,
}
