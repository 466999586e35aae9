use chrono::Utc;

use super::counters::ReportOutcomeCounters;
use crate::model::error_counter::ErrorCounter;
use crate::model::job::{ErrorCount, ErrorSummary, Job, JobResult, ResultInfo};
use crate::model::return_code::ReturnCode;

pub const RESULT_SUCCESS_MESSAGE: &str = "Aggregation job successfully processed";
pub const RESULT_SUCCESS_WITH_ERRORS_MESSAGE: &str =
    "Aggregation job successfully processed but some reports have errors.";
pub const RESULT_REPORTS_WITH_ERRORS_EXCEEDED_THRESHOLD_MESSAGE: &str =
    "Aggregation job failed early because the number of erroring reports exceeded the \
     configured threshold.";
pub const RESULT_DEBUG_BUDGET_EXHAUSTED_MESSAGE: &str =
    "Debug run completed, but privacy budget was exhausted and none was consumed.";
pub const RESULT_DEBUG_BUDGET_ERROR_MESSAGE: &str =
    "Debug run completed, but the privacy budget service failed and no budget was consumed.";

/// Builds the error summary: per-report counters ordered by name, then the
/// saturation bookkeeping counter, then the reports-with-errors total.
pub fn build_error_summary(counters: &ReportOutcomeCounters, saturated_sums: u64) -> ErrorSummary {
    let mut entries: Vec<(ErrorCounter, u64)> = counters
        .counts()
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .collect();
    entries.sort_by_key(|(counter, _)| counter.name());

    let mut error_counts: Vec<ErrorCount> = entries
        .into_iter()
        .map(|(counter, count)| ErrorCount {
            category: counter.name().to_string(),
            description: counter.description().to_string(),
            count,
        })
        .collect();

    if saturated_sums > 0 {
        error_counts.push(ErrorCount {
            category: ErrorCounter::ContributionSumSaturated.name().to_string(),
            description: ErrorCounter::ContributionSumSaturated
                .description()
                .to_string(),
            count: saturated_sums,
        });
    }

    let errors_seen = counters.errors_seen();
    if errors_seen > 0 {
        error_counts.push(ErrorCount {
            category: ErrorCounter::NumReportsWithErrors.name().to_string(),
            description: ErrorCounter::NumReportsWithErrors.description().to_string(),
            count: errors_seen,
        });
    }

    ErrorSummary { error_counts }
}

pub fn build_job_result(
    job: &Job,
    code: ReturnCode,
    message: &str,
    counters: &ReportOutcomeCounters,
    saturated_sums: u64,
) -> JobResult {
    JobResult {
        job_key: job.job_key.clone(),
        result_info: ResultInfo {
            return_code: code.as_str().to_string(),
            return_message: message.to_string(),
            finished_at: Utc::now(),
            error_summary: build_error_summary(counters, saturated_sums),
        },
    }
}
