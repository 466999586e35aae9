use super::error::AggregationJobProcessError;
use crate::blob::DataLocation;
use crate::model::job::{
    Job, JOB_PARAM_ATTRIBUTION_REPORT_TO, JOB_PARAM_DEBUG_PRIVACY_EPSILON, JOB_PARAM_DEBUG_RUN,
    JOB_PARAM_OUTPUT_DOMAIN_BLOB_PREFIX, JOB_PARAM_OUTPUT_DOMAIN_BUCKET_NAME,
    JOB_PARAM_REPORT_ERROR_THRESHOLD_PERCENTAGE,
};
use crate::model::return_code::ReturnCode;
use crate::noise::EPSILON_MAX;

/// Validated view of the job parameter map. Parsing happens before any I/O,
/// so an invalid job fails without side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct JobParameters {
    pub attribution_report_to: String,
    pub output_domain: Option<DataLocation>,
    pub debug_run: bool,
    pub debug_privacy_epsilon: Option<f64>,
    pub report_error_threshold_percentage: f64,
}

impl JobParameters {
    pub fn parse(
        job: &Job,
        default_error_threshold_percentage: f64,
    ) -> Result<Self, AggregationJobProcessError> {
        let invalid = |message: String| {
            AggregationJobProcessError::new(ReturnCode::InvalidJob, message)
        };

        let attribution_report_to = job
            .parameter(JOB_PARAM_ATTRIBUTION_REPORT_TO)
            .ok_or_else(|| {
                invalid(format!(
                    "missing required job parameter {JOB_PARAM_ATTRIBUTION_REPORT_TO}"
                ))
            })?
            .to_string();

        // The domain location comes as a pair or not at all. The prefix may
        // legitimately be empty, so presence is checked on the raw keys.
        let output_domain = match (
            job.raw_parameter(JOB_PARAM_OUTPUT_DOMAIN_BUCKET_NAME),
            job.raw_parameter(JOB_PARAM_OUTPUT_DOMAIN_BLOB_PREFIX),
        ) {
            (None, None) => None,
            (Some(bucket), Some(prefix)) => {
                if bucket.is_empty() {
                    return Err(invalid(format!(
                        "{JOB_PARAM_OUTPUT_DOMAIN_BUCKET_NAME} must not be empty"
                    )));
                }
                Some(DataLocation::new(bucket, prefix))
            }
            _ => {
                return Err(invalid(format!(
                    "{JOB_PARAM_OUTPUT_DOMAIN_BUCKET_NAME} and \
                     {JOB_PARAM_OUTPUT_DOMAIN_BLOB_PREFIX} must be supplied together"
                )))
            }
        };

        let debug_run = job
            .parameter(JOB_PARAM_DEBUG_RUN)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        // An unparsable value is tolerated and ignored; a parsable value
        // outside (0, EPSILON_MAX] invalidates the job.
        let debug_privacy_epsilon = match job
            .parameter(JOB_PARAM_DEBUG_PRIVACY_EPSILON)
            .map(str::parse::<f64>)
        {
            None => None,
            Some(Err(_)) => None,
            Some(Ok(epsilon)) if epsilon > 0.0 && epsilon <= EPSILON_MAX => Some(epsilon),
            Some(Ok(epsilon)) => {
                return Err(invalid(format!(
                    "{JOB_PARAM_DEBUG_PRIVACY_EPSILON} must be in (0, {EPSILON_MAX}], \
                     got {epsilon}"
                )))
            }
        };

        let report_error_threshold_percentage =
            match job.parameter(JOB_PARAM_REPORT_ERROR_THRESHOLD_PERCENTAGE) {
                None => default_error_threshold_percentage,
                Some(raw) => match raw.parse::<f64>() {
                    Ok(pct) if (0.0..=100.0).contains(&pct) => pct,
                    _ => {
                        return Err(invalid(format!(
                            "{JOB_PARAM_REPORT_ERROR_THRESHOLD_PERCENTAGE} must be a \
                             percentage in [0, 100], got {raw:?}"
                        )))
                    }
                },
            };

        Ok(Self {
            attribution_report_to,
            output_domain,
            debug_run,
            debug_privacy_epsilon,
            report_error_threshold_percentage,
        })
    }
}
