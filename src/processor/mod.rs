pub mod counters;
pub mod error;
pub mod job_result;
pub mod params;

pub use error::AggregationJobProcessError;
pub use params::JobParameters;

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::task::JoinSet;

use crate::blob::{BlobStorageClient, DataLocation};
use crate::budget::{PrivacyBudgetBridge, PrivacyBudgetError};
use crate::codec::avro_report::ReportShardReader;
use crate::decryption::{DecryptError, KeyFetchError, RecordDecrypter};
use crate::domain::OutputDomainProcessor;
use crate::engine::AggregationEngine;
use crate::model::error_counter::ErrorCounter;
use crate::model::job::{Job, JobResult};
use crate::model::return_code::ReturnCode;
use crate::noise::NoisedAggregationRunner;
use crate::result::ResultLogger;
use crate::validation::ValidatorChain;
use counters::ReportOutcomeCounters;

/// The per-job pipeline: shard discovery, parallel
/// decode/decrypt/validate/accumulate, domain join, noising, budget
/// consumption, result writing.
///
/// Collaborators are capability objects fixed at construction; one processor
/// instance serves one worker and is reused across jobs.
pub struct ConcurrentAggregationProcessor {
    pub blob: Arc<dyn BlobStorageClient>,
    pub decrypter: Arc<RecordDecrypter>,
    pub validators: Arc<ValidatorChain>,
    pub domain_processor: Arc<OutputDomainProcessor>,
    pub noised_runner: Arc<NoisedAggregationRunner>,
    pub budget_bridge: Arc<dyn PrivacyBudgetBridge>,
    pub result_logger: Arc<dyn ResultLogger>,
    pub default_error_threshold_percentage: f64,
}

impl ConcurrentAggregationProcessor {
    /// Processes one job to completion. Per-job failures come back as an
    /// `AggregationJobProcessError` carrying the return code; per-report
    /// errors are summarized in the returned `JobResult`.
    pub async fn process(&self, job: &Job) -> Result<JobResult, AggregationJobProcessError> {
        let params = JobParameters::parse(job, self.default_error_threshold_percentage)?;
        info!(
            "processing job {} (debug_run: {}, domain: {:?})",
            job.job_key, params.debug_run, params.output_domain
        );

        // Step 1: discover report shards.
        let reports_location = DataLocation::new(
            &job.request_info.input_data_bucket_name,
            &job.request_info.input_data_blob_prefix,
        );
        let shards = self.blob.list_blobs(&reports_location).await.map_err(|e| {
            AggregationJobProcessError::new(
                ReturnCode::InputDataReadFailed,
                format!("Exception while reading reports input data. Listing {reports_location} failed: {e}"),
            )
        })?;
        if shards.is_empty() {
            return Err(AggregationJobProcessError::new(
                ReturnCode::InputDataReadFailed,
                format!("No report shards found for location {reports_location}"),
            ));
        }

        // Step 2: fan shards out to parallel pipelines feeding one engine.
        let engine = Arc::new(AggregationEngine::new());
        let counters = Arc::new(ReportOutcomeCounters::new());
        let job_shared = Arc::new(job.clone());
        let mut pipelines = JoinSet::new();
        for shard in shards {
            pipelines.spawn(Self::process_shard(
                self.blob.clone(),
                self.decrypter.clone(),
                self.validators.clone(),
                engine.clone(),
                counters.clone(),
                job_shared.clone(),
                reports_location.with_key(&shard),
            ));
        }

        // Step 3: drain pipelines, re-checking the error threshold as each
        // shard completes. The first fatal outcome abandons the job.
        while let Some(joined) = pipelines.join_next().await {
            let outcome = joined.map_err(|e| {
                AggregationJobProcessError::new(
                    ReturnCode::InternalError,
                    format!("shard pipeline died: {e}"),
                )
            })?;
            if let Err(e) = outcome {
                pipelines.abort_all();
                return Err(e);
            }
            if counters.threshold_breached(params.report_error_threshold_percentage) {
                pipelines.abort_all();
                warn!(
                    "job {}: {} of {} reports errored, over the {}% threshold",
                    job.job_key,
                    counters.errors_seen(),
                    counters.records_seen(),
                    params.report_error_threshold_percentage
                );
                return Ok(job_result::build_job_result(
                    job,
                    ReturnCode::ReportsWithErrorsExceededThreshold,
                    job_result::RESULT_REPORTS_WITH_ERRORS_EXCEEDED_THRESHOLD_MESSAGE,
                    &counters,
                    0,
                ));
            }
        }

        if counters.all_reports_unsupported_version() {
            return Err(AggregationJobProcessError::new(
                ReturnCode::UnsupportedReportVersion,
                "none of the job's reports carry a shared_info.version this deployment supports",
            ));
        }

        // Step 4: optional domain read, then freeze the engine.
        let domain = match &params.output_domain {
            Some(location) => {
                let keys = self
                    .domain_processor
                    .read_domain(location)
                    .await
                    .map_err(|e| {
                        AggregationJobProcessError::new(
                            ReturnCode::InputDataReadFailed,
                            format!("Exception while reading domain input data. {e}"),
                        )
                    })?;
                Some(keys)
            }
            None => None,
        };
        let engine = Arc::try_unwrap(engine).map_err(|_| {
            AggregationJobProcessError::new(
                ReturnCode::InternalError,
                "aggregation engine still shared after pipeline drain",
            )
        })?;
        let snapshot = engine.into_snapshot();

        // Step 5: noising, thresholding, and the domain algebra.
        let noised = self.noised_runner.run(
            &snapshot,
            domain.as_ref(),
            params.debug_run,
            params.debug_privacy_epsilon,
        );

        // Step 6: debit privacy budget for the deduplicated unit set. Debug
        // runs survive budget failures with an override code.
        let mut debug_override: Option<ReturnCode> = None;
        let units = snapshot.units();
        if !units.is_empty() {
            match self
                .budget_bridge
                .consume_budget(&units, &params.attribution_report_to)
                .await
            {
                Ok(exhausted) if exhausted.is_empty() => {
                    debug!("consumed {} privacy budget units", units.len());
                }
                Ok(exhausted) => {
                    warn!(
                        "privacy budget exhausted for {} of {} units",
                        exhausted.len(),
                        units.len()
                    );
                    if params.debug_run {
                        debug_override = Some(ReturnCode::DebugSuccessWithPrivacyBudgetExhausted);
                    } else {
                        return Err(AggregationJobProcessError::new(
                            ReturnCode::PrivacyBudgetExhausted,
                            format!(
                                "insufficient privacy budget for {} of {} units",
                                exhausted.len(),
                                units.len()
                            ),
                        ));
                    }
                }
                Err(e) => {
                    if params.debug_run {
                        debug_override = Some(ReturnCode::DebugSuccessWithPrivacyBudgetError);
                    } else {
                        let code = match &e {
                            PrivacyBudgetError::Unauthenticated(_) => {
                                ReturnCode::PrivacyBudgetAuthenticationError
                            }
                            PrivacyBudgetError::Unauthorized(_) => {
                                ReturnCode::PrivacyBudgetAuthorizationError
                            }
                            PrivacyBudgetError::Transport(_) => ReturnCode::InternalError,
                        };
                        return Err(AggregationJobProcessError::new(code, e.to_string()));
                    }
                }
            }
        }

        // Step 7: write results. Debug runs write the annotated file too.
        self.result_logger
            .log_results(noised.summary, job, false)
            .await
            .map_err(|e| {
                AggregationJobProcessError::new(ReturnCode::ResultWriteError, e.to_string())
            })?;
        if params.debug_run {
            self.result_logger
                .log_results(noised.debug.unwrap_or_default(), job, true)
                .await
                .map_err(|e| {
                    AggregationJobProcessError::new(ReturnCode::ResultWriteError, e.to_string())
                })?;
        }

        let (code, message) = match debug_override {
            Some(code @ ReturnCode::DebugSuccessWithPrivacyBudgetExhausted) => {
                (code, job_result::RESULT_DEBUG_BUDGET_EXHAUSTED_MESSAGE)
            }
            Some(code) => (code, job_result::RESULT_DEBUG_BUDGET_ERROR_MESSAGE),
            None if counters.errors_seen() > 0 => (
                ReturnCode::SuccessWithErrors,
                job_result::RESULT_SUCCESS_WITH_ERRORS_MESSAGE,
            ),
            None => (ReturnCode::Success, job_result::RESULT_SUCCESS_MESSAGE),
        };
        info!("job {} finished with {code}", job.job_key);
        Ok(job_result::build_job_result(
            job,
            code,
            message,
            &counters,
            snapshot.saturated_sums(),
        ))
    }

    /// One shard's pipeline: read, decode, decrypt, validate, accumulate.
    /// Per-report failures are counted; only whole-job failures return Err.
    async fn process_shard(
        blob: Arc<dyn BlobStorageClient>,
        decrypter: Arc<RecordDecrypter>,
        validators: Arc<ValidatorChain>,
        engine: Arc<AggregationEngine>,
        counters: Arc<ReportOutcomeCounters>,
        job: Arc<Job>,
        shard: DataLocation,
    ) -> Result<(), AggregationJobProcessError> {
        let corrupt = |e: &dyn std::fmt::Display| {
            AggregationJobProcessError::new(
                ReturnCode::InputDataReadFailed,
                format!("Exception while reading reports input data. Shard {shard} unreadable: {e}"),
            )
        };

        let bytes = blob.read_blob(&shard).await.map_err(|e| corrupt(&e))?;
        let reader = ReportShardReader::new(&bytes).map_err(|e| corrupt(&e))?;
        for record in reader {
            let encrypted = record.map_err(|e| corrupt(&e))?;
            counters.record_seen();
            match decrypter.decrypt(&encrypted).await {
                Ok(report) => match validators.validate(&report, &job) {
                    Ok(()) => engine.accept(&report),
                    Err(counter) => counters.record_error(counter),
                },
                Err(DecryptError::Decryption(message)) => {
                    debug!("report in {shard} failed to decrypt: {message}");
                    counters.record_error(ErrorCounter::DecryptionError);
                }
                Err(DecryptError::KeyFetch(e @ KeyFetchError::PermissionDenied { .. })) => {
                    return Err(AggregationJobProcessError::new(
                        ReturnCode::PermissionError,
                        e.to_string(),
                    ));
                }
                Err(DecryptError::KeyFetch(e @ KeyFetchError::Unavailable(_))) => {
                    return Err(AggregationJobProcessError::new(
                        ReturnCode::InternalError,
                        e.to_string(),
                    ));
                }
                Err(DecryptError::KeyFetch(KeyFetchError::Service(message))) => {
                    debug!("key service failed for a report in {shard}: {message}");
                    counters.record_error(ErrorCounter::ServiceError);
                }
            }
        }
        debug!("drained shard {shard}");
        Ok(())
    }
}
