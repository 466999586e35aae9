use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use super::fake_key_service::FakeDecryptionKeyService;
use crate::codec::{payload, shared_info};
use crate::decryption::hybrid::HybridCipherError;
use crate::model::job::{Job, RequestInfo, JOB_PARAM_ATTRIBUTION_REPORT_TO};
use crate::model::report::{Contribution, EncryptedReport, Payload, Report, SharedInfo};
use crate::validation::LATEST_VERSION;

/// Reporting origin every generated report carries; also the default
/// `attribution_report_to` of generated jobs.
pub const FAKE_REPORTING_ORIGIN: &str = "https://adtech.example";

/// Generates a report with one contribution: bucket `param`, value
/// `param^2`. All generated reports share one envelope (origin, api,
/// scheduled time), so they derive one budget unit per version.
pub fn fake_report_with_version(param: u32, report_id: &str, version: &str) -> Report {
    Report {
        shared_info: SharedInfo {
            api: "attribution-reporting".to_string(),
            version: version.to_string(),
            report_id: report_id.to_string(),
            reporting_origin: FAKE_REPORTING_ORIGIN.to_string(),
            scheduled_report_time: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            attribution_destination: Some("https://shoes.example".to_string()),
            debug_mode: None,
        },
        payload: Payload {
            contributions: vec![Contribution {
                bucket: u128::from(param),
                value: param * param,
            }],
        },
    }
}

pub fn fake_report(param: u32, report_id: &str) -> Report {
    fake_report_with_version(param, report_id, LATEST_VERSION)
}

/// A report with explicit contributions, for boundary-value fixtures.
pub fn fake_report_with_contributions(
    report_id: &str,
    contributions: Vec<Contribution>,
) -> Report {
    let mut report = fake_report(1, report_id);
    report.payload.contributions = contributions;
    report
}

/// Seals a report through the fake key service under a fresh key id.
pub fn encrypt_report(
    report: &Report,
    key_service: &FakeDecryptionKeyService,
) -> Result<EncryptedReport, HybridCipherError> {
    encrypt_report_with_shared_info(report, key_service, None)
}

/// Seals a report, optionally binding a different associated-data string
/// than the envelope shipped with the record (to provoke AAD mismatches).
pub fn encrypt_report_with_shared_info(
    report: &Report,
    key_service: &FakeDecryptionKeyService,
    aad_override: Option<&str>,
) -> Result<EncryptedReport, HybridCipherError> {
    let key_id = Uuid::new_v4().to_string();
    let shared_info_string = shared_info::encode_shared_info(&report.shared_info)
        .map_err(|e| HybridCipherError::Seal(e.to_string()))?;
    let payload_bytes = payload::encode_payload(&report.payload)
        .map_err(|e| HybridCipherError::Seal(e.to_string()))?;
    let aad = aad_override.unwrap_or(&shared_info_string);
    let ciphertext = key_service.generate_ciphertext(&key_id, &payload_bytes, aad)?;
    Ok(EncryptedReport {
        payload: ciphertext,
        key_id,
        shared_info: shared_info_string,
    })
}

/// A job reading reports from `input_bucket` with the given prefix, with
/// the parameters every processed job needs.
pub fn fake_job(job_key: &str, input_bucket: &str, input_prefix: &str) -> Job {
    fake_job_with_output(job_key, input_bucket, input_prefix, input_bucket, "output.avro")
}

pub fn fake_job_with_output(
    job_key: &str,
    input_bucket: &str,
    input_prefix: &str,
    output_bucket: &str,
    output_prefix: &str,
) -> Job {
    let mut job_parameters = HashMap::new();
    job_parameters.insert(
        JOB_PARAM_ATTRIBUTION_REPORT_TO.to_string(),
        FAKE_REPORTING_ORIGIN.to_string(),
    );
    Job {
        job_key: job_key.to_string(),
        request_info: RequestInfo {
            input_data_bucket_name: input_bucket.to_string(),
            input_data_blob_prefix: input_prefix.to_string(),
            output_data_bucket_name: output_bucket.to_string(),
            output_data_blob_prefix: output_prefix.to_string(),
            job_parameters,
        },
    }
}
