//! Shared fixture environment for processor integration tests: temp-dir
//! blob buckets, an in-process key service, and a processor builder wired
//! with the controllable fakes.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use aggregation_worker::blob::FsBlobStorageClient;
use aggregation_worker::budget::PrivacyBudgetBridge;
use aggregation_worker::budget::UnlimitedPrivacyBudgetBridge;
use aggregation_worker::codec::{avro_domain, avro_report};
use aggregation_worker::decryption::RecordDecrypter;
use aggregation_worker::domain::{DomainFormat, OutputDomainProcessor};
use aggregation_worker::model::job::{
    Job, JOB_PARAM_OUTPUT_DOMAIN_BLOB_PREFIX, JOB_PARAM_OUTPUT_DOMAIN_BUCKET_NAME,
    JOB_PARAM_REPORT_ERROR_THRESHOLD_PERCENTAGE,
};
use aggregation_worker::model::report::{EncryptedReport, Report};
use aggregation_worker::noise::{
    NoiseDistribution, NoisedAggregationRunner, PrivacyParams,
};
use aggregation_worker::processor::ConcurrentAggregationProcessor;
use aggregation_worker::testing::report_generator::{
    encrypt_report, fake_job_with_output, fake_report,
};
use aggregation_worker::testing::{
    ConstantNoiseApplier, FakeDecryptionKeyService, FakeValidator, InMemoryResultLogger,
};
use aggregation_worker::validation::{ReportVersionValidator, ValidatorChain};

pub struct TestEnv {
    _tmp: TempDir,
    pub reports_dir: PathBuf,
    pub domain_dir: PathBuf,
    pub output_dir: PathBuf,
    pub key_service: Arc<FakeDecryptionKeyService>,
    pub validator: Arc<FakeValidator>,
    pub result_logger: Arc<InMemoryResultLogger>,
}

/// Knobs a test can turn; everything else matches the worker's defaults.
pub struct ProcessorOptions {
    pub noise: i64,
    pub budget_bridge: Arc<dyn PrivacyBudgetBridge>,
    pub domain_format: DomainFormat,
    pub domain_optional: bool,
    pub thresholding_enabled: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            noise: 0,
            budget_bridge: Arc::new(UnlimitedPrivacyBudgetBridge::new()),
            domain_format: DomainFormat::Avro,
            domain_optional: true,
            thresholding_enabled: true,
        }
    }
}

pub fn privacy_params() -> PrivacyParams {
    PrivacyParams {
        distribution: NoiseDistribution::Laplace,
        epsilon: 0.1,
        delta: 1e-5,
        l1_sensitivity: 4.0,
    }
}

impl TestEnv {
    pub fn new() -> Self {
        aggregation_worker::util::logging::init();
        let tmp = TempDir::new().expect("create temp dir");
        let reports_dir = tmp.path().join("reports");
        let domain_dir = tmp.path().join("output_domain");
        let output_dir = tmp.path().join("output");
        for dir in [&reports_dir, &domain_dir, &output_dir] {
            std::fs::create_dir(dir).expect("create fixture dir");
        }
        Self {
            _tmp: tmp,
            reports_dir,
            domain_dir,
            output_dir,
            key_service: Arc::new(FakeDecryptionKeyService::new()),
            validator: Arc::new(FakeValidator::new()),
            result_logger: Arc::new(InMemoryResultLogger::new()),
        }
    }

    pub fn processor(&self, options: ProcessorOptions) -> ConcurrentAggregationProcessor {
        let blob = Arc::new(FsBlobStorageClient::new());
        ConcurrentAggregationProcessor {
            blob: blob.clone(),
            decrypter: Arc::new(RecordDecrypter::new(self.key_service.clone())),
            validators: Arc::new(ValidatorChain::new(vec![
                Box::new(self.validator.clone()),
                Box::new(ReportVersionValidator::new()),
            ])),
            domain_processor: Arc::new(OutputDomainProcessor::new(
                options.domain_format,
                blob.clone(),
            )),
            noised_runner: Arc::new(NoisedAggregationRunner::new(
                Arc::new(ConstantNoiseApplier::new(options.noise)),
                privacy_params(),
                Some(0.0),
                options.domain_optional,
                options.thresholding_enabled,
            )),
            budget_bridge: options.budget_bridge,
            result_logger: self.result_logger.clone(),
            default_error_threshold_percentage: 100.0,
        }
    }

    pub fn encrypt(&self, report: &Report) -> EncryptedReport {
        encrypt_report(report, &self.key_service).expect("encrypt report")
    }

    pub fn write_reports(&self, shard_name: &str, reports: &[EncryptedReport]) {
        let bytes = avro_report::write_report_shard(reports).expect("encode shard");
        std::fs::write(self.reports_dir.join(shard_name), bytes).expect("write shard");
    }

    pub fn write_avro_domain(&self, shard_name: &str, buckets: &[u128]) {
        let bytes = avro_domain::write_domain_shard(buckets).expect("encode domain");
        std::fs::write(self.domain_dir.join(shard_name), bytes).expect("write domain");
    }

    pub fn write_text_domain(&self, shard_name: &str, contents: &str) {
        std::fs::write(self.domain_dir.join(shard_name), contents).expect("write domain");
    }

    /// Two shards with the standard four reports: `(bucket 1, value 1)` and
    /// `(bucket 2, value 4)` in each shard.
    pub fn seed_standard_reports(&self, report_ids: [&str; 4]) {
        let shard_1 = vec![
            self.encrypt(&fake_report(1, report_ids[0])),
            self.encrypt(&fake_report(2, report_ids[1])),
        ];
        let shard_2 = vec![
            self.encrypt(&fake_report(1, report_ids[2])),
            self.encrypt(&fake_report(2, report_ids[3])),
        ];
        self.write_reports("reports_1.avro", &shard_1);
        self.write_reports("reports_2.avro", &shard_2);
    }

    pub fn job(&self) -> Job {
        let mut job = fake_job_with_output(
            "foo",
            &self.reports_dir.to_string_lossy(),
            "",
            &self.output_dir.to_string_lossy(),
            "output.avro",
        );
        job.request_info.job_parameters.insert(
            JOB_PARAM_REPORT_ERROR_THRESHOLD_PERCENTAGE.to_string(),
            "100".to_string(),
        );
        job
    }

    pub fn job_with_domain(&self) -> Job {
        let mut job = self.job();
        self.add_domain_params(&mut job);
        job
    }

    pub fn add_domain_params(&self, job: &mut Job) {
        job.request_info.job_parameters.insert(
            JOB_PARAM_OUTPUT_DOMAIN_BUCKET_NAME.to_string(),
            self.domain_dir.to_string_lossy().into_owned(),
        );
        job.request_info.job_parameters.insert(
            JOB_PARAM_OUTPUT_DOMAIN_BLOB_PREFIX.to_string(),
            "".to_string(),
        );
    }
}

/// `(bucket, metric, unnoised_metric)` triples of the logged summary,
/// sorted by bucket.
pub fn summary_triples(logger: &InMemoryResultLogger) -> Vec<(u128, i64, u64)> {
    logger
        .summary_facts()
        .expect("summary was logged")
        .iter()
        .map(|f| (f.bucket, f.metric, f.unnoised_metric))
        .collect()
}
