use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use super::{ResultLogError, ResultLogger};
use crate::blob::{BlobStorageClient, DataLocation};
use crate::codec::avro_result;
use crate::model::fact::AggregatedFact;
use crate::model::job::Job;

/// Writes result shards to the blob store as Avro files. Summary results go
/// to `<output_prefix>-1-of-1`; debug results to the same name under a
/// `debug` path segment inserted before the file name.
pub struct BlobResultLogger {
    blob: Arc<dyn BlobStorageClient>,
}

impl BlobResultLogger {
    pub fn new(blob: Arc<dyn BlobStorageClient>) -> Self {
        Self { blob }
    }

    fn output_location(job: &Job, debug_run: bool) -> DataLocation {
        let name = format!(
            "{}-1-of-1",
            job.request_info.output_data_blob_prefix
        );
        let key = if debug_run {
            insert_debug_segment(&name)
        } else {
            name
        };
        DataLocation::new(&job.request_info.output_data_bucket_name, key)
    }
}

/// `a/b/out.avro` → `a/b/debug/out.avro`.
fn insert_debug_segment(key: &str) -> String {
    match key.rsplit_once('/') {
        Some((dir, name)) => format!("{dir}/debug/{name}"),
        None => format!("debug/{key}"),
    }
}

#[async_trait]
impl ResultLogger for BlobResultLogger {
    async fn log_results(
        &self,
        mut facts: Vec<AggregatedFact>,
        job: &Job,
        debug_run: bool,
    ) -> Result<(), ResultLogError> {
        // The only ordering the output format defines: ascending by the
        // bucket's big-endian bytes, which is the natural u128 order.
        facts.sort_by_key(|fact| fact.bucket);

        let bytes = if debug_run {
            avro_result::write_debug_facts(&facts)
        } else {
            avro_result::write_summary_facts(&facts)
        }
        .map_err(|e| ResultLogError::Serialization(e.to_string()))?;

        let location = Self::output_location(job, debug_run);
        self.blob.write_blob(&location, bytes).await?;
        info!(
            "wrote {} {} facts to {location}",
            facts.len(),
            if debug_run { "debug" } else { "summary" },
        );
        Ok(())
    }
}
