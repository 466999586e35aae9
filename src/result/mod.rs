pub mod blob_logger;

pub use blob_logger::BlobResultLogger;

use async_trait::async_trait;
use thiserror::Error;

use crate::blob::BlobStorageError;
use crate::model::fact::AggregatedFact;
use crate::model::job::Job;

#[derive(Debug, Error)]
pub enum ResultLogError {
    #[error("failed to serialize results: {0}")]
    Serialization(String),

    #[error("failed to write results: {0}")]
    Write(#[from] BlobStorageError),

    #[error("result logging failed: {0}")]
    Other(String),
}

/// Capability object that materializes aggregation results. `debug_run`
/// selects the debug output file and schema.
#[async_trait]
pub trait ResultLogger: Send + Sync {
    async fn log_results(
        &self,
        facts: Vec<AggregatedFact>,
        job: &Job,
        debug_run: bool,
    ) -> Result<(), ResultLogError>;
}
