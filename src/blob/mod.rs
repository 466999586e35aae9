pub mod fs;

use core::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use fs::FsBlobStorageClient;

/// A `{bucket, key}` pair addressing one blob or one prefix within a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataLocation {
    pub bucket: String,
    pub key: String,
}

impl DataLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The same bucket with a different key.
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            bucket: self.bucket.clone(),
            key: key.into(),
        }
    }
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Error)]
pub enum BlobStorageError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("blob i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability object for the blob store. Listing treats the location's key
/// as a prefix; read and write address one blob exactly.
#[async_trait]
pub trait BlobStorageClient: Send + Sync {
    /// Lists blob keys under the location's prefix, in lexicographic order.
    async fn list_blobs(&self, location: &DataLocation)
        -> Result<Vec<String>, BlobStorageError>;

    async fn read_blob(&self, location: &DataLocation) -> Result<Vec<u8>, BlobStorageError>;

    async fn write_blob(
        &self,
        location: &DataLocation,
        bytes: Vec<u8>,
    ) -> Result<(), BlobStorageError>;
}
