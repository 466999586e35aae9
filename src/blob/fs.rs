use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;

use super::{BlobStorageClient, BlobStorageError, DataLocation};

/// Filesystem-backed blob store: a bucket is a directory, a key is a path
/// below it. All filesystem calls run on the blocking pool.
#[derive(Debug, Default)]
pub struct FsBlobStorageClient;

impl FsBlobStorageClient {
    pub fn new() -> Self {
        Self
    }

    fn blob_path(location: &DataLocation) -> PathBuf {
        Path::new(&location.bucket).join(&location.key)
    }
}

fn join_error(e: tokio::task::JoinError) -> BlobStorageError {
    BlobStorageError::Io(io::Error::other(e))
}

#[async_trait]
impl BlobStorageClient for FsBlobStorageClient {
    async fn list_blobs(
        &self,
        location: &DataLocation,
    ) -> Result<Vec<String>, BlobStorageError> {
        let bucket = location.bucket.clone();
        let prefix = location.key.clone();
        tokio::task::spawn_blocking(move || {
            let dir = Path::new(&bucket);
            if !dir.is_dir() {
                return Err(BlobStorageError::NotFound(bucket.clone()));
            }
            let mut keys = Vec::new();
            for entry in std::fs::read_dir(dir)? {
                let entry = entry?;
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(&prefix) {
                    keys.push(name);
                }
            }
            keys.sort();
            debug!("listed {} blobs under {bucket}/{prefix}", keys.len());
            Ok(keys)
        })
        .await
        .map_err(join_error)?
    }

    async fn read_blob(&self, location: &DataLocation) -> Result<Vec<u8>, BlobStorageError> {
        let path = Self::blob_path(location);
        let display = location.to_string();
        tokio::task::spawn_blocking(move || match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(BlobStorageError::NotFound(display))
            }
            Err(e) => Err(e.into()),
        })
        .await
        .map_err(join_error)?
    }

    async fn write_blob(
        &self,
        location: &DataLocation,
        bytes: Vec<u8>,
    ) -> Result<(), BlobStorageError> {
        let path = Self::blob_path(location);
        tokio::task::spawn_blocking(move || {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, bytes)?;
            Ok(())
        })
        .await
        .map_err(join_error)?
    }
}
