use std::sync::Arc;

use log::{debug, info};
use thiserror::Error;

use crate::blob::{BlobStorageClient, BlobStorageError, DataLocation};
use crate::codec::{avro_domain::DomainShardReader, CodecError};
use crate::util::hashmap::HashSet;
use crate::util::numeric;

/// Supported output-domain encodings. The set is closed; jobs select the
/// variant at worker configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainFormat {
    /// Avro Object Container Files of `{bucket: bytes}` records.
    Avro,
    /// One decimal bucket key per line, US-ASCII.
    Text,
}

#[derive(Debug, Error)]
pub enum DomainReadError {
    #[error("no domain shards found under {0}")]
    NoShards(DataLocation),

    #[error("failed to read domain shard: {0}")]
    Blob(#[from] BlobStorageError),

    #[error("malformed domain shard {shard}: {source}")]
    Malformed {
        shard: String,
        #[source]
        source: CodecError,
    },
}

/// Streams every domain shard under a location and materializes the set of
/// allowed bucket keys. Duplicates across shards collapse silently.
pub struct OutputDomainProcessor {
    format: DomainFormat,
    blob: Arc<dyn BlobStorageClient>,
}

impl OutputDomainProcessor {
    pub fn new(format: DomainFormat, blob: Arc<dyn BlobStorageClient>) -> Self {
        Self { format, blob }
    }

    pub async fn read_domain(
        &self,
        location: &DataLocation,
    ) -> Result<HashSet<u128>, DomainReadError> {
        let shards = self.blob.list_blobs(location).await?;
        if shards.is_empty() {
            return Err(DomainReadError::NoShards(location.clone()));
        }

        let mut keys: HashSet<u128> = HashSet::default();
        for shard in shards {
            let shard_location = location.with_key(&shard);
            let bytes = self.blob.read_blob(&shard_location).await?;
            let before = keys.len();
            match self.format {
                DomainFormat::Avro => parse_avro_shard(&bytes, &mut keys),
                DomainFormat::Text => parse_text_shard(&bytes, &mut keys),
            }
            .map_err(|source| DomainReadError::Malformed {
                shard: shard.clone(),
                source,
            })?;
            debug!(
                "domain shard {shard} added {} keys",
                keys.len() - before
            );
        }
        info!("output domain holds {} bucket keys", keys.len());
        Ok(keys)
    }
}

fn parse_avro_shard(bytes: &[u8], keys: &mut HashSet<u128>) -> Result<(), CodecError> {
    for bucket in DomainShardReader::new(bytes)? {
        keys.insert(bucket?);
    }
    Ok(())
}

fn parse_text_shard(bytes: &[u8], keys: &mut HashSet<u128>) -> Result<(), CodecError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CodecError::Malformed(format!("domain shard is not ascii text: {e}")))?;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        keys.insert(numeric::bucket_from_decimal(line)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::FsBlobStorageClient;
    use crate::codec::avro_domain::write_domain_shard;

    fn fs_processor(format: DomainFormat) -> OutputDomainProcessor {
        OutputDomainProcessor::new(format, Arc::new(FsBlobStorageClient::new()))
    }

    #[tokio::test]
    async fn avro_shards_are_merged_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().to_string_lossy().into_owned();
        std::fs::write(
            dir.path().join("domain_1.avro"),
            write_domain_shard(&[3]).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("domain_2.avro"),
            write_domain_shard(&[2, 3]).unwrap(),
        )
        .unwrap();

        let keys = fs_processor(DomainFormat::Avro)
            .read_domain(&DataLocation::new(&bucket, ""))
            .await
            .unwrap();
        assert_eq!(keys, [2u128, 3].into_iter().collect());
    }

    #[tokio::test]
    async fn text_shards_parse_decimal_lines() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().to_string_lossy().into_owned();
        std::fs::write(dir.path().join("domain.txt"), "1\n2\n\n2\n").unwrap();

        let keys = fs_processor(DomainFormat::Text)
            .read_domain(&DataLocation::new(&bucket, ""))
            .await
            .unwrap();
        assert_eq!(keys, [1u128, 2].into_iter().collect());
    }

    #[tokio::test]
    async fn missing_shards_fail() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().to_string_lossy().into_owned();
        let result = fs_processor(DomainFormat::Avro)
            .read_domain(&DataLocation::new(&bucket, "absent_prefix"))
            .await;
        assert!(matches!(result, Err(DomainReadError::NoShards(_))));
    }

    #[tokio::test]
    async fn unreadable_avro_shard_fails() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().to_string_lossy().into_owned();
        std::fs::write(dir.path().join("domain_bad.avro"), "bad shard").unwrap();
        let result = fs_processor(DomainFormat::Avro)
            .read_domain(&DataLocation::new(&bucket, ""))
            .await;
        assert!(matches!(result, Err(DomainReadError::Malformed { .. })));
    }

    #[tokio::test]
    async fn unreadable_text_shard_fails() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().to_string_lossy().into_owned();
        std::fs::write(
            dir.path().join("domain_bad.txt"),
            "abcdabcdabcdabcdabcdabcdabcdabcd",
        )
        .unwrap();
        let result = fs_processor(DomainFormat::Text)
            .read_domain(&DataLocation::new(&bucket, ""))
            .await;
        assert!(matches!(result, Err(DomainReadError::Malformed { .. })));
    }

    #[tokio::test]
    async fn empty_avro_shard_yields_empty_domain() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().to_string_lossy().into_owned();
        std::fs::write(
            dir.path().join("domain_empty.avro"),
            write_domain_shard(&[]).unwrap(),
        )
        .unwrap();
        let keys = fs_processor(DomainFormat::Avro)
            .read_domain(&DataLocation::new(&bucket, ""))
            .await
            .unwrap();
        assert!(keys.is_empty());
    }
}
