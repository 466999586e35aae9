pub mod avro_domain;
pub mod avro_report;
pub mod avro_result;
pub mod payload;
pub mod shared_info;

use thiserror::Error;

/// Errors raised while encoding or decoding report, domain, and result
/// records. A decode failure on an input shard is fatal for that shard.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("cbor error: {0}")]
    Cbor(#[from] serde_cbor::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed record: {0}")]
    Malformed(String),
}
