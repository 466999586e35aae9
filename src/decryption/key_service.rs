use async_trait::async_trait;
use thiserror::Error;

use super::hybrid::HpkePrivateKey;

/// Failure reasons reported by the decryption key service. `PermissionDenied`
/// and `Unavailable` are fatal for the whole job; `Service` failures are
/// counted per report.
#[derive(Debug, Error)]
pub enum KeyFetchError {
    #[error("permission denied fetching decryption key {key_id}")]
    PermissionDenied { key_id: String },

    #[error("decryption key service unavailable: {0}")]
    Unavailable(String),

    #[error("decryption key service error: {0}")]
    Service(String),
}

/// Capability object over the external key-management service.
#[async_trait]
pub trait DecryptionKeyService: Send + Sync {
    /// Fetches the private key registered under `key_id`.
    async fn decryption_key(&self, key_id: &str) -> Result<HpkePrivateKey, KeyFetchError>;
}
