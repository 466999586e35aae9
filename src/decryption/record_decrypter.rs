use std::sync::Arc;

use log::debug;
use thiserror::Error;

use super::hybrid;
use super::key_service::{DecryptionKeyService, KeyFetchError};
use crate::codec::{payload, shared_info};
use crate::model::report::{EncryptedReport, Report};

#[derive(Debug, Error)]
pub enum DecryptError {
    /// Ciphertext, associated data, or decoded payload was unusable.
    #[error("report decryption failed: {0}")]
    Decryption(String),

    /// The key service failed; severity depends on the reason.
    #[error(transparent)]
    KeyFetch(#[from] KeyFetchError),
}

/// Decrypts one encrypted report into its structured form: key fetch, HPKE
/// open with the shared-info string as associated data, then CBOR payload
/// and JSON envelope decoding.
pub struct RecordDecrypter {
    key_service: Arc<dyn DecryptionKeyService>,
}

impl RecordDecrypter {
    pub fn new(key_service: Arc<dyn DecryptionKeyService>) -> Self {
        Self { key_service }
    }

    pub async fn decrypt(&self, encrypted: &EncryptedReport) -> Result<Report, DecryptError> {
        let key = self.key_service.decryption_key(&encrypted.key_id).await?;
        let plaintext = hybrid::open(
            &encrypted.payload,
            &key,
            encrypted.shared_info.as_bytes(),
        )
        .map_err(|e| DecryptError::Decryption(e.to_string()))?;
        let payload = payload::decode_payload(&plaintext)
            .map_err(|e| DecryptError::Decryption(format!("payload decode failed: {e}")))?;
        let shared_info = shared_info::decode_shared_info(&encrypted.shared_info)
            .map_err(|e| DecryptError::Decryption(format!("shared_info decode failed: {e}")))?;
        debug!(
            "decrypted report {} with {} contributions",
            shared_info.report_id,
            payload.contributions.len()
        );
        Ok(Report {
            shared_info,
            payload,
        })
    }
}
