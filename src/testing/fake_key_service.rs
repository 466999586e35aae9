use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::OsRng;

use crate::decryption::hybrid::{self, HpkeKeyPair, HpkePrivateKey, HybridCipherError};
use crate::decryption::key_service::{DecryptionKeyService, KeyFetchError};
use crate::util::hashmap::HashMap;

/// Failure a test can force on every key fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFetchFailure {
    PermissionDenied,
    Unavailable,
    Service,
}

/// In-process key service. Generates a key pair per key id on demand, so it
/// can both encrypt fixtures and serve the matching private keys.
#[derive(Default)]
pub struct FakeDecryptionKeyService {
    keys: Mutex<HashMap<String, HpkeKeyPair>>,
    failure: Mutex<Option<KeyFetchFailure>>,
}

impl FakeDecryptionKeyService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent key fetch fail with the given reason, or
    /// restores normal behavior with `None`.
    pub fn set_failure(&self, failure: Option<KeyFetchFailure>) {
        *self.failure.lock().expect("failure flag poisoned") = failure;
    }

    /// Seals a payload under the key pair registered for `key_id`, creating
    /// the pair on first use. The shared-info string is bound as associated
    /// data, exactly as clients do.
    pub fn generate_ciphertext(
        &self,
        key_id: &str,
        plaintext: &[u8],
        shared_info: &str,
    ) -> Result<Vec<u8>, HybridCipherError> {
        let mut keys = self.keys.lock().expect("key table poisoned");
        let key_pair = keys
            .entry(key_id.to_string())
            .or_insert_with(|| HpkeKeyPair::generate(&mut OsRng));
        hybrid::seal(
            plaintext,
            &key_pair.public_key,
            shared_info.as_bytes(),
            &mut OsRng,
        )
    }
}

#[async_trait]
impl DecryptionKeyService for FakeDecryptionKeyService {
    async fn decryption_key(&self, key_id: &str) -> Result<HpkePrivateKey, KeyFetchError> {
        match *self.failure.lock().expect("failure flag poisoned") {
            Some(KeyFetchFailure::PermissionDenied) => {
                return Err(KeyFetchError::PermissionDenied {
                    key_id: key_id.to_string(),
                })
            }
            Some(KeyFetchFailure::Unavailable) => {
                return Err(KeyFetchError::Unavailable("forced by test".to_string()))
            }
            Some(KeyFetchFailure::Service) => {
                return Err(KeyFetchError::Service("forced by test".to_string()))
            }
            None => {}
        }
        self.keys
            .lock()
            .expect("key table poisoned")
            .get(key_id)
            .map(|pair| pair.private_key.clone())
            .ok_or_else(|| KeyFetchError::Service(format!("unknown key id {key_id}")))
    }
}
