pub mod hybrid;
pub mod key_service;
pub mod record_decrypter;

pub use hybrid::{HpkeKeyPair, HpkePrivateKey, HpkePublicKey};
pub use key_service::{DecryptionKeyService, KeyFetchError};
pub use record_decrypter::{DecryptError, RecordDecrypter};
