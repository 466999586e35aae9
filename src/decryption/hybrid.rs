//! HPKE primitives for report payload encryption.
//!
//! Every report payload is sealed against a collector public key with the
//! report's shared-info string bound as associated data, so a payload cannot
//! be replayed under a tampered envelope.

use hpke::{
    aead::ChaCha20Poly1305, kdf::HkdfSha256, kem::DhP256HkdfSha256, Deserializable, Kem, OpModeR,
    OpModeS, Serializable,
};
use rand::{CryptoRng, RngCore};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

type AeadAlg = ChaCha20Poly1305;
type KdfAlg = HkdfSha256;
type KemAlg = DhP256HkdfSha256;

/// Domain-separation string for payload encryption contexts.
const HPKE_INFO: &[u8] = b"aggregation-service-payload";

#[derive(Debug, Error)]
pub enum HybridCipherError {
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("encryption failed: {0}")]
    Seal(String),

    #[error("decryption failed: {0}")]
    Open(String),

    #[error("malformed ciphertext: {0}")]
    Malformed(String),
}

/// Public key for payload encryption.
#[derive(Clone)]
pub struct HpkePublicKey {
    inner: <KemAlg as Kem>::PublicKey,
}

impl HpkePublicKey {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_bytes().to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HybridCipherError> {
        let inner = <KemAlg as Kem>::PublicKey::from_bytes(bytes)
            .map_err(|e| HybridCipherError::InvalidKey(format!("invalid public key: {e:?}")))?;
        Ok(Self { inner })
    }
}

/// Private key for payload decryption.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HpkePrivateKey {
    #[zeroize(skip)]
    inner: <KemAlg as Kem>::PrivateKey,
}

impl HpkePrivateKey {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_bytes().to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HybridCipherError> {
        let inner = <KemAlg as Kem>::PrivateKey::from_bytes(bytes)
            .map_err(|e| HybridCipherError::InvalidKey(format!("invalid private key: {e:?}")))?;
        Ok(Self { inner })
    }
}

pub struct HpkeKeyPair {
    pub public_key: HpkePublicKey,
    pub private_key: HpkePrivateKey,
}

impl HpkeKeyPair {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let (private_key, public_key) = KemAlg::gen_keypair(rng);
        Self {
            public_key: HpkePublicKey { inner: public_key },
            private_key: HpkePrivateKey { inner: private_key },
        }
    }
}

/// Seals a payload for the given public key. The returned bytes are framed
/// as `u32-le encapped-key length || encapped key || AEAD ciphertext`.
pub fn seal<R: RngCore + CryptoRng>(
    plaintext: &[u8],
    recipient_pk: &HpkePublicKey,
    associated_data: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, HybridCipherError> {
    let (encapped_key, mut context) = hpke::setup_sender::<AeadAlg, KdfAlg, KemAlg, _>(
        &OpModeS::Base,
        &recipient_pk.inner,
        HPKE_INFO,
        rng,
    )
    .map_err(|e| HybridCipherError::Seal(format!("hpke setup failed: {e:?}")))?;

    let ciphertext = context
        .seal(plaintext, associated_data)
        .map_err(|e| HybridCipherError::Seal(format!("hpke seal failed: {e:?}")))?;

    let encapped_key = encapped_key.to_bytes().to_vec();
    let mut framed = Vec::with_capacity(4 + encapped_key.len() + ciphertext.len());
    framed.extend_from_slice(&(encapped_key.len() as u32).to_le_bytes());
    framed.extend_from_slice(&encapped_key);
    framed.extend_from_slice(&ciphertext);
    Ok(framed)
}

/// Opens a framed ciphertext. Fails when the key, ciphertext, or associated
/// data do not match what was sealed.
pub fn open(
    framed: &[u8],
    recipient_sk: &HpkePrivateKey,
    associated_data: &[u8],
) -> Result<Vec<u8>, HybridCipherError> {
    if framed.len() < 4 {
        return Err(HybridCipherError::Malformed(
            "ciphertext shorter than the length header".to_string(),
        ));
    }
    let encapped_len =
        u32::from_le_bytes([framed[0], framed[1], framed[2], framed[3]]) as usize;
    if framed.len() < 4 + encapped_len {
        return Err(HybridCipherError::Malformed(
            "encapped key length exceeds ciphertext".to_string(),
        ));
    }
    let encapped_key = <KemAlg as Kem>::EncappedKey::from_bytes(&framed[4..4 + encapped_len])
        .map_err(|e| HybridCipherError::Malformed(format!("invalid encapped key: {e:?}")))?;

    let mut context = hpke::setup_receiver::<AeadAlg, KdfAlg, KemAlg>(
        &OpModeR::Base,
        &recipient_sk.inner,
        &encapped_key,
        HPKE_INFO,
    )
    .map_err(|e| HybridCipherError::Open(format!("hpke setup failed: {e:?}")))?;

    context
        .open(&framed[4 + encapped_len..], associated_data)
        .map_err(|e| HybridCipherError::Open(format!("hpke open failed: {e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn seal_open_roundtrip() {
        let mut rng = OsRng;
        let key_pair = HpkeKeyPair::generate(&mut rng);
        let sealed = seal(b"payload", &key_pair.public_key, b"aad", &mut rng).unwrap();
        let opened = open(&sealed, &key_pair.private_key, b"aad").unwrap();
        assert_eq!(opened, b"payload");
    }

    #[test]
    fn wrong_associated_data_fails() {
        let mut rng = OsRng;
        let key_pair = HpkeKeyPair::generate(&mut rng);
        let sealed = seal(b"payload", &key_pair.public_key, b"aad", &mut rng).unwrap();
        assert!(open(&sealed, &key_pair.private_key, b"other").is_err());
    }

    #[test]
    fn wrong_key_fails() {
        let mut rng = OsRng;
        let key_pair = HpkeKeyPair::generate(&mut rng);
        let other = HpkeKeyPair::generate(&mut rng);
        let sealed = seal(b"payload", &key_pair.public_key, b"aad", &mut rng).unwrap();
        assert!(open(&sealed, &other.private_key, b"aad").is_err());
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let mut rng = OsRng;
        let key_pair = HpkeKeyPair::generate(&mut rng);
        assert!(open(&[0x01], &key_pair.private_key, b"aad").is_err());
    }

    #[test]
    fn key_serialization_roundtrip() {
        let mut rng = OsRng;
        let key_pair = HpkeKeyPair::generate(&mut rng);
        let pk = HpkePublicKey::from_bytes(&key_pair.public_key.to_bytes()).unwrap();
        let sk = HpkePrivateKey::from_bytes(&key_pair.private_key.to_bytes()).unwrap();
        let mut rng = OsRng;
        let sealed = seal(b"x", &pk, b"", &mut rng).unwrap();
        assert_eq!(open(&sealed, &sk, b"").unwrap(), b"x");
    }
}
