use serde::{Deserialize, Serialize};

use super::CodecError;
use crate::model::report::{Contribution, Payload};
use crate::util::numeric;

/// On-wire CBOR shape of a decrypted report payload. The `operation` entry
/// is written for compatibility and ignored on read.
#[derive(Serialize, Deserialize)]
struct CborPayload {
    #[serde(default)]
    operation: String,
    data: Vec<CborContribution>,
}

#[derive(Serialize, Deserialize)]
struct CborContribution {
    #[serde(with = "serde_bytes")]
    bucket: Vec<u8>,
    value: u64,
}

pub fn encode_payload(payload: &Payload) -> Result<Vec<u8>, CodecError> {
    let wire = CborPayload {
        operation: "histogram".to_string(),
        data: payload
            .contributions
            .iter()
            .map(|c| CborContribution {
                bucket: numeric::bucket_to_be_bytes(c.bucket).to_vec(),
                value: u64::from(c.value),
            })
            .collect(),
    };
    Ok(serde_cbor::to_vec(&wire)?)
}

pub fn decode_payload(bytes: &[u8]) -> Result<Payload, CodecError> {
    let wire: CborPayload = serde_cbor::from_slice(bytes)?;
    let mut contributions = Vec::with_capacity(wire.data.len());
    for entry in wire.data {
        let bucket = numeric::bucket_from_be_bytes(&entry.bucket)?;
        let value = u32::try_from(entry.value).map_err(|_| {
            CodecError::Malformed(format!(
                "contribution value {} exceeds the 32-bit limit",
                entry.value
            ))
        })?;
        contributions.push(Contribution { bucket, value });
    }
    Ok(Payload { contributions })
}
