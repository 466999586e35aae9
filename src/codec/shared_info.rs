use super::CodecError;
use crate::model::report::SharedInfo;

/// Serializes the shared-info envelope to its canonical JSON string. The
/// resulting string is what gets bound as associated data at encryption
/// time, so it must be carried verbatim alongside the ciphertext.
pub fn encode_shared_info(shared_info: &SharedInfo) -> Result<String, CodecError> {
    Ok(serde_json::to_string(shared_info)?)
}

pub fn decode_shared_info(text: &str) -> Result<SharedInfo, CodecError> {
    Ok(serde_json::from_str(text)?)
}
