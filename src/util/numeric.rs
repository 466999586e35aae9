use crate::codec::CodecError;

/// Serializes a bucket key as 16 big-endian bytes.
pub fn bucket_to_be_bytes(bucket: u128) -> [u8; 16] {
    bucket.to_be_bytes()
}

/// Parses a bucket key from up to 16 big-endian bytes. Shorter inputs are
/// treated as left-padded with zeros, which is how upstream writers encode
/// small buckets.
pub fn bucket_from_be_bytes(bytes: &[u8]) -> Result<u128, CodecError> {
    if bytes.len() > 16 {
        return Err(CodecError::Malformed(format!(
            "bucket field holds {} bytes, expected at most 16",
            bytes.len()
        )));
    }
    let mut padded = [0u8; 16];
    padded[16 - bytes.len()..].copy_from_slice(bytes);
    Ok(u128::from_be_bytes(padded))
}

/// Parses a bucket key from a US-ASCII decimal string, as used by the text
/// output-domain format.
pub fn bucket_from_decimal(text: &str) -> Result<u128, CodecError> {
    text.trim()
        .parse::<u128>()
        .map_err(|e| CodecError::Malformed(format!("invalid bucket literal {text:?}: {e}")))
}
