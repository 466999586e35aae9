use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record of the report input: an opaque encrypted payload plus the
/// cleartext envelope needed to decrypt and account for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedReport {
    pub payload: Vec<u8>,
    pub key_id: String,
    pub shared_info: String,
}

/// Parsed view of the report's non-secret envelope. The JSON string form is
/// bound as associated data during decryption, so the string itself (not
/// this struct) is the authoritative representation on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedInfo {
    pub api: String,
    pub version: String,
    pub report_id: String,
    pub reporting_origin: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub scheduled_report_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution_destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_mode: Option<String>,
}

/// A decrypted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub shared_info: SharedInfo,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    pub contributions: Vec<Contribution>,
}

/// A single histogram contribution: 128-bit bucket key and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
    pub bucket: u128,
    pub value: u32,
}
