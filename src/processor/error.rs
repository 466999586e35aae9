use thiserror::Error;

use crate::model::return_code::ReturnCode;

/// Job-fatal failure: a return code plus a human-readable message. Raised
/// once per job; per-report errors never travel on this channel.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct AggregationJobProcessError {
    pub code: ReturnCode,
    pub message: String,
}

impl AggregationJobProcessError {
    pub fn new(code: ReturnCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
