use apache_avro::types::{Record, Value};
use apache_avro::{Reader, Schema, Writer};

use super::CodecError;
use crate::model::report::EncryptedReport;

/// Avro schema for one encrypted aggregatable report record. Fixed wire
/// contract; field names and order must not change.
const REPORT_SCHEMA_JSON: &str = r#"
{
  "type": "record",
  "name": "AggregatableReport",
  "fields": [
    {"name": "payload", "type": "bytes"},
    {"name": "key_id", "type": "string"},
    {"name": "shared_info", "type": "string"}
  ]
}
"#;

fn report_schema() -> Result<Schema, CodecError> {
    Ok(Schema::parse_str(REPORT_SCHEMA_JSON)?)
}

/// Lazy, non-restartable reader over one report shard (an Avro Object
/// Container File). Any record-level failure poisons the shard.
pub struct ReportShardReader<'a> {
    inner: Reader<'a, &'a [u8]>,
}

impl<'a> ReportShardReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self, CodecError> {
        Ok(Self {
            inner: Reader::new(bytes)?,
        })
    }
}

impl Iterator for ReportShardReader<'_> {
    type Item = Result<EncryptedReport, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        let value = match self.inner.next()? {
            Ok(value) => value,
            Err(e) => return Some(Err(e.into())),
        };
        Some(decode_report_record(value))
    }
}

fn decode_report_record(value: Value) -> Result<EncryptedReport, CodecError> {
    let Value::Record(fields) = value else {
        return Err(CodecError::Malformed(
            "report record is not an avro record".to_string(),
        ));
    };
    let mut payload = None;
    let mut key_id = None;
    let mut shared_info = None;
    for (name, field) in fields {
        match (name.as_str(), field) {
            ("payload", Value::Bytes(b)) => payload = Some(b),
            ("key_id", Value::String(s)) => key_id = Some(s),
            ("shared_info", Value::String(s)) => shared_info = Some(s),
            (name, field) => {
                return Err(CodecError::Malformed(format!(
                    "unexpected report field {name}: {field:?}"
                )))
            }
        }
    }
    match (payload, key_id, shared_info) {
        (Some(payload), Some(key_id), Some(shared_info)) => Ok(EncryptedReport {
            payload,
            key_id,
            shared_info,
        }),
        _ => Err(CodecError::Malformed(
            "report record is missing a required field".to_string(),
        )),
    }
}

/// Serializes encrypted reports into one Avro shard. Used to produce test
/// fixtures and local corpora.
pub fn write_report_shard(reports: &[EncryptedReport]) -> Result<Vec<u8>, CodecError> {
    let schema = report_schema()?;
    let mut writer = Writer::new(&schema, Vec::new());
    for report in reports {
        let mut record = Record::new(writer.schema()).ok_or_else(|| {
            CodecError::Malformed("report schema is not a record schema".to_string())
        })?;
        record.put("payload", Value::Bytes(report.payload.clone()));
        record.put("key_id", report.key_id.as_str());
        record.put("shared_info", report.shared_info.as_str());
        writer.append(record)?;
    }
    Ok(writer.into_inner()?)
}
