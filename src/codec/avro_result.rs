use apache_avro::types::{Record, Value};
use apache_avro::{Reader, Schema, Writer};

use super::CodecError;
use crate::model::fact::{AggregatedFact, DebugBucketAnnotation};
use crate::util::numeric;

/// Avro schema for one summary output record.
const SUMMARY_SCHEMA_JSON: &str = r#"
{
  "type": "record",
  "name": "AggregatedFact",
  "fields": [
    {"name": "bucket", "type": "bytes"},
    {"name": "metric", "type": "long"}
  ]
}
"#;

/// Avro schema for one debug output record: the summary fields plus the
/// unnoised sum and domain-membership annotations.
const DEBUG_SCHEMA_JSON: &str = r#"
{
  "type": "record",
  "name": "DebugAggregatedFact",
  "fields": [
    {"name": "bucket", "type": "bytes"},
    {"name": "metric", "type": "long"},
    {"name": "unnoised_metric", "type": "long"},
    {"name": "annotations", "type": {
      "type": "array",
      "items": {
        "type": "enum",
        "name": "DebugBucketAnnotation",
        "symbols": ["IN_REPORTS", "IN_DOMAIN"]
      }
    }}
  ]
}
"#;

fn summary_schema() -> Result<Schema, CodecError> {
    Ok(Schema::parse_str(SUMMARY_SCHEMA_JSON)?)
}

fn debug_schema() -> Result<Schema, CodecError> {
    Ok(Schema::parse_str(DEBUG_SCHEMA_JSON)?)
}

/// Serializes summary facts. Callers are expected to pass facts already
/// sorted by bucket; this function preserves order.
pub fn write_summary_facts(facts: &[AggregatedFact]) -> Result<Vec<u8>, CodecError> {
    let schema = summary_schema()?;
    let mut writer = Writer::new(&schema, Vec::new());
    for fact in facts {
        let mut record = Record::new(writer.schema()).ok_or_else(|| {
            CodecError::Malformed("summary schema is not a record schema".to_string())
        })?;
        record.put(
            "bucket",
            Value::Bytes(numeric::bucket_to_be_bytes(fact.bucket).to_vec()),
        );
        record.put("metric", Value::Long(fact.metric));
        writer.append(record)?;
    }
    Ok(writer.into_inner()?)
}

/// Serializes debug facts, annotations included.
pub fn write_debug_facts(facts: &[AggregatedFact]) -> Result<Vec<u8>, CodecError> {
    let schema = debug_schema()?;
    let mut writer = Writer::new(&schema, Vec::new());
    for fact in facts {
        let mut record = Record::new(writer.schema()).ok_or_else(|| {
            CodecError::Malformed("debug schema is not a record schema".to_string())
        })?;
        record.put(
            "bucket",
            Value::Bytes(numeric::bucket_to_be_bytes(fact.bucket).to_vec()),
        );
        record.put("metric", Value::Long(fact.metric));
        let unnoised = i64::try_from(fact.unnoised_metric).map_err(|_| {
            CodecError::Malformed(format!(
                "unnoised metric {} does not fit the output field",
                fact.unnoised_metric
            ))
        })?;
        record.put("unnoised_metric", Value::Long(unnoised));
        let annotations = fact
            .debug_annotations
            .iter()
            .flatten()
            .map(|a| Value::Enum(*a as u32, a.as_str().to_string()))
            .collect();
        record.put("annotations", Value::Array(annotations));
        writer.append(record)?;
    }
    Ok(writer.into_inner()?)
}

/// Decodes a summary results file, for verification and local tooling.
pub fn read_summary_facts(bytes: &[u8]) -> Result<Vec<AggregatedFact>, CodecError> {
    let reader = Reader::new(bytes)?;
    let mut facts = Vec::new();
    for value in reader {
        let Value::Record(fields) = value? else {
            return Err(CodecError::Malformed(
                "summary record is not an avro record".to_string(),
            ));
        };
        let mut bucket = None;
        let mut metric = None;
        for (name, field) in fields {
            match (name.as_str(), field) {
                ("bucket", Value::Bytes(b)) => bucket = Some(numeric::bucket_from_be_bytes(&b)?),
                ("metric", Value::Long(v)) => metric = Some(v),
                _ => {}
            }
        }
        match (bucket, metric) {
            (Some(bucket), Some(metric)) => {
                // Summary files do not carry the unnoised sum.
                facts.push(AggregatedFact::new(bucket, metric, 0))
            }
            _ => {
                return Err(CodecError::Malformed(
                    "summary record is missing a required field".to_string(),
                ))
            }
        }
    }
    Ok(facts)
}

/// Decodes a debug results file.
pub fn read_debug_facts(bytes: &[u8]) -> Result<Vec<AggregatedFact>, CodecError> {
    let reader = Reader::new(bytes)?;
    let mut facts = Vec::new();
    for value in reader {
        let Value::Record(fields) = value? else {
            return Err(CodecError::Malformed(
                "debug record is not an avro record".to_string(),
            ));
        };
        let mut bucket = None;
        let mut metric = None;
        let mut unnoised = None;
        let mut annotations = Vec::new();
        for (name, field) in fields {
            match (name.as_str(), field) {
                ("bucket", Value::Bytes(b)) => bucket = Some(numeric::bucket_from_be_bytes(&b)?),
                ("metric", Value::Long(v)) => metric = Some(v),
                ("unnoised_metric", Value::Long(v)) => unnoised = Some(v),
                ("annotations", Value::Array(items)) => {
                    for item in items {
                        let Value::Enum(_, symbol) = item else {
                            return Err(CodecError::Malformed(
                                "annotation is not an enum value".to_string(),
                            ));
                        };
                        let annotation =
                            DebugBucketAnnotation::from_symbol(&symbol).ok_or_else(|| {
                                CodecError::Malformed(format!("unknown annotation {symbol}"))
                            })?;
                        annotations.push(annotation);
                    }
                }
                _ => {}
            }
        }
        match (bucket, metric, unnoised) {
            (Some(bucket), Some(metric), Some(unnoised)) => {
                let unnoised = u64::try_from(unnoised).map_err(|_| {
                    CodecError::Malformed(format!("negative unnoised metric {unnoised}"))
                })?;
                facts.push(AggregatedFact::with_annotations(
                    bucket,
                    metric,
                    unnoised,
                    annotations,
                ));
            }
            _ => {
                return Err(CodecError::Malformed(
                    "debug record is missing a required field".to_string(),
                ))
            }
        }
    }
    Ok(facts)
}
