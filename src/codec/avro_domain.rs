use apache_avro::types::{Record, Value};
use apache_avro::{Reader, Schema, Writer};

use super::CodecError;
use crate::util::numeric;

/// Avro schema for one output-domain record: a single 16-byte big-endian
/// bucket key.
const DOMAIN_SCHEMA_JSON: &str = r#"
{
  "type": "record",
  "name": "AggregationBucket",
  "fields": [
    {"name": "bucket", "type": "bytes"}
  ]
}
"#;

fn domain_schema() -> Result<Schema, CodecError> {
    Ok(Schema::parse_str(DOMAIN_SCHEMA_JSON)?)
}

/// Lazy reader over one Avro output-domain shard.
pub struct DomainShardReader<'a> {
    inner: Reader<'a, &'a [u8]>,
}

impl<'a> DomainShardReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self, CodecError> {
        Ok(Self {
            inner: Reader::new(bytes)?,
        })
    }
}

impl Iterator for DomainShardReader<'_> {
    type Item = Result<u128, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        let value = match self.inner.next()? {
            Ok(value) => value,
            Err(e) => return Some(Err(e.into())),
        };
        Some(decode_domain_record(value))
    }
}

fn decode_domain_record(value: Value) -> Result<u128, CodecError> {
    let Value::Record(fields) = value else {
        return Err(CodecError::Malformed(
            "domain record is not an avro record".to_string(),
        ));
    };
    match fields.as_slice() {
        [(name, Value::Bytes(bytes))] if name == "bucket" => numeric::bucket_from_be_bytes(bytes),
        _ => Err(CodecError::Malformed(
            "domain record does not hold a single bucket field".to_string(),
        )),
    }
}

/// Serializes bucket keys into one Avro domain shard.
pub fn write_domain_shard(buckets: &[u128]) -> Result<Vec<u8>, CodecError> {
    let schema = domain_schema()?;
    let mut writer = Writer::new(&schema, Vec::new());
    for bucket in buckets {
        let mut record = Record::new(writer.schema()).ok_or_else(|| {
            CodecError::Malformed("domain schema is not a record schema".to_string())
        })?;
        record.put(
            "bucket",
            Value::Bytes(numeric::bucket_to_be_bytes(*bucket).to_vec()),
        );
        writer.append(record)?;
    }
    Ok(writer.into_inner()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_roundtrip() {
        let buckets = vec![0u128, 7, u128::MAX];
        let bytes = write_domain_shard(&buckets).unwrap();
        let decoded: Vec<_> = DomainShardReader::new(&bytes)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(decoded, buckets);
    }

    #[test]
    fn empty_shard_parses() {
        let bytes = write_domain_shard(&[]).unwrap();
        let decoded: Vec<_> = DomainShardReader::new(&bytes)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(decoded.is_empty());
    }
}
