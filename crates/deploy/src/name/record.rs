//! IPNS revisions and their signed wire encoding.
//!
//! Records carry both signature versions: V1 over `value || validity || "EOL"`
//! and V2 over `"ipns-signature:" || data`, where `data` is the DAG-CBOR map
//! of the record fields in canonical key order.

use crate::errors::{DeployError, Result};
use crate::name::key::{IpnsName, NameKey};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use ciborium::value::{Integer, Value};
use ed25519_dalek::{Signature, Verifier};
use prost::Message;
use std::time::Duration;

const SIGNATURE_V2_PREFIX: &[u8] = b"ipns-signature:";
const VALIDITY_TYPE_EOL: i32 = 0;

/// `IpnsEntry` protobuf as exchanged with the naming network.
#[derive(Clone, PartialEq, Message)]
struct IpnsEntry {
    #[prost(bytes = "vec", optional, tag = "1")]
    value: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "2")]
    signature_v1: Option<Vec<u8>>,
    #[prost(int32, optional, tag = "3")]
    validity_type: Option<i32>,
    #[prost(bytes = "vec", optional, tag = "4")]
    validity: Option<Vec<u8>>,
    #[prost(uint64, optional, tag = "5")]
    sequence: Option<u64>,
    #[prost(uint64, optional, tag = "6")]
    ttl: Option<u64>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub_key: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "8")]
    signature_v2: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "9")]
    data: Option<Vec<u8>>,
}

/// One version of a name's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    sequence: u64,
    value: String,
    validity: DateTime<Utc>,
}

impl Revision {
    /// First revision for a name that has never been published.
    pub fn initial(value: impl Into<String>, validity: DateTime<Utc>) -> Self {
        Self {
            sequence: 0,
            value: value.into(),
            validity,
        }
    }

    /// Next revision after `self`. Pure: `self` is left untouched, so two
    /// calls on the same base produce the same sequence.
    pub fn increment(&self, value: impl Into<String>, validity: DateTime<Utc>) -> Result<Self> {
        let sequence = self
            .sequence
            .checked_add(1)
            .ok_or_else(|| DeployError::InvalidRecord("sequence number exhausted".into()))?;
        Ok(Self {
            sequence,
            value: value.into(),
            validity,
        })
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn validity(&self) -> DateTime<Utc> {
        self.validity
    }

    fn validity_string(&self) -> String {
        self.validity.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }
}

/// A revision signed by its name key.
#[derive(Clone, PartialEq)]
pub struct SignedRecord {
    entry: IpnsEntry,
}

impl SignedRecord {
    pub fn sign(revision: &Revision, key: &NameKey, ttl: Duration) -> Result<Self> {
        let value = revision.value.as_bytes().to_vec();
        let validity = revision.validity_string().into_bytes();
        let ttl_ns = u64::try_from(ttl.as_nanos()).unwrap_or(u64::MAX);

        let data = encode_data(&value, &validity, revision.sequence, ttl_ns)?;

        let mut v1_payload = Vec::with_capacity(value.len() + validity.len() + 3);
        v1_payload.extend_from_slice(&value);
        v1_payload.extend_from_slice(&validity);
        v1_payload.extend_from_slice(b"EOL");
        let signature_v1 = key.sign(&v1_payload);

        let signature_v2 = key.sign(&v2_payload(&data));

        Ok(Self {
            entry: IpnsEntry {
                value: Some(value),
                signature_v1: Some(signature_v1.to_bytes().to_vec()),
                validity_type: Some(VALIDITY_TYPE_EOL),
                validity: Some(validity),
                sequence: Some(revision.sequence),
                ttl: Some(ttl_ns),
                pub_key: None,
                signature_v2: Some(signature_v2.to_bytes().to_vec()),
                data: Some(data),
            },
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let entry =
            IpnsEntry::decode(bytes).map_err(|e| DeployError::InvalidRecord(e.to_string()))?;
        Ok(Self { entry })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.entry.encode_to_vec()
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| DeployError::InvalidRecord(format!("invalid base64: {e}")))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    /// Check the V2 signature against `name` and return the revision it
    /// carries.
    pub fn verify(&self, name: &IpnsName) -> Result<Revision> {
        let data = self
            .entry
            .data
            .as_deref()
            .ok_or_else(|| DeployError::InvalidRecord("record has no data field".into()))?;
        let signature_bytes = self
            .entry
            .signature_v2
            .as_deref()
            .ok_or_else(|| DeployError::InvalidRecord("record has no V2 signature".into()))?;
        let signature = Signature::from_slice(signature_bytes)
            .map_err(|e| DeployError::InvalidRecord(e.to_string()))?;
        name.public_key()
            .verify(&v2_payload(data), &signature)
            .map_err(|_| DeployError::InvalidRecord(format!("signature does not match {name}")))?;

        let fields = decode_data(data)?;
        if let Some(value) = &self.entry.value {
            if *value != fields.value {
                return Err(DeployError::InvalidRecord(
                    "protobuf value does not match signed data".into(),
                ));
            }
        }
        if let Some(sequence) = self.entry.sequence {
            if sequence != fields.sequence {
                return Err(DeployError::InvalidRecord(
                    "protobuf sequence does not match signed data".into(),
                ));
            }
        }

        let value = String::from_utf8(fields.value)
            .map_err(|_| DeployError::InvalidRecord("value is not UTF-8".into()))?;
        let validity = std::str::from_utf8(&fields.validity)
            .ok()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .ok_or_else(|| DeployError::InvalidRecord("validity is not RFC 3339".into()))?
            .with_timezone(&Utc);

        Ok(Revision {
            sequence: fields.sequence,
            value,
            validity,
        })
    }
}

impl std::fmt::Debug for SignedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedRecord")
            .field("sequence", &self.entry.sequence)
            .field("value", &self.entry.value.as_deref().map(String::from_utf8_lossy))
            .finish_non_exhaustive()
    }
}

fn v2_payload(data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(SIGNATURE_V2_PREFIX.len() + data.len());
    payload.extend_from_slice(SIGNATURE_V2_PREFIX);
    payload.extend_from_slice(data);
    payload
}

// DAG-CBOR orders map keys by length, then bytewise.
fn encode_data(value: &[u8], validity: &[u8], sequence: u64, ttl_ns: u64) -> Result<Vec<u8>> {
    let map = Value::Map(vec![
        (Value::Text("TTL".into()), Value::Integer(Integer::from(ttl_ns))),
        (Value::Text("Value".into()), Value::Bytes(value.to_vec())),
        (
            Value::Text("Sequence".into()),
            Value::Integer(Integer::from(sequence)),
        ),
        (Value::Text("Validity".into()), Value::Bytes(validity.to_vec())),
        (
            Value::Text("ValidityType".into()),
            Value::Integer(Integer::from(VALIDITY_TYPE_EOL)),
        ),
    ]);
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&map, &mut buf)
        .map_err(|e| DeployError::InvalidRecord(e.to_string()))?;
    Ok(buf)
}

struct DataFields {
    value: Vec<u8>,
    validity: Vec<u8>,
    sequence: u64,
}

fn decode_data(data: &[u8]) -> Result<DataFields> {
    let parsed: Value =
        ciborium::de::from_reader(data).map_err(|e| DeployError::InvalidRecord(e.to_string()))?;
    let Value::Map(entries) = parsed else {
        return Err(DeployError::InvalidRecord("data is not a CBOR map".into()));
    };

    let mut value = None;
    let mut validity = None;
    let mut sequence = None;
    for (key, field) in entries {
        match (key.as_text(), field) {
            (Some("Value"), Value::Bytes(bytes)) => value = Some(bytes),
            (Some("Validity"), Value::Bytes(bytes)) => validity = Some(bytes),
            (Some("Sequence"), Value::Integer(n)) => sequence = u64::try_from(n).ok(),
            _ => {}
        }
    }

    match (value, validity, sequence) {
        (Some(value), Some(validity), Some(sequence)) => Ok(DataFields {
            value,
            validity,
            sequence,
        }),
        _ => Err(DeployError::InvalidRecord(
            "data is missing Value, Validity or Sequence".into(),
        )),
    }
}
