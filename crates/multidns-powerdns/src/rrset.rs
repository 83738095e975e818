// # PowerDNS Wire Types
//
// Request bodies for the zone and rrset endpoints, built from the opaque
// operation payloads.

use multidns_core::{OperationKind, RecordSpec, ZoneSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// TTL used when a record payload does not carry one (PowerDNS requires it on REPLACE)
pub const DEFAULT_TTL: u32 = 3600;

/// A payload that cannot be turned into a PowerDNS request
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("invalid {kind} payload: {source}")]
    Malformed {
        kind: OperationKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} payload is missing field '{field}'")]
    MissingField {
        kind: OperationKind,
        field: &'static str,
    },
}

impl From<PayloadError> for multidns_core::Error {
    fn from(err: PayloadError) -> Self {
        multidns_core::Error::rejected(err.to_string())
    }
}

/// How an rrset is changed by a PATCH
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Replace,
    Delete,
}

/// One record inside an rrset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub content: String,
    pub disabled: bool,
}

/// One rrset of a PATCH body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrSet {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changetype: Option<ChangeType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<Record>,
}

impl RrSet {
    /// The rrset as it should exist after the change
    pub fn replace(record: &RecordSpec) -> Self {
        Self {
            name: record.name.clone(),
            record_type: record.record_type.clone(),
            ttl: Some(record.ttl.unwrap_or(DEFAULT_TTL)),
            changetype: Some(ChangeType::Replace),
            records: record
                .contents
                .iter()
                .map(|content| Record {
                    content: content.clone(),
                    disabled: record.disabled,
                })
                .collect(),
        }
    }

    /// Removal of every record with this name and type
    pub fn delete(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            ttl: None,
            changetype: Some(ChangeType::Delete),
            records: Vec::new(),
        }
    }

    /// The rrset without its change marker, as reported back to callers
    pub fn representation(&self) -> Value {
        let mut rrset = self.clone();
        rrset.changetype = None;
        serde_json::to_value(rrset).unwrap_or(Value::Null)
    }
}

/// Body of `PATCH /zones/{zone}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrSetPatch {
    pub rrsets: Vec<RrSet>,
}

impl RrSetPatch {
    pub fn single(rrset: RrSet) -> Self {
        Self {
            rrsets: vec![rrset],
        }
    }
}

/// Decode a create-zone payload, defaulting the name to the operation zone
pub fn zone_spec(zone: &str, payload: &Value) -> Result<ZoneSpec, PayloadError> {
    let mut payload = payload.clone();
    if let Value::Object(map) = &mut payload {
        map.entry("name")
            .or_insert_with(|| Value::String(zone.to_string()));
    } else if payload.is_null() {
        return Ok(ZoneSpec::new(zone));
    }

    serde_json::from_value(payload).map_err(|source| PayloadError::Malformed {
        kind: OperationKind::CreateZone,
        source,
    })
}

/// Decode a create/update-record payload
pub fn record_spec(kind: OperationKind, payload: &Value) -> Result<RecordSpec, PayloadError> {
    let record: RecordSpec =
        serde_json::from_value(payload.clone()).map_err(|source| PayloadError::Malformed {
            kind,
            source,
        })?;
    if record.contents.is_empty() {
        return Err(PayloadError::MissingField {
            kind,
            field: "contents",
        });
    }
    Ok(record)
}

/// Decode a delete-record payload into `(name, type)`
pub fn record_key(payload: &Value) -> Result<(String, String), PayloadError> {
    let field = |field: &'static str| {
        payload
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(PayloadError::MissingField {
                kind: OperationKind::DeleteRecord,
                field,
            })
    };
    Ok((field("name")?, field("type")?))
}
