//! Operation descriptors
//!
//! An [`OperationDescriptor`] is one logical mutation requested by a caller.
//! The engine never looks inside its payload; it is forwarded verbatim to the
//! single-server client, which knows how to turn it into API calls.

use serde::{Deserialize, Serialize};

/// Kind of mutation to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum OperationKind {
    /// Create a zone
    CreateZone,
    /// Delete a zone
    DeleteZone,
    /// Create a record set
    CreateRecord,
    /// Replace an existing record set
    UpdateRecord,
    /// Delete a record set
    DeleteRecord,
}

impl OperationKind {
    /// Label used at the start of summary messages
    pub fn summary_label(&self) -> &'static str {
        match self {
            Self::CreateZone => "Zone created",
            Self::DeleteZone => "Zone deleted",
            Self::CreateRecord => "Record created",
            Self::UpdateRecord => "Record updated",
            Self::DeleteRecord => "Record deleted",
        }
    }

    /// HTTP status the caller-facing layer returns when every server succeeded
    pub fn success_status(&self) -> u16 {
        match self {
            Self::CreateZone | Self::CreateRecord => 201,
            Self::DeleteZone | Self::UpdateRecord | Self::DeleteRecord => 200,
        }
    }

    /// Stable identifier for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateZone => "create_zone",
            Self::DeleteZone => "delete_zone",
            Self::CreateRecord => "create_record",
            Self::UpdateRecord => "update_record",
            Self::DeleteRecord => "delete_record",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical mutation, created fresh per caller request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// What to do
    pub kind: OperationKind,

    /// The zone the operation applies to
    pub zone: String,

    /// Operation-specific data, opaque to the engine
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl OperationDescriptor {
    /// Create a descriptor from raw parts
    pub fn new(kind: OperationKind, zone: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind,
            zone: zone.into(),
            payload,
        }
    }

    /// Create a zone
    pub fn create_zone(zone: &ZoneSpec) -> Self {
        Self::new(
            OperationKind::CreateZone,
            zone.name.clone(),
            serde_json::to_value(zone).unwrap_or_default(),
        )
    }

    /// Delete a zone
    pub fn delete_zone(zone: impl Into<String>) -> Self {
        Self::new(OperationKind::DeleteZone, zone, serde_json::Value::Null)
    }

    /// Create a record set in a zone
    pub fn create_record(zone: impl Into<String>, record: &RecordSpec) -> Self {
        Self::new(
            OperationKind::CreateRecord,
            zone,
            serde_json::to_value(record).unwrap_or_default(),
        )
    }

    /// Replace a record set in a zone
    pub fn update_record(zone: impl Into<String>, record: &RecordSpec) -> Self {
        Self::new(
            OperationKind::UpdateRecord,
            zone,
            serde_json::to_value(record).unwrap_or_default(),
        )
    }

    /// Delete a record set from a zone
    pub fn delete_record(
        zone: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
    ) -> Self {
        Self::new(
            OperationKind::DeleteRecord,
            zone,
            serde_json::json!({
                "name": name.into(),
                "type": record_type.into(),
            }),
        )
    }

    /// Validate the descriptor's envelope (not its payload)
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone.trim().is_empty() {
            return Err(crate::Error::config("Operation zone cannot be empty"));
        }
        Ok(())
    }
}

/// Zone kind as understood by PowerDNS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZoneKind {
    /// Replication handled by the backend database
    #[default]
    Native,
    /// Primary zone, sends notifies
    Master,
    /// Secondary zone, pulls from masters
    Slave,
}

/// Zone creation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSpec {
    /// Zone name (e.g., "example.com.")
    pub name: String,

    /// Zone kind
    #[serde(default)]
    pub kind: ZoneKind,

    /// Masters for secondary zones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub masters: Vec<String>,

    /// Owning account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// Nameservers to create NS records for
    #[serde(default)]
    pub nameservers: Vec<String>,
}

impl ZoneSpec {
    /// Create a native zone with no nameservers
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ZoneKind::Native,
            masters: Vec::new(),
            account: None,
            nameservers: Vec::new(),
        }
    }

    /// Set the zone kind
    pub fn with_kind(mut self, kind: ZoneKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the masters list
    pub fn with_masters(mut self, masters: Vec<String>) -> Self {
        self.masters = masters;
        self
    }

    /// Set the owning account
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }
}

/// Record set payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Owner name (e.g., "www.example.com.")
    pub name: String,

    /// Record type (e.g., "A", "MX")
    #[serde(rename = "type")]
    pub record_type: String,

    /// Record contents, one entry per record in the set
    pub contents: Vec<String>,

    /// Time-to-live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    /// Whether the records are disabled
    #[serde(default)]
    pub disabled: bool,
}

impl RecordSpec {
    /// Create a record set with a single content entry
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            contents: vec![content.into()],
            ttl: None,
            disabled: false,
        }
    }

    /// Set the time-to-live
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Add another content entry to the set
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.contents.push(content.into());
        self
    }

    /// Mark the records disabled
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}
