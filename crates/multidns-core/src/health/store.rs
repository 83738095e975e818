// # Health Store
//
// Per-server health records, shared between probe rounds and readers.
//
// Writes to one server's record are serialized through a per-server lock held
// for the whole probe; probes of different servers never contend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::config::ServerProfile;
use crate::metrics::ServerPerformance;

/// Health status of one server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Last probe succeeded
    Healthy,
    /// Last probe failed or timed out
    Unhealthy,
    /// Never probed
    #[default]
    Unknown,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Result of the most recent probe of one server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub status: HealthStatus,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub response_time_millis: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
    /// Zones hosted, counted on full checks only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones_count: Option<usize>,
}

impl HealthRecord {
    /// A server that has not been probed yet
    pub fn unknown() -> Self {
        Self::default()
    }

    /// A successful probe
    pub fn healthy(response_time_millis: u64, server_version: Option<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            last_checked_at: Some(Utc::now()),
            response_time_millis: Some(response_time_millis),
            error_message: None,
            server_version,
            zones_count: None,
        }
    }

    /// Attach the zone count of a full check
    pub fn with_zones_count(mut self, zones_count: Option<usize>) -> Self {
        self.zones_count = zones_count;
        self
    }

    /// A failed or timed-out probe
    pub fn unhealthy(response_time_millis: u64, error_message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            last_checked_at: Some(Utc::now()),
            response_time_millis: Some(response_time_millis),
            error_message: Some(error_message.into()),
            server_version: None,
            zones_count: None,
        }
    }
}

/// Health of one configured server, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerHealth {
    pub name: String,
    pub api_url: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub record: HealthRecord,
}

/// Counts across a set of servers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub unknown: usize,
    /// Most recent probe time across all servers
    pub last_check_time: Option<DateTime<Utc>>,
    pub servers: Vec<ServerHealth>,
    /// Operation latency figures per server name
    #[serde(default)]
    pub performance_summary: HashMap<String, ServerPerformance>,
}

/// Shared health record store, keyed by server name
#[derive(Debug, Clone, Default)]
pub struct HealthStore {
    records: Arc<RwLock<HashMap<String, HealthRecord>>>,
    probe_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl HealthStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record for a server; `Unknown` if it was never probed
    pub async fn get(&self, server_name: &str) -> HealthRecord {
        let records = self.records.read().await;
        records.get(server_name).cloned().unwrap_or_default()
    }

    /// Store the record for a server
    pub async fn set(&self, server_name: &str, record: HealthRecord) {
        let mut records = self.records.write().await;
        records.insert(server_name.to_string(), record);
    }

    /// All stored records
    pub async fn all(&self) -> HashMap<String, HealthRecord> {
        self.records.read().await.clone()
    }

    /// Drop records (and idle probe locks) for servers no longer configured
    ///
    /// A lock still shared with a running probe is kept, so later probes of
    /// that name keep queueing behind it.
    pub async fn retain(&self, server_names: &[&str]) {
        {
            let mut records = self.records.write().await;
            records.retain(|name, _| server_names.contains(&name.as_str()));
        }
        let mut locks = self.probe_locks.lock().await;
        locks.retain(|name, lock| {
            server_names.contains(&name.as_str()) || Arc::strong_count(lock) > 1
        });
    }

    /// The lock serializing probes of one server
    pub async fn probe_lock(&self, server_name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.probe_locks.lock().await;
        locks
            .entry(server_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Summarize health for the given profiles, in profile order
    pub async fn summary(&self, profiles: &[ServerProfile]) -> HealthSummary {
        let records = self.records.read().await;
        let mut summary = HealthSummary::default();

        for profile in profiles {
            let record = records.get(&profile.name).cloned().unwrap_or_default();
            match record.status {
                HealthStatus::Healthy => summary.healthy += 1,
                HealthStatus::Unhealthy => summary.unhealthy += 1,
                HealthStatus::Unknown => summary.unknown += 1,
            }
            if record.last_checked_at > summary.last_check_time {
                summary.last_check_time = record.last_checked_at;
            }
            summary.servers.push(ServerHealth {
                name: profile.name.clone(),
                api_url: profile.api_url.clone(),
                is_active: profile.is_active,
                record,
            });
        }

        summary.total = profiles.len();
        summary
    }
}
