//! Configuration types for the orchestration system
//!
//! This module defines the server profile model and engine/health settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection parameters and participation flags for one backend DNS server
///
/// Profiles are owned by the registry. The engine only ever sees them as
/// immutable copies inside a [`crate::RegistrySnapshot`].
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerProfile {
    /// Stable identifier
    pub id: u64,

    /// Unique, human-readable name
    pub name: String,

    /// Base URL of the server's management API (e.g., "http://ns1:8081")
    pub api_url: String,

    /// API credential
    /// ⚠️ NEVER log this value
    pub api_key: String,

    /// Server id used in API paths
    #[serde(default = "default_server_id")]
    pub server_id: String,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_millis")]
    pub timeout_millis: u64,

    /// Whether TLS certificates are verified
    #[serde(default = "default_true")]
    pub verify_tls: bool,

    /// Whether this server is eligible for any operation
    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Whether this server is the single-server fallback target
    #[serde(default)]
    pub is_default: bool,

    /// Whether this server participates in fan-out operations
    #[serde(default)]
    pub multi_server_mode: bool,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl std::fmt::Debug for ServerProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerProfile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("api_url", &self.api_url)
            .field("api_key", &"<REDACTED>")
            .field("server_id", &self.server_id)
            .field("timeout_millis", &self.timeout_millis)
            .field("verify_tls", &self.verify_tls)
            .field("is_active", &self.is_active)
            .field("is_default", &self.is_default)
            .field("multi_server_mode", &self.multi_server_mode)
            .finish()
    }
}

impl ServerProfile {
    /// Create an active, non-default, single-server-mode profile
    pub fn new(
        id: u64,
        name: impl Into<String>,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            server_id: default_server_id(),
            timeout_millis: default_timeout_millis(),
            verify_tls: true,
            is_active: true,
            is_default: false,
            multi_server_mode: false,
            description: None,
        }
    }

    /// Set the per-call timeout
    pub fn with_timeout_millis(mut self, timeout_millis: u64) -> Self {
        self.timeout_millis = timeout_millis;
        self
    }

    /// Enable or disable TLS verification
    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    /// Mark the profile active or inactive
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Mark the profile as the default server
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Opt the profile in or out of fan-out operations
    pub fn with_multi_server_mode(mut self, multi_server_mode: bool) -> Self {
        self.multi_server_mode = multi_server_mode;
        self
    }

    /// Set the server id used in API paths
    pub fn with_server_id(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = server_id.into();
        self
    }

    /// The per-call timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }

    /// Validate a single profile
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Server {} has an empty name",
                self.id
            )));
        }
        if self.api_url.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Server '{}' has an empty API URL",
                self.name
            )));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "Server '{}' API URL must use http or https. Got: {}",
                self.name, self.api_url
            )));
        }
        if self.timeout_millis == 0 {
            return Err(crate::Error::config(format!(
                "Server '{}' timeout must be > 0",
                self.name
            )));
        }
        Ok(())
    }
}

fn default_server_id() -> String {
    "localhost".to_string()
}

fn default_timeout_millis() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the orchestration event channel
    ///
    /// When full, new events are dropped (with a warning log) rather than
    /// blocking an orchestration call.
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    1000
}

/// Health probing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Interval between periodic probe rounds (in seconds)
    #[serde(default = "default_health_interval_secs")]
    pub interval_secs: u64,

    /// Optional cap on the probe timeout (in milliseconds)
    ///
    /// When set, a probe waits for `min(profile timeout, cap)`.
    #[serde(default)]
    pub quick_timeout_millis: Option<u64>,

    /// Run full checks, which also count the zones each server hosts
    ///
    /// Default: false (liveness only)
    #[serde(default)]
    pub count_zones: bool,
}

impl HealthConfig {
    /// Validate the health configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Health probe interval must be > 0"));
        }
        if self.quick_timeout_millis == Some(0) {
            return Err(crate::Error::config("Health probe timeout cap must be > 0"));
        }
        Ok(())
    }

    /// The interval as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Effective probe timeout for a profile
    pub fn probe_timeout(&self, profile: &ServerProfile) -> Duration {
        match self.quick_timeout_millis {
            Some(cap) => Duration::from_millis(profile.timeout_millis.min(cap)),
            None => profile.timeout(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_health_interval_secs(),
            quick_timeout_millis: None,
            count_zones: false,
        }
    }
}

fn default_health_interval_secs() -> u64 {
    60
}
