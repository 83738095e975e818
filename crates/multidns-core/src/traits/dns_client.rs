// # DNS Server Client Trait
//
// Defines the interface for executing one operation against one backend server.
//
// ## Implementations
//
// - PowerDNS HTTP API: `multidns-powerdns` crate
//
// ## Usage
//
// ```rust,ignore
// use multidns_core::{DnsServerClient, OperationDescriptor, ServerProfile};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let client = /* DnsServerClient implementation */;
//     let profile = ServerProfile::new(1, "Primary", "http://ns1:8081", "key");
//
//     let op = OperationDescriptor::delete_zone("example.com.");
//     client.execute(&profile, &op).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ServerProfile;
use crate::operation::OperationDescriptor;

/// Identity reported by a server's liveness endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server id (e.g., "localhost")
    #[serde(default)]
    pub id: String,
    /// Software version
    #[serde(default)]
    pub version: Option<String>,
    /// Daemon type (e.g., "authoritative")
    #[serde(default)]
    pub daemon_type: Option<String>,
}

/// Trait for single-server client implementations
///
/// A client receives the connection profile on every call, so one instance
/// can be shared by every concurrent per-server task of an orchestration call.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to the profile's endpoint only
/// - ✅ Parse server-specific responses
/// - ✅ Return success or a typed failure
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads (every call must be joined by the dispatcher)
/// - ❌ Access other servers' profiles
/// - ❌ Decide which servers an operation targets (owned by `OrchestrationEngine`)
/// - ❌ Cache state between calls
///
/// Retries, if any, belong inside a single `execute` call and are invisible
/// to the dispatcher, which applies the profile's timeout around the whole call.
#[async_trait]
pub trait DnsServerClient: Send + Sync {
    /// Execute one operation against one server
    ///
    /// # Parameters
    ///
    /// - `profile`: Connection parameters of the target server
    /// - `operation`: The operation to apply, payload forwarded verbatim
    ///
    /// # Returns
    ///
    /// - `Ok(Value)`: The server's representation of the affected resource
    ///   (`Value::Null` when there is none)
    /// - `Err(Error)`: A typed failure
    async fn execute(
        &self,
        profile: &ServerProfile,
        operation: &OperationDescriptor,
    ) -> Result<serde_json::Value, crate::Error>;

    /// Read-only, side-effect-free liveness check
    ///
    /// # Returns
    ///
    /// - `Ok(ServerInfo)`: The server answered
    /// - `Err(Error)`: The server is unreachable or refused the request
    async fn server_info(&self, profile: &ServerProfile) -> Result<ServerInfo, crate::Error>;

    /// Number of zones hosted by the server (read-only, used by full health checks)
    ///
    /// Clients that cannot list zones keep the default, which fails.
    async fn zone_count(&self, profile: &ServerProfile) -> Result<usize, crate::Error> {
        Err(crate::Error::client(
            self.client_name(),
            format!("Zone listing not supported for {}", profile.name),
        ))
    }

    /// Get the client name (for logging/debugging)
    fn client_name(&self) -> &'static str;
}
