//! Operation dispatcher
//!
//! Invokes the single-server client once per target, all calls in flight at
//! the same time, and collects one [`PerServerOutcome`] per target.
//!
//! ## Guarantees
//!
//! - Every call is bounded by its own profile's timeout; a timeout becomes a
//!   failed outcome, it is never retried here.
//! - The dispatcher waits for every call to finish or time out. A fast
//!   success or failure never short-circuits the others.
//! - Outcomes come back in target order, whatever order the calls complete in.
//! - Calls are joined in place: no task outlives `dispatch`.

use crate::config::ServerProfile;
use crate::error::ErrorDetail;
use crate::operation::OperationDescriptor;
use crate::traits::DnsServerClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Raw result of one call against one server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerServerOutcome {
    /// Name of the targeted profile (a copy, not a live reference)
    pub server_name: String,

    /// Whether the call succeeded
    pub succeeded: bool,

    /// Why the call failed; present iff `succeeded` is false
    pub error_detail: Option<ErrorDetail>,

    /// Wall time of this call alone
    pub latency_millis: u64,

    /// Resource representation returned on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl PerServerOutcome {
    /// A successful outcome
    pub fn success(
        server_name: impl Into<String>,
        payload: serde_json::Value,
        latency_millis: u64,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            succeeded: true,
            error_detail: None,
            latency_millis,
            payload: Some(payload),
        }
    }

    /// A failed outcome
    pub fn failure(
        server_name: impl Into<String>,
        detail: ErrorDetail,
        latency_millis: u64,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            succeeded: false,
            error_detail: Some(detail),
            latency_millis,
            payload: None,
        }
    }
}

/// Fans one operation out to a set of servers
///
/// The dispatcher is stateless between calls; it only holds the shared client.
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<dyn DnsServerClient>,
}

impl Dispatcher {
    /// Create a dispatcher around a single-server client
    pub fn new(client: Arc<dyn DnsServerClient>) -> Self {
        Self { client }
    }

    /// Apply `operation` to every target concurrently
    ///
    /// # Parameters
    ///
    /// - `operation`: The operation, forwarded verbatim to each call
    /// - `targets`: Profiles to call, in dispatch order
    ///
    /// # Returns
    ///
    /// One outcome per target, in target order. Empty when `targets` is empty.
    pub async fn dispatch(
        &self,
        operation: &OperationDescriptor,
        targets: &[ServerProfile],
    ) -> Vec<PerServerOutcome> {
        if targets.is_empty() {
            return Vec::new();
        }

        debug!(
            "Dispatching {} on zone {} to {} server(s) via {}",
            operation.kind,
            operation.zone,
            targets.len(),
            self.client.client_name()
        );

        let calls = targets
            .iter()
            .map(|profile| self.call_one(operation, profile));

        // join_all preserves input order and polls every call to completion
        futures::future::join_all(calls).await
    }

    /// Perform a single call bounded by the profile's timeout
    async fn call_one(
        &self,
        operation: &OperationDescriptor,
        profile: &ServerProfile,
    ) -> PerServerOutcome {
        let started = Instant::now();
        let result =
            tokio::time::timeout(profile.timeout(), self.client.execute(profile, operation)).await;
        let latency_millis = started.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(payload)) => {
                debug!(
                    "{} succeeded on {} in {}ms",
                    operation.kind, profile.name, latency_millis
                );
                PerServerOutcome::success(&profile.name, payload, latency_millis)
            }
            Ok(Err(e)) => {
                warn!("{} failed on {}: {}", operation.kind, profile.name, e);
                PerServerOutcome::failure(&profile.name, ErrorDetail::from(&e), latency_millis)
            }
            Err(_) => {
                warn!(
                    "{} timed out on {} after {}ms",
                    operation.kind, profile.name, profile.timeout_millis
                );
                PerServerOutcome::failure(&profile.name, ErrorDetail::timeout(), latency_millis)
            }
        }
    }
}
