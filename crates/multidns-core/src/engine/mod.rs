//! Orchestration engine
//!
//! The OrchestrationEngine is responsible for:
//! - Selecting target servers from a registry snapshot
//! - Fanning the operation out through the Dispatcher
//! - Reducing the outcomes through the Aggregator
//! - Emitting events for monitoring/logging
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ RegistrySnapshot │─── profiles ───┐
//! └──────────────────┘                │
//!                                     ▼
//!                         ┌──────────────────────┐
//!                         │ OrchestrationEngine  │
//!                         └──────────────────────┘
//!                                     │
//!         ┌───────────────────────────┼───────────────────────────┐
//!         │                           │                           │
//!         ▼                           ▼                           ▼
//! ┌─────────────┐           ┌──────────────┐           ┌─────────────┐
//! │ Dispatcher  │           │  Aggregator  │           │   Events    │
//! │ (fan-out)   │──────────▶│  (fan-in)    │           │  (notify)   │
//! └─────────────┘           └──────────────┘           └─────────────┘
//! ```
//!
//! ## Target Selection
//!
//! 1. `multi` = active profiles with `multi_server_mode`
//! 2. If `multi` is non-empty, target `multi`
//! 3. Otherwise target the active default profile, if there is one
//! 4. Otherwise target nothing (`NoTargets`)
//!
//! Health status is never consulted here.

use crate::aggregate::{AggregatedResult, Aggregator, OverallStatus};
use crate::config::{EngineConfig, ServerProfile};
use crate::dispatch::Dispatcher;
use crate::error::{ErrorDetail, Result};
use crate::metrics::PerformanceMetrics;
use crate::operation::{OperationDescriptor, OperationKind};
use crate::registry::RegistrySnapshot;
use crate::traits::{DnsServerClient, RegistrySource};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How the target set was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// One or more servers opted into fan-out
    MultiServer,
    /// Fell back to the active default server
    DefaultServer,
    /// No eligible server
    NoTargets,
}

/// The servers an operation will be applied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSelection {
    /// How the targets were chosen
    pub mode: SelectionMode,
    /// Targets in dispatch order
    pub targets: Vec<ServerProfile>,
}

impl TargetSelection {
    /// Target names in dispatch order
    pub fn names(&self) -> Vec<String> {
        self.targets.iter().map(|p| p.name.clone()).collect()
    }
}

/// Compute the target set for an operation
///
/// Profiles are copied out of the snapshot, so the selection stays valid
/// however the registry changes afterwards.
pub fn select_targets(snapshot: &RegistrySnapshot) -> TargetSelection {
    let multi: Vec<ServerProfile> = snapshot
        .active()
        .filter(|p| p.multi_server_mode)
        .cloned()
        .collect();

    if !multi.is_empty() {
        return TargetSelection {
            mode: SelectionMode::MultiServer,
            targets: multi,
        };
    }

    match snapshot.active().find(|p| p.is_default) {
        Some(default) => TargetSelection {
            mode: SelectionMode::DefaultServer,
            targets: vec![default.clone()],
        },
        None => TargetSelection {
            mode: SelectionMode::NoTargets,
            targets: Vec::new(),
        },
    }
}

/// Events emitted by the OrchestrationEngine
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestrationEvent {
    /// Targets selected, dispatch about to begin
    OperationStarted {
        kind: OperationKind,
        zone: String,
        mode: SelectionMode,
        targets: Vec<String>,
    },

    /// The operation succeeded on one server
    ServerSucceeded {
        server_name: String,
        latency_millis: u64,
    },

    /// The operation failed on one server
    ServerFailed {
        server_name: String,
        detail: ErrorDetail,
    },

    /// No server was eligible
    NoTargets {
        kind: OperationKind,
        zone: String,
    },

    /// All outcomes are in
    OperationCompleted {
        kind: OperationKind,
        status: OverallStatus,
        summary: String,
        /// Wall time of the whole fan-out
        execution_time_millis: u64,
    },
}

/// Core orchestration engine
///
/// The engine applies one logical operation to every selected server and
/// returns one aggregated result.
///
/// ## Lifecycle
///
/// 1. Create with [`OrchestrationEngine::new()`]
/// 2. Call [`OrchestrationEngine::execute()`] (or `execute_from`) per request
/// 3. Drop to cleanup
///
/// ## Threading
///
/// The engine holds no per-call state; it can be shared behind an `Arc` and
/// used by many callers at once. Each call works on its own snapshot copy.
pub struct OrchestrationEngine {
    /// Fan-out to the selected servers
    dispatcher: Dispatcher,

    /// Fan-in of the outcomes
    aggregator: Aggregator,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<OrchestrationEvent>,

    /// Latencies of successful calls, per server
    metrics: PerformanceMetrics,
}

impl OrchestrationEngine {
    /// Create a new orchestration engine
    ///
    /// # Parameters
    ///
    /// - `client`: Single-server client used for every call
    /// - `config`: Engine configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        client: Arc<dyn DnsServerClient>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<OrchestrationEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            dispatcher: Dispatcher::new(client),
            aggregator: Aggregator::new(),
            event_tx: tx,
            metrics: PerformanceMetrics::new(),
        };

        Ok((engine, rx))
    }

    /// Apply an operation to the servers selected from `snapshot`
    ///
    /// Never fails: every outcome, including "no eligible servers", is
    /// expressed as an [`AggregatedResult`].
    pub async fn execute(
        &self,
        operation: &OperationDescriptor,
        snapshot: &RegistrySnapshot,
    ) -> AggregatedResult {
        let selection = select_targets(snapshot);
        debug!(
            "Selected {:?} for {} on {}: {:?}",
            selection.mode,
            operation.kind,
            operation.zone,
            selection.names()
        );

        if selection.targets.is_empty() {
            warn!(
                "No active PowerDNS servers for {} on {}",
                operation.kind, operation.zone
            );
            self.emit_event(OrchestrationEvent::NoTargets {
                kind: operation.kind,
                zone: operation.zone.clone(),
            });
            return AggregatedResult::no_targets(operation.kind);
        }

        self.emit_event(OrchestrationEvent::OperationStarted {
            kind: operation.kind,
            zone: operation.zone.clone(),
            mode: selection.mode,
            targets: selection.names(),
        });

        let started = Instant::now();
        let outcomes = self.dispatcher.dispatch(operation, &selection.targets).await;
        let execution_time_millis = started.elapsed().as_millis() as u64;
        self.metrics.record_outcomes(&outcomes).await;

        for outcome in &outcomes {
            match &outcome.error_detail {
                None => self.emit_event(OrchestrationEvent::ServerSucceeded {
                    server_name: outcome.server_name.clone(),
                    latency_millis: outcome.latency_millis,
                }),
                Some(detail) => self.emit_event(OrchestrationEvent::ServerFailed {
                    server_name: outcome.server_name.clone(),
                    detail: detail.clone(),
                }),
            }
        }

        let result = self.aggregator.aggregate(operation.kind, &outcomes);

        info!(
            "{} ({}) on zone {} in {}ms",
            result.summary_message, result.overall_status, operation.zone, execution_time_millis
        );
        self.emit_event(OrchestrationEvent::OperationCompleted {
            kind: operation.kind,
            status: result.overall_status,
            summary: result.summary_message.clone(),
            execution_time_millis,
        });

        result
    }

    /// Per-server latency history of successful calls
    ///
    /// Clones share the same history; hand one to
    /// [`HealthProber::with_performance`](crate::HealthProber::with_performance).
    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// Take a snapshot from `source`, then [`execute`](Self::execute)
    ///
    /// # Errors
    ///
    /// Fails only if the snapshot cannot be obtained. Once a snapshot is in
    /// hand, the result is always `Ok`.
    pub async fn execute_from(
        &self,
        operation: &OperationDescriptor,
        source: &dyn RegistrySource,
    ) -> Result<AggregatedResult> {
        let snapshot = source.snapshot().await?;
        Ok(self.execute(operation, &snapshot).await)
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: OrchestrationEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event (raise event_channel_capacity)");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, discarding event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: u64, name: &str) -> ServerProfile {
        ServerProfile::new(id, name, "http://127.0.0.1:8081", "k")
    }

    #[test]
    fn test_multi_server_targets_win_over_default() {
        let snapshot = RegistrySnapshot::new(vec![
            profile(1, "A").with_multi_server_mode(true),
            profile(2, "B").with_multi_server_mode(true),
            profile(3, "C").with_default(true),
        ])
        .unwrap();

        let selection = select_targets(&snapshot);
        assert_eq!(selection.mode, SelectionMode::MultiServer);
        assert_eq!(selection.names(), vec!["A", "B"]);
    }

    #[test]
    fn test_single_multi_server_is_enough() {
        let snapshot = RegistrySnapshot::new(vec![
            profile(1, "A").with_multi_server_mode(true),
            profile(2, "C").with_default(true),
        ])
        .unwrap();

        let selection = select_targets(&snapshot);
        assert_eq!(selection.mode, SelectionMode::MultiServer);
        assert_eq!(selection.names(), vec!["A"]);
    }

    #[test]
    fn test_fallback_to_default() {
        let snapshot = RegistrySnapshot::new(vec![
            profile(1, "A"),
            profile(3, "C").with_default(true),
        ])
        .unwrap();

        let selection = select_targets(&snapshot);
        assert_eq!(selection.mode, SelectionMode::DefaultServer);
        assert_eq!(selection.names(), vec!["C"]);
    }

    #[test]
    fn test_inactive_servers_never_selected() {
        let snapshot = RegistrySnapshot::new(vec![
            profile(1, "A").with_multi_server_mode(true).with_active(false),
            profile(2, "C").with_default(true).with_active(false),
            profile(3, "D"),
        ])
        .unwrap();

        let selection = select_targets(&snapshot);
        assert_eq!(selection.mode, SelectionMode::NoTargets);
        assert!(selection.targets.is_empty());
    }

    #[test]
    fn test_no_default_means_no_targets() {
        let snapshot = RegistrySnapshot::new(vec![profile(1, "A"), profile(2, "B")]).unwrap();
        assert_eq!(select_targets(&snapshot).mode, SelectionMode::NoTargets);
    }
}
