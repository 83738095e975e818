//! Result aggregation
//!
//! Reduces the per-server outcomes of one dispatch into a single
//! [`AggregatedResult`]. Aggregation is a pure function of its inputs: the
//! same operation kind and outcomes always yield the same result.
//!
//! | Outcomes | Status |
//! |---|---|
//! | none | `NoTargets` |
//! | all succeeded | `AllSucceeded` |
//! | all failed | `AllFailed` |
//! | mixed | `PartialSuccess` |

use crate::dispatch::PerServerOutcome;
use crate::error::{ErrorDetail, FailureCause};
use crate::operation::OperationKind;
use serde::{Deserialize, Serialize};

/// Message reported when no server was eligible for an operation
pub const NO_TARGETS_MESSAGE: &str = "No PowerDNS servers configured or active";

/// Overall status of one orchestration call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every targeted server succeeded
    AllSucceeded,
    /// A strict, non-empty subset of servers succeeded
    PartialSuccess,
    /// Every targeted server failed
    AllFailed,
    /// No server was eligible
    NoTargets,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AllSucceeded => "all_succeeded",
            Self::PartialSuccess => "partial_success",
            Self::AllFailed => "all_failed",
            Self::NoTargets => "no_targets",
        };
        f.write_str(s)
    }
}

/// A server that failed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFailure {
    /// Server name
    pub server_name: String,
    /// Why it failed
    pub detail: ErrorDetail,
}

/// Latency figures derived from the outcomes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Mean latency across all outcomes
    pub average_millis: f64,
    /// Slowest single call
    pub max_millis: u64,
    /// Successful server with the lowest latency (first in dispatch order on ties)
    pub fastest_server: Option<String>,
}

/// The single result an orchestration call hands back to its caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Operation this result is for
    pub kind: OperationKind,

    /// Overall status
    pub overall_status: OverallStatus,

    /// Servers that succeeded, in dispatch order
    pub successful_servers: Vec<String>,

    /// Servers that failed, in dispatch order
    pub failed_servers: Vec<ServerFailure>,

    /// Deterministic human-readable summary
    pub summary_message: String,

    /// Number of servers targeted
    pub total_servers: usize,

    /// Resource representation from the first successful server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,

    /// Latency figures
    pub latency: LatencySummary,
}

impl AggregatedResult {
    /// The result for an operation that had no eligible server
    pub fn no_targets(kind: OperationKind) -> Self {
        Self {
            kind,
            overall_status: OverallStatus::NoTargets,
            successful_servers: Vec::new(),
            failed_servers: Vec::new(),
            summary_message: NO_TARGETS_MESSAGE.to_string(),
            total_servers: 0,
            payload: None,
            latency: LatencySummary::default(),
        }
    }

    /// Whether every failure was a timeout or an unreachable server
    ///
    /// Returns `false` when nothing failed.
    pub fn all_failures_connectivity(&self) -> bool {
        !self.failed_servers.is_empty()
            && self
                .failed_servers
                .iter()
                .all(|f| f.detail.cause.is_connectivity())
    }

    /// Failures grouped by cause, in first-seen order
    pub fn failure_causes(&self) -> Vec<FailureCause> {
        let mut causes = Vec::new();
        for failure in &self.failed_servers {
            if !causes.contains(&failure.detail.cause) {
                causes.push(failure.detail.cause);
            }
        }
        causes
    }

    /// `"<name>: <reason>"` for each failed server
    pub fn error_lines(&self) -> Vec<String> {
        self.failed_servers
            .iter()
            .map(|f| format!("{}: {}", f.server_name, f.detail))
            .collect()
    }
}

/// Reduces per-server outcomes into an [`AggregatedResult`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    /// Create an aggregator
    pub fn new() -> Self {
        Self
    }

    /// Aggregate outcomes for one operation
    ///
    /// Server lists keep the order of `outcomes`, which is dispatch order.
    pub fn aggregate(
        &self,
        kind: OperationKind,
        outcomes: &[PerServerOutcome],
    ) -> AggregatedResult {
        aggregate(kind, outcomes)
    }
}

/// Aggregate outcomes for one operation
///
/// See [`Aggregator::aggregate`].
pub fn aggregate(kind: OperationKind, outcomes: &[PerServerOutcome]) -> AggregatedResult {
    if outcomes.is_empty() {
        return AggregatedResult::no_targets(kind);
    }

    let mut successful_servers = Vec::new();
    let mut failed_servers = Vec::new();
    let mut payload = None;

    for outcome in outcomes {
        if outcome.succeeded {
            successful_servers.push(outcome.server_name.clone());
            if payload.is_none() {
                payload = outcome.payload.clone().filter(|p| !p.is_null());
            }
        } else {
            let detail = outcome
                .error_detail
                .clone()
                .unwrap_or_else(|| ErrorDetail::new(FailureCause::Other, "unknown error"));
            failed_servers.push(ServerFailure {
                server_name: outcome.server_name.clone(),
                detail,
            });
        }
    }

    let total_servers = outcomes.len();
    let overall_status = if failed_servers.is_empty() {
        OverallStatus::AllSucceeded
    } else if successful_servers.is_empty() {
        OverallStatus::AllFailed
    } else {
        OverallStatus::PartialSuccess
    };

    let summary_message = format!(
        "{} on {}/{} servers",
        kind.summary_label(),
        successful_servers.len(),
        total_servers
    );

    AggregatedResult {
        kind,
        overall_status,
        successful_servers,
        failed_servers,
        summary_message,
        total_servers,
        payload,
        latency: summarize_latency(outcomes),
    }
}

fn summarize_latency(outcomes: &[PerServerOutcome]) -> LatencySummary {
    let total: u64 = outcomes.iter().map(|o| o.latency_millis).sum();
    let max_millis = outcomes.iter().map(|o| o.latency_millis).max().unwrap_or(0);

    let mut fastest: Option<&PerServerOutcome> = None;
    for outcome in outcomes.iter().filter(|o| o.succeeded) {
        match fastest {
            Some(best) if best.latency_millis <= outcome.latency_millis => {}
            _ => fastest = Some(outcome),
        }
    }

    LatencySummary {
        average_millis: total as f64 / outcomes.len() as f64,
        max_millis,
        fastest_server: fastest.map(|o| o.server_name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(name: &str, latency: u64) -> PerServerOutcome {
        PerServerOutcome::success(name, serde_json::json!({ "on": name }), latency)
    }

    fn failed(name: &str, cause: FailureCause) -> PerServerOutcome {
        PerServerOutcome::failure(name, ErrorDetail::new(cause, cause.as_str()), 5)
    }

    #[test]
    fn test_empty_is_no_targets() {
        let result = aggregate(OperationKind::CreateRecord, &[]);

        assert_eq!(result.overall_status, OverallStatus::NoTargets);
        assert!(result.successful_servers.is_empty());
        assert!(result.failed_servers.is_empty());
        assert_eq!(result.summary_message, NO_TARGETS_MESSAGE);
        assert_eq!(result.total_servers, 0);
    }

    #[test]
    fn test_all_succeeded() {
        let result = aggregate(OperationKind::CreateRecord, &[ok("A", 10), ok("B", 20)]);

        assert_eq!(result.overall_status, OverallStatus::AllSucceeded);
        assert_eq!(result.successful_servers, vec!["A", "B"]);
        assert!(result.failed_servers.is_empty());
        assert_eq!(result.summary_message, "Record created on 2/2 servers");
        assert_eq!(result.payload, Some(serde_json::json!({ "on": "A" })));
    }

    #[test]
    fn test_all_failed() {
        let result = aggregate(
            OperationKind::DeleteZone,
            &[
                failed("A", FailureCause::Timeout),
                failed("B", FailureCause::Rejected),
            ],
        );

        assert_eq!(result.overall_status, OverallStatus::AllFailed);
        assert!(result.successful_servers.is_empty());
        assert_eq!(result.failed_servers.len(), 2);
        assert_eq!(result.summary_message, "Zone deleted on 0/2 servers");
        assert!(result.payload.is_none());
        assert!(!result.all_failures_connectivity());
        assert_eq!(
            result.failure_causes(),
            vec![FailureCause::Timeout, FailureCause::Rejected]
        );
    }

    #[test]
    fn test_partial_success_counts_and_order() {
        let outcomes = vec![
            failed("A", FailureCause::Connectivity),
            ok("B", 30),
            failed("C", FailureCause::Timeout),
            ok("D", 10),
        ];
        let result = aggregate(OperationKind::UpdateRecord, &outcomes);

        assert_eq!(result.overall_status, OverallStatus::PartialSuccess);
        assert_eq!(result.successful_servers, vec!["B", "D"]);
        let failed_names: Vec<_> = result
            .failed_servers
            .iter()
            .map(|f| f.server_name.as_str())
            .collect();
        assert_eq!(failed_names, vec!["A", "C"]);
        assert_eq!(
            result.successful_servers.len() + result.failed_servers.len(),
            outcomes.len()
        );
        assert_eq!(result.summary_message, "Record updated on 2/4 servers");
        assert!(result.all_failures_connectivity());
        assert_eq!(result.error_lines(), vec!["A: connectivity", "C: timeout"]);
    }

    #[test]
    fn test_latency_summary() {
        let result = aggregate(
            OperationKind::CreateZone,
            &[ok("A", 30), failed("B", FailureCause::Timeout), ok("C", 10), ok("D", 10)],
        );

        assert_eq!(result.latency.fastest_server.as_deref(), Some("C"));
        assert_eq!(result.latency.max_millis, 30);
        assert!((result.latency.average_millis - 13.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_null_payload_skipped() {
        let outcomes = vec![
            PerServerOutcome::success("A", serde_json::Value::Null, 1),
            ok("B", 2),
        ];
        let result = aggregate(OperationKind::DeleteRecord, &outcomes);
        assert_eq!(result.payload, Some(serde_json::json!({ "on": "B" })));
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let outcomes = vec![ok("A", 3), failed("B", FailureCause::NotFound)];
        let first = Aggregator::new().aggregate(OperationKind::DeleteRecord, &outcomes);
        let second = Aggregator::new().aggregate(OperationKind::DeleteRecord, &outcomes);
        assert_eq!(first, second);
    }
}
