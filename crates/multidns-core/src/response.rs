//! Caller-facing response mapping
//!
//! Turns an [`AggregatedResult`] into the HTTP status and JSON body that UI
//! clients branch on.
//!
//! | Status | Code | Body |
//! |---|---|---|
//! | `AllSucceeded` | 201 for creates, 200 otherwise | resource payload, or `{message}` |
//! | `PartialSuccess` | 207 | `{message, success_servers, failed_servers, partial_success}` |
//! | `AllFailed` | 400, or 502 when every failure is timeout/connectivity | `{message, errors}` |
//! | `NoTargets` | 400 | `{message}` |
//!
//! The non-success codes come from a [`ResponsePolicy`] and can be overridden.

use crate::aggregate::{AggregatedResult, OverallStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// HTTP status and JSON body for one orchestration call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// Status codes used for non-success outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePolicy {
    /// Some servers succeeded
    ///
    /// Default: 207
    #[serde(default = "default_partial_status")]
    pub partial_status: u16,

    /// Every server failed, at least one for a non-connectivity reason
    ///
    /// Default: 400
    #[serde(default = "default_all_failed_status")]
    pub all_failed_status: u16,

    /// Every server failed with a timeout or connectivity error
    ///
    /// Default: 502
    #[serde(default = "default_connectivity_failure_status")]
    pub connectivity_failure_status: u16,

    /// No server was eligible
    ///
    /// Default: 400
    #[serde(default = "default_no_targets_status")]
    pub no_targets_status: u16,
}

impl ResponsePolicy {
    /// Validate that every code is a real HTTP status
    pub fn validate(&self) -> Result<(), crate::Error> {
        let codes = [
            ("partial_status", self.partial_status),
            ("all_failed_status", self.all_failed_status),
            ("connectivity_failure_status", self.connectivity_failure_status),
            ("no_targets_status", self.no_targets_status),
        ];
        for (field, code) in codes {
            if !(100..=599).contains(&code) {
                return Err(crate::Error::config(format!(
                    "{} must be an HTTP status code (100-599), got {}",
                    field, code
                )));
            }
        }
        Ok(())
    }

    /// Map an aggregated result to a response
    pub fn respond(&self, result: &AggregatedResult) -> ApiResponse {
        match result.overall_status {
            OverallStatus::AllSucceeded => {
                let body = match &result.payload {
                    Some(payload) if !is_empty_payload(payload) => payload.clone(),
                    _ => json!({ "message": result.summary_message }),
                };
                ApiResponse {
                    status: result.kind.success_status(),
                    body,
                }
            }
            OverallStatus::PartialSuccess => {
                let failed: Vec<Value> = result
                    .failed_servers
                    .iter()
                    .map(|f| {
                        let mut entry = Map::new();
                        entry.insert(f.server_name.clone(), Value::String(f.detail.to_string()));
                        Value::Object(entry)
                    })
                    .collect();
                ApiResponse {
                    status: self.partial_status,
                    body: json!({
                        "message": result.summary_message,
                        "success_servers": result.successful_servers,
                        "failed_servers": failed,
                        "partial_success": true,
                    }),
                }
            }
            OverallStatus::AllFailed => {
                let status = if result.all_failures_connectivity() {
                    self.connectivity_failure_status
                } else {
                    self.all_failed_status
                };
                ApiResponse {
                    status,
                    body: json!({
                        "message": result.summary_message,
                        "errors": result.error_lines(),
                    }),
                }
            }
            OverallStatus::NoTargets => ApiResponse {
                status: self.no_targets_status,
                body: json!({ "message": result.summary_message }),
            },
        }
    }
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self {
            partial_status: default_partial_status(),
            all_failed_status: default_all_failed_status(),
            connectivity_failure_status: default_connectivity_failure_status(),
            no_targets_status: default_no_targets_status(),
        }
    }
}

fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn default_partial_status() -> u16 {
    207
}

fn default_all_failed_status() -> u16 {
    400
}

fn default_connectivity_failure_status() -> u16 {
    502
}

fn default_no_targets_status() -> u16 {
    400
}
