//! Per-server performance metrics
//!
//! The engine records the latency of every successful call here. Each server
//! keeps a rolling window of its most recent [`LATENCY_WINDOW`] latencies,
//! from which average, minimum and maximum are derived on read.
//!
//! Failed calls are not recorded: a timeout would otherwise dominate the
//! figures of an otherwise fast server.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::ServerProfile;
use crate::dispatch::PerServerOutcome;

/// Number of latencies kept per server
pub const LATENCY_WINDOW: usize = 100;

/// Latency figures for one server over the current window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerPerformance {
    pub avg_response_time_millis: f64,
    pub min_response_time_millis: u64,
    pub max_response_time_millis: u64,
    /// Calls in the window, at most [`LATENCY_WINDOW`]
    pub total_calls: usize,
}

impl ServerPerformance {
    fn from_window(window: &VecDeque<u64>) -> Self {
        if window.is_empty() {
            return Self::default();
        }
        let sum: u64 = window.iter().sum();
        Self {
            avg_response_time_millis: sum as f64 / window.len() as f64,
            min_response_time_millis: window.iter().copied().min().unwrap_or_default(),
            max_response_time_millis: window.iter().copied().max().unwrap_or_default(),
            total_calls: window.len(),
        }
    }
}

/// Shared latency history, keyed by server name
#[derive(Debug, Clone, Default)]
pub struct PerformanceMetrics {
    windows: Arc<RwLock<HashMap<String, VecDeque<u64>>>>,
}

impl PerformanceMetrics {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful call, evicting the oldest entry past the window
    pub async fn record(&self, server_name: &str, latency_millis: u64) {
        let mut windows = self.windows.write().await;
        let window = windows
            .entry(server_name.to_string())
            .or_insert_with(|| VecDeque::with_capacity(LATENCY_WINDOW));
        if window.len() == LATENCY_WINDOW {
            window.pop_front();
        }
        window.push_back(latency_millis);
    }

    /// Record the successful outcomes of one dispatch
    pub async fn record_outcomes(&self, outcomes: &[PerServerOutcome]) {
        for outcome in outcomes.iter().filter(|o| o.succeeded) {
            self.record(&outcome.server_name, outcome.latency_millis).await;
        }
    }

    /// Figures for one server; all zero if it has no recorded calls
    pub async fn server(&self, server_name: &str) -> ServerPerformance {
        let windows = self.windows.read().await;
        windows
            .get(server_name)
            .map(ServerPerformance::from_window)
            .unwrap_or_default()
    }

    /// Figures for each of the given servers
    pub async fn summary(&self, profiles: &[ServerProfile]) -> HashMap<String, ServerPerformance> {
        let windows = self.windows.read().await;
        profiles
            .iter()
            .map(|profile| {
                let performance = windows
                    .get(&profile.name)
                    .map(ServerPerformance::from_window)
                    .unwrap_or_default();
                (profile.name.clone(), performance)
            })
            .collect()
    }
}
