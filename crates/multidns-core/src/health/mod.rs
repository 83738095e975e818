//! Health probing
//!
//! Liveness checks against configured servers, recorded in a [`HealthStore`].
//!
//! Health is informational only: the engine's target selection never reads
//! it, so an unhealthy server still receives operations.
//!
//! - `probe`: one server, bounded by its timeout
//! - `probe_all`: every given server concurrently, waiting for all of them
//! - `run_until`: periodic rounds over the active servers of a registry source

pub mod store;

pub use store::{HealthRecord, HealthStatus, HealthStore, HealthSummary, ServerHealth};

use crate::config::{HealthConfig, ServerProfile};
use crate::error::Result;
use crate::metrics::PerformanceMetrics;
use crate::traits::{DnsServerClient, RegistrySource};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Probes servers through the single-server client's liveness call
#[derive(Clone)]
pub struct HealthProber {
    client: Arc<dyn DnsServerClient>,
    store: HealthStore,
    config: HealthConfig,
    metrics: PerformanceMetrics,
}

impl HealthProber {
    /// Create a prober with a fresh store
    pub fn new(client: Arc<dyn DnsServerClient>, config: HealthConfig) -> Result<Self> {
        Self::with_store(client, config, HealthStore::new())
    }

    /// Create a prober writing into an existing store
    pub fn with_store(
        client: Arc<dyn DnsServerClient>,
        config: HealthConfig,
        store: HealthStore,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            store,
            config,
            metrics: PerformanceMetrics::new(),
        })
    }

    /// Report operation latencies from `metrics` in summaries
    ///
    /// Pass the engine's [`OrchestrationEngine::metrics`](crate::OrchestrationEngine::metrics).
    pub fn with_performance(mut self, metrics: PerformanceMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// The store this prober writes to
    pub fn store(&self) -> &HealthStore {
        &self.store
    }

    /// Probe one server and record the result
    ///
    /// Concurrent probes of the same server run one at a time.
    pub async fn probe(&self, profile: &ServerProfile) -> HealthRecord {
        let lock = self.store.probe_lock(&profile.name).await;
        let _guard = lock.lock().await;

        let timeout = self.config.probe_timeout(profile);
        let started = Instant::now();
        let result = tokio::time::timeout(timeout, self.client.server_info(profile)).await;
        let elapsed = started.elapsed().as_millis() as u64;

        let record = match result {
            Ok(Ok(info)) => {
                debug!("{} is healthy ({}ms)", profile.name, elapsed);
                let zones_count = if self.config.count_zones {
                    self.count_zones(profile, timeout).await
                } else {
                    None
                };
                HealthRecord::healthy(elapsed, info.version).with_zones_count(zones_count)
            }
            Ok(Err(e)) => {
                warn!("Health check failed for {}: {}", profile.name, e);
                HealthRecord::unhealthy(elapsed, e.to_string())
            }
            Err(_) => {
                warn!(
                    "Health check for {} timed out after {}ms",
                    profile.name,
                    timeout.as_millis()
                );
                HealthRecord::unhealthy(
                    elapsed,
                    format!("Connection timeout after {}ms", timeout.as_millis()),
                )
            }
        };

        self.store.set(&profile.name, record.clone()).await;
        record
    }

    /// Zone count for a full check; a failure leaves the server healthy
    async fn count_zones(&self, profile: &ServerProfile, timeout: Duration) -> Option<usize> {
        match tokio::time::timeout(timeout, self.client.zone_count(profile)).await {
            Ok(Ok(count)) => Some(count),
            Ok(Err(e)) => {
                debug!("Could not count zones on {}: {}", profile.name, e);
                None
            }
            Err(_) => {
                debug!("Zone count on {} timed out", profile.name);
                None
            }
        }
    }

    /// Probe every given server concurrently
    ///
    /// Returns once every probe has finished or timed out.
    pub async fn probe_all(&self, profiles: &[ServerProfile]) -> HashMap<String, HealthRecord> {
        let probes = profiles.iter().map(|profile| async move {
            let record = self.probe(profile).await;
            (profile.name.clone(), record)
        });

        futures::future::join_all(probes).await.into_iter().collect()
    }

    /// Summarize stored health and operation latencies for the given servers
    pub async fn summary(&self, profiles: &[ServerProfile]) -> HealthSummary {
        let mut summary = self.store.summary(profiles).await;
        summary.performance_summary = self.metrics.summary(profiles).await;
        summary
    }

    /// Probe the active servers of `source` every interval until `shutdown` fires
    ///
    /// A snapshot failure skips that round; the loop keeps going. Shutdown
    /// also interrupts a round in progress: its probes are dropped in place
    /// and the affected servers keep their previous records.
    pub async fn run_until(
        &self,
        source: &dyn RegistrySource,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut interval = tokio::time::interval(self.config.interval());
        info!(
            "Health prober started (interval {}s)",
            self.config.interval_secs
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    tokio::select! {
                        biased;

                        _ = &mut shutdown => {
                            info!("Health round interrupted by shutdown");
                            break;
                        }
                        _ = self.run_round(source) => {}
                    }
                }
            }
        }

        info!("Health prober stopping");
    }

    async fn run_round(&self, source: &dyn RegistrySource) {
        let snapshot = match source.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Skipping health round, registry unavailable: {}", e);
                return;
            }
        };

        let names: Vec<&str> = snapshot.profiles().iter().map(|p| p.name.as_str()).collect();
        self.store.retain(&names).await;

        let active: Vec<ServerProfile> = snapshot.active().cloned().collect();
        let records = self.probe_all(&active).await;
        let healthy = records
            .values()
            .filter(|r| r.status == HealthStatus::Healthy)
            .count();
        info!("Health round complete: {}/{} healthy", healthy, records.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::operation::OperationDescriptor;
    use crate::traits::ServerInfo;
    use async_trait::async_trait;

    /// "up*" servers answer after 10ms, "slow*" never in time, others refuse.
    /// Only "up-zones*" servers can list their zones.
    struct LivenessClient;

    #[async_trait]
    impl DnsServerClient for LivenessClient {
        async fn execute(
            &self,
            _profile: &ServerProfile,
            _operation: &OperationDescriptor,
        ) -> std::result::Result<serde_json::Value, Error> {
            Ok(serde_json::Value::Null)
        }

        async fn server_info(
            &self,
            profile: &ServerProfile,
        ) -> std::result::Result<ServerInfo, Error> {
            if profile.name.starts_with("up") {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(ServerInfo {
                    id: "localhost".into(),
                    version: Some("4.8.3".into()),
                    daemon_type: Some("authoritative".into()),
                })
            } else if profile.name.starts_with("slow") {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ServerInfo::default())
            } else {
                Err(Error::connection("connection refused"))
            }
        }

        async fn zone_count(&self, profile: &ServerProfile) -> std::result::Result<usize, Error> {
            if profile.name.starts_with("up-zones") {
                Ok(7)
            } else {
                Err(Error::not_found("no zone listing"))
            }
        }

        fn client_name(&self) -> &'static str {
            "liveness"
        }
    }

    fn prober() -> HealthProber {
        HealthProber::new(Arc::new(LivenessClient), HealthConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_healthy_records_latency_and_version() {
        let prober = prober();
        let record = prober
            .probe(&ServerProfile::new(1, "up-1", "http://a", "k"))
            .await;

        assert_eq!(record.status, HealthStatus::Healthy);
        assert_eq!(record.response_time_millis, Some(10));
        assert_eq!(record.server_version.as_deref(), Some("4.8.3"));
        assert_eq!(prober.store().get("up-1").await, record);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_failure_is_unhealthy() {
        let record = prober()
            .probe(&ServerProfile::new(1, "down", "http://a", "k"))
            .await;

        assert_eq!(record.status, HealthStatus::Unhealthy);
        assert!(record.error_message.unwrap().contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_is_unhealthy() {
        let profile = ServerProfile::new(1, "slow", "http://a", "k").with_timeout_millis(200);
        let record = prober().probe(&profile).await;

        assert_eq!(record.status, HealthStatus::Unhealthy);
        assert_eq!(record.response_time_millis, Some(200));
        assert_eq!(
            record.error_message.as_deref(),
            Some("Connection timeout after 200ms")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_timeout_caps_probe() {
        let config = HealthConfig {
            interval_secs: 60,
            quick_timeout_millis: Some(50),
            ..HealthConfig::default()
        };
        let prober = HealthProber::new(Arc::new(LivenessClient), config).unwrap();
        let profile = ServerProfile::new(1, "slow", "http://a", "k").with_timeout_millis(5000);

        let record = prober.probe(&profile).await;
        assert_eq!(record.response_time_millis, Some(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_check_counts_zones() {
        let config = HealthConfig {
            count_zones: true,
            ..HealthConfig::default()
        };
        let prober = HealthProber::new(Arc::new(LivenessClient), config).unwrap();

        let record = prober
            .probe(&ServerProfile::new(1, "up-zones", "http://a", "k"))
            .await;
        assert_eq!(record.status, HealthStatus::Healthy);
        assert_eq!(record.zones_count, Some(7));

        // A failed zone listing does not make the server unhealthy
        let record = prober
            .probe(&ServerProfile::new(2, "up-plain", "http://b", "k"))
            .await;
        assert_eq!(record.status, HealthStatus::Healthy);
        assert_eq!(record.zones_count, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_liveness_check_skips_zone_count() {
        let record = prober()
            .probe(&ServerProfile::new(1, "up-zones", "http://a", "k"))
            .await;
        assert_eq!(record.zones_count, None);
    }

    #[tokio::test]
    async fn test_summary_includes_operation_latencies() {
        let metrics = PerformanceMetrics::new();
        metrics.record("up-1", 20).await;
        metrics.record("up-1", 40).await;
        let prober = prober().with_performance(metrics);

        let profiles = vec![ServerProfile::new(1, "up-1", "http://a", "k")];
        let summary = prober.summary(&profiles).await;

        let perf = &summary.performance_summary["up-1"];
        assert_eq!(perf.total_calls, 2);
        assert_eq!(perf.min_response_time_millis, 20);
        assert_eq!(perf.max_response_time_millis, 40);
    }
}
