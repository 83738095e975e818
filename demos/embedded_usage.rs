//! Minimal embedding example for multidns-core
//!
//! This example uses multidns-core as a library with an in-process client:
//! one server accepts the change, one is unreachable, and the caller turns
//! the aggregated result into an HTTP-style response.

use multidns_core::traits::{DnsServerClient, RegistrySource, ServerInfo};
use multidns_core::{
    EngineConfig, Error, HealthConfig, HealthProber, OperationDescriptor, OrchestrationEngine,
    RecordSpec, RegistrySnapshot, ResponsePolicy, Result, ServerProfile, StaticRegistry,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-process client: every server answers except "Offline"
struct EmbeddedClient {
    execute_calls: AtomicUsize,
}

impl EmbeddedClient {
    fn new() -> Self {
        Self {
            execute_calls: AtomicUsize::new(0),
        }
    }

    fn execute_count(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DnsServerClient for EmbeddedClient {
    async fn execute(
        &self,
        profile: &ServerProfile,
        operation: &OperationDescriptor,
    ) -> Result<serde_json::Value> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        println!("[Embedded] {} {} on {}", operation.kind, operation.zone, profile.name);

        if profile.name == "Offline" {
            return Err(Error::connection("connection refused"));
        }
        Ok(operation.payload.clone())
    }

    async fn server_info(&self, profile: &ServerProfile) -> Result<ServerInfo> {
        if profile.name == "Offline" {
            return Err(Error::connection("connection refused"));
        }
        Ok(ServerInfo {
            id: profile.server_id.clone(),
            version: Some("embedded".to_string()),
            daemon_type: Some("authoritative".to_string()),
        })
    }

    fn client_name(&self) -> &'static str {
        "embedded"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    println!("=== Embedded multidns-core Example ===\n");

    // Two active servers in multi-server mode
    println!("1. Building the server registry...");
    let registry = StaticRegistry::new(RegistrySnapshot::new(vec![
        ServerProfile::new(1, "Primary", "http://ns1.internal:8081", "key-1")
            .with_default(true)
            .with_multi_server_mode(true),
        ServerProfile::new(2, "Offline", "http://ns2.internal:8081", "key-2")
            .with_multi_server_mode(true),
    ])?);

    let client = Arc::new(EmbeddedClient::new());

    println!("2. Creating engine...");
    let (engine, mut event_rx) = OrchestrationEngine::new(client.clone(), EngineConfig::default())?;

    println!("3. Creating a record on every active server...\n");
    let record = RecordSpec::new("www.example.com.", "A", "192.0.2.10").with_ttl(300);
    let operation = OperationDescriptor::create_record("example.com.", &record);
    let result = engine.execute_from(&operation, &registry).await?;

    while let Ok(event) = event_rx.try_recv() {
        println!("[Event] {:?}", event);
    }

    println!("\n4. Aggregated result: {}", result.summary_message);
    println!("   Status: {}", result.overall_status);
    println!("   Succeeded: {:?}", result.successful_servers);
    for failure in &result.failed_servers {
        println!("   Failed: {} ({})", failure.server_name, failure.detail.message);
    }

    let response = ResponsePolicy::default().respond(&result);
    println!("\n5. Caller-facing response (HTTP {}):", response.status);
    println!("{}", serde_json::to_string_pretty(&response.body)?);

    println!("\n6. Probing server health...");
    let prober = HealthProber::new(client.clone(), HealthConfig::default())?
        .with_performance(engine.metrics().clone());
    let snapshot = registry.snapshot().await?;
    prober.probe_all(snapshot.profiles()).await;
    let summary = prober.summary(snapshot.profiles()).await;
    println!(
        "   {} healthy, {} unhealthy, {} unknown",
        summary.healthy, summary.unhealthy, summary.unknown
    );
    for (name, perf) in &summary.performance_summary {
        println!(
            "   {}: {} call(s), avg {:.1}ms",
            name, perf.total_calls, perf.avg_response_time_millis
        );
    }

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- {} servers called concurrently, no retries", client.execute_count());
    println!("- Partial success is reported per server, not hidden");
    println!("- Status codes are chosen by the caller's ResponsePolicy");

    Ok(())
}
