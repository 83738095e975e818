//! Architectural Contract Test: Target Selection
//!
//! This test verifies which servers an operation is sent to.
//!
//! Constraints verified:
//! - Active multi-server profiles win over the default profile
//! - With no multi-server profile, the active default is the lone target
//! - Inactive profiles are never targeted
//! - Health status never changes the target set
//!
//! If this test fails, someone has:
//! - Fanned writes out to servers that did not opt in
//! - Started routing around unhealthy servers
//! - Changed the single-server fallback

mod common;

use common::*;
use multidns_core::engine::select_targets;
use multidns_core::error::Error;
use multidns_core::{
    AggregatedResult, EngineConfig, HealthConfig, HealthProber, HealthStatus, OperationDescriptor,
    OrchestrationEngine, OverallStatus, RecordSpec, SelectionMode,
};

fn create_record() -> OperationDescriptor {
    OperationDescriptor::create_record(
        "example.com.",
        &RecordSpec::new("www.example.com.", "A", "192.0.2.10").with_ttl(300),
    )
}

async fn run(
    client: ScriptedClient,
    profiles: Vec<multidns_core::ServerProfile>,
) -> (AggregatedResult, std::sync::Arc<ScriptedClient>) {
    let client = shared(client);
    let (engine, _events) = OrchestrationEngine::new(client.clone(), EngineConfig::default())
        .expect("engine construction succeeds");
    let result = engine.execute(&create_record(), &snapshot(profiles)).await;
    (result, client)
}

#[tokio::test]
async fn multi_server_profiles_are_targeted_instead_of_default() {
    let profiles = vec![
        multi(1, "A"),
        multi(2, "B"),
        profile(3, "C").with_default(true),
    ];

    let selection = select_targets(&snapshot(profiles.clone()));
    assert_eq!(selection.mode, SelectionMode::MultiServer);
    assert_eq!(selection.names(), vec!["A", "B"]);

    let (result, client) = run(ScriptedClient::new(), profiles).await;
    assert_eq!(client.execute_call_count(), 2, "Default server must not be called");
    assert!(!client.execute_calls().contains(&"C".to_string()));
    assert_eq!(result.successful_servers, vec!["A", "B"]);
    assert_eq!(result.summary_message, "Record created on 2/2 servers");
}

#[tokio::test]
async fn lone_default_is_targeted_without_multi_server_mode() {
    let profiles = vec![profile(3, "C").with_default(true)];

    let (result, client) = run(ScriptedClient::new(), profiles).await;

    assert_eq!(client.execute_calls(), vec!["C"]);
    assert_eq!(result.overall_status, OverallStatus::AllSucceeded);
    assert_eq!(result.successful_servers, vec!["C"]);
}

#[tokio::test]
async fn no_active_servers_yields_no_targets_without_calls() {
    let profiles = vec![
        multi(1, "A").with_active(false),
        profile(2, "C").with_default(true).with_active(false),
    ];

    let (result, client) = run(ScriptedClient::new(), profiles).await;

    assert_eq!(client.execute_call_count(), 0);
    assert_eq!(result.overall_status, OverallStatus::NoTargets);
    assert!(result.successful_servers.is_empty());
    assert!(result.failed_servers.is_empty());
    assert_eq!(result.summary_message, "No PowerDNS servers configured or active");
}

#[tokio::test]
async fn inactive_multi_server_profile_falls_back_to_default() {
    let profiles = vec![
        multi(1, "A").with_active(false),
        profile(2, "C").with_default(true),
    ];

    let (result, client) = run(ScriptedClient::new(), profiles).await;

    assert_eq!(client.execute_calls(), vec!["C"]);
    assert_eq!(result.total_servers, 1);
}

#[tokio::test]
async fn empty_registry_yields_no_targets() {
    let (result, client) = run(ScriptedClient::new(), Vec::new()).await;

    assert_eq!(client.execute_call_count(), 0);
    assert_eq!(result, AggregatedResult::no_targets(result.kind));
}

#[tokio::test(start_paused = true)]
async fn unhealthy_servers_are_still_targeted() {
    let client = shared(
        ScriptedClient::new().with("B", Behavior::fail(|| Error::connection("connection refused"))),
    );
    let profiles = vec![multi(1, "A"), multi(2, "B")];
    let snap = snapshot(profiles.clone());

    // Mark B unhealthy first
    let prober = HealthProber::new(client.clone(), HealthConfig::default()).unwrap();
    let health = prober.probe_all(&profiles).await;
    assert_eq!(health["B"].status, HealthStatus::Unhealthy);

    let (engine, _events) =
        OrchestrationEngine::new(client.clone(), EngineConfig::default()).unwrap();
    engine.execute(&create_record(), &snap).await;

    assert_eq!(
        client.execute_calls(),
        vec!["A", "B"],
        "Health must not exclude servers from the target set"
    );
}
