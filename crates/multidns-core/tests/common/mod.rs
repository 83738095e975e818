//! Test doubles and common utilities for orchestration contract tests
//!
//! This module provides a scripted single-server client whose behavior is
//! decided per server name, plus profile and registry helpers.

#![allow(dead_code)]

use multidns_core::error::{Error, Result};
use multidns_core::traits::{DnsServerClient, RegistrySource, ServerInfo};
use multidns_core::{OperationDescriptor, RegistrySnapshot, ServerProfile};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a scripted server does when called
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Answer after `delay` with a payload naming the server
    Succeed { delay: Duration },
    /// Fail after `delay` with the error built by `error`
    Fail { delay: Duration, error: fn() -> Error },
    /// Never answer (the dispatcher's timeout must cut it off)
    Hang,
}

impl Behavior {
    pub fn ok() -> Self {
        Self::Succeed {
            delay: Duration::ZERO,
        }
    }

    pub fn ok_after(millis: u64) -> Self {
        Self::Succeed {
            delay: Duration::from_millis(millis),
        }
    }

    pub fn fail(error: fn() -> Error) -> Self {
        Self::Fail {
            delay: Duration::ZERO,
            error,
        }
    }

    pub fn fail_after(millis: u64, error: fn() -> Error) -> Self {
        Self::Fail {
            delay: Duration::from_millis(millis),
            error,
        }
    }
}

/// A DnsServerClient whose answers are scripted per server name
///
/// Unscripted servers succeed immediately.
#[derive(Default)]
pub struct ScriptedClient {
    behaviors: HashMap<String, Behavior>,
    execute_calls: Arc<std::sync::Mutex<Vec<String>>>,
    info_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the behavior of one server
    pub fn with(mut self, server_name: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(server_name.to_string(), behavior);
        self
    }

    /// Names of the servers `execute` was called for, in call order
    pub fn execute_calls(&self) -> Vec<String> {
        self.execute_calls.lock().unwrap().clone()
    }

    /// Number of times `execute` was called
    pub fn execute_call_count(&self) -> usize {
        self.execute_calls.lock().unwrap().len()
    }

    /// Number of times `server_info` was called
    pub fn info_call_count(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    /// Largest number of calls observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn play(&self, server_name: &str) -> Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let outcome = match self.behaviors.get(server_name).cloned() {
            None => Ok(()),
            Some(Behavior::Succeed { delay }) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Some(Behavior::Fail { delay, error }) => {
                tokio::time::sleep(delay).await;
                Err(error())
            }
            Some(Behavior::Hang) => {
                std::future::pending::<()>().await;
                Ok(())
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

#[async_trait::async_trait]
impl DnsServerClient for ScriptedClient {
    async fn execute(
        &self,
        profile: &ServerProfile,
        operation: &OperationDescriptor,
    ) -> Result<serde_json::Value> {
        self.execute_calls.lock().unwrap().push(profile.name.clone());
        self.play(&profile.name).await?;
        Ok(serde_json::json!({
            "server": profile.name,
            "zone": operation.zone,
        }))
    }

    async fn server_info(&self, profile: &ServerProfile) -> Result<ServerInfo> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.play(&profile.name).await?;
        Ok(ServerInfo {
            id: profile.server_id.clone(),
            version: Some("4.8.3".to_string()),
            daemon_type: Some("authoritative".to_string()),
        })
    }

    fn client_name(&self) -> &'static str {
        "scripted"
    }
}

/// A RegistrySource that always fails
pub struct UnavailableRegistry;

#[async_trait::async_trait]
impl RegistrySource for UnavailableRegistry {
    async fn snapshot(&self) -> Result<RegistrySnapshot> {
        Err(Error::registry("registry database unreachable"))
    }
}

/// An active profile with a 1s timeout and no mode flags
pub fn profile(id: u64, name: &str) -> ServerProfile {
    ServerProfile::new(id, name, format!("http://{}.test:8081", name.to_lowercase()), "secret")
        .with_timeout_millis(1000)
}

/// An active profile participating in multi-server mode
pub fn multi(id: u64, name: &str) -> ServerProfile {
    profile(id, name).with_multi_server_mode(true)
}

/// Build a snapshot, panicking on invalid input
pub fn snapshot(profiles: Vec<ServerProfile>) -> RegistrySnapshot {
    RegistrySnapshot::new(profiles).expect("valid registry")
}

/// Wrap a client for the engine
pub fn shared(client: ScriptedClient) -> Arc<ScriptedClient> {
    Arc::new(client)
}
