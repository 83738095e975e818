// # multidnsd - Multi-Server DNS Daemon
//
// This daemon is a THIN integration layer over multidns-core:
// - DO NOT add target selection, aggregation or retry logic here
// - All orchestration logic MUST be in multidns-core
// - Configuration is via environment variables ONLY
//
// The multidnsd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Wiring the PowerDNS client to the engine and the health prober
// 4. Either applying one operation, or probing servers until shutdown
//
// ## Configuration
//
// - `MULTIDNS_REGISTRY_PATH`: JSON server registry file (required)
// - `MULTIDNS_OPERATION_PATH`: JSON operation to apply once, then exit (optional)
// - `MULTIDNS_HEALTH_INTERVAL_SECS`: Seconds between health rounds (default 60)
// - `MULTIDNS_HEALTH_COUNT_ZONES`: Also count each server's zones (default false)
// - `MULTIDNS_ALL_FAILED_STATUS`: HTTP status when every server failed (default 400)
// - `MULTIDNS_CONNECTIVITY_FAILURE_STATUS`: HTTP status when every failure was a
//   timeout or connectivity error (default 502)
// - `MULTIDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export MULTIDNS_REGISTRY_PATH=/etc/multidns/servers.json
// export MULTIDNS_OPERATION_PATH=/tmp/create-record.json
//
// multidnsd
// ```

use anyhow::{Context, Result};
use multidns_core::traits::RegistrySource;
use multidns_core::{
    EngineConfig, FileRegistry, HealthConfig, HealthProber, OperationDescriptor,
    OrchestrationEngine, ResponsePolicy,
};
use multidns_powerdns::PowerDnsClient;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long the health loop may take to stop after a shutdown signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum MultidnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<MultidnsExitCode> for ExitCode {
    fn from(code: MultidnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    registry_path: PathBuf,
    operation_path: Option<PathBuf>,
    health_interval_secs: u64,
    health_count_zones: bool,
    response_policy: ResponsePolicy,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let registry_path = lookup("MULTIDNS_REGISTRY_PATH")
            .filter(|s| !s.is_empty())
            .context(
                "MULTIDNS_REGISTRY_PATH is required. \
                Set it via: export MULTIDNS_REGISTRY_PATH=/etc/multidns/servers.json",
            )?;

        let defaults = ResponsePolicy::default();
        let response_policy = ResponsePolicy {
            all_failed_status: parse_var(
                &lookup,
                "MULTIDNS_ALL_FAILED_STATUS",
                defaults.all_failed_status,
            )?,
            connectivity_failure_status: parse_var(
                &lookup,
                "MULTIDNS_CONNECTIVITY_FAILURE_STATUS",
                defaults.connectivity_failure_status,
            )?,
            ..defaults
        };

        Ok(Self {
            registry_path: PathBuf::from(registry_path),
            operation_path: lookup("MULTIDNS_OPERATION_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            health_interval_secs: parse_var(&lookup, "MULTIDNS_HEALTH_INTERVAL_SECS", 60)?,
            health_count_zones: parse_var(&lookup, "MULTIDNS_HEALTH_COUNT_ZONES", false)?,
            response_policy,
            log_level: lookup("MULTIDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !self.registry_path.exists() {
            anyhow::bail!(
                "MULTIDNS_REGISTRY_PATH does not exist: {}",
                self.registry_path.display()
            );
        }

        if let Some(ref path) = self.operation_path
            && !path.exists()
        {
            anyhow::bail!("MULTIDNS_OPERATION_PATH does not exist: {}", path.display());
        }

        if !(5..=86400).contains(&self.health_interval_secs) {
            anyhow::bail!(
                "MULTIDNS_HEALTH_INTERVAL_SECS must be between 5 and 86400 seconds. Got: {}",
                self.health_interval_secs
            );
        }

        self.response_policy
            .validate()
            .context("Invalid MULTIDNS_*_STATUS override")?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "MULTIDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn health_config(&self) -> HealthConfig {
        HealthConfig {
            interval_secs: self.health_interval_secs,
            count_zones: self.health_count_zones,
            ..HealthConfig::default()
        }
    }
}

/// Parse an optional variable, falling back to `default` when unset
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return MultidnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return MultidnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return MultidnsExitCode::ConfigError.into();
    }

    info!("Starting multidnsd");
    info!("Server registry: {}", config.registry_path.display());

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return MultidnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            MultidnsExitCode::RuntimeError
        } else {
            MultidnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let client = Arc::new(PowerDnsClient::new()?);
    let registry = FileRegistry::new(&config.registry_path);

    // Fail early on an unreadable registry
    let snapshot = registry.snapshot().await?;
    info!(
        "Loaded {} server(s), {} active",
        snapshot.len(),
        snapshot.active().count()
    );

    match &config.operation_path {
        Some(path) => run_operation(&config, client, &registry, path).await,
        None => run_health_loop(&config, client, &registry).await,
    }
}

/// Apply one operation and print the caller-facing response as JSON
async fn run_operation(
    config: &Config,
    client: Arc<PowerDnsClient>,
    registry: &FileRegistry,
    path: &Path,
) -> Result<()> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read operation file {}", path.display()))?;
    let operation: OperationDescriptor = serde_json::from_slice(&raw)
        .with_context(|| format!("Invalid operation file {}", path.display()))?;
    operation.validate()?;

    let (engine, mut events) = OrchestrationEngine::new(client, EngineConfig::default())?;

    info!("Applying {} to zone {}", operation.kind, operation.zone);
    let result = engine.execute_from(&operation, registry).await?;

    while let Ok(event) = events.try_recv() {
        debug!("Engine event: {:?}", event);
    }

    let response = config.response_policy.respond(&result);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Probe servers periodically until SIGTERM/SIGINT
async fn run_health_loop(
    config: &Config,
    client: Arc<PowerDnsClient>,
    registry: &FileRegistry,
) -> Result<()> {
    let prober = HealthProber::new(client, config.health_config())?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let probing = prober.run_until(registry, shutdown_rx);
    tokio::pin!(probing);

    info!("Daemon initialized successfully");

    tokio::select! {
        _ = &mut probing => {
            warn!("Health prober stopped unexpectedly");
        }
        signal = wait_for_shutdown() => {
            let signal = signal?;
            info!("Received shutdown signal: {}", signal);
            let _ = shutdown_tx.send(());
            tokio::time::timeout(SHUTDOWN_GRACE, &mut probing)
                .await
                .map_err(|_| anyhow::anyhow!("Shutdown timeout after {:?}", SHUTDOWN_GRACE))?;
        }
    }

    if let Ok(snapshot) = registry.snapshot().await {
        let summary = prober.summary(snapshot.profiles()).await;
        info!(
            "Final health: {} healthy, {} unhealthy, {} unknown of {}",
            summary.healthy, summary.unhealthy, summary.unknown, summary.total
        );
    }

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
