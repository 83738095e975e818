// # multidns-core
//
// Core library for applying DNS zone and record changes to several PowerDNS
// servers at once.
//
// ## Architecture Overview
//
// - **ServerProfile / RegistrySnapshot**: Configured servers and their flags
// - **DnsServerClient**: Trait for executing one operation against one server
// - **RegistrySource**: Trait for obtaining consistent registry snapshots
// - **Dispatcher**: Concurrent fan-out of one operation to many servers
// - **Aggregator**: Fan-in of per-server outcomes into one result
// - **OrchestrationEngine**: Target selection + dispatch + aggregation
// - **HealthProber**: Informational liveness probing
// - **PerformanceMetrics**: Rolling per-server latency history
// - **ResponsePolicy**: Mapping of results to HTTP status codes and bodies
//
// ## Design Principles
//
// 1. **Snapshot In, Result Out**: The engine reads an immutable registry
//    snapshot per call and never holds a global registry reference
// 2. **Structured Concurrency**: Every per-server call is joined before
//    `execute` returns; nothing is detached
// 3. **Partial Success Is A Result**: Per-server failures never escape as
//    errors; callers always see which servers succeeded and which failed
// 4. **Library-First**: The daemon is a thin layer over this crate

pub mod aggregate;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod health;
pub mod metrics;
pub mod operation;
pub mod registry;
pub mod response;
pub mod traits;

// Re-export core types for convenience
pub use aggregate::{AggregatedResult, Aggregator, LatencySummary, OverallStatus, ServerFailure};
pub use config::{EngineConfig, HealthConfig, ServerProfile};
pub use dispatch::{Dispatcher, PerServerOutcome};
pub use engine::{OrchestrationEngine, OrchestrationEvent, SelectionMode, TargetSelection};
pub use error::{Error, ErrorDetail, FailureCause, Result};
pub use health::{HealthProber, HealthRecord, HealthStatus, HealthStore, HealthSummary};
pub use metrics::{PerformanceMetrics, ServerPerformance};
pub use operation::{OperationDescriptor, OperationKind, RecordSpec, ZoneKind, ZoneSpec};
pub use registry::{FileRegistry, RegistrySnapshot, StaticRegistry};
pub use response::{ApiResponse, ResponsePolicy};
pub use traits::{DnsServerClient, RegistrySource, ServerInfo};
