// # Registry Source Trait
//
// Defines where server snapshots come from.
//
// The durable registry (CRUD on server profiles) lives outside this crate.
// The engine only asks it for one consistent, validated snapshot at the start
// of each orchestration call and never re-reads it mid-call.

use async_trait::async_trait;

use crate::registry::RegistrySnapshot;

/// Trait for server registry implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Take a snapshot of the configured servers
    ///
    /// # Returns
    ///
    /// - `Ok(RegistrySnapshot)`: A validated, immutable snapshot
    /// - `Err(Error)`: The snapshot could not be obtained
    async fn snapshot(&self) -> Result<RegistrySnapshot, crate::Error>;
}
