// # Static Registry
//
// In-memory implementation of RegistrySource.
//
// Holds one snapshot that can be swapped atomically. Every call to
// `snapshot()` hands out a clone, so a swap never affects an orchestration
// call that already took its snapshot.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::registry::RegistrySnapshot;
use crate::traits::RegistrySource;

/// In-memory registry source
///
/// # Example
///
/// ```rust,no_run
/// use multidns_core::{RegistrySnapshot, StaticRegistry};
/// use multidns_core::traits::RegistrySource;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = StaticRegistry::new(RegistrySnapshot::empty());
///     let snapshot = registry.snapshot().await?;
///     assert!(snapshot.is_empty());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    inner: Arc<RwLock<RegistrySnapshot>>,
}

impl StaticRegistry {
    /// Create a registry serving the given snapshot
    pub fn new(snapshot: RegistrySnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Replace the served snapshot
    pub async fn replace(&self, snapshot: RegistrySnapshot) {
        let mut guard = self.inner.write().await;
        *guard = snapshot;
    }
}

#[async_trait]
impl RegistrySource for StaticRegistry {
    async fn snapshot(&self) -> Result<RegistrySnapshot, Error> {
        let guard = self.inner.read().await;
        Ok(guard.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerProfile;

    #[tokio::test]
    async fn test_snapshot_isolated_from_replace() {
        let registry = StaticRegistry::new(
            RegistrySnapshot::new(vec![ServerProfile::new(1, "A", "http://ns1", "k")]).unwrap(),
        );

        let taken = registry.snapshot().await.unwrap();
        registry.replace(RegistrySnapshot::empty()).await;

        assert_eq!(taken.len(), 1, "Taken snapshot must not observe the swap");
        assert!(registry.snapshot().await.unwrap().is_empty());
    }
}
