// # File Registry
//
// File-based implementation of RegistrySource.
//
// ## Purpose
//
// Lets a deployment keep its server list in a JSON file that an operator (or
// the out-of-process admin backend) rewrites. The file is read and validated
// on every snapshot, so edits take effect on the next orchestration call and
// never mid-call.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "servers": [
//     {
//       "id": 1,
//       "name": "Primary",
//       "api_url": "http://ns1:8081",
//       "api_key": "secret",
//       "is_default": true,
//       "multi_server_mode": true
//     }
//   ]
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::Error;
use crate::config::ServerProfile;
use crate::registry::RegistrySnapshot;
use crate::traits::RegistrySource;

/// Registry file format version
const REGISTRY_FILE_VERSION: &str = "1.0";

/// Serializable registry file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct RegistryFileFormat {
    #[serde(default = "default_version")]
    version: String,
    servers: Vec<ServerProfile>,
}

fn default_version() -> String {
    REGISTRY_FILE_VERSION.to_string()
}

/// JSON file-backed registry source
///
/// # Example
///
/// ```rust,no_run
/// use multidns_core::FileRegistry;
/// use multidns_core::traits::RegistrySource;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = FileRegistry::new("/etc/multidns/servers.json");
///     let snapshot = registry.snapshot().await?;
///     println!("{} server(s) configured", snapshot.len());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    /// Create a registry reading from `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the registry file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a registry file atomically (write-then-rename)
    pub async fn write(&self, profiles: &[ServerProfile]) -> Result<(), Error> {
        // Validate before anything touches disk
        RegistrySnapshot::new(profiles.to_vec())?;

        let format = RegistryFileFormat {
            version: REGISTRY_FILE_VERSION.to_string(),
            servers: profiles.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&format)?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &json).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl RegistrySource for FileRegistry {
    async fn snapshot(&self) -> Result<RegistrySnapshot, Error> {
        let contents = fs::read(&self.path).await.map_err(|e| {
            Error::registry(format!(
                "Failed to read registry file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let format: RegistryFileFormat = serde_json::from_slice(&contents).map_err(|e| {
            Error::registry(format!(
                "Corrupted registry file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if format.version != REGISTRY_FILE_VERSION {
            tracing::warn!(
                "Registry file {} has version {}, expected {}",
                self.path.display(),
                format.version,
                REGISTRY_FILE_VERSION
            );
        }

        RegistrySnapshot::new(format.servers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_snapshot() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path().join("servers.json"));

        let profiles = vec![
            ServerProfile::new(1, "Primary", "http://ns1:8081", "k1")
                .with_default(true)
                .with_multi_server_mode(true),
            ServerProfile::new(2, "Secondary", "http://ns2:8081", "k2")
                .with_multi_server_mode(true),
        ];
        registry.write(&profiles).await.unwrap();

        let snapshot = registry.snapshot().await.unwrap();
        assert_eq!(snapshot.profiles(), profiles.as_slice());
    }

    #[tokio::test]
    async fn test_missing_file_is_registry_error() {
        let dir = TempDir::new().unwrap();
        let registry = FileRegistry::new(dir.path().join("absent.json"));

        let result = registry.snapshot().await;
        assert!(matches!(result, Err(Error::Registry(_))));
    }

    #[tokio::test]
    async fn test_corrupted_file_is_registry_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("servers.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let result = FileRegistry::new(&path).snapshot().await;
        assert!(matches!(result, Err(Error::Registry(msg)) if msg.contains("Corrupted")));
    }

    #[tokio::test]
    async fn test_duplicate_names_in_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("servers.json");
        let json = serde_json::json!({
            "servers": [
                { "id": 1, "name": "ns", "api_url": "http://a", "api_key": "k" },
                { "id": 2, "name": "ns", "api_url": "http://b", "api_key": "k" }
            ]
        });
        tokio::fs::write(&path, json.to_string()).await.unwrap();

        let result = FileRegistry::new(&path).snapshot().await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_write_rejects_invalid_registry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("servers.json");
        let registry = FileRegistry::new(&path);

        let profiles = vec![
            ServerProfile::new(1, "A", "http://a", "k").with_default(true),
            ServerProfile::new(2, "B", "http://b", "k").with_default(true),
        ];

        assert!(registry.write(&profiles).await.is_err());
        assert!(!path.exists(), "Nothing should be written for an invalid registry");
    }
}
