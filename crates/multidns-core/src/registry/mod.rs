//! Server registry snapshots
//!
//! A [`RegistrySnapshot`] is the immutable view of configured servers that one
//! orchestration call works from. Snapshots are validated on construction, so
//! duplicate names or multiple defaults never reach the engine.
//!
//! ## Sources
//!
//! - [`StaticRegistry`]: an in-memory snapshot (embedding, tests)
//! - [`FileRegistry`]: a JSON file re-read on every snapshot
//!
//! ## Usage
//!
//! ```rust,no_run
//! use multidns_core::{RegistrySnapshot, ServerProfile, StaticRegistry};
//!
//! # fn try_main() -> multidns_core::Result<()> {
//! let snapshot = RegistrySnapshot::new(vec![
//!     ServerProfile::new(1, "Primary", "http://ns1:8081", "key").with_default(true),
//! ])?;
//! let registry = StaticRegistry::new(snapshot);
//! # Ok(())
//! # }
//! ```

pub mod file;
pub mod memory;

pub use file::FileRegistry;
pub use memory::StaticRegistry;

use crate::config::ServerProfile;
use crate::error::{Error, Result};
use std::collections::HashSet;

/// Immutable, validated view of the configured servers
///
/// Profile order is preserved; it becomes the dispatch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    profiles: Vec<ServerProfile>,
}

impl RegistrySnapshot {
    /// Build a snapshot, rejecting invalid registries
    ///
    /// # Errors
    ///
    /// - Any profile fails [`ServerProfile::validate`]
    /// - Two profiles share an id or a name
    /// - More than one profile is flagged as default
    pub fn new(profiles: Vec<ServerProfile>) -> Result<Self> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        let mut default_name: Option<&str> = None;

        for profile in &profiles {
            profile.validate()?;

            if !ids.insert(profile.id) {
                return Err(Error::config(format!("Duplicate server id: {}", profile.id)));
            }
            if !names.insert(profile.name.as_str()) {
                return Err(Error::config(format!(
                    "Duplicate server name: '{}'",
                    profile.name
                )));
            }
            if profile.is_default {
                if let Some(existing) = default_name {
                    return Err(Error::config(format!(
                        "Multiple default servers: '{}' and '{}'",
                        existing, profile.name
                    )));
                }
                default_name = Some(profile.name.as_str());
            }
        }

        Ok(Self { profiles })
    }

    /// An empty snapshot
    pub fn empty() -> Self {
        Self::default()
    }

    /// All profiles, in registry order
    pub fn profiles(&self) -> &[ServerProfile] {
        &self.profiles
    }

    /// Active profiles, in registry order
    pub fn active(&self) -> impl Iterator<Item = &ServerProfile> {
        self.profiles.iter().filter(|p| p.is_active)
    }

    /// The designated default profile, if any (active or not)
    pub fn default_profile(&self) -> Option<&ServerProfile> {
        self.profiles.iter().find(|p| p.is_default)
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Option<&ServerProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Number of profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the snapshot holds no profiles
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
