//! Core traits for the orchestration system
//!
//! This module defines the abstract interfaces the engine is built against.
//!
//! - [`DnsServerClient`]: Execute one operation against one server
//! - [`RegistrySource`]: Produce consistent snapshots of configured servers

pub mod dns_client;
pub mod registry_source;

pub use dns_client::{DnsServerClient, ServerInfo};
pub use registry_source::RegistrySource;
