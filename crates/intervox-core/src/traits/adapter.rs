// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all collaborators must implement.

use async_trait::async_trait;

use crate::error::IntervoxError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Intervox collaborator adapters.
///
/// Provides identity and health check capabilities shared by call backends
/// and persistence collaborators.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the kind of collaborator.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, IntervoxError>;
}
