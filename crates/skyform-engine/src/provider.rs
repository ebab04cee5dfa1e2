//! Resource provider trait definition

use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Resolved output attributes of an applied resource
pub type Outputs = BTreeMap<String, serde_json::Value>;

/// Context passed into every provider call
///
/// Owned by the caller of the scheduler; there is no ambient session or
/// global provider state anywhere in the engine.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    /// Project / stack name, used by providers to namespace resources
    pub project: String,

    /// Provider-specific settings (region, store path, ...)
    pub settings: BTreeMap<String, String>,
}

impl ProviderContext {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            settings: BTreeMap::new(),
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(|s| s.as_str())
    }
}

/// Resource provider abstraction
///
/// The provider owns all platform-specific semantics: diffing current vs.
/// desired state, idempotence of `create_or_update` (unchanged inputs must
/// not recreate an existing resource), retries against the remote control
/// plane, and eventual-consistency waits. The scheduler always calls
/// `create_or_update` and trusts that contract.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Provider name (e.g., "sim")
    fn name(&self) -> &str;

    /// Create the resource, or update it in place if it already exists.
    /// Returns the resolved output attributes.
    async fn create_or_update(
        &self,
        ctx: &ProviderContext,
        resource_type: &str,
        name: &str,
        inputs: &Outputs,
    ) -> Result<Outputs>;

    /// Read the current outputs of an existing resource
    async fn read(
        &self,
        ctx: &ProviderContext,
        resource_type: &str,
        name: &str,
    ) -> Result<Outputs>;

    /// Delete the resource
    async fn delete(&self, ctx: &ProviderContext, resource_type: &str, name: &str) -> Result<()>;
}
