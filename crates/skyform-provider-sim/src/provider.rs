//! Simulated provider implementation
//!
//! Stands in for a real control plane: attribute synthesis is a pure
//! function of project, type, and logical name, so re-applying an unchanged
//! graph always yields the same outputs and never a duplicate resource.

use crate::store::{SimResource, SimStore};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use skyform_engine::{Outputs, ProviderContext, ProviderError, ResourceProvider, Result};
use std::path::Path;

/// Deterministic simulated resource provider
pub struct SimProvider {
    store: SimStore,
}

impl SimProvider {
    /// In-memory provider; resources live only as long as the process
    pub fn new() -> Self {
        Self {
            store: SimStore::in_memory(),
        }
    }

    /// File-backed provider rooted at a project directory
    pub fn with_store(project_root: impl AsRef<Path>) -> Self {
        Self {
            store: SimStore::at(project_root),
        }
    }

    /// Number of resources currently held
    pub async fn resource_count(&self) -> Result<usize> {
        self.store.len().await
    }

    fn key(ctx: &ProviderContext, resource_type: &str, name: &str) -> String {
        format!("{}:{}:{}", ctx.project, resource_type, name)
    }
}

impl Default for SimProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceProvider for SimProvider {
    fn name(&self) -> &str {
        "sim"
    }

    async fn create_or_update(
        &self,
        ctx: &ProviderContext,
        resource_type: &str,
        name: &str,
        inputs: &Outputs,
    ) -> Result<Outputs> {
        let key = Self::key(ctx, resource_type, name);

        if let Some(existing) = self.store.get(&key).await? {
            if existing.inputs == *inputs {
                tracing::debug!(resource = %key, "unchanged, no-op");
                return Ok(existing.outputs);
            }

            // In-place update: the platform id is stable across updates
            let outputs = synthesize_outputs(ctx, resource_type, name, &existing.id, inputs);
            let updated = SimResource {
                inputs: inputs.clone(),
                outputs: outputs.clone(),
                generation: existing.generation + 1,
                updated_at: Utc::now(),
                ..existing
            };
            tracing::info!(resource = %key, generation = updated.generation, "updated");
            self.store.put(key, updated).await?;
            return Ok(outputs);
        }

        let id = synthesize_id(ctx, resource_type, name);
        let outputs = synthesize_outputs(ctx, resource_type, name, &id, inputs);
        let now = Utc::now();
        let created = SimResource {
            id,
            resource_type: resource_type.to_string(),
            inputs: inputs.clone(),
            outputs: outputs.clone(),
            generation: 1,
            created_at: now,
            updated_at: now,
        };
        tracing::info!(resource = %key, "created");
        self.store.put(key, created).await?;
        Ok(outputs)
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        resource_type: &str,
        name: &str,
    ) -> Result<Outputs> {
        let key = Self::key(ctx, resource_type, name);
        match self.store.get(&key).await? {
            Some(resource) => Ok(resource.outputs),
            None => Err(ProviderError::NotFound(key)),
        }
    }

    async fn delete(&self, ctx: &ProviderContext, resource_type: &str, name: &str) -> Result<()> {
        let key = Self::key(ctx, resource_type, name);
        match self.store.remove(&key).await? {
            Some(_) => {
                tracing::info!(resource = %key, "deleted");
                Ok(())
            }
            None => Err(ProviderError::NotFound(key)),
        }
    }
}

/// Stable platform id for a resource, derived from project and logical name
fn synthesize_id(ctx: &ProviderContext, resource_type: &str, name: &str) -> String {
    let hash = fnv1a(format!("{}/{}/{}", ctx.project, resource_type, name).as_bytes()) as u32;
    match resource_type {
        // Bucket ids are globally-unique names on real platforms
        "bucket" => format!("{name}-{hash:08x}"),
        // Object ids are their keys
        "bucket-object" => name.to_string(),
        "network" => format!("net-{hash:08x}"),
        "security-group" => format!("sg-{hash:08x}"),
        "load-balancer" => format!("lb-{hash:08x}"),
        other => format!("{other}-{hash:08x}"),
    }
}

/// Output attributes per resource type
fn synthesize_outputs(
    ctx: &ProviderContext,
    resource_type: &str,
    name: &str,
    id: &str,
    inputs: &Outputs,
) -> Outputs {
    let mut outputs = Outputs::new();
    outputs.insert("id".into(), json!(id));
    outputs.insert("name".into(), json!(name));
    outputs.insert(
        "arn".into(),
        json!(format!("arn:sim:{}:{}:{}", resource_type, ctx.project, id)),
    );

    match resource_type {
        "network" => {
            outputs.insert(
                "public_subnet_ids".into(),
                json!([format!("subnet-{id}-pub-a"), format!("subnet-{id}-pub-b")]),
            );
            outputs.insert(
                "private_subnet_ids".into(),
                json!([format!("subnet-{id}-prv-a"), format!("subnet-{id}-prv-b")]),
            );
        }
        "load-balancer" => {
            outputs.insert("dns_name".into(), json!(format!("{id}.lb.sim.internal")));
        }
        "bucket" => {
            outputs.insert("bucket".into(), json!(id));
            outputs.insert(
                "website_endpoint".into(),
                json!(format!("{id}.website.sim.internal")),
            );
        }
        "bucket-object" => {
            let etag = fnv1a(
                serde_json::to_string(inputs)
                    .unwrap_or_default()
                    .as_bytes(),
            );
            outputs.insert("etag".into(), json!(format!("{etag:016x}")));
        }
        "role" => {
            outputs.insert(
                "arn".into(),
                json!(format!("arn:sim:iam:{}:role/{}", ctx.project, name)),
            );
        }
        "container-service" => {
            outputs.insert("status".into(), json!("running"));
        }
        _ => {}
    }

    outputs
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn ctx() -> ProviderContext {
        ProviderContext::new("demo")
    }

    fn inputs(pairs: &[(&str, serde_json::Value)]) -> Outputs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_then_unchanged_apply_is_idempotent() {
        let provider = SimProvider::new();
        let inputs = inputs(&[("index_document", json!("index.html"))]);

        let first = provider
            .create_or_update(&ctx(), "bucket", "site", &inputs)
            .await
            .unwrap();
        let second = provider
            .create_or_update(&ctx(), "bucket", "site", &inputs)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.resource_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_changed_inputs_update_in_place() {
        let provider = SimProvider::new();

        let first = provider
            .create_or_update(&ctx(), "container-service", "app", &inputs(&[("count", json!(1))]))
            .await
            .unwrap();
        let second = provider
            .create_or_update(&ctx(), "container-service", "app", &inputs(&[("count", json!(3))]))
            .await
            .unwrap();

        // Same platform id, no second resource
        assert_eq!(first.get("id"), second.get("id"));
        assert_eq!(provider.resource_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_network_outputs_include_subnets() {
        let provider = SimProvider::new();
        let outputs = provider
            .create_or_update(&ctx(), "network", "app-vpc", &Outputs::new())
            .await
            .unwrap();

        let public = outputs.get("public_subnet_ids").unwrap();
        assert_eq!(public.as_array().unwrap().len(), 2);
        assert!(outputs.contains_key("private_subnet_ids"));
    }

    #[tokio::test]
    async fn test_load_balancer_gets_a_dns_name() {
        let provider = SimProvider::new();
        let outputs = provider
            .create_or_update(&ctx(), "load-balancer", "app-lb", &Outputs::new())
            .await
            .unwrap();

        let dns = outputs.get("dns_name").unwrap().as_str().unwrap();
        assert!(dns.ends_with(".lb.sim.internal"));
    }

    #[tokio::test]
    async fn test_read_and_delete() {
        let provider = SimProvider::new();
        provider
            .create_or_update(&ctx(), "bucket", "site", &Outputs::new())
            .await
            .unwrap();

        assert!(provider.read(&ctx(), "bucket", "site").await.is_ok());
        provider.delete(&ctx(), "bucket", "site").await.unwrap();

        let err = provider.read(&ctx(), "bucket", "site").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_of_unknown_resource_is_not_found() {
        let provider = SimProvider::new();
        let err = provider.delete(&ctx(), "bucket", "ghost").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resources_survive_across_provider_instances() {
        let dir = tempdir().unwrap();

        let provider = SimProvider::with_store(dir.path());
        let created = provider
            .create_or_update(&ctx(), "bucket", "site", &Outputs::new())
            .await
            .unwrap();

        let reopened = SimProvider::with_store(dir.path());
        let read = reopened.read(&ctx(), "bucket", "site").await.unwrap();
        assert_eq!(created, read);
    }

    #[test]
    fn test_ids_are_stable_and_type_prefixed() {
        let ctx = ctx();
        assert_eq!(
            synthesize_id(&ctx, "network", "app-vpc"),
            synthesize_id(&ctx, "network", "app-vpc")
        );
        assert!(synthesize_id(&ctx, "security-group", "web").starts_with("sg-"));
        assert_eq!(synthesize_id(&ctx, "bucket-object", "index.html"), "index.html");
    }
}
