//! Resource store for the simulated provider
//!
//! Keeps every simulated resource in memory and, when given a project root,
//! mirrors it to `.skyform/resources.json` so resources survive across CLI
//! invocations. The previous file is kept as a backup on every save. This
//! store is private to the sim provider; the engine itself persists nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skyform_engine::{Outputs, ProviderError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

const STORE_VERSION: u32 = 1;
const STORE_DIR: &str = ".skyform";
const STORE_FILE: &str = "resources.json";
const STORE_BACKUP: &str = "resources.json.backup";

/// One simulated resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimResource {
    /// Synthesized platform id
    pub id: String,

    /// Resource type tag
    pub resource_type: String,

    /// Inputs as of the last create or update
    pub inputs: Outputs,

    /// Synthesized output attributes
    pub outputs: Outputs,

    /// Bumped on every in-place update
    pub generation: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// On-disk layout
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    updated_at: DateTime<Utc>,
    /// Resources indexed by project:type:name
    resources: HashMap<String, SimResource>,
}

/// In-memory resource map with optional file persistence
pub struct SimStore {
    path: Option<PathBuf>,
    resources: Mutex<Option<HashMap<String, SimResource>>>,
}

impl SimStore {
    /// Purely in-memory store (tests, single-shot runs)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            resources: Mutex::new(Some(HashMap::new())),
        }
    }

    /// File-backed store under `<project_root>/.skyform/resources.json`
    pub fn at(project_root: impl AsRef<Path>) -> Self {
        Self {
            path: Some(project_root.as_ref().join(STORE_DIR).join(STORE_FILE)),
            resources: Mutex::new(None),
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<SimResource>> {
        let mut guard = self.resources.lock().await;
        let resources = self.loaded(&mut guard).await?;
        Ok(resources.get(key).cloned())
    }

    pub async fn put(&self, key: String, resource: SimResource) -> Result<()> {
        let mut guard = self.resources.lock().await;
        let resources = self.loaded(&mut guard).await?;
        resources.insert(key, resource);
        self.save(resources).await
    }

    pub async fn remove(&self, key: &str) -> Result<Option<SimResource>> {
        let mut guard = self.resources.lock().await;
        let resources = self.loaded(&mut guard).await?;
        let removed = resources.remove(key);
        if removed.is_some() {
            self.save(resources).await?;
        }
        Ok(removed)
    }

    pub async fn len(&self) -> Result<usize> {
        let mut guard = self.resources.lock().await;
        let resources = self.loaded(&mut guard).await?;
        Ok(resources.len())
    }

    async fn loaded<'a>(
        &self,
        guard: &'a mut Option<HashMap<String, SimResource>>,
    ) -> Result<&'a mut HashMap<String, SimResource>> {
        if guard.is_none() {
            *guard = Some(self.load_from_disk().await?);
        }
        Ok(guard.get_or_insert_with(HashMap::new))
    }

    async fn load_from_disk(&self) -> Result<HashMap<String, SimResource>> {
        let Some(path) = &self.path else {
            return Ok(HashMap::new());
        };
        if !path.exists() {
            tracing::debug!("resource store not found, starting empty");
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await?;
        let file: StoreFile = serde_json::from_str(&content)?;
        if file.version > STORE_VERSION {
            return Err(ProviderError::Platform(format!(
                "resource store version {} is newer than supported version {}",
                file.version, STORE_VERSION
            )));
        }

        tracing::debug!("loaded {} simulated resources", file.resources.len());
        Ok(file.resources)
    }

    async fn save(&self, resources: &HashMap<String, SimResource>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent()
            && !dir.exists()
        {
            fs::create_dir_all(dir).await?;
            tracing::debug!("created store directory: {}", dir.display());
        }

        if path.exists() {
            let backup = path.with_file_name(STORE_BACKUP);
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(path, &backup).await?;
        }

        let file = StoreFile {
            version: STORE_VERSION,
            updated_at: Utc::now(),
            resources: resources.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        fs::write(path, content).await?;

        tracing::debug!("saved {} simulated resources", resources.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn resource(id: &str) -> SimResource {
        let now = Utc::now();
        let mut outputs = Outputs::new();
        outputs.insert("id".into(), json!(id));
        SimResource {
            id: id.to_string(),
            resource_type: "bucket".to_string(),
            inputs: Outputs::new(),
            outputs,
            generation: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();

        let store = SimStore::at(dir.path());
        store
            .put("demo:bucket:site".to_string(), resource("site-1234"))
            .await
            .unwrap();

        // Fresh handle re-reads from disk
        let reopened = SimStore::at(dir.path());
        let loaded = reopened.get("demo:bucket:site").await.unwrap().unwrap();
        assert_eq!(loaded.id, "site-1234");
        assert_eq!(reopened.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_keeps_a_backup() {
        let dir = tempdir().unwrap();
        let store = SimStore::at(dir.path());

        store
            .put("demo:bucket:a".to_string(), resource("a-1"))
            .await
            .unwrap();
        store
            .put("demo:bucket:b".to_string(), resource("b-1"))
            .await
            .unwrap();

        assert!(dir.path().join(STORE_DIR).join(STORE_BACKUP).exists());
    }

    #[tokio::test]
    async fn test_remove_persists() {
        let dir = tempdir().unwrap();
        let store = SimStore::at(dir.path());
        store
            .put("demo:bucket:site".to_string(), resource("site-1"))
            .await
            .unwrap();
        store.remove("demo:bucket:site").await.unwrap();

        let reopened = SimStore::at(dir.path());
        assert!(reopened.get("demo:bucket:site").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_store_never_touches_disk() {
        let store = SimStore::in_memory();
        store
            .put("demo:bucket:site".to_string(), resource("site-1"))
            .await
            .unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
    }
}
