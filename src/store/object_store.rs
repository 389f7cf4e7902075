//! Content-addressed object store with file-based JSON sidecars
//!
//! Directory layout:
//! ```text
//! ~/.tidepool/
//! ├── objects/
//! │   ├── 3a/4f/2b8c9d...      (blob, named by SHA-256 of content)
//! │   └── ...
//! ├── metadata/
//! │   ├── <object-id>.json     (sidecar)
//! │   └── ...
//! ├── memory-index-v2.json     (named pointer document)
//! └── url-cache.json           (named pointer document)
//! ```
//!
//! The store exposes two addressing capabilities. Content-addressed blobs are
//! immutable: identical bytes always land at the identical id, so writes for
//! distinct content need no coordination. Named pointer documents are mutable
//! and rewritten wholesale; callers that share one must serialize their own
//! writes.

use super::metadata::Metadata;
use crate::error::{Error, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Content-addressed storage for all Tidepool artifacts
pub struct ObjectStore {
    objects_dir: PathBuf,
    metadata_dir: PathBuf,
    base_dir: PathBuf,
    /// Logical path -> object id, rebuilt from sidecars at startup
    path_index: Arc<RwLock<HashMap<String, String>>>,
}

impl ObjectStore {
    /// Open (or create) an object store rooted at the given directory
    pub async fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        let objects_dir = base_dir.join("objects");
        let metadata_dir = base_dir.join("metadata");

        tokio::fs::create_dir_all(&objects_dir).await?;
        tokio::fs::create_dir_all(&metadata_dir).await?;

        let store = Self {
            objects_dir,
            metadata_dir,
            base_dir,
            path_index: Arc::new(RwLock::new(HashMap::new())),
        };

        store.rebuild_path_index().await;
        Ok(store)
    }

    // =========================================================================
    // Content-addressed blobs
    // =========================================================================

    /// Store content and return its hash id.
    ///
    /// Identical content always yields the identical id; an already-present
    /// object is never rewritten.
    pub async fn store(&self, content: &[u8]) -> Result<String> {
        let id = content_id(content);

        let dir = self.objects_dir.join(&id[..2]).join(&id[2..4]);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(&id[4..]);
        if !path.exists() {
            tokio::fs::write(&path, content).await?;
        }

        Ok(id)
    }

    /// Retrieve content by hash id
    pub async fn read(&self, id: &str) -> Result<Vec<u8>> {
        let path = self
            .object_path(id)
            .ok_or_else(|| Error::NotFound(format!("invalid object id: {id}")))?;

        match tokio::fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("object not found: {id}")))
            }
            Err(e) => Err(Error::Storage(format!("failed to read object {id}: {e}"))),
        }
    }

    /// Check whether an object exists
    pub async fn exists(&self, id: &str) -> bool {
        self.object_path(id).map(|p| p.exists()).unwrap_or(false)
    }

    /// Filesystem path for an object id, or None for malformed ids
    pub fn object_path(&self, id: &str) -> Option<PathBuf> {
        if id.len() < 4 {
            return None;
        }
        Some(self.objects_dir.join(&id[..2]).join(&id[2..4]).join(&id[4..]))
    }

    /// List all object ids in the store
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();

        let mut shards = tokio::fs::read_dir(&self.objects_dir).await?;
        while let Some(shard) = shards.next_entry().await? {
            if !shard.file_type().await?.is_dir() {
                continue;
            }
            let prefix = shard.file_name().to_string_lossy().to_string();

            let mut subshards = tokio::fs::read_dir(shard.path()).await?;
            while let Some(subshard) = subshards.next_entry().await? {
                if !subshard.file_type().await?.is_dir() {
                    continue;
                }
                let mid = subshard.file_name().to_string_lossy().to_string();

                let mut files = tokio::fs::read_dir(subshard.path()).await?;
                while let Some(file) = files.next_entry().await? {
                    if file.file_type().await?.is_file() {
                        let rest = file.file_name().to_string_lossy().to_string();
                        ids.push(format!("{prefix}{mid}{rest}"));
                    }
                }
            }
        }

        Ok(ids)
    }

    // =========================================================================
    // Metadata sidecars and the logical path index
    // =========================================================================

    /// Store content together with its metadata sidecar.
    ///
    /// The sidecar id is filled in from the content hash and every path in
    /// `metadata.paths` becomes retrievable through [`read_path`].
    ///
    /// [`read_path`]: Self::read_path
    pub async fn store_with_metadata(
        &self,
        content: &[u8],
        mut metadata: Metadata,
    ) -> Result<String> {
        let id = self.store(content).await?;

        metadata.id = id.clone();
        self.save_metadata(&mut metadata).await?;
        self.register_paths(&metadata).await;

        Ok(id)
    }

    /// Persist a metadata sidecar, filling defaults for created and lifecycle
    pub async fn save_metadata(&self, meta: &mut Metadata) -> Result<()> {
        if meta.id.is_empty() {
            return Err(Error::Storage("metadata id cannot be empty".to_string()));
        }

        if meta.created.is_none() {
            meta.created = Some(Utc::now());
        }
        if meta.lifecycle.is_empty() {
            meta.lifecycle = "draft".to_string();
        }

        let data = serde_json::to_string_pretty(meta)?;
        let path = self.metadata_dir.join(format!("{}.json", meta.id));
        tokio::fs::write(&path, data).await?;

        Ok(())
    }

    /// Load the metadata sidecar for an object
    pub async fn load_metadata(&self, id: &str) -> Result<Metadata> {
        let path = self.metadata_dir.join(format!("{id}.json"));
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("metadata not found for object: {id}")))
            }
            Err(e) => return Err(Error::Storage(format!("failed to read metadata {id}: {e}"))),
        };

        Ok(serde_json::from_str(&data)?)
    }

    /// Load every parseable metadata sidecar in the store.
    ///
    /// Unreadable or corrupt sidecars are skipped with a warning so one bad
    /// record never hides the rest.
    pub async fn list_metadata(&self) -> Vec<Metadata> {
        Self::load_json_files(&self.metadata_dir)
    }

    /// Resolve a logical path to the object id currently registered for it
    pub async fn resolve_path(&self, path: &str) -> Option<String> {
        self.path_index.read().await.get(path).cloned()
    }

    /// Retrieve content by logical path
    pub async fn read_path(&self, path: &str) -> Result<Vec<u8>> {
        let id = self
            .resolve_path(path)
            .await
            .ok_or_else(|| Error::NotFound(format!("no object registered at path: {path}")))?;
        self.read(&id).await
    }

    /// Register every path in a metadata record, pointing it at the record's
    /// object. Later registrations of the same path win.
    pub async fn register_paths(&self, meta: &Metadata) {
        if meta.paths.is_empty() {
            return;
        }
        let mut index = self.path_index.write().await;
        for path in &meta.paths {
            index.insert(path.clone(), meta.id.clone());
        }
    }

    /// Rebuild the logical path index from metadata sidecars
    async fn rebuild_path_index(&self) {
        let records = self.list_metadata().await;
        let mut index = self.path_index.write().await;
        index.clear();
        for meta in &records {
            for path in &meta.paths {
                index.insert(path.clone(), meta.id.clone());
            }
        }
        tracing::debug!(
            "Path index rebuilt: {} paths from {} records",
            index.len(),
            records.len()
        );
    }

    /// Load all JSON files from a directory, skipping unparseable ones
    fn load_json_files<T: serde::de::DeserializeOwned>(dir: &Path) -> Vec<T> {
        let mut items = Vec::new();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read directory {}: {}", dir.display(), e);
                }
                return items;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(data) => match serde_json::from_str(&data) {
                    Ok(item) => items.push(item),
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                }
            }
        }

        items
    }

    // =========================================================================
    // Named pointer documents
    // =========================================================================

    /// Write a mutable named document, replacing any previous content.
    ///
    /// Named documents live beside the fan-out tree, so they never collide
    /// with content-addressed objects and never appear in [`list`].
    ///
    /// [`list`]: Self::list
    pub async fn write_named(&self, name: &str, content: &[u8]) -> Result<()> {
        let path = self.named_path(name)?;
        tokio::fs::write(&path, content).await?;
        Ok(())
    }

    /// Read a mutable named document
    pub async fn read_named(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.named_path(name)?;
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("named document not found: {name}")))
            }
            Err(e) => Err(Error::Storage(format!(
                "failed to read named document {name}: {e}"
            ))),
        }
    }

    fn named_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(Error::Storage(format!("invalid document name: {name}")));
        }
        Ok(self.base_dir.join(name))
    }
}

/// Hex-encoded SHA-256 of the content
pub fn content_id(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
