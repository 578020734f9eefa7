//! Filesystem-backed object store: a directory stands in for the bucket.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ObjectStore;
use crate::error::{DropError, Result};

/// Suffix of the metadata sidecar written next to every object.
const META_SUFFIX: &str = ".meta.json";

/// Metadata recorded for each object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub content_type: String,
    pub size: u64,
}

/// Stores objects under `{root}/{bucket}/{object path}`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    base: PathBuf,
}

impl LocalStore {
    /// Open (and create if needed) the bucket directory.
    pub fn open(root: impl AsRef<Path>, bucket: &str) -> Result<Self> {
        let base = root.as_ref().join(bucket);
        std::fs::create_dir_all(&base).map_err(|e| DropError::io(&base, e))?;
        Ok(Self { base })
    }

    /// Directory holding the bucket's objects.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Read back the metadata sidecar of an object.
    pub fn meta(&self, path: &str) -> Result<ObjectMeta> {
        let meta_path = meta_path_for(&self.resolve(path)?);
        let raw = std::fs::read_to_string(&meta_path).map_err(|e| DropError::io(&meta_path, e))?;
        serde_json::from_str(&raw).map_err(|e| DropError::storage(path, e))
    }

    /// Map an object path onto the filesystem, refusing anything that could
    /// leave the bucket directory.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut resolved = self.base.clone();
        for component in path.split('/') {
            if component.is_empty() || component == "." || component == ".." || component.contains('\\') {
                return Err(DropError::storage(path, "invalid object path"));
            }
            resolved.push(component);
        }
        Ok(resolved)
    }
}

impl ObjectStore for LocalStore {
    fn put(&self, path: &str, contents: &[u8], content_type: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DropError::io(parent, e))?;
        }
        std::fs::write(&target, contents).map_err(|e| DropError::io(&target, e))?;

        let meta = ObjectMeta {
            content_type: content_type.to_string(),
            size: contents.len() as u64,
        };
        let meta_path = meta_path_for(&target);
        let json = serde_json::to_string_pretty(&meta).map_err(|e| DropError::storage(path, e))?;
        std::fs::write(&meta_path, json).map_err(|e| DropError::io(&meta_path, e))?;

        tracing::debug!(path = %target.display(), "Wrote object");
        Ok(())
    }
}

fn meta_path_for(object: &Path) -> PathBuf {
    let mut name = object.as_os_str().to_os_string();
    name.push(META_SUFFIX);
    PathBuf::from(name)
}
