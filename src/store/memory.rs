//! In-process object store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::ObjectStore;
use crate::error::{DropError, Result};

/// An object held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub contents: Vec<u8>,
    pub content_type: String,
}

/// Keeps objects in a map. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().ok()?.get(path).cloned()
    }

    /// Stored paths in lexical order.
    pub fn paths(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryStore {
    fn put(&self, path: &str, contents: &[u8], content_type: &str) -> Result<()> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| DropError::storage(path, "memory store lock poisoned"))?;
        objects.insert(
            path.to_string(),
            StoredObject {
                contents: contents.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
