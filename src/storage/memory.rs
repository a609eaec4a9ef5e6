// src/storage/memory.rs

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::{BTreeMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use super::BlobStore;

/// Process-local store. Used for dry runs and as the test double for GCS.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Bytes>>,
    /// Paths whose `put` should fail, to exercise upload error handling.
    reject_puts: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.lock_objects().insert(path.into(), data.into());
    }

    pub fn reject_put(&self, path: impl Into<String>) {
        self.reject_puts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(path.into());
    }

    pub fn paths(&self) -> Vec<String> {
        self.lock_objects().keys().cloned().collect()
    }

    pub fn object(&self, path: &str) -> Option<Bytes> {
        self.lock_objects().get(path).cloned()
    }

    fn lock_objects(&self) -> MutexGuard<'_, BTreeMap<String, Bytes>> {
        self.objects.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Bytes> {
        self.object(path)
            .ok_or_else(|| anyhow!("no such object: {}", path))
    }

    async fn put(&self, path: &str, data: Vec<u8>) -> Result<()> {
        let rejected = self
            .reject_puts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(path);
        if rejected {
            return Err(anyhow!("simulated upload failure for {}", path));
        }
        self.insert(path, data);
        Ok(())
    }

    fn location(&self) -> String {
        "memory://".to_string()
    }
}
