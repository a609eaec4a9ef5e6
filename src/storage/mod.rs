// src/storage/mod.rs

pub mod gcs;
pub mod memory;

pub use gcs::GcsStore;
pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Minimal object-store surface both pipelines need.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the whole object at `path`.
    async fn get(&self, path: &str) -> Result<Bytes>;

    /// Create or replace the object at `path`.
    async fn put(&self, path: &str, data: Vec<u8>) -> Result<()>;

    /// Human-readable location, e.g. `gs://bucket`.
    fn location(&self) -> String;
}
