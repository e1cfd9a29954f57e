// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{error::AppError, store::RecordStore};

/// In-process backend. Two `Records` sharing one `Arc<MemoryStore>`
/// behave like two processes on the same storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self, bucket: &str) -> Result<Option<String>, AppError> {
        Ok(self.buckets.read().await.get(bucket).cloned())
    }

    async fn save(&self, bucket: &str, content: String) -> Result<(), AppError> {
        self.buckets.write().await.insert(bucket.to_string(), content);
        Ok(())
    }

    async fn remove(&self, bucket: &str) -> Result<(), AppError> {
        self.buckets.write().await.remove(bucket);
        Ok(())
    }
}
