// src/store/mod.rs

//! Persistent key-value buckets and the typed read-all / write-all layer on top of them.
//!
//! Every collection is a read-modify-write wrapper around one bucket: read the whole
//! JSON array, compute the new array, write it back. Within a process those cycles are
//! serialised by `Records::update`; across processes sharing the same backend the last
//! writer wins.

pub mod file;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{Mutex, broadcast};

use crate::{
    config::{Config, StoreBackend},
    error::AppError,
};

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Raw bucket access. Implementations only move strings around; parsing is done by `Records`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns `None` when the bucket has never been written.
    async fn load(&self, bucket: &str) -> Result<Option<String>, AppError>;

    /// Replaces the bucket's entire content.
    async fn save(&self, bucket: &str, content: String) -> Result<(), AppError>;

    async fn remove(&self, bucket: &str) -> Result<(), AppError>;
}

/// The named buckets used by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Accounts,
    Quizzes,
    Scores,
    Notifications,
    /// Single-value slot holding the signed-in account.
    CurrentAccount,
}

impl Bucket {
    pub fn name(&self) -> &'static str {
        match self {
            Bucket::Accounts => "accounts",
            Bucket::Quizzes => "quizzes",
            Bucket::Scores => "scores",
            Bucket::Notifications => "notifications",
            Bucket::CurrentAccount => "current_account",
        }
    }
}

/// Emitted after every successful write through `Records`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Written(Bucket),
    Cleared(Bucket),
}

/// Typed, observable access to a `RecordStore`.
/// Cheap to clone; clones share the backend, the write lock and the event channel.
#[derive(Clone)]
pub struct Records {
    backend: Arc<dyn RecordStore>,
    events: broadcast::Sender<StoreEvent>,
    write_lock: Arc<Mutex<()>>,
    latency: Duration,
}

impl Records {
    pub fn new(backend: Arc<dyn RecordStore>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            backend,
            events,
            write_lock: Arc::new(Mutex::new(())),
            latency: Duration::ZERO,
        }
    }

    /// Adds a fixed delay before each collection call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Reads a whole bucket.
    ///
    /// Never fails: a missing bucket is empty, and unparseable content or a backend
    /// read error is logged and treated as empty.
    pub async fn read_all<T: DeserializeOwned>(&self, bucket: Bucket) -> Vec<T> {
        self.load_records(bucket).await.unwrap_or_else(|e| {
            tracing::error!(bucket = bucket.name(), error = %e, "Failed to read bucket");
            Vec::new()
        })
    }

    /// Like `read_all`, but a backend read error is returned instead of read as empty.
    async fn load_records<T: DeserializeOwned>(&self, bucket: Bucket) -> Result<Vec<T>, AppError> {
        let Some(raw) = self.backend.load(bucket.name()).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(
                    bucket = bucket.name(),
                    error = %e,
                    "Failed to parse bucket, treating it as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Replaces a whole bucket. Last writer wins; there is no merge.
    pub async fn write_all<T: Serialize>(&self, bucket: Bucket, records: &[T]) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.persist(bucket, records).await
    }

    /// Read-modify-write under the in-process write lock.
    ///
    /// The bucket is written back only when `apply` returns `Ok`; an `Err` leaves it untouched.
    /// A failed backend read aborts before `apply` runs, so the bucket is never
    /// overwritten from a read that did not happen.
    pub async fn update<T, R, F>(&self, bucket: Bucket, apply: F) -> Result<R, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> Result<R, AppError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_records(bucket).await?;
        let out = apply(&mut records)?;
        self.persist(bucket, &records).await?;
        Ok(out)
    }

    /// Reads a single-value slot. Corrupt content is logged and treated as absent.
    pub async fn read_one<T: DeserializeOwned>(&self, bucket: Bucket) -> Option<T> {
        match self.backend.load(bucket.name()).await {
            Ok(Some(raw)) => serde_json::from_str(&raw)
                .map_err(|e| {
                    tracing::warn!(bucket = bucket.name(), error = %e, "Failed to parse slot");
                })
                .ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(bucket = bucket.name(), error = %e, "Failed to read slot");
                None
            }
        }
    }

    pub async fn write_one<T: Serialize>(&self, bucket: Bucket, value: &T) -> Result<(), AppError> {
        let content = serde_json::to_string(value)?;
        let _guard = self.write_lock.lock().await;
        self.backend.save(bucket.name(), content).await?;
        self.events.send(StoreEvent::Written(bucket)).ok();
        Ok(())
    }

    pub async fn clear(&self, bucket: Bucket) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.backend.remove(bucket.name()).await?;
        self.events.send(StoreEvent::Cleared(bucket)).ok();
        Ok(())
    }

    async fn persist<T: Serialize>(&self, bucket: Bucket, records: &[T]) -> Result<(), AppError> {
        let content = serde_json::to_string(records)?;
        self.backend.save(bucket.name(), content).await.map_err(|e| {
            tracing::error!(bucket = bucket.name(), error = %e, "Failed to write bucket");
            e
        })?;
        // No subscribers is fine.
        self.events.send(StoreEvent::Written(bucket)).ok();
        Ok(())
    }
}

/// Opens the backend selected by `config.backend`.
pub async fn open(config: &Config) -> Result<Arc<dyn RecordStore>, AppError> {
    let backend: Arc<dyn RecordStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(FileStore::open(&config.data_dir).await?),
        StoreBackend::Sqlite => Arc::new(SqliteStore::connect(&config.database_url).await?),
    };
    tracing::info!(backend = ?config.backend, "Record store opened");
    Ok(backend)
}
