//! Persistence boundary for persona records.
//!
//! The engine only needs two operations — `load` and atomic `upsert` by user
//! id — so the trait stays small enough that any durable key-value or
//! relational backend can sit behind it. Two backends ship here: a JSON-file
//! store (one document per user, atomic temp-file + rename writes) and an
//! in-memory store for tests and single-process setups.

use crate::persona::record::PersonaRecord;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::sync::RwLock;
use tracing::debug;

/// Boxed future returned by [`PersonaStore`] methods.
///
/// Type alias to keep trait signatures and implementations readable, and the
/// trait usable as `Arc<dyn PersonaStore>`.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send + 'a>>;

/// Durable persona storage keyed by user id.
///
/// `upsert` must be atomic per key: a concurrent reader sees either the old
/// or the new record, never a torn one. Serializing concurrent writers for
/// the *same* user is the engine's job, not the store's.
pub trait PersonaStore: Send + Sync {
    /// Fetch a user's record. `Ok(None)` means the user has no persona yet.
    fn load<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, Option<PersonaRecord>>;

    /// Insert or replace a user's record.
    fn upsert<'a>(&'a self, user_id: &'a str, record: PersonaRecord) -> StoreFuture<'a, ()>;
}

// ── JsonFileStore ──────────────────────────────────────────────────

/// One `<user_id>.json` document per user under a root directory.
///
/// Writes go through a temp file and rename so a crash mid-write never
/// leaves a torn document behind.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Create a store, ensuring the root directory exists.
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The storage root directory.
    pub fn dir(&self) -> &Path {
        &self.root
    }

    /// Path for a user's document. Ids are sanitized into safe file names.
    fn record_path(&self, user_id: &str) -> PathBuf {
        let safe: String = user_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.root.join(format!("{safe}.json"))
    }
}

impl PersonaStore for JsonFileStore {
    fn load<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, Option<PersonaRecord>> {
        Box::pin(async move {
            let path = self.record_path(user_id);
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(err) => return Err(format!("Failed to read persona file: {err}")),
            };
            let record: PersonaRecord = serde_json::from_str(&content)
                .map_err(|e| format!("Failed to parse persona file {}: {e}", path.display()))?;
            Ok(Some(record))
        })
    }

    fn upsert<'a>(&'a self, user_id: &'a str, record: PersonaRecord) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let final_path = self.record_path(user_id);
            let tmp_path = final_path.with_extension("json.tmp");

            let json = serde_json::to_string_pretty(&record)
                .map_err(|e| format!("Failed to serialize persona: {e}"))?;
            std::fs::write(&tmp_path, json)
                .map_err(|e| format!("Failed to write temp persona file: {e}"))?;
            std::fs::rename(&tmp_path, &final_path)
                .map_err(|e| format!("Failed to rename persona file: {e}"))?;

            debug!("persisted persona for {user_id}");
            Ok(())
        })
    }
}

// ── MemoryStore ────────────────────────────────────────────────────

/// In-memory backend for tests and single-process setups.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, PersonaRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersonaStore for MemoryStore {
    fn load<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, Option<PersonaRecord>> {
        Box::pin(async move { Ok(self.records.read().await.get(user_id).cloned()) })
    }

    fn upsert<'a>(&'a self, user_id: &'a str, record: PersonaRecord) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.records.write().await.insert(user_id.to_string(), record);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_round_trips_a_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();

        let mut record = PersonaRecord::neutral();
        record.brand_affinities.insert("sony".into(), 0.8);
        record.confidence_score = 0.4;

        store.upsert("user-1", record.clone()).await.unwrap();
        let loaded = store.load("user-1").await.unwrap();
        assert_eq!(loaded, Some(record));
    }

    #[tokio::test]
    async fn file_store_missing_user_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        assert_eq!(store.load("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_upsert_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();

        store.upsert("user-1", PersonaRecord::neutral()).await.unwrap();
        let mut updated = PersonaRecord::neutral();
        updated.confidence_score = 0.9;
        store.upsert("user-1", updated.clone()).await.unwrap();

        assert_eq!(store.load("user-1").await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn file_store_sanitizes_hostile_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();

        store
            .upsert("../../etc/passwd", PersonaRecord::neutral())
            .await
            .unwrap();
        // The document lands inside the root, nowhere else.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            store.load("../../etc/passwd").await.unwrap(),
            Some(PersonaRecord::neutral())
        );
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.load("u").await.unwrap(), None);
        store.upsert("u", PersonaRecord::neutral()).await.unwrap();
        assert_eq!(store.load("u").await.unwrap(), Some(PersonaRecord::neutral()));
    }

    #[tokio::test]
    async fn stores_are_usable_as_trait_objects() {
        let store: std::sync::Arc<dyn PersonaStore> = std::sync::Arc::new(MemoryStore::new());
        store.upsert("u", PersonaRecord::neutral()).await.unwrap();
        assert!(store.load("u").await.unwrap().is_some());
    }
}
