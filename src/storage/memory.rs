/// In-memory storage backend
///
/// Process-local tier with native expiry. Used by tests and by embedders
/// that bring no external infrastructure.
use crate::error::IdResult;
use crate::storage::{now_ms, StorageBackend};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at_ms: i64,
}

/// In-memory backend with native expiry
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    enabled: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            enabled: AtomicBool::new(true),
        }
    }

    /// Flip availability; a disabled backend reports `supports() == false`
    /// and the tiered store skips it entirely
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn supports(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn tracks_expiry(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> IdResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| now_ms() <= entry.expires_at_ms)
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, expires_at_ms: i64) -> IdResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at_ms,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> IdResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}
