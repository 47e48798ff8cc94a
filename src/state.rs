/// Cached identity state
///
/// Read-model over the tiered store: everything `get_id` needs to decide
/// between answering from cache, suppressing, or resolving over the network.
use crate::storage::{keys, TieredStore};
use tracing::warn;

/// Snapshot of the cached identity records for one call
#[derive(Debug, Clone, Default)]
pub struct IdentityState {
    /// Cached identifier, if any record is present; can be absent while the
    /// expiry window is still open (see [`IdentityState::is_fresh`])
    pub core_id: Option<String>,

    /// Expiry in ms bounding both the cached id and the next network attempt
    pub core_id_expiry: i64,

    /// Partner-scoped no-consent window expiry in ms (0 when none is set)
    pub client_suppression_expiry: i64,
}

impl IdentityState {
    /// Load the snapshot, including the suppression window when a partner id
    /// is configured
    pub async fn load(store: &TieredStore, client_id: Option<&str>) -> Self {
        let core_id = store.read(keys::CORE_ID).await;

        let core_id_expiry = store
            .read(keys::EXPIRY)
            .await
            .map(|raw| parse_ms(keys::EXPIRY, &raw))
            .unwrap_or(0);

        let client_suppression_expiry = match client_id {
            Some(client_id) => store
                .read(&keys::suppression(client_id))
                .await
                .map(|raw| parse_ms("suppression window", &raw))
                .unwrap_or(0),
            None => 0,
        };

        Self {
            core_id,
            core_id_expiry,
            client_suppression_expiry,
        }
    }

    /// Whether the stored expiry window is still open
    ///
    /// Inside the window the cache answers without a network round-trip,
    /// whether or not an id was granted; the exact expiry instant is still
    /// inside the window.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms <= self.core_id_expiry
    }

    /// Whether the partner-scoped no-consent window is still open
    ///
    /// A window read at exactly its expiry instant has already closed, so
    /// resolution resumes on the next call.
    pub fn suppression_active(&self, now_ms: i64) -> bool {
        now_ms < self.client_suppression_expiry
    }
}

/// Parse a stored millisecond timestamp; malformed records degrade to 0
/// (expired) instead of failing the call
fn parse_ms(field: &str, raw: &str) -> i64 {
    raw.parse().unwrap_or_else(|_| {
        warn!("Ignoring non-numeric {} record: {:?}", field, raw);
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{now_ms, MemoryStore, StorageBackend};
    use std::sync::Arc;

    async fn create_test_store() -> TieredStore {
        let backends: Vec<Arc<dyn StorageBackend>> = vec![Arc::new(MemoryStore::new())];
        TieredStore::new(Arc::new(backends), None)
    }

    #[tokio::test]
    async fn test_load_of_empty_store() {
        let store = create_test_store().await;
        let state = IdentityState::load(&store, Some("partner-1")).await;

        assert_eq!(state.core_id, None);
        assert_eq!(state.core_id_expiry, 0);
        assert_eq!(state.client_suppression_expiry, 0);
        assert!(!state.is_fresh(now_ms()));
        assert!(!state.suppression_active(now_ms()));
    }

    #[tokio::test]
    async fn test_load_reads_all_three_records() {
        let store = create_test_store().await;
        let expiry = now_ms() + 60_000;
        store.write(keys::CORE_ID, "u-1", expiry).await;
        store.write(keys::EXPIRY, &expiry.to_string(), expiry).await;
        store
            .write(&keys::suppression("partner-1"), &expiry.to_string(), expiry)
            .await;

        let state = IdentityState::load(&store, Some("partner-1")).await;
        assert_eq!(state.core_id, Some("u-1".to_string()));
        assert_eq!(state.core_id_expiry, expiry);
        assert_eq!(state.client_suppression_expiry, expiry);
    }

    #[tokio::test]
    async fn test_suppression_ignored_without_client_id() {
        let store = create_test_store().await;
        let expiry = now_ms() + 60_000;
        store
            .write(&keys::suppression("partner-1"), &expiry.to_string(), expiry)
            .await;

        let state = IdentityState::load(&store, None).await;
        assert_eq!(state.client_suppression_expiry, 0);
    }

    #[tokio::test]
    async fn test_malformed_expiry_degrades_to_stale() {
        let store = create_test_store().await;
        let far = now_ms() + 60_000;
        store.write(keys::CORE_ID, "u-1", far).await;
        store.write(keys::EXPIRY, "garbage", far).await;

        let state = IdentityState::load(&store, None).await;
        assert_eq!(state.core_id_expiry, 0);
        assert!(!state.is_fresh(now_ms()));
    }

    #[test]
    fn test_freshness_boundary_is_inclusive() {
        let state = IdentityState {
            core_id: Some("u-1".to_string()),
            core_id_expiry: 1_000,
            client_suppression_expiry: 0,
        };

        assert!(state.is_fresh(999));
        assert!(state.is_fresh(1_000));
        assert!(!state.is_fresh(1_001));
    }

    #[test]
    fn test_freshness_is_window_only() {
        // A stored window holds even when no id was granted; it bounds the
        // next network attempt either way.
        let state = IdentityState {
            core_id: None,
            core_id_expiry: 1_000,
            client_suppression_expiry: 0,
        };

        assert!(state.is_fresh(1_000));
        assert!(!state.is_fresh(1_001));
    }

    #[test]
    fn test_suppression_boundary_is_exclusive() {
        let state = IdentityState {
            core_id: None,
            core_id_expiry: 0,
            client_suppression_expiry: 1_000,
        };

        assert!(state.suppression_active(999));
        assert!(!state.suppression_active(1_000));
        assert!(!state.suppression_active(1_001));
    }
}
