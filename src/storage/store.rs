/// Tiered store - uniform access to the ordered storage backends
///
/// Values are duplicated across every available tier. Reads walk the tiers
/// in priority order and return the first live hit; writes and deletes are
/// best-effort per tier so one unavailable backend never blocks the others.
use crate::metrics;
use crate::storage::{now_ms, StorageBackend, EXPIRY_SUFFIX};
use std::sync::Arc;
use tracing::{debug, warn};

/// Uniform accessor over the ordered backend list
///
/// The scope is the externally derived storage domain for this call; it is
/// threaded in at construction instead of living in shared module state, so
/// concurrent calls for different domains cannot observe each other's keys.
#[derive(Clone)]
pub struct TieredStore {
    backends: Arc<Vec<Arc<dyn StorageBackend>>>,
    scope: String,
}

impl TieredStore {
    /// Create a store over `backends`, namespacing every key by `scope`
    pub fn new(backends: Arc<Vec<Arc<dyn StorageBackend>>>, scope: Option<&str>) -> Self {
        let scope = match scope {
            Some(domain) if !domain.is_empty() => format!("corelink:{}:", domain),
            _ => "corelink:".to_string(),
        };

        Self { backends, scope }
    }

    /// Build a storage key with the scope prefix
    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.scope, key)
    }

    /// Read one of the SDK's own records; first live hit wins
    pub async fn read(&self, key: &str) -> Option<String> {
        let cache_key = self.build_key(key);
        self.read_physical(&cache_key).await
    }

    /// Read a record owned by the page frameworks under its literal key
    ///
    /// Consent fallbacks (`us_privacy`, `euconsent-v2`, ...) are written by
    /// the consent tooling itself and are not namespaced by the SDK.
    pub async fn read_external(&self, key: &str) -> Option<String> {
        self.read_physical(key).await
    }

    async fn read_physical(&self, cache_key: &str) -> Option<String> {
        for backend in self.backends.iter().filter(|b| b.supports()) {
            match backend.get(cache_key).await {
                Ok(Some(value)) => {
                    if backend.tracks_expiry()
                        || self.companion_live(backend.as_ref(), cache_key).await
                    {
                        debug!("Cache HIT: {} ({})", cache_key, backend.name());
                        metrics::record_cache_read(backend.name(), "hit");
                        return Some(value);
                    }
                    metrics::record_cache_read(backend.name(), "expired");
                }
                Ok(None) => {
                    metrics::record_cache_read(backend.name(), "miss");
                }
                Err(e) => {
                    warn!("Backend {} read failed for {}: {}", backend.name(), cache_key, e);
                    metrics::record_cache_read(backend.name(), "error");
                }
            }
        }

        debug!("Cache MISS: {}", cache_key);
        None
    }

    /// Check the companion expiry record of a plain-tier value
    ///
    /// An absent companion means the value was stored without one and is
    /// trusted as-is. A non-numeric companion is logged and also trusted.
    async fn companion_live(&self, backend: &dyn StorageBackend, cache_key: &str) -> bool {
        let exp_key = format!("{}{}", cache_key, EXPIRY_SUFFIX);

        match backend.get(&exp_key).await {
            Ok(Some(raw)) => match raw.parse::<i64>() {
                Ok(expires_at_ms) => now_ms() <= expires_at_ms,
                Err(_) => {
                    warn!("Ignoring non-numeric expiry record {}: {:?}", exp_key, raw);
                    true
                }
            },
            Ok(None) => true,
            Err(e) => {
                warn!("Backend {} read failed for {}: {}", backend.name(), exp_key, e);
                true
            }
        }
    }

    /// Write a value to every available tier
    ///
    /// Empty keys and empty values are dropped rather than stored. Tiers
    /// without native expiry get a companion `<key>_exp` record holding the
    /// absolute expiry as a string.
    pub async fn write(&self, key: &str, value: &str, expires_at_ms: i64) {
        if key.is_empty() || value.is_empty() {
            return;
        }

        let cache_key = self.build_key(key);

        for backend in self.backends.iter().filter(|b| b.supports()) {
            if let Err(e) = backend.set(&cache_key, value, expires_at_ms).await {
                warn!("Backend {} write failed for {}: {}", backend.name(), cache_key, e);
                continue;
            }

            if !backend.tracks_expiry() {
                let exp_key = format!("{}{}", cache_key, EXPIRY_SUFFIX);
                if let Err(e) = backend
                    .set(&exp_key, &expires_at_ms.to_string(), expires_at_ms)
                    .await
                {
                    warn!("Backend {} write failed for {}: {}", backend.name(), exp_key, e);
                }
            }
        }

        debug!("Cache SET: {} (expires {})", cache_key, expires_at_ms);
    }

    /// Remove a value and its companion from every tier; absent keys are a
    /// no-op
    pub async fn delete(&self, key: &str) {
        let cache_key = self.build_key(key);

        for backend in self.backends.iter().filter(|b| b.supports()) {
            if let Err(e) = backend.delete(&cache_key).await {
                warn!("Backend {} delete failed for {}: {}", backend.name(), cache_key, e);
            }

            if !backend.tracks_expiry() {
                let exp_key = format!("{}{}", cache_key, EXPIRY_SUFFIX);
                if let Err(e) = backend.delete(&exp_key).await {
                    warn!("Backend {} delete failed for {}: {}", backend.name(), exp_key, e);
                }
            }
        }

        debug!("Cache DELETE: {}", cache_key);
    }
}
