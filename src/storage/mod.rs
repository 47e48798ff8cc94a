/// Tiered Storage System
///
/// Cached identity state is written to every available storage tier and
/// read back from the first tier that still holds a live value. Tiers with
/// native expiry (redis, memory) honor the entry's absolute expiry
/// themselves; plain key/value tiers (sqlite) pair each value with a
/// companion `<key>_exp` record holding the expiry as a string.

pub mod memory;
pub mod redis_store;
pub mod sqlite_store;
pub mod store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use sqlite_store::SqliteStore;
pub use store::TieredStore;

use crate::error::IdResult;
use async_trait::async_trait;

/// Suffix of the companion expiry record on tiers without native expiry
pub const EXPIRY_SUFFIX: &str = "_exp";

/// Storage backend trait
///
/// Implementations handle the actual persistence of identity records.
/// All operations take absolute expiry timestamps in milliseconds; a
/// backend that cannot expire entries natively reports
/// `tracks_expiry() == false` and the tiered store maintains companion
/// expiry records for it.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name used in logs and metrics
    fn name(&self) -> &'static str;

    /// Whether the backend is currently usable
    fn supports(&self) -> bool;

    /// Whether the backend expires entries natively
    fn tracks_expiry(&self) -> bool;

    /// Fetch a value by key
    async fn get(&self, key: &str) -> IdResult<Option<String>>;

    /// Store a value; `expires_at_ms` is honored natively when
    /// `tracks_expiry()` is true and ignored otherwise
    async fn set(&self, key: &str, value: &str, expires_at_ms: i64) -> IdResult<()>;

    /// Remove a value; absent keys are a no-op
    async fn delete(&self, key: &str) -> IdResult<()>;
}

/// Current wall-clock time in milliseconds since the epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Storage keys for identity records (logical names, scoped by the store)
pub mod keys {
    /// Resolved identifier returned to callers
    pub const CORE_ID: &str = "corelink_id";

    /// Expiry bounding both the cached id and the next network attempt
    pub const EXPIRY: &str = "corelink_expiry";

    /// Long-lived first-party profile id sent as the `fp` parameter
    pub const PROFILE_ID: &str = "corelink_fp";

    /// Partner-scoped no-consent suppression window
    pub fn suppression(client_id: &str) -> String {
        format!("corelink_nc_{}", client_id)
    }
}
