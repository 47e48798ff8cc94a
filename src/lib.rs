//! CoreLink ID resolution SDK
//!
//! Produces a stable, privacy-compliant first-party identifier by combining
//! a two-tier local cache with an asynchronous resolution call against the
//! CoreLink ID service, gated on consent signals and a per-partner
//! suppression window.
//!
//! The entry point is [`IdentityProvider`]: `get_id` answers synchronously
//! from the cache while the stored expiry window is open (with the cached
//! id, or empty when the last response granted none), reports an active
//! no-consent window, or hands back a deferred [`Resolution`] task that the
//! host runs whenever it is ready for network traffic.
//!
//! ```no_run
//! use corelink_id::{ConsentContext, IdSelection, IdentityProvider, RequestParams, SdkConfig};
//!
//! # async fn example() -> corelink_id::IdResult<()> {
//! let provider = IdentityProvider::connect(&SdkConfig::from_env()?).await?;
//!
//! let params = RequestParams {
//!     client_id: Some("partner-1".to_string()),
//!     ..Default::default()
//! };
//!
//! match provider.get_id(&params, &ConsentContext::default()).await {
//!     IdSelection::Cached(Some(id)) => println!("cached: {}", id),
//!     IdSelection::Cached(None) => println!("no id granted for this window"),
//!     IdSelection::Suppressed(reason) => println!("suppressed: {:?}", reason),
//!     IdSelection::Deferred(resolution) => {
//!         if let Some(id) = resolution.run().await {
//!             println!("resolved: {}", id);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod consent;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod provider;
pub mod state;
pub mod storage;
pub mod transport;

pub use config::{EndpointConfig, HttpConfig, SdkConfig, StorageConfig};
pub use consent::{hash_identifier, ConsentContext, ConsentParams};
pub use error::{IdError, IdResult};
pub use protocol::{NoConsentScope, ResolutionProtocol, ResolveResponse, MISSING_CORE_CONSENT};
pub use provider::{
    DecodedId, IdSelection, IdentityProvider, RequestParams, Resolution, SuppressionReason,
};
pub use state::IdentityState;
pub use storage::{
    MemoryStore, RedisStore, SqliteStore, StorageBackend, TieredStore,
};
pub use transport::{HttpTransport, Transport};

/// Module name declared to host registries
pub const MODULE_NAME: &str = "corelinkId";

/// Source identifier attached to exported ids
pub const EID_SOURCE: &str = "corelink.io";

/// Global Vendor List id used for consent mapping
pub const GVL_VENDOR_ID: u32 = 1123;
