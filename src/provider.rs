/// Identity provider orchestration
///
/// Public surface of the SDK. `get_id` answers from the tiered cache when it
/// can, reports an active no-consent window when it must, and otherwise
/// hands back a single-shot [`Resolution`] task that performs the network
/// round-trip when the host is ready for it.
use crate::config::{EndpointConfig, SdkConfig};
use crate::consent::{self, ConsentContext};
use crate::error::IdResult;
use crate::metrics;
use crate::protocol::ResolutionProtocol;
use crate::state::IdentityState;
use crate::storage::{keys, now_ms, RedisStore, SqliteStore, StorageBackend, TieredStore};
use crate::transport::{HttpTransport, Transport};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-call request parameters supplied by the host
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    /// Partner id; enables the `c` parameter and the suppression window
    pub client_id: Option<String>,

    /// Externally derived storage scope, typically the root domain of the
    /// embedding page
    pub domain: Option<String>,

    /// Pre-hashed identifier for the linkage side call (see
    /// [`crate::consent::hash_identifier`])
    pub hashed_identifier: Option<String>,

    /// End-user agent string, used to pick the resolution host
    pub user_agent: Option<String>,
}

/// Why `get_id` declined to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionReason {
    /// A partner-scoped no-consent window is still open
    NoClientConsent,
}

/// Outcome of a `get_id` call
pub enum IdSelection {
    /// Answered from the cache, no network involved; `None` when the last
    /// response granted no id and its expiry window is still open
    Cached(Option<String>),
    /// Resolution suppressed; no id and no primary network call
    Suppressed(SuppressionReason),
    /// Expiry window passed or never set; run the task to resolve over the
    /// network
    Deferred(Resolution),
}

/// Namespaced decoded id handed to host registries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedId {
    #[serde(rename = "corelinkId")]
    pub corelink_id: String,
}

/// Single-shot deferred resolution task
///
/// Consumes itself on `run`; a second attempt requires a new `get_id` call.
pub struct Resolution {
    protocol: ResolutionProtocol,
    store: TieredStore,
    client_id: Option<String>,
    consent: ConsentContext,
    user_agent: Option<String>,
}

impl Resolution {
    /// Run the deferred resolution
    ///
    /// Re-checks the cache first: another caller may have resolved between
    /// construction and invocation, in which case no request is issued and
    /// the cached outcome (possibly no id) is returned. Consent parameters
    /// are derived here, not at construction, so the freshest signals win.
    pub async fn run(self) -> Option<String> {
        let state = IdentityState::load(&self.store, self.client_id.as_deref()).await;
        if state.is_fresh(now_ms()) {
            debug!("Deferred resolution satisfied from cache");
            return state.core_id;
        }

        let stored_profile_id = self.store.read(keys::PROFILE_ID).await;
        let params = consent::resolve_params(&self.store, &self.consent).await;

        self.protocol
            .resolve(
                self.client_id.as_deref(),
                stored_profile_id.as_deref(),
                &params,
                self.user_agent.as_deref(),
            )
            .await
    }
}

/// Identity provider over a fixed backend list and transport
#[derive(Clone)]
pub struct IdentityProvider {
    backends: Arc<Vec<Arc<dyn StorageBackend>>>,
    transport: Arc<dyn Transport>,
    endpoints: EndpointConfig,
}

impl IdentityProvider {
    /// Build a provider over explicit backends and transport
    pub fn new(
        backends: Vec<Arc<dyn StorageBackend>>,
        transport: Arc<dyn Transport>,
        endpoints: EndpointConfig,
    ) -> Self {
        Self {
            backends: Arc::new(backends),
            transport,
            endpoints,
        }
    }

    /// Wire a provider from configuration
    ///
    /// The expiring redis tier is optional and skipped with a warning when
    /// unreachable; the sqlite tier is mandatory.
    pub async fn connect(config: &SdkConfig) -> IdResult<Self> {
        config.validate()?;

        let mut backends: Vec<Arc<dyn StorageBackend>> = Vec::new();

        if let Some(redis_url) = &config.storage.redis_url {
            match RedisStore::connect(redis_url).await {
                Ok(store) => backends.push(Arc::new(store)),
                Err(e) => {
                    warn!("Expiring cache tier unavailable, continuing without it: {}", e)
                }
            }
        }

        let sqlite = SqliteStore::connect(&config.storage.sqlite_path).await?;
        backends.push(Arc::new(sqlite));

        let transport = HttpTransport::new(&config.http.user_agent, config.timeout())?;

        Ok(Self::new(
            backends,
            Arc::new(transport),
            config.endpoints.clone(),
        ))
    }

    /// Resolve the id for one request
    ///
    /// Reads never mutate cached state; all writes happen inside the
    /// returned [`Resolution`] or the linkage side call.
    pub async fn get_id(&self, params: &RequestParams, consent: &ConsentContext) -> IdSelection {
        let store = self.store_for(params);
        let client_id = params.client_id.as_deref().filter(|c| !c.is_empty());
        let now = now_ms();

        let state = IdentityState::load(&store, client_id).await;

        // Independent of the primary decision below, including suppression
        self.spawn_linkage(&store, params);

        if state.suppression_active(now) {
            info!("Resolution suppressed by partner-scoped no-consent window");
            metrics::record_suppressed();
            return IdSelection::Suppressed(SuppressionReason::NoClientConsent);
        }

        if state.is_fresh(now) {
            debug!("Answering from cache inside the stored expiry window");
            return IdSelection::Cached(state.core_id);
        }

        IdSelection::Deferred(Resolution {
            protocol: self.protocol_for(&store),
            store,
            client_id: client_id.map(str::to_string),
            consent: consent.clone(),
            user_agent: params.user_agent.clone(),
        })
    }

    /// Wrap a stored value into the namespaced shape handed to the host
    ///
    /// Non-string input yields `None`.
    pub fn decode(value: &serde_json::Value) -> Option<DecodedId> {
        value.as_str().map(|id| DecodedId {
            corelink_id: id.to_string(),
        })
    }

    fn store_for(&self, params: &RequestParams) -> TieredStore {
        TieredStore::new(Arc::clone(&self.backends), params.domain.as_deref())
    }

    fn protocol_for(&self, store: &TieredStore) -> ResolutionProtocol {
        ResolutionProtocol::new(
            store.clone(),
            Arc::clone(&self.transport),
            self.endpoints.clone(),
        )
    }

    /// Fire-and-forget linkage side call; its outcome only refreshes the
    /// cache for later calls
    fn spawn_linkage(&self, store: &TieredStore, params: &RequestParams) {
        let hashed = match params.hashed_identifier.as_deref().filter(|h| !h.is_empty()) {
            Some(hashed) => hashed.to_string(),
            None => return,
        };

        let protocol = self.protocol_for(store);
        let client_id = params.client_id.clone().filter(|c| !c.is_empty());
        let user_agent = params.user_agent.clone();

        tokio::spawn(async move {
            protocol
                .send_linkage(client_id.as_deref(), &hashed, user_agent.as_deref())
                .await;
        });
    }
}
