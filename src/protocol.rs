/// Resolution protocol
///
/// Builds the outbound resolution request, parses the service response once
/// at the transport boundary, and applies the resulting identity state
/// transition to the tiered store.
use crate::config::EndpointConfig;
use crate::consent::ConsentParams;
use crate::error::IdResult;
use crate::metrics;
use crate::storage::{keys, now_ms, TieredStore};
use crate::transport::Transport;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Error code the service sets when consent was insufficient to mint an id
pub const MISSING_CORE_CONSENT: u32 = 111;

/// Fixed lifetime of a persisted profile id (~9 months)
pub const PROFILE_TTL_MS: i64 = 270 * 24 * 60 * 60 * 1000;

/// User-agent marker for mobile browsers
const UA_MOBILE_MARKER: &str = "Mobile";

/// User-agent marker shared by the Chromium family
const UA_CHROMIUM_MARKER: &str = "Chrome";

/// Scope of a no-consent verdict in a service response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoConsentScope {
    /// Consent missing for the requesting partner only
    Client,
    /// Any other scope the service may introduce
    Other,
}

/// Typed resolution response
///
/// `expiry_ts` is required; a body without it is malformed and the whole
/// response is discarded.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveResponse {
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub core_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scope")]
    pub no_consent: Option<NoConsentScope>,
    pub expiry_ts: i64,
    #[serde(default)]
    pub errors: Vec<u32>,
}

/// Map the `no_consent` wire value onto its scope; unknown scopes are kept
/// as [`NoConsentScope::Other`] rather than failing the whole parse
fn deserialize_scope<'de, D>(deserializer: D) -> Result<Option<NoConsentScope>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(raw.map(|scope| match scope.as_str() {
        "CLIENT" => NoConsentScope::Client,
        _ => NoConsentScope::Other,
    }))
}

impl ResolveResponse {
    /// True when the response carries no missing-consent error code
    pub fn consent_error_free(&self) -> bool {
        !self.errors.contains(&MISSING_CORE_CONSENT)
    }
}

/// Network resolution engine bound to one storage scope
#[derive(Clone)]
pub struct ResolutionProtocol {
    store: TieredStore,
    transport: Arc<dyn Transport>,
    endpoints: EndpointConfig,
}

impl ResolutionProtocol {
    /// Create a protocol instance over `store` and `transport`
    pub fn new(
        store: TieredStore,
        transport: Arc<dyn Transport>,
        endpoints: EndpointConfig,
    ) -> Self {
        Self {
            store,
            transport,
            endpoints,
        }
    }

    /// Pick the host variant for this user agent
    ///
    /// Non-Chromium mobile browsers block third-party cookies, so they are
    /// routed to the cookie-restricted variant. The check is a best-effort
    /// substring heuristic; anything unrecognized gets the standard host.
    pub fn select_host(&self, user_agent: Option<&str>) -> &str {
        match user_agent {
            Some(ua) if ua.contains(UA_MOBILE_MARKER) && !ua.contains(UA_CHROMIUM_MARKER) => {
                &self.endpoints.cookieless_host
            }
            _ => &self.endpoints.host,
        }
    }

    /// Perform one resolution round-trip and fold the result into the store
    ///
    /// Transport failures and malformed bodies are logged and absorbed; the
    /// cached state is left untouched in both cases.
    pub async fn resolve(
        &self,
        client_id: Option<&str>,
        stored_profile_id: Option<&str>,
        consent: &ConsentParams,
        user_agent: Option<&str>,
    ) -> Option<String> {
        let _timer = metrics::RESOLUTION_DURATION_SECONDS.start_timer();

        let url = format!("https://{}/id", self.select_host(user_agent));
        let query = build_query(stored_profile_id, client_id, consent);

        let body = match self.transport.get(&url, &query).await {
            Ok(body) => body,
            Err(e) => {
                error!("Resolution request failed: {}", e);
                metrics::record_resolution("transport_error");
                return None;
            }
        };

        let response = match parse_response(&body) {
            Ok(response) => response,
            Err(e) => {
                warn!("Discarding malformed resolution response: {}", e);
                metrics::record_resolution("malformed");
                return None;
            }
        };

        let resolved = self.apply_response(client_id, &response).await;
        metrics::record_resolution(if resolved.is_some() { "resolved" } else { "empty" });
        resolved
    }

    /// Fire the linkage-data side call and fold its response into the store
    ///
    /// The response body has the same shape as the primary resolution
    /// response and goes through the same state transition. Its outcome only
    /// ever refreshes the cache for later calls.
    pub async fn send_linkage(
        &self,
        client_id: Option<&str>,
        hashed_identifier: &str,
        user_agent: Option<&str>,
    ) {
        let url = format!("https://{}/link", self.select_host(user_agent));
        let body = match client_id {
            Some(c) => serde_json::json!({ "c": c, "did": hashed_identifier }),
            None => serde_json::json!({ "did": hashed_identifier }),
        };

        let response_body = match self.transport.post_json(&url, &body).await {
            Ok(response_body) => response_body,
            Err(e) => {
                warn!("Linkage call failed: {}", e);
                metrics::record_linkage("transport_error");
                return;
            }
        };

        match parse_response(&response_body) {
            Ok(response) => {
                self.apply_response(client_id, &response).await;
                metrics::record_linkage("applied");
            }
            Err(e) => {
                warn!("Discarding malformed linkage response: {}", e);
                metrics::record_linkage("malformed");
            }
        }
    }

    /// Apply the identity state transition for a parsed response
    ///
    /// Returns the id to hand to the caller, when the response granted one.
    pub async fn apply_response(
        &self,
        client_id: Option<&str>,
        response: &ResolveResponse,
    ) -> Option<String> {
        let expiry = response.expiry_ts;

        if let Some(client_id) = client_id {
            let suppression_key = keys::suppression(client_id);
            if response.consent_error_free() {
                self.store.delete(&suppression_key).await;
            } else if response.no_consent == Some(NoConsentScope::Client) {
                // Partner-level refusal: remember the window and leave the
                // shared identity records alone
                debug!("Partner-scoped no-consent verdict, opening suppression window");
                self.store
                    .write(&suppression_key, &expiry.to_string(), expiry)
                    .await;
                return None;
            }
        }

        // Bounds the next network attempt even when no id was granted
        self.store
            .write(keys::EXPIRY, &expiry.to_string(), expiry)
            .await;

        match response.profile_id.as_deref().filter(|p| !p.is_empty()) {
            Some(profile_id) => {
                if response.consent_error_free() {
                    self.store
                        .write(keys::PROFILE_ID, profile_id, now_ms() + PROFILE_TTL_MS)
                        .await;
                }

                match response.core_id.as_deref().filter(|c| !c.is_empty()) {
                    Some(core_id) => {
                        self.store.write(keys::CORE_ID, core_id, expiry).await;
                        Some(core_id.to_string())
                    }
                    None => {
                        self.store.delete(keys::CORE_ID).await;
                        None
                    }
                }
            }
            None => {
                if response.consent_error_free() {
                    self.store.delete(keys::PROFILE_ID).await;
                }
                self.store.delete(keys::CORE_ID).await;
                None
            }
        }
    }
}

/// Parse a resolution response body
fn parse_response(body: &str) -> IdResult<ResolveResponse> {
    Ok(serde_json::from_str(body)?)
}

/// Assemble the query in fixed order, omitting absent or empty parameters
fn build_query(
    stored_profile_id: Option<&str>,
    client_id: Option<&str>,
    consent: &ConsentParams,
) -> Vec<(String, String)> {
    let mut query = Vec::new();

    push_param(&mut query, "fp", stored_profile_id);
    push_param(&mut query, "c", client_id);
    push_param(&mut query, "regional_opt_out", consent.regional_opt_out.as_deref());
    if let Some(gdpr_applies) = consent.gdpr_applies {
        query.push(("gdpr_applies".to_string(), gdpr_applies.to_string()));
    }
    push_param(&mut query, "gdpr_consent", consent.gdpr_consent.as_deref());

    query
}

fn push_param(query: &mut Vec<(String, String)>, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        if !value.is_empty() {
            query.push((name.to_string(), value.to_string()));
        }
    }
}
