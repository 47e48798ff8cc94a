/// Consent parameter resolution
///
/// Derives the outbound consent parameters for one resolution call from the
/// caller-supplied context, falling back to first-party values previously
/// cached on the page by the consent frameworks themselves.
use crate::storage::TieredStore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// First-party fallback key for the regional opt-out string
const REGIONAL_OPT_OUT_KEY: &str = "us_privacy";

/// First-party consent-string fallbacks, tried in priority order
const CONSENT_STRING_KEYS: [&str; 2] = ["euconsent-v2", "eupubconsent-v2"];

/// Consent signals supplied by the host for one resolution call
///
/// Produced fresh per call and never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsentContext {
    /// Whether the EU framework applies; forwarded only when explicit
    pub gdpr_applies: Option<bool>,

    /// Framework consent string
    pub consent_string: Option<String>,

    /// Aggregated regional opt-out string from a centralized handler
    pub regional_opt_out: Option<String>,
}

/// Outbound consent parameters, ready for the query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsentParams {
    pub regional_opt_out: Option<String>,
    pub gdpr_applies: Option<bool>,
    pub gdpr_consent: Option<String>,
}

/// Build the consent parameters for an outbound request
///
/// Supplied values win; absent or empty ones fall back to the cached
/// first-party records. Pure over the context plus cache reads, never
/// writes.
pub async fn resolve_params(store: &TieredStore, ctx: &ConsentContext) -> ConsentParams {
    let regional_opt_out = match non_empty(ctx.regional_opt_out.as_deref()) {
        Some(value) => Some(value.to_string()),
        None => store.read_external(REGIONAL_OPT_OUT_KEY).await,
    };

    let mut gdpr_consent = non_empty(ctx.consent_string.as_deref()).map(str::to_string);
    if gdpr_consent.is_none() {
        for key in CONSENT_STRING_KEYS {
            if let Some(value) = store.read_external(key).await {
                gdpr_consent = Some(value);
                break;
            }
        }
    }

    ConsentParams {
        regional_opt_out,
        gdpr_applies: ctx.gdpr_applies,
        gdpr_consent,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Normalize a raw email address and hash it for the linkage call
///
/// Trims surrounding whitespace and lowercases before hashing, so the same
/// mailbox always maps to the same digest. Returns the SHA-256 hex digest.
pub fn hash_identifier(raw: &str) -> String {
    let normalized = raw.trim().to_lowercase();
    let hash = Sha256::digest(normalized.as_bytes());
    hex::encode(hash)
}
