/// Configuration management for the CoreLink ID SDK
use crate::error::{IdError, IdResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default resolution host
pub const DEFAULT_HOST: &str = "id.corelink.io";

/// Default host variant for browsers that block third-party cookies
pub const DEFAULT_COOKIELESS_HOST: &str = "direct.corelink.io";

/// Main SDK configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    pub endpoints: EndpointConfig,
    pub storage: StorageConfig,
    pub http: HttpConfig,
}

/// Resolution service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Standard resolution host
    pub host: String,
    /// Variant served without reliance on third-party cookies
    pub cookieless_host: String,
}

/// Storage tier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Redis URL for the expiring tier; None leaves the tier out
    pub redis_url: Option<String>,
    /// SQLite file backing the plain key/value tier
    pub sqlite_path: PathBuf,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            cookieless_host: DEFAULT_COOKIELESS_HOST.to_string(),
        }
    }
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            storage: StorageConfig {
                redis_url: None,
                sqlite_path: PathBuf::from("./data/corelink.sqlite"),
            },
            http: HttpConfig {
                user_agent: default_user_agent(),
                timeout_secs: 10,
            },
        }
    }
}

fn default_user_agent() -> String {
    format!("corelink-id/{}", env!("CARGO_PKG_VERSION"))
}

impl SdkConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> IdResult<Self> {
        dotenv::dotenv().ok();

        let host = env::var("CORELINK_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let cookieless_host = env::var("CORELINK_COOKIELESS_HOST")
            .unwrap_or_else(|_| DEFAULT_COOKIELESS_HOST.to_string());

        let data_directory: PathBuf = env::var("CORELINK_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let sqlite_path = env::var("CORELINK_SQLITE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("corelink.sqlite"));
        let redis_url = env::var("CORELINK_REDIS_URL")
            .ok()
            .filter(|url| !url.is_empty());

        let user_agent =
            env::var("CORELINK_USER_AGENT").unwrap_or_else(|_| default_user_agent());
        let timeout_secs = env::var("CORELINK_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| IdError::Validation("Invalid timeout value".to_string()))?;

        Ok(SdkConfig {
            endpoints: EndpointConfig {
                host,
                cookieless_host,
            },
            storage: StorageConfig {
                redis_url,
                sqlite_path,
            },
            http: HttpConfig {
                user_agent,
                timeout_secs,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> IdResult<()> {
        if self.endpoints.host.is_empty() || self.endpoints.cookieless_host.is_empty() {
            return Err(IdError::Validation(
                "Resolution hosts cannot be empty".to_string(),
            ));
        }

        if self.http.user_agent.is_empty() {
            return Err(IdError::Validation(
                "User agent cannot be empty".to_string(),
            ));
        }

        if self.http.timeout_secs == 0 {
            return Err(IdError::Validation(
                "Request timeout must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}
