/// HTTP transport boundary
///
/// The resolution protocol reaches the network through this trait so hosts
/// and tests can substitute their own transport.
use crate::error::{IdError, IdResult};
use async_trait::async_trait;
use std::time::Duration;

/// Minimal request surface used by the resolution protocol
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET with the given query pairs and return the response body
    async fn get(&self, url: &str, query: &[(String, String)]) -> IdResult<String>;

    /// Issue a JSON POST and return the response body
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> IdResult<String>;
}

/// Default reqwest-backed transport
///
/// The client keeps a cookie store so the resolution service can read and
/// refresh its own cookies across calls.
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Build the transport with the SDK user agent and request timeout
    pub fn new(user_agent: &str, timeout: Duration) -> IdResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| IdError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> IdResult<String> {
        let response = self.http_client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            return Err(IdError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> IdResult<String> {
        let response = self.http_client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            return Err(IdError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_construction() {
        let transport = HttpTransport::new("corelink-id/0.1", Duration::from_secs(10));
        assert!(transport.is_ok());
    }
}
