use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;

use crate::error::NodeError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts one JSON body to a node and returns the parsed JSON reply.
///
/// Implementations report every transport problem (connection, timeout,
/// non-2xx status, unparsable body) as [`NodeError::Network`].
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn post(&self, body: Value) -> Result<Value, NodeError>;

    /// Endpoint description used in logs.
    fn endpoint(&self) -> &str;
}

/// [`RpcTransport`] over HTTPS with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, NodeError> {
        Self::with_timeouts(url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_timeouts(
        url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, NodeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client,
            url: url.into(),
            headers,
        })
    }

    /// Adds a header sent with every request (e.g. an API key).
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, NodeError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| NodeError::network_with_source(format!("invalid header name {name:?}"), e))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| NodeError::network_with_source("invalid header value", e))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn post(&self, body: Value) -> Result<Value, NodeError> {
        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(NodeError::network(format!(
                "request to {} failed with status {status}: {text}",
                self.url
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| NodeError::network_with_source(format!("malformed body from {}", self.url), e))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
