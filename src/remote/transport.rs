use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

use super::models::ErrorBody;
use crate::error::ControlError;

/// Request/response channel to the device-control service
///
/// Paths are absolute (`/api/mount/park`); bodies and replies are JSON.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value, ControlError>;

    async fn post(&self, path: &str, body: Value) -> Result<Value, ControlError>;

    /// Name of this transport for logging
    fn name(&self) -> &str;
}

/// HTTP transport backed by reqwest
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ControlError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ControlError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_reply(response: Response) -> Result<Value, ControlError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error);
            tracing::debug!("Device-control API returned {} - {}", status, body);
            return Err(ControlError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value, ControlError> {
        let url = self.url(path);
        tracing::trace!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Self::read_reply(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ControlError> {
        let url = self.url(path);
        tracing::trace!("POST {} {}", url, body);

        let response = self.client.post(&url).json(&body).send().await?;
        Self::read_reply(response).await
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}
