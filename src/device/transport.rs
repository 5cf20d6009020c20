use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, CONTENT_TYPE},
};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::{DeviceSettings, rpc::RpcRequest};
use crate::error::QoscError;

/// Failure to get a reply from the device at all
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection error: {0}")]
    Connect(String),

    /// Non-success HTTP status; the body is kept because NX-API reports
    /// command errors with a 500 and a regular JSON-RPC payload
    #[error("HTTP error: {code}")]
    Status { code: u16, body: String },

    #[error("Request failed: {0}")]
    Request(String),
}

/// Carries a JSON-RPC batch to the device and returns the raw reply body
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, batch: &[RpcRequest]) -> Result<String, TransportError>;
}

/// NX-API over HTTPS with basic authentication
pub struct HttpTransport {
    client: Client,
    url: String,
    username: String,
    password: String,
    timeout_secs: u64,
}

impl HttpTransport {
    pub fn new(settings: &DeviceSettings) -> Result<Self, QoscError> {
        if !settings.verify_tls {
            log::warn!(
                "TLS certificate verification is disabled for {}",
                settings.host
            );
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()?;

        Ok(Self {
            client,
            url: settings.url(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            timeout_secs: settings.timeout.as_secs(),
        })
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout_secs)
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, batch: &[RpcRequest]) -> Result<String, TransportError> {
        log::debug!("POST {} ({} sub-requests)", self.url, batch.len());

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "application/json-rpc")
            .header(ACCEPT, "application/json")
            .json(batch)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        let body = response.text().await.map_err(|err| self.classify(err))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
