use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::Transport;
use crate::error::TransportError;
use crate::protocol::{ApiRequest, ApiResponse, Credential};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Https,
    Http,
}

impl Scheme {
    fn as_str(&self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

/// Where and how to reach the admin surface
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub host: String,
    pub credential: Credential,
    pub scheme: Scheme,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(host: impl Into<String>, credential: Credential) -> Self {
        Self {
            host: host.into(),
            credential,
            scheme: Scheme::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(&self) -> Result<Url, TransportError> {
        let raw = format!("{}://{}/", self.scheme.as_str(), self.host);
        Url::parse(&raw).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", raw, e)))
    }
}

/// Transport that talks to a real boringproxy host over HTTP(S)
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    host: String,
    credential: Credential,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let base_url = config.base_url()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| TransportError::NetworkFailure(Box::new(e)))?;

        Ok(Self {
            client,
            base_url,
            host: config.host.clone(),
            credential: config.credential.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn host(&self) -> &str {
        &self.host
    }

    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let path = request.endpoint.path();
        let url = self
            .base_url
            .join(path)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", path, e)))?;

        debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .bearer_auth(self.credential.expose());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::NetworkFailure(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            debug!("{} {} -> {}", request.method, path, status);
            return Err(TransportError::from_status(status, path));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::NetworkFailure(Box::new(e)))?;

        Ok(ApiResponse { status, body })
    }
}
