//! The remote API seam: how reconstructed requests reach the server.

use crate::mutation::HttpMethod;
use async_trait::async_trait;
use std::time::Duration;

/// A request reconstructed from a queued mutation (or submitted directly).
#[derive(Debug, Clone)]
pub struct ReplayRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// What the server answered. Any HTTP status counts as a response; only
/// transport failures surface as [`NetworkFailure`].
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure: DNS, refused connection, timeout.
#[derive(Debug, Clone, thiserror::Error)]
#[error("network failure: {0}")]
pub struct NetworkFailure(pub String);

/// Seam between the engine/recorder and the remote expense API.
///
/// Tests swap in a scripted implementation; the agent uses [`HttpRemote`].
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn send(&self, request: &ReplayRequest) -> Result<RemoteResponse, NetworkFailure>;
}

/// reqwest-backed implementation used by the agent.
pub struct HttpRemote {
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn send(&self, request: &ReplayRequest) -> Result<RemoteResponse, NetworkFailure> {
        let method = match request.method {
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NetworkFailure(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| NetworkFailure(e.to_string()))?;
        Ok(RemoteResponse { status, body })
    }
}
