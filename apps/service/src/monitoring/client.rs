use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::request::RequestDescriptor;

/// A completed HTTP exchange. `ok` mirrors fetch-style success: 2xx or 3xx.
#[derive(Debug, Clone, Copy)]
pub struct ProbeResponse {
    pub status_code: u16,
    pub ok: bool,
}

/// Network capability used by the executor, abstracted so sweeps can run
/// against a scripted client in tests.
#[async_trait]
pub trait ProbeClient: Send + Sync {
    /// Issue the request. `Ok` for any completed HTTP response regardless of
    /// status code; `Err` only for transport-level failures (DNS, connect,
    /// timeout, malformed request).
    async fn issue(&self, request: &RequestDescriptor) -> Result<ProbeResponse>;
}

/// reqwest-backed client with a per-request timeout so one unreachable
/// target cannot stall a sweep indefinitely.
pub struct HttpProbeClient {
    client: reqwest::Client,
}

impl HttpProbeClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ProbeClient for HttpProbeClient {
    async fn issue(&self, request: &RequestDescriptor) -> Result<ProbeResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| anyhow!("invalid HTTP method '{}'", request.method))?;

        let mut builder = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| anyhow!("request failed: {e}"))?;

        let status = response.status();
        Ok(ProbeResponse {
            status_code: status.as_u16(),
            ok: status.is_success() || status.is_redirection(),
        })
    }
}
