//! HTTP transport for delegate rules.

use std::time::Duration;

use async_trait::async_trait;

use super::{DelegateClient, DelegatePayload, DelegateResponse};
use crate::error::DelegateError;

/// Posts validation requests to delegate endpoints with [`reqwest`].
pub struct HttpDelegateClient {
    client: reqwest::Client,
}

impl HttpDelegateClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DelegateClient for HttpDelegateClient {
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        payload: &DelegatePayload<'_>,
    ) -> Result<DelegateResponse, DelegateError> {
        let transport = |e: reqwest::Error| DelegateError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let mut request = self.client.post(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        // Some servers choke on the default accept string.
        let request = request
            .header(reqwest::header::ACCEPT, "*/*")
            .json(payload);

        #[cfg(feature = "tracing")]
        tracing::info!(url, "Sending validation request to delegate");

        let response = request.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;

        #[cfg(feature = "tracing")]
        tracing::info!(url, status, "Delegate validation response");

        Ok(DelegateResponse { status, body })
    }
}
