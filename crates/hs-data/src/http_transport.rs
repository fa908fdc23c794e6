//! reqwest-backed transport.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::ACCEPT;

use crate::{FetchError, Response, Transport};

/// Transport over reqwest.
///
/// In the browser, requests carry the page's credentials (cookies). On
/// native targets a cookie store plays the same role, and relative paths
/// are resolved against the configured origin.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    origin: Option<String>,
}

impl HttpTransport {
    /// Create a new transport.
    pub fn new() -> Result<Self, FetchError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.cookie_store(true);

        let client = builder
            .build()
            .map_err(|e| FetchError::RequestError(e.to_string()))?;

        Ok(Self {
            client,
            origin: None,
        })
    }

    /// Resolve relative paths against `origin` (e.g. `https://hsreplay.net`).
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    fn absolute(&self, url: &str) -> String {
        match &self.origin {
            Some(origin) if url.starts_with('/') => {
                format!("{}{}", origin.trim_end_matches('/'), url)
            }
            _ => url.to_string(),
        }
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let url = self.absolute(url);
        tracing::debug!(url = %url, "GET");

        let request = self.client.get(&url).header(ACCEPT, "application/json");
        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::RequestError(e.to_string()))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::RequestError(e.to_string()))?
            .to_vec();

        tracing::debug!(url = %url, status, bytes = body.len(), "response");
        Ok(Response::new(status, headers, body))
    }
}
