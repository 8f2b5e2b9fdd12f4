use std::time::Instant;

use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderValue},
    Method,
};
use tracing::info;

use crate::{ApiConfiguration, ApiError};

/// Performs requests against the vault API.
///
/// The cache only depends on this trait, so tests can substitute a scripted implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response body of a successful (2xx) response.
    async fn do_request(
        &self,
        method: Method,
        uri: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Vec<u8>, ApiError>;
}

/// [`Transport`] implemented with a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client sending the headers and timeout from `config`.
    pub fn new(config: &ApiConfiguration) -> Result<Self, ApiError> {
        let client = new_http_client_builder()
            .default_headers(build_default_headers(config)?)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client })
    }
}

fn new_http_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder().use_rustls_tls()
}

/// Build default headers for the vault client
fn build_default_headers(config: &ApiConfiguration) -> Result<header::HeaderMap, ApiError> {
    let mut headers = header::HeaderMap::new();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_str(&config.user_agent)?,
    );
    headers.insert(
        "Thy-Client",
        HeaderValue::from_str(&format!(
            "cli-{}-{}/{}",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        ))?,
    );

    if let Some(token) = &config.auth_token {
        let mut value = HeaderValue::from_str(token)?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }

    Ok(headers)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn do_request(
        &self,
        method: Method,
        uri: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Vec<u8>, ApiError> {
        let started = Instant::now();
        info!("-> {method} {uri}");

        let mut request = self.client.request(method.clone(), uri);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let content = response.bytes().await?;

        info!(
            "<- {method} {uri} | {status} (took: {:?})",
            started.elapsed()
        );

        if status.is_success() {
            return Ok(content.to_vec());
        }

        if content.is_empty() {
            return Err(ApiError::EmptyResponse { status });
        }

        Err(ApiError::ResponseContent {
            status,
            message: error_message(&content),
        })
    }
}

/// Prefer the `message` field of a JSON error body, otherwise use the body as text.
fn error_message(content: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(content)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| String::from_utf8_lossy(content).trim().to_string())
}
