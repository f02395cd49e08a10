//! Shared HTTP client for OpenAI-compatible APIs

use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Longest error body echoed back in an error message
const MAX_ERROR_BODY: usize = 500;

pub struct OpenAiClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        // Url::join drops the last path segment unless it ends with a slash
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid API base URL: {}", e)))
    }

    /// POST `body` as JSON to `path` and decode the JSON response.
    ///
    /// Transport failures, rate limits and server errors are retried up to
    /// `retries` times; every failure is reported through `on_error`.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        retries: usize,
        on_error: fn(String) -> Error,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let mut last_err = None;

        for attempt in 0..=retries {
            debug!("POST {} (attempt {})", url, attempt + 1);
            let sent = self
                .client
                .post(url.clone())
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            let retryable = match sent {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<T>()
                        .await
                        .map_err(|e| on_error(format!("Malformed response from {}: {}", url, e)));
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    last_err = Some(on_error(describe_status(status, &url, &body)));
                    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
                }
                Err(e) => {
                    last_err = Some(on_error(format!("Request to {} failed: {}", url, e)));
                    true
                }
            };

            if !retryable || attempt == retries {
                break;
            }
            tokio::time::sleep(Duration::from_millis(200 * (attempt as u64 + 1))).await;
        }

        Err(last_err.unwrap_or_else(|| on_error(format!("Request to {} failed", url))))
    }
}

fn describe_status(status: StatusCode, url: &Url, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("{} returned {}", url, status);
    }
    let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
    format!("{} returned {}: {}", url, status, snippet)
}
