//! Shared HTTP client with browser-like headers and a retry policy for transient failures.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, RETRY_AFTER, UPGRADE_INSECURE_REQUESTS,
};
use reqwest::{Client, Method, Response, StatusCode, redirect};

use crate::config::ClientConfig;
use crate::data_models::FetchFailure;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const MAX_REDIRECTS: usize = 10;
/// Upper bound on a server-requested `Retry-After` wait.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(120);

/// One per search. Cheap to share behind an `Arc`; the connection pool inside
/// `reqwest::Client` does its own synchronization.
#[derive(Debug)]
pub struct FetchClient {
    client: Client,
    config: ClientConfig,
}

impl FetchClient {
    pub fn new(config: &ClientConfig) -> Result<FetchClient> {
        let client = Client::builder()
            .default_headers(browser_headers())
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(FetchClient {
            client,
            config: config.clone(),
        })
    }

    pub async fn get(&self, url: &str, timeout: Duration) -> Result<Response, FetchFailure> {
        self.send(Method::GET, url, timeout).await
    }

    /// Issue a request, retrying retryable statuses and transport errors with
    /// exponential backoff. A retryable status that survives every retry is
    /// returned as the final response for the caller to judge.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        timeout: Duration,
    ) -> Result<Response, FetchFailure> {
        let may_retry = self.config.retryable_methods.contains(&method);
        let mut retry = 0u32;

        loop {
            let result = self
                .client
                .request(method.clone(), url)
                .timeout(timeout)
                .send()
                .await;

            let exhausted = !may_retry || retry >= self.config.total_retries;
            let mut server_wait = None;
            match result {
                Ok(response) => {
                    if exhausted || !self.is_retryable_status(response.status()) {
                        return Ok(response);
                    }
                    server_wait = retry_after(response.headers());
                    tracing::debug!(url, status = %response.status(), retry = retry + 1, "retryable status");
                }
                Err(e) => {
                    let failure = classify(&e);
                    if exhausted || !is_transient(&failure) {
                        return Err(failure);
                    }
                    tracing::debug!(url, error = %failure, retry = retry + 1, "transient request error");
                }
            }

            retry += 1;
            let delay = match server_wait {
                Some(wait) => wait.min(MAX_RETRY_AFTER).max(self.backoff(retry)),
                None => self.backoff(retry),
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.config.retryable_status_codes.contains(&status.as_u16())
    }

    /// Wait before the given retry (1-based): `backoff_factor * 2^(retry - 1)`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        self.config.backoff_factor.saturating_mul(1u32 << exp)
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers
}

/// `Retry-After` as delta-seconds or an HTTP date. Dates in the past mean no wait.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let wait = at.with_timezone(&chrono::Utc) - chrono::Utc::now();
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

pub fn classify(error: &reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else if error.is_connect() {
        FetchFailure::Connect(error.to_string())
    } else if let Some(status) = error.status() {
        FetchFailure::HttpStatus(status.as_u16())
    } else if error.is_body() || error.is_decode() {
        FetchFailure::Body(error.to_string())
    } else {
        FetchFailure::Request(error.to_string())
    }
}

fn is_transient(failure: &FetchFailure) -> bool {
    matches!(failure, FetchFailure::Connect(_) | FetchFailure::Timeout)
}
