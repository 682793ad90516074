//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with browser-like headers and a timeout
//! - Classifying failures as transient (retried) or terminal
//! - Linear retry backoff through an explicit `RetryPolicy`
//!
//! The network itself sits behind the `Transport` trait so retry behavior
//! can be exercised without a server.

use crate::config::FetchConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client};
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Raw outcome of one GET that reached the server
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Final URL after redirects
    pub final_url: Url,
    /// Decoded body text
    pub body: String,
}

/// A GET that never produced a response
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("could not read response body: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Timeouts and dropped connections are worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connect(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else if e.is_request() {
            // Connection resets mid-request surface here
            Self::Connect(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// HTTP client capability: GET a URL, return status and body
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError>;
}

/// `Transport` backed by a reqwest client
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            final_url,
            body,
        })
    }
}

/// Builds an HTTP client with proper configuration
///
/// Every request carries the configured browser user agent, an
/// `Accept-Language` header and the request timeout.
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::FetchConfig;
/// use catalog_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    );
    if let Ok(language) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// How many times and how long to wait before retrying transient failures
///
/// Backoff is linear: retry *k* (1-based) waits `k × base_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.retry_count, config.retry_backoff_base())
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }
}

/// Why a fetch ultimately failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// 4xx or any other non-retryable status
    #[error("HTTP {0}")]
    Status(u16),

    /// A 2xx response without usable content
    #[error("empty or unparseable body")]
    EmptyBody,

    /// Transient failures persisted through every attempt
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// Non-retryable transport failure
    #[error("{0}")]
    Transport(String),
}

/// A URL could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchFailure,
}

/// Successfully fetched page body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the page was requested as
    pub url: Url,
    /// URL after redirects; base for relative links
    pub final_url: Url,
    pub body: String,
}

impl FetchedPage {
    /// Parses the body into a queryable node tree
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

enum Attempt {
    Done(FetchedPage),
    Transient(String),
    Terminal(FetchFailure),
}

/// Fetches pages through a `Transport`, retrying transient failures
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Builds a reqwest-backed fetcher from configuration
    pub fn from_config(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        Ok(Self::new(
            Arc::new(HttpTransport::new(client)),
            RetryPolicy::from_config(config),
        ))
    }

    /// Fetches a URL with retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx with non-blank body | Success |
    /// | 2xx with blank body | Immediate failure (EmptyBody) |
    /// | HTTP 5xx | Retry with backoff |
    /// | Timeout / connection failure | Retry with backoff |
    /// | HTTP 4xx or other status | Immediate failure |
    /// | Other transport error | Immediate failure |
    ///
    /// Failures never escape as panics; the caller decides whether a
    /// `FetchError` skips one product or ends pagination.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let attempts = self.policy.max_attempts();
        let mut last = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.policy.backoff(attempt - 1);
                tracing::debug!(
                    "Retrying {} in {:?} (attempt {}/{})",
                    url,
                    delay,
                    attempt,
                    attempts
                );
                tokio::time::sleep(delay).await;
            }

            match self.attempt(url).await {
                Attempt::Done(page) => return Ok(page),
                Attempt::Terminal(cause) => {
                    return Err(FetchError {
                        url: url.to_string(),
                        cause,
                    })
                }
                Attempt::Transient(reason) => {
                    tracing::debug!("Transient failure for {}: {}", url, reason);
                    last = reason;
                }
            }
        }

        Err(FetchError {
            url: url.to_string(),
            cause: FetchFailure::RetriesExhausted { attempts, last },
        })
    }

    async fn attempt(&self, url: &Url) -> Attempt {
        let response = match self.transport.get(url).await {
            Ok(response) => response,
            Err(e) if e.is_transient() => return Attempt::Transient(e.to_string()),
            Err(e) => return Attempt::Terminal(FetchFailure::Transport(e.to_string())),
        };

        match response.status {
            200..=299 if response.body.trim().is_empty() => {
                Attempt::Terminal(FetchFailure::EmptyBody)
            }
            200..=299 => Attempt::Done(FetchedPage {
                url: url.clone(),
                final_url: response.final_url,
                body: response.body,
            }),
            500..=599 => Attempt::Transient(format!("HTTP {}", response.status)),
            status => Attempt::Terminal(FetchFailure::Status(status)),
        }
    }
}
