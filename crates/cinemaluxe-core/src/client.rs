//! HTTP client with request pacing and retry logic for the CinemaLuxe site
//!
//! All outbound traffic goes through this client: paced to avoid
//! overwhelming the site, retried with exponential backoff on transient
//! errors, and with redirects followed manually so protector POSTs and
//! media-file redirects are never auto-followed.

use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tokio::time::sleep;
use url::Url;

use crate::config::SiteConfig;
use crate::error::{CinemaluxeError, Result};
use crate::url::is_direct_media_url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MAX_REDIRECTS: usize = 5;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum requests per second (default: 2.0)
    pub requests_per_second: f64,
    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Maximum retry attempts for transient errors (default: 3)
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 2.0,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

/// Spaces outbound requests so the site never sees a burst
pub struct RequestPacer {
    min_gap: Duration,
    last_request: Mutex<Instant>,
}

impl RequestPacer {
    pub fn new(requests_per_second: f64) -> Self {
        let min_gap = Duration::from_secs_f64(1.0 / requests_per_second);
        Self {
            min_gap,
            last_request: Mutex::new(Instant::now() - min_gap),
        }
    }

    /// Waits until the minimum gap since the previous request has passed
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();

        if elapsed < self.min_gap {
            sleep(self.min_gap - elapsed).await;
        }

        *last = Instant::now();
    }

    pub fn min_gap(&self) -> Duration {
        self.min_gap
    }
}

/// HTTP client bound to the configured site base URL
///
/// Every fetch resolves its URL against the base, so callers can pass
/// site-relative paths or absolute URLs interchangeably.
pub struct CinemaluxeClient {
    http: reqwest::Client,
    base_url: Url,
    pacer: RequestPacer,
    max_retries: u32,
}

impl CinemaluxeClient {
    /// Client for the given site with default HTTP configuration
    pub fn new(site: SiteConfig) -> Result<Self> {
        Self::with_config(site, ClientConfig::default())
    }

    pub fn with_config(site: SiteConfig, config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .default_headers(headers)
            .build()
            .map_err(CinemaluxeError::Transport)?;

        Ok(Self {
            http,
            base_url: site.base_url,
            pacer: RequestPacer::new(config.requests_per_second),
            max_retries: config.max_retries,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a possibly-relative href against the site base URL
    pub fn absolute(&self, href: &str) -> Result<Url> {
        self.base_url
            .join(href)
            .map_err(|_| CinemaluxeError::InvalidUrl(href.to_string()))
    }

    /// Fetches a page as text, retrying transient failures
    ///
    /// # Errors
    /// - `NotFound` for HTTP 404
    /// - `RateLimited` for HTTP 429 after all retries
    /// - `BadStatus` for other non-success statuses
    /// - `Transport` for network-level failures, including timeouts
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        let absolute = self.absolute(url)?;
        self.fetch_with_retry(absolute.as_str()).await
    }

    /// Form-encoded POST with redirect-following disabled
    ///
    /// Returns the `Location` response header when present and non-empty.
    /// Protector pages answer these POSTs with a redirect whose target is
    /// the resolved link; the body is irrelevant.
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, String)],
    ) -> Result<Option<String>> {
        let absolute = self.absolute(url)?;

        self.pacer.acquire().await;

        let response = self
            .http
            .post(absolute)
            .form(fields)
            .send()
            .await
            .map_err(CinemaluxeError::Transport)?;

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .filter(|value| !value.is_empty());

        Ok(location)
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let mut attempt = 0;

        loop {
            self.pacer.acquire().await;

            match self.do_fetch(url).await {
                Ok(body) => return Ok(body),
                Err(err) if Self::is_retryable(&err) && attempt < self.max_retries => {
                    // Exponential backoff: 1s, 2s, 4s
                    sleep(Duration::from_secs(1 << attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Single fetch attempt with manual redirect following
    ///
    /// A redirect whose target is a direct media file is not followed;
    /// following it would start downloading video bytes. The current
    /// response body is returned instead and extraction takes over.
    async fn do_fetch(&self, url: &str) -> Result<String> {
        let mut current = url.to_string();

        for _ in 0..MAX_REDIRECTS {
            let response = self
                .http
                .get(&current)
                .send()
                .await
                .map_err(CinemaluxeError::Transport)?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(CinemaluxeError::RateLimited);
            }

            if status == StatusCode::NOT_FOUND {
                return Err(CinemaluxeError::NotFound(current));
            }

            if status.is_client_error() || status.is_server_error() {
                return Err(CinemaluxeError::BadStatus {
                    status: status.as_u16(),
                    url: current,
                });
            }

            if status.is_redirection() {
                if let Some(location) = response.headers().get(header::LOCATION)
                    && let Ok(target) = location.to_str()
                {
                    if is_direct_media_url(target) {
                        return response.text().await.map_err(CinemaluxeError::Transport);
                    }
                    current = resolve_redirect(&current, target)?;
                    continue;
                }
                // No usable Location header, the body is the final document
                return response.text().await.map_err(CinemaluxeError::Transport);
            }

            return response.text().await.map_err(CinemaluxeError::Transport);
        }

        Err(CinemaluxeError::Parse(format!(
            "too many redirects fetching {url}"
        )))
    }

    fn is_retryable(error: &CinemaluxeError) -> bool {
        match error {
            CinemaluxeError::RateLimited => true,
            CinemaluxeError::BadStatus { status, .. } => *status >= 500,
            CinemaluxeError::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Redirect targets may be relative to the page that issued them
fn resolve_redirect(current: &str, target: &str) -> Result<String> {
    if let Ok(absolute) = Url::parse(target) {
        return Ok(absolute.into());
    }
    Url::parse(current)
        .and_then(|base| base.join(target))
        .map(String::from)
        .map_err(|_| CinemaluxeError::InvalidUrl(target.to_string()))
}
