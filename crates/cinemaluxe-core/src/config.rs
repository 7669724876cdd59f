//! Site configuration for the CinemaLuxe scraper
//!
//! The site rotates domains, so the current base URL is looked up from a
//! remote JSON feed at startup. The lookup is best-effort: any failure
//! keeps the hardcoded default and is never surfaced to the caller.

use serde_json::Value;
use tracing::debug;
use url::Url;

/// Fallback base URL used when the remote lookup fails
pub const DEFAULT_BASE_URL: &str = "https://cinemalux.zip";

const BASE_URL_FEED: &str =
    "https://raw.githubusercontent.com/SaurabhKaperwan/Utils/refs/heads/main/urls.json";
const BASE_URL_KEY: &str = "cinemaluxe";

const PORT_ENV: &str = "PORT";
const DEFAULT_LISTEN_PORT: u16 = 7000;

/// Process-wide site settings, written once at construction
///
/// `base_url` is read-only for the lifetime of the scraper that owns it.
/// `listen_port` is carried for the addon-serving process; nothing in this
/// crate binds a socket.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: Url,
    pub listen_port: u16,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is well-formed"),
            listen_port: parse_port(std::env::var(PORT_ENV).ok()),
        }
    }
}

impl SiteConfig {
    /// Default settings with the base URL refreshed from the remote feed
    ///
    /// Lookup failures of any kind (network, bad JSON, missing key,
    /// unparseable URL) keep the default base URL.
    pub async fn discover(http: &reqwest::Client) -> Self {
        Self::discover_from(http, BASE_URL_FEED).await
    }

    pub(crate) async fn discover_from(http: &reqwest::Client, feed_url: &str) -> Self {
        let mut config = Self::default();
        match remote_base_url(http, feed_url).await {
            Some(url) => {
                debug!(%url, "using base URL from remote feed");
                config.base_url = url;
            }
            None => {
                debug!("base URL lookup failed, keeping {DEFAULT_BASE_URL}");
            }
        }
        config
    }
}

async fn remote_base_url(http: &reqwest::Client, feed_url: &str) -> Option<Url> {
    let body = http
        .get(feed_url)
        .send()
        .await
        .ok()?
        .error_for_status()
        .ok()?
        .text()
        .await
        .ok()?;
    let feed: Value = serde_json::from_str(&body).ok()?;
    feed.get(BASE_URL_KEY)
        .and_then(Value::as_str)
        .filter(|candidate| !candidate.is_empty())
        .and_then(|candidate| Url::parse(candidate).ok())
}

fn parse_port(value: Option<String>) -> u16 {
    value
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_LISTEN_PORT)
}
