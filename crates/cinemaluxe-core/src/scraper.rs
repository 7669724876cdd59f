//! High-level scraper API for the CinemaLuxe site
//!
//! Combines the HTTP client, the HTML parsers and the link bypass into
//! the four operations the addon-serving layer calls: catalog listing,
//! search, title detail, and stream resolution.

use std::collections::HashMap;

use futures::future;
use tracing::{debug, warn};
use url::Url;

use crate::bypass;
use crate::client::{CinemaluxeClient, ClientConfig};
use crate::config::SiteConfig;
use crate::error::{CinemaluxeError, Result};
use crate::parser::detail::SourceLink;
use crate::parser::{self, detail};
use crate::types::{
    CatalogEntry, EpisodeEntry, SearchPage, SourceReference, StreamCandidate, TitleContent,
    TitleDetail, TitleKind,
};
use crate::url::{category_path, is_direct_media_url, search_path};

const MOVIES_CATEGORY: &str = "movies/page/";
const SERIES_CATEGORY: &str = "series/page/";

/// Main scraper API for the CinemaLuxe site
///
/// Every operation is request-scoped: nothing is cached between calls,
/// and concurrent calls share only the read-only site configuration.
pub struct CinemaluxeScraper {
    client: CinemaluxeClient,
}

impl CinemaluxeScraper {
    /// Scraper with the default site and client configuration
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new() -> Result<Self> {
        Self::with_config(SiteConfig::default(), ClientConfig::default())
    }

    /// Scraper with explicit site and client configuration
    pub fn with_config(site: SiteConfig, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            client: CinemaluxeClient::with_config(site, config)?,
        })
    }

    /// Scraper with the base URL refreshed from the remote feed
    ///
    /// The lookup is best-effort: on any failure the default base URL is
    /// kept and no error surfaces.
    pub async fn discover() -> Result<Self> {
        let http = reqwest::Client::new();
        let site = SiteConfig::discover(&http).await;
        Self::with_config(site, ClientConfig::default())
    }

    pub fn base_url(&self) -> &Url {
        self.client.base_url()
    }

    /// Lists one page of the movie or series catalog
    ///
    /// # Errors
    /// - `Transport`/`BadStatus`/`NotFound` if the listing page cannot be
    ///   fetched
    pub async fn list_catalog(&self, kind: TitleKind, page: u32) -> Result<Vec<CatalogEntry>> {
        let path = match kind {
            TitleKind::Movie => MOVIES_CATEGORY,
            TitleKind::Series => SERIES_CATEGORY,
        };
        self.list_category(path, page).await
    }

    /// Lists one page of an arbitrary category path (e.g. `movies/page/`)
    ///
    /// Entries missing a title or link are dropped silently.
    ///
    /// # Errors
    /// - `Transport`/`BadStatus`/`NotFound` if the listing page cannot be
    ///   fetched
    pub async fn list_category(&self, path: &str, page: u32) -> Result<Vec<CatalogEntry>> {
        let html = self.client.fetch_page(&category_path(path, page)).await?;
        parser::parse_listing(&html, self.client.base_url())
    }

    /// Searches the site, returning one page of results
    ///
    /// # Errors
    /// - `InvalidRequest` if the query is empty or whitespace only
    /// - `Transport`/`BadStatus`/`NotFound` if the results page cannot be
    ///   fetched
    pub async fn search(&self, query: &str, page: u32) -> Result<SearchPage> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(CinemaluxeError::InvalidRequest(
                "search requests need a query".to_string(),
            ));
        }

        let html = self.client.fetch_page(&search_path(trimmed, page)).await?;
        let results = parser::parse_search_results(&html, self.client.base_url())?;
        let has_next = !results.is_empty();

        Ok(SearchPage { results, has_next })
    }

    /// Loads a title's full detail record
    ///
    /// Movie source buttons are bypassed concurrently, with the output
    /// order matching the page's anchor order. Series seasons load
    /// concurrently; a season that fails to fetch or parse is skipped so
    /// the remaining seasons still come back.
    ///
    /// # Errors
    /// - `InvalidRequest` if `id` is empty
    /// - `Transport`/`BadStatus`/`NotFound` if the detail page itself
    ///   cannot be fetched
    pub async fn get_detail(&self, id: &str) -> Result<TitleDetail> {
        let id = id.trim();
        if id.is_empty() {
            return Err(CinemaluxeError::InvalidRequest(
                "detail requests need an id".to_string(),
            ));
        }

        let html = self.client.fetch_page(id).await?;
        let page = parser::parse_detail_page(&html)?;

        // The URL shape alone decides movie vs series
        let content = if id.contains("series") {
            TitleContent::Series {
                episodes: self.load_episodes(&page.source_links).await,
            }
        } else {
            TitleContent::Movie {
                sources: self.resolve_sources(&page.source_links).await,
            }
        };

        Ok(TitleDetail {
            id: id.to_string(),
            title: page.title,
            poster: page.poster,
            description: page.description,
            content,
        })
    }

    /// Resolves a source reference into playable stream candidates
    ///
    /// Never fails past input validation: an unextractable or unreachable
    /// page degrades to a single candidate wrapping the best URL known at
    /// that point, so callers always have something to offer.
    ///
    /// # Errors
    /// - `InvalidRequest` if `reference` is empty; nothing else
    pub async fn get_streams(&self, reference: &str) -> Result<Vec<StreamCandidate>> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(CinemaluxeError::InvalidRequest(
                "stream requests need a source url".to_string(),
            ));
        }

        if is_direct_media_url(reference) {
            return Ok(vec![StreamCandidate::auto(reference.to_string())]);
        }

        let resolved = bypass::resolve(&self.client, reference).await;
        match self.extract_from_page(&resolved).await {
            Ok(candidates) if !candidates.is_empty() => Ok(candidates),
            Ok(_) => Ok(vec![StreamCandidate::auto(resolved)]),
            Err(err) => {
                debug!(reference, "stream extraction fell back: {err}");
                Ok(vec![StreamCandidate::auto(reference.to_string())])
            }
        }
    }

    /// Resolves one protector link, returning it unchanged on failure
    pub async fn bypass_link(&self, url: &str) -> String {
        bypass::resolve(&self.client, url).await
    }

    async fn extract_from_page(&self, page_url: &str) -> Result<Vec<StreamCandidate>> {
        let html = self.client.fetch_page(page_url).await?;
        parser::extract_candidates(&html, self.client.base_url())
    }

    /// Bypasses every movie source button concurrently
    ///
    /// join_all yields results in input order, so the output lines up
    /// with the page's anchors no matter which resolution finishes first.
    async fn resolve_sources(&self, links: &[SourceLink]) -> Vec<SourceReference> {
        let resolutions = links
            .iter()
            .map(|link| bypass::resolve(&self.client, &link.href));

        future::join_all(resolutions)
            .await
            .into_iter()
            .map(|url| SourceReference { url })
            .collect()
    }

    /// Loads every season concurrently and merges episodes by number
    ///
    /// Episode links stay raw here; they are only resolved when streams
    /// are requested for them.
    async fn load_episodes(&self, links: &[SourceLink]) -> Vec<EpisodeEntry> {
        let seasons = links.iter().map(|link| async move {
            let season = detail::parse_season_number(&link.text);
            (season, self.season_episodes(&link.href).await)
        });

        let mut entries: Vec<EpisodeEntry> = Vec::new();
        let mut slots: HashMap<(u32, u32), usize> = HashMap::new();

        for (season, outcome) in future::join_all(seasons).await {
            let episodes = match outcome {
                Ok(episodes) => episodes,
                Err(err) => {
                    warn!(season, "skipping season: {err}");
                    continue;
                }
            };

            for episode in episodes {
                let key = (season, episode.episode);
                match slots.get(&key) {
                    Some(&slot) => entries[slot].sources.push(SourceReference {
                        url: episode.href,
                    }),
                    None => {
                        slots.insert(key, entries.len());
                        entries.push(EpisodeEntry {
                            season,
                            episode: episode.episode,
                            sources: vec![SourceReference { url: episode.href }],
                        });
                    }
                }
            }
        }

        entries
    }

    /// One season: bypass the season link, then parse its episode listing
    async fn season_episodes(&self, href: &str) -> Result<Vec<detail::EpisodeLink>> {
        let listing_url = bypass::resolve(&self.client, href).await;
        let html = self.client.fetch_page(&listing_url).await?;
        parser::parse_episode_page(&html)
    }
}
