//! CinemaLuxe Scraper Core Library
//!
//! Provides an async API for browsing the CinemaLuxe streaming catalog and
//! resolving its obfuscated "protector" links into playable stream URLs.
//!
//! # Overview
//!
//! This crate provides a complete scraping solution for the site with:
//! - A paced HTTP client that retries transient failures and never
//!   auto-follows redirects into media files
//! - HTML parsers for catalog, detail and player pages
//! - A link bypass engine that defeats both of the site's obfuscation
//!   schemes (embedded base64 links and hidden-form redirects)
//! - A high-level API shaped for an addon-serving frontend: catalog,
//!   search, title detail, and stream resolution
//!
//! # Example
//!
//! ```no_run
//! use cinemaluxe_core::{CinemaluxeScraper, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // `discover()` refreshes the site's current base URL; `new()`
//!     // sticks with the built-in default.
//!     let scraper = CinemaluxeScraper::discover().await?;
//!
//!     let page = scraper.search("inception", 1).await?;
//!     for entry in &page.results {
//!         println!("{}: {}", entry.title, entry.id);
//!     }
//!
//!     if let Some(entry) = page.results.first() {
//!         let detail = scraper.get_detail(&entry.id).await?;
//!         println!("{} ({:?})", detail.title, detail.kind());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Fallback contract
//!
//! Link bypass and stream resolution never fail outward: on any internal
//! error they return the input URL (or a single candidate wrapping it).
//! Downstream rendering depends on always getting a best-effort link, so
//! do not convert these paths to error propagation.

mod bypass;
mod client;
mod config;
mod error;
pub mod parser;
mod scraper;
mod types;
pub mod url;

// Re-export client types
pub use client::{CinemaluxeClient, ClientConfig, RequestPacer};

// Re-export configuration
pub use config::{SiteConfig, DEFAULT_BASE_URL};

// Re-export error types
pub use error::{CinemaluxeError, Result};

// Re-export parser entry points
pub use parser::{extract_candidates, parse_listing, parse_search_results};

// Re-export main scraper API
pub use scraper::CinemaluxeScraper;

// Re-export data types
pub use types::{
    CatalogEntry, EpisodeEntry, SearchPage, SourceReference, StreamCandidate, TitleContent,
    TitleDetail, TitleKind,
};
