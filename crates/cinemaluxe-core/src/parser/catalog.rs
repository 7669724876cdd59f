//! Catalog and search-results parsers
//!
//! Turns listing pages into `CatalogEntry` sequences. Selector strings are
//! kept as data so site-markup changes stay localized here.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{CinemaluxeError, Result};
use crate::types::{CatalogEntry, TitleKind};

const LISTING_ITEM: &str = "article.item";
const SEARCH_ITEM: &str = "div.result-item";
const ENTRY_LINK: &str = "a[href]";
const ENTRY_IMAGE: &str = "img";
const ENTRY_TITLE: &str = ".title";
const LAZY_POSTER_ATTR: &str = "data-src";

/// Parses a category listing page into catalog entries
///
/// Entries missing a title or link are dropped, not emitted.
pub fn parse_listing(html: &str, base: &Url) -> Result<Vec<CatalogEntry>> {
    collect_entries(html, LISTING_ITEM, base)
}

/// Parses a search-results page into catalog entries
pub fn parse_search_results(html: &str, base: &Url) -> Result<Vec<CatalogEntry>> {
    collect_entries(html, SEARCH_ITEM, base)
}

fn collect_entries(html: &str, item_selector: &str, base: &Url) -> Result<Vec<CatalogEntry>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(item_selector)
        .map_err(|e| CinemaluxeError::Parse(format!("invalid selector {item_selector}: {e:?}")))?;

    let mut entries = Vec::new();
    for element in document.select(&selector) {
        if let Some(entry) = entry_from_element(&element, base) {
            entries.push(entry);
        }
    }

    Ok(entries)
}

/// Maps one listing card to an entry, or `None` when required parts are absent
fn entry_from_element(element: &ElementRef, base: &Url) -> Option<CatalogEntry> {
    let link_selector = Selector::parse(ENTRY_LINK).ok()?;
    let image_selector = Selector::parse(ENTRY_IMAGE).ok()?;
    let title_selector = Selector::parse(ENTRY_TITLE).ok()?;

    let href = element.select(&link_selector).next()?.value().attr("href")?;
    if href.is_empty() {
        return None;
    }

    let image = element.select(&image_selector).next();

    // Title comes from the poster's alt text, falling back to a title element
    let title = image
        .and_then(|img| img.value().attr("alt"))
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .map(str::to_string)
        .or_else(|| {
            element
                .select(&title_selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })?;
    if title.is_empty() {
        return None;
    }

    // Lazy-loaded posters keep the real image in a data attribute
    let poster = image
        .and_then(|img| {
            img.value()
                .attr(LAZY_POSTER_ATTR)
                .or_else(|| img.value().attr("src"))
        })
        .map(str::to_string);

    let id = base.join(href).ok()?.to_string();

    Some(CatalogEntry {
        id,
        title,
        poster,
        kind: classify_kind(href),
    })
}

/// Series detail URLs carry a `series` path segment, movies do not
pub fn classify_kind(href: &str) -> TitleKind {
    if href.contains("series") {
        TitleKind::Series
    } else {
        TitleKind::Movie
    }
}
