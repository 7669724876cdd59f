//! Title detail-page parser
//!
//! Extracts the page header (title, poster, description) and the
//! source/season button anchors, plus the text patterns that recover
//! season and episode numbers from button labels.

use regex::Regex;
use scraper::{Html, Selector};

use crate::error::{CinemaluxeError, Result};

const TITLE_HEADING: &str = "div.data > h1";
const PAGE_TITLE: &str = "title";
const POSTER_IMAGE: &str = "div.poster > img";
const DESCRIPTION: &str = "div.wp-content > p";
const SOURCE_BUTTONS: &str = "div.wp-content div.ep-button-container > a";
const EPISODE_BUTTONS: &str = "div.ep-button-container > a";
const LAZY_POSTER_ATTR: &str = "data-src";

/// Everything a detail page yields before any link resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPage {
    pub title: String,
    pub poster: Option<String>,
    pub description: String,
    /// Source buttons in document order: movie links, or season links
    pub source_links: Vec<SourceLink>,
}

/// One source/season button: its label text and raw href
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink {
    pub text: String,
    pub href: String,
}

/// One episode button from a season's listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeLink {
    pub episode: u32,
    pub href: String,
}

/// Parses a title's detail page
pub fn parse_detail_page(html: &str) -> Result<DetailPage> {
    let document = Html::parse_document(html);

    let title = select_text(&document, TITLE_HEADING)?
        .filter(|text| !text.is_empty())
        .or(select_text(&document, PAGE_TITLE)?)
        .unwrap_or_default();

    let poster_selector = parse_selector(POSTER_IMAGE)?;
    let poster = document.select(&poster_selector).next().and_then(|img| {
        img.value()
            .attr(LAZY_POSTER_ATTR)
            .or_else(|| img.value().attr("src"))
            .map(str::to_string)
    });

    let description = select_text(&document, DESCRIPTION)?.unwrap_or_default();

    let button_selector = parse_selector(SOURCE_BUTTONS)?;
    let source_links = document
        .select(&button_selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            if href.is_empty() {
                return None;
            }
            Some(SourceLink {
                text: anchor.text().collect::<String>().trim().to_string(),
                href: href.to_string(),
            })
        })
        .collect();

    Ok(DetailPage {
        title,
        poster,
        description,
        source_links,
    })
}

/// Parses a season's episode-listing page into episode links
///
/// Only anchors whose text mentions "episode" count; everything else in
/// the button container (quality switches, download-all links) is noise.
pub fn parse_episode_page(html: &str) -> Result<Vec<EpisodeLink>> {
    let document = Html::parse_document(html);
    let selector = parse_selector(EPISODE_BUTTONS)?;

    Ok(document
        .select(&selector)
        .filter_map(|anchor| {
            let text = anchor.text().collect::<String>();
            if !text.to_lowercase().contains("episode") {
                return None;
            }
            let href = anchor.value().attr("href")?;
            if href.is_empty() {
                return None;
            }
            Some(EpisodeLink {
                episode: parse_episode_number(&text),
                href: href.to_string(),
            })
        })
        .collect())
}

/// Season number from button text like "Season 2" or "S2", 0 if absent
pub fn parse_season_number(text: &str) -> u32 {
    capture_number(text, r"(?i)(?:Season |S)(\d+)")
}

/// Episode number from text like "Episode 07" or "episode-12", 0 if absent
pub fn parse_episode_number(text: &str) -> u32 {
    capture_number(text, r"(?i)episode\s*-?\s*(\d{1,3})")
}

fn capture_number(text: &str, pattern: &str) -> u32 {
    let Ok(re) = Regex::new(pattern) else {
        return 0;
    };
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| CinemaluxeError::Parse(format!("invalid selector {selector}: {e:?}")))
}

fn select_text(document: &Html, selector: &str) -> Result<Option<String>> {
    let selector = parse_selector(selector)?;
    Ok(document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string()))
}
