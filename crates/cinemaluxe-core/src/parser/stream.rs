//! Stream-candidate extraction from player pages
//!
//! Candidates come from four places, in order: `<video><source>` elements,
//! embedded iframes, a base64 payload on the player element, and anchors
//! that look like hoster links. Duplicates collapse to the first
//! occurrence.

use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{CinemaluxeError, Result};
use crate::types::StreamCandidate;

const VIDEO_SOURCES: &str = "video source[src]";
const IFRAMES: &str = "iframe[src]";
const PLAYER: &str = ".player";
const ANCHORS: &str = "a[href]";
const PLAYER_PAYLOAD_ATTR: &str = "data-src";

/// Extracts every stream candidate from a player page
///
/// Relative URLs are absolutized against `base`; the result is
/// deduplicated by exact URL string, first-seen order preserved.
pub fn extract_candidates(html: &str, base: &Url) -> Result<Vec<StreamCandidate>> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();

    // <video><source> elements carry an optional quality label
    let selector = parse_selector(VIDEO_SOURCES)?;
    for element in document.select(&selector) {
        if let Some(src) = element.value().attr("src")
            && let Ok(url) = base.join(src)
        {
            let quality = element
                .value()
                .attr("label")
                .or_else(|| element.value().attr("data-res"))
                .filter(|label| !label.is_empty());
            let candidate = match quality {
                Some(label) => StreamCandidate::labeled(url.into(), label.to_string()),
                None => StreamCandidate::auto(url.into()),
            };
            candidates.push(candidate);
        }
    }

    // embedded iframes, some hosts redirect from these
    let selector = parse_selector(IFRAMES)?;
    for element in document.select(&selector) {
        if let Some(src) = element.value().attr("src")
            && let Ok(url) = base.join(src)
        {
            candidates.push(StreamCandidate::auto(url.into()));
        }
    }

    // the player element sometimes hides its sources in a base64 payload
    let selector = parse_selector(PLAYER)?;
    if let Some(player) = document.select(&selector).next()
        && let Some(encoded) = player.value().attr(PLAYER_PAYLOAD_ATTR)
    {
        for url in decode_player_payload(encoded) {
            candidates.push(StreamCandidate::auto(url));
        }
    }

    // last resort: anchors that look like hoster links
    let selector = parse_selector(ANCHORS)?;
    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href")
            && looks_like_hoster(href)
            && let Ok(url) = base.join(href)
        {
            candidates.push(StreamCandidate::auto(url.into()));
        }
    }

    Ok(dedupe(candidates))
}

/// Media URLs embedded in a base64-encoded player payload
fn decode_player_payload(encoded: &str) -> Vec<String> {
    let Ok(bytes) = STANDARD.decode(encoded) else {
        return Vec::new();
    };
    let Ok(decoded) = String::from_utf8(bytes) else {
        return Vec::new();
    };
    let Ok(re) = Regex::new(r#"https?://[^'"\s]+(?:m3u8|mp4)"#) else {
        return Vec::new();
    };

    re.find_iter(&decoded)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn looks_like_hoster(href: &str) -> bool {
    let Ok(keywords) = Regex::new(r"(?i)player|watch|embed|link") else {
        return false;
    };
    let Ok(id_shape) = Regex::new(r"\.php\?id=") else {
        return false;
    };
    keywords.is_match(href) || id_shape.is_match(href)
}

/// First-seen-order dedup by exact URL string
fn dedupe(candidates: Vec<StreamCandidate>) -> Vec<StreamCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| !candidate.url.is_empty() && seen.insert(candidate.url.clone()))
        .collect()
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| CinemaluxeError::Parse(format!("invalid selector {selector}: {e:?}")))
}
