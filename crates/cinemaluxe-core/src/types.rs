//! Core data types for the CinemaLuxe scraper
//!
//! Contains the entity structs handed to the addon-serving layer. Every
//! type serializes with serde so the addon can consume it verbatim.

use serde::{Deserialize, Serialize};

use crate::url::is_segmented_url;

/// Whether a title is a standalone movie or an episodic series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleKind {
    Movie,
    Series,
}

/// A lightweight listing record from a category or search-results page
///
/// `id` is the absolute URL of the title's detail page. Entries with an
/// empty id or title are never emitted by the parsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Absolute detail-page URL, doubles as the title's identifier
    pub id: String,

    /// Title text from the listing card
    pub title: String,

    /// Poster image URL, if the card carries one
    pub poster: Option<String>,

    /// Movie or series, classified from the detail URL shape
    pub kind: TitleKind,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub results: Vec<CatalogEntry>,

    /// Whether another results page is worth requesting
    pub has_next: bool,
}

/// Opaque pointer to a playable URL or a page needing stream resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReference {
    pub url: String,
}

/// One episode of a series, with every raw source link discovered for it
///
/// Season/episode numbers default to 0 when the button text is unparseable.
/// Links that normalize to the same (season, episode) pair merge into a
/// single entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeEntry {
    pub season: u32,
    pub episode: u32,
    pub sources: Vec<SourceReference>,
}

/// Movie sources or series episodes, depending on the title kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TitleContent {
    Movie { sources: Vec<SourceReference> },
    Series { episodes: Vec<EpisodeEntry> },
}

/// Full record for a single title's detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleDetail {
    /// The URL the detail was loaded from
    pub id: String,

    pub title: String,

    pub poster: Option<String>,

    pub description: String,

    #[serde(flatten)]
    pub content: TitleContent,
}

impl TitleDetail {
    pub fn kind(&self) -> TitleKind {
        match self.content {
            TitleContent::Movie { .. } => TitleKind::Movie,
            TitleContent::Series { .. } => TitleKind::Series,
        }
    }
}

/// A candidate playable stream
///
/// Deduplicated by exact absolute URL; `is_segmented` marks HLS-style
/// playlist references as opposed to progressive files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCandidate {
    pub url: String,
    pub quality: String,
    pub is_segmented: bool,
}

impl StreamCandidate {
    /// Candidate with the default "auto" quality label
    pub fn auto(url: String) -> Self {
        let is_segmented = is_segmented_url(&url);
        Self {
            url,
            quality: "auto".to_string(),
            is_segmented,
        }
    }

    /// Candidate with an explicit quality label
    pub fn labeled(url: String, quality: String) -> Self {
        let is_segmented = is_segmented_url(&url);
        Self {
            url,
            quality,
            is_segmented,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entry_round_trip() {
        let entry = CatalogEntry {
            id: "https://cinemalux.zip/movie/inception/".to_string(),
            title: "Inception".to_string(),
            poster: Some("https://cinemalux.zip/p/inception.jpg".to_string()),
            kind: TitleKind::Movie,
        };

        let json = serde_json::to_string(&entry).expect("Serialization should succeed");
        let back: CatalogEntry =
            serde_json::from_str(&json).expect("Deserialization should succeed");

        assert_eq!(entry, back);
        assert!(json.contains("\"kind\":\"movie\""));
    }

    #[test]
    fn test_movie_detail_wire_shape() {
        let detail = TitleDetail {
            id: "https://cinemalux.zip/movie/inception/".to_string(),
            title: "Inception".to_string(),
            poster: None,
            description: "A thief who steals corporate secrets.".to_string(),
            content: TitleContent::Movie {
                sources: vec![SourceReference {
                    url: "https://host.example/watch/abc".to_string(),
                }],
            },
        };

        let json = serde_json::to_string(&detail).expect("Serialization should succeed");
        // content is flattened: kind tag and sources sit at the top level
        assert!(json.contains("\"kind\":\"movie\""));
        assert!(json.contains("\"sources\""));
        assert!(!json.contains("\"content\""));

        let back: TitleDetail =
            serde_json::from_str(&json).expect("Deserialization should succeed");
        assert_eq!(detail, back);
        assert_eq!(back.kind(), TitleKind::Movie);
    }

    #[test]
    fn test_series_detail_wire_shape() {
        let detail = TitleDetail {
            id: "https://cinemalux.zip/series/dark/".to_string(),
            title: "Dark".to_string(),
            poster: None,
            description: String::new(),
            content: TitleContent::Series {
                episodes: vec![EpisodeEntry {
                    season: 1,
                    episode: 1,
                    sources: vec![SourceReference {
                        url: "https://host.example/ep/1".to_string(),
                    }],
                }],
            },
        };

        let json = serde_json::to_string(&detail).expect("Serialization should succeed");
        assert!(json.contains("\"kind\":\"series\""));
        assert!(json.contains("\"episodes\""));
        assert_eq!(detail.kind(), TitleKind::Series);

        let back: TitleDetail =
            serde_json::from_str(&json).expect("Deserialization should succeed");
        assert_eq!(detail, back);
    }

    #[test]
    fn test_stream_candidate_auto_flags_playlists() {
        let playlist = StreamCandidate::auto("https://cdn.example/x.m3u8".to_string());
        assert_eq!(playlist.quality, "auto");
        assert!(playlist.is_segmented);

        let progressive = StreamCandidate::auto("https://cdn.example/x.mp4".to_string());
        assert_eq!(progressive.quality, "auto");
        assert!(!progressive.is_segmented);
    }

    #[test]
    fn test_stream_candidate_labeled() {
        let candidate = StreamCandidate::labeled(
            "https://cdn.example/x.mp4".to_string(),
            "1080p".to_string(),
        );
        assert_eq!(candidate.quality, "1080p");
        assert!(!candidate.is_segmented);
    }
}
