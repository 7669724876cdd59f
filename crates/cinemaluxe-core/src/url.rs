//! URL helpers for the CinemaLuxe site
//!
//! Path builders for catalog and search pages, and the predicates that
//! recognize directly playable media URLs.

use regex::Regex;

/// Builds the site-relative path for a category listing page
///
/// The site appends the page number directly to the category path.
///
/// # Example
/// ```
/// use cinemaluxe_core::url::category_path;
/// assert_eq!(category_path("movies/page/", 2), "movies/page/2");
/// ```
pub fn category_path(path: &str, page: u32) -> String {
    format!("{}{}", path.trim_start_matches('/'), page)
}

/// Builds the site-relative path for a search-results page
///
/// # Example
/// ```
/// use cinemaluxe_core::url::search_path;
/// assert_eq!(search_path("doctor who", 1), "page/1/?s=doctor%20who");
/// ```
pub fn search_path(query: &str, page: u32) -> String {
    format!("page/{}/?s={}", page, urlencoding::encode(query))
}

/// Whether a URL points straight at a playable media file
///
/// Matches `.m3u8` or `.mp4` at the end of the path, optionally followed
/// by a query string.
pub fn is_direct_media_url(url: &str) -> bool {
    let Ok(re) = Regex::new(r"(?i)\.(m3u8|mp4)(\?|$)") else {
        return false;
    };
    re.is_match(url)
}

/// Whether a URL references an HLS-style segmented playlist
pub fn is_segmented_url(url: &str) -> bool {
    url.to_ascii_lowercase().contains(".m3u8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_path() {
        assert_eq!(category_path("movies/page/", 1), "movies/page/1");
        assert_eq!(category_path("series/page/", 3), "series/page/3");
    }

    #[test]
    fn test_category_path_strips_leading_slash() {
        assert_eq!(category_path("/movies/page/", 1), "movies/page/1");
    }

    #[test]
    fn test_search_path_simple() {
        assert_eq!(search_path("dark", 1), "page/1/?s=dark");
    }

    #[test]
    fn test_search_path_encodes_query() {
        assert_eq!(
            search_path("doctor who s07e05", 2),
            "page/2/?s=doctor%20who%20s07e05"
        );
    }

    #[test]
    fn test_is_direct_media_url() {
        assert!(is_direct_media_url("https://x/video.mp4"));
        assert!(is_direct_media_url("https://x/video.mp4?token=1"));
        assert!(is_direct_media_url("https://x/video.m3u8"));
        assert!(is_direct_media_url("https://x/VIDEO.M3U8?e=2"));
        assert!(!is_direct_media_url("https://x/video.mp4.html"));
        assert!(!is_direct_media_url("https://x/watch/video"));
    }

    #[test]
    fn test_is_segmented_url() {
        assert!(is_segmented_url("https://cdn.example/master.m3u8"));
        assert!(is_segmented_url("https://cdn.example/master.M3U8?t=1"));
        assert!(!is_segmented_url("https://cdn.example/file.mp4"));
    }
}
