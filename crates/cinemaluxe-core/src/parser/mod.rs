//! HTML parsers for the CinemaLuxe site
//!
//! Pure, synchronous functions over raw HTML. Nothing here touches the
//! network; the scraper feeds these from fetched pages.

pub mod catalog;
pub mod detail;
pub mod stream;

pub use catalog::{parse_listing, parse_search_results};
pub use detail::{parse_detail_page, parse_episode_page};
pub use stream::extract_candidates;
