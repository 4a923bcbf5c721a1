//! Listing-page acquisition: a headless-browser fetcher and the divar.ir
//! page parser, tied together by [`PageExtractor`].

pub mod browser;
pub mod listing_page;

use std::time::Duration;

use tracing::warn;

pub use browser::BrowserFetcher;
pub use listing_page::{classify, parse_listing_page};

use crate::models::RawAdRecord;

/// Fetches and parses listing pages one URL at a time.
///
/// A URL that cannot be fetched yields `None` instead of an error; the
/// caller decides whether a partial batch is acceptable.
pub struct PageExtractor {
    fetcher: BrowserFetcher,
}

impl PageExtractor {
    pub fn new(headless: bool, timeout: Duration, user_agent: &str) -> Self {
        Self {
            fetcher: BrowserFetcher::new(headless, timeout, user_agent),
        }
    }

    /// Fetch one listing page and extract its raw record.
    pub async fn extract(&mut self, url: &str) -> Option<RawAdRecord> {
        match self.fetcher.fetch_rendered(url).await {
            Ok(html) => Some(parse_listing_page(&html, url)),
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                None
            }
        }
    }

    /// Shut the underlying browser down.
    pub async fn close(&mut self) {
        self.fetcher.close().await;
    }
}
