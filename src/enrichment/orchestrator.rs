//! Enrichment orchestrator for Handymarks.
//!
//! Walks the title and favicon source chains in priority order, bounds
//! every source call with a timeout, and degrades gracefully: the public
//! contract is failure-free. For a valid http/https URL the orchestrator
//! always produces a title (hostname at worst) and a favicon reference
//! (the generic backstop at worst).

use std::time::Duration;

use reqwest::Url;
use tokio::time::timeout;
use tracing::debug;

use super::sources::{
    FaviconSource, IconDirectorySource, PageIconSource, ProxyTitleSource, TitleSource,
    DEFAULT_SOURCE_TIMEOUT,
};
use crate::types::enrichment::{Enrichment, Provenance};

/// Provenance label for the hostname title fallback.
pub const HOSTNAME_FALLBACK: &str = "hostname";
/// Provenance label for the favicon backstop.
pub const BACKSTOP: &str = "backstop";

/// Drives the enrichment source chains for one URL at a time.
pub struct Enricher {
    title_sources: Vec<Box<dyn TitleSource>>,
    favicon_sources: Vec<Box<dyn FaviconSource>>,
    per_source_timeout: Duration,
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new()
    }
}

impl Enricher {
    /// Builds the default chains: allorigins/codetabs/corsproxy for titles,
    /// page-icon extraction then the favicongrabber directory for favicons.
    pub fn new() -> Self {
        Self::with_sources(
            vec![
                Box::new(ProxyTitleSource::allorigins()),
                Box::new(ProxyTitleSource::codetabs()),
                Box::new(ProxyTitleSource::corsproxy()),
            ],
            vec![
                Box::new(PageIconSource::allorigins()),
                Box::new(IconDirectorySource::favicongrabber()),
            ],
        )
    }

    /// Builds an orchestrator over explicit chains (tests, custom deployments).
    pub fn with_sources(
        title_sources: Vec<Box<dyn TitleSource>>,
        favicon_sources: Vec<Box<dyn FaviconSource>>,
    ) -> Self {
        Self {
            title_sources,
            favicon_sources,
            per_source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    /// Overrides the per-source timeout (applies to every chain member).
    pub fn with_per_source_timeout(mut self, per_source_timeout: Duration) -> Self {
        self.per_source_timeout = per_source_timeout;
        self
    }

    /// Resolves the best available (title, favicon) pair for a URL.
    ///
    /// Non-http/https or unparseable URLs return [`Enrichment::empty`]
    /// immediately — success with nothing, not an error, and no network
    /// traffic. Title and favicon chains run concurrently.
    pub async fn enrich(&self, url: &str) -> Enrichment {
        let parsed = match parse_web_url(url) {
            Some(u) => u,
            None => {
                debug!(url = %url, "url not eligible for enrichment");
                return Enrichment::empty();
            }
        };

        let (title, favicon) = tokio::join!(
            self.resolve_title(url, &parsed),
            self.resolve_favicon(url, &parsed)
        );

        Enrichment {
            title: Some(title.0),
            favicon: Some(favicon.0),
            provenance: Provenance {
                title_source: Some(title.1),
                favicon_source: Some(favicon.1),
            },
        }
    }

    /// The guaranteed favicon for a URL — a constructed favicon-by-domain
    /// service reference requiring no network and no validation.
    /// `None` only for URLs that are not http/https.
    pub fn backstop_favicon(url: &str) -> Option<String> {
        let parsed = parse_web_url(url)?;
        let host = parsed.host_str()?;
        Some(backstop_for(host))
    }

    async fn resolve_title(&self, url: &str, parsed: &Url) -> (String, String) {
        for source in &self.title_sources {
            match timeout(self.per_source_timeout, source.resolve(url)).await {
                Ok(Some(title)) => {
                    debug!(source = source.name(), title = %title, "title resolved");
                    return (title, source.name().to_string());
                }
                Ok(None) => debug!(source = source.name(), "title source missed"),
                Err(_) => debug!(source = source.name(), "title source timed out"),
            }
        }

        let fallback = parsed.host_str().unwrap_or(url).to_string();
        debug!(title = %fallback, "title chain exhausted, falling back to hostname");
        (fallback, HOSTNAME_FALLBACK.to_string())
    }

    async fn resolve_favicon(&self, url: &str, parsed: &Url) -> (String, String) {
        for source in &self.favicon_sources {
            match timeout(self.per_source_timeout, source.resolve(url)).await {
                Ok(Some(favicon)) => {
                    debug!(source = source.name(), favicon = %favicon, "favicon resolved");
                    return (favicon, source.name().to_string());
                }
                Ok(None) => debug!(source = source.name(), "favicon source missed"),
                Err(_) => debug!(source = source.name(), "favicon source timed out"),
            }
        }

        let fallback = backstop_for(parsed.host_str().unwrap_or(""));
        debug!(favicon = %fallback, "favicon chain exhausted, using backstop");
        (fallback, BACKSTOP.to_string())
    }
}

fn backstop_for(host: &str) -> String {
    format!("https://www.google.com/s2/favicons?domain={}&sz=64", host)
}

/// Parses a URL and accepts only the http/https schemes.
pub fn parse_web_url(url: &str) -> Option<Url> {
    let parsed = Url::parse(url).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(parsed),
        _ => None,
    }
}
