//! Enrichment sources for Handymarks.
//!
//! Each source is one external data provider attempted in priority order
//! to resolve a title or a favicon. A source answers `None` for any kind
//! of failure — timeout, non-2xx, malformed payload, no match — which
//! hands control to the next source in the chain.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

/// Default per-request timeout for a single source call.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(4);

/// A provider that can resolve a page title for a URL.
#[async_trait]
pub trait TitleSource: Send + Sync {
    fn name(&self) -> &str;
    /// Returns a decoded, trimmed, non-empty title, or `None` on any failure.
    async fn resolve(&self, url: &str) -> Option<String>;
}

/// A provider that can resolve a favicon URL for a page.
#[async_trait]
pub trait FaviconSource: Send + Sync {
    fn name(&self) -> &str;
    /// Returns a validated, absolute favicon URL, or `None` on any failure.
    async fn resolve(&self, url: &str) -> Option<String>;
}

/// How a proxy endpoint wraps the fetched page content.
#[derive(Debug, Clone)]
pub enum ResponseKind {
    /// The response body is the page HTML itself.
    RawHtml,
    /// The response is a JSON object carrying the HTML under the named field.
    JsonWrapped { field: String },
}

/// Title extractor that fetches page content through a cross-origin proxy
/// and scrapes the `<title>` tag.
pub struct ProxyTitleSource {
    name: String,
    /// Endpoint template; `{url}` is replaced by the percent-encoded target.
    endpoint: String,
    kind: ResponseKind,
    client: Client,
    timeout: Duration,
}

impl ProxyTitleSource {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, kind: ResponseKind) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            kind,
            client: Client::new(),
            timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// allorigins proxy — JSON envelope with the HTML in `contents`.
    pub fn allorigins() -> Self {
        Self::new(
            "allorigins",
            "https://api.allorigins.win/get?url={url}",
            ResponseKind::JsonWrapped {
                field: "contents".to_string(),
            },
        )
    }

    /// codetabs proxy — returns the page HTML directly.
    pub fn codetabs() -> Self {
        Self::new(
            "codetabs",
            "https://api.codetabs.com/v1/proxy?quest={url}",
            ResponseKind::RawHtml,
        )
    }

    /// corsproxy.io — returns the page HTML directly.
    pub fn corsproxy() -> Self {
        Self::new("corsproxy", "https://corsproxy.io/?{url}", ResponseKind::RawHtml)
    }

    async fn fetch_html(&self, url: &str) -> Option<String> {
        let target = self.endpoint.replace("{url}", &urlencoding::encode(url));
        fetch_page(&self.client, &target, &self.kind, self.timeout, &self.name).await
    }
}

#[async_trait]
impl TitleSource for ProxyTitleSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, url: &str) -> Option<String> {
        let html = self.fetch_html(url).await?;
        extract_title(&html)
    }
}

/// Favicon resolver that fetches the page HTML (through a proxy), scans
/// `<link rel=icon>` / `apple-touch-icon` / `og:image` tags, and probes
/// each candidate until one answers with an image.
pub struct PageIconSource {
    name: String,
    endpoint: String,
    kind: ResponseKind,
    client: Client,
    timeout: Duration,
}

impl PageIconSource {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, kind: ResponseKind) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            kind,
            client: Client::new(),
            timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Page-icon extraction with the allorigins proxy for the HTML fetch.
    pub fn allorigins() -> Self {
        Self::new(
            "page-icons",
            "https://api.allorigins.win/get?url={url}",
            ResponseKind::JsonWrapped {
                field: "contents".to_string(),
            },
        )
    }
}

#[async_trait]
impl FaviconSource for PageIconSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, url: &str) -> Option<String> {
        let target = self.endpoint.replace("{url}", &urlencoding::encode(url));
        let html = fetch_page(&self.client, &target, &self.kind, self.timeout, &self.name).await?;

        for candidate in scan_page_icons(&html, url) {
            if probe_image(&self.client, &candidate, self.timeout).await {
                return Some(candidate);
            }
            debug!(source = %self.name, candidate = %candidate, "icon candidate failed probe");
        }
        None
    }
}

/// Favicon resolver backed by a structured icon-directory service that
/// returns a JSON list of icons with declared sizes. The largest icon
/// with a usable `src` wins; no probe is required because the service
/// already vetted the entries.
pub struct IconDirectorySource {
    name: String,
    /// Endpoint template; `{domain}` is replaced by the target hostname.
    endpoint: String,
    client: Client,
    timeout: Duration,
}

impl IconDirectorySource {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            client: Client::new(),
            timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// favicongrabber.com directory keyed by domain.
    pub fn favicongrabber() -> Self {
        Self::new(
            "favicongrabber",
            "https://favicongrabber.com/api/grab/{domain}",
        )
    }
}

#[async_trait]
impl FaviconSource for IconDirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, url: &str) -> Option<String> {
        let domain = Url::parse(url).ok()?.host_str()?.to_string();
        let target = self.endpoint.replace("{domain}", &domain);

        let response = match self.client.get(&target).timeout(self.timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(source = %self.name, error = %e, "request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(source = %self.name, status = %response.status(), "non-success status");
            return None;
        }
        let body: Value = response.json().await.ok()?;
        let icons = body.get("icons")?.as_array()?;

        // Largest declared icon with a usable src wins
        let best = icons
            .iter()
            .filter_map(|icon| {
                let src = icon.get("src")?.as_str()?.trim();
                if src.is_empty() {
                    return None;
                }
                Some((declared_icon_area(icon), src))
            })
            .max_by_key(|(area, _)| *area)?;

        absolutize(best.1, url)
    }
}

/// Parses a `"WxH"` sizes declaration into a comparable area (0 when absent).
fn declared_icon_area(icon: &Value) -> u64 {
    let sizes = icon.get("sizes").and_then(Value::as_str).unwrap_or("");
    let mut parts = sizes.split(['x', 'X']);
    let w: u64 = parts.next().and_then(|s| s.trim().parse().ok()).unwrap_or(0);
    let h: u64 = parts.next().and_then(|s| s.trim().parse().ok()).unwrap_or(0);
    w * h
}

/// Fetches a proxied page and unwraps it according to the response kind.
async fn fetch_page(
    client: &Client,
    target: &str,
    kind: &ResponseKind,
    timeout: Duration,
    source: &str,
) -> Option<String> {
    let response = match client.get(target).timeout(timeout).send().await {
        Ok(r) => r,
        Err(e) => {
            debug!(source = %source, error = %e, "request failed");
            return None;
        }
    };
    if !response.status().is_success() {
        debug!(source = %source, status = %response.status(), "non-success status");
        return None;
    }
    let body = response.text().await.ok()?;
    match kind {
        ResponseKind::RawHtml => Some(body),
        ResponseKind::JsonWrapped { field } => {
            let value: Value = serde_json::from_str(&body).ok()?;
            Some(value.get(field)?.as_str()?.to_string())
        }
    }
}

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("hardcoded regex"));
static LINK_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("hardcoded regex"));
static META_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("hardcoded regex"));
static REL_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)rel\s*=\s*["']([^"']*)["']"#).expect("hardcoded regex"));
static HREF_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)href\s*=\s*["']([^"']*)["']"#).expect("hardcoded regex"));
static PROPERTY_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)property\s*=\s*["']([^"']*)["']"#).expect("hardcoded regex"));
static CONTENT_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)content\s*=\s*["']([^"']*)["']"#).expect("hardcoded regex"));

/// Extracts and decodes the `<title>` text from an HTML document.
/// Whitespace-only titles count as a miss.
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_RE.captures(html)?.get(1)?.as_str();
    let title = decode_entities(raw).trim().to_string();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Decodes the HTML entities that commonly appear in scraped titles.
pub fn decode_entities(text: &str) -> String {
    // `&amp;` must decode last so `&amp;lt;` does not double-decode
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&#x2F;", "/")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Scans page HTML for icon candidates, in priority order:
/// plain `rel=icon` variants, then `apple-touch-icon`, then `og:image`.
/// Relative hrefs are normalized against the page URL.
pub fn scan_page_icons(html: &str, page_url: &str) -> Vec<String> {
    let mut candidates: Vec<(u8, String)> = Vec::new();

    for tag in LINK_TAG_RE.find_iter(html) {
        let tag = tag.as_str();
        let rel = match REL_ATTR_RE.captures(tag).and_then(|c| c.get(1)) {
            Some(m) => m.as_str().to_lowercase(),
            None => continue,
        };
        if !rel.contains("icon") {
            continue;
        }
        let href = match HREF_ATTR_RE.captures(tag).and_then(|c| c.get(1)) {
            Some(m) => m.as_str(),
            None => continue,
        };
        let priority = if rel.contains("apple-touch") { 1 } else { 0 };
        if let Some(absolute) = absolutize(href, page_url) {
            candidates.push((priority, absolute));
        }
    }

    for tag in META_TAG_RE.find_iter(html) {
        let tag = tag.as_str();
        let is_og_image = PROPERTY_ATTR_RE
            .captures(tag)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().eq_ignore_ascii_case("og:image"))
            .unwrap_or(false);
        if !is_og_image {
            continue;
        }
        if let Some(content) = CONTENT_ATTR_RE.captures(tag).and_then(|c| c.get(1)) {
            if let Some(absolute) = absolutize(content.as_str(), page_url) {
                candidates.push((2, absolute));
            }
        }
    }

    candidates.sort_by_key(|(priority, _)| *priority);
    let mut seen = Vec::new();
    let mut result = Vec::new();
    for (_, url) in candidates {
        if !seen.contains(&url) {
            seen.push(url.clone());
            result.push(url);
        }
    }
    result
}

/// Resolves a possibly-relative href against the page URL.
pub fn absolutize(href: &str, page_url: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    base.join(href.trim()).ok().map(|u| u.to_string())
}

/// Lightweight existence probe: the candidate must answer 2xx with an
/// image-typed body to be accepted.
async fn probe_image(client: &Client, candidate: &str, timeout: Duration) -> bool {
    match client.get(candidate).timeout(timeout).send().await {
        Ok(response) if response.status().is_success() => {
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            content_type.starts_with("image/") || content_type == "application/octet-stream"
        }
        _ => false,
    }
}
