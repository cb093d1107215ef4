//! Unit tests for the enrichment orchestrator.
//!
//! Exercises chain ordering, fallbacks, timeouts and URL eligibility with
//! scripted in-process sources; nothing here touches the network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use handymarks::enrichment::orchestrator::{
    parse_web_url, Enricher, BACKSTOP, HOSTNAME_FALLBACK,
};
use handymarks::enrichment::{FaviconSource, TitleSource};
use handymarks::types::enrichment::Enrichment;
use rstest::rstest;

/// A scripted source that records how often it was asked.
struct ScriptedSource {
    name: &'static str,
    answer: Option<String>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn new(name: &'static str, answer: Option<&str>) -> (Box<Self>, Arc<AtomicUsize>) {
        Self::with_delay(name, answer, Duration::ZERO)
    }

    fn with_delay(
        name: &'static str,
        answer: Option<&str>,
        delay: Duration,
    ) -> (Box<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Box::new(Self {
            name,
            answer: answer.map(str::to_string),
            delay,
            calls: Arc::clone(&calls),
        });
        (source, calls)
    }

    async fn answer(&self) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answer.clone()
    }
}

#[async_trait]
impl TitleSource for ScriptedSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn resolve(&self, _url: &str) -> Option<String> {
        self.answer().await
    }
}

#[async_trait]
impl FaviconSource for ScriptedSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn resolve(&self, _url: &str) -> Option<String> {
        self.answer().await
    }
}

#[tokio::test]
async fn first_hit_wins_and_later_sources_stay_idle() {
    let (first, first_calls) = ScriptedSource::new("first", Some("Example Domain"));
    let (second, second_calls) = ScriptedSource::new("second", Some("Should Not Appear"));
    let (icons, _) = ScriptedSource::new("icons", Some("https://example.com/icon.png"));

    let enricher = Enricher::with_sources(vec![first, second], vec![icons]);
    let enrichment = enricher.enrich("https://example.com/page").await;

    assert_eq!(enrichment.title.as_deref(), Some("Example Domain"));
    assert_eq!(enrichment.provenance.title_source.as_deref(), Some("first"));
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn misses_fall_through_to_the_next_source() {
    let (first, _) = ScriptedSource::new("first", None);
    let (second, second_calls) = ScriptedSource::new("second", Some("From Second"));
    let (icons, _) = ScriptedSource::new("icons", None);
    let (directory, directory_calls) =
        ScriptedSource::new("directory", Some("https://cdn.example.com/icon.png"));

    let enricher = Enricher::with_sources(vec![first, second], vec![icons, directory]);
    let enrichment = enricher.enrich("https://example.com").await;

    assert_eq!(enrichment.title.as_deref(), Some("From Second"));
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        enrichment.favicon.as_deref(),
        Some("https://cdn.example.com/icon.png")
    );
    assert_eq!(
        enrichment.provenance.favicon_source.as_deref(),
        Some("directory")
    );
    assert_eq!(directory_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exhausted_chains_fall_back_to_hostname_and_backstop() {
    let (titles, _) = ScriptedSource::new("titles", None);
    let (icons, _) = ScriptedSource::new("icons", None);

    let enricher = Enricher::with_sources(vec![titles], vec![icons]);
    let enrichment = enricher.enrich("https://example.com/deep/path").await;

    assert_eq!(enrichment.title.as_deref(), Some("example.com"));
    assert_eq!(
        enrichment.provenance.title_source.as_deref(),
        Some(HOSTNAME_FALLBACK)
    );
    let favicon = enrichment.favicon.expect("backstop favicon expected");
    assert!(favicon.contains("domain=example.com"));
    assert_eq!(
        enrichment.provenance.favicon_source.as_deref(),
        Some(BACKSTOP)
    );
}

#[tokio::test]
async fn empty_chains_still_produce_a_complete_result() {
    let enricher = Enricher::with_sources(vec![], vec![]);
    let enrichment = enricher.enrich("https://example.com").await;

    assert_eq!(enrichment.title.as_deref(), Some("example.com"));
    assert!(enrichment.favicon.is_some());
}

#[tokio::test]
async fn ineligible_urls_return_empty_without_calling_any_source() {
    let (titles, title_calls) = ScriptedSource::new("titles", Some("Never"));
    let (icons, icon_calls) = ScriptedSource::new("icons", Some("never.png"));
    let enricher = Enricher::with_sources(vec![titles], vec![icons]);

    for url in ["ftp://example.com/file", "not a url", "javascript:alert(1)"] {
        let enrichment = enricher.enrich(url).await;
        assert_eq!(enrichment, Enrichment::empty(), "url: {url}");
    }
    assert_eq!(title_calls.load(Ordering::SeqCst), 0);
    assert_eq!(icon_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_sources_are_bounded_by_the_per_source_timeout() {
    let (slow, slow_calls) =
        ScriptedSource::with_delay("slow", Some("Too Late"), Duration::from_secs(60));
    let (fast, _) = ScriptedSource::new("fast", Some("In Time"));
    let (icons, _) = ScriptedSource::new("icons", Some("https://example.com/icon.png"));

    let enricher = Enricher::with_sources(vec![slow, fast], vec![icons])
        .with_per_source_timeout(Duration::from_millis(200));
    let enrichment = enricher.enrich("https://example.com").await;

    assert_eq!(slow_calls.load(Ordering::SeqCst), 1);
    assert_eq!(enrichment.title.as_deref(), Some("In Time"));
    assert_eq!(enrichment.provenance.title_source.as_deref(), Some("fast"));
}

#[test]
fn backstop_favicon_is_constructed_from_the_host() {
    let favicon = Enricher::backstop_favicon("https://docs.rs/tokio/latest")
        .expect("web url has a backstop");
    assert_eq!(
        favicon,
        "https://www.google.com/s2/favicons?domain=docs.rs&sz=64"
    );

    assert!(Enricher::backstop_favicon("ftp://example.com").is_none());
    assert!(Enricher::backstop_favicon("not a url").is_none());
}

#[rstest]
#[case("https://example.com", true)]
#[case("http://example.com", true)]
#[case("https://example.com/path?q=1#frag", true)]
#[case("ftp://example.com", false)]
#[case("file:///etc/passwd", false)]
#[case("javascript:alert(1)", false)]
#[case("example.com", false)]
#[case("", false)]
fn parse_web_url_accepts_only_http_schemes(#[case] url: &str, #[case] accepted: bool) {
    assert_eq!(parse_web_url(url).is_some(), accepted, "url: {url}");
}
