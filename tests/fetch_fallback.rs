use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use team_shots::error::ExtractError;
use team_shots::fetch::{
    DocumentFetcher, PageSource, RenderBackend, RenderSession, RenderedSource,
};
use team_shots::locate::PayloadOrigin;

const STATE_PAGE: &str =
    "<script>window.__INITIAL_STATE__ = {\"shots\":[{\"x\":90,\"y\":50}]};\n</script>";

/// Always fails the way a stalled request does.
struct StalledSource;

impl PageSource for StalledSource {
    fn label(&self) -> &'static str {
        "http"
    }

    fn fetch_page(&self, _url: &str) -> Result<String> {
        Err(anyhow!("operation timed out"))
    }
}

struct StaticSource(&'static str);

impl PageSource for StaticSource {
    fn label(&self) -> &'static str {
        "http"
    }

    fn fetch_page(&self, _url: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    rendered: AtomicUsize,
    released: AtomicUsize,
}

struct FakeBackend {
    counters: Arc<Counters>,
    page: Option<&'static str>,
}

struct FakeSession {
    counters: Arc<Counters>,
    page: Option<&'static str>,
}

impl RenderBackend for FakeBackend {
    type Session = FakeSession;

    fn open(&self) -> Result<FakeSession> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            counters: Arc::clone(&self.counters),
            page: self.page,
        })
    }
}

impl RenderSession for FakeSession {
    fn render(&mut self, _url: &str, _settle: Duration) -> Result<String> {
        self.counters.rendered.fetch_add(1, Ordering::SeqCst);
        match self.page {
            Some(page) => Ok(page.to_string()),
            None => bail!("page load crashed"),
        }
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

fn with_fallback(
    primary: impl PageSource + 'static,
    page: Option<&'static str>,
) -> (DocumentFetcher, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let backend = FakeBackend {
        counters: Arc::clone(&counters),
        page,
    };
    let fallback = RenderedSource::new(backend, Duration::ZERO);
    (
        DocumentFetcher::new(Box::new(primary), Some(Box::new(fallback))),
        counters,
    )
}

fn counts(c: &Counters) -> (usize, usize, usize) {
    (
        c.opened.load(Ordering::SeqCst),
        c.rendered.load(Ordering::SeqCst),
        c.released.load(Ordering::SeqCst),
    )
}

#[test]
fn failing_fallback_runs_once_and_is_released() {
    let (fetcher, counters) = with_fallback(StalledSource, None);
    let err = fetcher.fetch_payload("https://m/1").unwrap_err();

    assert_eq!(counts(&counters), (1, 1, 1));
    match err {
        ExtractError::Fetch { url, attempts } => {
            assert_eq!(url, "https://m/1");
            assert_eq!(attempts.len(), 2);
            assert!(attempts[0].contains("timed out"));
            assert!(attempts[1].starts_with("browser"));
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[test]
fn fallback_rescues_timed_out_primary() {
    let (fetcher, counters) = with_fallback(StalledSource, Some(STATE_PAGE));
    let located = fetcher.fetch_payload("https://m/1").expect("fallback payload");

    assert_eq!(located.origin, PayloadOrigin::InitialState);
    assert_eq!(counts(&counters), (1, 1, 1));
}

#[test]
fn fallback_is_skipped_when_primary_has_payload() {
    let (fetcher, counters) = with_fallback(StaticSource(STATE_PAGE), Some(STATE_PAGE));
    fetcher.fetch_payload("https://m/1").expect("primary payload");
    assert_eq!(counts(&counters), (0, 0, 0));
}

#[test]
fn page_without_payload_triggers_fallback() {
    let page = StaticSource("<html><body>consent wall</body></html>");
    let (fetcher, counters) = with_fallback(page, Some(STATE_PAGE));
    fetcher.fetch_payload("https://m/1").expect("rendered payload");
    assert_eq!(counts(&counters), (1, 1, 1));
}

#[test]
fn no_payload_anywhere_is_not_a_fetch_error() {
    let (fetcher, counters) = with_fallback(StaticSource("<html></html>"), Some("<html></html>"));
    let err = fetcher.fetch_payload("https://m/1").unwrap_err();
    assert_eq!(err.kind(), "no-structured-data");
    assert_eq!(counts(&counters).2, 1);
}

#[test]
fn browser_failure_reason_survives_empty_primary_page() {
    let (fetcher, counters) = with_fallback(StaticSource("<html></html>"), None);
    let err = fetcher.fetch_payload("https://m/1").unwrap_err();
    assert_eq!(counts(&counters), (1, 1, 1));
    match &err {
        ExtractError::NoStructuredData { attempts, .. } => {
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0], "http: no structured data");
            assert!(attempts[1].starts_with("browser"));
            assert!(attempts[1].contains("page load crashed"));
        }
        other => panic!("expected no-structured-data, got {other:?}"),
    }
    assert!(err.to_string().contains("page load crashed"));
}

#[test]
fn returned_page_is_the_one_the_payload_came_from() {
    let (fetcher, counters) = with_fallback(StaticSource("<html></html>"), Some(STATE_PAGE));
    let (page, located) = fetcher.fetch_page_payload("https://m/1").expect("payload");
    assert_eq!(page, STATE_PAGE);
    assert_eq!(located.origin, PayloadOrigin::InitialState);
    assert_eq!(counts(&counters), (1, 1, 1));

    let (fetcher, counters) = with_fallback(StaticSource(STATE_PAGE), None);
    let (page, _) = fetcher.fetch_page_payload("https://m/1").expect("payload");
    assert_eq!(page, STATE_PAGE);
    assert_eq!(counts(&counters), (0, 0, 0));
}

#[test]
fn raw_fetch_falls_back_only_on_transport_failure() {
    let (fetcher, counters) = with_fallback(StaticSource("<html></html>"), Some(STATE_PAGE));
    assert_eq!(fetcher.fetch("https://m/1").expect("primary doc"), "<html></html>");
    assert_eq!(counts(&counters), (0, 0, 0));

    let (fetcher, counters) = fetcher_with_failing_open();
    let err = fetcher.fetch("https://m/1").unwrap_err();
    assert_eq!(err.attempts.len(), 2);
    assert_eq!(counters.released.load(Ordering::SeqCst), 0);
}

struct BrokenBackend {
    counters: Arc<Counters>,
}

impl RenderBackend for BrokenBackend {
    type Session = FakeSession;

    fn open(&self) -> Result<FakeSession> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        bail!("chrome binary not found")
    }
}

fn fetcher_with_failing_open() -> (DocumentFetcher, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let backend = BrokenBackend {
        counters: Arc::clone(&counters),
    };
    let fallback = RenderedSource::new(backend, Duration::ZERO);
    (
        DocumentFetcher::new(Box::new(StalledSource), Some(Box::new(fallback))),
        counters,
    )
}

#[test]
fn without_fallback_only_primary_is_tried() {
    let fetcher = DocumentFetcher::new(Box::new(StalledSource), None);
    match fetcher.fetch_payload("https://m/1").unwrap_err() {
        ExtractError::Fetch { attempts, .. } => assert_eq!(attempts.len(), 1),
        other => panic!("expected fetch error, got {other:?}"),
    }
}
