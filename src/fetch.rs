use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use headless_chrome::{Browser, LaunchOptions, Tab};
use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::{ExtractError, FetchError};
use crate::http_client::build_http_client;
use crate::locate::{LocatedPayload, locate};

/// Anything that can turn a URL into page text.
pub trait PageSource: Send + Sync {
    fn label(&self) -> &'static str;
    fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Plain GET with the configured timeout and browser-like user agent.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(cfg: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(cfg)?,
        })
    }
}

impl PageSource for HttpSource {
    fn label(&self) -> &'static str {
        "http"
    }

    fn fetch_page(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().context("request failed")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("http {status}"));
        }
        resp.text().context("failed reading body")
    }
}

/// One live rendering context. Dropping it must release every resource it holds.
pub trait RenderSession {
    fn render(&mut self, url: &str, settle: Duration) -> Result<String>;
}

pub trait RenderBackend: Send + Sync {
    type Session: RenderSession;

    fn open(&self) -> Result<Self::Session>;
}

/// Renders the page in a fresh session per call; the session is dropped on every
/// exit path, including render errors.
pub struct RenderedSource<B> {
    backend: B,
    settle: Duration,
}

impl<B: RenderBackend> RenderedSource<B> {
    pub fn new(backend: B, settle: Duration) -> Self {
        Self { backend, settle }
    }
}

impl<B: RenderBackend> PageSource for RenderedSource<B> {
    fn label(&self) -> &'static str {
        "browser"
    }

    fn fetch_page(&self, url: &str) -> Result<String> {
        let mut session = self.backend.open().context("failed to open render session")?;
        session.render(url, self.settle)
    }
}

/// Headless Chrome, launched per session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeBackend;

pub struct ChromeSession {
    tab: Arc<Tab>,
    // Dropped after the tab is closed; its own Drop terminates the Chrome process.
    _browser: Browser,
}

impl RenderBackend for ChromeBackend {
    type Session = ChromeSession;

    fn open(&self) -> Result<ChromeSession> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .build()
            .context("failed to build chrome launch options")?;
        let browser = Browser::new(options).context("failed to launch chrome")?;
        let tab = browser.new_tab().context("failed to create browser tab")?;
        Ok(ChromeSession {
            tab,
            _browser: browser,
        })
    }
}

impl RenderSession for ChromeSession {
    fn render(&mut self, url: &str, settle: Duration) -> Result<String> {
        self.tab.navigate_to(url).context("chrome navigate failed")?;
        self.tab
            .wait_until_navigated()
            .context("chrome page load failed")?;
        std::thread::sleep(settle);
        self.tab
            .get_content()
            .context("failed to read html from browser tab")
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(err) = self.tab.close(false) {
            debug!("closing chrome tab failed: {err}");
        }
    }
}

/// Primary fast path with an optional heavyweight fallback.
pub struct DocumentFetcher {
    primary: Box<dyn PageSource>,
    fallback: Option<Box<dyn PageSource>>,
}

impl DocumentFetcher {
    pub fn new(primary: Box<dyn PageSource>, fallback: Option<Box<dyn PageSource>>) -> Self {
        Self { primary, fallback }
    }

    pub fn from_config(cfg: &FetchConfig) -> Result<Self> {
        let primary: Box<dyn PageSource> = Box::new(HttpSource::new(cfg)?);
        let fallback: Option<Box<dyn PageSource>> = if cfg.browser_fallback {
            Some(Box::new(RenderedSource::new(ChromeBackend, cfg.render_settle)))
        } else {
            None
        };
        Ok(Self::new(primary, fallback))
    }

    fn sources(&self) -> Vec<&dyn PageSource> {
        let mut out: Vec<&dyn PageSource> = vec![self.primary.as_ref()];
        if let Some(fallback) = self.fallback.as_deref() {
            out.push(fallback);
        }
        out
    }

    /// Raw document, falling back only on transport failure.
    pub fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempts = Vec::new();
        for source in self.sources() {
            match source.fetch_page(url) {
                Ok(doc) => return Ok(doc),
                Err(err) => {
                    warn!(url, strategy = source.label(), "fetch failed: {err:#}");
                    attempts.push(format!("{}: {err:#}", source.label()));
                }
            }
        }
        Err(FetchError {
            url: url.to_string(),
            attempts,
        })
    }

    /// Payload location. A document that yields no payload counts as a failed attempt,
    /// so the fallback also runs when the primary page is empty of data.
    pub fn fetch_payload(&self, url: &str) -> Result<LocatedPayload, ExtractError> {
        self.fetch_page_payload(url).map(|(_, located)| located)
    }

    /// Like `fetch_payload`, also returning the exact document the payload came from.
    pub fn fetch_page_payload(
        &self,
        url: &str,
    ) -> Result<(String, LocatedPayload), ExtractError> {
        let mut attempts = Vec::new();
        let mut retrieved = false;

        for source in self.sources() {
            match source.fetch_page(url) {
                Ok(doc) => {
                    retrieved = true;
                    if let Some(located) = locate(&doc) {
                        debug!(
                            url,
                            strategy = source.label(),
                            origin = ?located.origin,
                            "payload located"
                        );
                        return Ok((doc, located));
                    }
                    debug!(url, strategy = source.label(), "document has no structured data");
                    attempts.push(format!("{}: no structured data", source.label()));
                }
                Err(err) => {
                    warn!(url, strategy = source.label(), "fetch failed: {err:#}");
                    attempts.push(format!("{}: {err:#}", source.label()));
                }
            }
        }

        if retrieved {
            Err(ExtractError::NoStructuredData {
                url: url.to_string(),
                attempts,
            })
        } else {
            Err(ExtractError::Fetch {
                url: url.to_string(),
                attempts,
            })
        }
    }
}
