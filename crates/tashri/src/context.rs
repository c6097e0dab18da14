use std::path::PathBuf;

use crate::browser::{Browser, BrowserError, HttpBrowser};
use crate::legislation::LawType;
use crate::ministers::ParseError;
use crate::navigator::{Navigator, Pacing};
use crate::session::{Session, SessionConfig};
use crate::sink::{RecordSink, SinkError};

const PARLIAMENTARIANS_URL: &str = "https://www.chambredesrepresentants.ma/ar/%D8%AF%D9%84%D9%8A%D9%84-%D8%A3%D8%B9%D8%B6%D8%A7%D8%A1-%D9%85%D8%AC%D9%84%D8%B3-%D8%A7%D9%84%D9%86%D9%88%D8%A7%D8%A8/2021-2026/";
const GOVERNMENT_URL: &str = "https://fr.wikipedia.org/wiki/Gouvernement_Akhannouch_II";

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("Failed to initialize browser session: {0}")]
    DriverInit(#[source] BrowserError),
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Output error: {0}")]
    Sink(#[from] SinkError),
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub legislation_url: String,
    pub parliamentarians_url: String,
    pub government_url: String,
    pub output_dir: PathBuf,
    pub session: SessionConfig,
    pub pacing: Pacing,
    /// Last directory page to visit.
    pub member_page_ceiling: Option<u32>,
    /// Last page to visit per legislation listing; unbounded when `None`.
    pub law_page_ceiling: Option<u32>,
    /// Oldest legislature (by start year) whose adopted texts are collected.
    pub min_legislature_year: i32,
    /// Stamped on every parliamentarian record when set.
    pub term: Option<String>,
    pub categories: Vec<LawType>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            legislation_url: format!("{}/ar", crate::CHAMBER_URL),
            parliamentarians_url: PARLIAMENTARIANS_URL.to_string(),
            government_url: GOVERNMENT_URL.to_string(),
            output_dir: PathBuf::from("."),
            session: SessionConfig::default(),
            pacing: Pacing::default(),
            member_page_ceiling: Some(33),
            law_page_ceiling: None,
            min_legislature_year: 2011,
            term: None,
            categories: LawType::ALL.to_vec(),
        }
    }
}

impl ScrapeConfig {
    pub fn with_legislation_url(mut self, url: impl Into<String>) -> Self {
        self.legislation_url = url.into();
        self
    }

    pub fn with_parliamentarians_url(mut self, url: impl Into<String>) -> Self {
        self.parliamentarians_url = url.into();
        self
    }

    pub fn with_government_url(mut self, url: impl Into<String>) -> Self {
        self.government_url = url.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_member_page_ceiling(mut self, ceiling: Option<u32>) -> Self {
        self.member_page_ceiling = ceiling;
        self
    }

    pub fn with_law_page_ceiling(mut self, ceiling: Option<u32>) -> Self {
        self.law_page_ceiling = ceiling;
        self
    }

    pub fn with_min_legislature_year(mut self, year: i32) -> Self {
        self.min_legislature_year = year;
        self
    }

    pub fn with_term(mut self, term: Option<String>) -> Self {
        self.term = term;
        self
    }

    pub fn with_categories(mut self, categories: Vec<LawType>) -> Self {
        self.categories = categories;
        self
    }
}

/// Everything a scraper needs for one run: configuration, the browser
/// session, navigation pacing and the output sink.
///
/// Dropping the context releases the session.
#[derive(Debug)]
pub struct RunContext<B: Browser> {
    pub config: ScrapeConfig,
    pub(crate) session: Session<B>,
    pub(crate) navigator: Navigator,
    pub(crate) sink: RecordSink,
}

impl RunContext<HttpBrowser> {
    pub fn start(config: ScrapeConfig) -> Result<Self, ScraperError> {
        let session = Session::acquire(&config.session).map_err(ScraperError::DriverInit)?;
        Ok(Self::with_session(config, session))
    }
}

impl<B: Browser> RunContext<B> {
    pub fn with_session(config: ScrapeConfig, session: Session<B>) -> Self {
        let navigator = Navigator::new(config.pacing, session.fingerprint().page_load_timeout);
        let sink = RecordSink::new(config.output_dir.clone());
        Self {
            config,
            session,
            navigator,
            sink,
        }
    }

    pub fn sink(&self) -> &RecordSink {
        &self.sink
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Releases the session ahead of drop.
    pub fn finish(&mut self) {
        self.session.release();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::Fingerprint;
    use crate::testing::FakeBrowser;
    use std::path::Path;
    use std::time::Duration;

    pub(crate) fn test_context(browser: FakeBrowser, output_dir: &Path) -> RunContext<FakeBrowser> {
        let fingerprint = Fingerprint {
            user_agent: "tashri-test".into(),
            window_size: (1366, 768),
            page_load_timeout: Duration::from_secs(5),
        };
        let config = ScrapeConfig::default()
            .with_pacing(Pacing::none())
            .with_output_dir(output_dir);
        RunContext::with_session(config, Session::with_browser(browser, fingerprint))
    }

    #[test]
    fn test_default_config() {
        let config = ScrapeConfig::default();
        assert_eq!(config.legislation_url, "https://www.chambredesrepresentants.ma/ar");
        assert_eq!(config.member_page_ceiling, Some(33));
        assert_eq!(config.min_legislature_year, 2011);
        assert_eq!(config.categories, LawType::ALL.to_vec());
        assert!(config.government_url.contains("Gouvernement_"));
    }

    #[test]
    fn test_builders_override_defaults() {
        let config = ScrapeConfig::default()
            .with_categories(vec![LawType::Adopted])
            .with_term(Some("2021-2026".into()))
            .with_law_page_ceiling(Some(2))
            .with_output_dir("out");
        assert_eq!(config.categories, vec![LawType::Adopted]);
        assert_eq!(config.term.as_deref(), Some("2021-2026"));
        assert_eq!(config.law_page_ceiling, Some(2));
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_finish_releases_session_once() {
        let dir = tempfile::tempdir().unwrap();
        let browser = FakeBrowser::new();
        let closes = browser.close_counter();
        let mut ctx = test_context(browser, dir.path());

        assert!(ctx.is_active());
        ctx.finish();
        assert!(!ctx.is_active());
        drop(ctx);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_sink_writes_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(FakeBrowser::new(), dir.path());
        assert_eq!(ctx.sink().dir(), dir.path());
    }
}
