use std::ops::RangeInclusive;
use std::time::Duration;

use crate::browser::{Browser, BrowserError, HttpBrowser};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36 Edg/133.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:134.0) Gecko/20100101 Firefox/134.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

const WINDOW_SIZES: &[(u32, u32)] = &[(1366, 768), (1920, 1080), (1536, 864)];

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user_agents: Vec<String>,
    pub window_sizes: Vec<(u32, u32)>,
    /// Page-load timeout bounds, in seconds.
    pub page_load_timeout: RangeInclusive<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agents: USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            window_sizes: WINDOW_SIZES.to_vec(),
            page_load_timeout: 30..=40,
        }
    }
}

/// The randomized traits a session presents to the sites it visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub user_agent: String,
    pub window_size: (u32, u32),
    pub page_load_timeout: Duration,
}

impl Fingerprint {
    pub fn sample(config: &SessionConfig, rng: &mut fastrand::Rng) -> Self {
        let user_agent = rng
            .choice(config.user_agents.iter())
            .cloned()
            .unwrap_or_else(|| format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
        let window_size = rng
            .choice(config.window_sizes.iter())
            .copied()
            .unwrap_or(WINDOW_SIZES[0]);
        let page_load_timeout = Duration::from_secs(rng.u64(config.page_load_timeout.clone()));

        Self {
            user_agent,
            window_size,
            page_load_timeout,
        }
    }
}

/// Owns the browser for the duration of a run.
///
/// The browser is closed on [`Session::release`] or when the session is
/// dropped, whichever comes first.
#[derive(Debug)]
pub struct Session<B: Browser> {
    browser: Option<B>,
    fingerprint: Fingerprint,
}

impl Session<HttpBrowser> {
    pub fn acquire(config: &SessionConfig) -> Result<Self, BrowserError> {
        let fingerprint = Fingerprint::sample(config, &mut fastrand::Rng::new());
        log::info!(
            "Starting browser session ({}x{}, timeout {:?})",
            fingerprint.window_size.0,
            fingerprint.window_size.1,
            fingerprint.page_load_timeout
        );
        log::debug!("User agent: {}", fingerprint.user_agent);

        let browser = HttpBrowser::launch(&fingerprint)
            .inspect_err(|e| log::error!("Failed to initialize browser: {e}"))?;
        Ok(Self::with_browser(browser, fingerprint))
    }
}

impl<B: Browser> Session<B> {
    pub fn with_browser(browser: B, fingerprint: Fingerprint) -> Self {
        Self {
            browser: Some(browser),
            fingerprint,
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn is_active(&self) -> bool {
        self.browser.is_some()
    }

    pub fn browser(&mut self) -> Result<&mut B, BrowserError> {
        self.browser.as_mut().ok_or(BrowserError::SessionClosed)
    }

    /// Closes the browser. Calling this on a released session is a no-op.
    pub fn release(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            log::info!("Cleaning up browser session...");
            if let Err(e) = browser.close() {
                log::error!("Error during cleanup: {}", e);
            }
        }
    }
}

impl<B: Browser> Drop for Session<B> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBrowser;

    #[test]
    fn test_fingerprint_within_configured_bounds() {
        let config = SessionConfig::default();
        let mut rng = fastrand::Rng::with_seed(7);

        for _ in 0..50 {
            let fp = Fingerprint::sample(&config, &mut rng);
            assert!(config.window_sizes.contains(&fp.window_size));
            assert!(config.user_agents.contains(&fp.user_agent));
            let secs = fp.page_load_timeout.as_secs();
            assert!((30..=40).contains(&secs), "timeout {secs} out of range");
        }
    }

    #[test]
    fn test_fingerprint_is_reproducible_with_seed() {
        let config = SessionConfig::default();
        let a = Fingerprint::sample(&config, &mut fastrand::Rng::with_seed(42));
        let b = Fingerprint::sample(&config, &mut fastrand::Rng::with_seed(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_falls_back_when_pools_are_empty() {
        let config = SessionConfig {
            user_agents: Vec::new(),
            window_sizes: Vec::new(),
            page_load_timeout: 5..=5,
        };
        let fp = Fingerprint::sample(&config, &mut fastrand::Rng::with_seed(1));
        assert!(fp.user_agent.starts_with("tashri/"));
        assert_eq!(fp.window_size, (1366, 768));
        assert_eq!(fp.page_load_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_release_is_idempotent() {
        let browser = FakeBrowser::new();
        let closes = browser.close_counter();
        let fp = Fingerprint::sample(&SessionConfig::default(), &mut fastrand::Rng::with_seed(3));
        let mut session = Session::with_browser(browser, fp);

        assert!(session.is_active());
        session.release();
        session.release();
        assert!(!session.is_active());
        assert!(matches!(session.browser(), Err(BrowserError::SessionClosed)));

        drop(session);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_drop_releases_session() {
        let browser = FakeBrowser::new();
        let closes = browser.close_counter();
        let fp = Fingerprint::sample(&SessionConfig::default(), &mut fastrand::Rng::with_seed(3));
        {
            let _session = Session::with_browser(browser, fp);
        }
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_release_swallows_close_errors() {
        let browser = FakeBrowser::new().failing_close();
        let closes = browser.close_counter();
        let fp = Fingerprint::sample(&SessionConfig::default(), &mut fastrand::Rng::with_seed(3));
        let mut session = Session::with_browser(browser, fp);

        session.release();
        assert!(!session.is_active());
        assert_eq!(closes.get(), 1);
    }
}
