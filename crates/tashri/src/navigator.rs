use std::time::Duration;

use crate::browser::{Browser, BrowserError, Element, Readiness};

/// A uniformly sampled pause between `min` and `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    pub fn secs(min: f64, max: f64) -> Self {
        Self {
            min: Duration::from_secs_f64(min),
            max: Duration::from_secs_f64(max),
        }
    }

    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        self.min + (self.max - self.min).mul_f64(fastrand::f64())
    }

    async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Randomized pauses around page loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub before_load: DelayRange,
    pub after_load: DelayRange,
    pub after_return: DelayRange,
}

impl Pacing {
    /// No pauses at all.
    pub fn none() -> Self {
        Self {
            before_load: DelayRange::ZERO,
            after_load: DelayRange::ZERO,
            after_return: DelayRange::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            before_load: DelayRange::secs(2.0, 4.0),
            after_load: DelayRange::secs(1.0, 3.0),
            after_return: DelayRange::secs(1.0, 2.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Navigator {
    pacing: Pacing,
    page_load_timeout: Duration,
    ready_timeout: Duration,
}

impl Navigator {
    pub fn new(pacing: Pacing, page_load_timeout: Duration) -> Self {
        Self {
            pacing,
            page_load_timeout,
            ready_timeout: Duration::from_secs(30),
        }
    }

    pub async fn load<B: Browser>(
        &self,
        browser: &mut B,
        url: &str,
        readiness: &Readiness,
    ) -> Result<(), BrowserError> {
        log::debug!("Loading {}", url);
        self.pacing.before_load.pause().await;
        self.bounded(url, browser.navigate(url)).await?;
        self.settle(browser, readiness).await
    }

    /// Clicks `element` and waits for the resulting page.
    pub async fn follow<B: Browser>(
        &self,
        browser: &mut B,
        element: &Element,
        readiness: &Readiness,
    ) -> Result<(), BrowserError> {
        let target = element.attr("href").unwrap_or_default().to_string();
        log::debug!("Following link '{}' -> {}", element.text(), target);
        self.bounded(&target, browser.click(element)).await?;
        self.settle(browser, readiness).await
    }

    /// Navigates back to a listing page after a detail visit.
    pub async fn restore<B: Browser>(
        &self,
        browser: &mut B,
        url: &str,
        readiness: &Readiness,
    ) -> Result<(), BrowserError> {
        self.bounded(url, browser.navigate(url)).await?;
        self.wait(browser, readiness).await?;
        self.pacing.after_return.pause().await;
        Ok(())
    }

    /// Waits for `readiness` on the current page without navigating.
    pub async fn wait<B: Browser>(
        &self,
        browser: &mut B,
        readiness: &Readiness,
    ) -> Result<(), BrowserError> {
        browser.wait_for(readiness, self.ready_timeout).await
    }

    async fn bounded<F>(&self, url: &str, navigation: F) -> Result<(), BrowserError>
    where
        F: Future<Output = Result<(), BrowserError>>,
    {
        match tokio::time::timeout(self.page_load_timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout: self.page_load_timeout,
            }),
        }
    }

    async fn settle<B: Browser>(
        &self,
        browser: &mut B,
        readiness: &Readiness,
    ) -> Result<(), BrowserError> {
        self.wait(browser, readiness).await?;
        self.pacing.after_load.pause().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBrowser;

    #[test]
    fn test_delay_range_sample_within_bounds() {
        let range = DelayRange::secs(1.0, 2.0);
        for _ in 0..100 {
            let d = range.sample();
            assert!(d >= Duration::from_secs(1) && d <= Duration::from_secs(2));
        }
        assert_eq!(DelayRange::ZERO.sample(), Duration::ZERO);
    }

    #[test]
    fn test_default_pacing_matches_browsing_rhythm() {
        let pacing = Pacing::default();
        assert_eq!(pacing.before_load, DelayRange::secs(2.0, 4.0));
        assert_eq!(Pacing::none().after_return, DelayRange::ZERO);
    }

    #[tokio::test]
    async fn test_load_waits_for_element() {
        let mut browser = FakeBrowser::new()
            .with_page("https://example.ma/a", r#"<div class="ready">ok</div>"#);
        let navigator = Navigator::new(Pacing::none(), Duration::from_secs(5));

        navigator
            .load(
                &mut browser,
                "https://example.ma/a",
                &Readiness::ElementPresent("div.ready".into()),
            )
            .await
            .expect("page should load");
        assert_eq!(browser.current_url(), Some("https://example.ma/a"));

        let err = navigator
            .load(
                &mut browser,
                "https://example.ma/a",
                &Readiness::ElementPresent("div.missing".into()),
            )
            .await;
        assert!(matches!(err, Err(BrowserError::ExtractionTimeout(_))));
    }

    #[tokio::test]
    async fn test_load_times_out_on_stalled_navigation() {
        let mut browser = FakeBrowser::new()
            .with_page("https://example.ma/slow", "<p>late</p>")
            .stalling_on("https://example.ma/slow");
        let navigator = Navigator::new(Pacing::none(), Duration::from_millis(20));

        let err = navigator
            .load(
                &mut browser,
                "https://example.ma/slow",
                &Readiness::DocumentComplete,
            )
            .await;
        match err {
            Err(BrowserError::NavigationTimeout { url, .. }) => {
                assert_eq!(url, "https://example.ma/slow")
            }
            other => panic!("expected NavigationTimeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_unknown_page_fails() {
        let mut browser = FakeBrowser::new();
        let navigator = Navigator::new(Pacing::none(), Duration::from_secs(1));
        let err = navigator
            .load(
                &mut browser,
                "https://example.ma/missing",
                &Readiness::DocumentComplete,
            )
            .await;
        assert!(matches!(err, Err(BrowserError::Navigation { .. })));
    }
}
