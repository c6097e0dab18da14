use std::time::Duration;

use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use scraper::{ElementRef, Html, Selector};

use crate::session::Fingerprint;
use crate::utils::{normalize_whitespace, resolve_url};

#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("Timed out waiting for element: {0}")]
    ExtractionTimeout(String),
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Element is not clickable: {0}")]
    NotClickable(String),
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("No document loaded")]
    NoDocument,
    #[error("Browser session already released")]
    SessionClosed,
}

/// Condition a navigation waits for before the page counts as loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    DocumentComplete,
    ElementPresent(String),
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector(format!("{selector}: {e}")))
}

/// An owned snapshot of a DOM element.
///
/// Snapshots outlive the document they were taken from, so the session can
/// navigate away while the caller still holds the elements of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    html: String,
    text: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    pub(crate) fn from_ref(element: ElementRef<'_>) -> Self {
        Self {
            html: element.html(),
            text: normalize_whitespace(&element.text().collect::<String>()),
            attributes: element
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Descendants of this element matching `selector`, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        let selector = parse_selector(selector)?;
        let fragment = Html::parse_fragment(&self.html);
        let Some(root) = fragment.root_element().child_elements().next() else {
            return Ok(Vec::new());
        };
        Ok(root.select(&selector).map(Element::from_ref).collect())
    }

    pub fn select_first(&self, selector: &str) -> Result<Element, BrowserError> {
        self.select(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))
    }
}

/// The automation surface the scrapers drive.
///
/// Implementors provide navigation and the current document; selector
/// evaluation, readiness checks and link clicks have document-based defaults.
#[allow(async_fn_in_trait)]
pub trait Browser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    fn current_url(&self) -> Option<&str>;

    fn page_source(&self) -> Option<&str>;

    fn close(&mut self) -> Result<(), BrowserError>;

    /// Waits until `readiness` holds. A fetched document is static, so the
    /// default checks once and reports a timeout if the element is absent.
    async fn wait_for(
        &mut self,
        readiness: &Readiness,
        _timeout: Duration,
    ) -> Result<(), BrowserError> {
        match readiness {
            Readiness::DocumentComplete => self
                .page_source()
                .map(|_| ())
                .ok_or(BrowserError::NoDocument),
            Readiness::ElementPresent(selector) => {
                if self.query(selector)?.is_empty() {
                    Err(BrowserError::ExtractionTimeout(selector.clone()))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn query(&self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        let html = self.page_source().ok_or(BrowserError::NoDocument)?;
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(html);
        Ok(document.select(&selector).map(Element::from_ref).collect())
    }

    fn query_within(&self, scope: &Element, selector: &str) -> Result<Vec<Element>, BrowserError> {
        scope.select(selector)
    }

    async fn click(&mut self, element: &Element) -> Result<(), BrowserError> {
        let href = element
            .attr("href")
            .filter(|h| !h.is_empty() && !h.starts_with('#'))
            .ok_or_else(|| BrowserError::NotClickable(element.text().to_string()))?;
        let base = self.current_url().ok_or(BrowserError::NoDocument)?;
        let target = resolve_url(base, href)?;
        self.navigate(&target).await
    }
}

#[derive(Debug)]
struct LoadedPage {
    url: String,
    html: String,
}

/// A [`Browser`] that fetches documents over HTTP and evaluates selectors
/// against the returned markup.
#[derive(Debug)]
pub struct HttpBrowser {
    client: Option<Client>,
    page: Option<LoadedPage>,
    timeout: Duration,
}

impl HttpBrowser {
    pub fn launch(fingerprint: &Fingerprint) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .timeout(fingerprint.page_load_timeout)
            .user_agent(fingerprint.user_agent.as_str())
            .default_headers(Self::headers(fingerprint))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client: Some(client),
            page: None,
            timeout: fingerprint.page_load_timeout,
        })
    }

    fn headers(fingerprint: &Fingerprint) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("ar,fr;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );
        headers.insert(
            HeaderName::from_static("viewport-width"),
            HeaderValue::from(fingerprint.window_size.0),
        );
        headers
    }
}

impl Browser for HttpBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let client = self.client.as_ref().ok_or(BrowserError::SessionClosed)?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrowserError::NavigationTimeout {
                        url: url.to_string(),
                        timeout: self.timeout,
                    }
                } else {
                    log::error!("HTTP error: {e:?}");
                    BrowserError::HttpError(e)
                }
            })?
            .error_for_status()?;

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        self.page = Some(LoadedPage {
            url: final_url,
            html,
        });
        Ok(())
    }

    fn current_url(&self) -> Option<&str> {
        self.page.as_ref().map(|p| p.url.as_str())
    }

    fn page_source(&self) -> Option<&str> {
        self.page.as_ref().map(|p| p.html.as_str())
    }

    fn close(&mut self) -> Result<(), BrowserError> {
        self.page = None;
        self.client.take().map(|_| ()).ok_or(BrowserError::SessionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBrowser;

    const CARD: &str = r#"<div class="card"><h3 class="questionss_group"><a href="/ar/law-a"><p> مشروع   قانون </p></a></h3><div class="card">nested</div></div>"#;

    #[test]
    fn test_element_snapshot_text_and_attributes() {
        let document = Html::parse_document(CARD);
        let sel = Selector::parse("h3.questionss_group a").unwrap();
        let link = Element::from_ref(document.select(&sel).next().unwrap());

        assert_eq!(link.text(), "مشروع قانون");
        assert_eq!(link.attr("href"), Some("/ar/law-a"));
        assert_eq!(link.attr("title"), None);
    }

    #[test]
    fn test_element_select_only_matches_descendants() {
        let document = Html::parse_document(CARD);
        let sel = Selector::parse("div.card").unwrap();
        let card = Element::from_ref(document.select(&sel).next().unwrap());

        let nested = card.select("div.card").unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].text(), "nested");
    }

    #[test]
    fn test_select_first_reports_missing_element() {
        let document = Html::parse_document(CARD);
        let sel = Selector::parse("div.card").unwrap();
        let card = Element::from_ref(document.select(&sel).next().unwrap());

        match card.select_first("span.missing") {
            Err(BrowserError::ElementNotFound(s)) => assert_eq!(s, "span.missing"),
            other => panic!("expected ElementNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_selector() {
        let document = Html::parse_document(CARD);
        let sel = Selector::parse("div.card").unwrap();
        let card = Element::from_ref(document.select(&sel).next().unwrap());

        assert!(matches!(
            card.select("div[["),
            Err(BrowserError::InvalidSelector(_))
        ));
    }

    #[tokio::test]
    async fn test_wait_for_missing_element_times_out() {
        let mut browser = FakeBrowser::new().with_page("https://example.ma/", CARD);
        browser.navigate("https://example.ma/").await.unwrap();

        browser
            .wait_for(&Readiness::DocumentComplete, Duration::ZERO)
            .await
            .expect("document should be ready");
        browser
            .wait_for(
                &Readiness::ElementPresent("h3.questionss_group".into()),
                Duration::ZERO,
            )
            .await
            .expect("element should be present");

        let missing = browser
            .wait_for(&Readiness::ElementPresent(".dp-section".into()), Duration::ZERO)
            .await;
        assert!(matches!(missing, Err(BrowserError::ExtractionTimeout(_))));
    }

    #[tokio::test]
    async fn test_click_follows_relative_href() {
        let mut browser = FakeBrowser::new()
            .with_page("https://example.ma/ar/list", CARD)
            .with_page("https://example.ma/ar/law-a", "<p>detail</p>");
        browser.navigate("https://example.ma/ar/list").await.unwrap();

        let link = browser.query("h3.questionss_group a").unwrap().remove(0);
        browser.click(&link).await.unwrap();
        assert_eq!(browser.current_url(), Some("https://example.ma/ar/law-a"));

        let not_a_link = browser.query("p").unwrap().remove(0);
        assert!(matches!(
            browser.click(&not_a_link).await,
            Err(BrowserError::NotClickable(_))
        ));
    }
}
