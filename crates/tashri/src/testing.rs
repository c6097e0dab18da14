use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::rc::Rc;

use crate::browser::{Browser, BrowserError, Element};

pub(crate) fn fixture(name: &str) -> String {
    fs::read_to_string(format!("fixtures/{name}"))
        .unwrap_or_else(|e| panic!("Failed to read fixture {name}: {e}"))
}

/// An in-memory browser serving canned pages, with hooks for fault injection.
#[derive(Debug, Default)]
pub(crate) struct FakeBrowser {
    pages: HashMap<String, String>,
    current: Option<String>,
    stalls: Vec<String>,
    fail_query: Option<(String, String)>,
    fail_close: bool,
    closes: Rc<Cell<usize>>,
    pub(crate) visits: Vec<String>,
}

impl FakeBrowser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub(crate) fn with_fixture(self, url: &str, name: &str) -> Self {
        let html = fixture(name);
        self.with_page(url, &html)
    }

    /// Navigation to `url` never completes.
    pub(crate) fn stalling_on(mut self, url: &str) -> Self {
        self.stalls.push(url.to_string());
        self
    }

    /// Selector queries for `selector` fail while the browser is on `url`.
    pub(crate) fn failing_query(mut self, url: &str, selector: &str) -> Self {
        self.fail_query = Some((url.to_string(), selector.to_string()));
        self
    }

    pub(crate) fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub(crate) fn close_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.closes)
    }

    fn check_fault(&self, selector: &str) -> Result<(), BrowserError> {
        match (&self.fail_query, &self.current) {
            (Some((url, sel)), Some(current)) if url == current && sel == selector => {
                Err(BrowserError::ElementNotFound(format!("injected failure: {selector}")))
            }
            _ => Ok(()),
        }
    }
}

impl Browser for FakeBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.visits.push(url.to_string());
        if self.stalls.iter().any(|s| s == url) {
            std::future::pending::<()>().await;
        }
        if !self.pages.contains_key(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "404 Not Found".to_string(),
            });
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    fn current_url(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn page_source(&self) -> Option<&str> {
        self.current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .map(String::as_str)
    }

    fn close(&mut self) -> Result<(), BrowserError> {
        self.closes.set(self.closes.get() + 1);
        if self.fail_close {
            return Err(BrowserError::SessionClosed);
        }
        Ok(())
    }

    fn query(&self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        self.check_fault(selector)?;
        let html = self.page_source().ok_or(BrowserError::NoDocument)?;
        let parsed = crate::browser::parse_selector(selector)?;
        let document = scraper::Html::parse_document(html);
        Ok(document.select(&parsed).map(Element::from_ref).collect())
    }

    fn query_within(&self, scope: &Element, selector: &str) -> Result<Vec<Element>, BrowserError> {
        self.check_fault(selector)?;
        scope.select(selector)
    }
}
