use std::fmt::Display;

use crate::browser::{Browser, BrowserError, Element, Readiness};
use crate::navigator::Navigator;
use crate::utils::with_query_param;

/// How a listing reaches its next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pagination {
    /// Click the link matched by `selector` whose text is `label`.
    NextControl { selector: String, label: String },
    /// Load the first page's URL with `name=<page number>`.
    QueryParam { name: String },
}

#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub container: String,
    pub item: String,
    pub pagination: Pagination,
    pub page_ceiling: Option<u32>,
}

/// Why a walk stopped. Every variant is a normal termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEnd {
    NoNextControl,
    PageCeiling(u32),
    NoEntries,
    ExtractionTimeout,
    ExtractionFailed,
    NavigationFailed,
}

impl Display for WalkEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalkEnd::NoNextControl => write!(f, "no next-page control"),
            WalkEnd::PageCeiling(n) => write!(f, "page ceiling ({n}) reached"),
            WalkEnd::NoEntries => write!(f, "page without entries"),
            WalkEnd::ExtractionTimeout => write!(f, "listing container never appeared"),
            WalkEnd::ExtractionFailed => write!(f, "listing items could not be read"),
            WalkEnd::NavigationFailed => write!(f, "next page failed to load"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum WalkState {
    Start,
    HasEntries(u32),
    NextPage(u32),
    Exhausted(WalkEnd),
}

#[derive(Debug, Clone)]
pub struct ListingPage {
    pub number: u32,
    pub url: String,
    pub items: Vec<Element>,
}

impl ListingPage {
    /// Maps each item with `extract`, skipping (and logging) the items it rejects.
    pub fn extract<T, F>(&self, mut extract: F) -> Vec<T>
    where
        F: FnMut(&Element, &str) -> Result<T, BrowserError>,
    {
        self.items
            .iter()
            .filter_map(|item| match extract(item, &self.url) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping entry on page {}: {}", self.number, e);
                    None
                }
            })
            .collect()
    }
}

fn is_next_label(text: &str, label: &str) -> bool {
    text.trim_matches(|c: char| !c.is_alphanumeric()) == label
}

pub struct ListingWalker<'a> {
    config: &'a ListingConfig,
    navigator: &'a Navigator,
    state: WalkState,
    first_page_url: Option<String>,
}

impl<'a> ListingWalker<'a> {
    pub fn new(config: &'a ListingConfig, navigator: &'a Navigator) -> Self {
        Self {
            config,
            navigator,
            state: WalkState::Start,
            first_page_url: None,
        }
    }

    pub fn end(&self) -> Option<&WalkEnd> {
        match &self.state {
            WalkState::Exhausted(end) => Some(end),
            _ => None,
        }
    }

    fn finish(&mut self, end: WalkEnd) {
        log::info!("Listing walk finished: {}", end);
        self.state = WalkState::Exhausted(end);
    }

    fn current_number(&self) -> Option<u32> {
        match self.state {
            WalkState::Start => Some(1),
            WalkState::HasEntries(n) | WalkState::NextPage(n) => Some(n),
            WalkState::Exhausted(_) => None,
        }
    }

    /// Collects the items of the page the browser is currently on.
    pub async fn collect_page<B: Browser>(&mut self, browser: &mut B) -> Option<ListingPage> {
        let number = self.current_number()?;
        log::info!("Scraping listing page {}", number);

        let container = Readiness::ElementPresent(self.config.container.clone());
        if let Err(e) = self.navigator.wait(browser, &container).await {
            log::error!("Error processing page {}: {}", number, e);
            self.finish(WalkEnd::ExtractionTimeout);
            return None;
        }

        let items = match browser.query(&self.config.item) {
            Ok(items) => items,
            Err(e) => {
                log::error!("Error reading items on page {}: {}", number, e);
                self.finish(WalkEnd::ExtractionFailed);
                return None;
            }
        };

        if items.is_empty() {
            log::warn!("No items found on page {}", number);
            self.finish(WalkEnd::NoEntries);
            return None;
        }

        let url = browser.current_url().unwrap_or_default().to_string();
        if self.first_page_url.is_none() {
            self.first_page_url = Some(url.clone());
        }

        self.state = WalkState::HasEntries(number);
        Some(ListingPage { number, url, items })
    }

    /// Moves the browser to the next page. Returns `false` once the walk is over.
    ///
    /// A last page without a next control ends the walk with
    /// [`WalkEnd::NoNextControl`] even when it is also the ceiling page.
    pub async fn advance<B: Browser>(&mut self, browser: &mut B) -> bool {
        let Some(current) = self.current_number() else {
            return false;
        };

        let next = current + 1;
        let config = self.config;
        let navigator = self.navigator;
        let at_ceiling = config.page_ceiling.filter(|&ceiling| current >= ceiling);

        let moved = match &config.pagination {
            Pagination::NextControl { selector, label } => {
                let control = match browser.query(selector) {
                    Ok(links) => links.into_iter().find(|link| {
                        is_next_label(link.text(), label)
                            && link.attr("href").is_some_and(|h| !h.is_empty())
                    }),
                    Err(e) => {
                        log::error!("Error looking for next-page control: {}", e);
                        None
                    }
                };
                let Some(control) = control else {
                    log::info!("No more pages to navigate.");
                    self.finish(WalkEnd::NoNextControl);
                    return false;
                };
                if let Some(ceiling) = at_ceiling {
                    self.finish(WalkEnd::PageCeiling(ceiling));
                    return false;
                }
                navigator
                    .follow(browser, &control, &Readiness::DocumentComplete)
                    .await
            }
            Pagination::QueryParam { name } => {
                if let Some(ceiling) = at_ceiling {
                    self.finish(WalkEnd::PageCeiling(ceiling));
                    return false;
                }
                let seed = self
                    .first_page_url
                    .clone()
                    .or_else(|| browser.current_url().map(str::to_string))
                    .unwrap_or_default();
                match with_query_param(&seed, name, &next.to_string()) {
                    Ok(url) => {
                        log::info!("Navigating to the next page: {}", url);
                        navigator
                            .load(browser, &url, &Readiness::DocumentComplete)
                            .await
                    }
                    Err(e) => Err(BrowserError::InvalidUrl(e)),
                }
            }
        };

        match moved {
            Ok(()) => {
                self.state = WalkState::NextPage(next);
                true
            }
            Err(e) => {
                log::error!("Error navigating to page {}: {}", next, e);
                self.finish(WalkEnd::NavigationFailed);
                false
            }
        }
    }

    /// Collects entries from every page until the walk ends.
    pub async fn walk_all<B, T, F>(&mut self, browser: &mut B, mut extract: F) -> Vec<T>
    where
        B: Browser,
        F: FnMut(&Element, &str) -> Result<T, BrowserError>,
    {
        let mut all = Vec::new();
        while let Some(page) = self.collect_page(browser).await {
            let entries = page.extract(&mut extract);
            log::info!("Collected {} entries from page {}", entries.len(), page.number);
            all.extend(entries);
            if !self.advance(browser).await {
                break;
            }
        }
        all
    }
}
