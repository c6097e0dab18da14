use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::browser::BrowserError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub title: String,
    pub detail_url: String,
}

/// A record that could not be fully extracted.
#[derive(Debug)]
pub struct ExtractionFailure {
    pub url: String,
    pub error: BrowserError,
}

impl Display for ExtractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.url, self.error)
    }
}

/// Records collected by a crawl, alongside the extractions that failed.
///
/// A failed extraction may still contribute a partial record.
#[derive(Debug)]
pub struct CrawlReport<T> {
    pub records: Vec<T>,
    pub failures: Vec<ExtractionFailure>,
}

impl<T> Default for CrawlReport<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> CrawlReport<T> {
    pub fn succeeded(&mut self, record: T) {
        self.records.push(record);
    }

    pub fn failed(&mut self, record: Option<T>, url: impl Into<String>, error: BrowserError) {
        self.records.extend(record);
        self.failures.push(ExtractionFailure {
            url: url.into(),
            error,
        });
    }
}
