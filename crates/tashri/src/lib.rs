pub mod browser;
pub mod context;
pub mod legislation;
pub mod listing;
pub mod ministers;
pub mod navigator;
pub mod parliamentarians;
pub mod session;
pub mod sink;
pub mod types;
pub mod utils;

#[cfg(test)]
mod testing;

pub use browser::{Browser, BrowserError, Element, HttpBrowser, Readiness};
pub use context::{RunContext, ScrapeConfig, ScraperError};
pub use session::{Fingerprint, Session, SessionConfig};

pub(crate) const CHAMBER_URL: &str = "https://www.chambredesrepresentants.ma";
