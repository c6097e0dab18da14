mod parser;
pub mod scraper;
pub mod types;

pub use parser::parse_card;
pub use scraper::{DirectoryRun, ParliamentarianScraper};
pub use types::Parliamentarian;
