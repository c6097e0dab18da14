mod parser;
pub mod scraper;
pub mod types;

pub use parser::{ParseError, government_name, parse_government_page};
pub use scraper::{MinistersRun, MinistersScraper};
pub use types::{GovernmentCatalog, GovernmentPage, Minister, Succession};
