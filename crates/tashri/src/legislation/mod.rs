pub mod detail;
mod parser;
pub mod scraper;
pub mod types;

pub use detail::DetailExtractor;
pub use parser::{classify_block, parse_vote_tally};
pub use scraper::{LegislationRun, LegislationScraper};
pub use types::{
    LawRecord, LawType, LegislationCatalog, LegislationLinks, Outcome, Reading, VoteTally,
};
