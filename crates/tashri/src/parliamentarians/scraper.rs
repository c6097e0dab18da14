use super::parser::parse_card;
use super::types::Parliamentarian;
use crate::browser::{Browser, Readiness};
use crate::context::{RunContext, ScraperError};
use crate::listing::{ListingConfig, ListingWalker, Pagination, WalkEnd};
use crate::utils::RunStats;

const DIRECTORY: &str = "div.filter-result-wrp";
const CARD: &str = "div.filter-result-wrp > div.f-result-list.row > div";
const PAGE_PARAM: &str = "page";
const OUTPUT_FILE: &str = "parliamentarians.json";

#[derive(Debug, Default)]
pub struct DirectoryRun {
    pub parliamentarians: Vec<Parliamentarian>,
    pub end: Option<WalkEnd>,
}

impl DirectoryRun {
    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats::default();
        stats.record("parliamentarians", self.parliamentarians.len());
        stats
    }
}

/// Collects the chamber's member directory.
pub struct ParliamentarianScraper<'a, B: Browser> {
    ctx: &'a mut RunContext<B>,
}

impl<'a, B: Browser> ParliamentarianScraper<'a, B> {
    pub fn new(ctx: &'a mut RunContext<B>) -> Self {
        Self { ctx }
    }

    pub async fn run(&mut self) -> Result<DirectoryRun, ScraperError> {
        let seed = self.ctx.config.parliamentarians_url.clone();
        let term = self.ctx.config.term.clone();
        let config = ListingConfig {
            container: DIRECTORY.to_string(),
            item: CARD.to_string(),
            pagination: Pagination::QueryParam {
                name: PAGE_PARAM.to_string(),
            },
            page_ceiling: self.ctx.config.member_page_ceiling,
        };

        let browser = self.ctx.session.browser()?;
        let navigator = &self.ctx.navigator;

        log::info!("Scraping parliamentarians from {}", seed);
        navigator
            .load(browser, &seed, &Readiness::DocumentComplete)
            .await?;

        let mut walker = ListingWalker::new(&config, navigator);
        let mut parliamentarians = walker.walk_all(browser, parse_card).await;
        if let Some(term) = &term {
            for member in &mut parliamentarians {
                member.term = Some(term.clone());
            }
        }
        let end = walker.end().cloned();

        log::info!("Collected {} parliamentarians", parliamentarians.len());
        if !parliamentarians.is_empty() {
            self.ctx.sink.flush(&parliamentarians, OUTPUT_FILE);
        }

        Ok(DirectoryRun {
            parliamentarians,
            end,
        })
    }
}
