use std::collections::BTreeMap;

use super::detail::DetailExtractor;
use super::parser::{
    parse_adopted_entry, parse_law_entry, parse_legislation_links, parse_legislature_periods,
};
use super::types::{LawRecord, LawType, LegislationCatalog, LegislationLinks};
use crate::browser::{Browser, Readiness};
use crate::context::{RunContext, ScraperError};
use crate::listing::{ListingConfig, ListingWalker, Pagination};
use crate::types::{CrawlReport, ExtractionFailure};
use crate::utils::RunStats;

const MENU: &str = ".dropdown-menu.multi-column.columns-3";
const MENU_LINKS: &str = "ul.multi-column-dropdown li a";
const LAW_ITEM: &str = ".col-md-6.col-lg-4.mb-4";
const NEXT_CONTROL: &str = "a.page-link";
const NEXT_LABEL: &str = "التالي";
const LEGISLATURE_OPTIONS: &str = "select[name='field_legislature_target_id_1'] option";
const SORTING_DATE: &str = "h2.sorting_date";
const ALL_LAWS_FILE: &str = "moroccan_legislation_all.json";

fn law_listing(page_ceiling: Option<u32>) -> ListingConfig {
    ListingConfig {
        container: LAW_ITEM.to_string(),
        item: LAW_ITEM.to_string(),
        pagination: Pagination::NextControl {
            selector: NEXT_CONTROL.to_string(),
            label: NEXT_LABEL.to_string(),
        },
        page_ceiling,
    }
}

/// The outcome of a legislation crawl.
#[derive(Debug, Default)]
pub struct LegislationRun {
    pub catalog: LegislationCatalog,
    pub failures: Vec<ExtractionFailure>,
}

impl LegislationRun {
    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats::default();
        for law_type in LawType::ALL {
            let count = self.catalog.get(law_type).len();
            if count > 0 {
                stats.record(law_type.category(), count);
            }
        }
        stats.failures = self.failures.len();
        stats
    }
}

pub struct LegislationScraper<'a, B: Browser> {
    ctx: &'a mut RunContext<B>,
}

impl<'a, B: Browser> LegislationScraper<'a, B> {
    pub fn new(ctx: &'a mut RunContext<B>) -> Self {
        Self { ctx }
    }

    /// Reads the legislation menu of the chamber's home page.
    pub async fn fetch_links(&mut self) -> Result<LegislationLinks, ScraperError> {
        let url = self.ctx.config.legislation_url.clone();
        let browser = self.ctx.session.browser()?;
        let navigator = &self.ctx.navigator;

        log::info!("Fetching legislation links from {}", url);
        navigator
            .load(browser, &url, &Readiness::ElementPresent(MENU.to_string()))
            .await?;

        let links = browser.query(MENU_LINKS)?;
        let page_url = browser.current_url().unwrap_or(&url).to_string();
        Ok(parse_legislation_links(&links, &page_url))
    }

    /// Walks a projets or propositions listing, visiting every bill's detail page.
    pub async fn fetch_category(
        &mut self,
        law_type: LawType,
        url: &str,
    ) -> Result<CrawlReport<LawRecord>, ScraperError> {
        let config = law_listing(self.ctx.config.law_page_ceiling);
        let browser = self.ctx.session.browser()?;
        let navigator = &self.ctx.navigator;
        let mut report = CrawlReport::default();

        log::info!("Scraping {}...", law_type);
        if let Err(e) = navigator.load(browser, url, &Readiness::DocumentComplete).await {
            log::error!("Error loading {} listing: {}", law_type, e);
            report.failed(None, url, e);
            return Ok(report);
        }

        let extractor = DetailExtractor::new(navigator);
        let mut walker = ListingWalker::new(&config, navigator);

        while let Some(page) = walker.collect_page(browser).await {
            let entries = page.extract(parse_law_entry);
            log::info!("Found {} laws on page {}", entries.len(), page.number);
            extractor
                .extract_page(browser, law_type, &page.url, entries, &mut report)
                .await;
            if !walker.advance(browser).await {
                break;
            }
        }

        Ok(report)
    }

    /// Walks the adopted texts of every legislature since the configured year.
    pub async fn fetch_adopted(
        &mut self,
        adopted_url: &str,
    ) -> Result<CrawlReport<LawRecord>, ScraperError> {
        let config = law_listing(self.ctx.config.law_page_ceiling);
        let min_year = self.ctx.config.min_legislature_year;
        let browser = self.ctx.session.browser()?;
        let navigator = &self.ctx.navigator;
        let mut report = CrawlReport::default();

        log::info!("Scraping {}...", LawType::Adopted);
        let loaded = navigator
            .load(browser, adopted_url, &Readiness::ElementPresent(MENU.to_string()))
            .await;
        let options = match loaded.and_then(|()| browser.query(LEGISLATURE_OPTIONS)) {
            Ok(options) => options,
            Err(e) => {
                log::error!("Error getting legislature links: {}", e);
                report.failed(None, adopted_url, e);
                return Ok(report);
            }
        };

        for period in parse_legislature_periods(&options, adopted_url, min_year) {
            log::info!(
                "Scraping adopted laws for legislature period {}",
                period.label
            );
            if let Err(e) = navigator
                .load(browser, &period.url, &Readiness::DocumentComplete)
                .await
            {
                log::error!("Error loading legislature {}: {}", period.label, e);
                report.failed(None, &period.url, e);
                continue;
            }

            let mut walker = ListingWalker::new(&config, navigator);
            let mut last_date: Option<String> = None;

            while let Some(page) = walker.collect_page(browser).await {
                match browser.query(SORTING_DATE) {
                    Ok(dates) => {
                        if let Some(date) = dates.last().map(|d| d.text()).filter(|d| !d.is_empty())
                        {
                            last_date = Some(date.to_string());
                        }
                    }
                    Err(e) => log::warn!("Could not read dates on page {}: {}", page.number, e),
                }

                for (entry, commission) in page.extract(parse_adopted_entry) {
                    let mut law = LawRecord::from_entry(LawType::Adopted, entry);
                    law.date = last_date.clone();
                    law.commission = commission;
                    law.legislature_period = Some(period.label.clone());
                    report.succeeded(law);
                }

                if !walker.advance(browser).await {
                    break;
                }
            }
        }

        Ok(report)
    }

    /// Crawls every configured category, writing each one as soon as it is
    /// complete and the combined catalog at the end.
    pub async fn run(&mut self) -> Result<LegislationRun, ScraperError> {
        let links = self.fetch_links().await?;
        let categories = self.ctx.config.categories.clone();
        let mut run = LegislationRun::default();

        for law_type in categories {
            let Some(url) = links.get(law_type).map(str::to_string) else {
                log::warn!("No link found for {}", law_type);
                continue;
            };

            let report = match law_type {
                LawType::Adopted => self.fetch_adopted(&url).await?,
                LawType::Projets | LawType::Propositions => {
                    self.fetch_category(law_type, &url).await?
                }
            };
            let CrawlReport { records, failures } = report;
            log::info!(
                "Collected {} {} ({} failures)",
                records.len(),
                law_type.category(),
                failures.len()
            );

            if !records.is_empty() {
                let file = BTreeMap::from([(law_type.category(), &records)]);
                self.ctx
                    .sink
                    .flush(&file, &format!("{}.json", law_type.category()));
            }
            run.catalog.insert(law_type, records);
            run.failures.extend(failures);
        }

        if !run.catalog.is_empty() {
            self.ctx.sink.flush(&run.catalog, ALL_LAWS_FILE);
        }
        Ok(run)
    }
}
