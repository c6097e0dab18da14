use super::parser::{
    VOTE_MARKER, classify_block, parse_commission, parse_deposit_date, parse_vote_tally,
};
use super::types::{BlockCategory, LawRecord, LawType, Reading};
use crate::browser::{Browser, BrowserError, Element, Readiness};
use crate::navigator::Navigator;
use crate::types::{CrawlReport, ListingEntry};

const SECTION: &str = ".dp-section";
const SECTION_TITLE: &str = ".section-title";
const BLOCK: &str = ".dp-block";
const BLOCK_LABEL: &str = ".dp-block-l span";
const BLOCK_DETAILS: &str = ".dp-block-r span";

/// Visits law detail pages and parses their procedural readings.
pub struct DetailExtractor<'a> {
    navigator: &'a Navigator,
}

impl<'a> DetailExtractor<'a> {
    pub fn new(navigator: &'a Navigator) -> Self {
        Self { navigator }
    }

    /// Extracts every entry of one listing page, returning to `return_url`
    /// after each detail visit.
    pub async fn extract_page<B: Browser>(
        &self,
        browser: &mut B,
        law_type: LawType,
        return_url: &str,
        entries: Vec<ListingEntry>,
        report: &mut CrawlReport<LawRecord>,
    ) {
        for entry in entries {
            let (law, result) = self.extract_entry(browser, law_type, return_url, entry).await;
            match result {
                Ok(()) => {
                    log::debug!("{}", law);
                    report.succeeded(law);
                }
                Err(e) => {
                    log::error!("Error processing law details for {}: {}", law.url, e);
                    let url = law.url.clone();
                    report.failed(Some(law), url, e);
                }
            }
        }
    }

    /// Extracts one entry. The record is returned even when extraction
    /// failed part-way, holding whatever readings were parsed before the error.
    pub async fn extract_entry<B: Browser>(
        &self,
        browser: &mut B,
        law_type: LawType,
        return_url: &str,
        entry: ListingEntry,
    ) -> (LawRecord, Result<(), BrowserError>) {
        let mut law = LawRecord::from_entry(law_type, entry);
        let result = self.fill_readings(browser, &mut law).await;

        if let Err(e) = self
            .navigator
            .restore(browser, return_url, &Readiness::DocumentComplete)
            .await
        {
            log::error!("Could not return to listing page {}: {}", return_url, e);
        }

        (law, result)
    }

    async fn fill_readings<B: Browser>(
        &self,
        browser: &mut B,
        law: &mut LawRecord,
    ) -> Result<(), BrowserError> {
        log::info!("Navigating to law page: {}", law.url);
        self.navigator
            .load(browser, &law.url, &Readiness::DocumentComplete)
            .await?;

        for section in browser.query(SECTION)? {
            if let Some(reading) = extract_reading(browser, &section)? {
                law.readings.push(reading);
            }
        }
        Ok(())
    }
}

fn extract_reading<B: Browser>(
    browser: &B,
    section: &Element,
) -> Result<Option<Reading>, BrowserError> {
    let Some(stage) = browser
        .query_within(section, SECTION_TITLE)?
        .into_iter()
        .next()
        .map(|title| title.text().to_string())
        .filter(|t| !t.is_empty())
    else {
        log::debug!("Skipping section without a stage label");
        return Ok(None);
    };

    let mut reading = Reading::new(stage);

    for block in browser.query_within(section, BLOCK)? {
        let Some(label) = browser.query_within(&block, BLOCK_LABEL)?.into_iter().next() else {
            continue;
        };
        let details = browser.query_within(&block, BLOCK_DETAILS)?;
        let texts = details.iter().map(Element::text);

        match classify_block(label.text()) {
            BlockCategory::ChamberOffice => {
                if let Some(date) = texts.filter_map(parse_deposit_date).last() {
                    reading.deposit_date = Some(date);
                }
            }
            BlockCategory::Committee => {
                if let Some(commission) = texts.filter_map(parse_commission).last() {
                    reading.commission = Some(commission);
                }
            }
            BlockCategory::PlenarySession => {
                if let Some(vote) = texts
                    .filter(|t| t.contains(VOTE_MARKER))
                    .filter_map(parse_vote_tally)
                    .last()
                {
                    reading.vote = Some(vote);
                }
            }
            BlockCategory::Unrecognized(other) => {
                log::debug!("Ignoring block '{}' in stage '{}'", other, reading.stage);
            }
        }
    }

    Ok(Some(reading))
}
