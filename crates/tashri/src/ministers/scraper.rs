use super::parser::{government_name, parse_government_page};
use super::types::{GovernmentCatalog, GovernmentPage, Succession};
use crate::browser::{Browser, BrowserError, Readiness};
use crate::context::{RunContext, ScraperError};
use crate::utils::RunStats;

const OUTPUT_FILE: &str = "ministers.json";

#[derive(Debug, Default)]
pub struct MinistersRun {
    pub catalog: GovernmentCatalog,
    pub failures: usize,
}

impl MinistersRun {
    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats::default();
        stats.record("ministers", self.catalog.ministers.len());
        stats.record("successions", self.catalog.successions.len());
        stats.failures = self.failures;
        stats
    }
}

/// Reads government compositions from Wikipedia, starting at one government
/// and following its infobox links to neighbouring governments once.
pub struct MinistersScraper<'a, B: Browser> {
    ctx: &'a mut RunContext<B>,
}

impl<'a, B: Browser> MinistersScraper<'a, B> {
    pub fn new(ctx: &'a mut RunContext<B>) -> Self {
        Self { ctx }
    }

    pub async fn fetch_government(&mut self, url: &str) -> Result<GovernmentPage, ScraperError> {
        let browser = self.ctx.session.browser()?;
        log::info!("Fetching government page: {}", url);
        self.ctx
            .navigator
            .load(browser, url, &Readiness::DocumentComplete)
            .await?;

        let html = browser.page_source().ok_or(BrowserError::NoDocument)?;
        Ok(parse_government_page(html, url)?)
    }

    pub async fn run(&mut self) -> Result<MinistersRun, ScraperError> {
        let seed = self.ctx.config.government_url.clone();
        let page = self.fetch_government(&seed).await?;
        let mut run = MinistersRun::default();

        for related in &page.related {
            let to = match government_name(related) {
                Ok(name) => name,
                Err(e) => {
                    log::warn!("Skipping related government {}: {}", related, e);
                    continue;
                }
            };
            run.catalog.successions.push(Succession {
                from: page.government.clone(),
                to,
            });

            match self.fetch_government(related).await {
                Ok(neighbour) => run.catalog.ministers.extend(neighbour.ministers),
                Err(e) => {
                    log::error!("Error processing {}: {}", related, e);
                    run.failures += 1;
                }
            }
        }

        let mut ministers = page.ministers;
        ministers.append(&mut run.catalog.ministers);
        run.catalog.ministers = ministers;

        log::info!(
            "Collected {} ministers across {} governments",
            run.catalog.ministers.len(),
            run.catalog.successions.len() + 1
        );
        self.ctx.sink.flush(&run.catalog, OUTPUT_FILE);
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::test_context;
    use crate::ministers::ParseError;
    use crate::sink::read_json;
    use crate::testing::FakeBrowser;

    const AKHANNOUCH_II: &str = "https://fr.wikipedia.org/wiki/Gouvernement_Akhannouch_II";
    const EL_OTHMANI_II: &str = "https://fr.wikipedia.org/wiki/Gouvernement_El_Othmani_II";

    #[tokio::test]
    async fn test_follows_infobox_links_one_hop() {
        let dir = tempfile::tempdir().unwrap();
        let browser = FakeBrowser::new()
            .with_fixture(AKHANNOUCH_II, "ministers/gouvernement_akhannouch_ii.html")
            .with_fixture(EL_OTHMANI_II, "ministers/gouvernement_el_othmani_ii.html");
        let mut ctx = test_context(browser, dir.path());

        let run = MinistersScraper::new(&mut ctx).run().await.unwrap();

        assert_eq!(
            run.catalog.successions,
            vec![Succession {
                from: "Akhannouch II".into(),
                to: "El Othmani II".into(),
            }]
        );
        assert_eq!(run.catalog.ministers.len(), 5);
        assert_eq!(run.catalog.ministers[0].government, "Akhannouch II");
        let last = &run.catalog.ministers[4];
        assert_eq!(last.name, "Saâdeddine El Othmani");
        assert_eq!(last.government, "El Othmani II");
        assert_eq!(run.failures, 0);

        let visits = &ctx.session.browser().unwrap().visits;
        assert_eq!(visits, &vec![AKHANNOUCH_II, EL_OTHMANI_II]);

        let written = read_json(&ctx.sink().path_for(OUTPUT_FILE)).unwrap();
        let back: GovernmentCatalog = serde_json::from_value(written).unwrap();
        assert_eq!(back, run.catalog);
    }

    #[tokio::test]
    async fn test_unreachable_neighbour_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let browser = FakeBrowser::new()
            .with_fixture(AKHANNOUCH_II, "ministers/gouvernement_akhannouch_ii.html");
        let mut ctx = test_context(browser, dir.path());

        let run = MinistersScraper::new(&mut ctx).run().await.unwrap();

        assert_eq!(run.catalog.ministers.len(), 4);
        assert_eq!(run.catalog.successions.len(), 1);
        assert_eq!(run.failures, 1);
        assert_eq!(run.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_seed_must_be_a_government_page() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://fr.wikipedia.org/wiki/Maroc";
        let browser = FakeBrowser::new().with_page(url, "<html><body></body></html>");
        let mut ctx = test_context(browser, dir.path());
        ctx.config.government_url = url.to_string();

        let result = MinistersScraper::new(&mut ctx).run().await;
        assert!(matches!(
            result,
            Err(ScraperError::Parse(ParseError::MissingField(_)))
        ));
    }
}
