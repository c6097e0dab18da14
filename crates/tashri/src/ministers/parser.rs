use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::types::{GovernmentPage, Minister};
use crate::utils::normalize_whitespace;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse URL: {0}")]
    UrlParse(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
}

const GOVERNMENT_PREFIX: &str = "Gouvernement_";
const ATTACHED_HEADER: &str = "Ministre de rattachement";
const NAME_HEADER: &str = "Nom";
const PARTY_HEADER: &str = "Parti";

fn first_text(element: ElementRef) -> Option<String> {
    element
        .text()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(normalize_whitespace)
}

fn link_text(cell: ElementRef) -> Option<String> {
    let link_sel = Selector::parse("a").unwrap();
    cell.select(&link_sel).find_map(first_text)
}

/// The government a `/wiki/Gouvernement_*` URL refers to, with underscores
/// turned back into spaces.
pub fn government_name(url: &str) -> Result<String, ParseError> {
    let parsed = Url::parse(url).map_err(|e| ParseError::UrlParse(format!("{url}: {e}")))?;
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let decoded = urlencoding::decode(segment)
        .map_err(|e| ParseError::UrlParse(format!("{url}: {e}")))?;

    decoded
        .strip_prefix(GOVERNMENT_PREFIX)
        .map(|name| normalize_whitespace(&name.replace('_', " ")))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ParseError::MissingField(format!("government name in {url}")))
}

fn headers(table: ElementRef) -> Vec<String> {
    let row_sel = Selector::parse("tr").unwrap();
    let th_sel = Selector::parse("th").unwrap();

    table
        .select(&row_sel)
        .next()
        .map(|row| {
            row.select(&th_sel)
                .map(|th| normalize_whitespace(&th.text().collect::<String>()))
                .collect()
        })
        .unwrap_or_default()
}

fn data_rows(table: ElementRef) -> impl Iterator<Item = Vec<ElementRef>> {
    let row_sel = Selector::parse("tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    table
        .select(&row_sel)
        .skip(1)
        .map(move |row| row.select(&td_sel).collect::<Vec<_>>())
        .collect::<Vec<_>>()
        .into_iter()
}

fn position(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Rows of a table listing delegated ministers next to the minister they
/// report to. Name and party cells sit one column right of their headers,
/// after the portrait cell.
fn parse_attached_table(table: ElementRef, headers: &[String], government: &str) -> Vec<Minister> {
    let (Some(attached_col), Some(name_col), Some(party_col)) = (
        position(headers, ATTACHED_HEADER),
        position(headers, NAME_HEADER),
        position(headers, PARTY_HEADER),
    ) else {
        log::warn!("Skipping table without name or party columns");
        return Vec::new();
    };

    data_rows(table)
        .filter_map(|cells| {
            let name = cells.get(name_col + 1).copied().and_then(first_text)?;
            Some(Minister {
                name,
                title: None,
                attached_to: cells.get(attached_col).copied().and_then(first_text),
                party: cells.get(party_col + 1).copied().and_then(first_text),
                government: government.to_string(),
            })
        })
        .collect()
}

/// Rows of the main cabinet table: portfolio in the second column, the
/// minister's link in the fourth and the party link in the fifth.
fn parse_cabinet_table(table: ElementRef, government: &str) -> Vec<Minister> {
    data_rows(table)
        .filter_map(|cells| {
            let name = cells.get(3).copied().and_then(link_text)?;
            Some(Minister {
                name,
                title: cells.get(1).copied().and_then(first_text),
                attached_to: None,
                party: cells.get(4).copied().and_then(link_text),
                government: government.to_string(),
            })
        })
        .collect()
}

fn related_governments(document: &Html, page_url: &str) -> Vec<String> {
    let link_sel =
        Selector::parse(".infobox a[href], .infobox_v2 a[href], .infobox_v3 a[href]").unwrap();
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let own = government_name(page_url).ok();
    let mut seen: Vec<String> = Vec::new();
    let mut related = Vec::new();

    for link in document.select(&link_sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.contains(&format!("/wiki/{GOVERNMENT_PREFIX}")) {
            continue;
        }
        let mut url = match base.join(href) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Skipping infobox link {}: {}", href, e);
                continue;
            }
        };
        url.set_fragment(None);

        let Ok(name) = government_name(url.as_str()) else {
            continue;
        };
        if own.as_ref() == Some(&name) || seen.contains(&name) {
            continue;
        }
        seen.push(name);
        related.push(url.to_string());
    }

    related
}

pub fn parse_government_page(html: &str, url: &str) -> Result<GovernmentPage, ParseError> {
    let government = government_name(url)?;
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table").unwrap();

    let mut ministers = Vec::new();
    for table in document.select(&table_sel) {
        let headers = headers(table);
        if headers.iter().any(|h| h == ATTACHED_HEADER) {
            ministers.extend(parse_attached_table(table, &headers, &government));
        } else if headers.iter().any(|h| h == NAME_HEADER) {
            ministers.extend(parse_cabinet_table(table, &government));
        }
    }

    log::info!("Found {} ministers in {}", ministers.len(), government);
    Ok(GovernmentPage {
        related: related_governments(&document, url),
        government,
        url: url.to_string(),
        ministers,
    })
}
