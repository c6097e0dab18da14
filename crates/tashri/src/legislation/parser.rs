use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::types::{
    BlockCategory, LawType, LegislationLinks, LegislaturePeriod, Outcome, VoteTally,
};
use crate::browser::{BrowserError, Element};
use crate::types::ListingEntry;
use crate::utils::{derive_title_from_url, normalize_whitespace, resolve_url};

const CHAMBER_OFFICE_LABEL: &str = "مكتب مجلس النواب";
const COMMITTEE_LABEL: &str = "اللجنة";
const PLENARY_LABEL: &str = "الجلسة العامة";

const DEPOSIT_MARKER: &str = "تاريخ إحالته على المجلس";
const COMMISSION_MARKER: &str = "تمت إحالته على لجنة";
pub(crate) const VOTE_MARKER: &str = "نتيجة التصويت";

const LAW_LINK: &str = "h3.questionss_group a";
const ADOPTED_COMMISSION: &str = ".lw-link span";
const UNKNOWN_TITLE: &str = "Unknown Title";

const UNANIMOUS: &str = "الإجماع";
const NOBODY: &str = "لا أحد";
const REJECTED: &str = "رفضه مجلس النواب";
const APPROVED: &str = "صادقه مجلس النواب";

static RE_YES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"الموافقون\s*[:：]\s*(\d+)").expect("invalid regex: yes votes")
});

static RE_NO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"المعارضون\s*[:：]\s*(\d+)").expect("invalid regex: no votes")
});

static RE_ABSTAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"الممتنعون\s*[:：]\s*(\d+|لا أحد)").expect("invalid regex: abstentions")
});

static RE_COMMISSION_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)في(?:\s|$)").expect("invalid regex: commission end"));

/// Parses a run of decimal digits, including Arabic-Indic ones.
fn parse_count(digits: &str) -> Option<u32> {
    digits.chars().try_fold(0u32, |acc, c| {
        let d = match c {
            '\u{0660}'..='\u{0669}' => c as u32 - 0x0660,
            '\u{06F0}'..='\u{06F9}' => c as u32 - 0x06F0,
            _ => c.to_digit(10)?,
        };
        acc.checked_mul(10)?.checked_add(d)
    })
}

fn after_marker<'t>(text: &'t str, marker: &str) -> Option<&'t str> {
    text.rfind(marker).map(|pos| &text[pos + marker.len()..])
}

pub fn classify_block(label: &str) -> BlockCategory {
    if label.contains(CHAMBER_OFFICE_LABEL) {
        BlockCategory::ChamberOffice
    } else if label.contains(COMMITTEE_LABEL) {
        BlockCategory::Committee
    } else if label.contains(PLENARY_LABEL) {
        BlockCategory::PlenarySession
    } else {
        BlockCategory::Unrecognized(label.to_string())
    }
}

pub fn parse_deposit_date(text: &str) -> Option<String> {
    let rest = after_marker(text, DEPOSIT_MARKER)?;
    let date = rest.trim_start_matches([':', '：', ' ']).trim();
    (!date.is_empty()).then(|| normalize_whitespace(date))
}

pub fn parse_commission(text: &str) -> Option<String> {
    let rest = after_marker(text, COMMISSION_MARKER)?;
    let name = match RE_COMMISSION_END.find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    };
    let name = normalize_whitespace(name);
    (!name.is_empty()).then_some(name)
}

/// Extracts a vote tally from a plenary-session paragraph.
///
/// Returns `None` when no recognizable phrase is present.
pub fn parse_vote_tally(text: &str) -> Option<VoteTally> {
    let vote_text = after_marker(text, VOTE_MARKER).unwrap_or(text);

    if vote_text.contains(UNANIMOUS) {
        return Some(VoteTally::Unanimous);
    }

    let yes = RE_YES
        .captures(vote_text)
        .and_then(|c| parse_count(&c[1]));
    let no = RE_NO.captures(vote_text).and_then(|c| parse_count(&c[1]));
    let abstain = RE_ABSTAIN.captures(vote_text).and_then(|c| match &c[1] {
        NOBODY => Some(0),
        n => parse_count(n),
    });
    let outcome = if vote_text.contains(REJECTED) {
        Some(Outcome::Rejected)
    } else if vote_text.contains(APPROVED) {
        Some(Outcome::Approved)
    } else {
        None
    };

    if yes.is_none() && no.is_none() && abstain.is_none() && outcome.is_none() {
        return None;
    }

    Some(VoteTally::Counted {
        yes,
        no,
        abstain,
        outcome,
    })
}

pub fn classify_legislation_link(text: &str) -> Option<LawType> {
    if text.contains("مشاريع القوانين") {
        Some(LawType::Projets)
    } else if text.contains("مقترحات القوانين") {
        Some(LawType::Propositions)
    } else if text.contains("النصوص المصادق عليها") {
        Some(LawType::Adopted)
    } else {
        None
    }
}

/// Picks the first menu link for each legislation category.
pub fn parse_legislation_links(links: &[Element], page_url: &str) -> LegislationLinks {
    let mut found = LegislationLinks::default();

    for link in links {
        let text = link.text();
        let Some(law_type) = classify_legislation_link(text) else {
            continue;
        };
        let Some(href) = link.attr("href") else {
            log::warn!("Legislation link '{}' has no href", text);
            continue;
        };
        let slot = found.slot(law_type);
        if slot.is_some() {
            continue;
        }
        match resolve_url(page_url, href) {
            Ok(url) => {
                log::info!("Found {} link: {}", law_type.slug(), url);
                *slot = Some(url);
            }
            Err(e) => log::error!("Error processing link '{}': {}", text, e),
        }
    }

    found
}

/// The first year of a legislature label such as `2021-2026`.
pub fn legislature_start_year(label: &str) -> Option<i32> {
    label.split('-').next()?.trim().parse().ok()
}

/// The adopted-texts listing filtered to one legislature.
pub fn legislature_url(adopted_url: &str, legislature_id: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(adopted_url)?;
    url.query_pairs_mut()
        .clear()
        .append_pair("body_value", "")
        .append_pair("field_legislature_target_id_1", legislature_id)
        .append_pair("field_annee_legislative_target_id", "All")
        .append_pair("field_nature_loi_target_id", "All");
    Ok(url.to_string())
}

fn law_link(item: &Element, page_url: &str) -> Result<(Element, String), BrowserError> {
    let link = item.select_first(LAW_LINK)?;
    let href = link
        .attr("href")
        .filter(|h| !h.is_empty())
        .ok_or_else(|| BrowserError::ElementNotFound(format!("{LAW_LINK}[href]")))?;
    let url = resolve_url(page_url, href)?;
    Ok((link, url))
}

fn title_or_derived(title: Option<String>, url: &str) -> String {
    title
        .filter(|t| !t.is_empty())
        .or_else(|| derive_title_from_url(url))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

/// Reads a bill card from the projets or propositions listings.
pub fn parse_law_entry(item: &Element, page_url: &str) -> Result<ListingEntry, BrowserError> {
    let (link, detail_url) = law_link(item, page_url)?;
    let title = link
        .select("p")?
        .first()
        .map(|p| p.text().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| Some(link.text().to_string()));

    Ok(ListingEntry {
        title: title_or_derived(title, &detail_url),
        detail_url,
    })
}

/// Reads an adopted-text card, returning the entry and its commission.
pub fn parse_adopted_entry(
    item: &Element,
    page_url: &str,
) -> Result<(ListingEntry, Option<String>), BrowserError> {
    let (link, detail_url) = law_link(item, page_url)?;
    let title = title_or_derived(Some(link.text().to_string()), &detail_url);
    let commission = item
        .select(ADOPTED_COMMISSION)?
        .first()
        .map(|span| span.text().to_string())
        .filter(|c| !c.is_empty());

    Ok((ListingEntry { title, detail_url }, commission))
}

/// Legislature filter options starting in or after `min_year`, in page order.
pub fn parse_legislature_periods(
    options: &[Element],
    adopted_url: &str,
    min_year: i32,
) -> Vec<LegislaturePeriod> {
    let mut periods = Vec::new();

    for option in options {
        let Some(value) = option.attr("value").filter(|v| !v.is_empty()) else {
            continue;
        };
        let label = option.text();
        match legislature_start_year(label) {
            Some(year) if year >= min_year => {}
            Some(_) => continue,
            None => {
                log::warn!("Unrecognized legislature option '{}'", label);
                continue;
            }
        }
        match legislature_url(adopted_url, value) {
            Ok(url) => periods.push(LegislaturePeriod {
                label: label.to_string(),
                url,
            }),
            Err(e) => log::error!("Error building URL for legislature {}: {}", label, e),
        }
    }

    periods
}
