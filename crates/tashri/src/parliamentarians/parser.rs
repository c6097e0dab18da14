use super::types::Parliamentarian;
use crate::browser::{BrowserError, Element};

const NAME: &str = "span.q-name > a";
const PARTY: &str = "span:nth-child(2)";
const FUNCTION: &str = "a:nth-child(3) > span";

fn required_text(card: &Element, selector: &str) -> Result<String, BrowserError> {
    let text = card.select_first(selector)?.text().to_string();
    if text.is_empty() {
        return Err(BrowserError::ElementNotFound(format!("{selector} (empty)")));
    }
    Ok(text)
}

/// Reads one member card of the directory. Every field is required.
pub fn parse_card(card: &Element, _page_url: &str) -> Result<Parliamentarian, BrowserError> {
    Ok(Parliamentarian {
        name: required_text(card, NAME)?,
        party: required_text(card, PARTY)?,
        function: required_text(card, FUNCTION)?,
        term: None,
    })
}
