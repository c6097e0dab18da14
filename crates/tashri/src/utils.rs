use std::borrow::Cow;

use url::Url;

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves `href` against the page it was found on.
pub fn resolve_url(base: &str, href: &str) -> Result<String, url::ParseError> {
    if href.starts_with("http") {
        return Ok(href.to_string());
    }
    Ok(Url::parse(base)?.join(href)?.to_string())
}

/// Returns `url` with `name` set to `value`, replacing any existing value.
pub fn with_query_param(url: &str, name: &str, value: &str) -> Result<String, url::ParseError> {
    let mut parsed = Url::parse(url)?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| k != name)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = parsed.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(name, value);
    }

    Ok(parsed.to_string())
}

/// Decodes the trailing path segment of `url`, used when a listing link
/// carries no visible title.
pub fn derive_title_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.rfind(|s| !s.is_empty())?;

    let decoded = match urlencoding::decode(segment) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(e) => {
            log::warn!("Could not decode title from {}: {}", url, e);
            segment.to_string()
        }
    };

    let title = normalize_whitespace(&decoded);
    (!title.is_empty()).then_some(title)
}

#[derive(Debug, Default)]
pub struct RunStats {
    pub categories: Vec<(String, usize)>,
    pub failures: usize,
}

impl RunStats {
    pub fn record(&mut self, category: impl Into<String>, count: usize) {
        self.categories.push((category.into(), count));
    }

    pub fn total(&self) -> usize {
        self.categories.iter().map(|(_, n)| n).sum()
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        for (category, count) in &self.categories {
            writeln!(f, "  {:<28}{}", format!("{category}:"), count)?;
        }
        if self.failures > 0 {
            writeln!(f, "  {:<28}{}", "Failed extractions:", self.failures)?;
        }
        writeln!(f, "  {:<28}{}", "Total:", self.total())
    }
}
