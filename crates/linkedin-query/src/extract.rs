//! Splitting of the free-text `headline` and `location` fields into their parts.
//!
//! Every returned fragment is trimmed and passed through [`sanitize`].

use std::sync::LazyLock;

use regex::Regex;

use crate::utils::sanitize;

/// "Position at Company" (or the German "bei"). The greedy position group
/// makes the rightmost separator win.
static RE_POSITION_COMPANY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<position>.*\S)\s+(?:at|bei)\s+(?P<company>\S.*)")
        .expect("invalid regex: position/company")
});

/// Fallback: everything up to the last space, then the final token.
static RE_POSITION_COMPANY_ALT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<position>.*) (?P<company>\S*)$").expect("invalid regex: position/company alt")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub position: String,
    pub company: String,
}

/// Splits `"City, Country"` on the last comma.
///
/// Returns `None` when there is no comma or nothing in front of it.
pub fn split_location(raw: &str) -> Option<Location> {
    let (city, country) = raw.rsplit_once(',')?;
    let city = sanitize(city.trim());
    if city.is_empty() {
        return None;
    }

    Some(Location {
        city,
        country: sanitize(country.trim()),
    })
}

/// Splits a headline into position and company.
///
/// The headline is reduced to plain text first so that markup around
/// highlighted keywords never offers a split point. Tries the rightmost
/// `at`/`bei` separator, then falls back to the last space. Returns `None`
/// for an empty headline or a single word.
pub fn split_headline(raw: &str) -> Option<Headline> {
    let text = sanitize(raw);
    if text.is_empty() {
        return None;
    }

    let caps = RE_POSITION_COMPANY
        .captures(&text)
        .or_else(|| RE_POSITION_COMPANY_ALT.captures(&text))?;
    let position = caps["position"].trim();
    if position.is_empty() {
        return None;
    }

    Some(Headline {
        position: position.to_string(),
        company: caps["company"].trim().to_string(),
    })
}
