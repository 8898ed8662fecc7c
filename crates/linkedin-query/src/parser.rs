//! Locates and decodes the JSON payload embedded in a search results page.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::Value;

use crate::record::RawPerson;

/// Element carrying the payload, historically as an HTML comment.
pub const PAYLOAD_SELECTOR: &str = "#voltron_srp_main-content";

/// JSON pointer from the payload root to the results list.
pub const RESULTS_POINTER: &str = "/content/page/voltron_unified_search_json/search/results";

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Payload element {0} not found in document")]
    MissingElement(&'static str),
    #[error("Payload element {0} has no content")]
    EmptyElement(&'static str),
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Payload has no results list at {0}")]
    MissingResults(&'static str),
}

/// Alternatives are tried left to right at each backslash, so escape pairs
/// stay aligned: a doubled `\\uXXXX`, a plain `\uXXXX`, or any other escape
/// which is copied through as-is.
static RE_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\\\\u([0-9a-fA-F]{4})|\\u([0-9a-fA-F]{4})|\\.")
        .expect("invalid regex: unicode escape")
});

/// Replaces `\uXXXX` escapes (including doubled ones) by the characters they
/// stand for, so the result parses as the text upstream meant to send.
///
/// Code points that may not appear raw inside a JSON string (quote,
/// backslash, control characters) and surrogate halves are emitted as a single
/// JSON escape instead and left to the JSON parser.
pub fn repair_unicode_escapes(raw: &str) -> String {
    RE_ESCAPE
        .replace_all(raw, |caps: &Captures| {
            let Some(hex) = caps.get(1).or_else(|| caps.get(2)) else {
                return caps[0].to_string();
            };
            let decoded = u32::from_str_radix(hex.as_str(), 16)
                .ok()
                .and_then(char::from_u32)
                .filter(|c| !matches!(c, '"' | '\\') && !c.is_control());
            match decoded {
                Some(c) => c.to_string(),
                None => format!("\\u{}", hex.as_str()),
            }
        })
        .into_owned()
}

/// Text of the payload element's first meaningful child node.
fn payload_text(document: &Html) -> Result<String, PayloadError> {
    let selector = Selector::parse(PAYLOAD_SELECTOR).unwrap();
    let element = document
        .select(&selector)
        .next()
        .ok_or(PayloadError::MissingElement(PAYLOAD_SELECTOR))?;

    let child = element
        .children()
        .find(|node| !matches!(node.value(), Node::Text(t) if t.trim().is_empty()))
        .ok_or(PayloadError::EmptyElement(PAYLOAD_SELECTOR))?;

    let text = match child.value() {
        Node::Comment(comment) => (**comment).to_string(),
        Node::Text(text) => (**text).to_string(),
        Node::Element(_) => ElementRef::wrap(child)
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default(),
        _ => String::new(),
    };

    if text.trim().is_empty() {
        return Err(PayloadError::EmptyElement(PAYLOAD_SELECTOR));
    }
    Ok(text)
}

/// Decodes the payload of a search results page into its tree.
pub fn parse_payload(html: &str) -> Result<Value, PayloadError> {
    let document = Html::parse_document(html);
    let raw = payload_text(&document)?;
    let repaired = repair_unicode_escapes(&raw);

    serde_json::from_str::<Value>(&repaired)
        .inspect_err(|e| {
            log::debug!(
                "Payload JSON rejected at line {} column {}",
                e.line(),
                e.column()
            )
        })
        .map_err(PayloadError::from)
}

/// Person records from the results list, in page order.
///
/// Entries without a `person` object (ads, suggestions, groups) are dropped.
pub fn people_from_payload(mut payload: Value) -> Result<Vec<RawPerson>, PayloadError> {
    let results = match payload.pointer_mut(RESULTS_POINTER).map(Value::take) {
        Some(Value::Array(results)) => results,
        _ => return Err(PayloadError::MissingResults(RESULTS_POINTER)),
    };
    let total = results.len();

    let people: Vec<RawPerson> = results
        .into_iter()
        .filter_map(|mut entry| match entry.get_mut("person").map(Value::take) {
            Some(Value::Object(person)) => Some(RawPerson::new(person)),
            _ => None,
        })
        .collect();

    log::debug!(
        "Payload holds {} result(s), {} of them people",
        total,
        people.len()
    );
    Ok(people)
}

/// Locates, repairs and walks the payload of a search results page.
pub fn extract_results(html: &str) -> Result<Vec<RawPerson>, PayloadError> {
    people_from_payload(parse_payload(html)?)
}
