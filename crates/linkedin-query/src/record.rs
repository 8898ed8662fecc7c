//! Weakly-typed person records from the search payload and their normalization.

use serde_json::{Map, Value};

use crate::extract::{split_headline, split_location};
use crate::types::QueryResult;
use crate::utils::sanitize;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Record {id} has no location")]
    MissingLocation { id: String },
    #[error("Record {id} has an unparsable location: {location:?}")]
    UnparsableLocation { id: String, location: String },
}

/// A `person` object exactly as it appears in the payload.
///
/// No key is assumed to exist; every accessor checks presence and type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawPerson(Map<String, Value>);

impl RawPerson {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// A string field, treating empty strings like missing ones.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// The record id, which upstream sends either as a number or a string.
    pub fn id(&self) -> String {
        match self.0.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// `logo_result_base.media_picture_link_400`, if present.
    pub fn picture(&self) -> Option<&str> {
        self.0
            .get("logo_result_base")?
            .get("media_picture_link_400")?
            .as_str()
    }

    /// Builds the typed result. `include_picture` decides whether
    /// `profile_picture` is populated at all.
    pub fn normalize(&self, include_picture: bool) -> Result<QueryResult, RecordError> {
        let first_name = ["firstName", "fmt_name"]
            .into_iter()
            .filter_map(|key| self.text(key).map(sanitize))
            .find(|name| !name.is_empty())
            .unwrap_or_else(|| format!("User id: {}", self.id()));
        let last_name = self.text("lastName").map(sanitize).unwrap_or_default();

        let (position, company) = match self.text("fmt_headline").and_then(split_headline) {
            Some(headline) => (headline.position, headline.company),
            None => (
                self.text("fmt_industry").map(sanitize).unwrap_or_default(),
                String::new(),
            ),
        };

        let raw_location = self
            .text("fmt_location")
            .ok_or_else(|| RecordError::MissingLocation { id: self.id() })?;
        let location =
            split_location(raw_location).ok_or_else(|| RecordError::UnparsableLocation {
                id: self.id(),
                location: raw_location.to_string(),
            })?;

        let profile_picture =
            include_picture.then(|| self.picture().unwrap_or_default().to_string());

        Ok(QueryResult {
            first_name,
            last_name,
            position,
            company,
            city: location.city,
            country: location.country,
            profile_picture,
        })
    }
}

impl From<Map<String, Value>> for RawPerson {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawPerson {
        match value {
            Value::Object(map) => RawPerson::new(map),
            other => panic!("fixture must be an object, got {other}"),
        }
    }

    fn full_person() -> RawPerson {
        raw(json!({
            "id": 42,
            "firstName": "Ada",
            "lastName": "Lovelace",
            "fmt_name": "Ada Lovelace",
            "fmt_headline": "Chief <strong class=\"highlight\">Engineer</strong> at Analytical Engines",
            "fmt_location": "London, United Kingdom",
            "fmt_industry": "Computer Software",
            "logo_result_base": {
                "media_picture_link_400": "https://media.example.com/ada_400.jpg"
            }
        }))
    }

    #[test]
    fn test_normalize_full_record() {
        let result = full_person().normalize(true).unwrap();

        assert_eq!(result.first_name, "Ada");
        assert_eq!(result.last_name, "Lovelace");
        assert_eq!(result.position, "Chief Engineer");
        assert_eq!(result.company, "Analytical Engines");
        assert_eq!(result.city, "London");
        assert_eq!(result.country, "United Kingdom");
        assert_eq!(
            result.profile_picture.as_deref(),
            Some("https://media.example.com/ada_400.jpg")
        );
    }

    #[test]
    fn test_normalize_without_pictures_omits_picture() {
        let result = full_person().normalize(false).unwrap();
        assert_eq!(result.profile_picture, None);
    }

    #[test]
    fn test_normalize_missing_picture_is_empty_not_error() {
        let person = raw(json!({
            "id": 1,
            "firstName": "Grace",
            "fmt_location": "Arlington, United States"
        }));
        let result = person.normalize(true).unwrap();
        assert_eq!(result.profile_picture.as_deref(), Some(""));
    }

    #[test]
    fn test_first_name_fallbacks() {
        let by_fmt_name = raw(json!({
            "id": 7,
            "firstName": "",
            "fmt_name": "Linus T.",
            "fmt_location": "Portland, United States"
        }));
        assert_eq!(by_fmt_name.normalize(false).unwrap().first_name, "Linus T.");

        let by_id = raw(json!({ "id": 9001, "fmt_location": "Oslo, Norway" }));
        let result = by_id.normalize(false).unwrap();
        assert_eq!(result.first_name, "User id: 9001");
        assert_eq!(result.last_name, "");

        let string_id = raw(json!({ "id": "abc", "fmt_location": "Oslo, Norway" }));
        assert_eq!(string_id.normalize(false).unwrap().first_name, "User id: abc");
    }

    #[test]
    fn test_position_falls_back_to_industry() {
        let person = raw(json!({
            "id": 3,
            "firstName": "Ken",
            "fmt_headline": "Retired",
            "fmt_industry": "Research &amp; Development",
            "fmt_location": "Murray Hill, United States"
        }));
        let result = person.normalize(false).unwrap();
        assert_eq!(result.position, "Research & Development");
        assert_eq!(result.company, "");
    }

    #[test]
    fn test_position_empty_without_headline_or_industry() {
        let person = raw(json!({ "id": 3, "fmt_location": "Bern, Switzerland" }));
        let result = person.normalize(false).unwrap();
        assert_eq!(result.position, "");
        assert_eq!(result.company, "");
    }

    #[test]
    fn test_missing_location_is_error() {
        let person = raw(json!({ "id": 5, "firstName": "Nobody" }));
        let err = person.normalize(false).unwrap_err();
        assert!(matches!(err, RecordError::MissingLocation { ref id } if id == "5"));
    }

    #[test]
    fn test_unparsable_location_is_error() {
        let person = raw(json!({ "id": 6, "firstName": "Nomad", "fmt_location": "Worldwide" }));
        let err = person.normalize(false).unwrap_err();
        assert!(matches!(
            err,
            RecordError::UnparsableLocation { ref location, .. } if location == "Worldwide"
        ));
    }

    #[test]
    fn test_non_string_fields_are_ignored() {
        let person = raw(json!({
            "id": 8,
            "firstName": null,
            "lastName": 12,
            "fmt_name": "Fallback",
            "fmt_location": "Paris, France",
            "logo_result_base": "not-an-object"
        }));
        let result = person.normalize(true).unwrap();
        assert_eq!(result.first_name, "Fallback");
        assert_eq!(result.last_name, "");
        assert_eq!(result.profile_picture.as_deref(), Some(""));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let person = full_person();
        assert_eq!(person.normalize(true).unwrap(), person.normalize(true).unwrap());
    }

    #[test]
    fn test_highlighted_single_word_headline_falls_back_to_industry() {
        let person = raw(json!({
            "id": 11,
            "firstName": "Barbara",
            "fmt_headline": "<strong class=\"highlight\">Engineer</strong>",
            "fmt_industry": "Software",
            "fmt_location": "Boston, United States"
        }));
        let result = person.normalize(false).unwrap();
        assert_eq!(result.position, "Software");
        assert_eq!(result.company, "");
    }

    #[test]
    fn test_highlighted_headline_fallback_is_plain_text() {
        let person = raw(json!({
            "id": 12,
            "firstName": "Edsger",
            "fmt_headline": "Senior <strong class=\"highlight\">Engineer</strong>",
            "fmt_location": "Austin, United States"
        }));
        let result = person.normalize(false).unwrap();
        assert_eq!(result.position, "Senior");
        assert_eq!(result.company, "Engineer");
    }

    #[test]
    fn test_first_name_empty_after_sanitizing_falls_through() {
        let by_fmt_name = raw(json!({
            "id": 13,
            "firstName": "<b></b>",
            "fmt_name": "Margaret H.",
            "fmt_location": "Cambridge, United States"
        }));
        assert_eq!(by_fmt_name.normalize(false).unwrap().first_name, "Margaret H.");

        let by_id = raw(json!({
            "id": 14,
            "firstName": "<b></b>",
            "fmt_name": "<script>x()</script>",
            "fmt_location": "Cambridge, United States"
        }));
        assert_eq!(by_id.normalize(false).unwrap().first_name, "User id: 14");
    }
}
