use std::time::Duration;

use crate::parser::{PayloadError, extract_results};
use crate::record::RecordError;
use crate::session::{Credentials, Session, SessionConfig, SessionError};
use crate::types::QueryResult;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] PayloadError),
    #[error("Malformed record: {0}")]
    MalformedRecord(#[from] RecordError),
}

/// What to do with a result whose mandatory fields cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordPolicy {
    /// Fail the whole query with [`ScraperError::MalformedRecord`].
    #[default]
    Abort,
    /// Log a warning and leave the record out of the results.
    Skip,
}

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub include_pictures: bool,
    pub timeout: Duration,
    pub record_policy: RecordPolicy,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            include_pictures: false,
            timeout: Duration::from_secs(5),
            record_policy: RecordPolicy::Abort,
        }
    }
}

/// Runs people searches on behalf of one account.
///
/// Logs in once, on [`Scraper::login`] or the first [`Scraper::scrape`], and
/// reuses that session for every later query.
#[derive(Debug)]
pub struct Scraper {
    config: SessionConfig,
    credentials: Credentials,
    options: ScrapeOptions,
    session: Option<Session>,
}

impl Scraper {
    pub fn new(credentials: Credentials, options: ScrapeOptions) -> Self {
        let config = SessionConfig {
            timeout: options.timeout,
            ..SessionConfig::default()
        };

        Self {
            config,
            credentials,
            options,
            session: None,
        }
    }

    /// Points the scraper at another site root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn options(&self) -> &ScrapeOptions {
        &self.options
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Authenticates unless a session already exists. A failed login leaves
    /// the scraper unauthenticated.
    pub async fn login(&mut self) -> Result<&mut Session, ScraperError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => Session::authenticate(&self.config, &self.credentials).await?,
        };
        Ok(self.session.insert(session))
    }

    /// Searches for `query` and returns the people found, in page order.
    pub async fn scrape(&mut self, query: &str) -> Result<Vec<QueryResult>, ScraperError> {
        let options = self.options.clone();
        let session = self.login().await?;
        let page = session.search(query).await?;
        results_from_document(&page.html, &options)
    }
}

/// Extracts and normalizes the people of an already fetched results page.
pub fn results_from_document(
    html: &str,
    options: &ScrapeOptions,
) -> Result<Vec<QueryResult>, ScraperError> {
    let people = extract_results(html)?;

    let mut results = Vec::with_capacity(people.len());
    for person in &people {
        match person.normalize(options.include_pictures) {
            Ok(result) => {
                log::debug!("Parsed {}", result);
                results.push(result);
            }
            Err(e) if options.record_policy == RecordPolicy::Skip => {
                log::warn!("Skipping record: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    log::info!("Parsed {} of {} people", results.len(), people.len());
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> String {
        fs::read_to_string("fixtures/search_results.html").expect("Failed to read fixture")
    }

    fn page_with_people(people: &str) -> String {
        format!(
            r#"<code id="voltron_srp_main-content"><!--{{"content":{{"page":{{"voltron_unified_search_json":{{"search":{{"results":[{people}]}}}}}}}}}}--></code>"#
        )
    }

    #[test]
    fn test_results_from_fixture() {
        let results = results_from_document(&fixture(), &ScrapeOptions::default())
            .expect("Failed to parse results");

        assert_eq!(results.len(), 3);

        let ada = &results[0];
        assert_eq!(ada.first_name, "Ada");
        assert_eq!(ada.last_name, "Lovelace");
        assert_eq!(ada.position, "Chief Engineer");
        assert_eq!(ada.company, "Analytical Engines");
        assert_eq!(ada.city, "London");
        assert_eq!(ada.country, "United Kingdom");
        assert_eq!(ada.profile_picture, None);

        let rene = &results[1];
        assert_eq!(rene.first_name, "René");
        assert_eq!(rene.last_name, "Müller");
        assert_eq!(rene.position, "Senior Software Engineer");
        assert_eq!(rene.company, "Beispiel AG");
        assert_eq!(rene.city, "Zürich Area");
        assert_eq!(rene.country, "Switzerland");

        let doe = &results[2];
        assert_eq!(doe.first_name, "J. Doe");
        assert_eq!(doe.last_name, "");
        assert_eq!(doe.position, "Freelance");
        assert_eq!(doe.company, "Platform-Engineer");
        assert_eq!(doe.city, "Greater New York City Area, NY");
        assert_eq!(doe.country, "United States");
    }

    #[test]
    fn test_results_with_pictures() {
        let options = ScrapeOptions {
            include_pictures: true,
            ..ScrapeOptions::default()
        };
        let results = results_from_document(&fixture(), &options).unwrap();

        assert!(results.iter().all(|r| r.profile_picture.is_some()));
        assert_eq!(
            results[0].profile_picture.as_deref(),
            Some("https://media.licdn.example/mpr/shrink_400_400/ada.jpg")
        );
        assert_eq!(results[1].profile_picture.as_deref(), Some(""));
    }

    #[test]
    fn test_malformed_record_aborts_by_default() {
        let html = page_with_people(
            r#"{"person":{"id":1,"firstName":"A","fmt_location":"Oslo, Norway"}},
               {"person":{"id":2,"firstName":"B","fmt_location":"Somewhere"}}"#,
        );
        let err = results_from_document(&html, &ScrapeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::MalformedRecord(RecordError::UnparsableLocation { .. })
        ));
    }

    #[test]
    fn test_malformed_record_skipped_when_configured() {
        let html = page_with_people(
            r#"{"person":{"id":1,"firstName":"A","fmt_location":"Oslo, Norway"}},
               {"person":{"id":2,"firstName":"B"}},
               {"person":{"id":3,"firstName":"C","fmt_location":"Lima, Peru"}}"#,
        );
        let options = ScrapeOptions {
            record_policy: RecordPolicy::Skip,
            ..ScrapeOptions::default()
        };
        let results = results_from_document(&html, &options).unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.first_name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_malformed_payload_is_not_empty_result() {
        let html = r#"<code id="voltron_srp_main-content"><!--{"content":{"page":--></code>"#;
        let err = results_from_document(html, &ScrapeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::MalformedPayload(PayloadError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_new_scraper_is_unauthenticated() {
        let scraper = Scraper::new(Credentials::new("ada", "secret"), ScrapeOptions::default());
        assert!(!scraper.is_authenticated());
    }
}
