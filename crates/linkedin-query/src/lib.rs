pub mod extract;
mod form;
pub mod output;
pub mod parser;
pub mod record;
pub mod scraper;
pub mod session;
pub mod types;
pub mod utils;

pub use crate::scraper::{RecordPolicy, ScrapeOptions, Scraper, ScraperError};
pub use crate::session::{Credentials, SessionConfig};
pub use crate::types::QueryResult;

pub(crate) const BASE_URL: &str = "https://www.linkedin.com";

pub(crate) const LOGIN_SUBMIT_PATH: &str = "/uas/login-submit";
