use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// One normalized person from a search results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub company: String,
    pub city: String,
    pub country: String,
    /// Only `Some` when pictures were requested, possibly holding an empty string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl Display for QueryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)?;
        match (self.position.is_empty(), self.company.is_empty()) {
            (false, false) => write!(f, " ({} at {})", self.position, self.company)?,
            (false, true) => write!(f, " ({})", self.position)?,
            (true, false) => write!(f, " ({})", self.company)?,
            (true, true) => {}
        }
        write!(f, ", {}, {}", self.city, self.country)
    }
}
