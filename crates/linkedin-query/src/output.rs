//! Text renderings of a result list: CSV, JSON and YAML.

use std::fmt::Display;
use std::str::FromStr;

use serde::Serialize;

use crate::types::QueryResult;

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid output format '{0}'. Accepted values: 'csv', 'json', 'yaml'")]
pub struct OutputFormatParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = OutputFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(OutputFormatParseError(s.to_string())),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub include_pictures: bool,
    pub csv_separator: char,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            include_pictures: false,
            csv_separator: ',',
        }
    }
}

/// The serialized shape of a result. `profile_picture` is present exactly
/// when pictures are enabled.
#[derive(Serialize)]
struct OutputRecord<'a> {
    first_name: &'a str,
    last_name: &'a str,
    position: &'a str,
    company: &'a str,
    city: &'a str,
    country: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_picture: Option<&'a str>,
}

impl<'a> OutputRecord<'a> {
    fn new(result: &'a QueryResult, include_pictures: bool) -> Self {
        Self {
            first_name: &result.first_name,
            last_name: &result.last_name,
            position: &result.position,
            company: &result.company,
            city: &result.city,
            country: &result.country,
            profile_picture: include_pictures
                .then(|| result.profile_picture.as_deref().unwrap_or_default()),
        }
    }

    fn row(&self) -> Vec<&'a str> {
        let mut row = vec![
            self.first_name,
            self.last_name,
            self.position,
            self.company,
            self.city,
            self.country,
        ];
        row.extend(self.profile_picture);
        row
    }
}

pub fn render(
    results: &[QueryResult],
    format: OutputFormat,
    options: &OutputOptions,
) -> Result<String, OutputError> {
    let records: Vec<OutputRecord> = results
        .iter()
        .map(|r| OutputRecord::new(r, options.include_pictures))
        .collect();

    Ok(match format {
        OutputFormat::Csv => to_csv(&records, options.csv_separator),
        OutputFormat::Json => serde_json::to_string(&records)?,
        OutputFormat::Yaml => serde_yaml::to_string(&records)?,
    })
}

fn to_csv(records: &[OutputRecord], sep: char) -> String {
    let mut out = String::new();
    for record in records {
        let cells: Vec<String> = record.row().into_iter().map(|c| csv_cell(c, sep)).collect();
        out.push_str(&cells.join(&sep.to_string()));
        out.push('\n');
    }
    out
}

fn csv_cell(cell: &str, sep: char) -> String {
    if cell.contains(sep) || cell.contains(['"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
