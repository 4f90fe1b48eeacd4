//! Export pipeline: renders an already-fetched slice of asset records into
//! a downloadable byte buffer, one writer per format.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::model::AssetRecord;

pub mod csv_writer;
pub mod html_report;
pub mod json_writer;

pub use csv_writer::{write_csv, ASSET_COLUMNS};
pub use html_report::write_html_report;
pub use json_writer::write_json;

/// Supported download formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Json,
    Html,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "html" => Ok(ExportFormat::Html),
            other => Err(CoreError::UnknownFormat(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Html => "text/html; charset=utf-8",
        }
    }
}

/// Render records in the requested format. CSV and JSON emit one output row
/// per input record; HTML renders the summary report around the same rows.
pub fn export_assets(records: &[AssetRecord], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => write_csv(records),
        ExportFormat::Json => write_json(records),
        ExportFormat::Html => write_html_report(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("csv").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse("html").unwrap(), ExportFormat::Html);
        assert!(ExportFormat::parse("xlsx").is_err());
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert!(ExportFormat::Csv.content_type().starts_with("text/csv"));
        assert_eq!(ExportFormat::Json.content_type(), "application/json");
    }
}
