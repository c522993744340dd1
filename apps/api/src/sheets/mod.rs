//! Tabular data source: read-only access to a Google Sheets worksheet.
//!
//! `parse_sheet_url` opens a sheet reference from its URL, a `SheetSource`
//! reads a worksheet as a header plus header-keyed rows, and
//! `rows::records_from_table` turns those rows into `VideoRecord`s.

pub mod handlers;
pub mod rows;

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEET_URL_PREFIX: &str = "https://docs.google.com/spreadsheets/d/";

/// One worksheet row keyed by header name.
pub type SheetRow = HashMap<String, String>;

/// A worksheet as read: the header row, kept even when no data follows it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub header: Vec<String>,
    pub rows: Vec<SheetRow>,
}

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Invalid Google Sheet URL: {0}")]
    InvalidUrl(String),

    #[error("Worksheet '{0}' not found")]
    WorksheetNotFound(String),

    #[error("Google Sheets API key is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// An opened spreadsheet, identified by the id embedded in its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetRef {
    pub id: String,
    pub url: String,
}

/// Accepts `https://docs.google.com/spreadsheets/d/<id>/edit...` or `/view...`.
pub fn parse_sheet_url(url: &str) -> Result<SpreadsheetRef, SheetsError> {
    let url = url.trim();
    let invalid = || SheetsError::InvalidUrl(url.to_string());

    let rest = url.strip_prefix(SHEET_URL_PREFIX).ok_or_else(invalid)?;
    let (id, tail) = rest.split_once('/').ok_or_else(invalid)?;

    let id_ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !id_ok || !(tail.starts_with("edit") || tail.starts_with("view")) {
        return Err(invalid());
    }

    Ok(SpreadsheetRef {
        id: id.to_string(),
        url: url.to_string(),
    })
}

#[async_trait]
pub trait SheetSource: Send + Sync {
    /// The header and all data rows of `worksheet`; the first sheet row is the header.
    async fn read_rows(
        &self,
        sheet: &SpreadsheetRef,
        worksheet: &str,
    ) -> Result<SheetTable, SheetsError>;
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Reads worksheets through the Sheets v4 `values.get` endpoint using an API key.
pub struct GoogleSheetsClient {
    client: Client,
    api_key: Option<String>,
}

impl GoogleSheetsClient {
    pub fn new(api_key: Option<String>) -> Result<Self, SheetsError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            api_key,
        })
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn read_rows(
        &self,
        sheet: &SpreadsheetRef,
        worksheet: &str,
    ) -> Result<SheetTable, SheetsError> {
        let api_key = self.api_key.as_deref().ok_or(SheetsError::NotConfigured)?;

        let mut url = reqwest::Url::parse(SHEETS_API_URL)
            .map_err(|_| SheetsError::InvalidUrl(SHEETS_API_URL.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(SHEETS_API_URL.to_string()))?
            .push(&sheet.id)
            .push("values")
            .push(worksheet);

        let response = self
            .client
            .get(url)
            .query(&[("key", api_key), ("valueRenderOption", "FORMATTED_VALUE")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            // An unknown tab name surfaces as a range parse failure.
            if status == StatusCode::BAD_REQUEST && message.contains("Unable to parse range") {
                warn!("Worksheet '{worksheet}' not found in sheet {}", sheet.id);
                return Err(SheetsError::WorksheetNotFound(worksheet.to_string()));
            }
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let range: ValueRange = response.json().await?;
        debug!(
            "Read {} raw rows from worksheet '{worksheet}'",
            range.values.len()
        );
        Ok(table_from_values(range.values))
    }
}

/// First row is the header. Short rows are padded with empty cells; blank
/// header cells are dropped.
pub fn table_from_values(values: Vec<Vec<String>>) -> SheetTable {
    let mut iter = values.into_iter();
    let Some(header) = iter.next() else {
        return SheetTable::default();
    };
    let header: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();

    let rows = iter
        .map(|cells| {
            header
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty())
                .map(|(i, name)| (name.clone(), cells.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect();

    SheetTable {
        header: header.into_iter().filter(|h| !h.is_empty()).collect(),
        rows,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves a fixed table and remembers which worksheet was requested.
    pub(crate) struct StaticSheet {
        pub table: SheetTable,
        pub requested: Mutex<Vec<String>>,
    }

    impl StaticSheet {
        pub(crate) fn from_values(values: Vec<Vec<&str>>) -> Self {
            let values = values
                .into_iter()
                .map(|row| row.into_iter().map(str::to_string).collect())
                .collect();
            Self {
                table: table_from_values(values),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SheetSource for StaticSheet {
        async fn read_rows(
            &self,
            _sheet: &SpreadsheetRef,
            worksheet: &str,
        ) -> Result<SheetTable, SheetsError> {
            self.requested.lock().unwrap().push(worksheet.to_string());
            if worksheet == "Missing" {
                return Err(SheetsError::WorksheetNotFound(worksheet.to_string()));
            }
            Ok(self.table.clone())
        }
    }

    #[test]
    fn test_parse_valid_urls() {
        let sheet =
            parse_sheet_url("https://docs.google.com/spreadsheets/d/1AbC-d_9/edit#gid=0").unwrap();
        assert_eq!(sheet.id, "1AbC-d_9");
        assert!(parse_sheet_url("https://docs.google.com/spreadsheets/d/xyz/view").is_ok());
    }

    #[test]
    fn test_parse_rejects_other_urls() {
        for url in [
            "https://example.com/spreadsheets/d/abc/edit",
            "https://docs.google.com/spreadsheets/d/abc",
            "https://docs.google.com/spreadsheets/d/abc/copy",
            "https://docs.google.com/spreadsheets/d//edit",
            "https://docs.google.com/spreadsheets/d/a b/edit",
        ] {
            assert!(
                matches!(parse_sheet_url(url), Err(SheetsError::InvalidUrl(_))),
                "{url}"
            );
        }
    }

    #[test]
    fn test_table_from_values_pads_short_rows() {
        let table = table_from_values(vec![
            vec!["Title/Hook".into(), "Views (24h)".into(), "".into()],
            vec!["Hook one".into()],
            vec!["Hook two".into(), "500".into(), "ignored".into()],
        ]);
        assert_eq!(table.header, vec!["Title/Hook", "Views (24h)"]);
        let rows = &table.rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Title/Hook"], "Hook one");
        assert_eq!(rows[0]["Views (24h)"], "");
        assert_eq!(rows[1]["Views (24h)"], "500");
        assert_eq!(rows[1].len(), 2);
    }

    #[test]
    fn test_table_from_empty_sheet() {
        assert_eq!(table_from_values(Vec::new()), SheetTable::default());
    }

    #[test]
    fn test_header_kept_without_data_rows() {
        let table = table_from_values(vec![vec!["Title/Hook".into(), "Caption".into()]]);
        assert_eq!(table.header, vec!["Title/Hook", "Caption"]);
        assert!(table.rows.is_empty());
    }

    #[tokio::test]
    async fn test_client_without_key_is_not_configured() {
        let client = GoogleSheetsClient::new(None).unwrap();
        let sheet = parse_sheet_url("https://docs.google.com/spreadsheets/d/abc/edit").unwrap();
        let err = client.read_rows(&sheet, "Account A Data").await.unwrap_err();
        assert!(matches!(err, SheetsError::NotConfigured));
    }
}
