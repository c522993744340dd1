use thiserror::Error;

use super::{SheetRow, SheetTable};
use crate::models::video::{parse_count, VideoRecord};

pub const TITLE_COLUMN: &str = "Title/Hook";
pub const CAPTION_COLUMN: &str = "Caption";
pub const VIEWS_COLUMN: &str = "Views (24h)";
pub const LIKES_COLUMN: &str = "Likes";
pub const COMMENTS_COLUMN: &str = "Comments";
pub const SAVES_COLUMN: &str = "Saves";
pub const HASHTAGS_COLUMN: &str = "Hashtags";
pub const NOTES_COLUMN: &str = "Notes (Topic/Emotion)";

pub const REQUIRED_COLUMNS: [&str; 6] = [
    TITLE_COLUMN,
    CAPTION_COLUMN,
    VIEWS_COLUMN,
    LIKES_COLUMN,
    COMMENTS_COLUMN,
    SAVES_COLUMN,
];

pub const VIEWS_TO_LIKES_COLUMN: &str = "Views to Like Ratio (%)";
pub const VIEWS_TO_COMMENTS_COLUMN: &str = "Views to Comment Ratio (%)";
pub const VIEWS_TO_SAVES_COLUMN: &str = "Views to Save Ratio (%)";
pub const LIKES_TO_COMMENTS_COLUMN: &str = "Like to Comment Ratio (%)";
pub const LIKES_TO_SAVES_COLUMN: &str = "Like to Save Ratio (%)";

#[derive(Debug, Error, PartialEq)]
pub enum RowsError {
    #[error("No data found in worksheet")]
    NoData,

    #[error("Worksheet is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
}

/// Required columns absent from the header, in canonical order.
pub fn missing_columns(header: &[String]) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !header.iter().any(|h| h == col))
        .collect()
}

/// Maps one sheet row onto a record. Counters are coerced leniently; ratio
/// columns are carried over only when present and non-blank.
pub fn record_from_row(row: &SheetRow) -> VideoRecord {
    let text = |col: &str| row.get(col).map(|v| v.trim().to_string()).unwrap_or_default();
    let count = |col: &str| row.get(col).map(|v| parse_count(v)).unwrap_or(0.0);
    let ratio = |col: &str| {
        row.get(col)
            .filter(|v| !v.trim().is_empty())
            .map(|v| parse_count(v))
    };

    VideoRecord {
        title: text(TITLE_COLUMN),
        caption: text(CAPTION_COLUMN),
        hashtags: text(HASHTAGS_COLUMN),
        notes: text(NOTES_COLUMN),
        views: count(VIEWS_COLUMN),
        likes: count(LIKES_COLUMN),
        comments: count(COMMENTS_COLUMN),
        saves: count(SAVES_COLUMN),
        views_to_likes: ratio(VIEWS_TO_LIKES_COLUMN),
        views_to_comments: ratio(VIEWS_TO_COMMENTS_COLUMN),
        views_to_saves: ratio(VIEWS_TO_SAVES_COLUMN),
        likes_to_comments: ratio(LIKES_TO_COMMENTS_COLUMN),
        likes_to_saves: ratio(LIKES_TO_SAVES_COLUMN),
    }
}

/// Converts every data row. A worksheet without data rows fails before the
/// header is checked.
pub fn records_from_table(table: &SheetTable) -> Result<Vec<VideoRecord>, RowsError> {
    if table.rows.is_empty() {
        return Err(RowsError::NoData);
    }
    let missing = missing_columns(&table.header);
    if !missing.is_empty() {
        return Err(RowsError::MissingColumns(missing));
    }
    Ok(table.rows.iter().map(record_from_row).collect())
}
