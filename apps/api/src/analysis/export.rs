//! CSV download of a single analysis: the video's sheet columns followed by
//! an `Analysis Report` column.

use anyhow::{Context, Result};

use crate::models::report::Report;
use crate::models::video::VideoRecord;
use crate::sheets::rows::{
    CAPTION_COLUMN, COMMENTS_COLUMN, HASHTAGS_COLUMN, LIKES_COLUMN, LIKES_TO_COMMENTS_COLUMN,
    LIKES_TO_SAVES_COLUMN, NOTES_COLUMN, SAVES_COLUMN, TITLE_COLUMN, VIEWS_COLUMN,
    VIEWS_TO_COMMENTS_COLUMN, VIEWS_TO_LIKES_COLUMN, VIEWS_TO_SAVES_COLUMN,
};

pub const REPORT_COLUMN: &str = "Analysis Report";

const HEADER: [&str; 14] = [
    TITLE_COLUMN,
    CAPTION_COLUMN,
    HASHTAGS_COLUMN,
    NOTES_COLUMN,
    VIEWS_COLUMN,
    LIKES_COLUMN,
    COMMENTS_COLUMN,
    SAVES_COLUMN,
    VIEWS_TO_LIKES_COLUMN,
    VIEWS_TO_COMMENTS_COLUMN,
    VIEWS_TO_SAVES_COLUMN,
    LIKES_TO_COMMENTS_COLUMN,
    LIKES_TO_SAVES_COLUMN,
    REPORT_COLUMN,
];

/// The record a stored report was generated from. Reports whose `query` is
/// not a serialized record fall back to their title and description.
pub fn source_record(report: &Report) -> VideoRecord {
    serde_json::from_str::<VideoRecord>(&report.query).unwrap_or_else(|_| VideoRecord {
        title: report.title.clone(),
        caption: report.description.clone(),
        ..Default::default()
    })
}

/// Header plus one row. Absent ratios are empty cells.
pub fn report_csv(record: &VideoRecord, report: &str) -> Result<Vec<u8>> {
    let ratio = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    let row = [
        record.title.clone(),
        record.caption.clone(),
        record.hashtags.clone(),
        record.notes.clone(),
        record.views.to_string(),
        record.likes.to_string(),
        record.comments.to_string(),
        record.saves.to_string(),
        ratio(record.views_to_likes),
        ratio(record.views_to_comments),
        ratio(record.views_to_saves),
        ratio(record.likes_to_comments),
        ratio(record.likes_to_saves),
        report.to_string(),
    ];

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER).context("Failed to write CSV header")?;
    writer.write_record(&row).context("Failed to write CSV row")?;
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e.error()))
}
