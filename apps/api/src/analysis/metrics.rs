//! Metrics Deriver: fills in the five engagement ratios of a `VideoRecord`.
//!
//! Pure and infallible. Ratios the caller already supplied are kept as-is, so
//! deriving twice yields the same record.

use crate::models::video::{sanitize_count, VideoRecord};

/// `numerator / denominator * 100`, rounded to two decimals.
/// A zero denominator yields 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    round2(numerator / denominator * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Returns the record with every missing ratio computed from its counters.
pub fn derive_ratios(mut record: VideoRecord) -> VideoRecord {
    record.views = sanitize_count(record.views);
    record.likes = sanitize_count(record.likes);
    record.comments = sanitize_count(record.comments);
    record.saves = sanitize_count(record.saves);

    let VideoRecord {
        views,
        likes,
        comments,
        saves,
        ..
    } = record;

    record
        .views_to_likes
        .get_or_insert_with(|| ratio(likes, views));
    record
        .views_to_comments
        .get_or_insert_with(|| ratio(comments, views));
    record
        .views_to_saves
        .get_or_insert_with(|| ratio(saves, views));
    record
        .likes_to_comments
        .get_or_insert_with(|| ratio(comments, likes));
    record
        .likes_to_saves
        .get_or_insert_with(|| ratio(saves, likes));

    record
}
