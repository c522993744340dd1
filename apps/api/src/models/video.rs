use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One analyzed video: raw engagement counters plus the five derived ratios.
///
/// Ratios are percentages. They stay `None` until either the caller supplies
/// them or `analysis::metrics::derive_ratios` fills them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoRecord {
    pub title: String,
    pub caption: String,
    pub hashtags: String,
    pub notes: String,
    #[serde(deserialize_with = "lenient_count")]
    pub views: f64,
    #[serde(deserialize_with = "lenient_count")]
    pub likes: f64,
    #[serde(deserialize_with = "lenient_count")]
    pub comments: f64,
    #[serde(deserialize_with = "lenient_count")]
    pub saves: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views_to_likes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views_to_comments: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views_to_saves: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes_to_comments: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes_to_saves: Option<f64>,
}

/// Coerces a free-form cell into a non-negative counter.
///
/// Accepts `"1,234"`, `" 12 "` and `"5.5%"`. Anything unparseable, negative,
/// or non-finite becomes 0.
pub fn parse_count(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    cleaned.parse::<f64>().map(sanitize_count).unwrap_or(0.0)
}

/// Clamps NaN, infinities and negatives to 0.
pub fn sanitize_count(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().map(sanitize_count).unwrap_or(0.0),
        Value::String(s) => parse_count(&s),
        _ => 0.0,
    })
}
