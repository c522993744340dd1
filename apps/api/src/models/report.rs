use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A persisted analysis report, in its canonical in-memory form.
///
/// `created_at` is always normalized; backend-specific timestamp shapes never
/// leave the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub description: String,
    /// JSON-encoded `VideoRecord` the report was generated from.
    pub query: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Current time at millisecond precision, which survives the epoch-seconds
    /// float written to backends.
    pub fn timestamp_now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }

    /// The document written to every backend.
    pub fn to_document(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "description": self.description,
            "query": self.query,
            "content": self.content,
            "created_at": epoch_seconds(&self.created_at),
        })
    }
}

/// A report document as read back from a backend. Any `id` in the body is
/// ignored; the document key is the id.
#[derive(Debug, Deserialize)]
pub struct StoredReport {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub query: String,
    #[serde(default, alias = "metrics")]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<RawTimestamp>,
}

impl StoredReport {
    /// Converts to the canonical form under `key`, the document key the
    /// backend fetches and removes by.
    pub fn into_report(self, key: &str) -> Report {
        Report {
            id: key.to_string(),
            title: self.title,
            description: self.description,
            query: self.query,
            content: self.content,
            created_at: self
                .created_at
                .and_then(|ts| ts.normalize())
                .unwrap_or_default(),
        }
    }
}

/// Every `created_at` representation found in stored reports.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Epoch(f64),
    Text(String),
    Structured(StructuredTimestamp),
    /// e.g. an unresolved `{".sv": "timestamp"}` server sentinel.
    Other(Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructuredTimestamp {
    #[serde(alias = "_seconds")]
    pub seconds: i64,
    #[serde(default, alias = "_nanoseconds", alias = "nanos")]
    pub nanoseconds: u32,
}

// Epoch values above this are milliseconds (server-resolved timestamps).
const MILLIS_THRESHOLD: f64 = 1e11;

impl RawTimestamp {
    pub fn normalize(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Epoch(value) => from_epoch(*value),
            RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| text.trim().parse::<f64>().ok().and_then(from_epoch)),
            RawTimestamp::Structured(ts) => DateTime::from_timestamp(ts.seconds, ts.nanoseconds),
            RawTimestamp::Other(_) => None,
        }
    }
}

fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let seconds = if value > MILLIS_THRESHOLD {
        value / 1000.0
    } else {
        value
    };
    let mut whole = seconds.floor() as i64;
    let mut micros = ((seconds - seconds.floor()) * 1e6).round() as u32;
    if micros >= 1_000_000 {
        whole += 1;
        micros = 0;
    }
    DateTime::from_timestamp(whole, micros * 1000)
}

fn epoch_seconds(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_millis()) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stored(created_at: Value) -> StoredReport {
        serde_json::from_value(json!({
            "title": "t",
            "created_at": created_at,
        }))
        .unwrap()
    }

    #[test]
    fn test_normalize_epoch_seconds_float() {
        let report = stored(json!(1_700_000_000.25)).into_report("k");
        assert_eq!(report.created_at.timestamp(), 1_700_000_000);
        assert_eq!(report.created_at.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_normalize_epoch_millis() {
        let report = stored(json!(1_700_000_000_500_i64)).into_report("k");
        assert_eq!(report.created_at.timestamp(), 1_700_000_000);
        assert_eq!(report.created_at.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_normalize_structured_seconds() {
        let a = stored(json!({"seconds": 1_700_000_000, "nanos": 0})).into_report("k");
        let b = stored(json!({"_seconds": 1_700_000_000, "_nanoseconds": 0})).into_report("k");
        let expected = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(a.created_at, expected);
        assert_eq!(b.created_at, expected);
    }

    #[test]
    fn test_normalize_rfc3339_text() {
        let report = stored(json!("2024-05-01T12:00:00Z")).into_report("k");
        assert_eq!(
            report.created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_server_sentinel_and_missing_sort_last() {
        let sentinel = stored(json!({".sv": "timestamp"})).into_report("k");
        let missing: StoredReport = serde_json::from_value(json!({"title": "t"})).unwrap();
        assert_eq!(sentinel.created_at, DateTime::<Utc>::default());
        assert_eq!(missing.into_report("k").created_at, DateTime::<Utc>::default());
    }

    #[test]
    fn test_metrics_alias_and_key_fallback() {
        let stored: StoredReport = serde_json::from_value(json!({
            "title": "Legacy",
            "metrics": "old content field",
            "created_at": 1.0,
        }))
        .unwrap();
        let report = stored.into_report("legacy-key");
        assert_eq!(report.id, "legacy-key");
        assert_eq!(report.content, "old content field");
    }

    #[test]
    fn test_document_round_trip_preserves_timestamp() {
        let report = Report {
            id: "abc".to_string(),
            title: "Title".to_string(),
            description: String::new(),
            query: "{}".to_string(),
            content: "line one\n\"quoted\"".to_string(),
            created_at: Report::timestamp_now(),
        };
        let stored: StoredReport = serde_json::from_value(report.to_document()).unwrap();
        assert_eq!(stored.into_report("abc"), report);
    }

    #[test]
    fn test_document_key_overrides_body_id() {
        let stored: StoredReport = serde_json::from_value(json!({
            "id": "body-id",
            "title": "Mismatched",
            "created_at": 1.0,
        }))
        .unwrap();
        assert_eq!(stored.into_report("k1").id, "k1");
    }
}
