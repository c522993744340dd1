//! Report Generation: turns an enriched record into analysis text and,
//! optionally, persists it.
//!
//! Flow: derive_ratios → build prompt → TextGenerator → (optional) ReportStore::save.
//!
//! Nothing here returns an error to the caller. Generation failures become an
//! error string in place of the report; persistence failures are reported
//! through `AnalysisStatus::SaveFailed` with the generated text still attached.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::format::format_report_for_display;
use crate::analysis::metrics::derive_ratios;
use crate::analysis::prompts::ANALYSIS_PROMPT_TEMPLATE;
use crate::llm_client::prompts::{MISSING_FIELD, STRATEGIST_SYSTEM};
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::video::VideoRecord;
use crate::store::{NewReport, ReportStore};

const UNTITLED: &str = "Untitled";

// ────────────────────────────────────────────────────────────────────────────
// Generator
// ────────────────────────────────────────────────────────────────────────────

/// Builds the analysis prompt and unwraps the generated text.
pub struct ReportGenerator {
    llm: Arc<dyn TextGenerator>,
}

impl ReportGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Returns the generated text verbatim, or a human-readable error message
    /// in its place.
    pub async fn generate(&self, record: &VideoRecord) -> String {
        match self.try_generate(record).await {
            Ok(text) => text,
            Err(e) => generation_error_text(&e),
        }
    }

    /// Like `generate`, but hands the failure to the caller.
    pub async fn try_generate(&self, record: &VideoRecord) -> Result<String, LlmError> {
        let prompt = build_analysis_prompt(record);
        self.llm.complete(&prompt, STRATEGIST_SYSTEM).await
    }
}

fn generation_error_text(error: &LlmError) -> String {
    warn!("Analysis generation failed: {error}");
    format!("Error generating analysis: {error}")
}

/// Fills the analysis template with the record's fields.
/// Blank text fields and absent ratios render as `N/A`.
pub fn build_analysis_prompt(record: &VideoRecord) -> String {
    render_template(ANALYSIS_PROMPT_TEMPLATE, |name| prompt_field(record, name))
}

fn prompt_field(record: &VideoRecord, name: &str) -> Option<String> {
    let value = match name {
        "system_role" => STRATEGIST_SYSTEM.to_string(),
        // The sheet carries title and hook in one column.
        "title" | "hook" => text_or_missing(&record.title).to_string(),
        "caption" => text_or_missing(&record.caption).to_string(),
        "hashtags" => text_or_missing(&record.hashtags).to_string(),
        "notes" => text_or_missing(&record.notes).to_string(),
        "views" => record.views.to_string(),
        "likes" => record.likes.to_string(),
        "comments" => record.comments.to_string(),
        "saves" => record.saves.to_string(),
        "views_to_likes" => ratio_or_missing(record.views_to_likes),
        "views_to_comments" => ratio_or_missing(record.views_to_comments),
        "views_to_saves" => ratio_or_missing(record.views_to_saves),
        "likes_to_comments" => ratio_or_missing(record.likes_to_comments),
        "likes_to_saves" => ratio_or_missing(record.likes_to_saves),
        _ => return None,
    };
    Some(value)
}

/// Single left-to-right pass over `template`. Substituted values are never
/// rescanned; unknown `{name}` tokens are left as written.
fn render_template(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after
            .find('}')
            .and_then(|close| lookup(&after[..close]).map(|value| (close, value)));
        match substituted {
            Some((close, value)) => {
                out.push_str(&value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn text_or_missing(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        MISSING_FIELD
    } else {
        trimmed
    }
}

fn ratio_or_missing(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING_FIELD.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Report generated, not persisted (none requested).
    Generated,
    Saved,
    /// Report generated but every storage backend failed.
    SaveFailed,
    /// The completion call failed; `report` holds the error text.
    GenerationFailed,
}

/// Result of analyzing one record.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub record: VideoRecord,
    pub report: String,
    pub formatted_report: String,
    pub status: AnalysisStatus,
    pub report_id: Option<String>,
    pub message: String,
}

impl AnalysisOutcome {
    /// Title the report is (or would be) saved under.
    pub fn title(&self) -> &str {
        let title = self.record.title.trim();
        if title.is_empty() {
            UNTITLED
        } else {
            title
        }
    }
}

/// Runs the full pipeline for one record.
///
/// Steps:
/// 1. derive_ratios() → enriched record
/// 2. generator.try_generate() → report text (failure ends the pipeline)
/// 3. if `save`: store.save() with the caption as description and the
///    enriched record as query
pub async fn analyze_record(
    generator: &ReportGenerator,
    store: &ReportStore,
    record: VideoRecord,
    save: bool,
) -> AnalysisOutcome {
    let record = derive_ratios(record);

    let report = match generator.try_generate(&record).await {
        Ok(text) => text,
        Err(e) => {
            let text = generation_error_text(&e);
            return AnalysisOutcome {
                formatted_report: text.clone(),
                report: text,
                record,
                status: AnalysisStatus::GenerationFailed,
                report_id: None,
                message: "Analysis generation failed".to_string(),
            };
        }
    };

    let mut outcome = AnalysisOutcome {
        formatted_report: format_report_for_display(&report),
        report,
        record,
        status: AnalysisStatus::Generated,
        report_id: None,
        message: "Analysis generated".to_string(),
    };

    if !save {
        return outcome;
    }

    let query = match serde_json::to_string(&outcome.record) {
        Ok(q) => q,
        Err(e) => {
            warn!("Failed to serialize record for persistence: {e}");
            outcome.status = AnalysisStatus::SaveFailed;
            outcome.message = format!("Analysis generated but could not be saved: {e}");
            return outcome;
        }
    };

    let new_report = NewReport {
        title: outcome.title().to_string(),
        description: outcome.record.caption.clone(),
        query,
        content: outcome.report.clone(),
    };

    match store.save(new_report).await {
        Ok(saved) => {
            info!("Saved analysis report {} to {}", saved.report.id, saved.backend);
            outcome.message = format!("Report saved with ID {}", saved.report.id);
            outcome.report_id = Some(saved.report.id);
            outcome.status = AnalysisStatus::Saved;
        }
        Err(e) => {
            warn!("Analysis generated but persistence failed: {e}");
            outcome.status = AnalysisStatus::SaveFailed;
            outcome.message = format!("Analysis generated but could not be saved: {e}");
        }
    }

    outcome
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::report::Report;
    use crate::store::local::LocalFileBackend;
    use crate::store::{ReportBackend, StoreError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a fixed reply and records the prompts it was given.
    pub(crate) struct StubGenerator {
        pub reply: Result<String, u16>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl StubGenerator {
        pub(crate) fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "quota exceeded".to_string(),
                }),
            }
        }
    }

    struct BrokenBackend;

    #[async_trait]
    impl ReportBackend for BrokenBackend {
        fn name(&self) -> &str {
            "broken"
        }
        async fn put(&self, report: &Report) -> Result<(), StoreError> {
            Err(StoreError::Verification(report.id.clone()))
        }
        async fn fetch(&self, _: &str) -> Result<Option<Report>, StoreError> {
            Ok(None)
        }
        async fn fetch_all(&self) -> Result<Vec<Report>, StoreError> {
            Ok(Vec::new())
        }
        async fn remove(&self, _: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    fn local_store(dir: &tempfile::TempDir) -> ReportStore {
        ReportStore::new(vec![Arc::new(LocalFileBackend::new(dir.path().join("r.json")))])
    }

    fn sample() -> VideoRecord {
        VideoRecord {
            title: "Why I quit my job".to_string(),
            caption: "It was time".to_string(),
            views: 1000.0,
            likes: 100.0,
            comments: 20.0,
            saves: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_prompt_substitutes_fields_and_missing_placeholder() {
        let prompt = build_analysis_prompt(&derive_ratios(sample()));
        assert!(prompt.contains("Title: Why I quit my job"));
        assert!(prompt.contains("Hook: Why I quit my job"));
        assert!(prompt.contains("Caption: It was time"));
        assert!(prompt.contains("Hashtags: N/A"));
        assert!(prompt.contains("Views: 1000"));
        assert!(prompt.contains("Views to Like Ratio (%): 10"));
        assert!(prompt.contains("Like to Comment Ratio (%): 20"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_prompt_marks_underived_ratios_missing() {
        let prompt = build_analysis_prompt(&sample());
        assert!(prompt.contains("Views to Save Ratio (%): N/A"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let record = derive_ratios(sample());
        assert_eq!(build_analysis_prompt(&record), build_analysis_prompt(&record));
    }

    #[test]
    fn test_placeholders_in_record_text_kept_literal() {
        let record = VideoRecord {
            title: "Why {views} matters".to_string(),
            caption: "{caption} {unknown".to_string(),
            views: 1000.0,
            ..Default::default()
        };
        let prompt = build_analysis_prompt(&record);
        assert!(prompt.contains("Title: Why {views} matters"));
        assert!(prompt.contains("Hook: Why {views} matters"));
        assert!(prompt.contains("Caption: {caption} {unknown"));
        assert!(prompt.contains("Views: 1000"));
    }

    #[test]
    fn test_render_template_leaves_unknown_tokens() {
        let out = render_template("{a} {b} {", |name| (name == "a").then(|| "x".to_string()));
        assert_eq!(out, "x {b} {");
    }

    #[tokio::test]
    async fn test_generate_returns_text_verbatim() {
        let llm = StubGenerator::replying("Overview Summary\nok");
        let generator = ReportGenerator::new(Arc::new(llm));
        assert_eq!(generator.generate(&sample()).await, "Overview Summary\nok");
    }

    #[tokio::test]
    async fn test_generate_turns_failure_into_message() {
        let generator = ReportGenerator::new(Arc::new(StubGenerator::failing(503)));
        let text = generator.generate(&sample()).await;
        assert!(text.starts_with("Error generating analysis:"));
        assert!(text.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_analyze_without_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir);
        let llm = StubGenerator::replying("Strengths Identified\ngood");
        let generator = ReportGenerator::new(Arc::new(llm));

        let outcome = analyze_record(&generator, &store, sample(), false).await;

        assert_eq!(outcome.status, AnalysisStatus::Generated);
        assert_eq!(outcome.record.views_to_likes, Some(10.0));
        assert!(outcome.formatted_report.contains("## Strengths Identified"));
        assert!(outcome.report_id.is_none());
        assert!(store.list(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_and_save_persists_enriched_query() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir);
        let generator = ReportGenerator::new(Arc::new(StubGenerator::replying("report body")));

        let outcome = analyze_record(&generator, &store, sample(), true).await;

        assert_eq!(outcome.status, AnalysisStatus::Saved);
        let id = outcome.report_id.unwrap();
        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Why I quit my job");
        assert_eq!(stored.description, "It was time");
        assert_eq!(stored.content, "report body");
        let query: VideoRecord = serde_json::from_str(&stored.query).unwrap();
        assert_eq!(query.likes_to_saves, Some(10.0));
    }

    #[tokio::test]
    async fn test_save_failure_keeps_generated_content() {
        let store = ReportStore::new(vec![Arc::new(BrokenBackend)]);
        let generator = ReportGenerator::new(Arc::new(StubGenerator::replying("precious text")));

        let outcome = analyze_record(&generator, &store, sample(), true).await;

        assert_eq!(outcome.status, AnalysisStatus::SaveFailed);
        assert_eq!(outcome.report, "precious text");
        assert!(outcome.report_id.is_none());
    }

    #[tokio::test]
    async fn test_generation_failure_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir);
        let generator = ReportGenerator::new(Arc::new(StubGenerator::failing(401)));

        let outcome = analyze_record(&generator, &store, sample(), true).await;

        assert_eq!(outcome.status, AnalysisStatus::GenerationFailed);
        assert!(outcome.report.starts_with("Error generating analysis:"));
        assert!(outcome.report.contains("quota exceeded"));
        assert!(store.list(10).await.unwrap().is_empty());
    }

    #[test]
    fn test_untitled_fallback() {
        let outcome = AnalysisOutcome {
            record: VideoRecord::default(),
            report: String::new(),
            formatted_report: String::new(),
            status: AnalysisStatus::Generated,
            report_id: None,
            message: String::new(),
        };
        assert_eq!(outcome.title(), "Untitled");
    }
}
