//! Firebase Realtime Database backend, spoken to over its REST API.
//!
//! Documents live at `{database_url}/reports/{id}.json`. Every write is
//! verified by reading the document back; a missing or mismatched read counts
//! as a failed write so the store falls through to the next backend.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;
use tracing::debug;

use super::{collect_reports, ReportBackend, StoreError};
use crate::models::report::{Report, StoredReport};

const COLLECTION: &str = "reports";

pub struct FirebaseBackend {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl FirebaseBackend {
    pub fn new(database_url: String, auth_token: Option<String>) -> Result<Self, StoreError> {
        let base_url = Url::parse(database_url.trim())
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| StoreError::InvalidUrl(database_url.clone()))?;

        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            base_url,
            auth_token,
        })
    }

    pub fn database_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn collection_url(&self) -> Url {
        self.url_for(&[&format!("{COLLECTION}.json")])
    }

    /// Each segment is percent-encoded, so an id cannot change the path or
    /// add a query.
    fn document_url(&self, id: &str) -> Url {
        self.url_for(&[COLLECTION, &format!("{id}.json")])
    }

    fn url_for(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` only accepts base URLs, so the path is always editable.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn read_json(&self, url: Url) -> Result<Value, StoreError> {
        let response = self.authorize(self.client.get(url)).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }
}

/// Maps a non-2xx response to `StoreError::Status` carrying the body.
async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

/// A document body read back from the database. JSON `null` means absent.
fn parse_document(id: &str, value: Value) -> Result<Option<Report>, StoreError> {
    if value.is_null() {
        return Ok(None);
    }
    let stored: StoredReport = serde_json::from_value(value)?;
    Ok(Some(stored.into_report(id)))
}

#[async_trait]
impl ReportBackend for FirebaseBackend {
    fn name(&self) -> &str {
        "firebase"
    }

    async fn put(&self, report: &Report) -> Result<(), StoreError> {
        let url = self.document_url(&report.id);
        let response = self
            .authorize(self.client.put(url))
            .json(&report.to_document())
            .send()
            .await?;
        ensure_success(response).await?;

        match self.fetch(&report.id).await? {
            Some(stored) if stored.content == report.content => {
                debug!("Verified report {} in Firebase", report.id);
                Ok(())
            }
            _ => Err(StoreError::Verification(report.id.clone())),
        }
    }

    async fn fetch(&self, id: &str) -> Result<Option<Report>, StoreError> {
        let value = self.read_json(self.document_url(id)).await?;
        parse_document(id, value)
    }

    async fn fetch_all(&self) -> Result<Vec<Report>, StoreError> {
        match self.read_json(self.collection_url()).await? {
            Value::Object(entries) => Ok(collect_reports(entries)),
            _ => Ok(Vec::new()),
        }
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        // DELETE succeeds for absent paths too, so check first.
        if self.fetch(id).await?.is_none() {
            return Ok(false);
        }
        let response = self
            .authorize(self.client.delete(self.document_url(id)))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let backend =
            FirebaseBackend::new("https://demo-default-rtdb.firebaseio.com/".to_string(), None)
                .unwrap();
        assert_eq!(
            backend.collection_url().as_str(),
            "https://demo-default-rtdb.firebaseio.com/reports.json"
        );
        assert_eq!(
            backend.document_url("abc-123").as_str(),
            "https://demo-default-rtdb.firebaseio.com/reports/abc-123.json"
        );
        assert_eq!(
            backend.database_url(),
            "https://demo-default-rtdb.firebaseio.com"
        );
    }

    #[test]
    fn test_document_id_is_escaped() {
        let backend =
            FirebaseBackend::new("https://demo.firebaseio.com".to_string(), None).unwrap();
        let url = backend.document_url("a/b?c#d");
        assert_eq!(
            url.as_str(),
            "https://demo.firebaseio.com/reports/a%2Fb%3Fc%23d.json"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_database_path_prefix_kept() {
        let backend =
            FirebaseBackend::new("https://demo.firebaseio.com/tenant/".to_string(), None).unwrap();
        assert_eq!(
            backend.document_url("x").as_str(),
            "https://demo.firebaseio.com/tenant/reports/x.json"
        );
    }

    #[test]
    fn test_rejects_unusable_database_url() {
        assert!(matches!(
            FirebaseBackend::new("not a url".to_string(), None),
            Err(StoreError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_auth_token_added_as_query() {
        let backend = FirebaseBackend::new(
            "https://demo.firebaseio.com".to_string(),
            Some("secret".to_string()),
        )
        .unwrap();
        let request = backend
            .authorize(backend.client.get(backend.document_url("x")))
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("auth=secret"));
    }

    #[test]
    fn test_null_document_is_absent() {
        assert!(parse_document("x", Value::Null).unwrap().is_none());
    }

    #[test]
    fn test_document_with_epoch_timestamp() {
        let report = parse_document(
            "x",
            json!({"id": "x", "title": "T", "description": "", "query": "{}",
                   "content": "body", "created_at": 1_700_000_000.0}),
        )
        .unwrap()
        .unwrap();
        assert_eq!(report.id, "x");
        assert_eq!(report.content, "body");
        assert_eq!(report.created_at.timestamp(), 1_700_000_000);
    }
}
