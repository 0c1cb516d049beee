//! Cloud document-intelligence (layout/read model) client.

use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, info};

use super::{ensure_success, fetch_job, http_client, job_handle, poll_job, PollPolicy, SUBSCRIPTION_KEY};
use crate::error::CloudError;
use crate::models::config::ServiceCredentials;
use crate::models::document::{Document, MimeClass};

const ANALYZE_PATH: &str = "formrecognizer/documentModels/prebuilt-read:analyze";
const API_VERSION: &str = "2023-07-31";

/// Submits documents as analyze jobs and polls them to completion.
pub struct DocumentIntelligenceClient {
    client: Client,
    endpoint: String,
    key: String,
    policy: PollPolicy,
}

impl DocumentIntelligenceClient {
    pub fn new(
        credentials: &ServiceCredentials,
        policy: PollPolicy,
        request_timeout: Duration,
    ) -> Result<Self, CloudError> {
        Ok(Self {
            client: http_client(request_timeout)?,
            endpoint: credentials.endpoint.trim_end_matches('/').to_string(),
            key: credentials.key.clone(),
            policy,
        })
    }

    fn analyze_url(&self) -> String {
        format!("{}/{}?api-version={}", self.endpoint, ANALYZE_PATH, API_VERSION)
    }

    /// Submit one job and wait for its text.
    pub fn analyze(&self, document: &Document) -> Result<String, CloudError> {
        let start = Instant::now();
        let content_type = content_type_for(document.mime_type());

        let response = self
            .client
            .post(self.analyze_url())
            .header(SUBSCRIPTION_KEY, &self.key)
            .header(CONTENT_TYPE, content_type)
            .body(document.bytes().to_vec())
            .send()?;
        let response = ensure_success(response)?;
        let operation = job_handle(response.headers())?;

        debug!("Submitted document-intelligence job ({}) -> {}", content_type, operation);

        let text = poll_job(&self.policy, |_| {
            Ok(fetch_job(&self.client, &operation, &self.key)?.into_status(text_from_analyze_result))
        })?;

        info!(
            "Document-intelligence job finished: {} chars in {}ms",
            text.len(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}

/// Content type sent with the raw document bytes.
pub fn content_type_for(mime: &str) -> &'static str {
    if MimeClass::from_mime(mime) == MimeClass::Pdf {
        return "application/pdf";
    }
    let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "image/jpeg",
        "image/png" => "image/png",
        "image/tiff" | "image/tif" => "image/tiff",
        "image/bmp" | "image/x-ms-bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Pull text out of an `analyzeResult`.
///
/// Tries, in order: the whole-document `content` blob, per-document
/// `content` fields, then per-page line lists.
pub fn text_from_analyze_result(result: &Value) -> String {
    if let Some(content) = non_empty_str(result.get("content")) {
        return content.to_string();
    }

    let documents = result
        .get("documents")
        .and_then(Value::as_array)
        .map(|docs| {
            docs.iter()
                .filter_map(document_content)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();
    if !documents.trim().is_empty() {
        return documents;
    }

    result
        .get("pages")
        .and_then(Value::as_array)
        .map(|pages| {
            pages
                .iter()
                .filter_map(|page| page.get("lines").and_then(Value::as_array))
                .flatten()
                .filter_map(|line| non_empty_str(line.get("content")))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

fn document_content(document: &Value) -> Option<String> {
    if let Some(content) = non_empty_str(document.get("content")) {
        return Some(content.to_string());
    }
    let fields = document.get("fields")?.as_object()?;
    let joined = fields
        .values()
        .filter_map(|field| non_empty_str(field.get("content")))
        .collect::<Vec<_>>()
        .join("\n");
    (!joined.is_empty()).then_some(joined)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(content_type_for("application/pdf"), "application/pdf");
        assert_eq!(content_type_for("image/JPEG"), "image/jpeg");
        assert_eq!(content_type_for("image/png"), "image/png");
        assert_eq!(content_type_for("image/tiff"), "image/tiff");
        assert_eq!(content_type_for("image/bmp"), "image/bmp");
        assert_eq!(content_type_for("image/webp"), "application/octet-stream");
        assert_eq!(content_type_for("text/plain"), "application/octet-stream");
    }

    #[test]
    fn test_whole_content_wins() {
        let result = json!({
            "content": "full text",
            "documents": [{"content": "doc text"}],
            "pages": [{"lines": [{"content": "line"}]}]
        });
        assert_eq!(text_from_analyze_result(&result), "full text");
    }

    #[test]
    fn test_document_contents_then_fields() {
        let result = json!({
            "content": "  ",
            "documents": [
                {"content": "first"},
                {"fields": {"Name": {"content": "second"}}}
            ]
        });
        assert_eq!(text_from_analyze_result(&result), "first\nsecond");
    }

    #[test]
    fn test_page_lines_last() {
        let result = json!({
            "pages": [
                {"lines": [{"content": "a"}, {"content": "b"}]},
                {"lines": [{"content": "c"}]}
            ]
        });
        assert_eq!(text_from_analyze_result(&result), "a\nb\nc");
    }

    #[test]
    fn test_empty_result() {
        assert_eq!(text_from_analyze_result(&json!({})), "");
    }
}
