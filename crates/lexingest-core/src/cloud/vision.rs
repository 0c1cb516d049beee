//! Cloud vision OCR (read API) client.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::debug;

use super::{ensure_success, fetch_job, http_client, job_handle, poll_job, PollPolicy, SUBSCRIPTION_KEY};
use crate::error::CloudError;
use crate::models::config::ServiceCredentials;
use crate::models::document::Document;

const READ_PATH: &str = "vision/v3.2/read/analyze";

/// Submits documents as read jobs.
pub struct VisionClient {
    client: Client,
    endpoint: String,
    key: String,
    policy: PollPolicy,
}

impl VisionClient {
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

    pub fn read(&self, document: &Document) -> Result<String, CloudError> {
        let response = self
            .client
            .post(format!("{}/{}", self.endpoint, READ_PATH))
            .header(SUBSCRIPTION_KEY, &self.key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(document.bytes().to_vec())
            .send()?;
        let response = ensure_success(response)?;
        let operation = job_handle(response.headers())?;
        debug!("Submitted vision read job -> {}", operation);

        poll_job(&self.policy, |_| {
            Ok(fetch_job(&self.client, &operation, &self.key)?.into_status(text_from_read_result))
        })
    }
}

/// Concatenate per-line text across all pages of a read result.
pub fn text_from_read_result(result: &Value) -> String {
    result
        .get("readResults")
        .and_then(Value::as_array)
        .map(|pages| {
            pages
                .iter()
                .filter_map(|page| page.get("lines").and_then(Value::as_array))
                .flatten()
                .filter_map(|line| line.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}
