//! Cloud recognition services driven as asynchronous submit/poll jobs.

mod document_intelligence;
mod vision;

pub use document_intelligence::{content_type_for, text_from_analyze_result, DocumentIntelligenceClient};
pub use vision::{text_from_read_result, VisionClient};

use std::time::{Duration, Instant};

use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::CloudError;

/// Header carrying the job handle on a submit response.
pub const OPERATION_LOCATION: &str = "Operation-Location";

/// Header carrying the service key.
pub const SUBSCRIPTION_KEY: &str = "Ocp-Apim-Subscription-Key";

/// Bounded polling schedule: fixed interval, no backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Wall-clock ceiling for the whole poll loop.
    pub budget: Duration,
}

/// State of a remote job after one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    Pending,
    Succeeded(T),
    Failed(String),
}

/// Poll `check` until it reports a terminal state.
///
/// Sleeps `interval` before every poll. Stops with [`CloudError::Timeout`]
/// once `max_attempts` polls have run or the next sleep would cross `budget`,
/// whichever comes first.
pub fn poll_job<T, F>(policy: &PollPolicy, mut check: F) -> Result<T, CloudError>
where
    F: FnMut(u32) -> Result<PollStatus<T>, CloudError>,
{
    let start = Instant::now();
    let mut attempts = 0;

    while attempts < policy.max_attempts {
        if start.elapsed() + policy.interval > policy.budget {
            break;
        }
        std::thread::sleep(policy.interval);
        attempts += 1;

        match check(attempts)? {
            PollStatus::Pending => trace!("Job pending after poll {}", attempts),
            PollStatus::Succeeded(value) => {
                debug!("Job succeeded after {} polls", attempts);
                return Ok(value);
            }
            PollStatus::Failed(message) => return Err(CloudError::RemoteFailure(message)),
        }
    }

    Err(CloudError::Timeout {
        attempts,
        elapsed_ms: start.elapsed().as_millis() as u64,
    })
}

/// Status envelope shared by both services' poll responses.
#[derive(Debug, Deserialize)]
pub(crate) struct JobEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error: Option<RemoteErrorBody>,
    #[serde(default, rename = "analyzeResult")]
    pub analyze_result: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl JobEnvelope {
    /// Map the status string onto a poll state, extracting text on success.
    pub fn into_status<F>(self, extract: F) -> PollStatus<String>
    where
        F: FnOnce(&serde_json::Value) -> String,
    {
        match self.status.to_ascii_lowercase().as_str() {
            "succeeded" => {
                let text = self.analyze_result.as_ref().map(extract).unwrap_or_default();
                PollStatus::Succeeded(text)
            }
            "failed" => {
                let message = self
                    .error
                    .and_then(|e| e.message.or(e.code))
                    .unwrap_or_else(|| "remote job failed without a message".to_string());
                PollStatus::Failed(message)
            }
            _ => PollStatus::Pending,
        }
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, CloudError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CloudError::Http(format!("failed to create HTTP client: {}", e)))
}

/// Fail on a non-success status, keeping the body for diagnostics.
pub(crate) fn ensure_success(response: Response) -> Result<Response, CloudError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().unwrap_or_default();
        Err(CloudError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Read the asynchronous job handle from submit response headers.
pub fn job_handle(headers: &reqwest::header::HeaderMap) -> Result<String, CloudError> {
    headers
        .get(OPERATION_LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(CloudError::MissingJobHandle)
}

/// Fetch and decode one poll response.
pub(crate) fn fetch_job(client: &Client, url: &str, key: &str) -> Result<JobEnvelope, CloudError> {
    let response = client.get(url).header(SUBSCRIPTION_KEY, key).send()?;
    let response = ensure_success(response)?;
    response
        .json::<JobEnvelope>()
        .map_err(|e| CloudError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use serde_json::json;

    fn instant_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::ZERO,
            max_attempts,
            budget: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_poll_returns_first_terminal_success() {
        let result = poll_job(&instant_policy(10), |attempt| {
            Ok(if attempt < 3 {
                PollStatus::Pending
            } else {
                PollStatus::Succeeded(attempt)
            })
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_poll_surfaces_remote_failure() {
        let result: Result<(), _> =
            poll_job(&instant_policy(10), |_| Ok(PollStatus::Failed("bad page".to_string())));
        assert!(matches!(result, Err(CloudError::RemoteFailure(m)) if m == "bad page"));
    }

    #[test]
    fn test_poll_times_out_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = poll_job(&instant_policy(4), |_| {
            calls += 1;
            Ok(PollStatus::Pending)
        });
        assert_eq!(calls, 4);
        assert!(matches!(result, Err(CloudError::Timeout { attempts: 4, .. })));
    }

    #[test]
    fn test_poll_respects_wall_clock_budget() {
        let policy = PollPolicy {
            interval: Duration::from_millis(20),
            max_attempts: 1000,
            budget: Duration::from_millis(50),
        };
        let mut calls = 0;
        let result: Result<(), _> = poll_job(&policy, |_| {
            calls += 1;
            Ok(PollStatus::Pending)
        });
        assert!(calls <= 2, "polled {} times", calls);
        assert!(matches!(result, Err(CloudError::Timeout { .. })));
    }

    #[test]
    fn test_poll_propagates_transport_errors() {
        let result: Result<(), _> =
            poll_job(&instant_policy(5), |_| Err(CloudError::Http("reset".to_string())));
        assert!(matches!(result, Err(CloudError::Http(_))));
    }

    #[test]
    fn test_job_handle_header() {
        let mut headers = HeaderMap::new();
        assert!(matches!(job_handle(&headers), Err(CloudError::MissingJobHandle)));

        headers.insert(
            OPERATION_LOCATION,
            HeaderValue::from_static("https://svc.example.com/operations/42"),
        );
        assert_eq!(job_handle(&headers).unwrap(), "https://svc.example.com/operations/42");
    }

    #[test]
    fn test_envelope_status_mapping() {
        let running: JobEnvelope = serde_json::from_value(json!({"status": "running"})).unwrap();
        assert_eq!(running.into_status(|_| String::new()), PollStatus::Pending);

        let failed: JobEnvelope = serde_json::from_value(json!({
            "status": "failed",
            "error": {"code": "InvalidContent", "message": "Document is corrupted"}
        }))
        .unwrap();
        assert_eq!(
            failed.into_status(|_| String::new()),
            PollStatus::Failed("Document is corrupted".to_string())
        );

        let done: JobEnvelope = serde_json::from_value(json!({
            "status": "Succeeded",
            "analyzeResult": {"content": "hello"}
        }))
        .unwrap();
        assert_eq!(
            done.into_status(text_from_analyze_result),
            PollStatus::Succeeded("hello".to_string())
        );
    }
}
