//! Client for the Suno song-generation API.
//!
//! This is the richer of the two provider variants: poll responses arrive in
//! several schema shapes, the record endpoint answers both GET and POST, and
//! the poll loop widens its interval as a generation drags on.

use std::env;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::sleep;
use url::Url;

use crate::config::{
    Settings, DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_BACKOFF,
    DEFAULT_SUNO_BASE_URL,
};
use crate::error::MelodyError;
use crate::normalize;
use crate::types::{GenerationPayload, GenerationTask, SunoGenerateRequest, TaskState};

use super::{bearer_client, parse_base_url, post_json_with_retry, snippet};

/// Progressive poll backoff never exceeds this.
const MAX_POLL_BACKOFF: Duration = Duration::from_secs(8);

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Client for the Suno asynchronous song-generation API.
///
/// Holds a shared `reqwest::Client` with bearer auth and the timing
/// parameters for one task lifecycle. Cloneable and safe to reuse
/// sequentially for independent tasks.
#[derive(Clone)]
pub struct SunoClient {
    client: reqwest::Client,
    base_url: Url,
    poll_interval: Duration,
    timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
    require_tracks_on_success: bool,
}

impl SunoClient {
    /// Creates a new client, falling back to the `SUNO_API_KEY` environment
    /// variable when `api_key` is `None`.
    ///
    /// # Errors
    ///
    /// - [`MelodyError::MissingApiKey`] if no key is available either way.
    /// - [`MelodyError::RequestFailed`] if the HTTP client fails to build.
    pub fn new(api_key: Option<String>) -> Result<Self, MelodyError> {
        let api_key = api_key
            .or_else(|| env::var("SUNO_API_KEY").ok())
            .ok_or(MelodyError::MissingApiKey)?;
        Self::new_with_url(api_key, DEFAULT_SUNO_BASE_URL)
    }

    /// Creates a new client against a custom base URL, e.g. a mock server.
    pub fn new_with_url(api_key: String, base_url: &str) -> Result<Self, MelodyError> {
        Ok(Self {
            client: bearer_client(&api_key)?,
            base_url: parse_base_url(base_url)?,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            require_tracks_on_success: true,
        })
    }

    /// Builds a client from [`Settings`], which must carry a Suno key.
    pub fn from_settings(settings: &Settings) -> Result<Self, MelodyError> {
        let key = settings
            .suno_api_key
            .clone()
            .ok_or(MelodyError::MissingApiKey)?;
        Ok(Self::new_with_url(key, &settings.suno_base_url)?
            .with_timing(settings.poll_interval, settings.generation_timeout)
            .with_retry(settings.max_retries, settings.retry_backoff)
            .require_tracks(settings.require_tracks_on_success))
    }

    /// Overrides the poll interval and the wall-clock poll budget.
    pub fn with_timing(mut self, poll_interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.timeout = timeout;
        self
    }

    /// Overrides the 429 retry budget for submissions.
    pub fn with_retry(mut self, max_retries: u32, retry_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = retry_backoff;
        self
    }

    /// Whether a success status with no extractable tracks keeps the poll
    /// loop running (the default) or terminates it with an empty track list.
    pub fn require_tracks(mut self, require: bool) -> Self {
        self.require_tracks_on_success = require;
        self
    }

    /// Submits a generation request and returns the provider task id.
    ///
    /// Rate-limited submissions are retried with linear backoff; any other
    /// rejection maps to [`MelodyError::Submission`]. The task id is located
    /// via the known field paths, tolerating schema variance.
    pub async fn submit(&self, payload: &GenerationPayload) -> Result<String, MelodyError> {
        let url = self.base_url.join("generate")?;
        let body = SunoGenerateRequest::from_payload(payload);

        tracing::debug!(url = %url, "submitting generation request");
        let response =
            post_json_with_retry(&self.client, url, &body, self.max_retries, self.retry_backoff)
                .await?;
        let value: Value = response.json().await?;

        if let Some(message) = body_error(&value) {
            return Err(MelodyError::Submission { message });
        }

        let task_id = normalize::lookup_id(&value, normalize::SUNO_TASK_ID_PATHS).ok_or_else(
            || MelodyError::Submission {
                message: format!("no task identifier found in response: {}", value),
            },
        )?;

        tracing::info!(task_id = %task_id, "generation task submitted");
        Ok(task_id)
    }

    /// Polls the record endpoint until the task reaches a terminal state or
    /// the wall-clock budget is exhausted.
    ///
    /// Transport errors, non-success statuses, and malformed bodies on a
    /// single attempt are transient: logged and retried. A provider-reported
    /// failure is fatal ([`MelodyError::GenerationFailed`]); running out the
    /// budget raises [`MelodyError::Timeout`], carrying the last observed
    /// status so the caller can decide whether to resubmit.
    pub async fn poll(&self, task_id: &str) -> Result<GenerationTask, MelodyError> {
        let url = self.base_url.join("generate/record-info")?;
        let started = Instant::now();
        let mut attempt: u32 = 0;
        let mut last_status: Option<String> = None;

        while started.elapsed() < self.timeout {
            attempt += 1;
            if attempt > 1 {
                let scaled = self.poll_interval.mul_f64(1.0 + f64::from(attempt) * 0.25);
                sleep(scaled.min(MAX_POLL_BACKOFF)).await;
            }

            if let Some(value) = self.record_info_get(&url, task_id).await {
                if let Some(task) = self.inspect_response(task_id, &value, &mut last_status)? {
                    return Ok(task);
                }
                // Got a usable response over GET; no need for the fallback.
                continue;
            }

            if let Some(value) = self.record_info_post(&url, task_id).await {
                if let Some(task) = self.inspect_response(task_id, &value, &mut last_status)? {
                    return Ok(task);
                }
            }
        }

        Err(MelodyError::Timeout {
            task_id: task_id.to_string(),
            last_status,
        })
    }

    /// Submits a payload and waits for the task to complete.
    pub async fn submit_and_wait(
        &self,
        payload: &GenerationPayload,
    ) -> Result<GenerationTask, MelodyError> {
        let task_id = self.submit(payload).await?;
        self.poll(&task_id).await
    }

    /// One GET poll attempt. Returns the parsed body on HTTP success,
    /// `None` for anything transient.
    async fn record_info_get(&self, url: &Url, task_id: &str) -> Option<Value> {
        let result = self
            .client
            .get(url.clone())
            .query(&[
                ("taskId", task_id),
                ("task_id", task_id),
                ("workId", task_id),
            ])
            .send()
            .await;

        parse_poll_response("GET", result).await
    }

    /// POST fallback for deployments where the record endpoint rejects GET.
    async fn record_info_post(&self, url: &Url, task_id: &str) -> Option<Value> {
        let result = self
            .client
            .post(url.clone())
            .json(&serde_json::json!({
                "taskId": task_id,
                "task_id": task_id,
                "workId": task_id,
            }))
            .send()
            .await;

        parse_poll_response("POST", result).await
    }

    /// Inspects one normalized poll response. `Ok(Some(task))` ends the
    /// loop, `Ok(None)` keeps polling, `Err` is fatal.
    fn inspect_response(
        &self,
        task_id: &str,
        value: &Value,
        last_status: &mut Option<String>,
    ) -> Result<Option<GenerationTask>, MelodyError> {
        if let Some(message) = body_error(value) {
            return Err(MelodyError::GenerationFailed { message });
        }

        let (status, tracks) = normalize::parse_status_and_tracks(value);

        let Some(raw_status) = status else {
            return Ok(None);
        };

        if last_status.as_deref() != Some(raw_status.as_str()) {
            tracing::info!(task_id, status = %raw_status, "task status changed");
            *last_status = Some(raw_status.clone());
        }

        match normalize::canonical_status(&raw_status) {
            Some(TaskState::Succeeded) => {
                if let Some(tracks) = tracks {
                    return Ok(Some(GenerationTask {
                        task_id: task_id.to_string(),
                        status: TaskState::Succeeded,
                        tracks,
                    }));
                }
                if !self.require_tracks_on_success {
                    return Ok(Some(GenerationTask {
                        task_id: task_id.to_string(),
                        status: TaskState::Succeeded,
                        tracks: Vec::new(),
                    }));
                }
                tracing::debug!(task_id, "success status without tracks, continuing to poll");
                Ok(None)
            }
            Some(TaskState::Failed) => Err(MelodyError::GenerationFailed {
                message: format!(
                    "provider reported status {raw_status}: {}",
                    snippet(&value.to_string())
                ),
            }),
            _ => Ok(None),
        }
    }
}

/// Turns a poll transport result into a parsed body, logging and swallowing
/// everything transient.
async fn parse_poll_response(
    verb: &str,
    result: Result<reqwest::Response, reqwest::Error>,
) -> Option<Value> {
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(verb, error = %err, "poll request failed, will retry");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(verb, status = %response.status(), "poll returned non-success");
        return None;
    }

    match response.json::<Value>().await {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(verb, error = %err, "poll response was not valid JSON");
            None
        }
    }
}

/// Body-level error code shared by the Suno endpoints: a JSON `code` field
/// other than 200 signals rejection even on an HTTP 200.
fn body_error(value: &Value) -> Option<String> {
    let code = value.get("code").and_then(Value::as_i64)?;
    if code == 200 {
        return None;
    }
    let message = value
        .get("msg")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string());
    Some(format!("code={code}, msg={message}"))
}
