//! Client for the Mureka song-generation API.
//!
//! The simpler provider variant: one submission endpoint, one status
//! endpoint polled at a fixed interval. Schema tolerance is still applied —
//! the task id and status are located via ordered path lists, and audio is
//! pulled out of the response by the generic normalizer.

use std::env;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::sleep;
use url::Url;

use crate::config::{
    Settings, DEFAULT_MAX_RETRIES, DEFAULT_MUREKA_BASE_URL, DEFAULT_RETRY_BACKOFF,
};
use crate::error::MelodyError;
use crate::normalize;
use crate::types::{GenerationPayload, GenerationTask, MurekaGenerateRequest, TaskState};

use super::{bearer_client, parse_base_url, post_json_with_retry, snippet};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Client for the Mureka asynchronous song-generation API.
#[derive(Clone)]
pub struct MurekaClient {
    client: reqwest::Client,
    base_url: Url,
    poll_interval: Duration,
    timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
}

impl MurekaClient {
    /// Creates a new client, falling back to the `MUREKA_API_KEY`
    /// environment variable when `api_key` is `None`.
    pub fn new(api_key: Option<String>) -> Result<Self, MelodyError> {
        let api_key = api_key
            .or_else(|| env::var("MUREKA_API_KEY").ok())
            .ok_or(MelodyError::MissingApiKey)?;
        Self::new_with_url(api_key, DEFAULT_MUREKA_BASE_URL)
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
        })
    }

    /// Builds a client from [`Settings`], which must carry a Mureka key.
    pub fn from_settings(settings: &Settings) -> Result<Self, MelodyError> {
        let key = settings
            .mureka_api_key
            .clone()
            .ok_or(MelodyError::MissingApiKey)?;
        Ok(Self::new_with_url(key, &settings.mureka_base_url)?
            .with_timing(settings.poll_interval, settings.generation_timeout)
            .with_retry(settings.max_retries, settings.retry_backoff))
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

    /// Submits a generation request and returns the provider task id.
    pub async fn submit(&self, payload: &GenerationPayload) -> Result<String, MelodyError> {
        let url = self.base_url.join("song/generate")?;
        let body = MurekaGenerateRequest::from_payload(payload);

        tracing::debug!(url = %url, "submitting generation request");
        let response =
            post_json_with_retry(&self.client, url, &body, self.max_retries, self.retry_backoff)
                .await?;
        let value: Value = response.json().await?;

        let task_id = normalize::lookup_id(&value, normalize::MUREKA_TASK_ID_PATHS).ok_or_else(
            || MelodyError::Submission {
                message: format!("no task identifier found in response: {}", value),
            },
        )?;

        tracing::info!(task_id = %task_id, "generation task submitted");
        Ok(task_id)
    }

    /// Polls the task endpoint until completion, failure, or timeout.
    ///
    /// A success status is terminal here even without media: the Mureka
    /// response may legitimately carry no audio, and the caller treats an
    /// empty track list as a valid outcome.
    pub async fn poll(&self, task_id: &str) -> Result<GenerationTask, MelodyError> {
        let url = self.status_url(task_id)?;
        let started = Instant::now();
        let mut last_status: Option<String> = None;

        while started.elapsed() <= self.timeout {
            if let Some(value) = self.fetch_status(&url).await {
                let raw_status = normalize::extract_status(&value).map(str::to_string);
                if let Some(raw) = &raw_status {
                    if last_status.as_deref() != Some(raw.as_str()) {
                        tracing::info!(task_id, status = %raw, "task status changed");
                        last_status = Some(raw.clone());
                    }
                    match normalize::canonical_status(raw) {
                        Some(TaskState::Succeeded) => {
                            return Ok(GenerationTask {
                                task_id: task_id.to_string(),
                                status: TaskState::Succeeded,
                                tracks: resolve_tracks(&value),
                            });
                        }
                        Some(TaskState::Failed) => {
                            return Err(MelodyError::GenerationFailed {
                                message: format!(
                                    "provider reported status {raw}: {}",
                                    snippet(&value.to_string())
                                ),
                            });
                        }
                        _ => {}
                    }
                }
            }
            sleep(self.poll_interval).await;
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

    fn status_url(&self, task_id: &str) -> Result<Url, MelodyError> {
        Ok(self.base_url.join(&format!("song/tasks/{}", task_id))?)
    }

    /// One poll attempt; anything transient is logged and yields `None`.
    async fn fetch_status(&self, url: &Url) -> Option<Value> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(error = %err, "poll request failed, will retry");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "poll returned non-success");
            return None;
        }

        match response.json::<Value>().await {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(error = %err, "poll response was not valid JSON");
                None
            }
        }
    }
}

/// Prefers the structured track containers; falls back to promoting bare
/// audio URLs discovered anywhere in the response.
fn resolve_tracks(value: &Value) -> Vec<crate::types::Track> {
    let (_, tracks) = normalize::parse_status_and_tracks(value);
    tracks.unwrap_or_else(|| normalize::tracks_from_audio_urls(value))
}
