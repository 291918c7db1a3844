//! Provider task clients.
//!
//! Each client drives one [`crate::types::GenerationTask`] from submission
//! to terminal state against one external provider, hiding that provider's
//! transport quirks and schema variance behind the same three operations:
//! `submit`, `poll`, and `submit_and_wait`.

pub mod mureka;
pub mod suno;

use std::time::Duration;

use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Serialize;
use tokio::time::sleep;
use url::Url;

use crate::config::{ProviderKind, Settings};
use crate::error::MelodyError;
use crate::types::{GenerationPayload, GenerationTask};

pub use mureka::MurekaClient;
pub use suno::SunoClient;

/// Uniform front over the two provider variants. Independent tasks may be
/// run concurrently by the caller; the clients hold no shared mutable state.
#[derive(Clone)]
pub enum SongClient {
    Suno(SunoClient),
    Mureka(MurekaClient),
}

impl SongClient {
    /// Picks a client from the settings: a forced `SONG_PROVIDER` wins,
    /// otherwise whichever provider has an API key, preferring Suno.
    /// Returns `None` when no usable key is configured.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>, MelodyError> {
        let choice = match settings.provider {
            Some(ProviderKind::Suno) => settings.suno_api_key.is_some().then_some(ProviderKind::Suno),
            Some(ProviderKind::Mureka) => settings
                .mureka_api_key
                .is_some()
                .then_some(ProviderKind::Mureka),
            None => {
                if settings.suno_api_key.is_some() {
                    Some(ProviderKind::Suno)
                } else if settings.mureka_api_key.is_some() {
                    Some(ProviderKind::Mureka)
                } else {
                    None
                }
            }
        };

        match choice {
            Some(ProviderKind::Suno) => Ok(Some(Self::Suno(SunoClient::from_settings(settings)?))),
            Some(ProviderKind::Mureka) => {
                Ok(Some(Self::Mureka(MurekaClient::from_settings(settings)?)))
            }
            None => Ok(None),
        }
    }

    pub async fn submit(&self, payload: &GenerationPayload) -> Result<String, MelodyError> {
        match self {
            Self::Suno(client) => client.submit(payload).await,
            Self::Mureka(client) => client.submit(payload).await,
        }
    }

    pub async fn poll(&self, task_id: &str) -> Result<GenerationTask, MelodyError> {
        match self {
            Self::Suno(client) => client.poll(task_id).await,
            Self::Mureka(client) => client.poll(task_id).await,
        }
    }

    pub async fn submit_and_wait(
        &self,
        payload: &GenerationPayload,
    ) -> Result<GenerationTask, MelodyError> {
        match self {
            Self::Suno(client) => client.submit_and_wait(payload).await,
            Self::Mureka(client) => client.submit_and_wait(payload).await,
        }
    }
}

/// Builds a `reqwest::Client` with a default bearer `Authorization` header,
/// shared by both provider clients.
pub(crate) fn bearer_client(api_key: &str) -> Result<reqwest::Client, MelodyError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        format!("Bearer {}", api_key).parse().unwrap(),
    );

    let client = reqwest::Client::builder()
        .user_agent(concat!("melody-learning/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Parses a base URL, forcing a trailing slash so `Url::join` appends
/// instead of replacing the last path segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, MelodyError> {
    if base_url.ends_with('/') {
        Ok(Url::parse(base_url)?)
    } else {
        Ok(Url::parse(&format!("{base_url}/"))?)
    }
}

/// POSTs a JSON body, retrying rate-limited responses.
///
/// An HTTP 429 is retried up to `max_retries` times with a linear backoff
/// (`retry_backoff × attempt_number`, strictly increasing). Any other
/// non-success status maps to [`MelodyError::Submission`] immediately, as
/// does a 429 once the attempt budget is exhausted.
pub(crate) async fn post_json_with_retry<B: Serialize>(
    client: &reqwest::Client,
    url: Url,
    body: &B,
    max_retries: u32,
    retry_backoff: Duration,
) -> Result<reqwest::Response, MelodyError> {
    let mut attempt: u32 = 0;
    loop {
        let response = client.post(url.clone()).json(body).send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS && attempt < max_retries {
            attempt += 1;
            let wait = retry_backoff * attempt;
            tracing::warn!(
                attempt,
                wait_secs = wait.as_secs_f64(),
                "rate limited, backing off before resubmitting"
            );
            sleep(wait).await;
            continue;
        }

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            return Err(MelodyError::Submission {
                message: format!("HTTP {status}: {}", snippet(&body_text)),
            });
        }

        return Ok(response);
    }
}

/// Bounded excerpt of a response body for error messages.
pub(crate) fn snippet(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(1000)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}
