//! Downloading generated audio to local storage.
//!
//! Downloads are best-effort fan-out: a single URL failing must not abort
//! the rest, so per-item results are collected into a [`DownloadOutcome`]
//! instead of being raised.

use std::path::{Path, PathBuf};

use chrono::Utc;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::MelodyError;
use crate::normalize;

/// One failed download, kept for inspection alongside the successes.
#[derive(Debug)]
pub struct DownloadFailure {
    pub url: String,
    pub error: MelodyError,
}

/// Batch result of an artifact fetch. An empty `saved` list is a valid
/// outcome when every download fails.
#[derive(Debug, Default)]
pub struct DownloadOutcome {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<DownloadFailure>,
}

/// Downloads each URL into `output_dir`, naming files
/// `{prefix}_{unix_timestamp}_{index}.{ext}` with the extension inferred
/// from the URL (default `mp3`).
///
/// The directory is created if absent; only that failure is fatal. Per-URL
/// failures are logged and collected into the outcome.
pub async fn save_audio_files(
    client: &reqwest::Client,
    urls: &[String],
    output_dir: &Path,
    prefix: &str,
) -> Result<DownloadOutcome, MelodyError> {
    fs::create_dir_all(output_dir).await?;

    let mut outcome = DownloadOutcome::default();
    for (idx, url) in urls.iter().enumerate() {
        match download_one(client, url, output_dir, prefix, idx + 1).await {
            Ok(path) => {
                tracing::info!(url = %url, path = %path.display(), "audio saved");
                outcome.saved.push(path);
            }
            Err(error) => {
                tracing::warn!(url = %url, error = %error, "audio download failed, skipping");
                outcome.failed.push(DownloadFailure {
                    url: url.clone(),
                    error,
                });
            }
        }
    }

    Ok(outcome)
}

/// Convenience wrapper: extract audio URLs from a provider response and
/// download them.
pub async fn save_response_audio(
    client: &reqwest::Client,
    response: &Value,
    output_dir: &Path,
    prefix: &str,
) -> Result<DownloadOutcome, MelodyError> {
    let urls = normalize::find_audio_urls(response);
    save_audio_files(client, &urls, output_dir, prefix).await
}

async fn download_one(
    client: &reqwest::Client,
    url: &str,
    output_dir: &Path,
    prefix: &str,
    index: usize,
) -> Result<PathBuf, MelodyError> {
    let extension = normalize::infer_extension(url);
    let timestamp = Utc::now().timestamp();
    let file_name = format!("{prefix}_{timestamp}_{index}.{extension}");
    let file_path = output_dir.join(file_name);

    let response = client.get(url).send().await?.error_for_status()?;

    let mut file = fs::File::create(&file_path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;

    Ok(file_path)
}
