//! End-to-end orchestration: document bytes in, song artifacts out.

use std::path::PathBuf;

use crate::artifacts;
use crate::completion::CompletionClient;
use crate::compose;
use crate::config::Settings;
use crate::error::MelodyError;
use crate::extract::{self, StudyDocument};
use crate::lyrics;
use crate::provider::SongClient;
use crate::types::{GenerationPayload, GenerationTask};

/// Everything a pipeline run produced. The textual artifacts are always
/// present; the song stages are `None`/empty when no provider key is
/// configured.
#[derive(Debug)]
pub struct PipelineArtifacts {
    pub study_text: String,
    pub mnemonic_plan: String,
    /// The lyrics actually submitted (post-truncation source text).
    pub lyrics: String,
    pub payload: GenerationPayload,
    pub task: Option<GenerationTask>,
    pub audio_urls: Vec<String>,
    pub saved_files: Vec<PathBuf>,
}

/// Sequences text extraction → plan/lyric generation → payload
/// construction → song generation → artifact download.
///
/// Each stage is a hard dependency on the previous one succeeding; stage
/// failures propagate to the caller unmodified in kind. Only lyric
/// extraction defines a fallback (the raw study text).
pub struct Pipeline {
    settings: Settings,
    completion: CompletionClient,
    http: reqwest::Client,
}

impl Pipeline {
    /// Builds a pipeline from settings. Fails with
    /// [`MelodyError::MissingApiKey`] when no completion key is configured,
    /// since every run starts with a completion-backed stage.
    pub fn new(settings: Settings) -> Result<Self, MelodyError> {
        let completion = CompletionClient::from_settings(&settings)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("melody-learning/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            settings,
            completion,
            http,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn completion(&self) -> &CompletionClient {
        &self.completion
    }

    /// The configured provider client, or `None` when no provider key is
    /// set (which disables the generation stage without failing the run).
    pub fn song_client(&self) -> Result<Option<SongClient>, MelodyError> {
        SongClient::from_settings(&self.settings)
    }

    /// Runs the full pipeline on one document.
    pub async fn run(&self, document: &StudyDocument) -> Result<PipelineArtifacts, MelodyError> {
        let study_text = extract::study_text_from_document(&self.completion, document).await?;
        tracing::info!(chars = study_text.chars().count(), "study text extracted");

        let mnemonic_plan = compose::build_mnemonic_plan(&self.completion, &study_text).await?;
        tracing::info!("mnemonic plan generated");

        let chosen_lyrics = if self.settings.pregenerate_lyrics {
            lyrics::generate_lyrics(&self.completion, &study_text).await?
        } else {
            lyrics::lyrics_from_plan(&mnemonic_plan, &study_text)
        };

        let payload = compose::build_payload(&chosen_lyrics, &self.settings);

        let mut out = PipelineArtifacts {
            study_text,
            mnemonic_plan,
            lyrics: chosen_lyrics,
            payload: payload.clone(),
            task: None,
            audio_urls: Vec::new(),
            saved_files: Vec::new(),
        };

        let Some(client) = self.song_client()? else {
            tracing::info!("no song provider API key configured, skipping generation");
            return Ok(out);
        };

        let task = client.submit_and_wait(&payload).await?;
        out.audio_urls = task.audio_urls();
        tracing::info!(
            task_id = %task.task_id,
            tracks = task.tracks.len(),
            urls = out.audio_urls.len(),
            "song generation completed"
        );
        out.task = Some(task);

        if !out.audio_urls.is_empty() {
            let outcome = artifacts::save_audio_files(
                &self.http,
                &out.audio_urls,
                &self.settings.output_dir,
                &self.settings.audio_prefix,
            )
            .await?;
            out.saved_files = outcome.saved;
        }

        Ok(out)
    }
}
