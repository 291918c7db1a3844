use serde::Serialize;

/// Title assigned to a track when the provider response carries none.
pub const DEFAULT_TRACK_TITLE: &str = "Learning Song";

/// Canonical lifecycle state of a generation task.
///
/// Provider-specific status strings are mapped onto this set by the
/// response normalizer; see [`crate::normalize::canonical_status`].
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// The task has been submitted but has not reached a terminal state.
    Pending,
    /// The task completed and audio may be available.
    Succeeded,
    /// The provider explicitly reported failure.
    Failed,
    /// The local polling budget was exhausted while the task was pending.
    TimedOut,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// One generated audio candidate within a completed task.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Track {
    /// Provider-assigned identifier; numeric ids are stringified.
    pub id: Option<String>,
    /// Display title, falling back to [`DEFAULT_TRACK_TITLE`].
    pub title: String,
    /// Resolved playable URL, absent until the provider attaches media.
    pub audio_url: Option<String>,
    /// Optional cover art URL.
    pub image_url: Option<String>,
}

/// One asynchronous song-generation request tracked by a provider-assigned
/// identifier. The provider is the source of truth for the status; this
/// struct only captures what the last poll observed.
#[derive(Debug, Serialize, Clone)]
pub struct GenerationTask {
    pub task_id: String,
    pub status: TaskState,
    /// Populated only once `status` is [`TaskState::Succeeded`].
    pub tracks: Vec<Track>,
}

impl GenerationTask {
    /// Playable URLs from the task's tracks, deduplicated in track order.
    pub fn audio_urls(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.tracks
            .iter()
            .filter_map(|t| t.audio_url.clone())
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}

/// The outbound request body for a song-generation submission.
///
/// Built once per pipeline run and immutable afterwards. The lyrics text is
/// already truncated to the provider limit by the time this is constructed;
/// see [`crate::compose::truncate_lyrics`].
#[derive(Debug, Clone)]
pub struct GenerationPayload {
    pub lyrics: String,
    /// Style/genre description forwarded to the provider.
    pub style: String,
    pub title: String,
    /// Provider model selector, e.g. `"auto"`.
    pub model: String,
    pub instrumental: bool,
    pub callback_url: Option<String>,
}

/// Wire format for the Suno generation endpoint.
#[derive(Serialize, Debug)]
pub(crate) struct SunoGenerateRequest<'a> {
    pub(crate) prompt: &'a str,
    pub(crate) style: &'a str,
    pub(crate) title: &'a str,
    #[serde(rename = "customMode")]
    pub(crate) custom_mode: bool,
    pub(crate) instrumental: bool,
    pub(crate) model: &'a str,
    #[serde(rename = "callBackUrl", skip_serializing_if = "Option::is_none")]
    pub(crate) call_back_url: Option<&'a str>,
}

impl<'a> SunoGenerateRequest<'a> {
    pub(crate) fn from_payload(payload: &'a GenerationPayload) -> Self {
        Self {
            prompt: &payload.lyrics,
            style: &payload.style,
            title: &payload.title,
            custom_mode: true,
            instrumental: payload.instrumental,
            model: &payload.model,
            call_back_url: payload.callback_url.as_deref(),
        }
    }
}

/// Wire format for the Mureka generation endpoint.
#[derive(Serialize, Debug)]
pub(crate) struct MurekaGenerateRequest<'a> {
    pub(crate) lyrics: &'a str,
    pub(crate) model: &'a str,
    pub(crate) prompt: &'a str,
}

impl<'a> MurekaGenerateRequest<'a> {
    pub(crate) fn from_payload(payload: &'a GenerationPayload) -> Self {
        Self {
            lyrics: &payload.lyrics,
            model: &payload.model,
            prompt: &payload.style,
        }
    }
}
