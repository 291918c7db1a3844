//! Process configuration.
//!
//! All environment lookups happen here, once, at startup. Core logic only
//! ever sees an owned [`Settings`] value — there is no global state and no
//! env access inside clients or the pipeline.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SUNO_BASE_URL: &str = "https://api.sunoapi.org/api/v1/";
pub const DEFAULT_MUREKA_BASE_URL: &str = "https://api.mureka.ai/v1/";
pub const DEFAULT_SONG_MODEL: &str = "auto";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2500);
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(10);
pub const DEFAULT_OUTPUT_DIR: &str = "outputs/audio";
pub const DEFAULT_AUDIO_PREFIX: &str = "audio";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Which song provider the pipeline should drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Suno,
    Mureka,
}

/// Runtime configuration, constructed once and passed into constructors.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub suno_api_key: Option<String>,
    pub suno_base_url: String,
    pub mureka_api_key: Option<String>,
    pub mureka_base_url: String,
    /// Forced provider selection; `None` picks whichever provider has a key,
    /// preferring Suno.
    pub provider: Option<ProviderKind>,
    pub song_model: String,
    pub callback_url: Option<String>,
    pub poll_interval: Duration,
    pub generation_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub output_dir: PathBuf,
    pub audio_prefix: String,
    /// Keep polling when a success status arrives with no extractable
    /// tracks. See DESIGN.md for the rationale.
    pub require_tracks_on_success: bool,
    /// Generate lyrics with a dedicated completion call instead of
    /// extracting them from the mnemonic plan.
    pub pregenerate_lyrics: bool,
    pub bind_addr: String,
}

impl Settings {
    /// Reads every knob from the environment, falling back to the documented
    /// defaults. Call `dotenvy::dotenv()` first if a `.env` file should be
    /// honored.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env_opt("OPENAI_API_KEY"),
            openai_base_url: env_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            openai_model: env_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            suno_api_key: env_opt("SUNO_API_KEY"),
            suno_base_url: env_or("SUNO_BASE_URL", DEFAULT_SUNO_BASE_URL),
            mureka_api_key: env_opt("MUREKA_API_KEY"),
            mureka_base_url: env_or("MUREKA_BASE_URL", DEFAULT_MUREKA_BASE_URL),
            provider: env_opt("SONG_PROVIDER").and_then(|raw| match raw.to_lowercase().as_str() {
                "suno" => Some(ProviderKind::Suno),
                "mureka" => Some(ProviderKind::Mureka),
                _ => None,
            }),
            song_model: env_or("SONG_MODEL", DEFAULT_SONG_MODEL),
            callback_url: env_opt("SONG_CALLBACK_URL"),
            poll_interval: env_secs("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL),
            generation_timeout: env_secs("GENERATION_TIMEOUT_SECS", DEFAULT_GENERATION_TIMEOUT),
            max_retries: env_parse("MAX_RETRIES", DEFAULT_MAX_RETRIES),
            retry_backoff: env_secs("RETRY_BACKOFF_SECS", DEFAULT_RETRY_BACKOFF),
            output_dir: PathBuf::from(env_or("AUDIO_OUTPUT_DIR", DEFAULT_OUTPUT_DIR)),
            audio_prefix: env_or("AUDIO_FILE_PREFIX", DEFAULT_AUDIO_PREFIX),
            require_tracks_on_success: env_bool("REQUIRE_TRACKS_ON_SUCCESS", true),
            pregenerate_lyrics: env_bool("PREGENERATE_LYRICS", false),
            bind_addr: env_or("BIND_ADDR", DEFAULT_BIND_ADDR),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            suno_api_key: None,
            suno_base_url: DEFAULT_SUNO_BASE_URL.to_string(),
            mureka_api_key: None,
            mureka_base_url: DEFAULT_MUREKA_BASE_URL.to_string(),
            provider: None,
            song_model: DEFAULT_SONG_MODEL.to_string(),
            callback_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            audio_prefix: DEFAULT_AUDIO_PREFIX.to_string(),
            require_tracks_on_success: true,
            pregenerate_lyrics: false,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_opt(key)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

fn env_secs(key: &str, default: Duration) -> Duration {
    env_opt(key)
        .and_then(|raw| raw.parse::<f64>().ok())
        .filter(|secs| *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|raw| matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
