#[derive(Debug, thiserror::Error)]
pub enum MelodyError {
    #[error("API key is missing. Please provide it or set the corresponding environment variable.")]
    MissingApiKey,
    #[error("Network request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Failed to parse API response: {0}")]
    ResponseParseFailed(#[from] serde_json::Error),
    #[error("URL parsing failed: {0}")]
    UrlParseFailed(#[from] url::ParseError),
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Song submission rejected: {message}")]
    Submission { message: String },
    #[error("Song generation failed: {message}")]
    GenerationFailed { message: String },
    #[error("Timed out waiting for task {task_id} (last status: {last_status:?})")]
    Timeout {
        task_id: String,
        last_status: Option<String>,
    },
    #[error("Text extraction failed: {message}")]
    Extraction { message: String },
    #[error("Completion request failed: {message}")]
    Completion { message: String },
}
