//! Turn study documents into easy-to-memorize songs.
//!
//! The crate extracts text from a photographed or scanned study document,
//! converts it into a mnemonic "melody guide", and drives an asynchronous
//! song-generation provider until audio is ready.
//!
//! ## Features
//! - Submission, polling, and timeout handling for two song providers
//!   behind one contract ([`SongClient`]).
//! - Schema-tolerant response normalization: audio URLs and task status are
//!   located across the known provider response shapes.
//! - Best-effort audio download with an inspectable batch outcome.
//! - Image OCR and PDF text extraction front ends.
//! - An end-to-end [`Pipeline`] plus an HTTP API over it.
//!
//! ## Example
//!
//! ```no_run
//! use melody_learning::{Pipeline, Settings, StudyDocument};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let settings = Settings::from_env();
//! let pipeline = Pipeline::new(settings)?;
//!
//! let bytes = std::fs::read("notes.png")?;
//! let document = StudyDocument::from_bytes(bytes, Some("notes.png"));
//! let artifacts = pipeline.run(&document).await?;
//!
//! println!("{}", artifacts.mnemonic_plan);
//! for path in &artifacts.saved_files {
//!     println!("saved {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod completion;
pub mod compose;
pub mod config;
pub mod error;
pub mod extract;
pub mod lyrics;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod server;
pub mod types;

pub use completion::CompletionClient;
pub use config::{ProviderKind, Settings};
pub use error::MelodyError;
pub use extract::StudyDocument;
pub use pipeline::{Pipeline, PipelineArtifacts};
pub use provider::{MurekaClient, SongClient, SunoClient};
pub use types::{GenerationPayload, GenerationTask, TaskState, Track};
