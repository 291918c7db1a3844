//! CLI pipeline: takes a study document path and runs it end to end.
//!
//! Usage:
//! `melody-pipeline <path-to-image-or-pdf>`
//!
//! `OPENAI_API_KEY` must be set; a song provider key (`SUNO_API_KEY` or
//! `MUREKA_API_KEY`) is optional — without one the run stops after the
//! textual artifacts.

use std::env;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use melody_learning::{Pipeline, Settings, StudyDocument};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Please provide a document path as an argument."))?;

    let bytes = std::fs::read(&path)?;
    let document = StudyDocument::from_bytes(bytes, Some(&path));

    let settings = Settings::from_env();
    let has_provider_key = settings.suno_api_key.is_some() || settings.mureka_api_key.is_some();
    let pipeline = Pipeline::new(settings)?;

    let artifacts = pipeline.run(&document).await?;

    println!("\n[Study text]\n{}", artifacts.study_text);
    println!("\n[Melody guide]\n{}", artifacts.mnemonic_plan);

    if let Some(task) = &artifacts.task {
        println!(
            "\n[Song] task {} finished with status {}",
            task.task_id, task.status
        );
        if artifacts.saved_files.is_empty() {
            println!("No audio URLs were found in the provider response.");
        } else {
            println!("Saved {} file(s):", artifacts.saved_files.len());
            for path in &artifacts.saved_files {
                println!("- {}", path.display());
            }
        }
    } else if !has_provider_key {
        println!("\n[Song] no provider API key configured, generation skipped.");
    }

    Ok(())
}
