//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(dir: &str, clear: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let folder = Settings::expand_path(dir);
    if !folder.is_dir() {
        Output::error(&format!("Folder not found: {}", folder.display()));
        anyhow::bail!("Folder not found: {}", folder.display());
    }

    let rag = RagSystem::new(&settings)?;

    let spinner = Output::spinner("Indexing course documents...");
    let result = rag.add_course_folder(Path::new(&folder), clear).await;
    spinner.finish_and_clear();

    match result {
        Ok((0, _)) => {
            Output::info("No new courses found. Already indexed courses are skipped.");
        }
        Ok((courses, chunks)) => {
            Output::success(&format!("Added {} courses with {} chunks", courses, chunks));
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    }

    let analytics = rag.course_analytics().await?;
    Output::kv("Total courses", &analytics.total_courses.to_string());

    Ok(())
}
