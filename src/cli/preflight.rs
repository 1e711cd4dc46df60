//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{CoursemateError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion embeds content, so it needs the API key.
    Ingest,
    /// Answering questions needs the API key.
    Ask,
    /// Tool lookups embed the query.
    Lookup,
    /// Listing courses only reads the store.
    Browse,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ingest | Operation::Ask | Operation::Lookup => {
            check_api_key()?;
            check_data_dir(settings)?;
        }
        Operation::Browse => {
            check_data_dir(settings)?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(CoursemateError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(CoursemateError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Make sure the data directory can be created.
fn check_data_dir(settings: &Settings) -> Result<()> {
    let dir = settings.data_dir();
    std::fs::create_dir_all(&dir).map_err(|e| {
        CoursemateError::Config(format!(
            "Cannot create data directory {}: {}",
            dir.display(),
            e
        ))
    })
}
