//! Courses command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;

/// Run the courses command.
pub async fn run_courses(settings: Settings) -> Result<()> {
    preflight::check(Operation::Browse, &settings)?;
    let rag = RagSystem::new(&settings)?;

    match rag.course_analytics().await {
        Ok(analytics) if analytics.total_courses == 0 => {
            Output::info("No courses indexed yet. Use 'coursemate ingest <dir>' to add content.");
        }
        Ok(analytics) => {
            Output::header(&format!("Indexed Courses ({})", analytics.total_courses));
            println!();
            for title in &analytics.course_titles {
                Output::list_item(title);
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list courses: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
