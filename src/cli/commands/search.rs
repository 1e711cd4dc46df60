//! Direct tool commands: content search and course outline.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use crate::tools::{CourseOutlineTool, CourseSearchTool, ToolOutput};
use anyhow::Result;
use serde_json::json;

/// Run the search command.
pub async fn run_search(
    query: &str,
    course: Option<String>,
    lesson: Option<i64>,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Lookup, &settings)?;
    let rag = RagSystem::new(&settings)?;

    let mut input = json!({ "query": query });
    if let Some(course) = course {
        input["course_name"] = json!(course);
    }
    if let Some(lesson) = lesson {
        input["lesson_number"] = json!(lesson);
    }

    let spinner = Output::spinner("Searching...");
    let output = rag.run_tool(CourseSearchTool::NAME, input).await;
    spinner.finish_and_clear();

    print_tool_output(&output);
    Ok(())
}

/// Run the outline command.
pub async fn run_outline(course: &str, settings: Settings) -> Result<()> {
    preflight::check(Operation::Lookup, &settings)?;
    let rag = RagSystem::new(&settings)?;

    let output = rag
        .run_tool(CourseOutlineTool::NAME, json!({ "course_name": course }))
        .await;

    print_tool_output(&output);
    Ok(())
}

fn print_tool_output(output: &ToolOutput) {
    if output.sources.is_empty() {
        Output::warning(&output.text);
        return;
    }
    println!("\n{}", output.text);
    Output::sources(&output.sources);
}
