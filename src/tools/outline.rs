//! Course outline lookup.

use super::{SourceRecord, Tool, ToolDefinition, ToolOutput};
use crate::error::{CoursemateError, Result};
use crate::models::parse_lessons_json;
use crate::retrieval::Retriever;
use crate::vector_store::CatalogEntry;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct OutlineInput {
    course_name: String,
}

/// Renders a course's title, link and lesson list.
pub struct CourseOutlineTool {
    retriever: Arc<dyn Retriever>,
}

impl CourseOutlineTool {
    pub const NAME: &'static str = "get_course_outline";

    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }

    /// Resolve a (partial) course name and render its outline.
    pub async fn outline(&self, course_name: &str) -> ToolOutput {
        let title = match self.retriever.resolve_course_name(course_name).await {
            Ok(Some(title)) => title,
            Ok(None) => {
                return ToolOutput::text(CoursemateError::CourseNotFound(course_name.to_string()).to_string())
            }
            Err(e) => return ToolOutput::text(format!("Error retrieving course outline: {}", e)),
        };

        match self.retriever.course_metadata(&title).await {
            Ok(Some(entry)) => match render_outline(&entry) {
                Ok(text) => ToolOutput::with_sources(
                    text,
                    vec![SourceRecord::new(
                        format!("{} - Course Outline", entry.title),
                        entry.course_link.clone().filter(|link| !link.is_empty()),
                    )],
                ),
                Err(e) => {
                    warn!("Malformed lesson list for '{}': {}", title, e);
                    ToolOutput::text(format!("Error retrieving course outline: {}", e))
                }
            },
            Ok(None) => ToolOutput::text(format!("Could not retrieve outline for course '{}'", title)),
            Err(e) => ToolOutput::text(format!("Error retrieving course outline: {}", e)),
        }
    }
}

fn render_outline(entry: &CatalogEntry) -> Result<String> {
    let mut lessons = parse_lessons_json(&entry.lessons_json)?;
    lessons.sort_by_key(|lesson| lesson.lesson_number);

    let mut lines = vec![format!("Course: {}", entry.title)];
    if let Some(link) = entry.course_link.as_deref().filter(|link| !link.is_empty()) {
        lines.push(format!("Course Link: {}", link));
    }
    lines.push(format!("Total Lessons: {}", lessons.len()));

    if !lessons.is_empty() {
        lines.push(String::new());
        lines.push("Lessons:".to_string());
        for lesson in &lessons {
            let mut line = format!("  Lesson {}: {}", lesson.lesson_number, lesson.title);
            if let Some(link) = lesson.lesson_link.as_deref().filter(|link| !link.is_empty()) {
                line.push_str(&format!(" ({})", link));
            }
            lines.push(line);
        }
    }

    Ok(lines.join("\n"))
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Get the complete outline of a course: title, course link and every lesson"
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput> {
        let input: OutlineInput = serde_json::from_value(input)
            .map_err(|e| CoursemateError::InvalidInput(format!("{}: {}", Self::NAME, e)))?;

        Ok(self.outline(&input.course_name).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubRetriever, CHROMA_TITLE, MCP_TITLE};
    use serde_json::json;

    fn tool() -> CourseOutlineTool {
        CourseOutlineTool::new(Arc::new(StubRetriever))
    }

    #[tokio::test]
    async fn test_outline_without_course_link() {
        let output = tool().outline("Advanced Retrieval").await;

        let expected = format!(
            "Course: {}\nTotal Lessons: 2\n\nLessons:\n  Lesson 0: Introduction\n  Lesson 1: Why MCP",
            CHROMA_TITLE
        );
        assert_eq!(output.text, expected);
        assert_eq!(
            output.sources,
            vec![SourceRecord::new(format!("{} - Course Outline", CHROMA_TITLE), None)]
        );
    }

    #[tokio::test]
    async fn test_outline_sorts_lessons_and_shows_links() {
        let output = tool().outline("mcp").await;

        let expected = format!(
            "Course: {}\nCourse Link: https://example.com/mcp\nTotal Lessons: 3\n\nLessons:\n  \
             Lesson 0: Introduction (https://example.com/lesson0)\n  \
             Lesson 1: Why MCP\n  \
             Lesson 2: MCP Architecture (https://example.com/lesson2)",
            MCP_TITLE
        );
        assert_eq!(output.text, expected);
        assert_eq!(
            output.sources,
            vec![SourceRecord::new(
                format!("{} - Course Outline", MCP_TITLE),
                Some("https://example.com/mcp".to_string())
            )]
        );
    }

    #[tokio::test]
    async fn test_failures_are_rendered_as_text() {
        let output = tool().outline("Python Basics").await;
        assert_eq!(output.text, "No course found matching 'Python Basics'");
        assert!(output.sources.is_empty());

        let output = tool().outline("ghost").await;
        assert_eq!(output.text, "Could not retrieve outline for course 'Ghost Course'");

        let output = tool().outline("broken").await;
        assert!(output.text.starts_with("Error retrieving course outline:"));
        assert!(output.sources.is_empty());

        let output = tool().outline("faulty").await;
        assert_eq!(
            output.text,
            "Error retrieving course outline: Vector store error: disk unavailable"
        );
    }

    #[tokio::test]
    async fn test_execute_requires_course_name() {
        let output = tool().execute(json!({"course_name": "MCP"})).await.unwrap();
        assert!(output.text.starts_with("Course: MCP"));

        assert!(tool().execute(json!({})).await.is_err());
    }
}
