//! Semantic search over course content.

use super::{SourceRecord, Tool, ToolDefinition, ToolOutput};
use crate::error::{CoursemateError, Result};
use crate::retrieval::{Passage, Retriever};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SearchInput {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<i64>,
}

/// Searches course transcripts, optionally narrowed to a course and lesson.
pub struct CourseSearchTool {
    retriever: Arc<dyn Retriever>,
}

impl CourseSearchTool {
    pub const NAME: &'static str = "search_course_content";

    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }

    /// Search and format the passages for the engine.
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<i64>,
    ) -> ToolOutput {
        let passages = match self.retriever.search(query, course_name, lesson_number).await {
            Ok(passages) => passages,
            Err(e) => {
                debug!("Search failed: {}", e);
                return ToolOutput::text(e.to_string());
            }
        };

        if passages.is_empty() {
            return ToolOutput::text(empty_message(course_name, lesson_number));
        }

        self.format_passages(passages).await
    }

    async fn format_passages(&self, passages: Vec<Passage>) -> ToolOutput {
        let mut blocks = Vec::with_capacity(passages.len());
        let mut sources = Vec::with_capacity(passages.len());

        for passage in passages {
            let label = match passage.lesson_number {
                Some(n) => format!("{} - Lesson {}", passage.course_title, n),
                None => passage.course_title.clone(),
            };

            let link = match passage.lesson_number {
                Some(n) => self.lesson_link(&passage.course_title, n).await,
                None => None,
            };

            blocks.push(format!("[{}]\n{}", label, passage.content));
            sources.push(SourceRecord::new(label, link));
        }

        ToolOutput::with_sources(blocks.join("\n\n"), sources)
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: i64) -> Option<String> {
        match self.retriever.lesson_link(course_title, lesson_number).await {
            Ok(link) => link,
            Err(e) => {
                warn!("Lesson link lookup failed for '{}': {}", course_title, e);
                None
            }
        }
    }
}

fn empty_message(course_name: Option<&str>, lesson_number: Option<i64>) -> String {
    let mut message = "No relevant content found".to_string();
    if let Some(course) = course_name {
        message.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = lesson_number {
        message.push_str(&format!(" in lesson {}", lesson));
    }
    message.push('.');
    message
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput> {
        let input: SearchInput = serde_json::from_value(input)
            .map_err(|e| CoursemateError::InvalidInput(format!("{}: {}", Self::NAME, e)))?;

        Ok(self
            .search(&input.query, input.course_name.as_deref(), input.lesson_number)
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubRetriever, MCP_TITLE};
    use serde_json::json;

    fn tool() -> CourseSearchTool {
        CourseSearchTool::new(Arc::new(StubRetriever))
    }

    #[test]
    fn test_definition() {
        let definition = tool().definition();
        assert_eq!(definition.name, "search_course_content");
        assert_eq!(definition.input_schema["required"], json!(["query"]));
        assert!(definition.input_schema["properties"]["lesson_number"].is_object());
    }

    #[tokio::test]
    async fn test_formats_passages_and_sources() {
        let output = tool().search("What is MCP?", None, None).await;

        let expected = format!(
            "[{t} - Lesson 1]\nMCP is an open protocol.\n\n[{t} - Lesson 2]\nMCP uses a client-server architecture.",
            t = MCP_TITLE
        );
        assert_eq!(output.text, expected);
        assert_eq!(
            output.sources,
            vec![
                SourceRecord::new(
                    format!("{} - Lesson 1", MCP_TITLE),
                    Some("https://example.com/lesson1".to_string())
                ),
                SourceRecord::new(
                    format!("{} - Lesson 2", MCP_TITLE),
                    Some("https://example.com/lesson2".to_string())
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_passage_without_lesson() {
        let output = tool().search("general AI", None, None).await;
        assert_eq!(output.text, "[Unknown Course]\nGeneric content about AI.");
        assert_eq!(output.sources, vec![SourceRecord::new("Unknown Course", None)]);
    }

    #[tokio::test]
    async fn test_empty_results_name_active_filters() {
        let output = tool().search("empty topic", Some("MCP"), Some(5)).await;
        assert!(output.text.contains("course 'MCP'"));
        assert!(output.text.contains("lesson 5"));
        assert!(output.sources.is_empty());

        let output = tool().search("empty topic", None, Some(0)).await;
        assert_eq!(output.text, "No relevant content found in lesson 0.");

        let output = tool().search("empty topic", None, None).await;
        assert_eq!(output.text, "No relevant content found.");
    }

    #[tokio::test]
    async fn test_retrieval_errors_are_returned_as_text() {
        let output = tool().search("error please", None, None).await;
        assert_eq!(output.text, "Search error: Connection failed");
        assert!(output.sources.is_empty());

        let output = tool().search("MCP", Some("Python Basics"), None).await;
        assert_eq!(output.text, "No course found matching 'Python Basics'");
    }

    #[tokio::test]
    async fn test_execute_parses_named_parameters() {
        let output = tool()
            .execute(json!({"query": "empty", "course_name": "MCP", "lesson_number": 3}))
            .await
            .unwrap();
        assert_eq!(output.text, "No relevant content found in course 'MCP' in lesson 3.");

        let err = tool().execute(json!({"course_name": "MCP"})).await.unwrap_err();
        assert!(matches!(err, CoursemateError::InvalidInput(_)));
    }
}
