//! Tools the assistant can invoke during a query.
//!
//! Every tool exposes a [`ToolDefinition`] (the schema offered to the
//! reasoning engine) and an `execute` entry point that returns the text fed
//! back to the engine together with the sources worth attributing.

mod outline;
mod registry;
mod search;

pub use outline::CourseOutlineTool;
pub use registry::{ToolDispatcher, ToolRegistry, ToolResultRecord};
pub use search::CourseSearchTool;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Schema of a tool as offered to the reasoning engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique within a registry.
    pub name: String,
    pub description: String,
    /// JSON Schema of the tool's named parameters.
    pub input_schema: serde_json::Value,
}

/// One attribution unit shown to the user alongside an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub text: String,
    pub link: Option<String>,
}

impl SourceRecord {
    pub fn new(text: impl Into<String>, link: Option<String>) -> Self {
        Self {
            text: text.into(),
            link,
        }
    }
}

/// What one tool invocation produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Text handed back to the reasoning engine.
    pub text: String,
    /// Sources produced by this invocation. Empty for failures and misses.
    pub sources: Vec<SourceRecord>,
}

impl ToolOutput {
    /// Output without attribution.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_sources(text: impl Into<String>, sources: Vec<SourceRecord>) -> Self {
        Self {
            text: text.into(),
            sources,
        }
    }
}

/// Trait for executable tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema offered to the reasoning engine. Pure.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the engine-supplied named parameters.
    ///
    /// Expected misses (no results, unknown course) are `Ok` outputs whose
    /// text explains the miss; `Err` is reserved for faults such as
    /// malformed parameters.
    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Canned retriever mirroring a two-course catalog.

    use crate::error::{CoursemateError, Result};
    use crate::models::{Course, Lesson};
    use crate::retrieval::{Passage, Retriever};
    use crate::vector_store::CatalogEntry;
    use async_trait::async_trait;

    pub const MCP_TITLE: &str = "MCP: Build Rich-Context AI Apps with Anthropic";
    pub const CHROMA_TITLE: &str = "Advanced Retrieval for AI with Chroma";

    pub struct StubRetriever;

    fn mcp_course() -> Course {
        let mut course = Course::new(MCP_TITLE);
        course.course_link = Some("https://example.com/mcp".to_string());
        course.lessons = vec![
            Lesson::new(2, "MCP Architecture", Some("https://example.com/lesson2".to_string())),
            Lesson::new(0, "Introduction", Some("https://example.com/lesson0".to_string())),
            Lesson::new(1, "Why MCP", None),
        ];
        course
    }

    fn chroma_course() -> Course {
        let mut course = Course::new(CHROMA_TITLE);
        course.lessons = vec![
            Lesson::new(0, "Introduction", None),
            Lesson::new(1, "Why MCP", None),
        ];
        course
    }

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn search(
            &self,
            query: &str,
            course_name: Option<&str>,
            _lesson_number: Option<i64>,
        ) -> Result<Vec<Passage>> {
            let query = query.to_lowercase();
            if let Some(name) = course_name {
                if self.resolve_course_name(name).await?.is_none() {
                    return Err(CoursemateError::CourseNotFound(name.to_string()));
                }
            }
            if query.contains("error") {
                return Err(CoursemateError::Search("Connection failed".to_string()));
            }
            if query.contains("empty") {
                return Ok(Vec::new());
            }
            if query.contains("mcp") {
                return Ok(vec![
                    Passage {
                        content: "MCP is an open protocol.".to_string(),
                        course_title: MCP_TITLE.to_string(),
                        lesson_number: Some(1),
                    },
                    Passage {
                        content: "MCP uses a client-server architecture.".to_string(),
                        course_title: MCP_TITLE.to_string(),
                        lesson_number: Some(2),
                    },
                ]);
            }
            Ok(vec![Passage {
                content: "Generic content about AI.".to_string(),
                course_title: "Unknown Course".to_string(),
                lesson_number: None,
            }])
        }

        async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
            let name = name.to_lowercase();
            if name.contains("broken") {
                Ok(Some("Broken Course".to_string()))
            } else if name.contains("ghost") {
                Ok(Some("Ghost Course".to_string()))
            } else if name.contains("faulty") {
                Ok(Some("Faulty Course".to_string()))
            } else if name.contains("mcp") {
                Ok(Some(MCP_TITLE.to_string()))
            } else if name.contains("advanced") || name.contains("retrieval") {
                Ok(Some(CHROMA_TITLE.to_string()))
            } else {
                Ok(None)
            }
        }

        async fn lesson_link(&self, course_title: &str, lesson_number: i64) -> Result<Option<String>> {
            if course_title == MCP_TITLE && lesson_number < 4 {
                Ok(Some(format!("https://example.com/lesson{}", lesson_number)))
            } else {
                Ok(None)
            }
        }

        async fn course_metadata(&self, course_title: &str) -> Result<Option<CatalogEntry>> {
            let course = match course_title {
                MCP_TITLE => mcp_course(),
                CHROMA_TITLE => chroma_course(),
                "Broken Course" => {
                    let mut entry = CatalogEntry::from_course(&Course::new("Broken Course"), vec![])?;
                    entry.lessons_json = "{not json".to_string();
                    return Ok(Some(entry));
                }
                "Faulty Course" => {
                    return Err(CoursemateError::VectorStore("disk unavailable".to_string()))
                }
                _ => return Ok(None),
            };
            Ok(Some(CatalogEntry::from_course(&course, vec![])?))
        }
    }
}
