//! The course assistant facade wiring retrieval, tools and generation.

use super::session::SessionManager;
use crate::agent::AiGenerator;
use crate::config::{Prompts, Settings, VectorStoreProvider};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::ingest::{is_course_file, DocumentProcessor};
use crate::llm::{OpenAIEngine, ReasoningEngine};
use crate::models::{Course, CourseChunk};
use crate::retrieval::CourseRetriever;
use crate::tools::{
    CourseOutlineTool, CourseSearchTool, SourceRecord, ToolDefinition, ToolOutput, ToolRegistry,
};
use crate::vector_store::{ContentDocument, MemoryVectorStore, SqliteVectorStore, VectorStore};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Answer to one user query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceRecord>,
    pub session_id: String,
}

/// Catalog statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Course assistant: ingestion, tool-using answers and sessions.
pub struct RagSystem {
    retriever: Arc<CourseRetriever>,
    processor: DocumentProcessor,
    generator: AiGenerator,
    registry: ToolRegistry,
    tool_definitions: Vec<ToolDefinition>,
    sessions: SessionManager,
}

impl RagSystem {
    /// Build the system from settings with OpenAI-backed components.
    pub fn new(settings: &Settings) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);

        let vector_store: Arc<dyn VectorStore> = match settings.vector_store.provider {
            VectorStoreProvider::Sqlite => {
                let path = settings.sqlite_path();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Arc::new(SqliteVectorStore::new(&path)?)
            }
            VectorStoreProvider::Memory => Arc::new(MemoryVectorStore::new()),
        };

        let engine: Arc<dyn ReasoningEngine> = Arc::new(OpenAIEngine::from_settings(&settings.ai)?);

        Self::with_components(settings, vector_store, embedder, engine)
    }

    /// Build the system around the given store, embedder and engine.
    pub fn with_components(
        settings: &Settings,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        engine: Arc<dyn ReasoningEngine>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let retriever = Arc::new(
            CourseRetriever::new(vector_store, embedder)
                .with_max_results(settings.search.max_results),
        );

        let registry = ToolRegistry::new()
            .with_tool(Arc::new(CourseSearchTool::new(retriever.clone())))?
            .with_tool(Arc::new(CourseOutlineTool::new(retriever.clone())))?;
        let tool_definitions = registry.definitions();

        let generator = AiGenerator::new(engine)
            .with_prompts(prompts)
            .with_max_tool_rounds(settings.ai.max_tool_rounds);

        Ok(Self {
            retriever,
            processor: DocumentProcessor::from_settings(&settings.ingest),
            generator,
            registry,
            tool_definitions,
            sessions: SessionManager::new(settings.session.max_history),
        })
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.retriever.vector_store()
    }

    /// Ingest one course file. Returns the course and how many chunks were stored.
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        let (course, chunks) = self.processor.process_file(path)?;
        let stored = self.index_course(&course, &chunks).await?;
        Ok((course, stored))
    }

    async fn index_course(&self, course: &Course, chunks: &[CourseChunk]) -> Result<usize> {
        self.retriever.add_course_metadata(course).await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.retriever.embedder().embed_batch(&texts).await?;
        let docs: Vec<ContentDocument> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| ContentDocument::from_chunk(chunk, embedding))
            .collect();

        self.vector_store().upsert_chunks(&docs).await
    }

    /// Ingest every `.txt` file in a folder, skipping courses already indexed.
    ///
    /// Returns `(courses_added, chunks_added)`. Unreadable files are logged
    /// and skipped.
    #[instrument(skip(self), fields(path = %folder.display()))]
    pub async fn add_course_folder(&self, folder: &Path, clear_existing: bool) -> Result<(usize, usize)> {
        if clear_existing {
            info!("Clearing existing course data");
            self.vector_store().clear().await?;
        }

        if !folder.is_dir() {
            warn!("Folder {} does not exist", folder.display());
            return Ok((0, 0));
        }

        let mut files: Vec<_> = std::fs::read_dir(folder)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_course_file(path))
            .collect();
        files.sort();

        let mut existing: HashSet<String> =
            self.vector_store().course_titles().await?.into_iter().collect();

        let mut courses = 0;
        let mut chunks = 0;

        for file in files {
            let (course, parsed_chunks) = match self.processor.process_file(&file) {
                Ok(result) => result,
                Err(e) => {
                    warn!("Skipping {}: {}", file.display(), e);
                    continue;
                }
            };

            if existing.contains(&course.title) {
                info!("Course already indexed: {}", course.title);
                continue;
            }

            match self.index_course(&course, &parsed_chunks).await {
                Ok(stored) => {
                    info!("Added course '{}' with {} chunks", course.title, stored);
                    existing.insert(course.title);
                    courses += 1;
                    chunks += stored;
                }
                Err(e) => warn!("Failed to index {}: {}", file.display(), e),
            }
        }

        Ok((courses, chunks))
    }

    /// Answer a query within a session, creating one when none is given.
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> Result<QueryResponse> {
        self.query_with_rounds(query, session_id, None).await
    }

    /// [`query`](Self::query) with an explicit tool-round budget.
    #[instrument(skip(self, query))]
    pub async fn query_with_rounds(
        &self,
        query: &str,
        session_id: Option<&str>,
        max_rounds: Option<usize>,
    ) -> Result<QueryResponse> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.sessions.create_session()?,
        };

        let history = self.sessions.conversation_history(&session_id)?;
        let prompt = format!("Answer this question about course materials: {}", query);

        let answer = self
            .generator
            .generate_response(
                &prompt,
                history.as_deref(),
                Some(self.tool_definitions.as_slice()),
                Some(&self.registry),
                max_rounds,
            )
            .await;

        self.sessions.add_exchange(&session_id, query, &answer.text)?;

        Ok(QueryResponse {
            answer: answer.text,
            sources: answer.sources,
            session_id,
        })
    }

    /// Run one tool directly, outside any conversation.
    pub async fn run_tool(&self, name: &str, input: serde_json::Value) -> ToolOutput {
        self.registry.execute(name, input).await.1
    }

    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        let course_titles = self.vector_store().course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::KeywordEmbedder;
    use crate::llm::testing::{text, tool_use, ScriptedEngine};
    use serde_json::json;

    const MCP_DOC: &str = "Course Title: MCP: Build Rich-Context AI Apps with Anthropic
Course Link: https://example.com/mcp
Course Instructor: Elie Schoppik

Lesson 0: Introduction
Lesson Link: https://example.com/mcp/lesson0
Welcome to the MCP course. MCP connects AI apps to tools.

Lesson 1: Architecture
MCP uses a client server architecture. Servers expose tools and resources.
";

    const CHROMA_DOC: &str = "Course Title: Advanced Retrieval for AI with Chroma
Course Instructor: Anton Troynikov

Lesson 0: Overview
Embeddings power retrieval. Chroma stores vectors.
";

    fn system(engine: Arc<ScriptedEngine>) -> RagSystem {
        RagSystem::with_components(
            &Settings::default(),
            Arc::new(MemoryVectorStore::new()),
            Arc::new(KeywordEmbedder),
            engine,
        )
        .unwrap()
    }

    fn docs_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("course1_script.txt"), MCP_DOC).unwrap();
        std::fs::write(dir.path().join("course2_script.txt"), CHROMA_DOC).unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_add_course_folder_skips_existing() {
        let rag = system(ScriptedEngine::new(vec![]));
        let dir = docs_dir();

        let (courses, chunks) = rag.add_course_folder(dir.path(), false).await.unwrap();
        assert_eq!(courses, 2);
        assert_eq!(chunks, 3);

        let (courses, chunks) = rag.add_course_folder(dir.path(), false).await.unwrap();
        assert_eq!((courses, chunks), (0, 0));

        let (courses, _) = rag.add_course_folder(dir.path(), true).await.unwrap();
        assert_eq!(courses, 2);

        let analytics = rag.course_analytics().await.unwrap();
        assert_eq!(analytics.total_courses, 2);
        assert_eq!(
            analytics.course_titles,
            vec![
                "Advanced Retrieval for AI with Chroma".to_string(),
                "MCP: Build Rich-Context AI Apps with Anthropic".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_folder_adds_nothing() {
        let rag = system(ScriptedEngine::new(vec![]));
        let result = rag
            .add_course_folder(Path::new("/nonexistent/coursemate/docs"), false)
            .await
            .unwrap();
        assert_eq!(result, (0, 0));
    }

    #[tokio::test]
    async fn test_query_with_content_search() {
        let engine = ScriptedEngine::new(vec![
            tool_use(&[(
                "tool_1",
                "search_course_content",
                json!({"query": "architecture", "course_name": "MCP", "lesson_number": 1}),
            )]),
            text("MCP uses a client-server architecture."),
        ]);
        let rag = system(engine.clone());
        rag.add_course_folder(docs_dir().path(), false).await.unwrap();

        let response = rag.query("How is MCP built?", None).await.unwrap();

        assert_eq!(response.answer, "MCP uses a client-server architecture.");
        assert_eq!(response.session_id, "session_1");
        assert_eq!(
            response.sources,
            vec![SourceRecord::new(
                "MCP: Build Rich-Context AI Apps with Anthropic - Lesson 1",
                None
            )]
        );

        let calls = engine.calls();
        match &calls[0].messages[0].content {
            crate::llm::MessageContent::Text(text) => assert_eq!(
                text,
                "Answer this question about course materials: How is MCP built?"
            ),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session_history_reaches_prompt() {
        let engine = ScriptedEngine::new(vec![text("First response."), text("Second response.")]);
        let rag = system(engine.clone());

        let first = rag.query("What is MCP?", Some("test_session")).await.unwrap();
        assert_eq!(first.session_id, "test_session");
        rag.query("Tell me more", Some("test_session")).await.unwrap();

        let calls = engine.calls();
        assert!(!calls[0].system.contains("Previous conversation"));
        assert!(calls[1]
            .system
            .contains("Previous conversation:\nUser: What is MCP?\nAssistant: First response."));
    }

    #[tokio::test]
    async fn test_run_tool_directly() {
        let rag = system(ScriptedEngine::new(vec![]));
        rag.add_course_folder(docs_dir().path(), false).await.unwrap();

        let output = rag
            .run_tool("get_course_outline", json!({"course_name": "Chroma retrieval"}))
            .await;
        assert_eq!(
            output.text,
            "Course: Advanced Retrieval for AI with Chroma\nTotal Lessons: 1\n\nLessons:\n  Lesson 0: Overview"
        );
    }
}
