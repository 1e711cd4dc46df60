//! Course retrieval: unified semantic search, course name resolution and
//! catalog lookups used by the assistant's tools.

use crate::embedding::Embedder;
use crate::error::{CoursemateError, Result};
use crate::models::{parse_lessons_json, Course};
use crate::vector_store::{CatalogEntry, ContentFilter, VectorStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// One retrieved transcript passage with its attribution metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<i64>,
}

/// The retrieval capability the tools are written against.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Search content, optionally narrowed to a (fuzzy) course name and a lesson.
    ///
    /// Fails with [`CoursemateError::CourseNotFound`] when the course name
    /// cannot be resolved and [`CoursemateError::Search`] when the search
    /// itself fails.
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<i64>,
    ) -> Result<Vec<Passage>>;

    /// Resolve a partial course name to a canonical title.
    async fn resolve_course_name(&self, name: &str) -> Result<Option<String>>;

    /// Link of one lesson, if the catalog has one.
    async fn lesson_link(&self, course_title: &str, lesson_number: i64) -> Result<Option<String>>;

    /// Stored catalog record for a canonical course title.
    async fn course_metadata(&self, course_title: &str) -> Result<Option<CatalogEntry>>;
}

/// [`Retriever`] backed by an embedder and a vector store.
pub struct CourseRetriever {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
}

impl CourseRetriever {
    /// Create a retriever returning at most five passages per search.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            max_results: 5,
        }
    }

    /// Set the maximum number of passages per search.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Index a course's catalog entry, embedding its title.
    pub async fn add_course_metadata(&self, course: &Course) -> Result<()> {
        let embedding = self.embedder.embed(&course.title).await?;
        let entry = CatalogEntry::from_course(course, embedding)?;
        self.vector_store.upsert_course(&entry).await
    }

    async fn search_passages(
        &self,
        query: &str,
        filter: &ContentFilter,
        limit: usize,
    ) -> Result<Vec<Passage>> {
        let embedding = self.embedder.embed(query).await?;
        let results = self
            .vector_store
            .search_content(&embedding, limit, filter)
            .await?;

        Ok(results
            .into_iter()
            .map(|r| Passage {
                content: r.document.content,
                course_title: r.document.course_title,
                lesson_number: r.document.lesson_number,
            })
            .collect())
    }
}

#[async_trait]
impl Retriever for CourseRetriever {
    #[instrument(skip(self), fields(query = %query))]
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<i64>,
    ) -> Result<Vec<Passage>> {
        let course_title = match course_name {
            Some(name) => match self.resolve_course_name(name).await {
                Ok(Some(title)) => Some(title),
                Ok(None) => return Err(CoursemateError::CourseNotFound(name.to_string())),
                Err(e) => return Err(CoursemateError::Search(e.to_string())),
            },
            None => None,
        };

        let filter = ContentFilter {
            course_title,
            lesson_number,
        };

        let passages = self
            .search_passages(query, &filter, self.max_results)
            .await
            .map_err(|e| CoursemateError::Search(e.to_string()))?;

        debug!("Retrieved {} passages", passages.len());
        Ok(passages)
    }

    async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let embedding = self.embedder.embed(name).await?;
        let nearest = self.vector_store.nearest_course(&embedding).await?;
        Ok(nearest.map(|m| m.title))
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: i64) -> Result<Option<String>> {
        let Some(entry) = self.vector_store.get_course(course_title).await? else {
            return Ok(None);
        };

        match parse_lessons_json(&entry.lessons_json) {
            Ok(lessons) => Ok(lessons
                .into_iter()
                .find(|l| l.lesson_number == lesson_number)
                .and_then(|l| l.lesson_link)
                .filter(|link| !link.is_empty())),
            Err(e) => {
                warn!("Unreadable lesson list for '{}': {}", course_title, e);
                Ok(None)
            }
        }
    }

    async fn course_metadata(&self, course_title: &str) -> Result<Option<CatalogEntry>> {
        self.vector_store.get_course(course_title).await
    }
}
