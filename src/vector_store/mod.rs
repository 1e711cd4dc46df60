//! Vector store abstraction for Coursemate.
//!
//! Two collections live behind one trait: the course catalog (one entry per
//! course, embedded by title for fuzzy name resolution) and the course
//! content (one document per transcript chunk).

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use crate::models::{Course, CourseChunk};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog record for one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Course title, unique within the catalog.
    pub title: String,
    pub instructor: Option<String>,
    pub course_link: Option<String>,
    /// Lesson list in its persisted JSON form.
    pub lessons_json: String,
    pub lesson_count: usize,
    /// Embedding of the title.
    pub embedding: Vec<f32>,
    pub indexed_at: DateTime<Utc>,
}

impl CatalogEntry {
    /// Build a catalog entry for a course with its title embedding.
    pub fn from_course(course: &Course, embedding: Vec<f32>) -> Result<Self> {
        Ok(Self {
            title: course.title.clone(),
            instructor: course.instructor.clone(),
            course_link: course.course_link.clone(),
            lessons_json: course.lessons_json()?,
            lesson_count: course.lessons.len(),
            embedding,
            indexed_at: Utc::now(),
        })
    }
}

/// A content chunk stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentDocument {
    pub id: Uuid,
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<i64>,
    pub chunk_index: usize,
    pub embedding: Vec<f32>,
}

impl ContentDocument {
    /// Create a document from an ingested chunk and its embedding.
    pub fn from_chunk(chunk: &CourseChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: chunk.content.clone(),
            course_title: chunk.course_title.clone(),
            lesson_number: chunk.lesson_number,
            chunk_index: chunk.chunk_index,
            embedding,
        }
    }
}

/// Exact-match metadata filter applied before ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    pub course_title: Option<String>,
    pub lesson_number: Option<i64>,
}

impl ContentFilter {
    /// Whether a document passes the filter.
    pub fn matches(&self, doc: &ContentDocument) -> bool {
        let course_ok = self
            .course_title
            .as_ref()
            .map_or(true, |title| &doc.course_title == title);
        let lesson_ok = self
            .lesson_number
            .map_or(true, |n| doc.lesson_number == Some(n));
        course_ok && lesson_ok
    }
}

/// A content search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub document: ContentDocument,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// The catalog entry closest to a query embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseMatch {
    pub title: String,
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace a course's catalog entry.
    async fn upsert_course(&self, entry: &CatalogEntry) -> Result<()>;

    /// Bulk insert content documents.
    async fn upsert_chunks(&self, docs: &[ContentDocument]) -> Result<usize>;

    /// Rank content documents passing `filter` by similarity.
    async fn search_content(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: &ContentFilter,
    ) -> Result<Vec<SearchResult>>;

    /// Find the catalog entry whose title embedding is closest.
    async fn nearest_course(&self, query_embedding: &[f32]) -> Result<Option<CourseMatch>>;

    /// Get a course's catalog entry by exact title.
    async fn get_course(&self, title: &str) -> Result<Option<CatalogEntry>>;

    /// All course titles, sorted.
    async fn course_titles(&self) -> Result<Vec<String>>;

    async fn course_count(&self) -> Result<usize>;

    /// Remove every catalog entry and content document.
    async fn clear(&self) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Sort by score descending and keep the best `limit`.
pub(crate) fn rank(mut results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}
