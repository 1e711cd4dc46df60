//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{
    cosine_similarity, rank, CatalogEntry, ContentDocument, ContentFilter, CourseMatch,
    SearchResult, VectorStore,
};
use crate::error::{CoursemateError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    catalog: RwLock<BTreeMap<String, CatalogEntry>>,
    documents: RwLock<HashMap<uuid::Uuid, ContentDocument>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(BTreeMap::new()),
            documents: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> CoursemateError {
    CoursemateError::VectorStore(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_course(&self, entry: &CatalogEntry) -> Result<()> {
        let mut catalog = self.catalog.write().map_err(poisoned)?;
        catalog.insert(entry.title.clone(), entry.clone());
        Ok(())
    }

    async fn upsert_chunks(&self, docs: &[ContentDocument]) -> Result<usize> {
        let mut store = self.documents.write().map_err(poisoned)?;
        for doc in docs {
            store.insert(doc.id, doc.clone());
        }
        Ok(docs.len())
    }

    async fn search_content(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: &ContentFilter,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.documents.read().map_err(poisoned)?;

        let results: Vec<SearchResult> = docs
            .values()
            .filter(|doc| filter.matches(doc))
            .map(|doc| SearchResult {
                document: doc.clone(),
                score: cosine_similarity(query_embedding, &doc.embedding),
            })
            .collect();

        Ok(rank(results, limit))
    }

    async fn nearest_course(&self, query_embedding: &[f32]) -> Result<Option<CourseMatch>> {
        let catalog = self.catalog.read().map_err(poisoned)?;

        Ok(catalog
            .values()
            .map(|entry| CourseMatch {
                title: entry.title.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal)))
    }

    async fn get_course(&self, title: &str) -> Result<Option<CatalogEntry>> {
        let catalog = self.catalog.read().map_err(poisoned)?;
        Ok(catalog.get(title).cloned())
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let catalog = self.catalog.read().map_err(poisoned)?;
        Ok(catalog.keys().cloned().collect())
    }

    async fn course_count(&self) -> Result<usize> {
        let catalog = self.catalog.read().map_err(poisoned)?;
        Ok(catalog.len())
    }

    async fn clear(&self) -> Result<()> {
        self.catalog.write().map_err(poisoned)?.clear();
        self.documents.write().map_err(poisoned)?.clear();
        Ok(())
    }
}
