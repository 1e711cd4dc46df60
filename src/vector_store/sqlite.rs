//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! Course corpora are small, so a full scan per query is acceptable.

use super::{
    cosine_similarity, rank, CatalogEntry, ContentDocument, ContentFilter, CourseMatch,
    SearchResult, VectorStore,
};
use crate::error::{CoursemateError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS course_catalog (
        title TEXT PRIMARY KEY,
        instructor TEXT,
        course_link TEXT,
        lessons_json TEXT NOT NULL,
        lesson_count INTEGER NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS course_content (
        id TEXT PRIMARY KEY,
        content TEXT NOT NULL,
        course_title TEXT NOT NULL,
        lesson_number INTEGER,
        chunk_index INTEGER NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_content_course ON course_content(course_title);
    CREATE INDEX IF NOT EXISTS idx_content_lesson ON course_content(course_title, lesson_number);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a SQLite vector store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CoursemateError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<CatalogEntry> {
        let embedding_bytes: Vec<u8> = row.get(5)?;
        let indexed_at_str: String = row.get(6)?;
        let lesson_count: i64 = row.get(4)?;

        Ok(CatalogEntry {
            title: row.get(0)?,
            instructor: row.get(1)?,
            course_link: row.get(2)?,
            lessons_json: row.get(3)?,
            lesson_count: lesson_count.max(0) as usize,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, entry), fields(title = %entry.title))]
    async fn upsert_course(&self, entry: &CatalogEntry) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO course_catalog
            (title, instructor, course_link, lessons_json, lesson_count, embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                entry.title,
                entry.instructor,
                entry.course_link,
                entry.lessons_json,
                entry.lesson_count as i64,
                Self::embedding_to_bytes(&entry.embedding),
                entry.indexed_at.to_rfc3339(),
            ],
        )?;

        debug!("Upserted catalog entry");
        Ok(())
    }

    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn upsert_chunks(&self, docs: &[ContentDocument]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO course_content
                (id, content, course_title, lesson_number, chunk_index, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    doc.id.to_string(),
                    doc.content,
                    doc.course_title,
                    doc.lesson_number,
                    doc.chunk_index as i64,
                    Self::embedding_to_bytes(&doc.embedding),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch upserted {} content chunks", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_content(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: &ContentFilter,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, content, course_title, lesson_number, chunk_index, embedding
            FROM course_content
            WHERE (?1 IS NULL OR course_title = ?1)
              AND (?2 IS NULL OR lesson_number = ?2)
            "#,
        )?;

        let docs = stmt.query_map(params![filter.course_title, filter.lesson_number], |row| {
            let id_str: String = row.get(0)?;
            let chunk_index: i64 = row.get(4)?;
            let embedding_bytes: Vec<u8> = row.get(5)?;

            Ok(ContentDocument {
                id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
                content: row.get(1)?,
                course_title: row.get(2)?,
                lesson_number: row.get(3)?,
                chunk_index: chunk_index.max(0) as usize,
                embedding: Self::bytes_to_embedding(&embedding_bytes),
            })
        })?;

        let results: Vec<SearchResult> = docs
            .filter_map(|doc| doc.ok())
            .map(|doc| {
                let score = cosine_similarity(query_embedding, &doc.embedding);
                SearchResult { document: doc, score }
            })
            .collect();

        let results = rank(results, limit);
        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    #[instrument(skip(self, query_embedding))]
    async fn nearest_course(&self, query_embedding: &[f32]) -> Result<Option<CourseMatch>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT title, embedding FROM course_catalog")?;
        let rows = stmt.query_map([], |row| {
            let title: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(1)?;
            Ok((title, Self::bytes_to_embedding(&embedding_bytes)))
        })?;

        Ok(rows
            .filter_map(|r| r.ok())
            .map(|(title, embedding)| CourseMatch {
                score: cosine_similarity(query_embedding, &embedding),
                title,
            })
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal)))
    }

    #[instrument(skip(self))]
    async fn get_course(&self, title: &str) -> Result<Option<CatalogEntry>> {
        let conn = self.lock()?;

        let entry = conn
            .query_row(
                r#"
                SELECT title, instructor, course_link, lessons_json, lesson_count,
                       embedding, indexed_at
                FROM course_catalog
                WHERE title = ?1
                "#,
                params![title],
                Self::row_to_entry,
            )
            .optional()?;

        Ok(entry)
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT title FROM course_catalog ORDER BY title")?;
        let titles = stmt.query_map([], |row| row.get::<_, String>(0))?;

        Ok(titles.filter_map(|t| t.ok()).collect())
    }

    async fn course_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM course_catalog", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM course_content; DELETE FROM course_catalog;")?;
        info!("Cleared course catalog and content");
        Ok(())
    }
}
