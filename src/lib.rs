//! Coursemate - Course Materials Assistant
//!
//! A local-first assistant that answers questions about course transcripts.
//! A language model decides, over a bounded number of rounds, whether to
//! search course content or fetch a course outline; the tool results and
//! their sources flow back into the final answer.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `ingest` - Course document parsing and chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Course catalog and content storage
//! - `retrieval` - Course name resolution and filtered semantic search
//! - `tools` - Tools offered to the model and their registry
//! - `llm` - Reasoning engine abstraction
//! - `agent` - Multi-round tool-use orchestration
//! - `rag` - The assistant facade and conversation sessions
//!
//! # Example
//!
//! ```rust,no_run
//! use coursemate::config::Settings;
//! use coursemate::rag::RagSystem;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let rag = RagSystem::new(&settings)?;
//!
//!     rag.add_course_folder(&settings.docs_dir(), false).await?;
//!     let response = rag.query("What does lesson 1 of the MCP course cover?", None).await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod openai;
pub mod rag;
pub mod retrieval;
pub mod tools;
pub mod vector_store;

pub use error::{CoursemateError, Result};
